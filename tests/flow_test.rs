mod common;

use cgmath::{InnerSpace, Vector3};
use common::{Journal, RecordingScheduler, RecordingTarget, app_state, close};
use haunted_house::{
    Preset, step, step_at,
    camera::{MAX_PIXEL_RATIO, Viewport},
    lighting::GhostPath,
};

#[test]
fn step_animates_draws_then_schedules() {
    let mut state = app_state(Preset::Haunted);
    let journal = Journal::default();
    let mut target = RecordingTarget::new(&journal);
    let scheduler = RecordingScheduler {
        journal: journal.clone(),
    };

    step_at(&mut state, 2.0, &mut target, &scheduler).expect("draw");
    step_at(&mut state, 4.5, &mut target, &scheduler).expect("draw");

    assert_eq!(*journal.borrow(), ["draw", "schedule", "draw", "schedule"]);
    assert!(close(target.ghost_positions[0], GhostPath::Inner.position(2.0)));
    assert!(close(target.ghost_positions[1], GhostPath::Inner.position(4.5)));
}

#[test]
fn failed_draw_still_schedules_next_frame() {
    let mut state = app_state(Preset::Classic);
    let journal = Journal::default();
    let mut target = RecordingTarget::new(&journal);
    target.fail = true;
    let scheduler = RecordingScheduler {
        journal: journal.clone(),
    };

    assert!(step(&mut state, &mut target, &scheduler).is_err());
    assert_eq!(*journal.borrow(), ["draw", "schedule"]);
}

#[test]
fn step_advances_the_controls() {
    let mut state = app_state(Preset::Classic);
    let journal = Journal::default();
    let mut target = RecordingTarget::new(&journal);
    let scheduler = RecordingScheduler {
        journal: journal.clone(),
    };
    let start = state.camera.position;
    state.controls.rotate_left(1.0);

    step_at(&mut state, 0.0, &mut target, &scheduler).expect("draw");
    assert_ne!(state.camera.position, start);
    let radius = |p: cgmath::Point3<f32>| (p - state.camera.target).magnitude();
    assert!((radius(state.camera.position) - radius(start)).abs() < 1e-4);
}

#[test]
fn resize_only_changes_the_aspect() {
    let mut state = app_state(Preset::Haunted);
    let before = state.projection;
    assert!((before.aspect - 800.0 / 600.0).abs() < 1e-6);

    state.resize(Viewport::new(1024.0, 512.0, 1.0));
    assert!((state.projection.aspect - 2.0).abs() < 1e-6);
    assert_eq!(state.projection.fovy, before.fovy);
    assert_eq!(state.projection.znear, before.znear);
    assert_eq!(state.projection.zfar, before.zfar);
    assert_eq!(state.viewport.surface_size(), [1024, 512]);
}

#[test]
fn pixel_ratio_is_capped() {
    let retina = Viewport::new(400.0, 300.0, 3.0);
    assert_eq!(retina.pixel_ratio(), MAX_PIXEL_RATIO);
    assert_eq!(retina.surface_size(), [800, 600]);

    let modest = Viewport::new(400.0, 300.0, 1.5);
    assert_eq!(modest.pixel_ratio(), 1.5);
    assert_eq!(modest.surface_size(), [600, 450]);
}

#[test]
fn ambient_slider_touches_only_ambient() {
    let mut state = app_state(Preset::Haunted);
    let before = state.lights.clone();

    let written = state
        .panel
        .set("Ambient Light Intensity", &mut state.lights, 0.5)
        .expect("slider exists");
    assert_eq!(written, 0.5);
    assert_eq!(state.lights.ambient.intensity, 0.5);
    assert_eq!(state.lights.moon, before.moon);
    assert_eq!(state.lights.door, before.door);
    assert_eq!(state.lights.ghosts, before.ghosts);

    let clamped = state
        .panel
        .set("Ambient Light Intensity", &mut state.lights, 7.0)
        .expect("slider exists");
    assert_eq!(clamped, 1.0);
    assert_eq!(state.lights.ambient.intensity, 1.0);
}

#[test]
fn damping_eases_towards_the_target() {
    let mut state = app_state(Preset::Classic);
    let offset = |state: &haunted_house::AppState| state.camera.position - state.camera.target;
    let theta = |v: Vector3<f32>| v.x.atan2(v.z);

    state.controls.rotate_left(1.0);
    let mut steps = Vec::new();
    let mut last = theta(offset(&state));
    for _ in 0..200 {
        state.controls.update(&mut state.camera);
        let now = theta(offset(&state));
        steps.push((now - last).abs());
        last = now;
    }

    assert!((steps[0] - 0.05).abs() < 1e-4);
    assert!(steps.windows(2).all(|w| w[1] <= w[0] + 1e-6));
    let total: f32 = steps.iter().sum();
    assert!(total < 1.0 && total > 0.99, "turned {total}");
}

#[test]
fn undamped_controls_apply_in_full() {
    let mut state = app_state(Preset::Classic);
    state.controls.enable_damping = false;
    state.controls.rotate_up(0.2);
    state.controls.update(&mut state.camera);
    let after_first = state.camera.position;
    state.controls.update(&mut state.camera);
    assert!(close(
        after_first - cgmath::Point3::new(0.0, 0.0, 0.0),
        state.camera.position - cgmath::Point3::new(0.0, 0.0, 0.0)
    ));
}
