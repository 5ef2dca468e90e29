mod common;

use common::close;
use cgmath::Vector3;
use haunted_house::{
    Preset,
    lighting::{GhostPath, LightingRig},
};

fn times() -> impl Iterator<Item = f32> {
    (0..400).map(|i| i as f32 * 0.37)
}

#[test]
fn first_ghost_circles_at_radius_four() {
    for t in times() {
        let expected = Vector3::new(
            4.0 * (0.5 * t).cos(),
            (3.0 * t).sin(),
            4.0 * (0.5 * t).sin(),
        );
        assert!(close(GhostPath::Inner.position(t), expected), "t = {t}");
    }
}

#[test]
fn second_ghost_counter_rotates() {
    for t in times() {
        let angle = -0.32 * t;
        let expected = Vector3::new(
            5.0 * (2.0 * angle).cos(),
            (4.0 * t).cos() + (2.5 * t).sin(),
            5.0 * (2.0 * angle).sin(),
        );
        assert!(close(GhostPath::Middle.position(t), expected), "t = {t}");
    }
}

#[test]
fn third_ghost_breathes_on_each_axis() {
    for t in times() {
        let angle = -0.18 * t;
        let p = GhostPath::Outer.position(t);
        assert!((p.x - angle.cos() * 7.0 * (0.32 * t).sin()).abs() < 1e-4);
        assert!((p.z - angle.sin() * 7.0 * (0.5 * t).sin()).abs() < 1e-4);
        assert!((p.y - ((4.0 * t).sin() + (2.5 * t).sin())).abs() < 1e-4);
    }
}

#[test]
fn animate_moves_only_ghosts() {
    let mut rig = LightingRig::new(Preset::Haunted);
    let before = rig.clone();
    rig.animate(12.5);

    assert_eq!(rig.ambient, before.ambient);
    assert_eq!(rig.moon, before.moon);
    assert_eq!(rig.door, before.door);
    for ghost in &rig.ghosts {
        assert!(close(ghost.light.position, ghost.path.position(12.5)));
        assert_eq!(ghost.light.intensity, 2.0);
        assert_eq!(ghost.light.distance, 3.0);
    }
}

#[test]
fn presets_differ_in_the_door_light() {
    let classic = LightingRig::new(Preset::Classic);
    let haunted = LightingRig::new(Preset::Haunted);
    assert_eq!(classic.door.intensity, 3.0);
    assert_eq!(haunted.door.intensity, 1.0);
    assert_eq!(classic.door.position, haunted.door.position);
    assert_eq!(classic.point_lights().count(), 4);
}
