mod common;

use std::{f32::consts::FRAC_PI_4, rc::Rc};

use cgmath::{Euler, Vector3};
use rand::{SeedableRng, rngs::StdRng};

use common::{LoadEvent, RecordingObserver, seeded_rng};
use haunted_house::{
    Preset,
    data_structures::{
        material::{MapSlot, Material},
        texture::Wrap,
    },
    resources::AssetLoader,
    scene::{GRAVE_COUNT, Scene, SceneBuilder},
};

fn build(preset: Preset, loader: &mut AssetLoader) -> Scene {
    SceneBuilder::new(preset, loader).build(&mut seeded_rng())
}

fn material(scene: &Scene, name: &str) -> Rc<Material> {
    scene
        .find(name)
        .and_then(|node| node.mesh())
        .map(|mesh| mesh.material.clone())
        .unwrap_or_else(|| panic!("{name} has no mesh"))
}

#[test]
fn graves_ring_the_house() {
    let scene = build(Preset::Haunted, &mut AssetLoader::default());
    let graves = scene.graves();
    assert_eq!(graves.len(), GRAVE_COUNT);
    for grave in graves {
        let p = grave.get_world_transform().position;
        let r2 = p.x * p.x + p.z * p.z;
        assert!((16.0..100.0).contains(&r2), "{} at r² = {r2}", grave.name());
        assert!((p.y - 0.3).abs() < 1e-6);
    }
}

#[test]
fn same_seed_same_graveyard() {
    let a = build(Preset::Classic, &mut AssetLoader::default());
    let b = build(Preset::Classic, &mut AssetLoader::default());
    let positions = |scene: &Scene| {
        scene
            .graves()
            .iter()
            .map(|g| g.get_world_transform().clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(positions(&a), positions(&b));
}

#[test]
fn graves_tilt_only_around_y_and_z() {
    for seed in 0..20 {
        let scene = SceneBuilder::new(Preset::Classic, &mut AssetLoader::default())
            .build(&mut StdRng::seed_from_u64(seed));
        for grave in scene.graves() {
            let euler = Euler::from(grave.get_world_transform().rotation);
            assert!(euler.x.0.abs() < 1e-5, "{} x tilt {:?}", grave.name(), euler.x);
            assert!(euler.y.0.abs() <= 0.2 + 1e-5, "{} y tilt {:?}", grave.name(), euler.y);
            assert!(euler.z.0.abs() <= 0.2 + 1e-5, "{} z tilt {:?}", grave.name(), euler.z);
        }
    }
}

#[test]
fn house_parts_sit_where_expected() {
    let scene = build(Preset::Classic, &mut AssetLoader::default());
    let world = |name: &str| {
        scene
            .find(name)
            .map(|node| node.get_world_transform().clone())
            .unwrap_or_else(|| panic!("{name} missing"))
    };
    let close = |a: Vector3<f32>, b: Vector3<f32>| {
        let d = a - b;
        d.x.abs() + d.y.abs() + d.z.abs() < 1e-5
    };

    let roof = world("roof");
    assert!(close(roof.position, Vector3::new(0.0, 3.0, 0.0)));
    let yaw = Euler::from(roof.rotation);
    assert!((yaw.y.0 - FRAC_PI_4).abs() < 1e-5);
    assert!(yaw.x.0.abs() < 1e-5 && yaw.z.0.abs() < 1e-5);

    assert!(close(world("door").position, Vector3::new(0.0, 1.0, 2.01)));

    let bushes = [
        (Vector3::new(0.8, 0.2, 2.2), 0.5),
        (Vector3::new(1.4, 0.1, 2.1), 0.25),
        (Vector3::new(-0.8, 0.1, 2.2), 0.4),
        (Vector3::new(-1.0, 0.05, 2.6), 0.15),
    ];
    for (i, (position, scale)) in bushes.into_iter().enumerate() {
        let bush = world(&format!("bush{}", i + 1));
        assert!(close(bush.position, position), "bush{} at {:?}", i + 1, bush.position);
        assert!(close(bush.scale, Vector3::new(scale, scale, scale)));
    }
}

#[test]
fn classic_door_is_opaque() {
    let scene = build(Preset::Classic, &mut AssetLoader::default());
    let door = material(&scene, "door");
    assert!(!door.transparent);
    assert!(door.maps.get(MapSlot::Displacement).is_none());
}

#[test]
fn bushes_and_graves_share_resources() {
    let scene = build(Preset::Classic, &mut AssetLoader::default());
    let bush = |i: usize| {
        scene
            .find(&format!("bush{i}"))
            .and_then(|node| node.mesh())
            .expect("bush mesh")
    };
    for i in 2..=4 {
        assert!(bush(1).shares_resources_with(bush(i)));
    }

    let graves: Vec<_> = scene.graves().iter().filter_map(|g| g.mesh()).collect();
    assert_eq!(graves.len(), GRAVE_COUNT);
    assert!(graves.iter().all(|g| Rc::ptr_eq(&g.geometry, &graves[0].geometry)));
    assert!(graves.iter().all(|g| Rc::ptr_eq(&g.material, &graves[0].material)));
    assert!(!bush(1).shares_resources_with(graves[0]));
}

#[test]
fn haunted_materials_carry_their_maps() {
    let scene = build(Preset::Haunted, &mut AssetLoader::default());

    let door = material(&scene, "door");
    assert_eq!(door.maps.iter().count(), 7);
    assert!(door.transparent);
    assert_eq!(door.displacement_scale, 0.1);

    let walls = material(&scene, "walls");
    let slots: Vec<_> = walls.maps.iter().map(|(slot, _)| slot).collect();
    assert_eq!(
        slots,
        [MapSlot::Colour, MapSlot::AmbientOcclusion, MapSlot::Normal, MapSlot::Roughness]
    );

    let floor = material(&scene, "floor");
    for (_, map) in floor.maps.iter() {
        let sampling = map.sampling();
        assert_eq!(sampling.repeat, [8.0, 8.0]);
        assert_eq!((sampling.wrap_s, sampling.wrap_t), (Wrap::Repeat, Wrap::Repeat));
    }
}

#[test]
fn failed_texture_does_not_stop_loading() {
    let observer = RecordingObserver::default();
    let mut loader = observer.loader();
    let scene = build(Preset::Haunted, &mut loader);

    let door = material(&scene, "door");
    assert!(door.maps.iter().all(|(_, map)| map.is_pending()));

    let requests = loader.take_requests();
    assert_eq!(requests.len(), 15);
    for url in &requests {
        let result = if url.contains("door/color") {
            Err(anyhow::anyhow!("404"))
        } else {
            Ok(image::RgbaImage::new(2, 2))
        };
        loader.complete(url, result);
    }

    assert_eq!(loader.pending(), 0);
    assert!(!loader.manager().is_loading());
    assert_eq!(loader.manager().loaded(), loader.manager().total());

    let events = observer.events();
    assert_eq!(events.last(), Some(&LoadEvent::Load));
    assert!(events.contains(&LoadEvent::Error {
        url: "textures/door/color.jpg".to_string()
    }));

    assert!(door.maps.get(MapSlot::Colour).is_some_and(|map| map.is_failed()));
    assert!(door.maps.ready(MapSlot::Colour).is_none());
    assert!(door.maps.ready(MapSlot::Alpha).is_some());
}

#[test]
fn classic_scene_is_untextured() {
    let observer = RecordingObserver::default();
    let mut loader = observer.loader();
    let scene = build(Preset::Classic, &mut loader);
    assert!(loader.take_requests().is_empty());
    assert!(observer.events().is_empty());
    assert_eq!(material(&scene, "door").maps.iter().count(), 0);
}
