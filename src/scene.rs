//! Construction of the haunted house scene.

use std::{
    f32::consts::{FRAC_PI_2, FRAC_PI_4, TAU},
    rc::Rc,
};

use rand::Rng;

use crate::{
    config::Preset,
    data_structures::{
        geometry::Geometry,
        instance::Instance,
        material::{Colour, MapSlot, Material},
        scene_graph::{self, ContainerNode, Mesh, MeshNode, SceneNode},
        texture::{ColourSpace, TextureHandle, Wrap},
    },
    resources::AssetLoader,
};

pub const GRAVE_COUNT: usize = 50;
pub const GRAVE_MIN_RADIUS: f32 = 4.0;
pub const GRAVE_MAX_RADIUS: f32 = 10.0;
pub const GRAVE_MAX_TILT: f32 = 0.2;

/// The built scene graph. World transforms are up to date.
pub struct Scene {
    pub root: ContainerNode,
}

impl Scene {
    pub fn find(&self, name: &str) -> Option<&dyn SceneNode> {
        scene_graph::find(&self.root, name)
    }

    pub fn graves(&self) -> &[Box<dyn SceneNode>] {
        self.find("graves")
            .map(|group| group.get_children().as_slice())
            .unwrap_or_default()
    }

    /// Every drawable with its world transform, depth-first.
    pub fn meshes(&self) -> Vec<(&Instance, &Mesh)> {
        let mut meshes = Vec::new();
        scene_graph::walk(&self.root, &mut |node| {
            if let Some(mesh) = node.mesh() {
                meshes.push((node.get_world_transform(), mesh));
            }
        });
        meshes
    }
}

pub struct SceneBuilder<'a> {
    preset: Preset,
    loader: &'a mut AssetLoader,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(preset: Preset, loader: &'a mut AssetLoader) -> Self {
        Self { preset, loader }
    }

    /// Builds the whole scene. Texture maps are requested from the loader and
    /// attached while still pending.
    pub fn build(mut self, rng: &mut impl Rng) -> Scene {
        let house = self.house();
        let graves = self.graves(rng);
        let floor = self.floor();

        let mut root = ContainerNode::new("scene").with_children(vec![
            Box::new(house) as Box<dyn SceneNode>,
            Box::new(graves),
            Box::new(floor),
        ]);
        root.update_world_transform_all();
        log::debug!("built {} preset scene", self.preset);
        Scene { root }
    }

    fn texture(&mut self, set: &str, map: &str, colour_space: ColourSpace) -> TextureHandle {
        self.loader
            .load_texture(&format!("textures/{set}/{map}.jpg"), colour_space)
    }

    fn house(&mut self) -> ContainerNode {
        let mut walls = Material::standard("walls", Colour::from_hex("#ac8e82"));
        if self.preset.textured() {
            walls = walls
                .with_map(MapSlot::Colour, self.texture("bricks", "color", ColourSpace::Srgb))
                .with_map(
                    MapSlot::AmbientOcclusion,
                    self.texture("bricks", "ambientOcclusion", ColourSpace::Linear),
                )
                .with_map(MapSlot::Normal, self.texture("bricks", "normal", ColourSpace::Linear))
                .with_map(
                    MapSlot::Roughness,
                    self.texture("bricks", "roughness", ColourSpace::Linear),
                );
        }
        let walls = MeshNode::new(
            "walls",
            Mesh::new(Rc::new(Geometry::cuboid(4.0, 2.5, 4.0)), Rc::new(walls)),
            Instance::at(0.0, 2.5 / 2.0, 0.0),
        );

        let roof = MeshNode::new(
            "roof",
            Mesh::new(
                Rc::new(Geometry::cone(3.5, 1.0, 4)),
                Rc::new(Material::standard("roof", Colour::from_hex("#b35f45"))),
            ),
            Instance::at(0.0, 2.5 + 0.5, 0.0).with_euler_xyz(0.0, FRAC_PI_4, 0.0),
        );

        let door = MeshNode::new(
            "door",
            Mesh::new(Rc::new(self.door_geometry()), Rc::new(self.door_material())),
            Instance::at(0.0, 1.0, 2.0 + 0.01),
        );

        let bush_geometry = Rc::new(Geometry::sphere(1.0, 16, 16));
        let bush_material = Rc::new(Material::standard("bush", Colour::from_hex("#89c854")));
        let bushes = [
            ((0.8, 0.2, 2.2), 0.5),
            ((1.4, 0.1, 2.1), 0.25),
            ((-0.8, 0.1, 2.2), 0.4),
            ((-1.0, 0.05, 2.6), 0.15),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, ((x, y, z), scale))| {
            Box::new(MeshNode::new(
                &format!("bush{}", i + 1),
                Mesh::new(bush_geometry.clone(), bush_material.clone()),
                Instance::at(x, y, z).with_uniform_scale(scale),
            )) as Box<dyn SceneNode>
        });

        let mut children: Vec<Box<dyn SceneNode>> =
            vec![Box::new(walls), Box::new(roof), Box::new(door)];
        children.extend(bushes);
        ContainerNode::new("house").with_children(children)
    }

    fn door_geometry(&self) -> Geometry {
        if self.preset.textured() {
            Geometry::subdivided_plane(2.2, 2.2, 100, 100)
        } else {
            Geometry::plane(2.0, 2.0)
        }
    }

    fn door_material(&mut self) -> Material {
        let material = Material::standard("door", Colour::from_hex("#aa7b7b"));
        if !self.preset.textured() {
            return material;
        }
        material
            .with_transparency()
            .with_displacement_scale(0.1)
            .with_map(MapSlot::Colour, self.texture("door", "color", ColourSpace::Srgb))
            .with_map(MapSlot::Alpha, self.texture("door", "alpha", ColourSpace::Linear))
            .with_map(
                MapSlot::AmbientOcclusion,
                self.texture("door", "ambientOcclusion", ColourSpace::Linear),
            )
            .with_map(
                MapSlot::Displacement,
                self.texture("door", "height", ColourSpace::Linear),
            )
            .with_map(MapSlot::Normal, self.texture("door", "normal", ColourSpace::Linear))
            .with_map(
                MapSlot::Metalness,
                self.texture("door", "metalness", ColourSpace::Linear),
            )
            .with_map(
                MapSlot::Roughness,
                self.texture("door", "roughness", ColourSpace::Linear),
            )
    }

    fn graves(&mut self, rng: &mut impl Rng) -> ContainerNode {
        let geometry = Rc::new(Geometry::cuboid(0.6, 0.8, 0.2));
        let material = Rc::new(Material::standard("grave", Colour::from_hex("#b2b6b1")));

        let graves = (0..GRAVE_COUNT)
            .map(|i| {
                let angle = rng.random_range(0.0..TAU);
                let radius = rng.random_range(GRAVE_MIN_RADIUS..GRAVE_MAX_RADIUS);
                let tilt_z = rng.random_range(-GRAVE_MAX_TILT..GRAVE_MAX_TILT);
                let tilt_y = rng.random_range(-GRAVE_MAX_TILT..GRAVE_MAX_TILT);
                let local = Instance::at(angle.cos() * radius, 0.3, angle.sin() * radius)
                    .with_euler_xyz(0.0, tilt_y, tilt_z);
                Box::new(MeshNode::new(
                    &format!("grave{i}"),
                    Mesh::new(geometry.clone(), material.clone()),
                    local,
                )) as Box<dyn SceneNode>
            })
            .collect();

        ContainerNode::new("graves").with_children(graves)
    }

    fn floor(&mut self) -> MeshNode {
        let mut material = Material::standard("floor", Colour::from_hex("#a9c388"));
        if self.preset.textured() {
            let maps = [
                (MapSlot::Colour, "color", ColourSpace::Srgb),
                (MapSlot::AmbientOcclusion, "ambientOcclusion", ColourSpace::Linear),
                (MapSlot::Normal, "normal", ColourSpace::Linear),
                (MapSlot::Roughness, "roughness", ColourSpace::Linear),
            ];
            for (slot, map, colour_space) in maps {
                let texture = self.texture("grass", map, colour_space);
                texture.set_repeat(8.0, 8.0).set_wrap(Wrap::Repeat, Wrap::Repeat);
                material = material.with_map(slot, texture);
            }
        }
        MeshNode::new(
            "floor",
            Mesh::new(Rc::new(Geometry::plane(20.0, 20.0)), Rc::new(material)),
            Instance::new().with_euler_xyz(-FRAC_PI_2, 0.0, 0.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn classic_scene_requests_no_textures() {
        let mut loader = AssetLoader::default();
        let scene = SceneBuilder::new(Preset::Classic, &mut loader).build(&mut StdRng::seed_from_u64(1));
        assert!(loader.take_requests().is_empty());
        assert_eq!(scene.meshes().len(), 3 + 4 + GRAVE_COUNT + 1);
    }

    #[test]
    fn haunted_scene_requests_fifteen_maps() {
        let mut loader = AssetLoader::default();
        SceneBuilder::new(Preset::Haunted, &mut loader).build(&mut StdRng::seed_from_u64(1));
        assert_eq!(loader.take_requests().len(), 7 + 4 + 4);
    }

    #[test]
    fn roof_sits_on_the_walls() {
        let mut loader = AssetLoader::default();
        let scene = SceneBuilder::new(Preset::Classic, &mut loader).build(&mut StdRng::seed_from_u64(1));
        let roof = scene.find("roof").expect("roof");
        assert!((roof.get_world_transform().position.y - 3.0).abs() < 1e-6);
    }
}
