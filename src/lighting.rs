//! Scene lights and the ghost animation.

use cgmath::Vector3;

use crate::{config::Preset, data_structures::material::Colour};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub colour: Colour,
    pub intensity: f32,
}

/// Parallel light shining from `position` towards the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub colour: Colour,
    pub intensity: f32,
    pub position: Vector3<f32>,
}

/// Light radiating from a point, fading out to nothing at `distance`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub colour: Colour,
    pub intensity: f32,
    pub position: Vector3<f32>,
    pub distance: f32,
    pub decay: f32,
}

impl PointLight {
    pub fn new(colour: Colour, intensity: f32, distance: f32) -> Self {
        Self {
            colour,
            intensity,
            position: Vector3::new(0.0, 0.0, 0.0),
            distance,
            decay: 2.0,
        }
    }
}

/// The orbit each ghost follows. Positions depend on elapsed seconds only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GhostPath {
    /// Circle of radius 4, bobbing once per 2π/3 seconds.
    Inner,
    /// Counter-rotating circle of radius 5 at twice the base angle.
    Middle,
    /// Wide orbit whose radius breathes with separate x and z rhythms.
    Outer,
}

impl GhostPath {
    pub fn position(&self, t: f32) -> Vector3<f32> {
        match self {
            GhostPath::Inner => {
                let angle = t * 0.5;
                Vector3::new(angle.cos() * 4.0, (t * 3.0).sin(), angle.sin() * 4.0)
            }
            GhostPath::Middle => {
                let angle = -t * 0.32;
                Vector3::new(
                    (angle * 2.0).cos() * 5.0,
                    (t * 4.0).cos() + (t * 2.5).sin(),
                    (angle * 2.0).sin() * 5.0,
                )
            }
            GhostPath::Outer => {
                let angle = -t * 0.18;
                Vector3::new(
                    angle.cos() * (7.0 * (t * 0.32).sin()),
                    (t * 4.0).sin() + (t * 2.5).sin(),
                    angle.sin() * (7.0 * (t * 0.5).sin()),
                )
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ghost {
    pub light: PointLight,
    pub path: GhostPath,
}

impl Ghost {
    fn new(hex: &str, path: GhostPath) -> Self {
        let mut light = PointLight::new(Colour::from_hex(hex), 2.0, 3.0);
        light.position = path.position(0.0);
        Self { light, path }
    }
}

/// Every light in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct LightingRig {
    pub ambient: AmbientLight,
    pub moon: DirectionalLight,
    pub door: PointLight,
    pub ghosts: [Ghost; 3],
}

impl LightingRig {
    pub fn new(preset: Preset) -> Self {
        let moonlight = Colour::from_hex("#b9d5ff");
        let mut door = PointLight::new(Colour::from_hex("#ff7d46"), preset.door_light_intensity(), 7.0);
        door.position = Vector3::new(0.0, 2.2, 2.7);

        Self {
            ambient: AmbientLight {
                colour: moonlight,
                intensity: 0.12,
            },
            moon: DirectionalLight {
                colour: moonlight,
                intensity: 0.26,
                position: Vector3::new(4.0, 5.0, -2.0),
            },
            door,
            ghosts: [
                Ghost::new("#ff00ff", GhostPath::Inner),
                Ghost::new("#00ffff", GhostPath::Middle),
                Ghost::new("#ffff00", GhostPath::Outer),
            ],
        }
    }

    /// Moves the ghosts to where they are `elapsed` seconds in.
    pub fn animate(&mut self, elapsed: f32) {
        for ghost in self.ghosts.iter_mut() {
            ghost.light.position = ghost.path.position(elapsed);
        }
    }

    /// Door light first, then the ghosts.
    pub fn point_lights(&self) -> impl Iterator<Item = &PointLight> {
        std::iter::once(&self.door).chain(self.ghosts.iter().map(|ghost| &ghost.light))
    }
}
