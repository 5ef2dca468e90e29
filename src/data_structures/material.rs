//! Surface shading parameters.

use crate::data_structures::texture::{Sampling, TextureHandle};

/// A linear RGB colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Colour {
    pub const WHITE: Colour = Colour::new(1.0, 1.0, 1.0);
    pub const BLACK: Colour = Colour::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses an sRGB `#rrggbb` string and converts it to linear.
    ///
    /// Falls back to magenta (and logs) on malformed input; every colour in
    /// this crate is a literal.
    pub fn from_hex(hex: &str) -> Self {
        let digits = hex.trim_start_matches('#');
        match u32::from_str_radix(digits, 16) {
            Ok(value) if digits.len() == 6 => {
                let channel = |shift: u32| srgb_to_linear(((value >> shift) & 0xff) as f32 / 255.0);
                Self::new(channel(16), channel(8), channel(0))
            }
            _ => {
                log::error!("invalid colour literal {hex:?}");
                Self::new(1.0, 0.0, 1.0)
            }
        }
    }

    pub fn scaled(&self, factor: f32) -> [f32; 3] {
        [self.r * factor, self.g * factor, self.b * factor]
    }
}

impl From<Colour> for [f32; 3] {
    fn from(c: Colour) -> Self {
        [c.r, c.g, c.b]
    }
}

impl From<Colour> for wgpu::Color {
    fn from(c: Colour) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: 1.0,
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// The texture slots of a standard material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapSlot {
    Colour,
    Alpha,
    AmbientOcclusion,
    Displacement,
    Normal,
    Metalness,
    Roughness,
}

impl MapSlot {
    /// Shader binding order.
    pub const ALL: [MapSlot; 7] = [
        MapSlot::Colour,
        MapSlot::Alpha,
        MapSlot::AmbientOcclusion,
        MapSlot::Displacement,
        MapSlot::Normal,
        MapSlot::Metalness,
        MapSlot::Roughness,
    ];
}

#[derive(Clone, Debug, Default)]
pub struct MaterialMaps {
    pub colour: Option<TextureHandle>,
    pub alpha: Option<TextureHandle>,
    pub ambient_occlusion: Option<TextureHandle>,
    pub displacement: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    pub metalness: Option<TextureHandle>,
    pub roughness: Option<TextureHandle>,
}

impl MaterialMaps {
    pub fn get(&self, slot: MapSlot) -> Option<&TextureHandle> {
        match slot {
            MapSlot::Colour => self.colour.as_ref(),
            MapSlot::Alpha => self.alpha.as_ref(),
            MapSlot::AmbientOcclusion => self.ambient_occlusion.as_ref(),
            MapSlot::Displacement => self.displacement.as_ref(),
            MapSlot::Normal => self.normal.as_ref(),
            MapSlot::Metalness => self.metalness.as_ref(),
            MapSlot::Roughness => self.roughness.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: MapSlot) -> &mut Option<TextureHandle> {
        match slot {
            MapSlot::Colour => &mut self.colour,
            MapSlot::Alpha => &mut self.alpha,
            MapSlot::AmbientOcclusion => &mut self.ambient_occlusion,
            MapSlot::Displacement => &mut self.displacement,
            MapSlot::Normal => &mut self.normal,
            MapSlot::Metalness => &mut self.metalness,
            MapSlot::Roughness => &mut self.roughness,
        }
    }

    /// The map in `slot` if it has decoded. Pending and failed maps count as absent.
    pub fn ready(&self, slot: MapSlot) -> Option<&TextureHandle> {
        self.get(slot).filter(|handle| handle.is_ready())
    }

    pub fn iter(&self) -> impl Iterator<Item = (MapSlot, &TextureHandle)> {
        MapSlot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|handle| (slot, handle)))
    }
}

/// Standard metal/rough material.
#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub colour: Colour,
    pub opacity: f32,
    pub transparent: bool,
    pub metalness: f32,
    pub roughness: f32,
    pub displacement_scale: f32,
    pub maps: MaterialMaps,
}

impl Material {
    pub fn standard(name: &str, colour: Colour) -> Self {
        Self {
            name: name.to_string(),
            colour,
            opacity: 1.0,
            transparent: false,
            metalness: 0.0,
            roughness: 1.0,
            displacement_scale: 1.0,
            maps: MaterialMaps::default(),
        }
    }

    pub fn with_map(mut self, slot: MapSlot, texture: TextureHandle) -> Self {
        *self.maps.slot_mut(slot) = Some(texture);
        self
    }

    pub fn with_transparency(mut self) -> Self {
        self.transparent = true;
        self
    }

    pub fn with_displacement_scale(mut self, scale: f32) -> Self {
        self.displacement_scale = scale;
        self
    }

    /// Sum of the versions of all maps; changes whenever any map resolves.
    pub fn version(&self) -> u64 {
        self.maps.iter().map(|(_, handle)| handle.version()).sum()
    }

    /// Sampling shared by all maps of this material, taken from the first map.
    pub fn sampling(&self) -> Sampling {
        self.maps
            .iter()
            .next()
            .map(|(_, handle)| handle.sampling())
            .unwrap_or_default()
    }
}
