//! Scene presets and environment driven configuration.

use std::{fmt, str::FromStr};

use anyhow::bail;

use crate::data_structures::material::Colour;

pub const PRESET_VAR: &str = "HAUNTED_HOUSE_PRESET";
pub const ASSETS_VAR: &str = "HAUNTED_HOUSE_ASSETS";

/// The two variants the scene comes in.
///
/// `Classic` is the flat coloured scene with a bright door light; `Haunted`
/// adds the texture maps, a dimmer door light and a dark blue background.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Preset {
    Classic,
    #[default]
    Haunted,
}

impl Preset {
    pub fn door_light_intensity(&self) -> f32 {
        match self {
            Preset::Classic => 3.0,
            Preset::Haunted => 1.0,
        }
    }

    /// Symmetric bound of the door light intensity slider.
    pub fn door_light_range(&self) -> f32 {
        match self {
            Preset::Classic => 3.0,
            Preset::Haunted => 2.0,
        }
    }

    pub fn textured(&self) -> bool {
        matches!(self, Preset::Haunted)
    }

    pub fn clear_colour(&self) -> Colour {
        match self {
            Preset::Classic => Colour::BLACK,
            Preset::Haunted => Colour::from_hex("#262837"),
        }
    }
}

impl FromStr for Preset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Preset::Classic),
            "haunted" => Ok(Preset::Haunted),
            other => bail!("unknown preset {other:?}, expected \"classic\" or \"haunted\""),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Classic => write!(f, "classic"),
            Preset::Haunted => write!(f, "haunted"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub preset: Preset,
    /// Directory (or url path on the web) that texture paths are relative to.
    pub asset_root: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preset: Preset::default(),
            asset_root: "assets".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Config::default();
        if let Some(preset) = lookup(PRESET_VAR) {
            config.preset = preset.parse()?;
        }
        if let Some(root) = lookup(ASSETS_VAR).filter(|root| !root.is_empty()) {
            config.asset_root = root;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_haunted() {
        let config = Config::from_lookup(|_| None).expect("valid");
        assert_eq!(config, Config::default());
        assert_eq!(config.preset, Preset::Haunted);
    }

    #[test]
    fn parses_variables() {
        let config = Config::from_lookup(|key| match key {
            PRESET_VAR => Some(" Classic ".into()),
            ASSETS_VAR => Some("/srv/house".into()),
            _ => None,
        })
        .expect("valid");
        assert_eq!(config.preset, Preset::Classic);
        assert_eq!(config.asset_root, "/srv/house");
    }

    #[test]
    fn rejects_unknown_preset() {
        let err = Config::from_lookup(|key| (key == PRESET_VAR).then(|| "spooky".into()))
            .expect_err("invalid preset");
        assert!(err.to_string().contains("spooky"));
    }
}
