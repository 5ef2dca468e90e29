//! Render pipelines and their uniforms.
//!
//! - `basic` draws opaque materials
//! - `transparent` blends transparent materials over them
//! - `light` packs the lighting rig into a uniform buffer
//! - `gui` renders the egui tweak panel on top (feature `ui`)

pub mod basic;
#[cfg(feature = "ui")]
pub mod gui;
pub mod light;
pub mod transparent;
