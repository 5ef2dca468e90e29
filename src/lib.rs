//! haunted-house
//!
//! A small 3D scene rendered with wgpu: a house with a textured door, bushes,
//! a graveyard of randomly placed graves and three ghost lights circling
//! around it. Runs natively and in the browser.
//!
//! High-level modules
//! - `config`: scene preset and environment configuration
//! - `data_structures`: geometry, materials, textures, transforms and the scene graph
//! - `resources`: asset loading with progress notifications and GPU mesh upload
//! - `scene`: construction of the haunted house scene graph
//! - `lighting`: the light rig and the ghost animation
//! - `camera`: camera, projection, viewport and orbit controls
//! - `tweak`: live light tweak panel
//! - `pipelines`: render pipelines, light uniforms and the optional GUI overlay
//! - `context`: window, device, queue and per-frame uniforms
//! - `render`: instanced batching and drawing of the scene
//! - `flow`: application state, frame step and the event loop
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod lighting;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod tweak;

pub use config::{Config, Preset};
pub use flow::{AppState, FrameTarget, Scheduler, run, step, step_at};
