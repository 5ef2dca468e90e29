//! Scene data structures.
//!
//! - `geometry` holds parametric shapes and their triangulation
//! - `material` holds colours and standard surface parameters
//! - `texture` contains shared texture handles and the GPU texture wrapper
//! - `instance` holds per-instance transformation data
//! - `model` defines the vertex layout and uploaded meshes
//! - `scene_graph` enables hierarchical scene organization

pub mod geometry;
pub mod instance;
pub mod material;
pub mod model;
pub mod scene_graph;
pub mod texture;
