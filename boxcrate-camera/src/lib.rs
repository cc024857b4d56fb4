//! Camera model and transform pipeline
//! 
//! This crate derives view, projection and viewport matrices from camera
//! parameters and composes them into a single world → canvas pipeline:
//! - Orthographic and perspective cameras with type-checked mutators
//! - Canvas viewport mapping
//! - World ↔ canvas conversions

pub mod camera;
pub mod viewport;
pub mod pipeline;

pub use camera::*;
pub use viewport::*;
pub use pipeline::*;
