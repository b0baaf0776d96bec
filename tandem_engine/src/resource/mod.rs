//! CPU-side resource formats shared with the GPU
//!
//! Vertex layout, the per-frame uniform block and decoded images.

mod vertex;
mod uniform;
mod image_data;

pub use vertex::{Vertex, VertexAttribute};
pub use uniform::{UboViewProjection, CameraConfig, MODEL_PUSH_CONSTANT_SIZE};
pub use image_data::{ImageData, load_rgba8};
