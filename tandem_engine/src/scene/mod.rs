//! Scene resource registry and scene import
//!
//! - `registry`: models and textures behind generation-checked keys
//! - `import`: hierarchical scene descriptions flattened into one model
//! - `obj_loader`: Wavefront OBJ files into scene descriptions

mod registry;
mod import;
mod obj_loader;

pub use registry::{SceneRegistry, MeshModel, ModelKey, TextureKey};
pub use import::{
    SceneDescription, SceneNode, MeshData, MaterialDesc,
    ingest_scene, texture_file_name,
};
pub use obj_loader::load_obj_scene;
