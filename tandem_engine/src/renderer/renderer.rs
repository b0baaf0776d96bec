/// Renderer trait - public operations of a frame-orchestrating backend

use std::path::{Path, PathBuf};
use glam::Mat4;

use crate::error::Result;
use crate::resource::CameraConfig;
use crate::scene::{load_obj_scene, ModelKey, SceneDescription};
use crate::engine_info;

// ============================================================================
// Configuration
// ============================================================================

/// Which validation messages reach the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    ErrorsOnly,
    ErrorsAndWarnings,
    All,
}

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Enable validation layers (needs the `vulkan-validation` backend feature)
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Directory holding the compiled SPIR-V shaders
    pub shader_directory: PathBuf,
    /// Directory texture file names from model materials are resolved against
    pub texture_directory: PathBuf,
    /// Capacity of the texture sampler pool, default texture included
    pub max_textures: usize,
    /// Clear color of the presented image (RGBA)
    pub clear_color: [f32; 4],
    /// Camera used to compute the per-frame view/projection block
    pub camera: CameraConfig,
    /// Validation message filter
    pub debug_severity: DebugSeverity,
    /// Panic on the first validation error
    pub panic_on_validation_error: bool,
    /// Count validation messages per severity
    pub enable_validation_stats: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Tandem Application".to_string(),
            app_version: (1, 0, 0),
            shader_directory: PathBuf::from("shaders"),
            texture_directory: PathBuf::from("Textures"),
            max_textures: 20,
            clear_color: [0.6, 0.65, 0.4, 1.0],
            camera: CameraConfig::default(),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            panic_on_validation_error: false,
            enable_validation_stats: true,
        }
    }
}

/// Renderer statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Frames submitted and presented
    pub frames_drawn: u64,
    /// Frames dropped because the image chain was out of date
    pub frames_skipped: u64,
    /// Image chain rebuilds since startup
    pub chain_rebuilds: u32,
    /// Presentable images in the current chain
    pub image_count: u32,
    /// Indexed draws recorded in the last frame (composition draw excluded)
    pub draw_calls: u32,
    /// Live models
    pub models: u32,
    /// Live textures, default included
    pub textures: u32,
}

// ============================================================================
// Renderer trait
// ============================================================================

/// Main renderer trait
///
/// Construction is the backend's `new()` (the init operation); `destroy()`
/// releases every GPU object and is also run on drop.
pub trait Renderer {
    /// Render and present one frame.
    ///
    /// An out-of-date image chain is rebuilt and the frame skipped; only
    /// setup-kind errors are returned.
    fn draw(&mut self) -> Result<()>;

    /// Notify the renderer that the surface size changed. The chain is
    /// rebuilt at the start of the next `draw()`.
    fn resize(&mut self, width: u32, height: u32);

    /// Upload every mesh of `scene` as one model
    fn load_scene(&mut self, scene: &SceneDescription) -> Result<ModelKey>;

    /// Load a model file (Wavefront OBJ) and upload it as one model
    fn load_model(&mut self, path: &Path) -> Result<ModelKey> {
        let scene = load_obj_scene(path)?;
        let key = self.load_scene(&scene)?;
        engine_info!(
            "tandem::renderer",
            "Loaded model '{}' ({} meshes)",
            path.display(),
            scene.meshes.len()
        );
        Ok(key)
    }

    /// Set the model matrix pushed for every mesh of `model`
    fn set_model_matrix(&mut self, model: ModelKey, matrix: Mat4) -> Result<()>;

    /// Remove a model; its GPU buffers are released once no frame uses them
    fn remove_model(&mut self, model: ModelKey) -> Result<()>;

    /// Replace the camera used for the per-frame uniform block
    fn set_camera(&mut self, camera: CameraConfig);

    /// Wait for all GPU operations to complete
    fn wait_idle(&self) -> Result<()>;

    /// Get statistics about the renderer
    fn stats(&self) -> RendererStats;

    /// Release every GPU object. Further calls are no-ops.
    fn destroy(&mut self);
}
