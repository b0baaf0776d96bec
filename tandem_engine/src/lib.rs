/*!
# Tandem Engine

Backend-agnostic core of the Tandem two-pass renderer.

This crate holds everything that does not need a GPU: the error taxonomy, the
logging facade, renderer configuration, the frames-in-flight ring, the scene
resource registry and scene import. Backends (see `tandem_renderer_vulkan`)
implement the [`tandem::Renderer`] trait on top of it.

## Architecture

- **Renderer**: public operations (`draw`, `load_model`, `set_model_matrix`, ...)
- **FrameRing**: which frame slot records next and which slot last used each image
- **SceneRegistry**: models and textures behind generation-checked keys
- **SceneDescription**: hierarchical scene flattened into one model per load
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod frame;
pub mod renderer;
pub mod resource;
pub mod scene;

// Main tandem namespace module
pub mod tandem {
    // Error types
    pub use crate::error::{Error, ErrorKind, Result};

    // Logging facade
    pub use crate::engine::Engine;

    // Renderer trait and configuration
    pub use crate::renderer::{Renderer, RendererConfig, RendererStats, DebugSeverity};

    // Logging sub-module (types only, macros are exported at crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, format_entry};
    }

    // Frame pacing sub-module
    pub mod frame {
        pub use crate::frame::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
