/*!
# Tandem - Vulkan Renderer Backend

Vulkan implementation of the Tandem [`Renderer`](tandem_engine::tandem::Renderer)
trait, using Ash for the Vulkan bindings and gpu-allocator for memory.

Each frame renders in one render pass with two subpasses: the geometry
subpass draws every model into an intermediate color attachment and a depth
attachment, and the composition subpass reads both back as input attachments
into the presentable image.

```no_run
use tandem_engine::tandem::{Renderer, RendererConfig};
use tandem_renderer_vulkan::VulkanRenderer;
# fn run(window: &winit::window::Window) -> tandem_engine::tandem::Result<()> {
let size = window.inner_size();
let mut renderer = VulkanRenderer::new(window, (size.width, size.height), RendererConfig::default())?;
renderer.load_model("Models/Seahawk.obj".as_ref())?;
renderer.draw()?;
# Ok(())
# }
```
*/

// Device and memory
mod vulkan_context;
mod vulkan_device;
mod vulkan_buffer;
mod vulkan_image;
mod vulkan_transfer;

// Presentation and render pass
mod vulkan_swapchain;
mod vulkan_render_pass;
mod vulkan_frame_targets;
mod vulkan_frame;

// Pipelines and descriptors
mod vulkan_shader;
mod vulkan_descriptor;
mod vulkan_sampler;
mod vulkan_pipeline;

// Scene resources
mod vulkan_mesh;
mod vulkan_texture;

mod vulkan_renderer;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan_renderer::VulkanRenderer;
pub use vulkan_shader::read_spirv;

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};
