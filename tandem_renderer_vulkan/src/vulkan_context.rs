/// GpuContext - device-level objects shared by every Vulkan resource
///
/// Buffers, images, meshes and textures hold an `Arc<GpuContext>` so they can
/// free their memory and destroy their handles on drop without reaching back
/// into the renderer.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::Mutex;

/// Shared GPU context for all Vulkan resources.
///
/// Device and instance destruction is done by `VulkanRenderer::destroy()`,
/// which first drops the allocator so its memory blocks are released while
/// the device is still alive.
pub struct GpuContext {
    /// Logical device
    pub device: ash::Device,

    pub physical_device: vk::PhysicalDevice,

    /// GPU memory allocator, dropped explicitly before the device
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Queue used for rendering and transfers
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,

    /// Queue used for presentation (may equal the graphics queue)
    pub present_queue: vk::Queue,
    pub present_queue_family: u32,

    /// Command pool for one-shot transfer command buffers
    /// (TRANSIENT + RESET_COMMAND_BUFFER)
    pub transfer_command_pool: Mutex<vk::CommandPool>,

    /// Device limit used to clamp sampler anisotropy
    pub max_sampler_anisotropy: f32,
}

impl GpuContext {
    /// Graphics and present queue families, deduplicated
    pub fn queue_families(&self) -> Vec<u32> {
        if self.graphics_queue_family == self.present_queue_family {
            vec![self.graphics_queue_family]
        } else {
            vec![self.graphics_queue_family, self.present_queue_family]
        }
    }
}
