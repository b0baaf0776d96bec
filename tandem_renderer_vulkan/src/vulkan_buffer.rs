/// Buffer - a VkBuffer with its gpu-allocator allocation

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;
use tandem_engine::tandem::{Error, Result};
use tandem_engine::{engine_err, engine_error};

use crate::vulkan_context::GpuContext;

pub struct Buffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

impl Buffer {
    /// Create a buffer and bind freshly allocated memory from `location`
    pub fn new(
        ctx: Arc<GpuContext>,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
        name: &str,
    ) -> Result<Self> {
        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(size.max(1))
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx.device.create_buffer(&create_info, None).map_err(|e| {
                engine_err!("tandem::vulkan", "Failed to create buffer '{}' ({} bytes): {:?}", name, size, e)
            })?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = ctx
                .allocator
                .lock()
                .map_err(|_| Error::BackendError("Allocator lock poisoned".to_string()))
                .and_then(|mut allocator| {
                    allocator
                        .allocate(&AllocationCreateDesc {
                            name,
                            requirements,
                            location,
                            linear: true,
                            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                        })
                        .map_err(|_| {
                            let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                            engine_error!("tandem::vulkan", "Out of GPU memory for buffer '{}' ({:.2} MB)", name, size_mb);
                            Error::OutOfMemory
                        })
                });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            // From here on Drop cleans up both
            let buffer = Self {
                ctx,
                buffer,
                allocation: Some(allocation),
                size,
            };
            if let Some(allocation) = &buffer.allocation {
                buffer
                    .ctx
                    .device
                    .bind_buffer_memory(buffer.buffer, allocation.memory(), allocation.offset())
                    .map_err(|e| engine_err!("tandem::vulkan", "Failed to bind buffer memory: {:?}", e))?;
            }
            Ok(buffer)
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Copy `data` into a host-visible buffer at `offset`
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            return Err(Error::InvalidResource(format!(
                "Write of {} bytes at {} exceeds buffer size {}",
                data.len(),
                offset,
                self.size
            )));
        }
        let mapped = self.mapped_ptr()?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.add(offset as usize), data.len());
        }
        Ok(())
    }

    /// Copy the whole content of a host-visible buffer out
    pub fn read(&self) -> Result<Vec<u8>> {
        let mapped = self.mapped_ptr()?;
        let mut out = vec![0u8; self.size as usize];
        unsafe {
            std::ptr::copy_nonoverlapping(mapped, out.as_mut_ptr(), out.len());
        }
        Ok(out)
    }

    fn mapped_ptr(&self) -> Result<*mut u8> {
        let allocation = self
            .allocation
            .as_ref()
            .ok_or_else(|| Error::BackendError("Buffer has no allocation".to_string()))?;
        allocation
            .mapped_ptr()
            .map(|ptr| ptr.as_ptr() as *mut u8)
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
