/// FrameSlot - per frame-in-flight synchronization and command buffer
///
/// A slot is reused only after its fence reports the previous submission
/// from that slot retired.

use ash::vk;
use tandem_engine::tandem::{Error, Result};
use tandem_engine::{engine_err, engine_error};

pub struct FrameSlot {
    /// Signaled by acquire, waited on by the submission
    pub(crate) image_available: vk::Semaphore,
    /// Signaled when the slot's submission retires; created signaled
    pub(crate) in_flight: vk::Fence,
    pub(crate) command_buffer: vk::CommandBuffer,
}

/// Every slot plus the command pool their command buffers come from
pub struct FrameSlots {
    device: ash::Device,
    command_pool: vk::CommandPool,
    slots: Vec<FrameSlot>,
}

impl FrameSlots {
    pub fn new(device: &ash::Device, queue_family: u32, count: usize) -> Result<Self> {
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let command_pool = device.create_command_pool(&pool_info, None).map_err(|e| {
                engine_error!("tandem::vulkan", "Failed to create frame command pool: {:?}", e);
                Error::InitializationFailed(format!("Failed to create command pool: {:?}", e))
            })?;

            let mut frames = Self {
                device: device.clone(),
                command_pool,
                slots: Vec::with_capacity(count),
            };

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(count as u32);
            let command_buffers = device.allocate_command_buffers(&allocate_info).map_err(|e| {
                engine_error!("tandem::vulkan", "Failed to allocate frame command buffers: {:?}", e);
                Error::InitializationFailed(format!("Failed to allocate command buffers: {:?}", e))
            })?;

            let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
            for command_buffer in command_buffers {
                let image_available = device
                    .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                    .map_err(|e| engine_err!("tandem::vulkan", "Failed to create semaphore: {:?}", e))?;
                let in_flight = match device.create_fence(&fence_info, None) {
                    Ok(fence) => fence,
                    Err(e) => {
                        device.destroy_semaphore(image_available, None);
                        return Err(engine_err!("tandem::vulkan", "Failed to create fence: {:?}", e));
                    }
                };
                frames.slots.push(FrameSlot {
                    image_available,
                    in_flight,
                    command_buffer,
                });
            }
            Ok(frames)
        }
    }

    pub fn slot(&self, index: usize) -> &FrameSlot {
        &self.slots[index]
    }

    /// Block until the slot's last submission retired
    pub fn wait(&self, index: usize) -> Result<()> {
        unsafe {
            self.device
                .wait_for_fences(&[self.slots[index].in_flight], true, u64::MAX)
                .map_err(|e| engine_err!("tandem::vulkan", "Failed to wait for frame fence: {:?}", e))
        }
    }

    /// Slots whose last submission has not retired
    pub fn unsignaled_count(&self) -> Result<usize> {
        let mut count = 0;
        for slot in &self.slots {
            let signaled = unsafe { self.device.get_fence_status(slot.in_flight) }
                .map_err(|e| engine_err!("tandem::vulkan", "Failed to query frame fence: {:?}", e))?;
            if !signaled {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn reset(&self, index: usize) -> Result<()> {
        unsafe {
            self.device
                .reset_fences(&[self.slots[index].in_flight])
                .map_err(|e| engine_err!("tandem::vulkan", "Failed to reset frame fence: {:?}", e))
        }
    }
}

impl Drop for FrameSlots {
    fn drop(&mut self) {
        unsafe {
            for slot in &self.slots {
                self.device.destroy_fence(slot.in_flight, None);
                self.device.destroy_semaphore(slot.image_available, None);
            }
            // Frees the command buffers with it
            self.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
