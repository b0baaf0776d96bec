/// Sampler - the single linear/repeat sampler shared by every texture

use ash::vk;
use tandem_engine::tandem::{Error, Result};
use tandem_engine::engine_error;

/// Anisotropy requested when the device allows it
const MAX_ANISOTROPY: f32 = 16.0;

pub struct Sampler {
    pub(crate) sampler: vk::Sampler,
    device: ash::Device,
}

impl Sampler {
    pub fn new(device: &ash::Device, device_max_anisotropy: f32) -> Result<Self> {
        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(0.0)
            .anisotropy_enable(true)
            .max_anisotropy(MAX_ANISOTROPY.min(device_max_anisotropy.max(1.0)));

        let sampler = unsafe { device.create_sampler(&create_info, None) }.map_err(|e| {
            engine_error!("tandem::vulkan", "Failed to create texture sampler: {:?}", e);
            Error::InitializationFailed(format!("Failed to create sampler: {:?}", e))
        })?;

        Ok(Self {
            sampler,
            device: device.clone(),
        })
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
        }
    }
}
