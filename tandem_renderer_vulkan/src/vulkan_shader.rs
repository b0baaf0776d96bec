/// ShaderModule - a VkShaderModule loaded from a SPIR-V file

use ash::vk;
use std::path::Path;
use tandem_engine::tandem::{Error, Result};
use tandem_engine::{engine_debug, engine_error};

/// Compiled shader file names expected in the shader directory
pub const GEOMETRY_VERTEX_SHADER: &str = "geometry.vert.spv";
pub const GEOMETRY_FRAGMENT_SHADER: &str = "geometry.frag.spv";
pub const COMPOSITION_VERTEX_SHADER: &str = "composition.vert.spv";
pub const COMPOSITION_FRAGMENT_SHADER: &str = "composition.frag.spv";

/// Read a SPIR-V binary as 32-bit words.
///
/// Any failure is a setup error: the renderer cannot start without its shaders.
pub fn read_spirv(path: &Path) -> Result<Vec<u32>> {
    let mut file = std::fs::File::open(path).map_err(|e| {
        engine_error!("tandem::vulkan", "Cannot open shader '{}': {}", path.display(), e);
        Error::InitializationFailed(format!("Cannot open shader '{}': {}", path.display(), e))
    })?;
    ash::util::read_spv(&mut file).map_err(|e| {
        engine_error!("tandem::vulkan", "Invalid SPIR-V in '{}': {}", path.display(), e);
        Error::InitializationFailed(format!("Invalid SPIR-V in '{}': {}", path.display(), e))
    })
}

pub struct ShaderModule {
    pub(crate) module: vk::ShaderModule,
    device: ash::Device,
}

impl ShaderModule {
    pub fn load(device: &ash::Device, path: &Path) -> Result<Self> {
        let code = read_spirv(path)?;
        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe { device.create_shader_module(&create_info, None) }.map_err(|e| {
            engine_error!("tandem::vulkan", "Failed to create shader module '{}': {:?}", path.display(), e);
            Error::InitializationFailed(format!("Failed to create shader module: {:?}", e))
        })?;
        engine_debug!("tandem::vulkan", "Loaded shader '{}' ({} words)", path.display(), code.len());
        Ok(Self {
            module,
            device: device.clone(),
        })
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_engine::tandem::ErrorKind;

    fn temp_file(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("tandem_shader_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_missing_shader_is_setup_error() {
        let err = read_spirv(Path::new("does/not/exist.spv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Setup);
    }

    #[test]
    fn test_reads_words() {
        // SPIR-V magic number followed by one word
        let mut bytes = 0x0723_0203u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        let words = read_spirv(&temp_file("ok.spv", &bytes)).unwrap();
        assert_eq!(words, vec![0x0723_0203, 7]);
    }

    #[test]
    fn test_truncated_binary_rejected() {
        let err = read_spirv(&temp_file("bad.spv", &[1, 2, 3])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Setup);
    }
}
