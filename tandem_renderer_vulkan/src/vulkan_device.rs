/// Instance creation and device selection
///
/// A physical device qualifies when it has a graphics queue family, a family
/// able to present to the surface, the swapchain extension, at least one
/// surface format and present mode, and sampler anisotropy. The first
/// qualifying device is used; none qualifying is a setup error.

use ash::vk;
use raw_window_handle::RawDisplayHandle;
use std::ffi::CStr;
use tandem_engine::tandem::{Error, RendererConfig, Result};
use tandem_engine::{engine_debug, engine_error, engine_info, engine_warn};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Device extensions every candidate must expose
pub(crate) fn required_device_extensions() -> [&'static CStr; 1] {
    [ash::khr::swapchain::NAME]
}

// ============================================================================
// Suitability (pure, no Vulkan calls)
// ============================================================================

/// Graphics and present queue families of one physical device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    /// First graphics-capable family and first family that can present.
    /// A family doing both is preferred for presentation.
    pub fn find(
        families: &[vk::QueueFamilyProperties],
        supports_present: impl Fn(u32) -> bool,
    ) -> Self {
        let mut indices = Self::default();
        for (i, family) in families.iter().enumerate() {
            let index = i as u32;
            if family.queue_count == 0 {
                continue;
            }
            let graphics = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
            let present = supports_present(index);
            if graphics && indices.graphics.is_none() {
                indices.graphics = Some(index);
            }
            if present && (indices.present.is_none() || (graphics && indices.graphics == Some(index))) {
                indices.present = Some(index);
            }
        }
        indices
    }

    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }
}

/// What a physical device offers, gathered before deciding
#[derive(Debug, Clone)]
pub(crate) struct DeviceCandidate {
    pub families: QueueFamilyIndices,
    pub missing_extensions: Vec<String>,
    pub surface_format_count: usize,
    pub present_mode_count: usize,
    pub sampler_anisotropy: bool,
}

impl DeviceCandidate {
    /// Reason the device cannot be used, if any
    pub fn rejection(&self) -> Option<String> {
        if !self.families.is_complete() {
            return Some("no graphics and present queue families".to_string());
        }
        if !self.missing_extensions.is_empty() {
            return Some(format!("missing extensions {:?}", self.missing_extensions));
        }
        if self.surface_format_count == 0 {
            return Some("surface reports no formats".to_string());
        }
        if self.present_mode_count == 0 {
            return Some("surface reports no present modes".to_string());
        }
        if !self.sampler_anisotropy {
            return Some("no sampler anisotropy".to_string());
        }
        None
    }
}

/// Required names absent from `available`
pub(crate) fn missing_extensions(available: &[&CStr], required: &[&CStr]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !available.contains(*name))
        .map(|name| name.to_string_lossy().into_owned())
        .collect()
}

// ============================================================================
// Instance
// ============================================================================

/// Create the instance with the window-system extensions, plus the
/// validation layer and debug-utils extension when validation is enabled and
/// available. Returns the instance and whether validation is active.
pub(crate) fn create_instance(
    entry: &ash::Entry,
    config: &RendererConfig,
    display: RawDisplayHandle,
) -> Result<(ash::Instance, bool)> {
    let app_name = std::ffi::CString::new(config.app_name.as_str())
        .map_err(|e| Error::InitializationFailed(format!("Invalid application name: {}", e)))?;
    let (major, minor, patch) = config.app_version;
    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, major, minor, patch))
        .engine_name(c"Tandem")
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_3);

    let mut extension_names = ash_window::enumerate_required_extensions(display)
        .map_err(|e| {
            engine_error!("tandem::vulkan", "Failed to get required extensions: {}", e);
            Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
        })?
        .to_vec();

    let validation = config.enable_validation && validation_available(entry);
    let mut layer_names = Vec::new();
    if validation {
        extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
        layer_names.push(VALIDATION_LAYER.as_ptr());
    }

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_layer_names(&layer_names)
        .enabled_extension_names(&extension_names);

    let instance = unsafe { entry.create_instance(&create_info, None) }.map_err(|e| {
        engine_error!("tandem::vulkan", "Failed to create Vulkan instance: {:?}", e);
        Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
    })?;

    engine_debug!(
        "tandem::vulkan",
        "Instance created ({} extensions, validation {})",
        extension_names.len(),
        if validation { "on" } else { "off" }
    );
    Ok((instance, validation))
}

fn validation_available(entry: &ash::Entry) -> bool {
    if !cfg!(feature = "vulkan-validation") {
        engine_warn!(
            "tandem::vulkan",
            "Validation requested but the backend was built without `vulkan-validation`"
        );
        return false;
    }
    let layers = unsafe { entry.enumerate_instance_layer_properties() }.unwrap_or_default();
    let found = layers
        .iter()
        .any(|layer| layer.layer_name_as_c_str().map_or(false, |name| name == VALIDATION_LAYER));
    if !found {
        engine_warn!("tandem::vulkan", "Validation layer not installed, continuing without it");
    }
    found
}

// ============================================================================
// Physical and logical device
// ============================================================================

/// The chosen physical device and its queue families
#[derive(Debug, Clone)]
pub(crate) struct DeviceSelection {
    pub physical_device: vk::PhysicalDevice,
    pub graphics_family: u32,
    pub present_family: u32,
    pub max_sampler_anisotropy: f32,
}

unsafe fn inspect_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
) -> DeviceCandidate {
    let family_properties = instance.get_physical_device_queue_family_properties(physical_device);
    let families = QueueFamilyIndices::find(&family_properties, |index| {
        surface_loader
            .get_physical_device_surface_support(physical_device, index, surface)
            .unwrap_or(false)
    });

    let extensions = instance
        .enumerate_device_extension_properties(physical_device)
        .unwrap_or_default();
    let available: Vec<&CStr> = extensions
        .iter()
        .filter_map(|ext| ext.extension_name_as_c_str().ok())
        .collect();

    let surface_format_count = surface_loader
        .get_physical_device_surface_formats(physical_device, surface)
        .map(|formats| formats.len())
        .unwrap_or(0);
    let present_mode_count = surface_loader
        .get_physical_device_surface_present_modes(physical_device, surface)
        .map(|modes| modes.len())
        .unwrap_or(0);

    let features = instance.get_physical_device_features(physical_device);

    DeviceCandidate {
        families,
        missing_extensions: missing_extensions(&available, &required_device_extensions()),
        surface_format_count,
        present_mode_count,
        sampler_anisotropy: features.sampler_anisotropy == vk::TRUE,
    }
}

/// Pick the first physical device able to render to `surface`
pub(crate) fn select_physical_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<DeviceSelection> {
    let physical_devices = unsafe { instance.enumerate_physical_devices() }.map_err(|e| {
        engine_error!("tandem::vulkan", "Failed to enumerate physical devices: {:?}", e);
        Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
    })?;

    for physical_device in physical_devices {
        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let name = properties
            .device_name_as_c_str()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "<unnamed>".to_string());

        let candidate = unsafe { inspect_device(instance, surface_loader, surface, physical_device) };
        if let Some(reason) = candidate.rejection() {
            engine_debug!("tandem::vulkan", "Skipping GPU '{}': {}", name, reason);
            continue;
        }

        let (Some(graphics_family), Some(present_family)) =
            (candidate.families.graphics, candidate.families.present)
        else {
            continue;
        };

        engine_info!(
            "tandem::vulkan",
            "Using GPU '{}' (graphics family {}, present family {})",
            name,
            graphics_family,
            present_family
        );
        return Ok(DeviceSelection {
            physical_device,
            graphics_family,
            present_family,
            max_sampler_anisotropy: properties.limits.max_sampler_anisotropy,
        });
    }

    engine_error!("tandem::vulkan", "No GPU can render to this surface");
    Err(Error::InitializationFailed("No suitable GPU found".to_string()))
}

/// Create the logical device with one queue per distinct family.
/// Returns (device, graphics queue, present queue).
pub(crate) fn create_logical_device(
    instance: &ash::Instance,
    selection: &DeviceSelection,
) -> Result<(ash::Device, vk::Queue, vk::Queue)> {
    let queue_priorities = [1.0];
    let mut families = vec![selection.graphics_family];
    if selection.present_family != selection.graphics_family {
        families.push(selection.present_family);
    }
    let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = families
        .iter()
        .map(|&family| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(family)
                .queue_priorities(&queue_priorities)
        })
        .collect();

    let extension_names: Vec<*const std::os::raw::c_char> = required_device_extensions()
        .iter()
        .map(|name| name.as_ptr())
        .collect();
    let features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);

    let create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names)
        .enabled_features(&features);

    unsafe {
        let device = instance
            .create_device(selection.physical_device, &create_info, None)
            .map_err(|e| {
                engine_error!("tandem::vulkan", "Failed to create logical device: {:?}", e);
                Error::InitializationFailed(format!("Failed to create device: {:?}", e))
            })?;
        let graphics_queue = device.get_device_queue(selection.graphics_family, 0);
        let present_queue = device.get_device_queue(selection.present_family, 0);
        Ok((device, graphics_queue, present_queue))
    }
}

#[cfg(test)]
#[path = "vulkan_device_tests.rs"]
mod tests;
