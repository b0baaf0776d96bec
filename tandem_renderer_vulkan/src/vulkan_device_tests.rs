use super::*;

fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
    vk::QueueFamilyProperties {
        queue_flags: flags,
        queue_count: 1,
        ..Default::default()
    }
}

fn good_candidate() -> DeviceCandidate {
    DeviceCandidate {
        families: QueueFamilyIndices { graphics: Some(0), present: Some(0) },
        missing_extensions: Vec::new(),
        surface_format_count: 2,
        present_mode_count: 1,
        sampler_anisotropy: true,
    }
}

// ============================================================================
// QUEUE FAMILIES
// ============================================================================

#[test]
fn test_single_family_does_both() {
    let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER)];
    let indices = QueueFamilyIndices::find(&families, |_| true);
    assert_eq!(indices, QueueFamilyIndices { graphics: Some(0), present: Some(0) });
    assert!(indices.is_complete());
}

#[test]
fn test_separate_present_family() {
    let families = [family(vk::QueueFlags::GRAPHICS), family(vk::QueueFlags::TRANSFER)];
    let indices = QueueFamilyIndices::find(&families, |i| i == 1);
    assert_eq!(indices.graphics, Some(0));
    assert_eq!(indices.present, Some(1));
}

#[test]
fn test_present_prefers_graphics_family() {
    let families = [family(vk::QueueFlags::COMPUTE), family(vk::QueueFlags::GRAPHICS)];
    let indices = QueueFamilyIndices::find(&families, |_| true);
    assert_eq!(indices.graphics, Some(1));
    assert_eq!(indices.present, Some(1));
}

#[test]
fn test_no_present_support_is_incomplete() {
    let families = [family(vk::QueueFlags::GRAPHICS)];
    let indices = QueueFamilyIndices::find(&families, |_| false);
    assert!(!indices.is_complete());
}

#[test]
fn test_empty_family_ignored() {
    let mut empty = family(vk::QueueFlags::GRAPHICS);
    empty.queue_count = 0;
    let families = [empty, family(vk::QueueFlags::GRAPHICS)];
    let indices = QueueFamilyIndices::find(&families, |_| true);
    assert_eq!(indices.graphics, Some(1));
}

// ============================================================================
// CANDIDATE REJECTION
// ============================================================================

#[test]
fn test_good_candidate_accepted() {
    assert!(good_candidate().rejection().is_none());
}

#[test]
fn test_candidate_rejections() {
    let mut c = good_candidate();
    c.families.present = None;
    assert!(c.rejection().is_some());

    let mut c = good_candidate();
    c.missing_extensions = vec!["VK_KHR_swapchain".to_string()];
    assert!(c.rejection().unwrap().contains("VK_KHR_swapchain"));

    let mut c = good_candidate();
    c.surface_format_count = 0;
    assert!(c.rejection().is_some());

    let mut c = good_candidate();
    c.present_mode_count = 0;
    assert!(c.rejection().is_some());

    let mut c = good_candidate();
    c.sampler_anisotropy = false;
    assert!(c.rejection().is_some());
}

#[test]
fn test_missing_extensions() {
    let required = required_device_extensions();
    assert_eq!(missing_extensions(&[], &required), vec!["VK_KHR_swapchain".to_string()]);
    assert!(missing_extensions(&[ash::khr::swapchain::NAME, c"VK_KHR_other"], &required).is_empty());
}
