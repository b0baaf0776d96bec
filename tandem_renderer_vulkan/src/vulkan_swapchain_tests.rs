use super::*;

fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
    vk::SurfaceFormatKHR { format, color_space }
}

fn capabilities(current: (u32, u32)) -> vk::SurfaceCapabilitiesKHR {
    vk::SurfaceCapabilitiesKHR {
        min_image_count: 2,
        max_image_count: 8,
        current_extent: vk::Extent2D { width: current.0, height: current.1 },
        min_image_extent: vk::Extent2D { width: 16, height: 16 },
        max_image_extent: vk::Extent2D { width: 4096, height: 2048 },
        ..Default::default()
    }
}

// ============================================================================
// SURFACE FORMAT
// ============================================================================

#[test]
fn test_undefined_format_means_any() {
    let chosen = choose_surface_format(&[format(vk::Format::UNDEFINED, vk::ColorSpaceKHR::SRGB_NONLINEAR)]).unwrap();
    assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
    assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
}

#[test]
fn test_preferred_format_found_later_in_list() {
    let formats = [
        format(vk::Format::A2B10G10R10_UNORM_PACK32, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
    ];
    assert_eq!(choose_surface_format(&formats).unwrap().format, vk::Format::B8G8R8A8_UNORM);
}

#[test]
fn test_preferred_format_needs_srgb_color_space() {
    let formats = [
        format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT),
    ];
    // No exact match: first reported format
    assert_eq!(choose_surface_format(&formats).unwrap().format, vk::Format::B8G8R8A8_SRGB);
}

#[test]
fn test_no_formats() {
    assert!(choose_surface_format(&[]).is_none());
}

// ============================================================================
// PRESENT MODE
// ============================================================================

#[test]
fn test_mailbox_preferred() {
    let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE];
    assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
}

#[test]
fn test_fifo_fallback() {
    assert_eq!(choose_present_mode(&[vk::PresentModeKHR::IMMEDIATE]), vk::PresentModeKHR::FIFO);
    assert_eq!(choose_present_mode(&[]), vk::PresentModeKHR::FIFO);
}

// ============================================================================
// EXTENT AND IMAGE COUNT
// ============================================================================

#[test]
fn test_current_extent_wins() {
    let extent = choose_extent(&capabilities((1200, 675)), (800, 600));
    assert_eq!((extent.width, extent.height), (1200, 675));
}

#[test]
fn test_application_extent_clamped() {
    let caps = capabilities((u32::MAX, u32::MAX));
    let extent = choose_extent(&caps, (8000, 4));
    assert_eq!((extent.width, extent.height), (4096, 16));

    let extent = choose_extent(&caps, (1200, 675));
    assert_eq!((extent.width, extent.height), (1200, 675));
}

#[test]
fn test_chain_limits_from_capabilities() {
    let limits = chain_limits(&capabilities((1, 1)));
    assert_eq!(limits.min_image_count, 2);
    assert_eq!(limits.max_image_count, 8);
    assert_eq!(limits.image_count(), 3);
}

// ============================================================================
// DEPTH FORMAT
// ============================================================================

#[test]
fn test_depth_format_order() {
    assert_eq!(choose_depth_format(|_| true), Some(vk::Format::D32_SFLOAT_S8_UINT));
    assert_eq!(
        choose_depth_format(|f| f != vk::Format::D32_SFLOAT_S8_UINT),
        Some(vk::Format::D32_SFLOAT)
    );
    assert_eq!(
        choose_depth_format(|f| f == vk::Format::D24_UNORM_S8_UINT),
        Some(vk::Format::D24_UNORM_S8_UINT)
    );
    assert_eq!(choose_depth_format(|_| false), None);
}
