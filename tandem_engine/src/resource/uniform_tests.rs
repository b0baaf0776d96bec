use super::*;
use glam::Vec4;

// ============================================================================
// Layout tests
// ============================================================================

#[test]
fn test_ubo_is_two_matrices() {
    assert_eq!(std::mem::size_of::<UboViewProjection>(), 128);
    assert_eq!(MODEL_PUSH_CONSTANT_SIZE, 64);
}

#[test]
fn test_ubo_bytes_start_with_projection() {
    let ubo = UboViewProjection {
        projection: Mat4::from_scale(Vec3::splat(2.0)),
        view: Mat4::IDENTITY,
    };
    let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&ubo));
    assert_eq!(floats[0], 2.0);
    assert_eq!(floats[16], 1.0);
}

// ============================================================================
// Camera tests
// ============================================================================

#[test]
fn test_projection_flips_y() {
    let ubo = UboViewProjection::from_camera(&CameraConfig::default(), 1200, 675);
    assert!(ubo.projection.y_axis.y < 0.0);
}

#[test]
fn test_target_maps_to_screen_center() {
    let camera = CameraConfig::default();
    let ubo = UboViewProjection::from_camera(&camera, 1200, 675);
    let clip = ubo.projection * ubo.view * Vec4::new(0.0, 0.0, 0.0, 1.0);
    let ndc = clip / clip.w;
    assert!(ndc.x.abs() < 1e-5);
    assert!(ndc.y.abs() < 1e-5);
    assert!(ndc.z > 0.0 && ndc.z < 1.0);
}

#[test]
fn test_zero_height_does_not_produce_nan() {
    let ubo = UboViewProjection::from_camera(&CameraConfig::default(), 800, 0);
    assert!(!ubo.projection.is_nan());
}
