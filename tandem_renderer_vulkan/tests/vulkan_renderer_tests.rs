//! Integration tests for VulkanRenderer
//!
//! All tests require a GPU, a window system and the compiled shaders in
//! `shaders/`, and are marked with #[ignore] and #[serial] (one device at a
//! time). winit allows one event loop per process, so run them one at a time:
//!
//! cargo test --test vulkan_renderer_tests -- --ignored --exact <name>

use serial_test::serial;
use std::path::PathBuf;
use tandem_engine::glam::{Mat4, Vec3};
use tandem_engine::tandem::frame::MAX_FRAMES_IN_FLIGHT;
use tandem_engine::tandem::resource::Vertex;
use tandem_engine::tandem::scene::{MaterialDesc, MeshData, SceneDescription, SceneNode};
use tandem_engine::tandem::{ErrorKind, Renderer, RendererConfig};
use tandem_renderer_vulkan::VulkanRenderer;
use winit::event_loop::EventLoop;
use winit::window::Window;

/// Helper to create a hidden test window
#[allow(deprecated)]
fn create_test_window() -> (Window, EventLoop<()>) {
    let event_loop = EventLoop::new().unwrap();
    let window_attrs = Window::default_attributes()
        .with_title("Tandem Renderer Test")
        .with_inner_size(winit::dpi::PhysicalSize::new(800, 600))
        .with_visible(false); // Hidden window for tests
    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}

fn test_config() -> RendererConfig {
    let workspace = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..");
    RendererConfig {
        shader_directory: workspace.join("shaders"),
        texture_directory: workspace.join("Textures"),
        ..RendererConfig::default()
    }
}

fn create_renderer(window: &Window) -> VulkanRenderer {
    let size = window.inner_size();
    VulkanRenderer::new(window, (size.width, size.height), test_config()).unwrap()
}

/// One quad, no material
fn quad_scene() -> SceneDescription {
    SceneDescription {
        root: SceneNode {
            meshes: vec![0],
            children: vec![],
        },
        meshes: vec![MeshData {
            positions: vec![
                [-0.5, -0.5, 0.0],
                [0.5, -0.5, 0.0],
                [0.5, 0.5, 0.0],
                [-0.5, 0.5, 0.0],
            ],
            tex_coords: Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
            indices: vec![0, 1, 2, 2, 3, 0],
            material: None,
        }],
        materials: vec![],
    }
}

fn assert_per_image_counts_equal(renderer: &VulkanRenderer) {
    let (images, framebuffers, uniform_buffers, uniform_sets, input_sets) = renderer.per_image_counts();
    assert!(images >= 2);
    assert_eq!(framebuffers, images);
    assert_eq!(uniform_buffers, images);
    assert_eq!(uniform_sets, images);
    assert_eq!(input_sets, images);
}

// ============================================================================
// INIT / DESTROY
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_init_creates_per_image_objects() {
    let (window, _event_loop) = create_test_window();
    let renderer = create_renderer(&window);

    assert_per_image_counts_equal(&renderer);

    let stats = renderer.stats();
    assert_eq!(stats.image_count as usize, renderer.per_image_counts().0);
    assert_eq!(stats.textures, 1); // default texture
    assert_eq!(stats.models, 0);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_missing_shaders_fail_as_setup_error() {
    let (window, _event_loop) = create_test_window();
    let size = window.inner_size();
    let config = RendererConfig {
        shader_directory: PathBuf::from("does/not/exist"),
        ..test_config()
    };

    let error = VulkanRenderer::new(&window, (size.width, size.height), config).err().unwrap();
    assert_eq!(error.kind(), ErrorKind::Setup);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_destroy_is_idempotent() {
    let (window, _event_loop) = create_test_window();
    let mut renderer = create_renderer(&window);

    renderer.destroy();
    renderer.destroy();

    assert!(renderer.draw().is_err());
    assert_eq!(renderer.per_image_counts(), (0, 0, 0, 0, 0));
}

// ============================================================================
// DRAW
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_draw_empty_scene() {
    let (window, _event_loop) = create_test_window();
    let mut renderer = create_renderer(&window);

    for _ in 0..10 {
        renderer.draw().unwrap();
    }
    renderer.wait_idle().unwrap();

    let stats = renderer.stats();
    assert_eq!(stats.frames_drawn + stats.frames_skipped, 10);
    assert_eq!(stats.draw_calls, 0);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_draw_model_records_one_draw_per_mesh() {
    let (window, _event_loop) = create_test_window();
    let mut renderer = create_renderer(&window);

    let model = renderer.load_scene(&quad_scene()).unwrap();
    renderer
        .set_model_matrix(model, Mat4::from_rotation_z(0.5) * Mat4::from_scale(Vec3::splat(0.1)))
        .unwrap();

    for _ in 0..5 {
        renderer.draw().unwrap();
    }
    renderer.wait_idle().unwrap();

    assert_eq!(renderer.stats().draw_calls, 1);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_five_draws_use_slots_0_1_0_1_0() {
    let (window, _event_loop) = create_test_window();
    let mut renderer = create_renderer(&window);
    renderer.load_scene(&quad_scene()).unwrap();

    let mut slots = Vec::new();
    for frame in 1..=5 {
        slots.push(renderer.current_slot());
        renderer.draw().unwrap();
        assert_eq!(renderer.stats().frames_drawn, frame);
        assert!(renderer.outstanding_fences().unwrap() <= MAX_FRAMES_IN_FLIGHT);
    }

    assert_eq!(slots, vec![0, 1, 0, 1, 0]);
    assert_eq!(renderer.current_slot(), 1);

    renderer.wait_idle().unwrap();
    assert_eq!(renderer.outstanding_fences().unwrap(), 0);
}

// ============================================================================
// RESIZE
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_resize_twice_keeps_per_image_counts_equal() {
    let (window, _event_loop) = create_test_window();
    let mut renderer = create_renderer(&window);
    renderer.draw().unwrap();

    let _ = window.request_inner_size(winit::dpi::PhysicalSize::new(640, 480));
    renderer.resize(640, 480);
    renderer.draw().unwrap();
    assert_per_image_counts_equal(&renderer);

    let _ = window.request_inner_size(winit::dpi::PhysicalSize::new(1024, 768));
    renderer.resize(1024, 768);
    renderer.draw().unwrap();
    assert_per_image_counts_equal(&renderer);

    assert!(renderer.stats().chain_rebuilds >= 2);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_rebuild_with_same_extent_is_idempotent() {
    let (window, _event_loop) = create_test_window();
    let mut renderer = create_renderer(&window);
    let size = window.inner_size();

    renderer.resize(size.width, size.height);
    renderer.draw().unwrap();
    let first = (renderer.stats().image_count, renderer.extent());

    renderer.resize(size.width, size.height);
    renderer.draw().unwrap();
    let second = (renderer.stats().image_count, renderer.extent());

    assert_eq!(first, second);
    assert_per_image_counts_equal(&renderer);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_zero_size_skips_frames() {
    let (window, _event_loop) = create_test_window();
    let mut renderer = create_renderer(&window);

    renderer.resize(0, 0);
    renderer.draw().unwrap();
    renderer.draw().unwrap();

    let stats = renderer.stats();
    assert_eq!(stats.frames_drawn, 0);
    assert_eq!(stats.frames_skipped, 2);

    let size = window.inner_size();
    renderer.resize(size.width, size.height);
    renderer.draw().unwrap();
    assert_per_image_counts_equal(&renderer);
}

// ============================================================================
// SCENE RESOURCES
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_mesh_upload_reads_back_identical() {
    let (window, _event_loop) = create_test_window();
    let mut renderer = create_renderer(&window);
    let scene = quad_scene();

    let model = renderer.load_scene(&scene).unwrap();
    let (vertices, indices) = renderer.read_back_mesh(model, 0).unwrap();

    let expected: Vec<Vertex> = scene.meshes[0].vertices();
    assert_eq!(vertices, expected);
    assert_eq!(indices, scene.meshes[0].indices);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_mesh_without_material_uses_default_texture() {
    let (window, _event_loop) = create_test_window();
    let mut renderer = create_renderer(&window);

    let model = renderer.load_scene(&quad_scene()).unwrap();

    assert_eq!(renderer.mesh_texture_index(model, 0).unwrap(), 0);
    assert_eq!(renderer.mesh_texture_size(model, 0).unwrap(), (1, 1));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_missing_texture_file_falls_back_to_default() {
    let (window, _event_loop) = create_test_window();
    let mut renderer = create_renderer(&window);

    let mut scene = quad_scene();
    scene.materials.push(MaterialDesc {
        diffuse_texture: Some("missing_texture.png".to_string()),
    });
    scene.meshes[0].material = Some(0);

    let model = renderer.load_scene(&scene).unwrap();

    assert_eq!(renderer.mesh_texture_index(model, 0).unwrap(), 0);
    assert_eq!(renderer.stats().textures, 1);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_removed_model_key_is_stale() {
    let (window, _event_loop) = create_test_window();
    let mut renderer = create_renderer(&window);

    let model = renderer.load_scene(&quad_scene()).unwrap();
    renderer.draw().unwrap();
    renderer.remove_model(model).unwrap();

    let error = renderer.set_model_matrix(model, Mat4::IDENTITY).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Load);
    assert_eq!(renderer.stats().models, 0);

    renderer.draw().unwrap();
    assert_eq!(renderer.stats().draw_calls, 0);
}
