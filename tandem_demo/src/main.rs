//! Tandem demo
//!
//! Opens a window, loads `Models/Seahawk.obj`, spins it about Z at 30 degrees
//! per second and logs the frame rate once per second.

use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use tandem_engine::glam::{Mat4, Vec3};
use tandem_engine::tandem::scene::ModelKey;
use tandem_engine::tandem::{ErrorKind, Renderer, RendererConfig};
use tandem_engine::{engine_error, engine_info, engine_warn};
use tandem_renderer_vulkan::VulkanRenderer;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

const WINDOW_WIDTH: u32 = 1200;
const WINDOW_HEIGHT: u32 = 675;
const MODEL_PATH: &str = "Models/Seahawk.obj";
const DEGREES_PER_SECOND: f32 = 30.0;

/// Frames counted since the last report
struct FpsCounter {
    frames: u32,
    elapsed: f32,
}

impl FpsCounter {
    fn tick(&mut self, delta: f32) -> Option<f32> {
        self.frames += 1;
        self.elapsed += delta;
        if self.elapsed < 1.0 {
            return None;
        }
        let fps = self.frames as f32 / self.elapsed;
        self.elapsed -= 1.0;
        self.frames = 0;
        Some(fps)
    }
}

struct App {
    // Renderer before window: the surface must go first
    renderer: Option<VulkanRenderer>,
    window: Option<Window>,
    model: Option<ModelKey>,
    angle: f32,
    last_frame: Instant,
    fps: FpsCounter,
    failed: bool,
}

impl App {
    fn new() -> Self {
        Self {
            renderer: None,
            window: None,
            model: None,
            angle: 0.0,
            last_frame: Instant::now(),
            fps: FpsCounter { frames: 0, elapsed: 0.0 },
            failed: false,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> tandem_engine::tandem::Result<()> {
        let attributes = Window::default_attributes()
            .with_title("Tandem")
            .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));
        let window = event_loop.create_window(attributes).map_err(|e| {
            tandem_engine::tandem::Error::InitializationFailed(format!("Failed to create window: {}", e))
        })?;

        let size = window.inner_size();
        let config = RendererConfig {
            app_name: "Tandem Demo".to_string(),
            ..RendererConfig::default()
        };
        let mut renderer = VulkanRenderer::new(&window, (size.width, size.height), config)?;

        match renderer.load_model(Path::new(MODEL_PATH)) {
            Ok(model) => self.model = Some(model),
            // Keep rendering an empty scene
            Err(e) if e.kind() == ErrorKind::Load => {
                engine_warn!("tandem::demo", "Could not load '{}': {}", MODEL_PATH, e)
            }
            Err(e) => return Err(e),
        }

        self.renderer = Some(renderer);
        self.window = Some(window);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: tandem_engine::tandem::Error) {
        engine_error!("tandem::demo", "{}", error);
        self.failed = true;
        event_loop.exit();
    }

    fn frame(&mut self) -> tandem_engine::tandem::Result<()> {
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };

        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if let Some(fps) = self.fps.tick(delta) {
            engine_info!("tandem::demo", "{:.1} fps", fps);
        }

        self.angle = (self.angle + DEGREES_PER_SECOND * delta) % 360.0;
        if let Some(model) = self.model {
            let matrix = Mat4::from_rotation_z(self.angle.to_radians()) * Mat4::from_scale(Vec3::splat(0.1));
            renderer.set_model_matrix(model, matrix)?;
        }

        renderer.draw()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                engine_info!("tandem::demo", "Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.frame() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.destroy();
        }
    }
}

fn main() -> ExitCode {
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            engine_error!("tandem::demo", "Failed to create event loop: {}", e);
            return ExitCode::FAILURE;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    if let Err(e) = event_loop.run_app(&mut app) {
        engine_error!("tandem::demo", "Event loop error: {}", e);
        return ExitCode::FAILURE;
    }

    if app.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_counter_reports_once_per_second() {
        let mut counter = FpsCounter { frames: 0, elapsed: 0.0 };
        for _ in 0..59 {
            assert!(counter.tick(1.0 / 60.0).is_none());
        }
        let fps = counter.tick(1.0 / 60.0 + 0.001).unwrap();
        assert!((fps - 60.0).abs() < 1.0);
        assert_eq!(counter.frames, 0);
    }
}
