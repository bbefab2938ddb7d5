//! Window, event handling and the per-frame redraw.

use std::sync::Arc;

use glam::Vec3;
use orrery_assets::AssetLoader;
use orrery_config::Config;
use orrery_layout::{ComposedScene, compose_scene};
use orrery_render::{
    Camera, RenderContext, SceneRenderer, SurfaceError, init_render_context_blocking,
};
use tracing::{debug, error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::context::{SceneContext, start_asset_loads};
use crate::controls::OrbitControls;
use crate::error::AppError;
use crate::frame_loop::{CancellationToken, FrameLoop};
use crate::input::PointerState;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ));
    if config.window.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

/// Camera described by the config, aimed at its target.
pub fn camera_from_config(config: &Config) -> Camera {
    let cam = &config.camera;
    let mut camera = Camera::perspective(
        cam.fov_y_degrees,
        config.window.width as f32 / config.window.height.max(1) as f32,
        cam.near,
        cam.far,
    );
    camera.position = Vec3::from_array(cam.position);
    camera.look_at(Vec3::from_array(cam.target));
    camera
}

/// Application state: the scene, its loader, and the window and GPU once
/// the event loop has resumed.
pub struct AppState {
    config: Config,
    context: SceneContext,
    loader: AssetLoader<SceneContext>,
    frame_loop: FrameLoop,
    camera: Camera,
    controls: OrbitControls,
    pointer: PointerState,
    window: Option<Arc<Window>>,
    gpu: Option<RenderContext>,
    renderer: Option<SceneRenderer>,
    startup_error: Option<AppError>,
}

impl AppState {
    /// Composes the scene and starts loading its assets.
    pub fn new(config: Config) -> Self {
        let ComposedScene {
            scene,
            pivot,
            image_plane,
            font,
            labels,
        } = compose_scene(&config);

        let mut loader =
            AssetLoader::new(config.assets.root.clone(), config.assets.loader_threads);
        start_asset_loads(&mut loader, &scene, &font, &labels);
        let context = SceneContext::new(scene, pivot, image_plane);

        let camera = camera_from_config(&config);
        let controls = OrbitControls::new(
            &config.controls,
            camera.position,
            Vec3::from_array(config.camera.target),
        );
        let frame_loop = FrameLoop::new(CancellationToken::new(), config.debug.max_frames);

        Self {
            config,
            context,
            loader,
            frame_loop,
            camera,
            controls,
            pointer: PointerState::new(),
            window: None,
            gpu: None,
            renderer: None,
            startup_error: None,
        }
    }

    /// Token that stops the frame loop; cancel it to close the window.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.frame_loop.token().clone()
    }

    pub fn context(&self) -> &SceneContext {
        &self.context
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_loop.frame_count()
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let attrs = window_attributes_from_config(&self.config);
        let window = Arc::new(event_loop.create_window(attrs)?);
        let size = window.inner_size();
        info!("Window created: {}x{}", size.width, size.height);

        let gpu = init_render_context_blocking(window.clone(), self.config.window.vsync)?;
        self.renderer = Some(SceneRenderer::new(&gpu));
        self.camera.set_aspect_ratio(size.width as f32, size.height as f32);
        self.gpu = Some(gpu);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_aspect_ratio(width as f32, height as f32);
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(width, height);
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(&gpu.device, width, height);
            }
        }
        debug!("Window resized to {width}x{height}");
    }

    fn update_hover(&mut self) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        let (width, height) = gpu.size();
        let position = self.pointer.position();
        let ndc = Camera::pixel_to_ndc(position.x as f64, position.y as f64, width, height);
        self.context.hover(&self.camera.ray_from_ndc(ndc));
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(gpu), Some(renderer)) =
            (&self.window, &mut self.gpu, &mut self.renderer)
        else {
            return;
        };

        let loader = &mut self.loader;
        let context = &mut self.context;
        let controls = &mut self.controls;
        let camera = &mut self.camera;
        let pointer = &mut self.pointer;
        let animation = &self.config.animation;
        let token = self.frame_loop.token().clone();

        let ran = self.frame_loop.tick(|frame| {
            loader.poll(context);

            controls.handle_pointer(pointer);
            controls.apply(camera);
            pointer.clear_transients();

            context.spin(animation);
            renderer.sync_textures(gpu, &mut context.textures);

            match renderer.render(gpu, &context.scene, camera) {
                Ok(()) => {}
                Err(SurfaceError::Timeout) => debug!("Surface timeout on frame {frame}, skipping"),
                Err(SurfaceError::Lost) => {
                    let (width, height) = gpu.size();
                    warn!("Surface lost on frame {frame}, reconfiguring");
                    gpu.resize(width, height);
                }
                Err(SurfaceError::OutOfMemory) => {
                    error!("GPU out of memory, shutting down");
                    token.cancel();
                }
            }
        });

        if ran && !self.frame_loop.is_cancelled() {
            window.request_redraw();
        } else {
            info!("Frame loop stopped after {} frames", self.frame_loop.frame_count());
            event_loop.exit();
        }
    }

    /// Surfaces any error that stopped startup inside the event loop.
    pub fn finish(mut self) -> Result<(), AppError> {
        self.loader.shutdown();
        match self.startup_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.initialize(event_loop) {
            error!("Startup failed: {e}");
            self.startup_error = Some(e);
            self.frame_loop.token().cancel();
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.frame_loop.token().cancel();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => self.resize(new_size.width, new_size.height),
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.on_cursor_moved(position.x, position.y);
                self.update_hover();
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.pointer.on_button(button, state);
                if button == MouseButton::Left
                    && state == ElementState::Pressed
                    && let Some(node) = self.context.hovered
                {
                    info!(?node, "clicked");
                }
            }
            WindowEvent::MouseWheel { delta, .. } => self.pointer.on_scroll(delta),
            WindowEvent::CursorLeft { .. } => self.pointer.on_cursor_left(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Creates an event loop and runs the viewer until the window closes or the
/// frame limit is reached.
///
/// # Errors
///
/// Returns [`AppError`] if the event loop, window or GPU cannot be created.
#[instrument(skip_all)]
pub fn run(config: Config) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = AppState::new(config);
    event_loop.run_app(&mut app)?;
    app.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_attributes_from_config() {
        let mut config = Config::default();
        config.window.title = "Rings".to_string();
        let attrs = window_attributes_from_config(&config);
        assert_eq!(attrs.title, "Rings");
        assert!(attrs.fullscreen.is_none());

        config.window.fullscreen = true;
        assert!(window_attributes_from_config(&config).fullscreen.is_some());
    }

    #[test]
    fn test_camera_from_config_looks_at_target() {
        let camera = camera_from_config(&Config::default());
        assert_eq!(camera.position, Vec3::new(0.0, 10.0, 25.0));
        let to_origin = (-camera.position).normalize();
        assert!((camera.forward() - to_origin).length() < 1e-3);
        assert!((camera.aspect_ratio - 1280.0 / 720.0).abs() < 1e-6);
    }

    #[test]
    fn test_app_state_starts_without_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.assets.root = dir.path().to_path_buf();
        config.assets.font = "font.json".to_string();
        config.debug.max_frames = Some(1);

        let app = AppState::new(config);
        assert_eq!(app.frame_count(), 0);
        assert!(app.context().scene.find("globe").is_some());
        assert!(!app.cancellation_token().is_cancelled());
        assert!(app.finish().is_ok());
    }
}
