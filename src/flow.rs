//! Application event loop.
//!
//! Startup happens once, when winit first resumes the application:
//! 1. Create the window and the GPU [`Context`]
//! 2. Load the scene file and import it into GPU resources
//! 3. Build the [`FrameRenderer`]
//!
//! Any failure in these steps stops the event loop and is returned from [`run`].
//!
//! Afterwards every redraw follows the same pattern:
//! 1. Take the edge-triggered input collected since the last frame
//! 2. Stop if a close was requested
//! 3. Update the camera
//! 4. Render the draw list and present (waits for vertical sync)
//! 5. Request the next redraw

use std::{path::Path, sync::Arc};

use anyhow::Context as _;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    camera::{Camera, CameraController, Projection},
    config::ViewerConfig,
    context::{Context, GpuUpload},
    importer::{ImportOptions, ImportedScene, SceneImporter},
    input::InputCollector,
    render::FrameRenderer,
    resources::{
        load_scene,
        texture::{ImageDecoder, ImageLoader},
    },
};

/// Everything that exists once startup succeeded.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    renderer: FrameRenderer,
    scene: ImportedScene,
    camera: Camera,
    controller: CameraController,
    projection: Projection,
    input: InputCollector,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &ViewerConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config.clear_colour).await?;

        let scene = {
            let mut uploader = ctx.uploader();
            load_and_import(&config.scene, &mut uploader, &ImageDecoder, config.import_options())
                .await?
        };

        let renderer = FrameRenderer::new(
            &ctx.device,
            &ctx.queue,
            ctx.config.format,
            &ctx.texture_layout,
        )?;

        Ok(Self {
            ctx,
            renderer,
            scene,
            camera: config.camera.camera(),
            controller: config.camera.controller(),
            projection: config.camera.projection(),
            input: config.input.collector(),
            is_surface_configured: true,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.is_surface_configured = self.ctx.resize(width, height);
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer.render_frame(
            &self.ctx.device,
            &self.ctx.queue,
            &view,
            &self.ctx.depth_texture.view,
            self.ctx.viewport(),
            &self.camera,
            &self.projection,
            &self.scene,
            self.ctx.clear_colour,
        );
        output.present();
        Ok(())
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    config: ViewerConfig,
    state: Option<AppState>,
    startup_error: Option<anyhow::Error>,
}

impl App {
    fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            config,
            state: None,
            startup_error: None,
        })
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppState> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attributes)?);
        self.async_runtime
            .block_on(AppState::new(window.clone(), &self.config))
            .inspect(|_| window.request_redraw())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.startup_error.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(state) => self.state = Some(state),
            Err(e) => {
                log::error!("Startup failed: {:#}", e);
                self.startup_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.input.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let frame = state.input.take_frame();
                if frame.close_requested {
                    event_loop.exit();
                    return;
                }
                state.controller.update(&mut state.camera, &frame);

                match state.render() {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Loads the scene file at `path` and imports it through `uploader`.
///
/// An unreadable file reaches the importer as a missing scene; the returned
/// error names the file and the loader's failure, with the
/// [`SceneLoadError`](crate::error::SceneLoadError) underneath.
pub async fn load_and_import<U: GpuUpload + ?Sized>(
    path: &Path,
    uploader: &mut U,
    images: &dyn ImageLoader,
    options: ImportOptions,
) -> anyhow::Result<ImportedScene<U::Geometry, U::Image>> {
    let loaded = load_scene(path).await;
    let mut importer = SceneImporter::new(uploader, images, options);
    match loaded {
        Ok(description) => importer
            .import_scene(Some(&description))
            .with_context(|| format!("cannot import {}", path.display())),
        Err(load_error) => {
            log::error!("Cannot load {}: {:#}", path.display(), load_error);
            importer
                .import_scene(None)
                .with_context(|| format!("cannot load {}: {:#}", path.display(), load_error))
        }
    }
}

/// Opens the viewer window and runs until it is closed.
///
/// Returns the startup error if the window, GPU, scene or shader program could
/// not be set up.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        eprintln!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
