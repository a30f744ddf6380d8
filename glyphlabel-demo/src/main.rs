//! glyphlabel demo — draws a few labels in a window with wgpu.
//!
//! ```text
//! glyphlabel-demo [FONT_FILE] [--config DEMO.json]
//! ```
//!
//! Uses `winit` 0.30 for windowing and input, `glyphlabel-text` for atlas
//! building and layout, and `glyphlabel-render` for drawing.
//!
//! Keys: Up/Down change the pixel size of the body label, `A` cycles its
//! alignment, `W` toggles word wrap, Escape quits.

mod state;

use std::sync::Arc;

use log::info;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes, WindowId},
};

use glyphlabel_render::{GpuContext, RenderError};
use state::{AppState, DemoConfig, DemoError};

/// Pixel size step for Up/Down.
const PIXEL_STEP: i32 = 4;

/// Winit 0.30 application handler.
struct App {
    config: DemoConfig,
    window: Option<Arc<Window>>,
    state: Option<AppState>,
    frame_count: u64,
}

impl App {
    fn new(config: DemoConfig) -> Self {
        Self {
            config,
            window: None,
            state: None,
            frame_count: 0,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn std::error::Error>> {
        let attrs = WindowAttributes::default()
            .with_title("glyphlabel demo")
            .with_inner_size(LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ))
            .with_min_inner_size(LogicalSize::new(200, 150));

        let window = Arc::new(event_loop.create_window(attrs)?);
        let PhysicalSize { width, height } = window.inner_size();

        let gpu = pollster::block_on(GpuContext::new_with_surface(
            window.clone(),
            width.max(1),
            height.max(1),
        ))
        .map_err(DemoError::from)?;

        let face = self.config.open_face().map_err(DemoError::from)?;
        let state = AppState::new(gpu, face, &self.config)?;

        info!(
            "glyphlabel demo initialized: {}x{}, font '{}', {} atlases, GPU: {}",
            width,
            height,
            state.font_name(),
            state.cached_atlases(),
            state.gpu.adapter.get_info().name,
        );

        window.request_redraw();
        self.state = Some(state);
        self.window = Some(window);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("Startup failed: {e}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (Some(window), Some(state)) = (self.window.as_ref(), self.state.as_mut()) else {
            return;
        };

        let result = match event {
            // ── Close / Escape ──────────────────────────────────
            WindowEvent::CloseRequested => {
                info!("Window closed after {} frames", self.frame_count);
                event_loop.exit();
                Ok(())
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                let changed = match event.logical_key.as_ref() {
                    Key::Named(NamedKey::Escape) => {
                        event_loop.exit();
                        Ok(())
                    }
                    Key::Named(NamedKey::ArrowUp) => state.change_pixel_size(PIXEL_STEP),
                    Key::Named(NamedKey::ArrowDown) => state.change_pixel_size(-PIXEL_STEP),
                    Key::Character(c) if c.eq_ignore_ascii_case("a") => state.cycle_alignment(),
                    Key::Character(c) if c.eq_ignore_ascii_case("w") => state.toggle_wrap(),
                    _ => Ok(()),
                };
                window.request_redraw();
                changed
            }

            // ── Resize ──────────────────────────────────────────
            WindowEvent::Resized(new_size) => {
                let resized = state.resize(new_size.width, new_size.height);
                window.request_redraw();
                resized
            }

            // ── Redraw ──────────────────────────────────────────
            WindowEvent::RedrawRequested => {
                match state.render_frame() {
                    Ok(stats) => {
                        self.frame_count += 1;
                        if self.frame_count % 300 == 0 {
                            info!(
                                "Frame {}: {} labels, {} vertices, {} draw call(s), {} atlas(es)",
                                self.frame_count,
                                stats.label_count,
                                stats.vertex_count,
                                stats.draw_calls,
                                stats.atlas_count,
                            );
                        }
                    }
                    Err(RenderError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => {
                        let size = window.inner_size();
                        if let Err(e) = state.resize(size.width, size.height) {
                            log::error!("Resize failed: {e}");
                        }
                        window.request_redraw();
                    }
                    Err(e) => log::error!("Render error: {e}"),
                }
                Ok(())
            }

            _ => Ok(()),
        };

        if let Err(e) = result {
            log::warn!("Label update failed: {e}");
        }
    }
}

fn parse_args() -> Result<DemoConfig, DemoError> {
    let mut args = std::env::args().skip(1);
    let mut font = None;
    let mut config = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = args.next(),
            _ => font = Some(arg),
        }
    }

    let mut demo = match config {
        Some(path) => DemoConfig::load(&path)?,
        None => DemoConfig::default(),
    };
    if font.is_some() {
        demo.font = font;
    }
    Ok(demo)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    info!("Starting glyphlabel demo...");
    let config = parse_args()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
