//! Application state — the demo's labels, their shared face and atlas
//! cache, and the GPU renderer that draws them.

use std::path::Path;
use std::rc::Rc;

use glyphlabel_render::{FrameStats, GpuContext, GpuError, LabelRenderer, RenderError};
use glyphlabel_text::{
    Alignment, FontFace, LabelConfig, LabelError, LabelFlags, SharedAtlasCache, SharedFace,
    TextLabel,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest and largest pixel size reachable from the keyboard.
const MIN_PIXEL_SIZE: u32 = 8;
const MAX_PIXEL_SIZE: u32 = 160;

#[derive(Error, Debug)]
pub enum DemoError {
    #[error("Label error: {0}")]
    Label(#[from] LabelError),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("Failed to read demo config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid demo config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Window, font and label setup, loadable from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub window_width: u32,
    pub window_height: u32,
    /// Font file path; system `sans-serif` when absent.
    pub font: Option<String>,
    pub clear_color: [f64; 4],
    pub labels: Vec<LabelConfig>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        let title = LabelConfig {
            text: "glyphlabel".into(),
            x: 400.0,
            y: 40.0,
            pixel_size: 64,
            alignment: Alignment::Center,
            color: [0.10, 0.20, 0.45, 1.0],
            ..LabelConfig::default()
        };
        let body = LabelConfig {
            text: "The quick brown fox jumps over the lazy dog. Resize the window, \
                   press Up or Down to change the size, A to cycle alignment and W \
                   to toggle word wrap."
                .into(),
            x: 60.0,
            y: 160.0,
            max_width: 680.0,
            max_height: 320.0,
            pixel_size: 28,
            flags: LabelFlags::WORD_WRAP | LabelFlags::INDENTED,
            ..LabelConfig::default()
        };
        let footer = LabelConfig {
            text: "Esc to quit".into(),
            x: 780.0,
            y: 550.0,
            pixel_size: 18,
            alignment: Alignment::Right,
            color: [0.4, 0.4, 0.4, 1.0],
            ..LabelConfig::default()
        };

        Self {
            window_width: 800,
            window_height: 600,
            font: None,
            clear_color: [0.96, 0.96, 0.94, 1.0],
            labels: vec![title, body, footer],
        }
    }
}

impl DemoConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DemoError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Open the configured font, or the system sans-serif.
    pub fn open_face(&self) -> Result<FontFace, LabelError> {
        match &self.font {
            Some(path) => FontFace::from_file(path),
            None => FontFace::from_system("sans-serif"),
        }
    }
}

/// Next alignment in the Left → Center → Right cycle.
pub fn next_alignment(alignment: Alignment) -> Alignment {
    match alignment {
        Alignment::Left => Alignment::Center,
        Alignment::Center => Alignment::Right,
        Alignment::Right => Alignment::Left,
    }
}

/// Step a pixel size by `delta`, kept within the keyboard range.
pub fn step_pixel_size(current: u32, delta: i32) -> u32 {
    current
        .saturating_add_signed(delta)
        .clamp(MIN_PIXEL_SIZE, MAX_PIXEL_SIZE)
}

/// Owns the GPU, the labels and the renderer.
pub struct AppState {
    pub gpu: GpuContext,
    renderer: LabelRenderer,
    face: SharedFace<FontFace>,
    cache: SharedAtlasCache,
    labels: Vec<TextLabel>,
    /// Index of the label the keyboard edits.
    focus: usize,
}

impl AppState {
    pub fn new(gpu: GpuContext, face: FontFace, config: &DemoConfig) -> Result<Self, DemoError> {
        let (width, height) = gpu.surface_size();
        let face = face.into_shared();
        let cache = SharedAtlasCache::unbounded();

        let mut labels = Vec::with_capacity(config.labels.len());
        for label_config in &config.labels {
            let mut label =
                TextLabel::with_cache(Rc::clone(&face), Box::new(cache.clone()), label_config)?;
            label.set_window_size(width, height)?;
            labels.push(label);
        }

        let mut renderer = LabelRenderer::new(&gpu);
        let [r, g, b, a] = config.clear_color;
        renderer.set_clear_color(r, g, b, a);

        log::info!(
            "AppState: {} labels, {} atlases built",
            labels.len(),
            glyphlabel_text::AtlasCache::<FontFace>::len(&cache),
        );

        Ok(Self {
            gpu,
            renderer,
            face,
            cache,
            labels,
            focus: 1,
        })
    }

    fn focused(&mut self) -> Option<&mut TextLabel> {
        let index = self.focus.min(self.labels.len().checked_sub(1)?);
        self.labels.get_mut(index)
    }

    /// Forward a window resize to the surface and every label.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), LabelError> {
        self.gpu.resize(width, height);
        for label in &mut self.labels {
            label.set_window_size(width, height)?;
        }
        Ok(())
    }

    pub fn change_pixel_size(&mut self, delta: i32) -> Result<(), LabelError> {
        let Some(label) = self.focused() else {
            return Ok(());
        };
        let size = step_pixel_size(label.pixel_size(), delta);
        label.set_pixel_size(size)?;
        log::info!("Pixel size {}px", size);
        Ok(())
    }

    pub fn cycle_alignment(&mut self) -> Result<(), LabelError> {
        let Some(label) = self.focused() else {
            return Ok(());
        };
        let alignment = next_alignment(label.alignment());
        label.set_alignment(alignment)?;
        log::info!("Alignment {:?}", alignment);
        Ok(())
    }

    pub fn toggle_wrap(&mut self) -> Result<(), LabelError> {
        let Some(label) = self.focused() else {
            return Ok(());
        };
        let flags = label.flags() ^ LabelFlags::WORD_WRAP;
        label.set_font_flags(flags)?;
        log::info!("Word wrap {}", flags.contains(LabelFlags::WORD_WRAP));
        Ok(())
    }

    /// Upload the labels and draw one frame.
    pub fn render_frame(&mut self) -> Result<FrameStats, RenderError> {
        let labels: Vec<&TextLabel> = self.labels.iter().collect();
        self.renderer.prepare(&self.gpu, &labels)?;
        self.renderer.render_to_surface(&self.gpu)
    }

    /// Name the shared face was opened under.
    pub fn font_name(&self) -> String {
        self.face.borrow().name().to_string()
    }

    pub fn cached_atlases(&self) -> usize {
        glyphlabel_text::AtlasCache::<FontFace>::len(&self.cache)
    }
}
