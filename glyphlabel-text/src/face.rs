//! Font faces — the rasterizer seam and its `fontdue` implementation.
//!
//! The layout core talks to glyph rasterization only through the
//! [`Rasterizer`] trait: set a pixel size, render one glyph bitmap, ask
//! for a kerning pair, ask for the line height. [`FontFace`] is the
//! production implementation; it opens font bytes with `fontdue` and can
//! locate installed fonts through `font-kit`.
//!
//! ## Architecture
//!
//! ```text
//! FontFace::from_system("sans-serif")
//!   ├── font-kit SystemSource  ──► font file bytes + collection index
//!   └── fontdue::Font          ──► metrics, coverage bitmaps, kerning
//! ```

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use fontdue::{Font, FontSettings};

use crate::error::{LabelError, Result};

static NEXT_FACE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique face identity.
pub fn next_face_id() -> u64 {
    NEXT_FACE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A face shared by several labels on the same thread.
pub type SharedFace<R> = Rc<RefCell<R>>;

/// Wrap a face so several labels can use it.
pub fn shared<R>(face: R) -> SharedFace<R> {
    Rc::new(RefCell::new(face))
}

// ── Rasterizer seam ─────────────────────────────────────────────────

/// One rendered glyph, as handed back by a [`Rasterizer`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedGlyph {
    /// Pen displacement after drawing (horizontal, vertical), in pixels.
    pub advance: [f32; 2],
    /// Bitmap width in pixels.
    pub bitmap_width: u32,
    /// Bitmap height in pixels.
    pub bitmap_height: u32,
    /// Offset from the pen to the bitmap's top-left corner (left, top).
    /// `top` is measured upward from the baseline.
    pub bearing: [i32; 2],
    /// 8-bit coverage, row-major, `bitmap_width * bitmap_height` bytes.
    pub pixels: Vec<u8>,
}

impl RenderedGlyph {
    /// A glyph with no ink and no advance (control codes).
    pub fn blank() -> Self {
        Self::default()
    }
}

/// The glyph rasterizer collaborator.
///
/// Implementations are stateful in their active pixel size, like a
/// FreeType face: `kerning` and `line_height` answer for whatever size
/// was last passed to `set_pixel_size`.
pub trait Rasterizer {
    /// Stable identity of the underlying face, used as a cache key.
    fn face_id(&self) -> u64;

    /// Set the active rasterization size.
    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<()>;

    /// The active rasterization size (0 if never set).
    fn pixel_size(&self) -> u32;

    /// Render the bitmap and metrics for one codepoint at the active size.
    fn render_glyph(&mut self, codepoint: u8) -> Result<RenderedGlyph>;

    /// Horizontal kerning between two codepoints, in whole pixels.
    fn kerning(&self, left: u8, right: u8) -> f32;

    /// Distance between consecutive baselines, in whole pixels.
    fn line_height(&self) -> f32;
}

// ── fontdue-backed face ─────────────────────────────────────────────

/// A font face backed by `fontdue`.
pub struct FontFace {
    id: u64,
    name: String,
    font: Font,
    pixel_size: u32,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("pixel_size", &self.pixel_size)
            .finish()
    }
}

impl FontFace {
    /// Open a face from raw TrueType/OpenType bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        Self::from_collection(name, bytes, 0)
    }

    /// Open the `index`-th face of a font collection.
    pub fn from_collection(name: impl Into<String>, bytes: &[u8], index: u32) -> Result<Self> {
        let settings = FontSettings {
            collection_index: index,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(bytes, settings)
            .map_err(|e| LabelError::FontLoad(e.to_string()))?;

        Ok(Self {
            id: next_face_id(),
            name: name.into(),
            font,
            pixel_size: 0,
        })
    }

    /// Open a face from a font file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let face = Self::from_bytes(path.display().to_string(), &bytes)?;
        log::info!("FontFace: loaded '{}' ({} bytes)", face.name, bytes.len());
        Ok(face)
    }

    /// Locate an installed font by family and open it.
    ///
    /// Accepts a concrete family title (`"DejaVu Sans"`) or one of the
    /// CSS generic keywords (`serif`, `sans-serif`, `monospace`,
    /// `cursive`, `fantasy`).
    pub fn from_system(family: &str) -> Result<Self> {
        let start = Instant::now();
        let source = SystemSource::new();
        let family_name = parse_family(family);

        let handle = source
            .select_best_match(&[family_name], &Properties::new())
            .map_err(|_| LabelError::FontNotFound(family.to_string()))?;

        let (bytes, index) = match handle {
            Handle::Path { path, font_index } => (std::fs::read(&path)?, font_index),
            Handle::Memory { bytes, font_index } => (bytes.to_vec(), font_index),
        };

        let face = Self::from_collection(family, &bytes, index)?;
        log::info!(
            "FontFace: resolved '{}' from system fonts ({:.1}ms)",
            family,
            start.elapsed().as_secs_f64() * 1000.0,
        );
        Ok(face)
    }

    /// Name the face was opened under (family or file path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wrap this face for sharing between labels.
    pub fn into_shared(self) -> SharedFace<Self> {
        shared(self)
    }
}

impl Rasterizer for FontFace {
    fn face_id(&self) -> u64 {
        self.id
    }

    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<()> {
        if pixel_size == 0 {
            return Err(LabelError::InvalidPixelSize(pixel_size));
        }
        self.pixel_size = pixel_size;
        Ok(())
    }

    fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    fn render_glyph(&mut self, codepoint: u8) -> Result<RenderedGlyph> {
        if self.pixel_size == 0 {
            return Err(LabelError::InvalidPixelSize(0));
        }

        let ch = char::from(codepoint);
        if ch.is_control() {
            return Ok(RenderedGlyph::blank());
        }

        let (metrics, pixels) = self.font.rasterize(ch, self.pixel_size as f32);
        if pixels.len() != metrics.width * metrics.height {
            return Err(LabelError::Rasterize {
                codepoint,
                reason: format!(
                    "bitmap has {} bytes, expected {}x{}",
                    pixels.len(),
                    metrics.width,
                    metrics.height,
                ),
            });
        }

        // Horizontal layout only: the pen never moves vertically.
        Ok(RenderedGlyph {
            advance: [metrics.advance_width, 0.0],
            bitmap_width: metrics.width as u32,
            bitmap_height: metrics.height as u32,
            bearing: [metrics.xmin, metrics.ymin + metrics.height as i32],
            pixels,
        })
    }

    fn kerning(&self, left: u8, right: u8) -> f32 {
        if self.pixel_size == 0 {
            return 0.0;
        }
        self.font
            .horizontal_kern(char::from(left), char::from(right), self.pixel_size as f32)
            .map(f32::floor)
            .unwrap_or(0.0)
    }

    fn line_height(&self) -> f32 {
        let px = self.pixel_size as f32;
        self.font
            .horizontal_line_metrics(px)
            .map(|m| m.new_line_size.round())
            .unwrap_or(px)
    }
}

/// Map a family string onto font-kit's family names.
fn parse_family(name: &str) -> FamilyName {
    match name.trim().to_lowercase().as_str() {
        "serif" => FamilyName::Serif,
        "sans-serif" => FamilyName::SansSerif,
        "monospace" => FamilyName::Monospace,
        "cursive" => FamilyName::Cursive,
        "fantasy" => FamilyName::Fantasy,
        _ => FamilyName::Title(name.trim().to_string()),
    }
}

// ===================================================================
// Tests
// ===================================================================
