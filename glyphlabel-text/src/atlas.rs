//! Glyph atlas — one packed coverage strip per (face, pixel size).
//!
//! Every codepoint of the ASCII range is rasterized once and laid out
//! left-to-right in codepoint order in a single-row 8-bit texture:
//!
//! ```text
//!  ┌──┬───┬─┬────┬──── … ───┐  height = tallest bitmap
//!  │!"│ # │$│ %  │          │
//!  └──┴───┴─┴────┴──── … ───┘  width  = Σ bitmap widths
//!  ^atlas_x('!')  ^atlas_x('%') = offset / width
//! ```
//!
//! Glyphs without ink (space, control codes) keep a metrics slot but take
//! no columns. The atlas is immutable once built.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::error::{LabelError, Result};
use crate::face::Rasterizer;

/// Number of codepoints rasterized into every atlas (0..=127).
pub const GLYPH_COUNT: usize = 128;

/// Glyph used for characters outside the atlas range.
pub const FALLBACK_CODEPOINT: u8 = b'?';

static NEXT_ATLAS_ID: AtomicU64 = AtomicU64::new(1);

/// Map a character onto the codepoint it is drawn with.
pub fn atlas_codepoint(ch: char) -> u8 {
    if ch.is_ascii() {
        ch as u8
    } else {
        FALLBACK_CODEPOINT
    }
}

/// Metrics for one codepoint at the atlas pixel size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphRecord {
    /// Horizontal pen advance, in pixels.
    pub advance_x: f32,
    /// Vertical pen advance, in pixels.
    pub advance_y: f32,
    /// Bitmap width, in pixels.
    pub bitmap_width: f32,
    /// Bitmap height, in pixels.
    pub bitmap_height: f32,
    /// Pen to bitmap left edge.
    pub bearing_left: f32,
    /// Baseline to bitmap top edge.
    pub bearing_top: f32,
    /// Left edge of the bitmap in normalized texture coordinates.
    pub atlas_x: f32,
}

impl GlyphRecord {
    /// Whether this glyph produces a visible quad.
    pub fn has_ink(&self) -> bool {
        self.bitmap_width > 0.0 && self.bitmap_height > 0.0
    }
}

/// Immutable glyph metrics table plus packed R8 texture.
pub struct GlyphAtlas {
    id: u64,
    face_id: u64,
    pixel_size: u32,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    records: [GlyphRecord; GLYPH_COUNT],
    line_height: f32,
}

impl std::fmt::Debug for GlyphAtlas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphAtlas")
            .field("id", &self.id)
            .field("face_id", &self.face_id)
            .field("pixel_size", &self.pixel_size)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl GlyphAtlas {
    /// Rasterize codepoints 0..128 of `face` at `pixel_size`.
    ///
    /// Any rasterizer failure aborts the build; no partial atlas exists.
    pub fn build<R: Rasterizer + ?Sized>(face: &mut R, pixel_size: u32) -> Result<Self> {
        let start = Instant::now();
        face.set_pixel_size(pixel_size)?;

        let mut records = [GlyphRecord::default(); GLYPH_COUNT];
        let mut bitmaps = Vec::with_capacity(GLYPH_COUNT);
        let mut width = 0u32;
        let mut height = 0u32;

        for (codepoint, record) in (0u8..).zip(records.iter_mut()) {
            let glyph = face.render_glyph(codepoint)?;
            let expected = glyph.bitmap_width as usize * glyph.bitmap_height as usize;
            if glyph.pixels.len() != expected {
                return Err(LabelError::Rasterize {
                    codepoint,
                    reason: format!(
                        "bitmap holds {} bytes, expected {}x{}",
                        glyph.pixels.len(),
                        glyph.bitmap_width,
                        glyph.bitmap_height
                    ),
                });
            }
            record.advance_x = glyph.advance[0];
            record.advance_y = glyph.advance[1];
            record.bitmap_width = glyph.bitmap_width as f32;
            record.bitmap_height = glyph.bitmap_height as f32;
            record.bearing_left = glyph.bearing[0] as f32;
            record.bearing_top = glyph.bearing[1] as f32;

            width += glyph.bitmap_width;
            height = height.max(glyph.bitmap_height);
            bitmaps.push(glyph);
        }

        // Second pass: blit into the strip now that its size is known.
        let mut pixels = vec![0u8; width as usize * height as usize];
        let mut offset = 0u32;
        for (glyph, record) in bitmaps.iter().zip(records.iter_mut()) {
            record.atlas_x = if width == 0 {
                0.0
            } else {
                offset as f32 / width as f32
            };

            let bw = glyph.bitmap_width as usize;
            for row in 0..glyph.bitmap_height as usize {
                let src = &glyph.pixels[row * bw..(row + 1) * bw];
                let dst_start = row * width as usize + offset as usize;
                pixels[dst_start..dst_start + bw].copy_from_slice(src);
            }
            offset += glyph.bitmap_width;
        }

        let atlas = Self {
            id: NEXT_ATLAS_ID.fetch_add(1, Ordering::Relaxed),
            face_id: face.face_id(),
            pixel_size,
            width,
            height,
            pixels,
            records,
            line_height: face.line_height(),
        };

        log::info!(
            "GlyphAtlas: built {} glyphs at {}px ({}x{}) in {:.1}ms",
            GLYPH_COUNT,
            pixel_size,
            width,
            height,
            start.elapsed().as_secs_f64() * 1000.0,
        );

        Ok(atlas)
    }

    /// Process-unique atlas identity.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn face_id(&self) -> u64 {
        self.face_id
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    /// Atlas width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Atlas height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major 8-bit coverage, `width * height` bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Baseline-to-baseline distance at this pixel size.
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Metrics for `codepoint`, or `None` outside the atlas range.
    pub fn glyph(&self, codepoint: u8) -> Option<&GlyphRecord> {
        self.records.get(codepoint as usize)
    }

    /// Metrics used to draw `ch`; non-ASCII falls back to `?`.
    pub fn glyph_for(&self, ch: char) -> &GlyphRecord {
        &self.records[atlas_codepoint(ch) as usize]
    }

    pub fn glyphs(&self) -> &[GlyphRecord; GLYPH_COUNT] {
        &self.records
    }
}

// ===================================================================
// Tests
// ===================================================================
