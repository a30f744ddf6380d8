//! Shared fixtures for the integration tests.

use glyphlabel_text::{LabelError, Rasterizer, RenderedGlyph, Result};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1_000_000);

/// A face with proportional, whole-pixel metrics.
///
/// At pixel size `p`: `i`/`l`/space advance `p/4`, everything else
/// printable advances `p/2`. Bitmaps are exactly as wide as the advance
/// (no side bearings), `7p/10` tall with the top `6p/10` above the
/// baseline. Space has no bitmap. Line height is `round(1.2 p)`.
/// Kerning: (`H`, `i`) = -2, (`A`, `V`) = -3.
pub struct FixedFace {
    id: u64,
    pixel_size: u32,
}

impl FixedFace {
    pub fn new() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            pixel_size: 0,
        }
    }

    pub fn advance(pixel_size: u32, codepoint: u8) -> u32 {
        match codepoint {
            b'i' | b'l' | b' ' => pixel_size / 4,
            _ => pixel_size / 2,
        }
    }
}

impl Rasterizer for FixedFace {
    fn face_id(&self) -> u64 {
        self.id
    }

    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<()> {
        if pixel_size == 0 {
            return Err(LabelError::InvalidPixelSize(0));
        }
        self.pixel_size = pixel_size;
        Ok(())
    }

    fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    fn render_glyph(&mut self, codepoint: u8) -> Result<RenderedGlyph> {
        let p = self.pixel_size;
        if char::from(codepoint).is_control() {
            return Ok(RenderedGlyph::blank());
        }
        let advance = Self::advance(p, codepoint);
        if codepoint == b' ' {
            return Ok(RenderedGlyph {
                advance: [advance as f32, 0.0],
                ..RenderedGlyph::blank()
            });
        }
        let height = p * 7 / 10;
        Ok(RenderedGlyph {
            advance: [advance as f32, 0.0],
            bitmap_width: advance,
            bitmap_height: height,
            bearing: [0, (p * 6 / 10) as i32],
            pixels: vec![255; (advance * height) as usize],
        })
    }

    fn kerning(&self, left: u8, right: u8) -> f32 {
        match (left, right) {
            (b'H', b'i') => -2.0,
            (b'A', b'V') => -3.0,
            _ => 0.0,
        }
    }

    fn line_height(&self) -> f32 {
        (self.pixel_size as f32 * 1.2).round()
    }
}
