//! Deterministic rasterizer for unit tests.
//!
//! Metrics are defined at 16px and scale linearly (integer division):
//! `i`/`l` are 4 wide, `m`/`w`/`M`/`W` are 14 wide, every other printable
//! glyph is 10 wide. Advance equals bitmap width, bitmaps are 12 tall with
//! a top bearing of 10. Space advances 5 with no bitmap, line height is 20
//! and the only kerning pair is `H`,`i` = -1.
//!
//! Failures can be injected per codepoint, per pixel size, or as a
//! bitmap shorter than its reported dimensions.

use crate::error::{LabelError, Result};
use crate::face::{next_face_id, Rasterizer, RenderedGlyph};

pub struct TestFace {
    id: u64,
    pixel_size: u32,
    pub renders: usize,
    pub fail_on: Option<u8>,
    pub fail_at_size: Option<u32>,
    pub short_bitmap_on: Option<u8>,
}

impl TestFace {
    pub fn new() -> Self {
        Self {
            id: next_face_id(),
            pixel_size: 0,
            renders: 0,
            fail_on: None,
            fail_at_size: None,
            short_bitmap_on: None,
        }
    }

    pub fn failing_on(codepoint: u8) -> Self {
        Self {
            fail_on: Some(codepoint),
            ..Self::new()
        }
    }

    pub fn failing_at_size(pixel_size: u32) -> Self {
        Self {
            fail_at_size: Some(pixel_size),
            ..Self::new()
        }
    }

    pub fn short_bitmap_on(codepoint: u8) -> Self {
        Self {
            short_bitmap_on: Some(codepoint),
            ..Self::new()
        }
    }

    fn scaled(&self, units: u32) -> u32 {
        units * self.pixel_size / 16
    }

    pub fn glyph_width(&self, codepoint: u8) -> u32 {
        let units = match codepoint {
            b'i' | b'l' => 4,
            b'm' | b'w' | b'M' | b'W' => 14,
            b' ' => 5,
            _ => 10,
        };
        self.scaled(units)
    }
}

impl Rasterizer for TestFace {
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
        if self.pixel_size == 0 {
            return Err(LabelError::InvalidPixelSize(0));
        }
        self.renders += 1;
        if self.fail_on == Some(codepoint) || self.fail_at_size == Some(self.pixel_size) {
            return Err(LabelError::Rasterize {
                codepoint,
                reason: "synthetic failure".to_string(),
            });
        }

        let ch = char::from(codepoint);
        if ch.is_control() {
            return Ok(RenderedGlyph::blank());
        }
        let advance = self.glyph_width(codepoint) as f32;
        if codepoint == b' ' {
            return Ok(RenderedGlyph {
                advance: [advance, 0.0],
                ..RenderedGlyph::blank()
            });
        }

        let width = self.glyph_width(codepoint);
        let height = self.scaled(12);
        let mut pixels = vec![codepoint; (width * height) as usize];
        if self.short_bitmap_on == Some(codepoint) {
            pixels.truncate(pixels.len() / 2);
        }
        Ok(RenderedGlyph {
            advance: [advance, 0.0],
            bitmap_width: width,
            bitmap_height: height,
            bearing: [0, self.scaled(10) as i32],
            pixels,
        })
    }

    fn kerning(&self, left: u8, right: u8) -> f32 {
        if (left, right) == (b'H', b'i') {
            -1.0
        } else {
            0.0
        }
    }

    fn line_height(&self) -> f32 {
        self.scaled(20) as f32
    }
}
