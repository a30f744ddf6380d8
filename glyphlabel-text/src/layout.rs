//! Text layout — tokenizing, greedy line breaking and the glyph walk.
//!
//! Pipeline for one label:
//!
//! ```text
//! text ──tokenize──► words ──break_lines──► lines ──layout_lines──► TextLayout
//!                     "aa " "bb " "cc"       "aa bb " "cc"           vertices (x, y, s, t)
//! ```
//!
//! Positions come in as window pixels with a top-left origin and leave as
//! clip-space coordinates in [-1, 1]. Every function here is pure: the same
//! atlas, face metrics and parameters always give the same layout.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::atlas::{atlas_codepoint, GlyphAtlas, GlyphRecord};
use crate::face::Rasterizer;

/// Vertices emitted per inked glyph (two triangles).
pub const VERTICES_PER_GLYPH: usize = 6;

/// Horizontal placement of each line relative to the anchor x.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Lines start at the anchor.
    #[default]
    Left,
    /// Lines end at the anchor.
    Right,
    /// Lines are centered on the anchor.
    Center,
}

/// Per-axis scale compensating for a non-square viewport mapping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AspectCorrection {
    pub x: f32,
    pub y: f32,
}

impl AspectCorrection {
    pub const NONE: Self = Self { x: 1.0, y: 1.0 };

    /// Stretch the horizontal axis for wide ratios, the vertical one otherwise.
    pub fn from_ratio(ratio: f32) -> Self {
        if ratio >= 1.0 {
            Self { x: ratio, y: 1.0 }
        } else {
            Self {
                x: 1.0,
                y: 1.0 / ratio,
            }
        }
    }
}

impl Default for AspectCorrection {
    fn default() -> Self {
        Self::NONE
    }
}

/// One corner of a glyph quad: clip-space position and atlas texcoord.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub s: f32,
    pub t: f32,
}

impl Vertex {
    fn new(x: f32, y: f32, s: f32, t: f32) -> Self {
        Self { x, y, s, t }
    }
}

/// A single emitted line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaidOutLine {
    /// The line's text, trailing space included.
    pub text: String,
    /// Pixel x where the pen started, after alignment and indent.
    pub origin_x: f32,
    /// Measured width used for alignment.
    pub width: f32,
    /// Pen travel (advances plus kerning), aspect-scaled pixels.
    pub advance: f32,
    /// Index of this line's first vertex in [`TextLayout::vertices`].
    pub first_vertex: usize,
    pub vertex_count: usize,
}

/// Result of laying out a label.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextLayout {
    /// Triangle list, six vertices per inked glyph.
    pub vertices: Vec<Vertex>,
    pub lines: Vec<LaidOutLine>,
    /// Widest emitted line.
    pub width: f32,
    /// Vertical extent of the emitted lines.
    pub height: f32,
}

impl TextLayout {
    /// Number of glyph quads.
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_GLYPH
    }
}

/// Placement constraints for one layout pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
    /// Anchor x, window pixels.
    pub x: f32,
    /// Anchor y (top of the first line), window pixels.
    pub y: f32,
    /// Vertical budget in pixels; 0 means unconstrained.
    pub max_height: f32,
    pub alignment: Alignment,
    /// Extra x offset for the first line.
    pub indent: f32,
    pub window_width: u32,
    pub window_height: u32,
    pub aspect: AspectCorrection,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            max_height: 0.0,
            alignment: Alignment::Left,
            indent: 0.0,
            window_width: 800,
            window_height: 600,
            aspect: AspectCorrection::NONE,
        }
    }
}

// ── Words and lines ─────────────────────────────────────────────────

/// Split on spaces, each word keeping its trailing space.
///
/// Concatenating the result gives back `text`.
pub fn tokenize(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return vec![text];
    }
    text.split_inclusive(' ').collect()
}

/// Width of `text`: per-character advances, each rounded up, scaled by
/// the horizontal aspect factor.
pub fn measure(atlas: &GlyphAtlas, text: &str, aspect_x: f32) -> f32 {
    let pixels: f32 = text
        .chars()
        .map(|ch| atlas.glyph_for(ch).advance_x.ceil())
        .sum();
    pixels * aspect_x
}

/// Greedy line packing. `max_width <= 0` disables wrapping.
///
/// A word moves to a new line when its width minus one space exceeds
/// what is left on the current line. An empty line is only emitted for
/// empty input, as the single line of the result.
pub fn break_lines<F>(words: &[&str], max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    if max_width <= 0.0 {
        return vec![words.concat()];
    }

    let space_width = measure(" ");
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut remaining = max_width;

    for word in words {
        let word_width = measure(word);
        if !current.is_empty() && word_width - space_width > remaining {
            lines.push(std::mem::take(&mut current));
            remaining = max_width;
        }
        current.push_str(word);
        remaining -= word_width;
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

// ── Geometry ────────────────────────────────────────────────────────

/// Tokenize, wrap at `wrap_width` (0 = no wrap) and lay out `text`.
pub fn layout_text<R: Rasterizer + ?Sized>(
    face: &R,
    atlas: &GlyphAtlas,
    text: &str,
    wrap_width: f32,
    params: &LayoutParams,
) -> TextLayout {
    let words = tokenize(text);
    let lines = break_lines(&words, wrap_width, |word| {
        measure(atlas, word, params.aspect.x)
    });
    layout_lines(face, atlas, &lines, params)
}

/// Lay out already-broken lines top to bottom.
///
/// Lines that would push the extent past `max_height` are dropped.
pub fn layout_lines<R, S>(
    face: &R,
    atlas: &GlyphAtlas,
    lines: &[S],
    params: &LayoutParams,
) -> TextLayout
where
    R: Rasterizer + ?Sized,
    S: AsRef<str>,
{
    let step = atlas.line_height() * params.aspect.y;
    let mut layout = TextLayout::default();
    let mut pen_y = params.y;

    for (index, line) in lines.iter().enumerate() {
        let extent = pen_y - params.y;
        if params.max_height > 0.0 && extent + step > params.max_height {
            break;
        }

        let indent = if index == 0 { params.indent } else { 0.0 };
        let laid = walk_line(
            face,
            atlas,
            line.as_ref(),
            params.x + indent,
            pen_y,
            params,
            &mut layout.vertices,
        );
        layout.width = layout.width.max(laid.width);
        layout.lines.push(laid);
        pen_y += step;
    }

    layout.height = (pen_y - params.y).ceil();
    layout
}

/// Emit quads for one line whose top edge sits at pixel `y`.
fn walk_line<R: Rasterizer + ?Sized>(
    face: &R,
    atlas: &GlyphAtlas,
    text: &str,
    x: f32,
    y: f32,
    params: &LayoutParams,
    vertices: &mut Vec<Vertex>,
) -> LaidOutLine {
    let aspect = params.aspect;
    let sx = 2.0 / params.window_width.max(1) as f32;
    let sy = 2.0 / params.window_height.max(1) as f32;

    // Glyph origins are on the baseline, one line step below the top.
    let baseline_px = y + atlas.line_height() * aspect.y;

    let width = measure(atlas, text, aspect.x);
    let origin_x = match params.alignment {
        Alignment::Left => x,
        Alignment::Center => x - width / 2.0,
        Alignment::Right => x - width,
    };

    let mut pen_x = -1.0 + origin_x * sx;
    let mut pen_y = 1.0 - baseline_px * sy;
    let mut advance = 0.0;
    let first_vertex = vertices.len();

    let codepoints: Vec<u8> = text.chars().map(atlas_codepoint).collect();
    for (i, &codepoint) in codepoints.iter().enumerate() {
        let glyph = atlas.glyph_for(char::from(codepoint));
        let kern = codepoints
            .get(i + 1)
            .map(|&next| face.kerning(codepoint, next))
            .unwrap_or(0.0);

        if glyph.has_ink() {
            push_quad(vertices, atlas, glyph, pen_x, pen_y, sx * aspect.x, sy * aspect.y);
        }

        let travel = (glyph.advance_x + kern) * aspect.x;
        advance += travel;
        pen_x += travel * sx;
        pen_y += glyph.advance_y * sy * aspect.y;
    }

    LaidOutLine {
        text: text.to_string(),
        origin_x,
        width,
        advance,
        first_vertex,
        vertex_count: vertices.len() - first_vertex,
    }
}

/// Two triangles covering `glyph` with its pen at clip (`pen_x`, `pen_y`).
fn push_quad(
    vertices: &mut Vec<Vertex>,
    atlas: &GlyphAtlas,
    glyph: &GlyphRecord,
    pen_x: f32,
    pen_y: f32,
    scale_x: f32,
    scale_y: f32,
) {
    let left = pen_x + glyph.bearing_left * scale_x;
    let top = pen_y + glyph.bearing_top * scale_y;
    let right = left + glyph.bitmap_width * scale_x;
    let bottom = top - glyph.bitmap_height * scale_y;

    let s0 = glyph.atlas_x;
    let s1 = glyph.atlas_x + glyph.bitmap_width / atlas.width() as f32;
    let t1 = glyph.bitmap_height / atlas.height() as f32;

    let top_left = Vertex::new(left, top, s0, 0.0);
    let top_right = Vertex::new(right, top, s1, 0.0);
    let bottom_left = Vertex::new(left, bottom, s0, t1);
    let bottom_right = Vertex::new(right, bottom, s1, t1);

    vertices.extend_from_slice(&[
        top_left,
        top_right,
        bottom_left,
        top_right,
        bottom_left,
        bottom_right,
    ]);
}

// ===================================================================
// Tests
// ===================================================================
