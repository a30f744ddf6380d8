//! Text label — owns layout state and keeps its quads current.
//!
//! A label pairs one font face with an atlas cache and a set of layout
//! inputs. Every geometric setter funnels into a single recompute that
//! discards the previous vertices and lays the text out again. During
//! construction setters only stage values; the first layout runs once
//! the whole configuration has been applied.
//!
//! ```text
//! set_text / set_position / set_pixel_size / …
//!        │
//!        ▼
//!   LayoutState ──► ensure_atlas(px) ──► layout_text() ──► TextLayout
//!                        │                                   vertices
//!                   AtlasCache                               lines
//! ```

use std::rc::Rc;

use bitflags::bitflags;
use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::atlas::GlyphAtlas;
use crate::cache::{AtlasCache, LabelAtlasCache};
use crate::config::LabelConfig;
use crate::error::{LabelError, Result};
use crate::face::{FontFace, Rasterizer, SharedFace};
use crate::layout::{
    self, Alignment, AspectCorrection, LaidOutLine, LayoutParams, TextLayout, Vertex,
};
use crate::transform::LabelTransform;

bitflags! {
    /// Layout and presentation flags.
    ///
    /// Only `WORD_WRAP` and `INDENTED` change geometry; the rest are
    /// hints for the renderer.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LabelFlags: u32 {
        /// Wrap lines at the label's max width.
        const WORD_WRAP = 1 << 0;
        const UNDERLINED = 1 << 1;
        const BOLD = 1 << 2;
        const ITALIC = 1 << 3;
        /// Offset the first line by the indentation amount.
        const INDENTED = 1 << 4;
        const HORIZONTAL_LAYOUT = 1 << 5;
    }
}

/// Inputs that determine geometry, plus the measured result.
#[derive(Clone, Debug, PartialEq)]
struct LayoutState {
    text: String,
    x: f32,
    y: f32,
    max_width: f32,
    max_height: f32,
    pixel_size: u32,
    alignment: Alignment,
    flags: LabelFlags,
    indentation: Option<f32>,
    window_width: u32,
    window_height: u32,
    aspect: AspectCorrection,
    current_width: f32,
    current_height: f32,
}

impl LayoutState {
    fn new(pixel_size: u32) -> Self {
        let defaults = LabelConfig::default();
        Self {
            text: String::new(),
            x: 0.0,
            y: 0.0,
            max_width: 0.0,
            max_height: 0.0,
            pixel_size,
            alignment: defaults.alignment,
            flags: defaults.flags,
            indentation: None,
            window_width: defaults.window_width,
            window_height: defaults.window_height,
            aspect: AspectCorrection::NONE,
            current_width: 0.0,
            current_height: 0.0,
        }
    }
}

/// A laid-out, renderable text label.
pub struct TextLabel<R: Rasterizer + 'static = FontFace> {
    face: SharedFace<R>,
    cache: Box<dyn AtlasCache<R>>,
    atlas: Rc<GlyphAtlas>,
    state: LayoutState,
    color: [f32; 4],
    transform: LabelTransform,
    layout: TextLayout,
    initialized: bool,
}

impl<R: Rasterizer + 'static> TextLabel<R> {
    // ── Construction ────────────────────────────────────────────────

    /// An empty label for a window of the given size.
    pub fn new(face: SharedFace<R>, window_width: u32, window_height: u32) -> Result<Self> {
        let config = LabelConfig {
            window_width,
            window_height,
            ..LabelConfig::default()
        };
        Self::from_config(face, &config)
    }

    /// A label showing `text` anchored at (`x`, `y`).
    pub fn with_text(
        face: SharedFace<R>,
        text: impl Into<String>,
        x: f32,
        y: f32,
        window_width: u32,
        window_height: u32,
    ) -> Result<Self> {
        let config = LabelConfig {
            text: text.into(),
            x,
            y,
            window_width,
            window_height,
            ..LabelConfig::default()
        };
        Self::from_config(face, &config)
    }

    /// A label constrained to a `max_width` x `max_height` box.
    #[allow(clippy::too_many_arguments)]
    pub fn with_bounds(
        face: SharedFace<R>,
        text: impl Into<String>,
        x: f32,
        y: f32,
        max_width: f32,
        max_height: f32,
        window_width: u32,
        window_height: u32,
    ) -> Result<Self> {
        let config = LabelConfig {
            text: text.into(),
            x,
            y,
            max_width,
            max_height,
            window_width,
            window_height,
            ..LabelConfig::default()
        };
        Self::from_config(face, &config)
    }

    /// A label with its own per-label atlas cache.
    pub fn from_config(face: SharedFace<R>, config: &LabelConfig) -> Result<Self> {
        Self::with_cache(face, Box::new(LabelAtlasCache::new()), config)
    }

    /// A label drawing its atlases from `cache`.
    pub fn with_cache(
        face: SharedFace<R>,
        mut cache: Box<dyn AtlasCache<R>>,
        config: &LabelConfig,
    ) -> Result<Self> {
        if config.pixel_size == 0 {
            return Err(LabelError::InvalidPixelSize(0));
        }
        let atlas = cache.get_or_build(&mut *face.borrow_mut(), config.pixel_size)?;

        let mut label = Self {
            face,
            cache,
            atlas,
            state: LayoutState::new(config.pixel_size),
            color: config.color,
            transform: LabelTransform::new(),
            layout: TextLayout::default(),
            initialized: false,
        };
        label.apply_config(config)?;

        label.initialized = true;
        label.recompute()?;
        Ok(label)
    }

    /// Stage or apply every field of `config`.
    pub fn apply_config(&mut self, config: &LabelConfig) -> Result<()> {
        self.set_window_size(config.window_width, config.window_height)?;
        self.set_aspect_ratio(config.aspect_ratio)?;
        self.set_pixel_size(config.pixel_size)?;
        self.set_position(config.x, config.y)?;
        self.set_max_size(config.max_width, config.max_height)?;
        self.set_alignment(config.alignment)?;
        self.set_font_flags(config.flags)?;
        if let Some(indentation) = config.indentation {
            self.set_indentation(indentation)?;
        }
        self.set_text(config.text.clone())?;
        self.set_color(config.color);
        Ok(())
    }

    // ── Geometric setters ───────────────────────────────────────────

    pub fn set_text(&mut self, text: impl Into<String>) -> Result<()> {
        self.state.text = text.into();
        self.refresh()
    }

    pub fn set_position(&mut self, x: f32, y: f32) -> Result<()> {
        self.state.x = x;
        self.state.y = y;
        self.refresh()
    }

    /// 0 in either dimension removes that constraint.
    pub fn set_max_size(&mut self, max_width: f32, max_height: f32) -> Result<()> {
        self.state.max_width = max_width.max(0.0);
        self.state.max_height = max_height.max(0.0);
        self.refresh()
    }

    /// Switch to another pixel size, building its atlas on first use.
    pub fn set_pixel_size(&mut self, pixel_size: u32) -> Result<()> {
        if pixel_size == 0 {
            return Err(LabelError::InvalidPixelSize(pixel_size));
        }
        if self.initialized {
            self.atlas = self.ensure_atlas(pixel_size)?;
        }
        self.state.pixel_size = pixel_size;
        self.refresh()
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> Result<()> {
        self.state.alignment = alignment;
        self.refresh()
    }

    /// Track the window size. A zero dimension (minimised) is ignored.
    pub fn set_window_size(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            log::debug!("TextLabel: ignoring window size {}x{}", width, height);
            return Ok(());
        }
        self.state.window_width = width;
        self.state.window_height = height;
        self.refresh()
    }

    /// Correct for a viewport whose width/height ratio is `ratio`.
    pub fn set_aspect_ratio(&mut self, ratio: f32) -> Result<()> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(LabelError::InvalidAspectRatio(ratio));
        }
        self.state.aspect = AspectCorrection::from_ratio(ratio);
        self.refresh()
    }

    /// Replace all flags.
    pub fn set_font_flags(&mut self, flags: LabelFlags) -> Result<()> {
        self.state.flags = flags;
        self.refresh()
    }

    /// Add flags to the current set.
    pub fn append_font_flags(&mut self, flags: LabelFlags) -> Result<()> {
        self.state.flags |= flags;
        self.refresh()
    }

    /// First-line indent in pixels, used while `INDENTED` is set.
    pub fn set_indentation(&mut self, pixels: f32) -> Result<()> {
        self.state.indentation = Some(pixels);
        self.refresh()
    }

    /// Swap the font face; atlases are rebuilt for the new face.
    ///
    /// If the new face cannot build an atlas the label keeps its old face.
    pub fn set_font(&mut self, face: SharedFace<R>) -> Result<()> {
        let atlas = self
            .cache
            .get_or_build(&mut *face.borrow_mut(), self.state.pixel_size)?;
        self.face = face;
        self.atlas = atlas;
        self.refresh()
    }

    // ── Presentation setters ────────────────────────────────────────

    /// RGBA text color, 0..1. Does not touch the layout.
    pub fn set_color(&mut self, color: [f32; 4]) {
        self.color = color;
    }

    pub fn rotate(&mut self, degrees: f32, axis: [f32; 3]) {
        self.transform.rotate(degrees, axis);
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.transform.scale(x, y, z);
    }

    // ── Getters ─────────────────────────────────────────────────────

    pub fn text(&self) -> &str {
        &self.state.text
    }

    pub fn x(&self) -> f32 {
        self.state.x
    }

    pub fn y(&self) -> f32 {
        self.state.y
    }

    pub fn max_width(&self) -> f32 {
        self.state.max_width
    }

    pub fn max_height(&self) -> f32 {
        self.state.max_height
    }

    pub fn pixel_size(&self) -> u32 {
        self.state.pixel_size
    }

    pub fn alignment(&self) -> Alignment {
        self.state.alignment
    }

    pub fn flags(&self) -> LabelFlags {
        self.state.flags
    }

    /// Configured indentation, or the pixel size when unset.
    pub fn indentation(&self) -> f32 {
        self.state
            .indentation
            .unwrap_or(self.state.pixel_size as f32)
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.state.window_width, self.state.window_height)
    }

    pub fn aspect(&self) -> AspectCorrection {
        self.state.aspect
    }

    /// Width of the widest line of the last layout.
    pub fn current_width(&self) -> f32 {
        self.state.current_width
    }

    /// Height of the lines emitted by the last layout.
    pub fn current_height(&self) -> f32 {
        self.state.current_height
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.layout.vertices
    }

    pub fn lines(&self) -> &[LaidOutLine] {
        &self.layout.lines
    }

    pub fn layout(&self) -> &TextLayout {
        &self.layout
    }

    /// The atlas for the current pixel size.
    pub fn atlas(&self) -> &Rc<GlyphAtlas> {
        &self.atlas
    }

    pub fn face(&self) -> &SharedFace<R> {
        &self.face
    }

    pub fn transform(&self) -> &LabelTransform {
        &self.transform
    }

    pub fn mvp(&self) -> Mat4 {
        self.transform.mvp()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of atlases held by this label's cache.
    pub fn cached_atlas_count(&self) -> usize {
        self.cache.len()
    }

    /// Width of `text` with the current atlas and aspect correction.
    pub fn measure(&self, text: &str) -> f32 {
        layout::measure(&self.atlas, text, self.state.aspect.x)
    }

    /// The atlas for `pixel_size`, built and cached on first use.
    pub fn ensure_atlas(&mut self, pixel_size: u32) -> Result<Rc<GlyphAtlas>> {
        let mut face = self.face.borrow_mut();
        self.cache.get_or_build(&mut *face, pixel_size)
    }

    // ── Recompute ───────────────────────────────────────────────────

    fn refresh(&mut self) -> Result<()> {
        if self.initialized {
            self.recompute()
        } else {
            Ok(())
        }
    }

    fn indent(&self) -> f32 {
        let indented = self.state.flags.contains(LabelFlags::INDENTED);
        if indented && self.state.alignment != Alignment::Center {
            self.indentation()
        } else {
            0.0
        }
    }

    fn wrap_width(&self) -> f32 {
        if self.state.flags.contains(LabelFlags::WORD_WRAP) {
            self.state.max_width
        } else {
            0.0
        }
    }

    fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            x: self.state.x,
            y: self.state.y,
            max_height: self.state.max_height,
            alignment: self.state.alignment,
            indent: self.indent(),
            window_width: self.state.window_width,
            window_height: self.state.window_height,
            aspect: self.state.aspect,
        }
    }

    fn recompute(&mut self) -> Result<()> {
        let pixel_size = self.state.pixel_size;
        if self.atlas.pixel_size() != pixel_size || self.atlas.face_id() != self.face_id() {
            self.atlas = self.ensure_atlas(pixel_size)?;
        }

        let params = self.layout_params();
        let wrap_width = self.wrap_width();
        {
            // Another label may have moved a shared face to its own size.
            let mut face = self.face.borrow_mut();
            if face.pixel_size() != pixel_size {
                face.set_pixel_size(pixel_size)?;
            }
            self.layout =
                layout::layout_text(&*face, &self.atlas, &self.state.text, wrap_width, &params);
        }

        self.state.current_width = self.layout.width;
        self.state.current_height = self.layout.height;

        log::debug!(
            "TextLabel: {} lines, {} vertices, {:.0}x{:.0}px",
            self.layout.lines.len(),
            self.layout.vertices.len(),
            self.state.current_width,
            self.state.current_height,
        );
        Ok(())
    }

    fn face_id(&self) -> u64 {
        self.face.borrow().face_id()
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SharedAtlasCache;
    use crate::face::shared;
    use crate::testing::TestFace;

    fn label(text: &str) -> TextLabel<TestFace> {
        let config = LabelConfig {
            text: text.into(),
            pixel_size: 16,
            window_width: 200,
            window_height: 100,
            ..LabelConfig::default()
        };
        TextLabel::from_config(shared(TestFace::new()), &config).unwrap()
    }

    #[test]
    fn test_defaults() {
        let label = TextLabel::new(shared(TestFace::new()), 800, 600).unwrap();
        assert!(label.is_initialized());
        assert_eq!(label.pixel_size(), 48);
        assert_eq!(label.alignment(), Alignment::Left);
        assert_eq!(label.flags(), LabelFlags::WORD_WRAP);
        assert_eq!(label.color(), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(label.aspect(), AspectCorrection::NONE);
        assert_eq!(label.window_size(), (800, 600));
        assert!(label.vertices().is_empty());
        assert_eq!(label.lines().len(), 1);
    }

    #[test]
    fn test_construction_builds_single_atlas() {
        let label = label("Hello");
        assert_eq!(label.cached_atlas_count(), 1);
        assert_eq!(label.atlas().pixel_size(), 16);
        assert_eq!(label.layout().quad_count(), 5);
    }

    #[test]
    fn test_construction_fails_when_atlas_fails() {
        let face = shared(TestFace::failing_on(b'z'));
        let result = TextLabel::new(face, 800, 600);
        assert!(matches!(result, Err(LabelError::Rasterize { .. })));
    }

    #[test]
    fn test_failed_set_font_keeps_label_usable() {
        let mut label = label("Hello");
        let face_id = label.face().borrow().face_id();
        let before = label.layout().clone();

        let result = label.set_font(shared(TestFace::failing_on(b'z')));
        assert!(matches!(result, Err(LabelError::Rasterize { codepoint: b'z', .. })));
        assert_eq!(label.face().borrow().face_id(), face_id);
        assert_eq!(label.atlas().face_id(), face_id);
        assert_eq!(label.layout(), &before);
        assert_eq!(label.cached_atlas_count(), 1);

        label.set_text("abc").unwrap();
        assert_eq!(label.current_width(), 30.0);
    }

    #[test]
    fn test_failed_set_pixel_size_keeps_state() {
        let config = LabelConfig {
            text: "Hello".into(),
            pixel_size: 16,
            window_width: 200,
            window_height: 100,
            ..LabelConfig::default()
        };
        let mut label =
            TextLabel::from_config(shared(TestFace::failing_at_size(32)), &config).unwrap();
        let before = label.layout().clone();
        let atlas = Rc::clone(label.atlas());

        assert!(label.set_pixel_size(32).is_err());
        assert_eq!(label.pixel_size(), 16);
        assert!(Rc::ptr_eq(label.atlas(), &atlas));
        assert_eq!(label.layout(), &before);
        assert_eq!(label.current_width(), 38.0);

        // The face was left at the failed size; the next recompute restores it.
        label.set_text("ab").unwrap();
        assert_eq!(label.face().borrow().pixel_size(), 16);
        assert_eq!(label.current_width(), 20.0);
    }

    #[test]
    fn test_set_text_recomputes() {
        let mut label = label("ab");
        assert_eq!(label.current_width(), 20.0);
        label.set_text("abcd").unwrap();
        assert_eq!(label.current_width(), 40.0);
        assert_eq!(label.vertices().len(), 24);
        assert_eq!(label.text(), "abcd");
    }

    #[test]
    fn test_presentation_setters_keep_layout() {
        let mut label = label("Hello there");
        let before = label.layout().clone();
        let size = (label.current_width(), label.current_height());

        label.set_color([1.0, 0.0, 0.0, 1.0]);
        label.rotate(30.0, [0.0, 0.0, 1.0]);
        label.scale(2.0, 2.0, 1.0);

        assert_eq!(label.layout(), &before);
        assert_eq!((label.current_width(), label.current_height()), size);
        assert_ne!(label.mvp(), LabelTransform::new().mvp());
    }

    #[test]
    fn test_pixel_sizes_cached_independently() {
        let mut label = label("Hi");
        let small = Rc::clone(label.atlas());

        label.set_pixel_size(32).unwrap();
        let large = Rc::clone(label.atlas());
        assert!(!Rc::ptr_eq(&small, &large));
        assert_eq!(label.current_width(), 28.0);

        label.set_pixel_size(16).unwrap();
        assert!(Rc::ptr_eq(&small, label.atlas()));
        assert_eq!(label.cached_atlas_count(), 2);
        assert_eq!(label.face().borrow().pixel_size(), 16);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let mut label = label("x");
        assert!(matches!(
            label.set_pixel_size(0),
            Err(LabelError::InvalidPixelSize(0))
        ));
        assert!(matches!(
            label.set_aspect_ratio(0.0),
            Err(LabelError::InvalidAspectRatio(_))
        ));
        assert!(label.set_aspect_ratio(f32::NAN).is_err());
        assert_eq!(label.pixel_size(), 16);
        assert_eq!(label.aspect(), AspectCorrection::NONE);
    }

    #[test]
    fn test_zero_window_size_ignored() {
        let mut label = label("abc");
        let before = label.layout().clone();
        label.set_window_size(0, 0).unwrap();
        assert_eq!(label.window_size(), (200, 100));
        assert_eq!(label.layout(), &before);
    }

    #[test]
    fn test_window_resize_rescales_vertices() {
        let mut label = label("a");
        let before = label.vertices()[1].x - label.vertices()[0].x;
        label.set_window_size(400, 100).unwrap();
        let after = label.vertices()[1].x - label.vertices()[0].x;
        assert!((before - 2.0 * after).abs() < 1e-5);
    }

    #[test]
    fn test_word_wrap_flag_gates_wrapping() {
        let mut label = label("aa bb cc");
        label.set_max_size(45.0, 0.0).unwrap();
        assert_eq!(label.lines().len(), 2);

        label.set_font_flags(LabelFlags::empty()).unwrap();
        assert_eq!(label.lines().len(), 1);

        label.append_font_flags(LabelFlags::WORD_WRAP).unwrap();
        assert_eq!(label.lines().len(), 2);
    }

    #[test]
    fn test_indentation() {
        let mut label = label("ab cd");
        label.append_font_flags(LabelFlags::INDENTED).unwrap();
        // Defaults to the pixel size.
        assert_eq!(label.lines()[0].origin_x, 16.0);

        label.set_indentation(8.0).unwrap();
        assert_eq!(label.lines()[0].origin_x, 8.0);

        label.set_alignment(Alignment::Center).unwrap();
        assert_eq!(label.lines()[0].origin_x, -label.current_width() / 2.0);
    }

    #[test]
    fn test_set_font_rebuilds_atlas() {
        let mut label = label("abc");
        let old = Rc::clone(label.atlas());

        let replacement = shared(TestFace::new());
        let replacement_id = replacement.borrow().face_id();
        label.set_font(replacement).unwrap();

        assert!(!Rc::ptr_eq(&old, label.atlas()));
        assert_eq!(label.atlas().face_id(), replacement_id);
        assert_eq!(label.cached_atlas_count(), 1);
        assert_eq!(label.vertices().len(), 18);
    }

    #[test]
    fn test_shared_face_keeps_per_label_size() {
        let face = shared(TestFace::new());
        let small = LabelConfig {
            text: "a".into(),
            pixel_size: 16,
            ..LabelConfig::default()
        };
        let large = LabelConfig {
            pixel_size: 32,
            ..small.clone()
        };

        let mut first = TextLabel::from_config(Rc::clone(&face), &small).unwrap();
        let second = TextLabel::from_config(Rc::clone(&face), &large).unwrap();
        assert_eq!(face.borrow().pixel_size(), 32);

        first.set_text("aa").unwrap();
        assert_eq!(face.borrow().pixel_size(), 16);
        assert_eq!(first.current_width(), 20.0);
        assert_eq!(second.current_width(), 20.0);
    }

    #[test]
    fn test_shared_cache_between_labels() {
        let face = shared(TestFace::new());
        let cache = SharedAtlasCache::unbounded();
        let config = LabelConfig {
            text: "shared".into(),
            pixel_size: 24,
            ..LabelConfig::default()
        };

        let a = TextLabel::with_cache(Rc::clone(&face), Box::new(cache.clone()), &config).unwrap();
        let b = TextLabel::with_cache(Rc::clone(&face), Box::new(cache.clone()), &config).unwrap();
        assert!(Rc::ptr_eq(a.atlas(), b.atlas()));
        assert_eq!(a.vertices(), b.vertices());
    }

    #[test]
    fn test_measure_uses_aspect() {
        let mut label = label("");
        assert_eq!(label.measure("ab"), 20.0);
        label.set_aspect_ratio(2.0).unwrap();
        assert_eq!(label.measure("ab"), 40.0);
    }

    #[test]
    fn test_flags_serde_text_form() {
        let json = serde_json::to_string(&(LabelFlags::WORD_WRAP | LabelFlags::BOLD)).unwrap();
        assert_eq!(json, "\"WORD_WRAP | BOLD\"");
        let parsed: LabelFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, LabelFlags::WORD_WRAP | LabelFlags::BOLD);
    }
}
