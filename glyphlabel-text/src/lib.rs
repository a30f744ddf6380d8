//! # glyphlabel-text
//!
//! Glyph atlases and text label layout. Turns a font face plus a pixel
//! size into a packed coverage atlas, and a string plus layout
//! constraints into clip-space textured quads ready for one draw call.
//!
//! ## Architecture
//!
//! ```text
//! FontFace (fontdue + font-kit)  ──impl──►  Rasterizer
//!     │
//!     ▼
//! AtlasCache::get_or_build(face, px) ──► Rc<GlyphAtlas> { records, R8 strip }
//!     │
//!     ▼
//! TextLabel ── tokenize ─► break_lines ─► layout_lines ──► TextLayout { Vec<Vertex> }
//! ```
//!
//! - **`face`** — Rasterizer seam and the `fontdue` font face.
//! - **`atlas`** — Glyph metrics table and packed texture.
//! - **`cache`** — Per-label and shared atlas caches.
//! - **`layout`** — Word splitting, line breaking, quad generation.
//! - **`label`** — Stateful label that recomputes on every geometric change.
//! - **`transform`** — Rotation/scale/MVP for the renderer.
//! - **`config`** — JSON label configuration.
//!
//! No GPU types live here; `glyphlabel-render` uploads the results.

pub mod atlas;
pub mod cache;
pub mod config;
pub mod error;
pub mod face;
pub mod label;
pub mod layout;
pub mod transform;

#[cfg(test)]
mod testing;

// Re-exports for ergonomic use.
pub use atlas::{GlyphAtlas, GlyphRecord, FALLBACK_CODEPOINT, GLYPH_COUNT};
pub use cache::{AtlasCache, LabelAtlasCache, SharedAtlasCache};
pub use config::LabelConfig;
pub use error::{LabelError, Result};
pub use face::{shared, FontFace, Rasterizer, RenderedGlyph, SharedFace};
pub use label::{LabelFlags, TextLabel};
pub use layout::{Alignment, AspectCorrection, LaidOutLine, LayoutParams, TextLayout, Vertex};
pub use transform::LabelTransform;
