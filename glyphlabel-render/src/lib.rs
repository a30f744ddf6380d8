//! # glyphlabel-render
//!
//! GPU upload and drawing for `glyphlabel-text` labels, built on `wgpu`.
//!
//! ## Architecture
//!
//! ```text
//!  TextLabel (glyphlabel-text)
//!       │  vertices (x, y, s, t)      atlas R8 strip      mvp + color
//!       ▼
//!  LabelRenderer.prepare(labels)   ◀─── uploads atlases once, vertices per frame
//!       │
//!       ▼
//!  LabelRenderer.render_to_surface()   ◀─── one draw call per label
//! ```
//!
//! ## Crate modules
//!
//! - [`context`] — GPU device/queue/surface initialisation
//! - [`vertex`] — vertex layout and per-label uniform
//! - [`pipelines`] — the label render pipeline
//! - [`renderer`] — frame orchestration

pub mod context;
pub mod pipelines;
pub mod renderer;
pub mod vertex;

// Re-exports for convenience
pub use context::{GpuContext, GpuError};
pub use pipelines::{GpuAtlas, GpuLabel, LabelPipeline};
pub use renderer::{check_atlas_size, FrameStats, LabelRenderer, RenderError};
pub use vertex::{vertex_layout, LabelUniform};
