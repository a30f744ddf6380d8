//! GPU-side layouts for label vertices and per-label uniforms.
//!
//! Vertices come straight from `glyphlabel_text::Vertex` (already `Pod`),
//! so a label's vertex list uploads with a single `cast_slice`.

use bytemuck::{Pod, Zeroable};
use glyphlabel_text::{Rasterizer, TextLabel, Vertex};
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

/// Buffer layout for [`Vertex`]: `(x, y, s, t)` at location 0.
pub fn vertex_layout() -> VertexBufferLayout<'static> {
    static ATTRS: &[VertexAttribute] = &[
        // location(0) = clip xy + atlas st
        VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: VertexFormat::Float32x4,
        },
    ];
    VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
        step_mode: VertexStepMode::Vertex,
        attributes: ATTRS,
    }
}

/// Per-label uniform: transform and text color. 80 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LabelUniform {
    /// Column-major projection * view * model.
    pub mvp: [[f32; 4]; 4],
    /// RGBA; alpha is multiplied by atlas coverage.
    pub color: [f32; 4],
}

impl LabelUniform {
    pub const IDENTITY: [[f32; 4]; 4] = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];

    pub fn new(mvp: [[f32; 4]; 4], color: [f32; 4]) -> Self {
        Self { mvp, color }
    }

    /// Identity transform, given color.
    pub fn with_color(color: [f32; 4]) -> Self {
        Self::new(Self::IDENTITY, color)
    }

    /// Snapshot a label's transform and color.
    pub fn from_label<R: Rasterizer + 'static>(label: &TextLabel<R>) -> Self {
        Self::new(label.mvp().to_cols_array_2d(), label.color())
    }
}
