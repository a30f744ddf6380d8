//! Frame renderer — uploads labels and draws them in one render pass.

use std::collections::{HashMap, HashSet};

use glyphlabel_text::{Rasterizer, TextLabel};
use thiserror::Error;
use wgpu::{
    Color, CommandEncoderDescriptor, LoadOp, Operations, RenderPassColorAttachment,
    RenderPassDescriptor, StoreOp, TextureView, TextureViewDescriptor,
};

use crate::context::GpuContext;
use crate::pipelines::{GpuAtlas, GpuLabel, LabelPipeline};
use crate::vertex::LabelUniform;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("No surface configured (headless mode)")]
    NoSurface,
    #[error("Atlas {atlas_id} is {width}x{height}, device limit is {max}")]
    AtlasTooLarge {
        atlas_id: u64,
        width: u32,
        height: u32,
        max: u32,
    },
}

/// Reject atlases the device cannot hold as a single 2D texture.
pub fn check_atlas_size(
    atlas_id: u64,
    width: u32,
    height: u32,
    max: u32,
) -> Result<(), RenderError> {
    if width > max || height > max {
        return Err(RenderError::AtlasTooLarge {
            atlas_id,
            width,
            height,
            max,
        });
    }
    Ok(())
}

/// Frame statistics returned after each render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Labels prepared for this frame.
    pub label_count: u32,
    /// Vertices drawn across all labels.
    pub vertex_count: u32,
    /// One per label with at least one glyph.
    pub draw_calls: u32,
    /// Atlas textures resident on the GPU.
    pub atlas_count: u32,
}

/// Draws a set of labels.
///
/// # Usage
///
/// ```ignore
/// let mut renderer = LabelRenderer::new(&gpu);
/// renderer.prepare(&gpu, &[&title, &body])?;
/// let stats = renderer.render_to_surface(&gpu)?;
/// ```
pub struct LabelRenderer {
    pipeline: LabelPipeline,
    atlases: HashMap<u64, GpuAtlas>,
    labels: Vec<GpuLabel>,
    clear_color: Color,
}

impl LabelRenderer {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            pipeline: LabelPipeline::new(&gpu.device, gpu.surface_format),
            atlases: HashMap::new(),
            labels: Vec::new(),
            clear_color: Color::WHITE,
        }
    }

    /// Set the background clear color.
    pub fn set_clear_color(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.clear_color = Color { r, g, b, a };
    }

    /// Upload this frame's labels.
    ///
    /// Atlases are uploaded the first time they are seen and released once
    /// no prepared label uses them. If any atlas exceeds the device's
    /// texture limit nothing is uploaded and the previous frame stays.
    pub fn prepare<R: Rasterizer + 'static>(
        &mut self,
        gpu: &GpuContext,
        labels: &[&TextLabel<R>],
    ) -> Result<(), RenderError> {
        let max = gpu.device.limits().max_texture_dimension_2d;
        for label in labels {
            let atlas = label.atlas();
            if !self.atlases.contains_key(&atlas.id()) {
                check_atlas_size(atlas.id(), atlas.width(), atlas.height(), max)?;
            }
        }

        let mut live = HashSet::with_capacity(labels.len());

        for (index, &label) in labels.iter().enumerate() {
            let atlas = label.atlas();
            live.insert(atlas.id());
            if !self.atlases.contains_key(&atlas.id()) {
                let gpu_atlas = self.pipeline.upload_atlas(&gpu.device, &gpu.queue, atlas);
                self.atlases.insert(atlas.id(), gpu_atlas);
            }

            let uniform = LabelUniform::from_label(label);
            match self.labels.get_mut(index) {
                Some(slot) => self.pipeline.update_label(
                    &gpu.device,
                    &gpu.queue,
                    slot,
                    label.vertices(),
                    &uniform,
                    atlas.id(),
                ),
                None => {
                    let slot = self.pipeline.create_label(
                        &gpu.device,
                        &gpu.queue,
                        label.vertices(),
                        &uniform,
                        atlas.id(),
                    );
                    self.labels.push(slot);
                }
            }
        }

        self.labels.truncate(labels.len());
        self.atlases.retain(|id, _| live.contains(id));
        Ok(())
    }

    /// Render to the window surface.
    pub fn render_to_surface(&self, gpu: &GpuContext) -> Result<FrameStats, RenderError> {
        let surface = gpu.surface.as_ref().ok_or(RenderError::NoSurface)?;
        let output = surface.get_current_texture()?;
        let view = output.texture.create_view(&TextureViewDescriptor::default());

        let stats = self.encode(gpu, &view, "glyphlabel_frame");
        output.present();
        Ok(stats)
    }

    /// Render into an off-screen texture view (headless mode).
    pub fn render_to_texture(&self, gpu: &GpuContext, target_view: &TextureView) -> FrameStats {
        self.encode(gpu, target_view, "glyphlabel_offscreen")
    }

    /// Statistics for the currently prepared frame, without drawing.
    pub fn stats(&self) -> FrameStats {
        let drawable = self.labels.iter().filter(|l| l.vertex_count() > 0);
        FrameStats {
            label_count: self.labels.len() as u32,
            vertex_count: self.labels.iter().map(GpuLabel::vertex_count).sum(),
            draw_calls: drawable.count() as u32,
            atlas_count: self.atlases.len() as u32,
        }
    }

    fn encode(&self, gpu: &GpuContext, view: &TextureView, label: &str) -> FrameStats {
        let mut encoder = gpu.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some(label),
        });

        let mut stats = self.stats();
        stats.draw_calls = 0;
        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear_color),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for gpu_label in &self.labels {
                let Some(atlas) = self.atlases.get(&gpu_label.atlas_id()) else {
                    log::warn!("LabelRenderer: atlas {} missing", gpu_label.atlas_id());
                    continue;
                };
                if self.pipeline.draw(&mut pass, gpu_label, atlas) {
                    stats.draw_calls += 1;
                }
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        stats
    }

    /// Number of atlas textures resident on the GPU.
    pub fn atlas_count(&self) -> usize {
        self.atlases.len()
    }
}

// ===================================================================
// Tests
// ===================================================================
