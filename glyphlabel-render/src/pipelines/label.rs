//! Label render pipeline — one non-indexed triangle list per label.
//!
//! Each label's vertex list is uploaded as-is (six vertices per glyph) and
//! drawn with its atlas bound at group 1 and its uniform at group 0.
//! Atlases are immutable, so a [`GpuAtlas`] is uploaded once and reused
//! for as long as any label references the same `GlyphAtlas`.

use glyphlabel_text::{GlyphAtlas, Vertex};
use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType, BlendState,
    Buffer, BufferBindingType, BufferDescriptor, BufferUsages, ColorTargetState, ColorWrites,
    Device, Extent3d, FilterMode, FragmentState, FrontFace, MultisampleState,
    PipelineCompilationOptions, PipelineLayoutDescriptor, PolygonMode, PrimitiveState,
    PrimitiveTopology, Queue, RenderPass, RenderPipeline, RenderPipelineDescriptor, Sampler,
    SamplerBindingType, SamplerDescriptor, ShaderModuleDescriptor, ShaderStages, Texture,
    TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType, TextureUsages,
    TextureViewDimension, VertexState,
};

use crate::vertex::{vertex_layout, LabelUniform};

/// Smallest vertex buffer allocated for a label (in vertices).
const MIN_VERTEX_CAPACITY: usize = 6 * 16;

/// An uploaded glyph atlas and its bind group.
pub struct GpuAtlas {
    atlas_id: u64,
    width: u32,
    height: u32,
    #[allow(dead_code)]
    texture: Texture,
    bind_group: BindGroup,
}

impl GpuAtlas {
    /// The `GlyphAtlas::id()` this texture was uploaded from.
    pub fn atlas_id(&self) -> u64 {
        self.atlas_id
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// GPU buffers for one label.
pub struct GpuLabel {
    vertex_buffer: Buffer,
    vertex_capacity: usize,
    vertex_count: u32,
    uniform_buffer: Buffer,
    uniform_bind_group: BindGroup,
    atlas_id: u64,
}

impl GpuLabel {
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn vertex_capacity(&self) -> usize {
        self.vertex_capacity
    }

    /// Atlas this label samples from.
    pub fn atlas_id(&self) -> u64 {
        self.atlas_id
    }
}

/// Owns the pipeline, bind group layouts and the shared atlas sampler.
pub struct LabelPipeline {
    pipeline: RenderPipeline,
    uniform_bgl: BindGroupLayout,
    atlas_bgl: BindGroupLayout,
    sampler: Sampler,
}

impl LabelPipeline {
    pub fn new(device: &Device, surface_format: TextureFormat) -> Self {
        // ── Shader ──────────────────────────────────────────────
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("label_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/label.wgsl").into()),
        });

        // ── Uniform bind group layout (group 0) ─────────────────
        let uniform_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("label_uniform_bgl"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        // ── Atlas bind group layout (group 1) ───────────────────
        let atlas_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("label_atlas_bgl"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("label_pipeline_layout"),
            bind_group_layouts: &[&uniform_bgl, &atlas_bgl],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("label_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[vertex_layout()],
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Bitmaps are packed without padding: sample nearest.
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("glyph_atlas_sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            pipeline,
            uniform_bgl,
            atlas_bgl,
            sampler,
        }
    }

    // ───────────────────── Upload ─────────────────────────────────

    /// Upload an atlas as an `R8Unorm` texture.
    ///
    /// The atlas must fit `max_texture_dimension_2d`; see
    /// [`check_atlas_size`](crate::renderer::check_atlas_size).
    pub fn upload_atlas(&self, device: &Device, queue: &Queue, atlas: &GlyphAtlas) -> GpuAtlas {
        let width = atlas.width().max(1);
        let height = atlas.height().max(1);
        let size = Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&TextureDescriptor {
            label: Some("glyph_atlas"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::R8Unorm,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        // An atlas with no ink stays a blank 1x1 texture.
        if !atlas.pixels().is_empty() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                atlas.pixels(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(atlas.width()), // R8 = 1 byte per texel
                    rows_per_image: Some(atlas.height()),
                },
                size,
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("label_atlas_bg"),
            layout: &self.atlas_bgl,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(&view),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        log::debug!(
            "LabelPipeline: uploaded atlas {} ({}x{} @ {}px)",
            atlas.id(),
            atlas.width(),
            atlas.height(),
            atlas.pixel_size(),
        );

        GpuAtlas {
            atlas_id: atlas.id(),
            width,
            height,
            texture,
            bind_group,
        }
    }

    /// Allocate buffers for a label and upload its first frame.
    pub fn create_label(
        &self,
        device: &Device,
        queue: &Queue,
        vertices: &[Vertex],
        uniform: &LabelUniform,
        atlas_id: u64,
    ) -> GpuLabel {
        let vertex_capacity = vertices.len().next_power_of_two().max(MIN_VERTEX_CAPACITY);
        let vertex_buffer = Self::vertex_buffer(device, vertex_capacity);

        let uniform_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("label_uniform_ub"),
            size: std::mem::size_of::<LabelUniform>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("label_uniform_bg"),
            layout: &self.uniform_bgl,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let mut label = GpuLabel {
            vertex_buffer,
            vertex_capacity,
            vertex_count: 0,
            uniform_buffer,
            uniform_bind_group,
            atlas_id,
        };
        self.update_label(device, queue, &mut label, vertices, uniform, atlas_id);
        label
    }

    /// Re-upload a label's vertices and uniform, growing its buffer if needed.
    pub fn update_label(
        &self,
        device: &Device,
        queue: &Queue,
        label: &mut GpuLabel,
        vertices: &[Vertex],
        uniform: &LabelUniform,
        atlas_id: u64,
    ) {
        if vertices.len() > label.vertex_capacity {
            label.vertex_capacity = vertices.len().next_power_of_two();
            label.vertex_buffer = Self::vertex_buffer(device, label.vertex_capacity);
        }
        if !vertices.is_empty() {
            queue.write_buffer(&label.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        }
        queue.write_buffer(&label.uniform_buffer, 0, bytemuck::bytes_of(uniform));
        label.vertex_count = vertices.len() as u32;
        label.atlas_id = atlas_id;
    }

    fn vertex_buffer(device: &Device, capacity: usize) -> Buffer {
        device.create_buffer(&BufferDescriptor {
            label: Some("label_vertices"),
            size: (capacity * std::mem::size_of::<Vertex>()) as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    // ───────────────────── Draw ───────────────────────────────────

    /// Record one draw for `label`. Returns whether anything was drawn.
    pub fn draw(&self, pass: &mut RenderPass<'_>, label: &GpuLabel, atlas: &GpuAtlas) -> bool {
        if label.vertex_count == 0 {
            return false;
        }

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &label.uniform_bind_group, &[]);
        pass.set_bind_group(1, &atlas.bind_group, &[]);
        pass.set_vertex_buffer(0, label.vertex_buffer.slice(..));
        pass.draw(0..label.vertex_count, 0..1);
        true
    }
}
