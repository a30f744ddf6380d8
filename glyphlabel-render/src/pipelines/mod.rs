//! wgpu render pipelines.

pub mod label;

pub use label::{GpuAtlas, GpuLabel, LabelPipeline};
