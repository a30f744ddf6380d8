//! Presentation transform applied to a label's quads on the GPU.
//!
//! Layout output is already in clip space; this transform only rotates
//! and scales it for display. It never feeds back into layout.

use glam::{Mat4, Vec3};

/// Projection, view and model matrices for one label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelTransform {
    projection: Mat4,
    view: Mat4,
    model: Mat4,
}

impl Default for LabelTransform {
    fn default() -> Self {
        Self {
            // Depth range 0..1, the wgpu convention.
            projection: Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, 0.1, 100.0),
            view: Mat4::look_at_rh(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, Vec3::Y),
            model: Mat4::IDENTITY,
        }
    }
}

impl LabelTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotate the model by `degrees` around `axis`. A zero axis is ignored.
    pub fn rotate(&mut self, degrees: f32, axis: [f32; 3]) {
        match Vec3::from(axis).try_normalize() {
            Some(axis) => self.model *= Mat4::from_axis_angle(axis, degrees.to_radians()),
            None => log::warn!("LabelTransform: ignoring rotation around zero axis"),
        }
    }

    /// Scale the model per axis.
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.model *= Mat4::from_scale(Vec3::new(x, y, z));
    }

    /// Drop accumulated rotations and scales.
    pub fn reset(&mut self) {
        self.model = Mat4::IDENTITY;
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// `projection * view * model`.
    pub fn mvp(&self) -> Mat4 {
        self.projection * self.view * self.model
    }
}
