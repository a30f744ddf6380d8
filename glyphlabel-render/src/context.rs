//! Device setup for label rendering.
//!
//! A [`GpuContext`] either draws off-screen ([`GpuContext::new_headless`],
//! paired with [`GpuContext::offscreen_target`]) or presents into a
//! window surface ([`GpuContext::new_with_surface`]). Tests and benches
//! use the first; the demo uses the second.

use thiserror::Error;
use wgpu::{
    Adapter, Device, DeviceDescriptor, Extent3d, Instance, InstanceDescriptor, PowerPreference,
    Queue, RequestAdapterOptions, Surface, SurfaceConfiguration, Texture, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsages,
};

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("Surface error: {0}")]
    Surface(String),
}

pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    pub adapter: Adapter,
    pub surface: Option<Surface<'static>>,
    pub surface_config: Option<SurfaceConfiguration>,
    /// Color format labels are rendered in.
    pub surface_format: TextureFormat,
}

/// Pick an adapter and open a device on it with default limits.
async fn open_device(
    instance: &Instance,
    surface: Option<&Surface<'_>>,
    power_preference: PowerPreference,
    label: &'static str,
) -> Result<(Adapter, Device, Queue), GpuError> {
    let adapter = instance
        .request_adapter(&RequestAdapterOptions {
            power_preference,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuError::NoAdapter)?;

    let descriptor = DeviceDescriptor {
        label: Some(label),
        ..Default::default()
    };
    let (device, queue) = adapter.request_device(&descriptor, None).await?;
    Ok((adapter, device, queue))
}

impl GpuContext {
    /// Off-screen context in `Rgba8UnormSrgb`.
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = Instance::new(&InstanceDescriptor::default());
        let (adapter, device, queue) = open_device(
            &instance,
            None,
            PowerPreference::LowPower,
            "glyphlabel-headless",
        )
        .await?;

        log::info!("GpuContext: headless on {}", adapter.get_info().name);

        Ok(Self {
            device,
            queue,
            adapter,
            surface: None,
            surface_config: None,
            surface_format: TextureFormat::Rgba8UnormSrgb,
        })
    }

    /// Context that presents into `window`, sized `width` x `height`.
    ///
    /// Prefers an sRGB surface format. `window` must outlive the context.
    pub async fn new_with_surface<W>(window: W, width: u32, height: u32) -> Result<Self, GpuError>
    where
        W: wgpu::WasmNotSendSync + Into<wgpu::SurfaceTarget<'static>>,
    {
        let instance = Instance::new(&InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .map_err(|e| GpuError::Surface(e.to_string()))?;

        let (adapter, device, queue) = open_device(
            &instance,
            Some(&surface),
            PowerPreference::default(),
            "glyphlabel-windowed",
        )
        .await?;

        let caps = surface.get_capabilities(&adapter);
        let srgb = caps.formats.iter().copied().find(TextureFormat::is_srgb);
        let format = srgb
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| GpuError::Surface("surface reports no formats".into()))?;

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        log::info!(
            "GpuContext: {}x{} {:?} surface on {}",
            config.width,
            config.height,
            format,
            adapter.get_info().name,
        );

        Ok(Self {
            device,
            queue,
            adapter,
            surface: Some(surface),
            surface_config: Some(config),
            surface_format: format,
        })
    }

    /// Reconfigure the surface for a new window size.
    ///
    /// Zero sizes and headless contexts are left alone.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (Some(surface), Some(config)) = (&self.surface, &mut self.surface_config) else {
            return;
        };
        if width == 0 || height == 0 {
            return;
        }
        config.width = width;
        config.height = height;
        surface.configure(&self.device, config);
    }

    /// Configured surface size; `(0, 0)` off-screen.
    pub fn surface_size(&self) -> (u32, u32) {
        match &self.surface_config {
            Some(config) => (config.width, config.height),
            None => (0, 0),
        }
    }

    /// Texture to render a headless frame into, in `surface_format`.
    pub fn offscreen_target(&self, width: u32, height: u32) -> Texture {
        self.device.create_texture(&TextureDescriptor {
            label: Some("glyphlabel_offscreen_target"),
            size: Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: self.surface_format,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }
}

// ===================================================================
// Tests
// ===================================================================
