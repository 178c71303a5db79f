//! Headless GPU context: device, queue and the offscreen targets scenes are
//! rendered into.

use crate::color::Color;

/// Settings for [`Context::new`].
#[derive(Clone, Debug)]
pub struct GpuConfig {
    pub width: u32,
    pub height: u32,
    pub clear_colour: Color,
    /// Color target format. Read-back assumes 4 bytes per pixel.
    pub format: wgpu::TextureFormat,
    pub power_preference: wgpu::PowerPreference,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            clear_colour: Color::BLACK,
            format: wgpu::TextureFormat::Rgba8Unorm,
            power_preference: wgpu::PowerPreference::default(),
        }
    }
}

#[derive(Debug)]
pub struct DepthTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl DepthTexture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

#[derive(Debug)]
pub struct Context {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: GpuConfig,
    pub(crate) target: wgpu::Texture,
    pub(crate) target_view: wgpu::TextureView,
    pub(crate) depth_texture: DepthTexture,
}

impl Context {
    pub async fn new(config: GpuConfig) -> anyhow::Result<Self> {
        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow::anyhow!("no suitable GPU adapter: {}", e))?;

        log::debug!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("scene-ngin device"),
                ..Default::default()
            })
            .await?;

        let (target, target_view) = create_target(&device, &config);
        let depth_texture = DepthTexture::new(&device, [config.width, config.height], "depth_texture");

        Ok(Self {
            device,
            queue,
            config,
            target,
            target_view,
            depth_texture,
        })
    }

    /// [`Context::new`] for callers without an async executor.
    pub fn new_blocking(config: GpuConfig) -> anyhow::Result<Self> {
        futures::executor::block_on(Self::new(config))
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width.max(1), self.config.height.max(1))
    }

    /// Recreates the offscreen targets. Their previous contents are lost.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        let (target, target_view) = create_target(&self.device, &self.config);
        self.target = target;
        self.target_view = target_view;
        self.depth_texture = DepthTexture::new(&self.device, [width, height], "depth_texture");
    }
}

fn create_target(device: &wgpu::Device, config: &GpuConfig) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("render target"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
