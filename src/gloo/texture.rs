//! CPU-side texture descriptions with shape/format validation.
//!
//! A texture is validated when it is built, so a mismatch between the
//! declared pixel format and the data shape is reported before anything
//! reaches the GPU. [`Texture2D::create_gpu_texture`] uploads the validated
//! data through a [`Context`].

use image::GenericImageView;

use crate::{
    color::Color,
    context::Context,
    error::{Result, SceneError},
};

/// Sampling filter used when a texture is magnified or minified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    #[default]
    Nearest,
    Linear,
}

impl Interpolation {
    pub(crate) fn filter_mode(self) -> wgpu::FilterMode {
        match self {
            Interpolation::Nearest => wgpu::FilterMode::Nearest,
            Interpolation::Linear => wgpu::FilterMode::Linear,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Luminance,
    LuminanceAlpha,
    Rgb,
    Rgba,
}

impl TextureFormat {
    pub fn channels(self) -> usize {
        match self {
            TextureFormat::Luminance => 1,
            TextureFormat::LuminanceAlpha => 2,
            TextureFormat::Rgb => 3,
            TextureFormat::Rgba => 4,
        }
    }

    pub fn from_channels(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(TextureFormat::Luminance),
            2 => Some(TextureFormat::LuminanceAlpha),
            3 => Some(TextureFormat::Rgb),
            4 => Some(TextureFormat::Rgba),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextureFormat::Luminance => "luminance",
            TextureFormat::LuminanceAlpha => "luminance_alpha",
            TextureFormat::Rgb => "rgb",
            TextureFormat::Rgba => "rgba",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TexelData {
    U8(Vec<u8>),
    F32(Vec<f32>),
}

impl TexelData {
    pub fn len(&self) -> usize {
        match self {
            TexelData::U8(d) => d.len(),
            TexelData::F32(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn to_unorm_bytes(&self) -> Vec<u8> {
        match self {
            TexelData::U8(d) => d.clone(),
            TexelData::F32(d) => d
                .iter()
                .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
                .collect(),
        }
    }
}

impl From<Vec<u8>> for TexelData {
    fn from(d: Vec<u8>) -> Self {
        TexelData::U8(d)
    }
}

impl From<Vec<f32>> for TexelData {
    fn from(d: Vec<f32>) -> Self {
        TexelData::F32(d)
    }
}

/// Resolves the channel axis of a `rank`-dimensional image shape.
fn channels_of(shape: &[usize], rank: usize, kind: &str) -> Result<usize> {
    if shape.len() == rank {
        Ok(1)
    } else if shape.len() == rank + 1 {
        let c = shape[rank];
        if (1..=4).contains(&c) {
            Ok(c)
        } else {
            Err(SceneError::Format(format!(
                "{} data must have 1 to 4 channels, got {}",
                kind, c
            )))
        }
    } else {
        Err(SceneError::Format(format!(
            "{} shape must have {} or {} dimensions, got {:?}",
            kind,
            rank,
            rank + 1,
            shape
        )))
    }
}

fn check_format(channels: usize, format: Option<TextureFormat>) -> Result<TextureFormat> {
    match format {
        Some(f) if f.channels() != channels => Err(SceneError::Format(format!(
            "format {} expects {} channels but data has {}",
            f.name(),
            f.channels(),
            channels
        ))),
        Some(f) => Ok(f),
        None => TextureFormat::from_channels(channels)
            .ok_or_else(|| SceneError::Format(format!("no format with {} channels", channels))),
    }
}

fn check_len(data: &TexelData, shape: &[usize]) -> Result<()> {
    let expected: usize = shape.iter().product();
    if data.len() != expected {
        return Err(SceneError::ShapeMismatch {
            what: "texture data",
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq)]
pub struct Texture2D {
    shape: [usize; 2],
    format: TextureFormat,
    data: Option<TexelData>,
    interpolation: Interpolation,
}

impl Texture2D {
    /// `shape` is `[h, w]` or `[h, w, c]`.
    pub fn new(
        data: impl Into<TexelData>,
        shape: &[usize],
        format: Option<TextureFormat>,
    ) -> Result<Self> {
        let data = data.into();
        let channels = channels_of(shape, 2, "2D texture")?;
        let format = check_format(channels, format)?;
        check_len(&data, shape)?;
        Ok(Self {
            shape: [shape[0], shape[1]],
            format,
            data: Some(data),
            interpolation: Interpolation::default(),
        })
    }

    /// Allocates a texture without contents.
    pub fn empty(shape: &[usize], format: Option<TextureFormat>) -> Result<Self> {
        let channels = channels_of(shape, 2, "2D texture")?;
        let format = check_format(channels, format)?;
        Ok(Self {
            shape: [shape[0], shape[1]],
            format,
            data: None,
            interpolation: Interpolation::default(),
        })
    }

    /// An RGBA8 texture of `[height, width]` pixels all set to `color`.
    pub fn filled(shape: [usize; 2], color: Color) -> Self {
        let texel = color
            .to_array()
            .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8);
        Self {
            shape,
            format: TextureFormat::Rgba,
            data: Some(TexelData::U8(texel.repeat(shape[0] * shape[1]))),
            interpolation: Interpolation::default(),
        }
    }

    pub fn from_image(img: &image::DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            shape: [height as usize, width as usize],
            format: TextureFormat::Rgba,
            data: Some(TexelData::U8(img.to_rgba8().into_raw())),
            interpolation: Interpolation::default(),
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Replaces the contents; the new data must have the texture's shape.
    pub fn set_data(&mut self, data: impl Into<TexelData>) -> Result<()> {
        let data = data.into();
        let shape = [self.shape[0], self.shape[1], self.format.channels()];
        check_len(&data, &shape)?;
        self.data = Some(data);
        Ok(())
    }

    /// `[height, width]`.
    pub fn shape(&self) -> [usize; 2] {
        self.shape
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn data(&self) -> Option<&TexelData> {
        self.data.as_ref()
    }

    /// Contents expanded to tightly packed RGBA8, zeroes when empty.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let pixels = self.shape[0] * self.shape[1];
        let Some(data) = &self.data else {
            return vec![0; pixels * 4];
        };
        let bytes = data.to_unorm_bytes();
        let c = self.format.channels();
        bytes
            .chunks_exact(c)
            .flat_map(|px| match self.format {
                TextureFormat::Luminance => [px[0], px[0], px[0], 255],
                TextureFormat::LuminanceAlpha => [px[0], px[0], px[0], px[1]],
                TextureFormat::Rgb => [px[0], px[1], px[2], 255],
                TextureFormat::Rgba => [px[0], px[1], px[2], px[3]],
            })
            .collect()
    }

    /// Allocates an RGBA8 texture of this shape and uploads the contents, if
    /// any. Zero extents are clamped to one texel.
    pub fn create_gpu_texture(
        &self,
        ctx: &Context,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
        label: Option<&str>,
    ) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width: self.shape[1].max(1) as u32,
            height: self.shape[0].max(1) as u32,
            depth_or_array_layers: 1,
        };
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: usage | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if self.data.is_some() && self.shape[0] * self.shape[1] > 0 {
            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                },
                &self.to_rgba8(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * size.width),
                    rows_per_image: Some(size.height),
                },
                size,
            );
        }
        texture
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Texture3D {
    shape: [usize; 3],
    format: TextureFormat,
    data: TexelData,
}

impl Texture3D {
    /// `shape` is `[d, h, w]` or `[d, h, w, c]`.
    pub fn new(data: impl Into<TexelData>, shape: &[usize]) -> Result<Self> {
        let data = data.into();
        let channels = channels_of(shape, 3, "3D texture")?;
        let format = check_format(channels, None)?;
        check_len(&data, shape)?;
        Ok(Self {
            shape: [shape[0], shape[1], shape[2]],
            format,
            data,
        })
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn data(&self) -> &TexelData {
        &self.data
    }
}
