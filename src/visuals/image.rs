//! Images drawn as a textured quad.
//!
//! The data is mapped to RGBA8 on the CPU: single-channel data goes through the
//! colormap, color data is scaled channel by channel, both using the color
//! limits. The quad spans `(0, 0)` to `(width, height)` in local units with the
//! first data row along `y = 0`.

use log::debug;

use crate::{
    color::{Color, Colormap},
    error::{Result, SceneError},
    gloo::{Gpu, Interpolation, Texture2D, TextureFormat},
    visuals::{MeshConfig, MeshVisual, Retired, Visual, VisualConfig, VisualType, flat_state},
};

/// Color limits mapped to the ends of the colormap.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Clim {
    /// Minimum and maximum of the finite color values.
    #[default]
    Auto,
    Range(f32, f32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageConfig {
    pub data: Vec<f32>,
    /// `[h, w]` or `[h, w, c]` with 1 to 4 channels.
    pub shape: Vec<usize>,
    pub cmap: Colormap,
    pub clim: Clim,
    pub interpolation: Interpolation,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self::new(vec![0.0], &[1, 1])
    }
}

impl ImageConfig {
    pub fn new(data: Vec<f32>, shape: &[usize]) -> Self {
        Self {
            data,
            shape: shape.to_vec(),
            cmap: Colormap::default(),
            clim: Clim::default(),
            interpolation: Interpolation::default(),
        }
    }

    /// Resolved color limits. Alpha channels do not take part.
    pub fn limits(&self) -> Result<(f32, f32)> {
        match self.clim {
            Clim::Range(lo, hi) if lo.is_finite() && hi.is_finite() => Ok((lo, hi)),
            Clim::Range(lo, hi) => Err(SceneError::invalid(
                "clim",
                format!("limits must be finite, got ({}, {})", lo, hi),
            )),
            Clim::Auto => {
                let channels = self.shape.get(2).copied().unwrap_or(1).max(1);
                let colors = match channels {
                    2 => 1,
                    4 => 3,
                    c => c,
                };
                let range = self
                    .data
                    .chunks_exact(channels)
                    .flat_map(|px| &px[..colors])
                    .filter(|v| v.is_finite())
                    .fold(None, |range: Option<(f32, f32)>, v| match range {
                        None => Some((*v, *v)),
                        Some((lo, hi)) => Some((lo.min(*v), hi.max(*v))),
                    });
                Ok(range.unwrap_or((0.0, 1.0)))
            }
        }
    }

    /// Validates the data and renders it into an RGBA texture.
    pub fn texture(&self) -> Result<Texture2D> {
        let source = Texture2D::new(self.data.clone(), &self.shape, None)?;
        let [height, width] = source.shape();
        if height == 0 || width == 0 {
            return Err(SceneError::invalid(
                "data",
                format!("image must not be empty, got shape {:?}", self.shape),
            ));
        }
        self.cmap.validate()?;
        let (lo, hi) = self.limits()?;
        let scale = |v: f32| if hi != lo { (v - lo) / (hi - lo) } else { 0.0 };
        let unit = |v: f32| scale(v).clamp(0.0, 1.0);
        let format = source.format();

        let rgba: Vec<f32> = self
            .data
            .chunks_exact(format.channels())
            .flat_map(|px| {
                let color = match format {
                    TextureFormat::Luminance => self.cmap.map(scale(px[0])),
                    TextureFormat::LuminanceAlpha => {
                        let c = self.cmap.map(scale(px[0]));
                        Color::rgba(c.r, c.g, c.b, c.a * px[1].clamp(0.0, 1.0))
                    }
                    TextureFormat::Rgb => Color::rgb(unit(px[0]), unit(px[1]), unit(px[2])),
                    TextureFormat::Rgba => {
                        Color::rgba(unit(px[0]), unit(px[1]), unit(px[2]), px[3].clamp(0.0, 1.0))
                    }
                };
                color.to_array()
            })
            .collect();
        debug!(
            "image {}x{} {} mapped with clim ({}, {})",
            width,
            height,
            format.name(),
            lo,
            hi
        );
        Ok(
            Texture2D::new(rgba, &[height, width, 4], Some(TextureFormat::Rgba))?
                .with_interpolation(self.interpolation),
        )
    }
}

fn quad(config: &ImageConfig) -> Result<MeshVisual> {
    let texture = config.texture()?;
    let [height, width] = texture.shape();
    let (w, h) = (width as f32, height as f32);
    let mesh = MeshConfig::new(
        vec![[0.0, 0.0, 0.0], [w, 0.0, 0.0], [w, h, 0.0], [0.0, h, 0.0]],
        vec![0, 1, 2, 0, 2, 3],
    )
    .with_color(Color::WHITE)
    .with_texcoords(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
    .with_texture(texture)
    .with_state(flat_state());
    MeshVisual::new(&mesh)
}

/// A 2D image of scalar or color data.
#[derive(Debug)]
pub struct ImageVisual {
    config: ImageConfig,
    mesh: MeshVisual,
    retired: Retired,
}

impl ImageVisual {
    pub fn new(config: &ImageConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            mesh: quad(config)?,
            retired: Retired::default(),
        })
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    pub fn mesh(&self) -> &MeshVisual {
        &self.mesh
    }

    /// `[height, width]` in pixels.
    pub fn shape(&self) -> [usize; 2] {
        [self.config.shape[0], self.config.shape[1]]
    }

    /// Applies `change` to a copy of the configuration and rebuilds the quad
    /// and its texture. On error nothing changes.
    pub fn update(&mut self, change: impl FnOnce(&mut ImageConfig)) -> Result<()> {
        let mut config = self.config.clone();
        change(&mut config);
        let mesh = quad(&config)?;
        self.retired.push(Some(std::mem::replace(&mut self.mesh, mesh)));
        self.config = config;
        Ok(())
    }

    pub fn set_data(&mut self, data: Vec<f32>, shape: &[usize]) -> Result<()> {
        self.update(|c| {
            c.data = data;
            c.shape = shape.to_vec();
        })
    }

    pub fn set_cmap(&mut self, cmap: Colormap) -> Result<()> {
        self.update(|c| c.cmap = cmap)
    }

    pub fn set_clim(&mut self, clim: Clim) -> Result<()> {
        self.update(|c| c.clim = clim)
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) -> Result<()> {
        self.update(|c| c.interpolation = interpolation)
    }
}

impl Visual for ImageVisual {
    fn type_name(&self) -> &'static str {
        Self::NAME
    }

    fn draw(&mut self, gpu: &mut dyn Gpu, transform: &cgmath::Matrix4<f32>) -> Result<()> {
        self.retired.release(gpu);
        self.mesh.draw(gpu, transform)
    }

    fn release(&mut self, gpu: &mut dyn Gpu) {
        self.retired.release(gpu);
        self.mesh.release(gpu);
    }
}

impl VisualType for ImageVisual {
    const NAME: &'static str = "ImageVisual";
    const DESCRIPTION: &'static str = "Image visual

Displays a 2D image of scalar or color data.

Parameters
----------
data : array
    Image data, row by row.
shape : array
    (height, width) for scalar data or (height, width, channels) with 1 to 4
    channels.
cmap : Colormap
    Colormap for single-channel data. Color data ignores it.
clim : str | tuple
    'auto' for the data range, or (min, max) mapped to the colormap ends.
interpolation : str
    Either 'nearest' (default) or 'linear'.
";

    type Config = ImageConfig;

    fn build(config: &ImageConfig) -> Result<Self> {
        Self::new(config)
    }

    fn config_of(config: &VisualConfig) -> Option<&ImageConfig> {
        match config {
            VisualConfig::Image(c) => Some(c),
            _ => None,
        }
    }
}
