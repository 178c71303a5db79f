//! Drawable visuals.
//!
//! A visual owns its geometry and the GPU resources needed to draw it, and
//! knows nothing about scene trees. Placing one in a tree is the job of
//! [`crate::scene::SceneVisual`].
//!
//! - `mesh` holds [`MeshVisual`], the building block all other visuals use
//! - `box_visual` holds [`BoxVisual`], faces plus optional edges
//! - `polygon` holds the filled/bordered 2D shape core and its shapes
//!   ([`RectangleVisual`], [`EllipseVisual`], [`RegularPolygonVisual`])
//! - `image` holds [`ImageVisual`], a textured quad showing scalar or color data

pub mod box_visual;
pub mod image;
pub mod mesh;
pub mod polygon;

pub use box_visual::{BoxConfig, BoxVisual};
pub use image::{Clim, ImageConfig, ImageVisual};
pub use mesh::{MeshConfig, MeshVisual};
pub use polygon::{
    EllipseConfig, EllipseVisual, PolygonVisual, Radius, RectangleConfig, RectangleVisual,
    RegularPolygonConfig, RegularPolygonVisual,
};

use crate::{
    error::Result,
    gloo::{GlState, Gpu},
};

/// The drawing capability.
pub trait Visual {
    /// Name of the concrete visual type, e.g. `"BoxVisual"`.
    fn type_name(&self) -> &'static str;

    /// Draws with `transform` as the full model-view-projection matrix.
    fn draw(&mut self, gpu: &mut dyn Gpu, transform: &cgmath::Matrix4<f32>) -> Result<()>;

    /// Frees GPU resources. They are recreated on the next draw.
    fn release(&mut self, _gpu: &mut dyn Gpu) {}
}

impl<V: Visual + ?Sized> Visual for Box<V> {
    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }

    fn draw(&mut self, gpu: &mut dyn Gpu, transform: &cgmath::Matrix4<f32>) -> Result<()> {
        (**self).draw(gpu, transform)
    }

    fn release(&mut self, gpu: &mut dyn Gpu) {
        (**self).release(gpu)
    }
}

/// A concrete visual constructible from a configuration value.
///
/// `NAME` and `DESCRIPTION` feed the fused scene types: the name minus its
/// `Visual` suffix becomes the registry key, the description is merged into
/// the fused type's documentation.
pub trait VisualType: Visual + Sized + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    type Config;

    fn build(config: &Self::Config) -> Result<Self>;

    /// Borrows this type's configuration out of the dynamic [`VisualConfig`].
    fn config_of(config: &VisualConfig) -> Option<&Self::Config>;
}

/// Configuration of any registered visual, used by the dynamic registry.
#[derive(Clone, Debug)]
pub enum VisualConfig {
    Mesh(MeshConfig),
    Box(BoxConfig),
    Rectangle(RectangleConfig),
    Ellipse(EllipseConfig),
    RegularPolygon(RegularPolygonConfig),
    Image(ImageConfig),
}

impl VisualConfig {
    pub fn kind_name(&self) -> &'static str {
        match self {
            VisualConfig::Mesh(_) => MeshVisual::NAME,
            VisualConfig::Box(_) => BoxVisual::NAME,
            VisualConfig::Rectangle(_) => RectangleVisual::NAME,
            VisualConfig::Ellipse(_) => EllipseVisual::NAME,
            VisualConfig::RegularPolygon(_) => RegularPolygonVisual::NAME,
            VisualConfig::Image(_) => ImageVisual::NAME,
        }
    }
}

impl From<MeshConfig> for VisualConfig {
    fn from(c: MeshConfig) -> Self {
        VisualConfig::Mesh(c)
    }
}

impl From<BoxConfig> for VisualConfig {
    fn from(c: BoxConfig) -> Self {
        VisualConfig::Box(c)
    }
}

impl From<RectangleConfig> for VisualConfig {
    fn from(c: RectangleConfig) -> Self {
        VisualConfig::Rectangle(c)
    }
}

impl From<EllipseConfig> for VisualConfig {
    fn from(c: EllipseConfig) -> Self {
        VisualConfig::Ellipse(c)
    }
}

impl From<RegularPolygonConfig> for VisualConfig {
    fn from(c: RegularPolygonConfig) -> Self {
        VisualConfig::RegularPolygon(c)
    }
}

impl From<ImageConfig> for VisualConfig {
    fn from(c: ImageConfig) -> Self {
        VisualConfig::Image(c)
    }
}

/// State of flat 2D visuals: blended, no depth test.
pub(crate) fn flat_state() -> GlState {
    GlState {
        blend: Some(true),
        depth_test: Some(false),
        cull_face: Some(false),
        ..Default::default()
    }
}

/// Meshes replaced by a rebuild, released on the next draw or release.
#[derive(Debug, Default)]
pub(crate) struct Retired(Vec<MeshVisual>);

impl Retired {
    pub(crate) fn push(&mut self, mesh: Option<MeshVisual>) {
        self.0.extend(mesh);
    }

    pub(crate) fn release(&mut self, gpu: &mut dyn Gpu) {
        for mut mesh in self.0.drain(..) {
            mesh.release(gpu);
        }
    }
}

/// Draws `fill`, then `outline` with a polygon offset pushing the faces behind
/// their edges. The offset in effect before the outline is restored whether
/// the outline draw succeeded or not.
pub(crate) fn draw_with_outline(
    gpu: &mut dyn Gpu,
    transform: &cgmath::Matrix4<f32>,
    fill: Option<&mut MeshVisual>,
    outline: Option<&mut MeshVisual>,
) -> Result<()> {
    if let Some(fill) = fill {
        fill.draw(gpu, transform)?;
    }
    if let Some(outline) = outline {
        let previous = gpu.current_state();
        gpu.set_state(&GlState::polygon_offset(1.0, 1.0));
        let result = outline.draw(gpu, transform);
        gpu.set_state(&GlState {
            polygon_offset: previous.polygon_offset,
            polygon_offset_fill: previous.polygon_offset_fill,
            ..Default::default()
        });
        result?;
    }
    Ok(())
}
