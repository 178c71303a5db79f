//! Filled, optionally bordered 2D shapes.
//!
//! Every shape reduces to a [`PolygonGeometry`] fan; [`PolygonVisual`] turns
//! the fan into a triangle mesh for the fill and a line mesh for the border.
//!
//! Shapes keep their configuration. Setters validate a modified copy and
//! rebuild the meshes from it, leaving the shape untouched on error. The
//! replaced meshes free their GPU resources on the next draw.

use log::debug;

use crate::{
    color::Color,
    error::{Result, SceneError},
    geometry::{
        PolygonGeometry, ellipse_points, polygon_fan, regular_polygon_points, rounded_rect_points,
    },
    gloo::{Gpu, Topology},
    visuals::{
        MeshConfig, MeshVisual, Retired, Visual, VisualConfig, VisualType, draw_with_outline,
        flat_state,
    },
};

/// Arc resolution of a rounded rectangle corner.
const CORNER_SEGMENTS: u32 = 16;

/// Positive and finite. NaN fails.
fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn check_center(center: &[f32; 3]) -> Result<()> {
    if center.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(SceneError::invalid(
            "center",
            format!("center must be finite, got {:?}", center),
        ))
    }
}

/// Fill and border meshes of a 2D shape. Either may be absent.
#[derive(Debug)]
pub struct PolygonVisual {
    fill: Option<MeshVisual>,
    border: Option<MeshVisual>,
    retired: Retired,
}

impl PolygonVisual {
    pub fn from_geometry(
        geometry: &PolygonGeometry,
        color: Option<Color>,
        border_color: Option<Color>,
    ) -> Result<Self> {
        let fill = match color {
            Some(color) if !geometry.filled.is_empty() => {
                let config = MeshConfig::new(
                    geometry.vertices.clone(),
                    geometry.filled.iter().flatten().copied().collect(),
                )
                .with_color(color)
                .with_state(flat_state());
                Some(MeshVisual::new(&config)?)
            }
            _ => None,
        };
        let border = match border_color {
            Some(color) if !geometry.outline.is_empty() => {
                let config = MeshConfig::new(
                    geometry.vertices.clone(),
                    geometry.outline.iter().flatten().copied().collect(),
                )
                .with_topology(Topology::Lines)
                .with_color(color)
                .with_state(flat_state());
                Some(MeshVisual::new(&config)?)
            }
            _ => None,
        };
        Ok(Self {
            fill,
            border,
            retired: Retired::default(),
        })
    }

    /// Replaces both meshes. The old ones are released on the next draw.
    pub fn rebuild(
        &mut self,
        geometry: &PolygonGeometry,
        color: Option<Color>,
        border_color: Option<Color>,
    ) -> Result<()> {
        let next = Self::from_geometry(geometry, color, border_color)?;
        self.retired.push(std::mem::replace(&mut self.fill, next.fill));
        self.retired.push(std::mem::replace(&mut self.border, next.border));
        Ok(())
    }

    pub fn fill(&self) -> Option<&MeshVisual> {
        self.fill.as_ref()
    }

    pub fn border(&self) -> Option<&MeshVisual> {
        self.border.as_ref()
    }

    fn draw(&mut self, gpu: &mut dyn Gpu, transform: &cgmath::Matrix4<f32>) -> Result<()> {
        self.retired.release(gpu);
        draw_with_outline(gpu, transform, self.fill.as_mut(), self.border.as_mut())
    }

    fn release(&mut self, gpu: &mut dyn Gpu) {
        self.retired.release(gpu);
        for mesh in [self.fill.as_mut(), self.border.as_mut()].into_iter().flatten() {
            mesh.release(gpu);
        }
    }
}

/// Shared constructor, accessors, setters and [`Visual`] impl of a shape
/// holding `config` and `polygon` fields.
macro_rules! polygon_shape {
    ($shape:ident, $config:ty) => {
        impl $shape {
            pub fn new(config: &$config) -> Result<Self> {
                let geometry = config.geometry()?;
                let polygon =
                    PolygonVisual::from_geometry(&geometry, config.color, config.border_color)?;
                Ok(Self {
                    config: config.clone(),
                    polygon,
                })
            }

            pub fn config(&self) -> &$config {
                &self.config
            }

            pub fn polygon(&self) -> &PolygonVisual {
                &self.polygon
            }

            /// Applies `change` to a copy of the configuration and rebuilds the
            /// meshes from it. On error nothing changes.
            pub fn update(&mut self, change: impl FnOnce(&mut $config)) -> Result<()> {
                let mut config = self.config.clone();
                change(&mut config);
                let geometry = config.geometry()?;
                self.polygon
                    .rebuild(&geometry, config.color, config.border_color)?;
                self.config = config;
                Ok(())
            }

            pub fn set_center(&mut self, center: [f32; 3]) -> Result<()> {
                self.update(|c| c.center = center)
            }

            pub fn set_color(&mut self, color: Option<Color>) -> Result<()> {
                self.update(|c| c.color = color)
            }

            pub fn set_border_color(&mut self, border_color: Option<Color>) -> Result<()> {
                self.update(|c| c.border_color = border_color)
            }
        }

        impl Visual for $shape {
            fn type_name(&self) -> &'static str {
                <Self as VisualType>::NAME
            }

            fn draw(&mut self, gpu: &mut dyn Gpu, transform: &cgmath::Matrix4<f32>) -> Result<()> {
                self.polygon.draw(gpu, transform)
            }

            fn release(&mut self, gpu: &mut dyn Gpu) {
                self.polygon.release(gpu)
            }
        }
    };
}

/// Corner radius of a rectangle.
#[derive(Clone, Debug, PartialEq)]
pub enum Radius {
    Uniform(f32),
    /// Top-left, top-right, bottom-right, bottom-left. Must hold four values.
    Corners(Vec<f32>),
}

impl Default for Radius {
    fn default() -> Self {
        Radius::Uniform(0.0)
    }
}

impl From<f32> for Radius {
    fn from(r: f32) -> Self {
        Radius::Uniform(r)
    }
}

impl From<[f32; 4]> for Radius {
    fn from(r: [f32; 4]) -> Self {
        Radius::Corners(r.to_vec())
    }
}

impl From<Vec<f32>> for Radius {
    fn from(r: Vec<f32>) -> Self {
        Radius::Corners(r)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RectangleConfig {
    pub center: [f32; 3],
    pub width: f32,
    pub height: f32,
    pub radius: Radius,
    /// `None` draws the border only.
    pub color: Option<Color>,
    pub border_color: Option<Color>,
}

impl Default for RectangleConfig {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            width: 1.0,
            height: 1.0,
            radius: Radius::default(),
            color: Some(Color::BLACK),
            border_color: None,
        }
    }
}

impl RectangleConfig {
    /// Checks the parameters and returns the four corner radii.
    fn corner_radii(&self) -> Result<[f32; 4]> {
        check_center(&self.center)?;
        if !positive(self.width) {
            return Err(SceneError::invalid(
                "width",
                format!("width must be positive, got {}", self.width),
            ));
        }
        if !positive(self.height) {
            return Err(SceneError::invalid(
                "height",
                format!("height must be positive, got {}", self.height),
            ));
        }
        let radii = match &self.radius {
            Radius::Uniform(r) => [*r; 4],
            Radius::Corners(list) => <[f32; 4]>::try_from(list.as_slice()).map_err(|_| {
                SceneError::invalid(
                    "radius",
                    format!("expected 4 corner radii, got {}", list.len()),
                )
            })?,
        };
        let limit = self.width.min(self.height) / 2.0;
        if let Some(r) = radii.iter().find(|r| !(0.0..=limit).contains(*r)) {
            return Err(SceneError::invalid(
                "radius",
                format!("corner radius {} outside 0..={}", r, limit),
            ));
        }
        Ok(radii)
    }

    pub fn geometry(&self) -> Result<PolygonGeometry> {
        let radii = self.corner_radii()?;
        let ring = rounded_rect_points(self.center, self.width, self.height, radii, CORNER_SEGMENTS);
        debug!("rectangle {}x{} with {} points", self.width, self.height, ring.len());
        Ok(polygon_fan(self.center, &ring, true))
    }
}

#[derive(Debug)]
pub struct RectangleVisual {
    config: RectangleConfig,
    polygon: PolygonVisual,
}

polygon_shape!(RectangleVisual, RectangleConfig);

impl RectangleVisual {
    pub fn set_width(&mut self, width: f32) -> Result<()> {
        self.update(|c| c.width = width)
    }

    pub fn set_height(&mut self, height: f32) -> Result<()> {
        self.update(|c| c.height = height)
    }

    pub fn set_radius(&mut self, radius: impl Into<Radius>) -> Result<()> {
        let radius = radius.into();
        self.update(|c| c.radius = radius)
    }
}

impl VisualType for RectangleVisual {
    const NAME: &'static str = "RectangleVisual";
    const DESCRIPTION: &'static str = "Rectangle with optionally rounded corners.

Parameters
----------
center : array
    Center of the rectangle.
width : float
    Width of the rectangle, must be positive.
height : float
    Height of the rectangle, must be positive.
radius : float | array
    One radius for all corners, or four radii (top-left, top-right,
    bottom-right, bottom-left). No radius may exceed half of the shorter
    side.
color : Color | None
    Fill color. Only the border is drawn when None.
border_color : Color | None
    Border color. No border is drawn when None.
";

    type Config = RectangleConfig;

    fn build(config: &RectangleConfig) -> Result<Self> {
        Self::new(config)
    }

    fn config_of(config: &VisualConfig) -> Option<&RectangleConfig> {
        match config {
            VisualConfig::Rectangle(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EllipseConfig {
    pub center: [f32; 3],
    pub radius: [f32; 2],
    /// Degrees, counter-clockwise from the +x axis.
    pub start_angle: f32,
    /// Degrees. Anything short of 360 draws a pie slice.
    pub span_angle: f32,
    pub num_segments: u32,
    pub color: Option<Color>,
    pub border_color: Option<Color>,
}

impl Default for EllipseConfig {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            radius: [0.1, 0.1],
            start_angle: 0.0,
            span_angle: 360.0,
            num_segments: 100,
            color: Some(Color::BLACK),
            border_color: None,
        }
    }
}

impl EllipseConfig {
    pub fn geometry(&self) -> Result<PolygonGeometry> {
        check_center(&self.center)?;
        if !self.radius.iter().all(|r| positive(*r)) {
            return Err(SceneError::invalid(
                "radius",
                format!("radii must be positive, got {:?}", self.radius),
            ));
        }
        if self.num_segments < 3 {
            return Err(SceneError::invalid(
                "num_segments",
                format!("at least 3 segments required, got {}", self.num_segments),
            ));
        }
        if !self.start_angle.is_finite() {
            return Err(SceneError::invalid(
                "start_angle",
                format!("start angle must be finite, got {}", self.start_angle),
            ));
        }
        if !self.span_angle.is_finite() || self.span_angle == 0.0 {
            return Err(SceneError::invalid(
                "span_angle",
                format!("span must be finite and non-zero, got {}", self.span_angle),
            ));
        }
        let ring = ellipse_points(
            self.center,
            self.radius,
            self.start_angle,
            self.span_angle,
            self.num_segments,
        );
        let closed = self.span_angle.abs() >= 360.0;
        Ok(polygon_fan(self.center, &ring, closed))
    }
}

#[derive(Debug)]
pub struct EllipseVisual {
    config: EllipseConfig,
    polygon: PolygonVisual,
}

polygon_shape!(EllipseVisual, EllipseConfig);

impl EllipseVisual {
    pub fn set_radius(&mut self, radius: [f32; 2]) -> Result<()> {
        self.update(|c| c.radius = radius)
    }

    pub fn set_start_angle(&mut self, start_angle: f32) -> Result<()> {
        self.update(|c| c.start_angle = start_angle)
    }

    pub fn set_span_angle(&mut self, span_angle: f32) -> Result<()> {
        self.update(|c| c.span_angle = span_angle)
    }

    pub fn set_num_segments(&mut self, num_segments: u32) -> Result<()> {
        self.update(|c| c.num_segments = num_segments)
    }
}

impl VisualType for EllipseVisual {
    const NAME: &'static str = "EllipseVisual";
    const DESCRIPTION: &'static str = "Ellipse, circle or elliptic pie slice.

Parameters
----------
center : array
    Center of the ellipse.
radius : array
    Radii along x and y, both positive.
start_angle : float
    Start of the arc in degrees, counter-clockwise from +x.
span_angle : float
    Extent of the arc in degrees. 360 draws the full ellipse.
num_segments : int
    Number of segments along the arc, at least 3.
color : Color | None
    Fill color. Only the border is drawn when None.
border_color : Color | None
    Border color. No border is drawn when None.
";

    type Config = EllipseConfig;

    fn build(config: &EllipseConfig) -> Result<Self> {
        Self::new(config)
    }

    fn config_of(config: &VisualConfig) -> Option<&EllipseConfig> {
        match config {
            VisualConfig::Ellipse(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegularPolygonConfig {
    pub center: [f32; 3],
    pub radius: f32,
    pub sides: u32,
    pub color: Option<Color>,
    pub border_color: Option<Color>,
}

impl Default for RegularPolygonConfig {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            radius: 0.1,
            sides: 4,
            color: Some(Color::BLACK),
            border_color: None,
        }
    }
}

impl RegularPolygonConfig {
    pub fn geometry(&self) -> Result<PolygonGeometry> {
        check_center(&self.center)?;
        if self.sides < 3 {
            return Err(SceneError::invalid(
                "sides",
                format!("a polygon needs at least 3 sides, got {}", self.sides),
            ));
        }
        if !positive(self.radius) {
            return Err(SceneError::invalid(
                "radius",
                format!("radius must be positive, got {}", self.radius),
            ));
        }
        let ring = regular_polygon_points(self.center, self.radius, self.sides);
        Ok(polygon_fan(self.center, &ring, true))
    }
}

#[derive(Debug)]
pub struct RegularPolygonVisual {
    config: RegularPolygonConfig,
    polygon: PolygonVisual,
}

polygon_shape!(RegularPolygonVisual, RegularPolygonConfig);

impl RegularPolygonVisual {
    pub fn set_radius(&mut self, radius: f32) -> Result<()> {
        self.update(|c| c.radius = radius)
    }

    pub fn set_sides(&mut self, sides: u32) -> Result<()> {
        self.update(|c| c.sides = sides)
    }
}

impl VisualType for RegularPolygonVisual {
    const NAME: &'static str = "RegularPolygonVisual";
    const DESCRIPTION: &'static str = "Regular polygon with its first vertex pointing up.

Parameters
----------
center : array
    Center of the polygon.
radius : float
    Radius of the circumscribed circle.
sides : int
    Number of sides, at least 3.
color : Color | None
    Fill color. Only the border is drawn when None.
border_color : Color | None
    Border color. No border is drawn when None.
";

    type Config = RegularPolygonConfig;

    fn build(config: &RegularPolygonConfig) -> Result<Self> {
        Self::new(config)
    }

    fn config_of(config: &VisualConfig) -> Option<&RegularPolygonConfig> {
        match config {
            VisualConfig::RegularPolygon(c) => Some(c),
            _ => None,
        }
    }
}
