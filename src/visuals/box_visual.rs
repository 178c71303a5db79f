use log::debug;

use crate::{
    color::Color,
    error::Result,
    geometry::{Plane, create_box, positions},
    gloo::{GlState, Gpu, Topology},
    visuals::{
        MeshConfig, MeshVisual, Visual, VisualConfig, VisualType, draw_with_outline,
        mesh::DEFAULT_MESH_COLOR,
    },
};

#[derive(Clone, Debug)]
pub struct BoxConfig {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub depth_segments: u32,
    /// Faces to generate. `None` generates all six.
    pub planes: Option<Vec<Plane>>,
    pub vertex_colors: Option<Vec<Color>>,
    pub face_colors: Option<Vec<Color>>,
    pub color: Color,
    /// Draws the face grid as lines when set.
    pub edge_color: Option<Color>,
}

impl Default for BoxConfig {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
            width_segments: 1,
            height_segments: 1,
            depth_segments: 1,
            planes: None,
            vertex_colors: None,
            face_colors: None,
            color: DEFAULT_MESH_COLOR,
            edge_color: None,
        }
    }
}

/// A box made of a filled mesh and, with an edge color, an outline mesh.
#[derive(Debug)]
pub struct BoxVisual {
    mesh: MeshVisual,
    border: Option<MeshVisual>,
}

impl BoxVisual {
    pub fn new(config: &BoxConfig) -> Result<Self> {
        let geometry = create_box(
            config.width,
            config.height,
            config.depth,
            config.width_segments,
            config.height_segments,
            config.depth_segments,
            config.planes.as_deref(),
        )?;
        let points = positions(&geometry.vertices);

        let mut mesh_config = MeshConfig::new(
            points.clone(),
            geometry.filled.iter().flatten().copied().collect(),
        )
        .with_color(config.color);
        mesh_config.vertex_colors = config.vertex_colors.clone();
        mesh_config.face_colors = config.face_colors.clone();
        let mesh = MeshVisual::new(&mesh_config)?;

        let border = match config.edge_color {
            Some(edge_color) => {
                let outline = MeshConfig::new(
                    points,
                    geometry.outline.iter().flatten().copied().collect(),
                )
                .with_topology(Topology::Lines)
                .with_color(edge_color)
                .with_state(GlState {
                    blend: Some(true),
                    depth_test: Some(true),
                    ..Default::default()
                });
                Some(MeshVisual::new(&outline)?)
            }
            None => None,
        };

        debug!(
            "box {}x{}x{}, outline: {}",
            config.width,
            config.height,
            config.depth,
            border.is_some()
        );
        Ok(Self { mesh, border })
    }

    pub fn mesh(&self) -> &MeshVisual {
        &self.mesh
    }

    pub fn border(&self) -> Option<&MeshVisual> {
        self.border.as_ref()
    }

    /// Number of meshes drawn per frame: 1, or 2 with an outline.
    pub fn mesh_count(&self) -> usize {
        1 + self.border.is_some() as usize
    }
}

impl Visual for BoxVisual {
    fn type_name(&self) -> &'static str {
        Self::NAME
    }

    fn draw(&mut self, gpu: &mut dyn Gpu, transform: &cgmath::Matrix4<f32>) -> Result<()> {
        draw_with_outline(gpu, transform, Some(&mut self.mesh), self.border.as_mut())
    }

    fn release(&mut self, gpu: &mut dyn Gpu) {
        self.mesh.release(gpu);
        if let Some(border) = self.border.as_mut() {
            border.release(gpu);
        }
    }
}

impl VisualType for BoxVisual {
    const NAME: &'static str = "BoxVisual";
    const DESCRIPTION: &'static str = "Axis-aligned box centered on the origin.

Parameters
----------
width : float
    Extent along the x axis.
height : float
    Extent along the y axis.
depth : float
    Extent along the z axis.
width_segments : int
    Grid subdivisions along x.
height_segments : int
    Grid subdivisions along y.
depth_segments : int
    Grid subdivisions along z.
planes : list | None
    Faces to generate, any of -x +x -y +y -z +z. All six when None.
vertex_colors : array | None
    One color per generated vertex, faces in -x +x -y +y -z +z order.
face_colors : array | None
    One color per generated triangle.
color : Color
    Face color used when neither vertex nor face colors are given.
edge_color : Color | None
    Color of the face grid lines. No lines are drawn when None.
";

    type Config = BoxConfig;

    fn build(config: &BoxConfig) -> Result<Self> {
        Self::new(config)
    }

    fn config_of(config: &VisualConfig) -> Option<&BoxConfig> {
        match config {
            VisualConfig::Box(c) => Some(c),
            _ => None,
        }
    }
}
