use log::{debug, trace, warn};

use crate::{
    color::Color,
    error::{Result, SceneError},
    gloo::{
        BufferData, BufferId, BufferKind, GlState, Gpu, MeshVertex, ProgramId, Texture2D,
        TextureId, Topology,
    },
    pipelines::mesh::{MESH_FRAGMENT_SHADER, MESH_VERTEX_SHADER},
    visuals::{Visual, VisualConfig, VisualType},
};

/// Fallback color of meshes without vertex or face colors.
pub const DEFAULT_MESH_COLOR: Color = Color::rgba(0.5, 0.5, 1.0, 1.0);

#[derive(Clone, Debug)]
pub struct MeshConfig {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub topology: Topology,
    pub vertex_colors: Option<Vec<Color>>,
    /// One color per triangle. Triangle meshes only.
    pub face_colors: Option<Vec<Color>>,
    pub color: Color,
    /// One texture coordinate per vertex, sampled from `texture`.
    pub texcoords: Option<Vec<[f32; 2]>>,
    pub texture: Option<Texture2D>,
    pub state: GlState,
}

impl MeshConfig {
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            topology: Topology::Triangles,
            vertex_colors: None,
            face_colors: None,
            color: DEFAULT_MESH_COLOR,
            texcoords: None,
            texture: None,
            state: GlState::opaque(),
        }
    }

    /// Places 2D points on the z = 0 plane.
    pub fn from_2d(points: &[[f32; 2]], indices: Vec<u32>) -> Self {
        Self::new(points.iter().map(|[x, y]| [*x, *y, 0.0]).collect(), indices)
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_vertex_colors(mut self, colors: Vec<Color>) -> Self {
        self.vertex_colors = Some(colors);
        self
    }

    pub fn with_face_colors(mut self, colors: Vec<Color>) -> Self {
        self.face_colors = Some(colors);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_texcoords(mut self, texcoords: Vec<[f32; 2]>) -> Self {
        self.texcoords = Some(texcoords);
        self
    }

    pub fn with_texture(mut self, texture: Texture2D) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_state(mut self, state: GlState) -> Self {
        self.state = state;
        self
    }
}

#[derive(Clone, Copy, Debug)]
struct MeshResources {
    program: ProgramId,
    vertices: BufferId,
    indices: BufferId,
    texture: Option<TextureId>,
}

impl MeshResources {
    fn free(self, gpu: &mut dyn Gpu) {
        gpu.delete_buffer(self.vertices);
        gpu.delete_buffer(self.indices);
        if let Some(texture) = self.texture {
            gpu.delete_texture(texture);
        }
        gpu.delete_program(self.program);
    }
}

/// A triangle or line mesh drawn with the built-in mesh program.
///
/// Colors are resolved into the vertex data when the visual is built. Face
/// colors unroll the mesh so that every triangle owns its three vertices.
/// The texture, if any, is uploaded together with the buffers on first draw.
#[derive(Debug)]
pub struct MeshVisual {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    topology: Topology,
    texture: Option<Texture2D>,
    state: GlState,
    resources: Option<MeshResources>,
}

impl MeshVisual {
    pub fn new(config: &MeshConfig) -> Result<Self> {
        let (vertices, indices) = resolve(config)?;
        debug!(
            "mesh visual: {} vertices, {} indices, {:?}",
            vertices.len(),
            indices.len(),
            config.topology
        );
        Ok(Self {
            vertices,
            indices,
            topology: config.topology,
            texture: config.texture.clone(),
            state: config.state,
            resources: None,
        })
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn state(&self) -> &GlState {
        &self.state
    }

    pub fn texture(&self) -> Option<&Texture2D> {
        self.texture.as_ref()
    }

    /// State applied before every draw of this mesh.
    pub fn set_state(&mut self, state: GlState) {
        self.state = state;
    }

    /// The program this mesh draws with, once uploaded.
    pub fn program(&self) -> Option<ProgramId> {
        self.resources.map(|r| r.program)
    }

    /// Creates every GPU resource of the mesh. On failure the resources
    /// created so far are deleted again.
    fn upload(&mut self, gpu: &mut dyn Gpu) -> Result<MeshResources> {
        let program = gpu.create_program(MESH_VERTEX_SHADER, MESH_FRAGMENT_SHADER)?;
        let mut resources = MeshResources {
            program,
            vertices: gpu.create_buffer(BufferKind::Vertex, Some("mesh vertices")),
            indices: gpu.create_buffer(BufferKind::Index, Some("mesh indices")),
            texture: None,
        };
        if let Err(err) = self.fill(gpu, &mut resources) {
            warn!("mesh upload failed: {}", err);
            resources.free(gpu);
            return Err(err);
        }
        self.resources = Some(resources);
        Ok(resources)
    }

    fn fill(&self, gpu: &mut dyn Gpu, resources: &mut MeshResources) -> Result<()> {
        gpu.set_data(resources.vertices, BufferData::Vertices(&self.vertices))?;
        gpu.set_data(resources.indices, BufferData::Indices(&self.indices))?;
        if let Some(texture) = &self.texture {
            let id = gpu.create_texture(texture)?;
            resources.texture = Some(id);
            gpu.set_texture(resources.program, Some(id))?;
        }
        Ok(())
    }
}

impl Visual for MeshVisual {
    fn type_name(&self) -> &'static str {
        Self::NAME
    }

    fn draw(&mut self, gpu: &mut dyn Gpu, transform: &cgmath::Matrix4<f32>) -> Result<()> {
        if self.indices.is_empty() {
            trace!("skipping empty mesh");
            return Ok(());
        }
        let resources = match self.resources {
            Some(resources) => resources,
            None => self.upload(gpu)?,
        };
        gpu.bind(resources.program)?;
        gpu.set_uniform(resources.program, "u_transform", (*transform).into())?;
        gpu.set_state(&self.state);
        gpu.draw(
            resources.program,
            self.topology,
            resources.vertices,
            resources.indices,
        )
    }

    fn release(&mut self, gpu: &mut dyn Gpu) {
        if let Some(resources) = self.resources.take() {
            resources.free(gpu);
        }
    }
}

impl VisualType for MeshVisual {
    const NAME: &'static str = "MeshVisual";
    const DESCRIPTION: &'static str = "Mesh visual

Displays a triangle or line mesh with per-vertex, per-face or uniform colors.

Parameters
----------
positions : array
    Vertex positions. 2D points are placed on the z = 0 plane.
indices : array
    Three indices per triangle, or two per line segment.
topology : str
    Either 'triangles' (default) or 'lines'.
vertex_colors : array | None
    One color per vertex.
face_colors : array | None
    One color per triangle. Only valid for triangle meshes.
color : Color
    Color used when neither vertex nor face colors are given.
texcoords : array | None
    One texture coordinate per vertex.
texture : Texture2D | None
    Texture multiplied with the vertex colors.
";

    type Config = MeshConfig;

    fn build(config: &MeshConfig) -> Result<Self> {
        Self::new(config)
    }

    fn config_of(config: &VisualConfig) -> Option<&MeshConfig> {
        match config {
            VisualConfig::Mesh(c) => Some(c),
            _ => None,
        }
    }
}

/// Validates `config` and flattens it into GPU vertex and index data.
fn resolve(config: &MeshConfig) -> Result<(Vec<MeshVertex>, Vec<u32>)> {
    let count = config.positions.len();
    let arity = config.topology.arity();
    let indices = &config.indices;

    if indices.len() % arity != 0 {
        return Err(SceneError::ShapeMismatch {
            what: match config.topology {
                Topology::Triangles => "triangle index count",
                Topology::Lines => "line index count",
            },
            expected: indices.len().next_multiple_of(arity),
            actual: indices.len(),
        });
    }
    if let Some(max) = indices.iter().copied().max().filter(|m| *m as usize >= count) {
        return Err(SceneError::ShapeMismatch {
            what: "vertex count required by indices",
            expected: max as usize + 1,
            actual: count,
        });
    }

    if let Some(texcoords) = &config.texcoords {
        if texcoords.len() != count {
            return Err(SceneError::ShapeMismatch {
                what: "texcoords",
                expected: count,
                actual: texcoords.len(),
            });
        }
    }

    let vertex = |i: usize, color: Color| MeshVertex {
        position: config.positions[i],
        color: color.to_array(),
        texcoord: config.texcoords.as_ref().map_or([0.0, 0.0], |t| t[i]),
    };

    match (&config.vertex_colors, &config.face_colors) {
        (Some(_), Some(_)) => Err(SceneError::invalid(
            "face_colors",
            "vertex_colors and face_colors cannot both be given",
        )),
        (Some(colors), None) => {
            if colors.len() != count {
                return Err(SceneError::ShapeMismatch {
                    what: "vertex_colors",
                    expected: count,
                    actual: colors.len(),
                });
            }
            let vertices = colors.iter().enumerate().map(|(i, c)| vertex(i, *c)).collect();
            Ok((vertices, indices.clone()))
        }
        (None, Some(colors)) => {
            if config.topology != Topology::Triangles {
                return Err(SceneError::invalid(
                    "face_colors",
                    "face colors require a triangle mesh",
                ));
            }
            let faces = indices.len() / 3;
            if colors.len() != faces {
                return Err(SceneError::ShapeMismatch {
                    what: "face_colors",
                    expected: faces,
                    actual: colors.len(),
                });
            }
            let vertices = indices
                .iter()
                .enumerate()
                .map(|(k, i)| vertex(*i as usize, colors[k / 3]))
                .collect();
            Ok((vertices, (0..indices.len() as u32).collect()))
        }
        (None, None) => {
            let vertices = (0..count).map(|i| vertex(i, config.color)).collect();
            Ok((vertices, indices.clone()))
        }
    }
}
