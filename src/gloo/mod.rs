//! GPU resource layer.
//!
//! Visuals never talk to a graphics API directly. They go through the [`Gpu`]
//! trait, which mirrors a small OpenGL-like command set: buffers and programs
//! are opaque handles, state is set with [`GlState`] option sets, and draw
//! calls name a program, a topology and a vertex/index buffer pair.
//!
//! Two backends ship with the crate:
//!
//! - [`RecordingGpu`] records every command. It is what tests and headless
//!   tools use.
//! - [`WgpuGpu`] renders into an offscreen `wgpu` texture that can be read
//!   back as an image.
//!
//! Textures, render buffers and framebuffers live in [`texture`] and
//! [`framebuffer`]; their validation happens at construction/assignment.

pub mod framebuffer;
pub mod recording;
pub mod texture;
pub mod wgpu_backend;

pub use framebuffer::{Attachment, FrameBuffer, RenderBuffer, RenderBufferKind};
pub use recording::{GpuCommand, RecordingGpu};
pub use texture::{Interpolation, Texture2D, Texture3D, TextureFormat};
pub use wgpu_backend::WgpuGpu;

use crate::{color::Color, error::Result};

/// Declares an opaque `u32` handle type.
macro_rules! handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub fn new(raw: u32) -> Self {
                Self(raw)
            }

            pub fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

handle!(
    /// Opaque handle to a vertex or index buffer.
    BufferId
);
handle!(
    /// Opaque handle to a linked shader program.
    ProgramId
);
handle!(
    /// Opaque handle to an uploaded 2D texture.
    TextureId
);
handle!(
    /// Opaque handle to a framebuffer whose attachments live on the GPU.
    FrameBufferId
);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    Triangles,
    Lines,
}

impl Topology {
    /// Number of indices consumed per primitive.
    pub fn arity(self) -> usize {
        match self {
            Topology::Triangles => 3,
            Topology::Lines => 2,
        }
    }
}

/// The vertex layout every built-in program consumes.
///
/// The program multiplies `color` with the bound texture sampled at
/// `texcoord`; without a texture that sample is opaque white.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub texcoord: [f32; 2],
}

pub enum BufferData<'a> {
    Vertices(&'a [MeshVertex]),
    Indices(&'a [u32]),
}

impl BufferData<'_> {
    pub fn kind(&self) -> BufferKind {
        match self {
            BufferData::Vertices(_) => BufferKind::Vertex,
            BufferData::Indices(_) => BufferKind::Index,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BufferData::Vertices(v) => v.len(),
            BufferData::Indices(i) => i.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Uniform {
    Float(f32),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
}

impl From<cgmath::Matrix4<f32>> for Uniform {
    fn from(m: cgmath::Matrix4<f32>) -> Self {
        Uniform::Mat4(m.into())
    }
}

impl From<Color> for Uniform {
    fn from(c: Color) -> Self {
        Uniform::Vec4(c.to_array())
    }
}

/// A set of GPU state options. `None` leaves the option untouched when the set
/// is applied with [`Gpu::set_state`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlState {
    pub blend: Option<bool>,
    pub depth_test: Option<bool>,
    pub cull_face: Option<bool>,
    /// `(factor, units)`.
    pub polygon_offset: Option<(f32, f32)>,
    pub polygon_offset_fill: Option<bool>,
}

impl GlState {
    /// State of a freshly created context.
    pub fn initial() -> Self {
        Self {
            blend: Some(false),
            depth_test: Some(false),
            cull_face: Some(false),
            polygon_offset: Some((0.0, 0.0)),
            polygon_offset_fill: Some(false),
        }
    }

    /// Default state for opaque 3D meshes.
    pub fn opaque() -> Self {
        Self {
            blend: Some(true),
            depth_test: Some(true),
            cull_face: Some(false),
            ..Default::default()
        }
    }

    pub fn polygon_offset(factor: f32, units: f32) -> Self {
        Self {
            polygon_offset: Some((factor, units)),
            polygon_offset_fill: Some(true),
            ..Default::default()
        }
    }

    /// Overwrites every option that `other` sets.
    pub fn merge(&mut self, other: &GlState) {
        if other.blend.is_some() {
            self.blend = other.blend;
        }
        if other.depth_test.is_some() {
            self.depth_test = other.depth_test;
        }
        if other.cull_face.is_some() {
            self.cull_face = other.cull_face;
        }
        if other.polygon_offset.is_some() {
            self.polygon_offset = other.polygon_offset;
        }
        if other.polygon_offset_fill.is_some() {
            self.polygon_offset_fill = other.polygon_offset_fill;
        }
    }

    pub fn touches_polygon_offset(&self) -> bool {
        self.polygon_offset.is_some() || self.polygon_offset_fill == Some(true)
    }
}

/// The command set visuals are drawn with.
///
/// Implementations own the GPU context and are expected to be driven from the
/// thread that created it.
pub trait Gpu {
    fn create_buffer(&mut self, kind: BufferKind, label: Option<&str>) -> BufferId;

    /// Uploads `data`, replacing the previous contents. The data kind must match
    /// the buffer kind.
    fn set_data(&mut self, buffer: BufferId, data: BufferData<'_>) -> Result<()>;

    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<ProgramId>;

    fn bind(&mut self, program: ProgramId) -> Result<()>;

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: Uniform) -> Result<()>;

    fn set_state(&mut self, state: &GlState);

    fn draw(
        &mut self,
        program: ProgramId,
        topology: Topology,
        vertices: BufferId,
        indices: BufferId,
    ) -> Result<()>;

    /// The merged state currently in effect.
    fn current_state(&self) -> GlState;

    /// Clears the bound framebuffer, or the default target.
    fn clear(&mut self, color: Color);

    /// Uploads `texture` as RGBA8. Textures without data are allocated blank.
    fn create_texture(&mut self, texture: &Texture2D) -> Result<TextureId>;

    /// Samples `texture` in the fragment stage of `program`. `None` restores
    /// the opaque white default.
    fn set_texture(&mut self, program: ProgramId, texture: Option<TextureId>) -> Result<()>;

    /// Allocates render targets for the attachments of `framebuffer`. A color
    /// attachment is required.
    fn create_framebuffer(&mut self, framebuffer: &FrameBuffer) -> Result<FrameBufferId>;

    /// Redirects `clear` and `draw` into `framebuffer`. `None` goes back to
    /// the default target.
    fn bind_framebuffer(&mut self, framebuffer: Option<FrameBufferId>) -> Result<()>;

    fn delete_buffer(&mut self, buffer: BufferId);

    fn delete_program(&mut self, program: ProgramId);

    fn delete_texture(&mut self, texture: TextureId);

    /// Deleting the bound framebuffer rebinds the default target.
    fn delete_framebuffer(&mut self, framebuffer: FrameBufferId);
}
