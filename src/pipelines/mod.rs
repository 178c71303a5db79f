//! Render pipeline construction for the `wgpu` backend.
//!
//! - `mesh` builds the pipeline every built-in visual is drawn with, one per
//!   program/topology/state combination.

pub mod mesh;

/// Describes how a vertex type is laid out in GPU memory.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}
