//! Procedural geometry builders.
//!
//! Pure functions returning vertex records and index arrays. Nothing here
//! touches the GPU; visuals feed the output into their meshes.

mod boxes;
mod polygon;

pub use boxes::{BoxGeometry, Plane, create_box, create_plane};
pub use polygon::{
    PolygonGeometry, ellipse_points, polygon_fan, regular_polygon_points, rounded_rect_points,
};

/// A generated vertex. Only `position` is required by the visuals; the other
/// attributes are provided for custom shading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub texcoord: [f32; 2],
    pub color: [f32; 4],
}

/// Extracts the `position` field of every vertex record.
pub fn positions(vertices: &[GeometryVertex]) -> Vec<[f32; 3]> {
    vertices.iter().map(|v| v.position).collect()
}
