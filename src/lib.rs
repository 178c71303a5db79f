//! scene-ngin
//!
//! A small scenegraph for scientific visualization. Scene nodes form a tree
//! of transforms; visuals own geometry and draw through an OpenGL-like GPU
//! command set; scene visuals fuse both so a box, a mesh or a rectangle can
//! be parented, named, hidden and moved like any other node.
//!
//! High-level modules
//! - `scene`: nodes, fused scene visuals and their registry
//! - `visuals`: drawable visuals (mesh, box, rectangle, ellipse, polygon,
//!   image)
//! - `geometry`: pure vertex/index builders for boxes, planes and polygons
//! - `transforms`: null, scale-translate, TRS and affine transforms
//! - `gloo`: the `Gpu` trait, textures, framebuffers and the two backends
//! - `context`: headless wgpu device/queue and offscreen targets
//! - `pipelines`: wgpu render pipelines for the built-in mesh program
//! - `render`: frame dispatch over a scene tree
//! - `logging`: `env_logger` setup
//!

pub mod color;
pub mod context;
pub mod error;
pub mod geometry;
pub mod gloo;
pub mod logging;
pub mod pipelines;
pub mod render;
pub mod scene;
pub mod transforms;
pub mod visuals;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use color::{Color, Colormap};
pub use error::{Result, SceneError};
pub use render::SceneCanvas;
pub use scene::{Node, SceneNode, SceneVisual};
pub use transforms::Transform;
pub use visuals::Visual;
