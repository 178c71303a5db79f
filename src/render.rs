//! Frame dispatch.
//!
//! [`SceneCanvas`] walks a scene tree in pre-order, skipping invisible
//! subtrees, and draws every node that carries a visual with
//! `view_projection * world_transform` as its transform. Children therefore
//! draw after their parent, in insertion order.

use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};
use log::{trace, warn};

use crate::{
    color::Color,
    error::Result,
    gloo::{FrameBufferId, Gpu},
    scene::Node,
};

/// Maps OpenGL clip space (z in -1..1) to wgpu clip space (z in 0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Orthographic projection for 2D scenes in pixel units: origin at the top
/// left corner, y pointing down.
pub fn pixel_projection(width: f32, height: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * cgmath::ortho(0.0, width, height, 0.0, -1000.0, 1000.0)
}

/// Perspective view-projection looking from `eye` at `target`, y up.
pub fn look_at_projection(
    eye: Point3<f32>,
    target: Point3<f32>,
    fovy_degrees: f32,
    aspect: f32,
    znear: f32,
    zfar: f32,
) -> Matrix4<f32> {
    let view = Matrix4::look_at_rh(eye, target, Vector3::unit_y());
    let proj = cgmath::perspective(cgmath::Deg(fovy_degrees), aspect, znear, zfar);
    OPENGL_TO_WGPU_MATRIX * proj * view
}

/// A scene root plus what is needed to turn it into a frame.
#[derive(Debug)]
pub struct SceneCanvas {
    root: Node,
    view_projection: Matrix4<f32>,
    clear_colour: Color,
}

impl SceneCanvas {
    pub fn new(root: Node) -> Self {
        Self {
            root,
            view_projection: Matrix4::identity(),
            clear_colour: Color::BLACK,
        }
    }

    pub fn with_view_projection(mut self, view_projection: Matrix4<f32>) -> Self {
        self.view_projection = view_projection;
        self
    }

    pub fn with_clear_colour(mut self, colour: impl Into<Color>) -> Self {
        self.clear_colour = colour.into();
        self
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn view_projection(&self) -> &Matrix4<f32> {
        &self.view_projection
    }

    pub fn set_view_projection(&mut self, view_projection: Matrix4<f32>) {
        self.view_projection = view_projection;
    }

    pub fn clear_colour(&self) -> Color {
        self.clear_colour
    }

    pub fn set_clear_colour(&mut self, colour: impl Into<Color>) {
        self.clear_colour = colour.into();
    }

    /// Clears the target and draws the whole tree. Returns the number of
    /// visuals drawn.
    pub fn render(&self, gpu: &mut dyn Gpu) -> Result<usize> {
        gpu.clear(self.clear_colour);
        draw_node(gpu, &self.root, &self.view_projection)
    }

    /// [`SceneCanvas::render`] into `framebuffer`. The default target is bound
    /// again afterwards, also when the frame fails.
    pub fn render_to(&self, gpu: &mut dyn Gpu, framebuffer: FrameBufferId) -> Result<usize> {
        gpu.bind_framebuffer(Some(framebuffer))?;
        let drawn = self.render(gpu);
        gpu.bind_framebuffer(None)?;
        drawn
    }
}

/// Draws the visible part of the subtree rooted at `node`.
///
/// Stops at the first failing draw and returns its error. Visuals must not
/// be borrowed elsewhere while this runs.
pub fn draw_node(gpu: &mut dyn Gpu, node: &Node, view_projection: &Matrix4<f32>) -> Result<usize> {
    let mut drawn = 0;
    for node in node.visit(true) {
        let Some(visual) = node.visual() else {
            continue;
        };
        let transform = view_projection * node.world_transform();
        trace!("drawing {}", node);
        visual
            .borrow_mut()
            .draw(gpu, &transform)
            .inspect_err(|e| warn!("aborting frame at {}: {}", node, e))?;
        drawn += 1;
    }
    Ok(drawn)
}
