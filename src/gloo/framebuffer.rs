//! Render buffers and framebuffers with typed attachment slots.

use crate::{
    error::{Result, SceneError},
    gloo::{BufferId, ProgramId, Texture2D, Texture3D},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderBufferKind {
    Color,
    Depth,
    Stencil,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderBuffer {
    kind: RenderBufferKind,
    shape: [usize; 2],
}

impl RenderBuffer {
    pub fn new(kind: RenderBufferKind, shape: [usize; 2]) -> Self {
        Self { kind, shape }
    }

    pub fn color(shape: [usize; 2]) -> Self {
        Self::new(RenderBufferKind::Color, shape)
    }

    pub fn depth(shape: [usize; 2]) -> Self {
        Self::new(RenderBufferKind::Depth, shape)
    }

    pub fn stencil(shape: [usize; 2]) -> Self {
        Self::new(RenderBufferKind::Stencil, shape)
    }

    pub fn kind(&self) -> RenderBufferKind {
        self.kind
    }

    pub fn shape(&self) -> [usize; 2] {
        self.shape
    }
}

/// Anything that might be handed to a framebuffer slot. Only some variants are
/// valid for a given slot; the setters on [`FrameBuffer`] check that.
#[derive(Clone, Debug, PartialEq)]
pub enum Attachment {
    Texture(Texture2D),
    Texture3D(Texture3D),
    RenderBuffer(RenderBuffer),
    Buffer(BufferId),
    Program(ProgramId),
}

impl Attachment {
    fn kind_name(&self) -> &'static str {
        match self {
            Attachment::Texture(_) => "2D texture",
            Attachment::Texture3D(_) => "3D texture",
            Attachment::RenderBuffer(rb) => match rb.kind {
                RenderBufferKind::Color => "color render buffer",
                RenderBufferKind::Depth => "depth render buffer",
                RenderBufferKind::Stencil => "stencil render buffer",
            },
            Attachment::Buffer(_) => "data buffer",
            Attachment::Program(_) => "program",
        }
    }

    fn shape(&self) -> Option<[usize; 2]> {
        match self {
            Attachment::Texture(t) => Some(t.shape()),
            Attachment::RenderBuffer(rb) => Some(rb.shape()),
            _ => None,
        }
    }
}

impl From<Texture2D> for Attachment {
    fn from(t: Texture2D) -> Self {
        Attachment::Texture(t)
    }
}

impl From<RenderBuffer> for Attachment {
    fn from(rb: RenderBuffer) -> Self {
        Attachment::RenderBuffer(rb)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameBuffer {
    color: Option<Attachment>,
    depth: Option<Attachment>,
    stencil: Option<Attachment>,
}

impl FrameBuffer {
    pub fn new(color: impl Into<Attachment>) -> Result<Self> {
        let mut fbo = Self::default();
        fbo.set_color_buffer(Some(color.into()))?;
        Ok(fbo)
    }

    pub fn color_buffer(&self) -> Option<&Attachment> {
        self.color.as_ref()
    }

    pub fn depth_buffer(&self) -> Option<&Attachment> {
        self.depth.as_ref()
    }

    pub fn stencil_buffer(&self) -> Option<&Attachment> {
        self.stencil.as_ref()
    }

    /// Shape shared by the attachments, taken from the first one present.
    pub fn shape(&self) -> Option<[usize; 2]> {
        [&self.color, &self.depth, &self.stencil]
            .into_iter()
            .flatten()
            .find_map(Attachment::shape)
    }

    /// Shape of the color attachment, which every backend renders into.
    pub(crate) fn target_shape(&self) -> Result<[usize; 2]> {
        let shape = self
            .color
            .as_ref()
            .and_then(Attachment::shape)
            .ok_or_else(|| SceneError::invalid("framebuffer", "a color attachment is required"))?;
        if shape[0] == 0 || shape[1] == 0 {
            return Err(SceneError::invalid(
                "framebuffer",
                format!("color attachment must not be empty, got {:?}", shape),
            ));
        }
        Ok(shape)
    }

    /// Accepts a 2D texture or a color render buffer.
    pub fn set_color_buffer(&mut self, attachment: Option<Attachment>) -> Result<()> {
        if let Some(a) = &attachment {
            match a {
                Attachment::Texture(_) => {}
                Attachment::RenderBuffer(rb) if rb.kind == RenderBufferKind::Color => {}
                other => return Err(mismatch("color buffer", "2D texture or color render buffer", other)),
            }
        }
        self.assign(attachment, Slot::Color)
    }

    /// Accepts a depth render buffer or a 2D texture.
    pub fn set_depth_buffer(&mut self, attachment: Option<Attachment>) -> Result<()> {
        if let Some(a) = &attachment {
            match a {
                Attachment::Texture(_) => {}
                Attachment::RenderBuffer(rb) if rb.kind == RenderBufferKind::Depth => {}
                other => return Err(mismatch("depth buffer", "2D texture or depth render buffer", other)),
            }
        }
        self.assign(attachment, Slot::Depth)
    }

    /// Accepts a stencil render buffer only.
    pub fn set_stencil_buffer(&mut self, attachment: Option<Attachment>) -> Result<()> {
        if let Some(a) = &attachment {
            match a {
                Attachment::RenderBuffer(rb) if rb.kind == RenderBufferKind::Stencil => {}
                other => return Err(mismatch("stencil buffer", "stencil render buffer", other)),
            }
        }
        self.assign(attachment, Slot::Stencil)
    }

    fn assign(&mut self, attachment: Option<Attachment>, slot: Slot) -> Result<()> {
        if let Some(new_shape) = attachment.as_ref().and_then(Attachment::shape) {
            let others = [
                (Slot::Color, &self.color),
                (Slot::Depth, &self.depth),
                (Slot::Stencil, &self.stencil),
            ];
            let existing = others
                .into_iter()
                .filter(|(s, _)| *s != slot)
                .find_map(|(_, a)| a.as_ref().and_then(Attachment::shape));
            if let Some(shape) = existing {
                if shape != new_shape {
                    return Err(SceneError::ShapeMismatch {
                        what: "framebuffer attachment pixels",
                        expected: shape[0] * shape[1],
                        actual: new_shape[0] * new_shape[1],
                    });
                }
            }
        }
        match slot {
            Slot::Color => self.color = attachment,
            Slot::Depth => self.depth = attachment,
            Slot::Stencil => self.stencil = attachment,
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Color,
    Depth,
    Stencil,
}

fn mismatch(slot: &'static str, expected: &'static str, actual: &Attachment) -> SceneError {
    SceneError::TypeMismatch {
        slot,
        expected,
        actual: actual.kind_name(),
    }
}
