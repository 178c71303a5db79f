//! A [`Gpu`] backend that records commands instead of executing them.

use std::collections::HashMap;

use log::trace;

use crate::{
    color::Color,
    error::{Result, SceneError},
    gloo::{
        BufferData, BufferId, BufferKind, FrameBuffer, FrameBufferId, GlState, Gpu, ProgramId,
        Texture2D, TextureId, Topology, Uniform,
    },
};

#[derive(Clone, Debug, PartialEq)]
pub enum GpuCommand {
    CreateBuffer {
        buffer: BufferId,
        kind: BufferKind,
        label: Option<String>,
    },
    SetData {
        buffer: BufferId,
        len: usize,
    },
    CreateProgram {
        program: ProgramId,
    },
    Bind {
        program: ProgramId,
    },
    SetUniform {
        program: ProgramId,
        name: String,
        value: Uniform,
    },
    SetState(GlState),
    Draw {
        program: ProgramId,
        topology: Topology,
        vertices: BufferId,
        indices: BufferId,
        /// Number of indices submitted.
        count: usize,
        /// Merged state at the time of the draw.
        state: GlState,
        /// Texture sampled by the program, if any.
        texture: Option<TextureId>,
        /// Framebuffer drawn into, `None` for the default target.
        target: Option<FrameBufferId>,
    },
    Clear(Color),
    CreateTexture {
        texture: TextureId,
        /// `[height, width]`.
        shape: [usize; 2],
    },
    SetTexture {
        program: ProgramId,
        texture: Option<TextureId>,
    },
    CreateFrameBuffer {
        framebuffer: FrameBufferId,
        /// `[height, width]`.
        shape: [usize; 2],
    },
    BindFrameBuffer(Option<FrameBufferId>),
    DeleteBuffer(BufferId),
    DeleteProgram(ProgramId),
    DeleteTexture(TextureId),
    DeleteFrameBuffer(FrameBufferId),
}

#[derive(Debug)]
struct BufferRecord {
    kind: BufferKind,
    len: usize,
}

#[derive(Debug)]
struct ProgramRecord {
    #[allow(dead_code)]
    vertex_source: String,
    #[allow(dead_code)]
    fragment_source: String,
    uniforms: HashMap<String, Uniform>,
    texture: Option<TextureId>,
}

/// Validates handles and data kinds the way a real driver would, so that
/// tests catch misuse, and keeps the merged state current.
#[derive(Debug)]
pub struct RecordingGpu {
    commands: Vec<GpuCommand>,
    buffers: HashMap<BufferId, BufferRecord>,
    programs: HashMap<ProgramId, ProgramRecord>,
    textures: HashMap<TextureId, [usize; 2]>,
    framebuffers: HashMap<FrameBufferId, [usize; 2]>,
    bound: Option<ProgramId>,
    target: Option<FrameBufferId>,
    state: GlState,
    next_id: u32,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            buffers: HashMap::new(),
            programs: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            bound: None,
            target: None,
            state: GlState::initial(),
            next_id: 1,
        }
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Drains the recorded commands, keeping resources and state.
    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn draw_calls(&self) -> impl Iterator<Item = &GpuCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, GpuCommand::Draw { .. }))
    }

    /// The merged state currently in effect.
    pub fn state(&self) -> &GlState {
        &self.state
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.framebuffers.len()
    }

    /// The framebuffer draws currently go to.
    pub fn target(&self) -> Option<FrameBufferId> {
        self.target
    }

    pub fn texture_of(&self, program: ProgramId) -> Option<TextureId> {
        self.programs.get(&program).and_then(|p| p.texture)
    }

    pub fn uniform(&self, program: ProgramId, name: &str) -> Option<Uniform> {
        self.programs
            .get(&program)
            .and_then(|p| p.uniforms.get(name))
            .copied()
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn buffer(&self, buffer: BufferId) -> Result<&BufferRecord> {
        self.buffers
            .get(&buffer)
            .ok_or_else(|| SceneError::Gpu(format!("unknown buffer {:?}", buffer)))
    }
}

impl Default for RecordingGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Gpu for RecordingGpu {
    fn create_buffer(&mut self, kind: BufferKind, label: Option<&str>) -> BufferId {
        let buffer = BufferId::new(self.next_id());
        self.buffers.insert(buffer, BufferRecord { kind, len: 0 });
        self.commands.push(GpuCommand::CreateBuffer {
            buffer,
            kind,
            label: label.map(str::to_owned),
        });
        buffer
    }

    fn set_data(&mut self, buffer: BufferId, data: BufferData<'_>) -> Result<()> {
        let kind = self.buffer(buffer)?.kind;
        if kind != data.kind() {
            return Err(SceneError::TypeMismatch {
                slot: "buffer data",
                expected: kind_name(kind),
                actual: kind_name(data.kind()),
            });
        }
        let len = data.len();
        if let Some(record) = self.buffers.get_mut(&buffer) {
            record.len = len;
        }
        self.commands.push(GpuCommand::SetData { buffer, len });
        Ok(())
    }

    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<ProgramId> {
        if vertex_source.trim().is_empty() || fragment_source.trim().is_empty() {
            return Err(SceneError::Gpu("empty shader source".to_string()));
        }
        let program = ProgramId::new(self.next_id());
        self.programs.insert(
            program,
            ProgramRecord {
                vertex_source: vertex_source.to_string(),
                fragment_source: fragment_source.to_string(),
                uniforms: HashMap::new(),
                texture: None,
            },
        );
        self.commands.push(GpuCommand::CreateProgram { program });
        Ok(program)
    }

    fn bind(&mut self, program: ProgramId) -> Result<()> {
        if !self.programs.contains_key(&program) {
            return Err(SceneError::Gpu(format!("unknown program {:?}", program)));
        }
        self.bound = Some(program);
        self.commands.push(GpuCommand::Bind { program });
        Ok(())
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: Uniform) -> Result<()> {
        let record = self
            .programs
            .get_mut(&program)
            .ok_or_else(|| SceneError::Gpu(format!("unknown program {:?}", program)))?;
        record.uniforms.insert(name.to_string(), value);
        self.commands.push(GpuCommand::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn set_state(&mut self, state: &GlState) {
        self.state.merge(state);
        self.commands.push(GpuCommand::SetState(*state));
    }

    fn draw(
        &mut self,
        program: ProgramId,
        topology: Topology,
        vertices: BufferId,
        indices: BufferId,
    ) -> Result<()> {
        if self.bound != Some(program) {
            return Err(SceneError::Gpu(format!(
                "draw with program {:?} which is not bound",
                program
            )));
        }
        if self.buffer(vertices)?.kind != BufferKind::Vertex {
            return Err(SceneError::TypeMismatch {
                slot: "vertex buffer",
                expected: kind_name(BufferKind::Vertex),
                actual: kind_name(BufferKind::Index),
            });
        }
        let index_record = self.buffer(indices)?;
        if index_record.kind != BufferKind::Index {
            return Err(SceneError::TypeMismatch {
                slot: "index buffer",
                expected: kind_name(BufferKind::Index),
                actual: kind_name(BufferKind::Vertex),
            });
        }
        let count = index_record.len;
        let texture = self.texture_of(program);
        if let Some(texture) = texture {
            if !self.textures.contains_key(&texture) {
                return Err(SceneError::Gpu(format!("unknown texture {:?}", texture)));
            }
        }
        trace!("draw {:?} with {} indices", topology, count);
        self.commands.push(GpuCommand::Draw {
            program,
            topology,
            vertices,
            indices,
            count,
            state: self.state,
            texture,
            target: self.target,
        });
        Ok(())
    }

    fn current_state(&self) -> GlState {
        self.state
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(GpuCommand::Clear(color));
    }

    fn create_texture(&mut self, texture: &Texture2D) -> Result<TextureId> {
        let shape = texture.shape();
        let id = TextureId::new(self.next_id());
        self.textures.insert(id, shape);
        self.commands.push(GpuCommand::CreateTexture { texture: id, shape });
        Ok(id)
    }

    fn set_texture(&mut self, program: ProgramId, texture: Option<TextureId>) -> Result<()> {
        if let Some(texture) = texture {
            if !self.textures.contains_key(&texture) {
                return Err(SceneError::Gpu(format!("unknown texture {:?}", texture)));
            }
        }
        let record = self
            .programs
            .get_mut(&program)
            .ok_or_else(|| SceneError::Gpu(format!("unknown program {:?}", program)))?;
        record.texture = texture;
        self.commands.push(GpuCommand::SetTexture { program, texture });
        Ok(())
    }

    fn create_framebuffer(&mut self, framebuffer: &FrameBuffer) -> Result<FrameBufferId> {
        let shape = framebuffer.target_shape()?;
        let id = FrameBufferId::new(self.next_id());
        self.framebuffers.insert(id, shape);
        self.commands.push(GpuCommand::CreateFrameBuffer {
            framebuffer: id,
            shape,
        });
        Ok(id)
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FrameBufferId>) -> Result<()> {
        if let Some(framebuffer) = framebuffer {
            if !self.framebuffers.contains_key(&framebuffer) {
                return Err(SceneError::Gpu(format!(
                    "unknown framebuffer {:?}",
                    framebuffer
                )));
            }
        }
        self.target = framebuffer;
        self.commands.push(GpuCommand::BindFrameBuffer(framebuffer));
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_some() {
            self.commands.push(GpuCommand::DeleteBuffer(buffer));
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.programs.remove(&program).is_some() {
            if self.bound == Some(program) {
                self.bound = None;
            }
            self.commands.push(GpuCommand::DeleteProgram(program));
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_some() {
            self.commands.push(GpuCommand::DeleteTexture(texture));
        }
    }

    fn delete_framebuffer(&mut self, framebuffer: FrameBufferId) {
        if self.framebuffers.remove(&framebuffer).is_some() {
            if self.target == Some(framebuffer) {
                self.target = None;
            }
            self.commands.push(GpuCommand::DeleteFrameBuffer(framebuffer));
        }
    }
}

fn kind_name(kind: BufferKind) -> &'static str {
    match kind {
        BufferKind::Vertex => "vertex buffer",
        BufferKind::Index => "index buffer",
    }
}
