use std::{cell::RefCell, rc::Rc};

use scene_ngin::{
    Color, Node, SceneError,
    cgmath::Matrix4,
    gloo::{
        BufferData, BufferId, BufferKind, FrameBuffer, FrameBufferId, GlState, Gpu, GpuCommand,
        ProgramId, RecordingGpu, Texture2D, TextureId, Topology, Uniform,
    },
    logging::{LoggingConfig, init_logging},
    visuals::Visual,
};

pub fn init() {
    init_logging(LoggingConfig {
        is_test: true,
        ..Default::default()
    });
}

pub fn assert_matrix_eq(actual: &Matrix4<f32>, expected: &Matrix4<f32>) {
    let a: [[f32; 4]; 4] = (*actual).into();
    let e: [[f32; 4]; 4] = (*expected).into();
    for (col_a, col_e) in a.iter().zip(e.iter()) {
        for (x, y) in col_a.iter().zip(col_e.iter()) {
            assert!(
                (x - y).abs() < 1e-5,
                "matrices differ:\n{:?}\n{:?}",
                actual,
                expected
            );
        }
    }
}

/// root -> [a -> [a1, a2], b]
pub struct SampleTree {
    pub root: Node,
    pub a: Node,
    pub a1: Node,
    pub a2: Node,
    pub b: Node,
}

pub fn sample_tree() -> SampleTree {
    let root = Node::with_name("root");
    let a = Node::new_child(&root, Some("a"));
    let a1 = Node::new_child(&a, Some("a1"));
    let a2 = Node::new_child(&a, Some("a2"));
    let b = Node::new_child(&root, Some("b"));
    SampleTree { root, a, a1, a2, b }
}

pub fn names(nodes: impl IntoIterator<Item = Node>) -> Vec<String> {
    nodes
        .into_iter()
        .map(|n| n.name().unwrap_or_default())
        .collect()
}

pub fn draw_count(gpu: &RecordingGpu) -> usize {
    gpu.draw_calls().count()
}

/// `SetState` commands that change the polygon offset.
pub fn offset_states(gpu: &RecordingGpu) -> Vec<GlState> {
    gpu.commands()
        .iter()
        .filter_map(|c| match c {
            GpuCommand::SetState(s) if s.touches_polygon_offset() => Some(*s),
            _ => None,
        })
        .collect()
}

pub type DrawLog = Rc<RefCell<Vec<(String, Matrix4<f32>)>>>;

/// A visual that logs its draws instead of touching the GPU.
pub struct LoggedVisual {
    pub label: String,
    pub log: DrawLog,
    pub fail: bool,
}

impl LoggedVisual {
    pub fn new(label: &str, log: &DrawLog) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
            fail: false,
        }
    }

    pub fn failing(label: &str, log: &DrawLog) -> Self {
        Self {
            fail: true,
            ..Self::new(label, log)
        }
    }
}

impl Visual for LoggedVisual {
    fn type_name(&self) -> &'static str {
        "LoggedVisual"
    }

    fn draw(&mut self, _gpu: &mut dyn Gpu, transform: &Matrix4<f32>) -> scene_ngin::Result<()> {
        if self.fail {
            return Err(SceneError::Gpu(format!("{} failed", self.label)));
        }
        self.log.borrow_mut().push((self.label.clone(), *transform));
        Ok(())
    }
}

pub fn drawn_labels(log: &DrawLog) -> Vec<String> {
    log.borrow().iter().map(|(l, _)| l.clone()).collect()
}

/// Delegates to a [`RecordingGpu`] but fails selected calls.
#[derive(Default)]
pub struct FaultyGpu {
    pub inner: RecordingGpu,
    /// Every `set_data` call fails.
    pub fail_set_data: bool,
    /// Number of draws that succeed before every further draw fails.
    pub draws_before_failure: Option<usize>,
}

impl FaultyGpu {
    fn injected(what: &str) -> SceneError {
        SceneError::Gpu(format!("injected {} failure", what))
    }
}

impl Gpu for FaultyGpu {
    fn create_buffer(&mut self, kind: BufferKind, label: Option<&str>) -> BufferId {
        self.inner.create_buffer(kind, label)
    }

    fn set_data(&mut self, buffer: BufferId, data: BufferData<'_>) -> scene_ngin::Result<()> {
        if self.fail_set_data {
            return Err(Self::injected("set_data"));
        }
        self.inner.set_data(buffer, data)
    }

    fn create_program(&mut self, vs: &str, fs: &str) -> scene_ngin::Result<ProgramId> {
        self.inner.create_program(vs, fs)
    }

    fn bind(&mut self, program: ProgramId) -> scene_ngin::Result<()> {
        self.inner.bind(program)
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: Uniform) -> scene_ngin::Result<()> {
        self.inner.set_uniform(program, name, value)
    }

    fn set_state(&mut self, state: &GlState) {
        self.inner.set_state(state)
    }

    fn draw(
        &mut self,
        program: ProgramId,
        topology: Topology,
        vertices: BufferId,
        indices: BufferId,
    ) -> scene_ngin::Result<()> {
        match self.draws_before_failure {
            Some(0) => return Err(Self::injected("draw")),
            Some(n) => self.draws_before_failure = Some(n - 1),
            None => {}
        }
        self.inner.draw(program, topology, vertices, indices)
    }

    fn current_state(&self) -> GlState {
        self.inner.current_state()
    }

    fn clear(&mut self, color: Color) {
        self.inner.clear(color)
    }

    fn create_texture(&mut self, texture: &Texture2D) -> scene_ngin::Result<TextureId> {
        self.inner.create_texture(texture)
    }

    fn set_texture(&mut self, program: ProgramId, texture: Option<TextureId>) -> scene_ngin::Result<()> {
        self.inner.set_texture(program, texture)
    }

    fn create_framebuffer(&mut self, framebuffer: &FrameBuffer) -> scene_ngin::Result<FrameBufferId> {
        self.inner.create_framebuffer(framebuffer)
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FrameBufferId>) -> scene_ngin::Result<()> {
        self.inner.bind_framebuffer(framebuffer)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.inner.delete_buffer(buffer)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.inner.delete_program(program)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.inner.delete_texture(texture)
    }

    fn delete_framebuffer(&mut self, framebuffer: FrameBufferId) {
        self.inner.delete_framebuffer(framebuffer)
    }
}
