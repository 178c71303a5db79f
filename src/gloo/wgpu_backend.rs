//! [`Gpu`] implementation rendering into the offscreen target of a [`Context`].
//!
//! Every draw call is encoded as its own render pass that loads the current
//! target contents, then submitted immediately. That keeps the command model
//! identical to the immediate-mode GL calls the visuals are written against.
//!
//! A bound framebuffer replaces the context target for clears and draws. Each
//! framebuffer owns a color texture in the context format and its own depth
//! texture.

use std::{collections::HashMap, iter, time::Duration};

use log::{trace, warn};
use wgpu::util::DeviceExt;

use crate::{
    color::Color,
    context::{Context, DepthTexture},
    error::{Result, SceneError},
    gloo::{
        Attachment, BufferData, BufferId, BufferKind, FrameBuffer, FrameBufferId, GlState, Gpu,
        ProgramId, Texture2D, TextureId, Topology, Uniform,
    },
    pipelines::mesh::{
        MeshUniforms, mesh_bind_group_layout, mk_mesh_pipeline, texture_bind_group_layout,
    },
};

struct GpuBuffer {
    kind: BufferKind,
    buffer: Option<wgpu::Buffer>,
    len: usize,
}

struct GpuProgram {
    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    uniforms: MeshUniforms,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    texture: Option<TextureId>,
}

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

impl GpuTexture {
    fn upload(ctx: &Context, layout: &wgpu::BindGroupLayout, source: &Texture2D) -> Self {
        let texture = source.create_gpu_texture(
            ctx,
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING,
            Some("Image Texture"),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let filter = source.interpolation().filter_mode();
        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        });
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some("texture_bind_group"),
        });
        Self {
            texture,
            bind_group,
        }
    }
}

struct GpuFrameBuffer {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth: DepthTexture,
    /// `(width, height)`.
    size: (u32, u32),
}

/// Everything that selects a distinct pipeline object.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    topology: Topology,
    blend: bool,
    depth_test: bool,
    cull_face: bool,
    /// `(factor bits, units bits)` when a fill offset is in effect.
    offset: Option<(u32, u32)>,
}

impl PipelineKey {
    fn new(program: ProgramId, topology: Topology, state: &GlState) -> Self {
        let offset = match (state.polygon_offset_fill, state.polygon_offset) {
            (Some(true), Some((factor, units))) if topology == Topology::Triangles => {
                Some((factor.to_bits(), units.to_bits()))
            }
            _ => None,
        };
        Self {
            program,
            topology,
            blend: state.blend.unwrap_or(false),
            depth_test: state.depth_test.unwrap_or(false),
            cull_face: state.cull_face.unwrap_or(false),
            offset,
        }
    }
}

pub struct WgpuGpu {
    ctx: Context,
    bind_group_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    white: GpuTexture,
    buffers: HashMap<BufferId, GpuBuffer>,
    programs: HashMap<ProgramId, GpuProgram>,
    textures: HashMap<TextureId, GpuTexture>,
    framebuffers: HashMap<FrameBufferId, GpuFrameBuffer>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    bound: Option<ProgramId>,
    target: Option<FrameBufferId>,
    state: GlState,
    next_id: u32,
}

impl WgpuGpu {
    /// Takes over `ctx` and clears its target to `ctx.config.clear_colour`.
    pub fn new(ctx: Context) -> Self {
        let clear_colour = ctx.config.clear_colour;
        let bind_group_layout = mesh_bind_group_layout(&ctx.device);
        let texture_layout = texture_bind_group_layout(&ctx.device);
        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Mesh Pipeline Layout"),
                bind_group_layouts: &[Some(&bind_group_layout), Some(&texture_layout)],
                immediate_size: 0,
            });
        let white = GpuTexture::upload(&ctx, &texture_layout, &Texture2D::filled([1, 1], Color::WHITE));
        let mut gpu = Self {
            ctx,
            bind_group_layout,
            texture_layout,
            pipeline_layout,
            white,
            buffers: HashMap::new(),
            programs: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            pipelines: HashMap::new(),
            bound: None,
            target: None,
            state: GlState::initial(),
            next_id: 1,
        };
        gpu.clear(clear_colour);
        gpu
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn state(&self) -> &GlState {
        &self.state
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Copies the render target back into an image (a screenshot).
    pub async fn read_pixels(&self) -> anyhow::Result<image::RgbaImage> {
        let (width, height) = self.ctx.size();
        self.read_texture(&self.ctx.target, width, height).await
    }

    /// Copies the color attachment of `framebuffer` back into an image.
    pub async fn read_framebuffer(
        &self,
        framebuffer: FrameBufferId,
    ) -> anyhow::Result<image::RgbaImage> {
        let fbo = self
            .framebuffers
            .get(&framebuffer)
            .ok_or_else(|| anyhow::anyhow!("unknown framebuffer {:?}", framebuffer))?;
        let (width, height) = fbo.size;
        self.read_texture(&fbo.color, width, height).await
    }

    async fn read_texture(
        &self,
        texture: &wgpu::Texture,
        width: u32,
        height: u32,
    ) -> anyhow::Result<image::RgbaImage> {
        let unpadded = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let output_buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            size: (padded * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            label: Some("read_pixels buffer"),
            mapped_at_creation: false,
        });
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("read_pixels encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.queue.submit(iter::once(encoder.finish()));

        // NOTE: the mapping has to be requested before polling, otherwise the
        // receive below never resolves.
        let buffer_slice = output_buffer.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        self.ctx
            .device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(Duration::from_secs(3)),
            })
            .map_err(|e| anyhow::anyhow!("device poll failed: {:?}", e))?;
        rx.receive()
            .await
            .ok_or_else(|| anyhow::anyhow!("buffer mapping was cancelled"))??;

        let data = buffer_slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded * height) as usize);
        for row in data.chunks(padded as usize).take(height as usize) {
            pixels.extend_from_slice(&row[..unpadded as usize]);
        }
        drop(data);
        output_buffer.unmap();

        image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow::anyhow!("read back buffer has the wrong size"))
    }

    /// Color and depth views of the bound framebuffer or the context target.
    fn target_views(&self) -> Result<(&wgpu::TextureView, &wgpu::TextureView)> {
        match self.target {
            None => Ok((&self.ctx.target_view, &self.ctx.depth_texture.view)),
            Some(id) => self
                .framebuffers
                .get(&id)
                .map(|fbo| (&fbo.color_view, &fbo.depth.view))
                .ok_or_else(|| SceneError::Gpu(format!("unknown framebuffer {:?}", id))),
        }
    }

    fn pipeline(&mut self, program: ProgramId, topology: Topology) -> Result<PipelineKey> {
        let key = PipelineKey::new(program, topology, &self.state);
        if !self.pipelines.contains_key(&key) {
            let gpu_program = self
                .programs
                .get(&program)
                .ok_or_else(|| SceneError::Gpu(format!("unknown program {:?}", program)))?;
            let pipeline = mk_mesh_pipeline(
                &self.ctx.device,
                &self.pipeline_layout,
                self.ctx.config.format,
                &gpu_program.vertex_module,
                &gpu_program.fragment_module,
                topology,
                &self.state,
            );
            self.pipelines.insert(key, pipeline);
        }
        Ok(key)
    }
}

impl Gpu for WgpuGpu {
    fn create_buffer(&mut self, kind: BufferKind, _label: Option<&str>) -> BufferId {
        let id = BufferId::new(self.next_id());
        self.buffers.insert(
            id,
            GpuBuffer {
                kind,
                buffer: None,
                len: 0,
            },
        );
        id
    }

    fn set_data(&mut self, buffer: BufferId, data: BufferData<'_>) -> Result<()> {
        let entry = self
            .buffers
            .get_mut(&buffer)
            .ok_or_else(|| SceneError::Gpu(format!("unknown buffer {:?}", buffer)))?;
        if entry.kind != data.kind() {
            return Err(SceneError::TypeMismatch {
                slot: "buffer data",
                expected: match entry.kind {
                    BufferKind::Vertex => "vertex buffer",
                    BufferKind::Index => "index buffer",
                },
                actual: match data.kind() {
                    BufferKind::Vertex => "vertex buffer",
                    BufferKind::Index => "index buffer",
                },
            });
        }
        let (contents, usage, label): (&[u8], _, _) = match &data {
            BufferData::Vertices(v) => (
                bytemuck::cast_slice(v),
                wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                "Vertex Buffer",
            ),
            BufferData::Indices(i) => (
                bytemuck::cast_slice(i),
                wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                "Index Buffer",
            ),
        };
        entry.buffer = Some(
            self.ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents,
                    usage,
                }),
        );
        entry.len = data.len();
        Ok(())
    }

    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<ProgramId> {
        let device = &self.ctx.device;
        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Vertex Shader"),
            source: wgpu::ShaderSource::Wgsl(vertex_source.into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fragment Shader"),
            source: wgpu::ShaderSource::Wgsl(fragment_source.into()),
        });
        let uniforms = MeshUniforms::default();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("mesh_bind_group"),
        });

        let id = ProgramId::new(self.next_id());
        self.programs.insert(
            id,
            GpuProgram {
                vertex_module,
                fragment_module,
                uniforms,
                uniform_buffer,
                bind_group,
                texture: None,
            },
        );
        Ok(id)
    }

    fn bind(&mut self, program: ProgramId) -> Result<()> {
        if !self.programs.contains_key(&program) {
            return Err(SceneError::Gpu(format!("unknown program {:?}", program)));
        }
        self.bound = Some(program);
        Ok(())
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: Uniform) -> Result<()> {
        let gpu_program = self
            .programs
            .get_mut(&program)
            .ok_or_else(|| SceneError::Gpu(format!("unknown program {:?}", program)))?;
        match (name, value) {
            ("u_transform", Uniform::Mat4(m)) => gpu_program.uniforms.transform = m,
            ("u_color", Uniform::Vec4(c)) => gpu_program.uniforms.color = c,
            (name, value) => {
                return Err(SceneError::Gpu(format!(
                    "unsupported uniform {} = {:?}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    fn set_state(&mut self, state: &GlState) {
        self.state.merge(state);
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
        let key = self.pipeline(program, topology)?;

        let lookup = |id: &BufferId, kind: BufferKind| -> Result<(&wgpu::Buffer, usize)> {
            match self.buffers.get(id) {
                Some(GpuBuffer {
                    kind: k,
                    buffer: Some(buffer),
                    len,
                }) if *k == kind => Ok((buffer, *len)),
                Some(GpuBuffer { buffer: None, .. }) => {
                    Err(SceneError::Gpu(format!("buffer {:?} has no data", id)))
                }
                Some(_) => Err(SceneError::TypeMismatch {
                    slot: "draw buffer",
                    expected: match kind {
                        BufferKind::Vertex => "vertex buffer",
                        BufferKind::Index => "index buffer",
                    },
                    actual: "buffer of the other kind",
                }),
                None => Err(SceneError::Gpu(format!("unknown buffer {:?}", id))),
            }
        };
        let (vertex_buffer, _) = lookup(&vertices, BufferKind::Vertex)?;
        let (index_buffer, count) = lookup(&indices, BufferKind::Index)?;
        if count == 0 {
            return Ok(());
        }
        let gpu_program = self
            .programs
            .get(&program)
            .ok_or_else(|| SceneError::Gpu(format!("unknown program {:?}", program)))?;
        let pipeline = self
            .pipelines
            .get(&key)
            .ok_or_else(|| SceneError::Gpu("pipeline cache miss".to_string()))?;
        let texture_bind_group = match gpu_program.texture {
            None => &self.white.bind_group,
            Some(id) => {
                &self
                    .textures
                    .get(&id)
                    .ok_or_else(|| SceneError::Gpu(format!("unknown texture {:?}", id)))?
                    .bind_group
            }
        };
        let (color_view, depth_view) = self.target_views()?;

        self.ctx.queue.write_buffer(
            &gpu_program.uniform_buffer,
            0,
            bytemuck::cast_slice(&[gpu_program.uniforms]),
        );

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Draw Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Draw Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &gpu_program.bind_group, &[]);
            render_pass.set_bind_group(1, texture_bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..count as u32, 0, 0..1);
        }
        self.ctx.queue.submit(iter::once(encoder.finish()));
        trace!("submitted {:?} draw with {} indices", topology, count);
        Ok(())
    }

    fn current_state(&self) -> GlState {
        self.state
    }

    fn clear(&mut self, color: Color) {
        let (color_view, depth_view) = match self.target_views() {
            Ok(views) => views,
            Err(err) => {
                warn!("clear skipped: {}", err);
                return;
            }
        };
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clear Encoder"),
            });
        {
            let _render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color.into()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });
        }
        self.ctx.queue.submit(iter::once(encoder.finish()));
    }

    fn create_texture(&mut self, texture: &Texture2D) -> Result<TextureId> {
        let gpu_texture = GpuTexture::upload(&self.ctx, &self.texture_layout, texture);
        let id = TextureId::new(self.next_id());
        self.textures.insert(id, gpu_texture);
        Ok(id)
    }

    fn set_texture(&mut self, program: ProgramId, texture: Option<TextureId>) -> Result<()> {
        if let Some(texture) = texture {
            if !self.textures.contains_key(&texture) {
                return Err(SceneError::Gpu(format!("unknown texture {:?}", texture)));
            }
        }
        let gpu_program = self
            .programs
            .get_mut(&program)
            .ok_or_else(|| SceneError::Gpu(format!("unknown program {:?}", program)))?;
        gpu_program.texture = texture;
        Ok(())
    }

    fn create_framebuffer(&mut self, framebuffer: &FrameBuffer) -> Result<FrameBufferId> {
        let [height, width] = framebuffer.target_shape()?;
        let source = match framebuffer.color_buffer() {
            Some(Attachment::Texture(texture)) => texture.clone(),
            _ => Texture2D::empty(&[height, width, 4], None)?,
        };
        let color = source.create_gpu_texture(
            &self.ctx,
            self.ctx.config.format,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            Some("Framebuffer Color"),
        );
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let size = (width as u32, height as u32);
        let depth = DepthTexture::new(&self.ctx.device, [size.0, size.1], "framebuffer_depth");
        let id = FrameBufferId::new(self.next_id());
        self.framebuffers.insert(
            id,
            GpuFrameBuffer {
                color,
                color_view,
                depth,
                size,
            },
        );
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
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(GpuBuffer {
            buffer: Some(b), ..
        }) = self.buffers.remove(&buffer)
        {
            b.destroy();
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        self.pipelines.retain(|key, _| key.program != program);
        if self.bound == Some(program) {
            self.bound = None;
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(gpu_texture) = self.textures.remove(&texture) {
            gpu_texture.texture.destroy();
        }
    }

    fn delete_framebuffer(&mut self, framebuffer: FrameBufferId) {
        if let Some(fbo) = self.framebuffers.remove(&framebuffer) {
            fbo.color.destroy();
            fbo.depth.texture.destroy();
        }
        if self.target == Some(framebuffer) {
            self.target = None;
        }
    }
}
