use scene_ngin::{
    Color, SceneError,
    gloo::{
        Attachment, BufferData, BufferKind, FrameBuffer, FrameBufferId, GlState, Gpu, GpuCommand,
        Interpolation, MeshVertex, ProgramId, RecordingGpu, RenderBuffer, Texture2D, Texture3D,
        TextureFormat, TextureId, Topology,
    },
};

#[test]
fn should_infer_texture_format_from_channels() {
    let gray = Texture2D::new(vec![0u8; 4 * 3], &[4, 3], None).unwrap();
    let rgb = Texture2D::new(vec![0u8; 4 * 3 * 3], &[4, 3, 3], None).unwrap();

    assert_eq!(gray.format(), TextureFormat::Luminance);
    assert_eq!(rgb.format(), TextureFormat::Rgb);
    assert_eq!(rgb.shape(), [4, 3]);
}

#[test]
fn should_reject_format_that_disagrees_with_shape() {
    let err = Texture2D::new(vec![0u8; 4 * 3 * 3], &[4, 3, 3], Some(TextureFormat::Rgba));

    assert!(matches!(err, Err(SceneError::Format(_))));
    assert!(matches!(
        Texture2D::empty(&[4, 3, 5], None),
        Err(SceneError::Format(_))
    ));
    assert!(matches!(
        Texture2D::empty(&[4], None),
        Err(SceneError::Format(_))
    ));
}

#[test]
fn should_reject_data_of_wrong_length() {
    let err = Texture2D::new(vec![0.0f32; 10], &[4, 3], None).unwrap_err();

    assert_eq!(
        err,
        SceneError::ShapeMismatch {
            what: "texture data",
            expected: 12,
            actual: 10
        }
    );

    let mut texture = Texture2D::empty(&[2, 2, 4], None).unwrap();
    assert!(texture.data().is_none());
    assert!(texture.set_data(vec![0u8; 15]).is_err());
    texture.set_data(vec![255u8; 16]).unwrap();
    assert_eq!(texture.to_rgba8(), vec![255u8; 16]);
}

#[test]
fn should_expand_luminance_to_rgba() {
    let texture = Texture2D::new(vec![0.0f32, 1.0], &[1, 2], None).unwrap();

    assert_eq!(texture.to_rgba8(), vec![0, 0, 0, 255, 255, 255, 255, 255]);
}

#[test]
fn should_convert_images() {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        3,
        2,
        image::Rgb([10, 20, 30]),
    ));

    let texture = Texture2D::from_image(&img);

    assert_eq!(texture.shape(), [2, 3]);
    assert_eq!(texture.format(), TextureFormat::Rgba);
    assert_eq!(&texture.to_rgba8()[..4], &[10, 20, 30, 255]);
}

#[test]
fn should_validate_3d_texture_rank() {
    let volume = Texture3D::new(vec![0u8; 2 * 3 * 4 * 2], &[2, 3, 4, 2]).unwrap();

    assert_eq!(volume.shape(), [2, 3, 4]);
    assert_eq!(volume.format(), TextureFormat::LuminanceAlpha);
    assert!(matches!(
        Texture3D::new(vec![0u8; 6], &[2, 3]),
        Err(SceneError::Format(_))
    ));
}

#[test]
fn should_accept_matching_framebuffer_attachments() {
    let color = Texture2D::empty(&[8, 8, 4], None).unwrap();
    let mut fbo = FrameBuffer::new(color).unwrap();

    fbo.set_depth_buffer(Some(RenderBuffer::depth([8, 8]).into())).unwrap();
    fbo.set_stencil_buffer(Some(RenderBuffer::stencil([8, 8]).into())).unwrap();

    assert_eq!(fbo.shape(), Some([8, 8]));
    assert!(fbo.depth_buffer().is_some());
    fbo.set_depth_buffer(None).unwrap();
    assert!(fbo.depth_buffer().is_none());
}

#[test]
fn should_reject_attachments_of_wrong_kind() {
    let mut fbo = FrameBuffer::new(RenderBuffer::color([4, 4])).unwrap();

    assert!(matches!(
        fbo.set_color_buffer(Some(RenderBuffer::depth([4, 4]).into())),
        Err(SceneError::TypeMismatch { slot: "color buffer", .. })
    ));
    assert!(matches!(
        fbo.set_depth_buffer(Some(Attachment::Program(ProgramId::new(1)))),
        Err(SceneError::TypeMismatch { .. })
    ));
    assert!(matches!(
        fbo.set_stencil_buffer(Some(RenderBuffer::depth([4, 4]).into())),
        Err(SceneError::TypeMismatch { slot: "stencil buffer", .. })
    ));
    assert!(matches!(
        fbo.set_depth_buffer(Some(RenderBuffer::depth([2, 2]).into())),
        Err(SceneError::ShapeMismatch { .. })
    ));
}

#[test]
fn should_merge_state_options() {
    let mut state = GlState::initial();

    state.merge(&GlState::polygon_offset(1.0, 1.0));
    state.merge(&GlState {
        blend: Some(true),
        ..Default::default()
    });

    assert_eq!(state.polygon_offset, Some((1.0, 1.0)));
    assert_eq!(state.polygon_offset_fill, Some(true));
    assert_eq!(state.blend, Some(true));
    assert_eq!(state.depth_test, Some(false));
}

#[test]
fn should_validate_handles_and_buffer_kinds() {
    let mut gpu = RecordingGpu::new();
    let vbo = gpu.create_buffer(BufferKind::Vertex, Some("v"));
    let ibo = gpu.create_buffer(BufferKind::Index, None);

    assert!(matches!(
        gpu.set_data(vbo, BufferData::Indices(&[0, 1, 2])),
        Err(SceneError::TypeMismatch { .. })
    ));
    gpu.set_data(
        vbo,
        BufferData::Vertices(&[MeshVertex {
            position: [0.0; 3],
            color: [1.0; 4],
            texcoord: [0.0; 2],
        }]),
    )
    .unwrap();
    gpu.set_data(ibo, BufferData::Indices(&[0, 0, 0])).unwrap();

    let program = gpu.create_program("vs", "fs").unwrap();
    assert!(matches!(
        gpu.draw(program, Topology::Triangles, vbo, ibo),
        Err(SceneError::Gpu(_))
    ));
    assert!(gpu.create_program("", "fs").is_err());
    assert!(gpu.bind(ProgramId::new(999)).is_err());

    gpu.bind(program).unwrap();
    gpu.draw(program, Topology::Triangles, vbo, ibo).unwrap();
    assert!(matches!(
        gpu.draw(program, Topology::Triangles, ibo, vbo),
        Err(SceneError::TypeMismatch { .. })
    ));
    assert!(matches!(
        gpu.commands().last(),
        Some(GpuCommand::Draw { count: 3, .. })
    ));
}

#[test]
fn should_track_clear_and_deletion() {
    let mut gpu = RecordingGpu::new();
    let buffer = gpu.create_buffer(BufferKind::Vertex, None);
    let program = gpu.create_program("vs", "fs").unwrap();
    gpu.bind(program).unwrap();

    gpu.clear(Color::WHITE);
    gpu.delete_buffer(buffer);
    gpu.delete_buffer(buffer);
    gpu.delete_program(program);

    let commands = gpu.take_commands();
    assert!(commands.contains(&GpuCommand::Clear(Color::WHITE)));
    assert_eq!(
        commands
            .iter()
            .filter(|c| matches!(c, GpuCommand::DeleteBuffer(_)))
            .count(),
        1
    );
    assert_eq!(gpu.live_buffers(), 0);
    assert!(gpu.commands().is_empty());
    assert!(gpu.draw(program, Topology::Lines, buffer, buffer).is_err());
}

#[test]
fn should_fill_texture_with_color() {
    let texture = Texture2D::filled([2, 3], Color::RED).with_interpolation(Interpolation::Linear);

    assert_eq!(texture.shape(), [2, 3]);
    assert_eq!(texture.format(), TextureFormat::Rgba);
    assert_eq!(texture.interpolation(), Interpolation::Linear);
    assert_eq!(texture.to_rgba8(), [255, 0, 0, 255].repeat(6));
}

#[test]
fn should_require_color_attachment_for_gpu_framebuffer() {
    let mut gpu = RecordingGpu::new();

    assert!(matches!(
        gpu.create_framebuffer(&FrameBuffer::default()),
        Err(SceneError::InvalidParameter { name: "framebuffer", .. })
    ));
    assert!(gpu
        .create_framebuffer(&FrameBuffer::new(RenderBuffer::color([0, 4])).unwrap())
        .is_err());
    assert_eq!(gpu.live_framebuffers(), 0);

    let fbo = gpu
        .create_framebuffer(&FrameBuffer::new(RenderBuffer::color([4, 8])).unwrap())
        .unwrap();
    assert!(gpu
        .commands()
        .contains(&GpuCommand::CreateFrameBuffer { framebuffer: fbo, shape: [4, 8] }));
}

#[test]
fn should_route_draws_into_bound_framebuffer() {
    let mut gpu = RecordingGpu::new();
    let fbo = gpu
        .create_framebuffer(&FrameBuffer::new(Texture2D::empty(&[4, 4, 4], None).unwrap()).unwrap())
        .unwrap();
    let vbo = gpu.create_buffer(BufferKind::Vertex, None);
    let ibo = gpu.create_buffer(BufferKind::Index, None);
    gpu.set_data(ibo, BufferData::Indices(&[0, 0, 0])).unwrap();
    let program = gpu.create_program("vs", "fs").unwrap();
    gpu.bind(program).unwrap();

    assert!(gpu.bind_framebuffer(Some(FrameBufferId::new(999))).is_err());
    gpu.bind_framebuffer(Some(fbo)).unwrap();
    gpu.draw(program, Topology::Triangles, vbo, ibo).unwrap();
    gpu.delete_framebuffer(fbo);
    gpu.draw(program, Topology::Triangles, vbo, ibo).unwrap();

    let targets: Vec<_> = gpu
        .draw_calls()
        .map(|c| match c {
            GpuCommand::Draw { target, .. } => *target,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(targets, vec![Some(fbo), None]);
    assert_eq!(gpu.target(), None);
    assert_eq!(gpu.live_framebuffers(), 0);
}

#[test]
fn should_validate_texture_handles() {
    let mut gpu = RecordingGpu::new();
    let program = gpu.create_program("vs", "fs").unwrap();
    let texture = gpu.create_texture(&Texture2D::filled([1, 1], Color::WHITE)).unwrap();

    assert!(gpu.set_texture(program, Some(TextureId::new(999))).is_err());
    assert!(gpu.set_texture(ProgramId::new(999), Some(texture)).is_err());
    gpu.set_texture(program, Some(texture)).unwrap();
    assert_eq!(gpu.texture_of(program), Some(texture));

    let vbo = gpu.create_buffer(BufferKind::Vertex, None);
    let ibo = gpu.create_buffer(BufferKind::Index, None);
    gpu.bind(program).unwrap();
    gpu.delete_texture(texture);
    assert_eq!(gpu.live_textures(), 0);
    assert!(gpu.draw(program, Topology::Triangles, vbo, ibo).is_err());

    gpu.set_texture(program, None).unwrap();
    gpu.draw(program, Topology::Triangles, vbo, ibo).unwrap();
}
