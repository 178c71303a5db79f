use cgmath::{Matrix4, SquareMatrix};
use scene_ngin::{
    Color, Colormap, Node, SceneError, SceneNode,
    gloo::{GpuCommand, Interpolation, RecordingGpu},
    scene::{registry, visuals},
    visuals::{Clim, ImageConfig, ImageVisual, Visual, VisualConfig},
};

use crate::common::test_utils::init;

mod common;

fn texels(image: &ImageVisual) -> Vec<[u8; 4]> {
    image
        .mesh()
        .texture()
        .unwrap()
        .to_rgba8()
        .chunks_exact(4)
        .map(|px| [px[0], px[1], px[2], px[3]])
        .collect()
}

#[test]
fn should_map_scalar_data_through_auto_limits() {
    init();
    let image = ImageVisual::new(&ImageConfig::new(vec![0.0, 0.5, 1.0, 2.0], &[2, 2])).unwrap();

    assert_eq!(image.config().limits().unwrap(), (0.0, 2.0));
    assert_eq!(
        texels(&image),
        vec![
            [0, 0, 0, 255],
            [64, 64, 64, 255],
            [128, 128, 128, 255],
            [255, 255, 255, 255]
        ]
    );
}

#[test]
fn should_apply_colormap_and_fixed_limits() {
    let config = ImageConfig {
        cmap: Colormap::Linear(vec![Color::RED, Color::BLUE]),
        clim: Clim::Range(0.0, 1.0),
        ..ImageConfig::new(vec![0.5, 3.0, f32::NAN], &[1, 3])
    };

    let image = ImageVisual::new(&config).unwrap();

    assert_eq!(
        texels(&image),
        vec![[128, 0, 128, 255], [0, 0, 255, 255], [0, 0, 0, 0]]
    );
    assert_eq!("hot".parse::<Colormap>().unwrap().map(1.0), Color::WHITE);
    assert!("jet".parse::<Colormap>().is_err());
}

#[test]
fn should_scale_color_channels_and_keep_alpha() {
    let config = ImageConfig {
        clim: Clim::Range(0.0, 2.0),
        ..ImageConfig::new(vec![0.0, 1.0, 2.0, 0.5, 2.0, 2.0, 2.0, 1.0], &[1, 2, 4])
    };

    let image = ImageVisual::new(&config).unwrap();

    assert_eq!(texels(&image), vec![[0, 128, 255, 128], [255, 255, 255, 255]]);
}

#[test]
fn should_span_quad_over_image_pixels() {
    let image = ImageVisual::new(&ImageConfig::new(vec![0.0; 6], &[2, 3])).unwrap();
    let mesh = image.mesh();

    assert_eq!(image.shape(), [2, 3]);
    assert_eq!(mesh.indices(), &[0, 1, 2, 0, 2, 3]);
    assert_eq!(mesh.vertices()[2].position, [3.0, 2.0, 0.0]);
    assert_eq!(mesh.vertices()[2].texcoord, [1.0, 1.0]);
    assert_eq!(mesh.vertices()[0].texcoord, [0.0, 0.0]);
    assert!(mesh.vertices().iter().all(|v| v.color == [1.0; 4]));
}

#[test]
fn should_reject_invalid_image_data() {
    assert!(matches!(
        ImageVisual::new(&ImageConfig::new(vec![0.0; 5], &[2, 2])),
        Err(SceneError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        ImageVisual::new(&ImageConfig::new(vec![0.0; 5], &[1, 1, 5])),
        Err(SceneError::Format(_))
    ));
    assert!(matches!(
        ImageVisual::new(&ImageConfig::new(vec![], &[0, 3])),
        Err(SceneError::InvalidParameter { name: "data", .. })
    ));
    assert!(matches!(
        ImageVisual::new(&ImageConfig {
            clim: Clim::Range(f32::NAN, 1.0),
            ..Default::default()
        }),
        Err(SceneError::InvalidParameter { name: "clim", .. })
    ));
    assert!(matches!(
        ImageVisual::new(&ImageConfig {
            cmap: Colormap::Linear(vec![]),
            ..Default::default()
        }),
        Err(SceneError::InvalidParameter { name: "cmap", .. })
    ));
}

#[test]
fn should_upload_texture_with_mesh_and_sample_it() {
    let mut gpu = RecordingGpu::new();
    let mut image = ImageVisual::new(&ImageConfig::new(vec![0.0, 1.0], &[1, 2])).unwrap();

    image.draw(&mut gpu, &Matrix4::identity()).unwrap();

    assert!(gpu
        .commands()
        .iter()
        .any(|c| matches!(c, GpuCommand::CreateTexture { shape: [1, 2], .. })));
    let program = image.mesh().program().unwrap();
    let texture = gpu.texture_of(program);
    assert!(texture.is_some());
    assert!(matches!(
        gpu.draw_calls().last(),
        Some(GpuCommand::Draw { texture: t, target: None, .. }) if *t == texture
    ));

    image.release(&mut gpu);
    assert_eq!(gpu.live_textures(), 0);
    assert_eq!(gpu.live_buffers(), 0);
    assert_eq!(gpu.live_programs(), 0);
}

#[test]
fn should_replace_texture_when_data_changes() {
    let mut gpu = RecordingGpu::new();
    let mut image = ImageVisual::new(&ImageConfig::new(vec![0.0, 1.0], &[1, 2])).unwrap();
    image.draw(&mut gpu, &Matrix4::identity()).unwrap();

    assert!(image.set_data(vec![0.0; 3], &[2, 2]).is_err());
    assert_eq!(image.shape(), [1, 2]);

    image.set_data(vec![0.0, 0.25, 0.5, 1.0], &[2, 2]).unwrap();
    image.set_interpolation(Interpolation::Linear).unwrap();
    assert_eq!(image.shape(), [2, 2]);
    assert_eq!(
        image.mesh().texture().unwrap().interpolation(),
        Interpolation::Linear
    );
    assert_eq!(gpu.live_textures(), 1);

    image.draw(&mut gpu, &Matrix4::identity()).unwrap();
    assert_eq!(gpu.live_textures(), 1);
    assert_eq!(gpu.live_programs(), 1);
    assert!(gpu
        .commands()
        .iter()
        .any(|c| matches!(c, GpuCommand::CreateTexture { shape: [2, 2], .. })));
}

#[test]
fn should_create_images_through_registry_and_alias() {
    let root = Node::with_name("root");
    let config = ImageConfig::new(vec![1.0; 4], &[2, 2]);

    let dynamic = registry()
        .create("Image", &VisualConfig::Image(config.clone()), Some(&root), Some("dyn"))
        .unwrap();
    let typed = visuals::Image::new(&config, Some(&root), Some("typed")).unwrap();

    assert_eq!(dynamic.name().as_deref(), Some("dyn"));
    assert_eq!(typed.visual().shape(), [2, 2]);
    assert_eq!(root.children().len(), 2);
}
