use std::cell::Cell;

use cgmath::{Matrix4, SquareMatrix, Vector3};
use scene_ngin::{
    Color, Node, SceneError, SceneNode, SceneVisual, Transform,
    gloo::{GpuCommand, RecordingGpu, Uniform},
    scene::{VisualVariant, fuse, registry, visuals},
    visuals::{
        BoxConfig, BoxVisual, MeshConfig, MeshVisual, RectangleConfig, Visual, VisualConfig,
        VisualType,
    },
};

use crate::common::test_utils::{DrawLog, LoggedVisual, drawn_labels, init};

mod common;

fn assert_capability_union<T: SceneNode + Visual>(_: &T) {}

#[test]
fn should_register_every_shipped_visual() {
    init();
    let names: Vec<&str> = registry().names().collect();

    assert_eq!(names, vec!["Box", "Ellipse", "Image", "Mesh", "Rectangle", "RegularPolygon"]);
    let fused = registry().get("Box").unwrap();
    assert_eq!(fused.name(), "Box");
    assert_eq!(fused.visual_name(), "BoxVisual");
}

#[test]
fn should_merge_fused_descriptions() {
    for fused in registry().iter() {
        let sentence = format!("fuses visuals::{} with scene::Node", fused.visual_name());
        assert_eq!(fused.description().matches(&sentence).count(), 1, "{}", fused.name());
        assert!(fused.description().contains("parent : Node"));
        assert!(fused.description().contains("name : string"));
    }
}

#[test]
fn should_satisfy_node_and_visual_capabilities() {
    let cube = visuals::Box::new(&BoxConfig::default(), None, Some("cube")).unwrap();
    assert_capability_union(&cube);

    let dynamic = registry()
        .create("Mesh", &VisualConfig::Mesh(MeshConfig::new(vec![], vec![])), None, None)
        .unwrap();
    assert_capability_union(&dynamic);
}

#[test]
fn should_expose_name_to_visual_constructor() {
    let seen = Cell::new(None);
    let log = DrawLog::default();

    let logged = SceneVisual::build(None, Some("logged"), |name| {
        seen.set(name.map(str::to_owned));
        Ok(LoggedVisual::new("logged", &log))
    })
    .unwrap();

    assert_eq!(seen.take().as_deref(), Some("logged"));
    assert_eq!(logged.name().as_deref(), Some("logged"));
}

#[test]
fn should_attach_to_parent_at_construction() {
    let root = Node::with_name("root");

    let cube = visuals::Box::new(&BoxConfig::default(), Some(&root), Some("cube")).unwrap();

    assert_eq!(cube.parent(), Some(root.clone()));
    assert_eq!(root.children(), vec![cube.node().clone()]);
    assert_eq!(cube.to_string(), "<Box 'cube'>");
    assert!(cube.node().visual().is_some());
}

#[test]
fn should_not_create_node_when_visual_fails() {
    let root = Node::with_name("root");

    let err = visuals::Rectangle::new(
        &RectangleConfig {
            width: 0.0,
            ..Default::default()
        },
        Some(&root),
        Some("broken"),
    )
    .unwrap_err();

    assert!(matches!(err, SceneError::InvalidParameter { name: "width", .. }));
    assert!(root.children().is_empty());
}

#[test]
fn should_reject_configuration_of_another_variant() {
    let err = registry()
        .create("Box", &RectangleConfig::default().into(), None, None)
        .unwrap_err();

    assert_eq!(
        err,
        SceneError::TypeMismatch {
            slot: "visual configuration",
            expected: "BoxVisual",
            actual: "RectangleVisual"
        }
    );
}

#[test]
fn should_reject_unknown_type_names() {
    assert!(matches!(
        registry().create("Teapot", &BoxConfig::default().into(), None, None),
        Err(SceneError::InvalidParameter { .. })
    ));
}

#[test]
fn should_skip_base_and_misnamed_variants() {
    let base = VisualVariant {
        name: "Visual",
        ..VisualVariant::of::<MeshVisual>()
    };
    let misnamed = VisualVariant {
        name: "Teapot",
        ..VisualVariant::of::<MeshVisual>()
    };

    assert!(fuse(base).is_none());
    assert!(fuse(misnamed).is_none());
    let fused = fuse(VisualVariant::of::<BoxVisual>()).unwrap();
    assert_eq!(fused.name(), "Box");
    assert_eq!(fused.description(), registry().get("Box").unwrap().description());
}

#[test]
fn should_keep_original_description_when_merge_fails() {
    let variant = VisualVariant {
        description: "Summary.\n\nParameters\n----------\nx : int\n\tTabbed.",
        ..VisualVariant::of::<BoxVisual>()
    };

    let fused = fuse(variant).unwrap();

    assert_eq!(fused.description(), variant.description);
}

#[test]
fn should_apply_world_transform_when_drawn_directly() {
    let mut gpu = RecordingGpu::new();
    let root = Node::with_name("root");
    root.set_transform(Transform::translate([1.0, 2.0, 3.0]));
    let mut cube = visuals::Box::new(&BoxConfig::default(), Some(&root), None).unwrap();
    cube.set_transform(Transform::scale([2.0, 2.0, 2.0]));

    cube.draw(&mut gpu, &Matrix4::identity()).unwrap();

    let program = cube.visual().mesh().program().unwrap();
    let expected = Matrix4::<f32>::from_translation(Vector3::new(1.0, 2.0, 3.0)) * Matrix4::from_scale(2.0);
    assert_eq!(
        gpu.uniform(program, "u_transform"),
        Some(Uniform::from(expected))
    );
    assert!(gpu.draw_calls().all(|c| matches!(c, GpuCommand::Draw { .. })));
}

#[test]
fn should_give_typed_access_to_the_visual() {
    let mesh = visuals::Mesh::new(
        &MeshConfig::new(vec![[0.0; 3]; 3], vec![0, 1, 2]).with_color(Color::GREEN),
        None,
        Some("tri"),
    )
    .unwrap();

    assert_eq!(mesh.visual().vertices()[0].color, Color::GREEN.to_array());
    assert_eq!(mesh.type_name(), MeshVisual::NAME);
}

#[test]
fn should_draw_fused_visual_through_node() {
    let log = DrawLog::default();
    let root = Node::with_name("root");
    let mut logged = SceneVisual::build(Some(&root), Some("p"), |_| Ok(LoggedVisual::new("p", &log))).unwrap();
    let mut gpu = RecordingGpu::new();

    logged.draw(&mut gpu, &Matrix4::identity()).unwrap();

    assert_eq!(drawn_labels(&log), vec!["p"]);
}
