use cgmath::{Deg, Matrix4, Point3, Quaternion, Rotation3, SquareMatrix, Vector3};
use scene_ngin::transforms::{Transform, Trs};

use crate::common::test_utils::assert_matrix_eq;

mod common;

#[test]
fn should_resolve_null_to_identity() {
    assert!(Transform::Null.is_identity());
    assert_matrix_eq(&Transform::default().matrix(), &Matrix4::identity());
}

#[test]
fn should_scale_before_translating() {
    let t = Transform::st([2.0, 3.0, 1.0], [1.0, 1.0, 0.0]);

    assert_eq!(t.map([1.0, 1.0, 0.0]), Point3::new(3.0, 4.0, 0.0));
    assert_eq!(t.origin(), Point3::new(1.0, 1.0, 0.0));
}

#[test]
fn should_keep_scale_translate_form_when_composing() {
    let a = Transform::st([2.0, 2.0, 2.0], [1.0, 0.0, 0.0]);
    let b = Transform::translate([0.0, 1.0, 0.0]);

    let composed = a * b;

    assert!(matches!(composed, Transform::St { .. }));
    assert_matrix_eq(&composed.matrix(), &(a.matrix() * b.matrix()));
}

#[test]
fn should_fall_back_to_affine_for_mixed_composition() {
    let trs = Transform::from(Trs {
        rotation: Quaternion::from_angle_z(Deg(90.0)),
        ..Trs::new()
    });
    let st = Transform::translate([1.0, 0.0, 0.0]);

    let composed = trs * st;

    assert!(matches!(composed, Transform::Affine(_)));
    let p = composed.map([0.0, 0.0, 0.0]);
    assert!((p.x - 0.0).abs() < 1e-5 && (p.y - 1.0).abs() < 1e-5);
}

#[test]
fn should_compose_rotated_non_uniform_trs_exactly() {
    let a = Trs {
        rotation: Quaternion::from_angle_z(Deg(90.0)),
        scale: Vector3::new(2.0, 1.0, 1.0),
        ..Trs::new()
    };
    let b = Trs {
        rotation: Quaternion::from_angle_z(Deg(45.0)),
        ..Trs::new()
    };

    let composed = Transform::from(a) * Transform::from(b);

    assert_matrix_eq(&composed.matrix(), &(a.to_matrix() * b.to_matrix()));
}

#[test]
fn should_treat_null_as_neutral_element() {
    let t = Transform::from(Matrix4::<f32>::from_translation(Vector3::new(1.0, 2.0, 3.0)));

    assert_eq!(Transform::Null * t, t);
    assert_eq!(t * Transform::Null, t);
}

#[test]
fn should_invert_and_report_singular_transforms() {
    let t = Transform::st([2.0, 4.0, 1.0], [1.0, 1.0, 1.0]);
    let inv = t.inverse().unwrap();

    assert_matrix_eq(&(t * inv).matrix(), &Matrix4::identity());
    assert!(Transform::scale([0.0, 1.0, 1.0]).inverse().is_none());
    assert!(Transform::from(Matrix4::<f32>::from_scale(0.0)).inverse().is_none());
}
