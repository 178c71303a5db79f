//! Local transforms carried by scene nodes.
//!
//! Every variant resolves to a 4x4 column-major matrix through
//! [`Transform::matrix`]. Composition with `*` keeps the cheap parametrized form
//! when both operands allow it and falls back to a plain affine matrix
//! otherwise.

use std::ops::Mul;

use cgmath::{EuclideanSpace, One, Point3, SquareMatrix, Transform as _, Vector3};

/// Translation, rotation (as quaternion) and scale, applied scale first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trs {
    pub position: Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Trs {
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Trs {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Transform {
    /// Identity.
    #[default]
    Null,
    /// Per-axis scale followed by a translation.
    St {
        scale: Vector3<f32>,
        translate: Vector3<f32>,
    },
    Trs(Trs),
    Affine(cgmath::Matrix4<f32>),
}

impl Transform {
    pub fn st(scale: impl Into<Vector3<f32>>, translate: impl Into<Vector3<f32>>) -> Self {
        Transform::St {
            scale: scale.into(),
            translate: translate.into(),
        }
    }

    pub fn translate(offset: impl Into<Vector3<f32>>) -> Self {
        Self::st([1.0, 1.0, 1.0], offset)
    }

    pub fn scale(factors: impl Into<Vector3<f32>>) -> Self {
        Self::st(factors, [0.0, 0.0, 0.0])
    }

    pub fn matrix(&self) -> cgmath::Matrix4<f32> {
        match self {
            Transform::Null => cgmath::Matrix4::identity(),
            Transform::St { scale, translate } => {
                cgmath::Matrix4::from_translation(*translate)
                    * cgmath::Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z)
            }
            Transform::Trs(trs) => trs.to_matrix(),
            Transform::Affine(m) => *m,
        }
    }

    pub fn is_identity(&self) -> bool {
        match self {
            Transform::Null => true,
            other => other.matrix() == cgmath::Matrix4::identity(),
        }
    }

    /// Maps a point through this transform.
    pub fn map(&self, point: impl Into<Point3<f32>>) -> Point3<f32> {
        self.matrix().transform_point(point.into())
    }

    /// `None` when the transform is singular (e.g. a zero scale).
    pub fn inverse(&self) -> Option<Transform> {
        match self {
            Transform::Null => Some(Transform::Null),
            Transform::St { scale, translate } => {
                if scale.x == 0.0 || scale.y == 0.0 || scale.z == 0.0 {
                    return None;
                }
                let inv = Vector3::new(1.0 / scale.x, 1.0 / scale.y, 1.0 / scale.z);
                Some(Transform::St {
                    scale: inv,
                    translate: Vector3::new(
                        -translate.x * inv.x,
                        -translate.y * inv.y,
                        -translate.z * inv.z,
                    ),
                })
            }
            other => other.matrix().invert().map(Transform::Affine),
        }
    }

    /// Center of the local frame expressed in the parent frame.
    pub fn origin(&self) -> Point3<f32> {
        self.map(Point3::origin())
    }
}

impl From<cgmath::Matrix4<f32>> for Transform {
    fn from(m: cgmath::Matrix4<f32>) -> Self {
        Transform::Affine(m)
    }
}

impl From<Trs> for Transform {
    fn from(trs: Trs) -> Self {
        Transform::Trs(trs)
    }
}

impl<'a, 'b> Mul<&'b Transform> for &'a Transform {
    type Output = Transform;

    /// `a * b` applies `b` first, then `a`.
    fn mul(self, rhs: &'b Transform) -> Self::Output {
        match (self, rhs) {
            (Transform::Null, other) | (other, Transform::Null) => *other,
            (
                Transform::St {
                    scale: s1,
                    translate: t1,
                },
                Transform::St {
                    scale: s2,
                    translate: t2,
                },
            ) => Transform::St {
                scale: Vector3::new(s1.x * s2.x, s1.y * s2.y, s1.z * s2.z),
                translate: Vector3::new(
                    s1.x * t2.x + t1.x,
                    s1.y * t2.y + t1.y,
                    s1.z * t2.z + t1.z,
                ),
            },
            (a, b) => Transform::Affine(a.matrix() * b.matrix()),
        }
    }
}

impl Mul<Transform> for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Self::Output {
        &self * &rhs
    }
}
