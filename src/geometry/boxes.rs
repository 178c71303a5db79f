use std::str::FromStr;

use crate::{
    error::{Result, SceneError},
    geometry::GeometryVertex,
};

/// One of the six axis-aligned faces of a box, named by its outward normal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Plane {
    NegX,
    PosX,
    NegY,
    PosY,
    NegZ,
    PosZ,
}

impl Plane {
    pub const ALL: [Plane; 6] = [
        Plane::NegX,
        Plane::PosX,
        Plane::NegY,
        Plane::PosY,
        Plane::NegZ,
        Plane::PosZ,
    ];

    /// `(u, v, normal)` axis indices with `u x v` pointing along the outward
    /// normal, so that the generated triangles wind counter-clockwise when
    /// seen from outside.
    fn axes(self) -> (usize, usize, usize) {
        match self {
            Plane::PosX => (1, 2, 0),
            Plane::NegX => (2, 1, 0),
            Plane::PosY => (2, 0, 1),
            Plane::NegY => (0, 2, 1),
            Plane::PosZ => (0, 1, 2),
            Plane::NegZ => (1, 0, 2),
        }
    }

    fn sign(self) -> f32 {
        match self {
            Plane::NegX | Plane::NegY | Plane::NegZ => -1.0,
            Plane::PosX | Plane::PosY | Plane::PosZ => 1.0,
        }
    }
}

impl FromStr for Plane {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "-x" => Ok(Plane::NegX),
            "+x" => Ok(Plane::PosX),
            "-y" => Ok(Plane::NegY),
            "+y" => Ok(Plane::PosY),
            "-z" => Ok(Plane::NegZ),
            "+z" => Ok(Plane::PosZ),
            other => Err(SceneError::invalid(
                "planes",
                format!("expected one of -x +x -y +y -z +z, got {:?}", other),
            )),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BoxGeometry {
    pub vertices: Vec<GeometryVertex>,
    /// Triangles for the filled faces.
    pub filled: Vec<[u32; 3]>,
    /// Line segments along the grid of every face.
    pub outline: Vec<[u32; 2]>,
}

/// Builds a `u_size` x `v_size` grid lying in `plane`, offset along its normal
/// by `offset`.
pub fn create_plane(
    u_size: f32,
    v_size: f32,
    u_segments: u32,
    v_segments: u32,
    plane: Plane,
    offset: f32,
) -> Result<BoxGeometry> {
    if u_segments == 0 || v_segments == 0 {
        return Err(SceneError::invalid("segments", "segment counts must be >= 1"));
    }
    let (u_axis, v_axis, n_axis) = plane.axes();
    let sign = plane.sign();
    let u_grid = u_segments + 1;
    let v_grid = v_segments + 1;

    let mut normal = [0.0; 3];
    normal[n_axis] = sign;

    let mut vertices = Vec::with_capacity((u_grid * v_grid) as usize);
    for iv in 0..v_grid {
        for iu in 0..u_grid {
            let s = iu as f32 / u_segments as f32;
            let t = iv as f32 / v_segments as f32;
            let mut position = [0.0; 3];
            position[u_axis] = s * u_size - u_size / 2.0;
            position[v_axis] = t * v_size - v_size / 2.0;
            position[n_axis] = offset;
            vertices.push(GeometryVertex {
                position,
                normal,
                texcoord: [s, 1.0 - t],
                color: [0.0; 4],
            });
        }
    }

    let mut filled = Vec::with_capacity((u_segments * v_segments * 2) as usize);
    let mut outline = Vec::with_capacity((u_segments * v_segments * 4) as usize);
    for iv in 0..v_segments {
        for iu in 0..u_segments {
            let a = iu + u_grid * iv;
            let b = iu + u_grid * (iv + 1);
            let c = (iu + 1) + u_grid * (iv + 1);
            let d = (iu + 1) + u_grid * iv;
            filled.push([a, d, b]);
            filled.push([d, c, b]);
            outline.extend([[a, b], [b, c], [c, d], [d, a]]);
        }
    }

    Ok(BoxGeometry {
        vertices,
        filled,
        outline,
    })
}

/// Builds an axis-aligned box centered on the origin: `width` along x,
/// `height` along y, `depth` along z. `planes` restricts the faces that are
/// generated; `None` means all six.
///
/// Vertex colors encode the position inside the unit cube, which makes the
/// orientation visible without lighting.
pub fn create_box(
    width: f32,
    height: f32,
    depth: f32,
    width_segments: u32,
    height_segments: u32,
    depth_segments: u32,
    planes: Option<&[Plane]>,
) -> Result<BoxGeometry> {
    let size = [width, height, depth];
    let segments = [width_segments, height_segments, depth_segments];
    let planes = planes.unwrap_or(&Plane::ALL);

    let mut geometry = BoxGeometry::default();
    for plane in Plane::ALL.iter().filter(|p| planes.contains(p)) {
        let (u_axis, v_axis, n_axis) = plane.axes();
        let face = create_plane(
            size[u_axis],
            size[v_axis],
            segments[u_axis],
            segments[v_axis],
            *plane,
            plane.sign() * size[n_axis] / 2.0,
        )?;
        let base = geometry.vertices.len() as u32;
        geometry.filled.extend(
            face.filled
                .iter()
                .map(|[a, b, c]| [a + base, b + base, c + base]),
        );
        geometry
            .outline
            .extend(face.outline.iter().map(|[a, b]| [a + base, b + base]));
        geometry.vertices.extend(face.vertices);
    }

    for v in geometry.vertices.iter_mut() {
        let p = v.position;
        let channel = |axis: usize| {
            if size[axis] == 0.0 {
                0.5
            } else {
                p[axis] / size[axis] + 0.5
            }
        };
        v.color = [channel(0), channel(1), channel(2), 1.0];
    }

    Ok(geometry)
}
