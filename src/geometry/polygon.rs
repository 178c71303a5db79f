use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// A triangle fan around `vertices[0]` plus the border segments of the ring.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolygonGeometry {
    pub vertices: Vec<[f32; 3]>,
    pub filled: Vec<[u32; 3]>,
    pub outline: Vec<[u32; 2]>,
}

/// Builds a fan from `center` over the `ring` points.
///
/// A closed ring wraps the last point back to the first. An open ring (an arc)
/// gets its border closed through the center instead, like a pie slice.
pub fn polygon_fan(center: [f32; 3], ring: &[[f32; 3]], closed: bool) -> PolygonGeometry {
    let mut vertices = Vec::with_capacity(ring.len() + 1);
    vertices.push(center);
    vertices.extend_from_slice(ring);

    let n = ring.len() as u32;
    if n < 2 {
        return PolygonGeometry {
            vertices,
            ..Default::default()
        };
    }

    let mut filled = Vec::with_capacity(ring.len());
    let mut outline = Vec::with_capacity(ring.len() + 2);
    for i in 1..n {
        filled.push([0, i, i + 1]);
        outline.push([i, i + 1]);
    }
    if closed {
        filled.push([0, n, 1]);
        outline.push([n, 1]);
    } else {
        outline.push([n, 0]);
        outline.push([0, 1]);
    }

    PolygonGeometry {
        vertices,
        filled,
        outline,
    }
}

/// Points along an elliptic arc, counter-clockwise from `start_angle`
/// (degrees) over `span_angle` degrees. A full 360 degree span does not repeat
/// the first point.
pub fn ellipse_points(
    center: [f32; 3],
    radius: [f32; 2],
    start_angle: f32,
    span_angle: f32,
    num_segments: u32,
) -> Vec<[f32; 3]> {
    let full = span_angle.abs() >= 360.0;
    let start = start_angle.to_radians();
    let span = span_angle.to_radians();
    let count = if full { num_segments } else { num_segments + 1 };
    (0..count)
        .map(|i| {
            let theta = start + span * i as f32 / num_segments as f32;
            [
                center[0] + radius[0] * theta.cos(),
                center[1] + radius[1] * theta.sin(),
                center[2],
            ]
        })
        .collect()
}

/// Vertices of a regular polygon inscribed in a circle of `radius`, the first
/// vertex pointing up.
pub fn regular_polygon_points(center: [f32; 3], radius: f32, sides: u32) -> Vec<[f32; 3]> {
    (0..sides)
        .map(|i| {
            let theta = FRAC_PI_2 + TAU * i as f32 / sides as f32;
            [
                center[0] + radius * theta.cos(),
                center[1] + radius * theta.sin(),
                center[2],
            ]
        })
        .collect()
}

/// Counter-clockwise outline of a rectangle with rounded corners.
///
/// `radii` lists the corner radii clockwise from the top-left corner. A zero
/// radius yields a sharp corner (a single point).
pub fn rounded_rect_points(
    center: [f32; 3],
    width: f32,
    height: f32,
    radii: [f32; 4],
    segments_per_corner: u32,
) -> Vec<[f32; 3]> {
    let [top_left, top_right, bottom_right, bottom_left] = radii;
    let hw = width / 2.0;
    let hh = height / 2.0;
    // (corner center sign, radius, start angle), walked counter-clockwise
    let corners = [
        ([1.0, -1.0], bottom_right, -FRAC_PI_2),
        ([1.0, 1.0], top_right, 0.0),
        ([-1.0, 1.0], top_left, FRAC_PI_2),
        ([-1.0, -1.0], bottom_left, PI),
    ];

    let mut points = Vec::new();
    for ([sx, sy], r, start) in corners {
        let cx = center[0] + sx * (hw - r);
        let cy = center[1] + sy * (hh - r);
        if r <= 0.0 {
            points.push([cx, cy, center[2]]);
            continue;
        }
        for i in 0..=segments_per_corner {
            let theta = start + FRAC_PI_2 * i as f32 / segments_per_corner.max(1) as f32;
            points.push([cx + r * theta.cos(), cy + r * theta.sin(), center[2]]);
        }
    }
    points
}
