// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Projection of the input vertices onto the sweep plane.

use crate::error::{finite, InvalidInput, Result};
use crate::geom::{vert_l1_dist, Bounds, Point, Real};
use crate::mesh::Mesh;

fn dot(u: &[Real; 3], v: &[Real; 3]) -> Real {
    u[0] * v[0] + u[1] * v[1] + u[2] * v[2]
}

fn long_axis(v: &[Real; 3]) -> usize {
    let mut i = 0;
    if v[1].abs() > v[0].abs() {
        i = 1;
    }
    if v[2].abs() > v[i].abs() {
        i = 2;
    }
    i
}

fn short_axis(v: &[Real; 3]) -> usize {
    let mut i = 0;
    if v[1].abs() < v[0].abs() {
        i = 1;
    }
    if v[2].abs() < v[i].abs() {
        i = 2;
    }
    i
}

fn finite3(v: [Real; 3], what: &'static str) -> Result<[Real; 3]> {
    Ok([finite(v[0], what)?, finite(v[1], what)?, finite(v[2], what)?])
}

/// A normal for the plane of the input.
///
/// Takes the two vertices furthest apart along the widest axis and picks the
/// third vertex that spans the largest triangle with them. Coincident input
/// gets +z; collinear input gets the axis the line is shortest along.
pub(crate) fn compute_normal(mesh: &Mesh) -> Result<[Real; 3]> {
    let mut verts = mesh.vertices();
    let Some((_, first)) = verts.next() else {
        return Ok([0.0, 0.0, 1.0]);
    };

    let mut min_val = first.coords;
    let mut max_val = first.coords;
    let mut min_vert = [first.coords; 3];
    let mut max_vert = [first.coords; 3];
    for (_, v) in verts {
        for i in 0..3 {
            let c = v.coords[i];
            if c < min_val[i] {
                min_val[i] = c;
                min_vert[i] = v.coords;
            }
            if c > max_val[i] {
                max_val[i] = c;
                max_vert[i] = v.coords;
            }
        }
    }

    let extent = |i: usize| max_val[i] - min_val[i];
    let mut i = 0;
    if extent(1) > extent(0) {
        i = 1;
    }
    if extent(2) > extent(i) {
        i = 2;
    }
    if min_val[i] >= max_val[i] {
        return Ok([0.0, 0.0, 1.0]);
    }

    let v1 = min_vert[i];
    let v2 = max_vert[i];
    let d1 = finite3([v1[0] - v2[0], v1[1] - v2[1], v1[2] - v2[2]], "normal")?;
    let mut norm = [0.0; 3];
    let mut max_len2 = 0.0;
    for (_, v) in mesh.vertices() {
        let c = v.coords;
        let d2 = finite3([c[0] - v2[0], c[1] - v2[1], c[2] - v2[2]], "normal")?;
        let tn = finite3(
            [
                d1[1] * d2[2] - d1[2] * d2[1],
                d1[2] * d2[0] - d1[0] * d2[2],
                d1[0] * d2[1] - d1[1] * d2[0],
            ],
            "normal",
        )?;
        let len2 = finite(dot(&tn, &tn), "normal")?;
        if len2 > max_len2 {
            max_len2 = len2;
            norm = tn;
        }
    }

    if max_len2 <= 0.0 {
        norm = [0.0; 3];
        norm[short_axis(&d1)] = 1.0;
    }
    Ok(norm)
}

/// Flips t when the contours wind clockwise overall, so that the total
/// signed area of the positively wound faces is never negative.
pub(crate) fn check_orientation(mesh: &mut Mesh) -> Result<()> {
    let mut area: Real = 0.0;
    for (_, face) in mesh.faces() {
        let start = face.an_edge;
        if mesh.winding(start) <= 0 {
            continue;
        }
        let mut e = start;
        loop {
            let org = mesh.org_pos(e);
            let dst = mesh.dst_pos(e);
            area += (org.s - dst.s) * (org.t + dst.t);
            e = mesh.lnext(e);
            if e == start {
                break;
            }
        }
    }
    if finite(area, "orientation")? < 0.0 {
        for v in mesh.vertex_keys() {
            let pos = &mut mesh.vertex_mut(v).pos;
            pos.t = -pos.t;
        }
    }
    Ok(())
}

/// Projects every vertex onto the sweep plane and returns the bounds of the
/// projection, or `None` for an empty mesh.
///
/// The projection drops the dominant axis of `normal`. Without a usable
/// normal one is computed, and the orientation is then normalised with
/// [`check_orientation`].
pub(crate) fn project(mesh: &mut Mesh, normal: Option<[Real; 3]>) -> Result<Option<Bounds>> {
    let given = match normal {
        Some(n) if n.iter().any(|c| !c.is_finite()) => {
            return Err(InvalidInput::NonFiniteCoordinate.into());
        }
        Some(n) if n != [0.0; 3] => Some(n),
        _ => None,
    };
    let norm = match given {
        Some(n) => n,
        None => compute_normal(mesh)?,
    };

    let i = long_axis(&norm);
    let mut s_unit = [0.0; 3];
    let mut t_unit = [0.0; 3];
    s_unit[(i + 1) % 3] = 1.0;
    t_unit[(i + 2) % 3] = if norm[i] > 0.0 { 1.0 } else { -1.0 };

    for v in mesh.vertex_keys() {
        let vertex = mesh.vertex_mut(v);
        let s = finite(dot(&vertex.coords, &s_unit), "projection")?;
        let t = finite(dot(&vertex.coords, &t_unit), "projection")?;
        vertex.pos = Point::new(s, t);
    }

    if given.is_none() {
        check_orientation(mesh)?;
    }
    Ok(Bounds::enclosing(mesh.vertices().map(|(_, v)| v.pos)))
}

/// Coordinates for a vertex created where two edges cross.
///
/// `ends` holds the (position, coordinates) of the origin and destination of
/// the upper edge, then of the lower edge. Each edge contributes half of the
/// result, split between its endpoints in inverse proportion to their L1
/// distance from the crossing.
pub(crate) fn intersection_coords(isect: Point, ends: &[(Point, [Real; 3]); 4]) -> Result<[Real; 3]> {
    let mut coords = [0.0; 3];
    for edge in ends.chunks_exact(2) {
        let (org, dst) = (edge[0], edge[1]);
        let t1 = vert_l1_dist(org.0, isect)?;
        let t2 = vert_l1_dist(dst.0, isect)?;
        let total = finite(t1 + t2, "intersection weights")?;
        let (w_org, w_dst) = if total > 0.0 {
            (0.5 * t2 / total, 0.5 * t1 / total)
        } else {
            (0.25, 0.25)
        };
        for (k, c) in coords.iter_mut().enumerate() {
            *c += w_org * org.1[k] + w_dst * dst.1[k];
        }
    }
    finite3(coords, "intersection coordinates")
}
