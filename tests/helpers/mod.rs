// Copyright 2025 Lars Brubaker
// Shared test utilities for planar-tess tests.

#![allow(dead_code)]

use planar_tess::{ElementType, TessParams, Tessellation, Tessellator, WindingRule, TESS_UNDEF};

/// Installs a `tracing` subscriber filtered by `RUST_LOG`. Safe to call from
/// every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Triangle output with the given winding rule.
pub fn triangles(rule: WindingRule) -> TessParams {
    TessParams::default().with_winding_rule(rule)
}

/// Signed area of a triangle given 3 vertices (2D).
pub fn triangle_area(x0: f32, y0: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    0.5 * ((x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0))
}

/// Signed area of polygon `poly` of a 2D output, by fan from its first vertex.
pub fn polygon_area(out: &Tessellation, poly: &[u32]) -> f32 {
    let v = out.vertices();
    let p = |i: u32| {
        let xy = v.position(i as usize);
        (xy[0], xy[1])
    };
    let mut area = 0.0;
    for k in 1..poly.len().saturating_sub(1) {
        let (x0, y0) = p(poly[0]);
        let (x1, y1) = p(poly[k]);
        let (x2, y2) = p(poly[k + 1]);
        area += triangle_area(x0, y0, x1, y1, x2, y2);
    }
    area
}

/// Total signed area of all output polygons (2D).
pub fn total_signed_area(out: &Tessellation) -> f32 {
    match out.polygons() {
        Some(mesh) => mesh.polygons().map(|p| polygon_area(out, p)).sum(),
        None => 0.0,
    }
}

/// Total absolute area of all output polygons (2D).
pub fn total_area(out: &Tessellation) -> f32 {
    match out.polygons() {
        Some(mesh) => mesh.polygons().map(|p| polygon_area(out, p).abs()).sum(),
        None => 0.0,
    }
}

/// Checks that every output coordinate is finite and every element slot is
/// either a valid vertex index or `TESS_UNDEF`.
pub fn verify_valid_output(tess: &Tessellator) {
    let vert_count = tess.vertex_count();
    for (i, &v) in tess.vertices().iter().enumerate() {
        assert!(v.is_finite(), "vertex component [{}] = {} is not finite", i, v);
    }
    if let Some(Tessellation::Contours(c)) = tess.output() {
        for (first, count) in c.contours() {
            assert!(first + count <= vert_count, "contour ({}, {}) out of range", first, count);
        }
        return;
    }
    for (i, &idx) in tess.elements().iter().enumerate() {
        if idx == TESS_UNDEF {
            continue;
        }
        if let Some(Tessellation::ConnectedPolygons(m)) = tess.output() {
            // Neighbour slots index polygons, not vertices.
            if i % (2 * m.poly_size) >= m.poly_size {
                assert!((idx as usize) < m.len(), "neighbour[{}] = {} out of range", i, idx);
                continue;
            }
        }
        assert!(
            (idx as usize) < vert_count,
            "element[{}] = {} out of range (vertex_count={})",
            i,
            idx,
            vert_count
        );
    }
}

/// Asserts no output triangle has an area at or below `epsilon`.
pub fn verify_no_degenerate_triangles(out: &Tessellation, epsilon: f32) {
    let Some(tris) = out.triangles() else {
        return;
    };
    for (i, tri) in tris.enumerate() {
        let area = polygon_area(out, &tri).abs();
        assert!(area > epsilon, "triangle {} {:?} is degenerate (area={})", i, tri, area);
    }
}

/// Tessellates `contours` into triangles with `rule`, panicking on failure.
pub fn tessellate_contours(contours: &[Vec<f32>], rule: WindingRule) -> Tessellator {
    let mut tess = Tessellator::new();
    for contour in contours {
        tess.add_contour(2, contour).expect("contour accepted");
    }
    if let Err(err) = tess.tessellate(&triangles(rule)) {
        panic!("tessellation failed for winding rule {:?}: {}", rule, err);
    }
    tess
}

/// Like [`tessellate_contours`] for any element type.
pub fn tessellate_as(contours: &[Vec<f32>], rule: WindingRule, element_type: ElementType, poly_size: usize) -> Tessellator {
    let mut tess = Tessellator::new();
    for contour in contours {
        tess.add_contour(2, contour).expect("contour accepted");
    }
    let params = TessParams::default()
        .with_winding_rule(rule)
        .with_element_type(element_type)
        .with_poly_size(poly_size);
    if let Err(err) = tess.tessellate(&params) {
        panic!("tessellation failed: {}", err);
    }
    tess
}

/// Signed area of a simple polygon given as flat [x0,y0,x1,y1,...].
pub fn polygon_signed_area(verts: &[f32]) -> f32 {
    let n = verts.len() / 2;
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0f32;
    for i in 0..n {
        let j = (i + 1) % n;
        area += verts[i * 2] * verts[j * 2 + 1];
        area -= verts[j * 2] * verts[i * 2 + 1];
    }
    area * 0.5
}

/// Regular `n`-gon of radius `r` centred at `(cx, cy)`, counter-clockwise.
pub fn regular_polygon(n: usize, cx: f32, cy: f32, r: f32) -> Vec<f32> {
    (0..n)
        .flat_map(|i| {
            let a = std::f32::consts::TAU * i as f32 / n as f32;
            [cx + r * a.cos(), cy + r * a.sin()]
        })
        .collect()
}
