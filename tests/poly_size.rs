// Copyright 2025 Lars Brubaker
// Tests for poly_size > 3 (quad output, hex output, etc.).

mod helpers;

use approx::assert_relative_eq;
use planar_tess::{ElementType, InvalidInput, TessError, TessParams, Tessellation, Tessellator, WindingRule};

fn tessellate_with_poly_size(vertices: &[f32], poly_size: usize) -> Tessellator {
    let mut tess = Tessellator::new();
    tess.add_contour(2, vertices).unwrap();
    let params = TessParams::default()
        .with_winding_rule(WindingRule::Positive)
        .with_element_type(ElementType::Polygons)
        .with_poly_size(poly_size);
    if let Err(err) = tess.tessellate(&params) {
        panic!("tessellation failed with poly_size={}: {}", poly_size, err);
    }
    tess
}

/// Asserts every polygon has between 3 and `poly_size` vertices and turns
/// left at every corner.
fn assert_convex_polygons(out: &Tessellation, poly_size: usize) {
    let mesh = out.polygons().unwrap();
    assert_eq!(mesh.elements.len(), mesh.len() * poly_size);
    for poly in mesh.polygons() {
        assert!((3..=poly_size).contains(&poly.len()), "bad polygon {:?}", poly);
        for k in 0..poly.len() {
            let a = out.vertices().position(poly[k] as usize);
            let b = out.vertices().position(poly[(k + 1) % poly.len()] as usize);
            let c = out.vertices().position(poly[(k + 2) % poly.len()] as usize);
            let turn = helpers::triangle_area(a[0], a[1], b[0], b[1], c[0], c[1]);
            assert!(turn >= -1e-6, "polygon {:?} is not convex", poly);
        }
    }
}

#[test]
fn poly_size_3_triangle() {
    let tess = tessellate_with_poly_size(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], 3);
    assert_eq!(tess.element_count(), 1);
}

#[test]
fn poly_size_4_quad() {
    let tess = tessellate_with_poly_size(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0], 4);
    assert_eq!(tess.element_count(), 1);
    assert_convex_polygons(tess.output().unwrap(), 4);
}

#[test]
fn poly_size_4_pentagon() {
    let tess = tessellate_with_poly_size(&helpers::regular_polygon(5, 0.0, 0.0, 1.0), 4);
    assert_eq!(tess.element_count(), 2);
    assert_convex_polygons(tess.output().unwrap(), 4);
    helpers::verify_valid_output(&tess);
}

#[test]
fn poly_size_6_hexagon_is_one_element() {
    let tess = tessellate_with_poly_size(&helpers::regular_polygon(6, 0.0, 0.0, 10.0), 6);
    assert_eq!(tess.element_count(), 1);
    assert_eq!(tess.elements().len(), 6);
    helpers::verify_valid_output(&tess);
}

#[test]
fn concave_shape_splits_into_convex_pieces() {
    // L-shape: the reflex corner at (1, 1) cannot sit inside one polygon.
    let l_shape = [0.0f32, 0.0, 2.0, 0.0, 2.0, 1.0, 1.0, 1.0, 1.0, 2.0, 0.0, 2.0];
    for poly_size in [4, 6, 8] {
        let tess = tessellate_with_poly_size(&l_shape, poly_size);
        let out = tess.output().unwrap();
        assert!(out.element_count() >= 2);
        assert_convex_polygons(out, poly_size);
        assert_relative_eq!(helpers::total_area(out), 3.0, epsilon = 1e-5);
    }
}

#[test]
fn poly_size_3_and_4_same_area() {
    let quad = [0.0f32, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0];
    let tess3 = tessellate_with_poly_size(&quad, 3);
    let tess4 = tessellate_with_poly_size(&quad, 4);
    let area3 = helpers::total_area(tess3.output().unwrap());
    let area4 = helpers::total_area(tess4.output().unwrap());
    assert_relative_eq!(area3, 100.0, epsilon = 1e-4);
    assert_relative_eq!(area4, area3, epsilon = 1e-4);
}

#[test]
fn poly_size_16_quad() {
    let tess = tessellate_with_poly_size(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0], 16);
    assert_eq!(tess.element_count(), 1);
    assert_eq!(tess.elements().len(), 16);
    helpers::verify_valid_output(&tess);
}

#[test]
fn poly_size_below_three_is_rejected() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]).unwrap();
    let params = TessParams::default()
        .with_element_type(ElementType::Polygons)
        .with_poly_size(2);
    assert_eq!(
        tess.tessellate(&params).unwrap_err(),
        TessError::InvalidInput(InvalidInput::PolygonSize(2))
    );
    // The contour was consumed by the failed run.
    let out = tess.tessellate(&params.with_poly_size(3)).unwrap();
    assert_eq!(out.element_count(), 0);
}
