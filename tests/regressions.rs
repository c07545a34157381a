// Copyright 2025 Lars Brubaker
// Regression cases: allocator setup, degenerate contours and coordinates
// large enough to overflow the predicates.

mod helpers;

use planar_tess::{
    AllocConfig, BudgetAllocator, ElementType, InvalidInput, RecordKind, TessError, TessOption, TessParams,
    TessStatus, Tessellator, WindingRule,
};

// ---------------------------------------------------------------------------
// Helpers matching the upstream helper functions
// ---------------------------------------------------------------------------

/// Adds a polygon with a hole (outer CCW, inner CW via ReverseContours).
///
/// Expected tessellation: 8 triangles.
///
/// ```text
/// +aaaaaaaaaaaaaa+
/// a xx | xx | xx a
/// a----+bbbb+----a
/// a xx b oo b xx a
/// a----+bbbb+----a
/// a xx | xx | xx a
/// +aaaaaaaaaaaaaa+
/// ```
fn add_polygon_with_hole(tess: &mut Tessellator) {
    let outer_loop: &[f32] = &[0.0, 0.0, 3.0, 0.0, 3.0, 3.0, 0.0, 3.0];
    let inner_hole: &[f32] = &[1.0, 1.0, 2.0, 1.0, 2.0, 2.0, 1.0, 2.0];

    tess.set_option(TessOption::ReverseContours, false);
    tess.add_contour(2, outer_loop).unwrap();
    tess.set_option(TessOption::ReverseContours, true);
    tess.add_contour(2, inner_hole).unwrap();
}

fn positive_triangles() -> TessParams {
    TessParams::default()
        .with_winding_rule(WindingRule::Positive)
        .with_element_type(ElementType::Polygons)
        .with_poly_size(3)
}

fn tessellate_positive_triangles(tess: &mut Tessellator) -> Result<usize, TessError> {
    helpers::init_tracing();
    tess.tessellate(&positive_triangles()).map(|out| out.element_count())
}

/// Hostile input may be rejected, but only as invalid input, and the
/// session must stay usable afterwards.
fn assert_fails_gracefully(tess: &mut Tessellator, result: Result<usize, TessError>) {
    if let Err(err) = result {
        assert!(matches!(err, TessError::InvalidInput(_)), "unexpected error {err}");
        assert_eq!(tess.status(), TessStatus::InvalidInput);
    }
    tess.add_contour(2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]).unwrap();
    assert_eq!(tessellate_positive_triangles(tess), Ok(1));
}

// ---------------------------------------------------------------------------
// Regression cases
// ---------------------------------------------------------------------------

/// DefaultAllocSuccess: polygon with hole -> 8 triangles
#[test]
fn default_alloc_success() {
    let mut tess = Tessellator::new();
    add_polygon_with_hole(&mut tess);
    assert_eq!(tessellate_positive_triangles(&mut tess), Ok(8));
}

/// CustomAllocSuccess: same geometry through a caller-supplied allocator
/// with tiny buckets.
#[test]
fn custom_alloc_success() {
    let config = AllocConfig {
        vertex_bucket_size: 4,
        edge_bucket_size: 4,
        face_bucket_size: 2,
        dict_node_bucket_size: 4,
        region_bucket_size: 2,
        extra_vertices: 256,
    };
    let mut tess = Tessellator::with_allocator(BudgetAllocator::new(config).with_limit(RecordKind::Vertex, 1024));
    add_polygon_with_hole(&mut tess);
    assert_eq!(tessellate_positive_triangles(&mut tess), Ok(8));
}

/// EmptyPolyline: empty contour -> success, 0 elements
#[test]
fn empty_polyline() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[]).unwrap();
    assert_eq!(tessellate_positive_triangles(&mut tess), Ok(0));
}

/// SingleLine: 2-vertex degenerate -> success, 0 elements
#[test]
fn single_line() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[0.0, 0.0, 0.0, 1.0]).unwrap();
    assert_eq!(tessellate_positive_triangles(&mut tess), Ok(0));
}

/// SingleTriangle: 3 vertices -> 1 triangle
#[test]
fn single_triangle() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0]).unwrap();
    assert_eq!(tessellate_positive_triangles(&mut tess), Ok(1));
}

/// UnitQuad: 4 vertices -> 2 triangles
#[test]
fn unit_quad() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0]).unwrap();
    assert_eq!(tessellate_positive_triangles(&mut tess), Ok(2));
}

/// GetStatusInvalidInput: a quad spanning the whole f32 range overflows the
/// normal computation.
#[test]
fn get_status_invalid_input() {
    let (min, max) = (f32::MIN, f32::MAX);
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[min, min, min, max, max, max, max, min]).unwrap();
    let err = tessellate_positive_triangles(&mut tess).unwrap_err();
    assert!(matches!(err, TessError::InvalidInput(InvalidInput::PredicateOverflow(_))));
    assert_eq!(tess.status(), TessStatus::InvalidInput);
}

/// GetStatusOk: successful tessellation -> Ok status
#[test]
fn get_status_ok() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0]).unwrap();
    assert!(tessellate_positive_triangles(&mut tess).is_ok());
    assert_eq!(tess.status(), TessStatus::Ok);
}

/// FloatOverflowQuad: f32::MIN/MAX coordinates are rejected, not panicked on.
#[test]
fn float_overflow_quad() {
    let min = f32::MIN;
    let max = f32::MAX;
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[min, min, min, max, max, max, max, min]).unwrap();
    let result = tessellate_positive_triangles(&mut tess);
    assert!(result.is_err());
    assert_fails_gracefully(&mut tess, result);
}

/// SingularityQuad: all vertices at origin -> success, 0 elements
#[test]
fn singularity_quad() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
    assert_eq!(tessellate_positive_triangles(&mut tess), Ok(0));
}

/// DegenerateQuad: near-giant triangle with an extra sliver
#[test]
fn degenerate_quad() {
    let mut tess = Tessellator::new();
    tess.add_contour(
        2,
        &[
            0.0f32,
            3.40282347e+38f32,
            0.64113313f32,
            -1.0f32,
            -0.0f32,
            -0.0f32,
            -3.40282347e+38f32,
            1.0f32,
        ],
    )
    .unwrap();
    let result = tessellate_positive_triangles(&mut tess);
    assert!(result.is_err());
    assert_fails_gracefully(&mut tess, result);
}

/// WidthOverflowsTri: extremely wide triangle
#[test]
fn width_overflows_tri() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[-2e38f32, 0.0, 0.0, 0.0, 2e38f32, -1.0]).unwrap();
    let result = tessellate_positive_triangles(&mut tess);
    assert_fails_gracefully(&mut tess, result);
}

/// HeightOverflowsTri: extremely tall triangle
#[test]
fn height_overflows_tri() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[0.0, 0.0, 0.0, 2e38f32, -1.0, -2e38f32]).unwrap();
    let result = tessellate_positive_triangles(&mut tess);
    assert_fails_gracefully(&mut tess, result);
}

/// AreaOverflowsTri: large area triangle
#[test]
fn area_overflows_tri() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[-2e37f32, 0.0, 0.0, 5.0, 1e37f32, -5.0]).unwrap();
    let result = tessellate_positive_triangles(&mut tess);
    assert_fails_gracefully(&mut tess, result);
}

/// NanQuad: NaN vertices are rejected when the contour is added.
#[test]
fn nan_quad() {
    let nan = f32::NAN;
    let mut tess = Tessellator::new();
    let err = tess.add_contour(2, &[nan, nan, nan, nan, nan, nan, nan, nan]).unwrap_err();
    assert_eq!(err, TessError::InvalidInput(InvalidInput::NonFiniteCoordinate));
    let result = tessellate_positive_triangles(&mut tess);
    assert_eq!(result, Err(err));
    assert_eq!(tess.element_count(), 0);
    assert_fails_gracefully(&mut tess, result);
}

/// AvoidsCrashWhileFindingIntersection: complex mixed contour, no crash
#[test]
fn avoids_crash_while_finding_intersection() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[
        -1.0f32, 0.0f32,
        0.868218958f32, 0.0f32,
        0.902460039f32, 0.0649746507f32,
        -0.0f32, 0.854620099f32,
        -1.0f32, 0.784999669f32,
        0.0f32, 0.0f32,
        -1.0f32, 1.0f32,
        1.0f32, 1.0f32,
        0.0f32, -1.0f32,
        3.40282347e+38f32, 3.40282347e+38f32,
        -1.0f32, -1.0f32,
        -0.0f32, 0.442898333f32,
        0.33078745f32, -0.0f32,
        -0.0f32, 1.0f32,
        -1.0f32, 0.0f32,
        1.0f32, -0.0f32,
        0.0f32, 0.186138511f32,
        0.212649569f32, 0.886535764f32,
        1.0f32, 0.34795785f32,
        0.0f32, 0.788870096f32,
        0.853441715f32, -1.0f32,
        -1.0f32, 1.0f32,
        1.0f32, -0.994903505f32,
        1.0f32, 0.105880626f32,
        3.40282347e+38f32, 3.40282347e+38f32,
        -1.0f32, 3.40282347e+38f32,
        -0.0f32, 0.34419331f32,
        1.0f32, 1.0f32,
    ])
    .unwrap();
    let result = tessellate_positive_triangles(&mut tess);
    assert_fails_gracefully(&mut tess, result);
}

/// AvoidsCrashInAddRightEdges: another complex mixed contour, no crash
#[test]
fn avoids_crash_in_add_right_edges() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[
        -0.5f32, 1.0f32,
        3.40282347e+38f32, 0.0f32,
        0.349171013f32, 1.0f32,
        1.0f32, 0.0f32,
        1.0f32, -0.0f32,
        0.594775498f32, -0.0f32,
        0.0f32, -0.0f32,
        -0.0f32, 1.0f32,
        0.0f32, 1.0f32,
        2.20929384f32, 1.0f32,
        1.0f32, 1.0f32,
        -0.0f32, -0.0f32,
        3.40282347e+38f32, -0.0f32,
        -1.0f32, 0.0f32,
        1.70141173e+38f32, 0.391036272f32,
        3.40282347e+38f32, 0.371295959f32,
        3.40282347e+38f32, -0.0f32,
        0.0f32, 0.234747186f32,
        -1.0f32, 1.0f32,
        -1.0f32, -0.0f32,
        3.40282347e+38f32, 1.0f32,
        -0.0f32, -0.0f32,
        3.40282347e+38f32, 1.0f32,
        0.434241712f32, 0.0f32,
        1.0f32, 0.211511821f32,
        3.40282347e+38f32, 1.0f32,
    ])
    .unwrap();
    let result = tessellate_positive_triangles(&mut tess);
    assert_fails_gracefully(&mut tess, result);
}
