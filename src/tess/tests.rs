// Copyright 2025 Lars Brubaker
// Unit tests for the session internals.

use super::*;
use crate::bucketalloc::{BudgetAllocator, RecordKind};

const SQUARE: [Real; 8] = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];

#[test]
fn winding_rules_classify_numbers() {
    let inside = |rule: WindingRule| (-3..=3).filter(|&n| rule.is_inside(n)).collect::<Vec<_>>();
    assert_eq!(inside(WindingRule::Odd), vec![-3, -1, 1, 3]);
    assert_eq!(inside(WindingRule::NonZero), vec![-3, -2, -1, 1, 2, 3]);
    assert_eq!(inside(WindingRule::Positive), vec![1, 2, 3]);
    assert_eq!(inside(WindingRule::Negative), vec![-3, -2, -1]);
    assert_eq!(inside(WindingRule::AbsGeqTwo), vec![-3, -2, 2, 3]);
}

#[test]
fn triangles_force_poly_size_three() {
    let params = TessParams::default().with_poly_size(9).resolve().unwrap();
    assert_eq!(params.poly_size, 3);
}

#[test]
fn small_poly_size_is_rejected_for_polygons_only() {
    let polys = TessParams::default()
        .with_element_type(ElementType::Polygons)
        .with_poly_size(2);
    assert_eq!(polys.resolve(), Err(InvalidInput::PolygonSize(2).into()));
    let contours = polys.with_element_type(ElementType::BoundaryContours);
    assert!(contours.resolve().is_ok());
}

#[test]
fn vertex_size_must_be_two_or_three() {
    let params = TessParams::default().with_vertex_size(4);
    assert_eq!(params.resolve(), Err(InvalidInput::VertexSize(4).into()));
}

#[test]
fn default_cap_counts_edge_pairs() {
    assert_eq!(default_synthetic_cap(0, 0), 8);
    assert_eq!(default_synthetic_cap(4, 0), 6 + 8);
    assert_eq!(default_synthetic_cap(4, 100), 6 + 100);
    assert_eq!(default_synthetic_cap(usize::MAX, 0), usize::MAX);
}

#[test]
fn contour_check_catches_short_buffers() {
    assert_eq!(
        check_contour(2, 3, &[0.0; 7], 3),
        Err(InvalidInput::BufferTooShort { len: 7, count: 3 }.into())
    );
    assert!(check_contour(2, 3, &[0.0; 8], 3).is_ok());
    assert_eq!(
        check_contour(3, 2, &[0.0; 9], 3),
        Err(InvalidInput::Stride { stride: 2, size: 3 }.into())
    );
    assert!(check_contour(2, 2, &[], 0).is_ok());
}

#[test]
fn ingestion_numbers_vertices_across_contours() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &SQUARE).unwrap();
    tess.add_contour(2, &[5.0, 5.0, 6.0, 5.0, 6.0, 6.0]).unwrap();
    let mut sources: Vec<u32> = tess.mesh.vertices().filter_map(|(_, v)| v.source).collect();
    sources.sort_unstable();
    assert_eq!(sources, (0..7).collect::<Vec<_>>());
    assert_eq!(tess.input_edges, 7);
}

/// Winding of the half-edge running from input vertex `from` to `to`.
fn winding_between(mesh: &Mesh, from: u32, to: u32) -> Option<i32> {
    mesh.edge_keys()
        .into_iter()
        .flat_map(|e| [e, e.sym()])
        .find(|&h| {
            mesh.vertex(mesh.org(h)).source == Some(from) && mesh.vertex(mesh.dst(h)).source == Some(to)
        })
        .map(|h| mesh.winding(h))
}

#[test]
fn reverse_flag_is_consumed_by_one_contour() {
    let mut tess = Tessellator::new();
    tess.set_option(TessOption::ReverseContours, true);
    tess.add_contour(2, &SQUARE).unwrap();
    assert!(!tess.reverse_next);
    tess.add_contour(2, &[5.0, 5.0, 6.0, 5.0, 6.0, 6.0]).unwrap();

    assert_eq!(winding_between(&tess.mesh, 0, 1), Some(-1));
    assert_eq!(winding_between(&tess.mesh, 3, 0), Some(-1));
    assert_eq!(winding_between(&tess.mesh, 4, 5), Some(1));
    assert_eq!(winding_between(&tess.mesh, 6, 4), Some(1));
}

#[test]
fn pending_error_blocks_ingestion_until_reported() {
    let mut tess = Tessellator::new();
    let err = tess.add_contour(2, &[0.0, Real::NAN, 1.0, 1.0]).unwrap_err();
    assert_eq!(err, InvalidInput::NonFiniteCoordinate.into());
    assert_eq!(tess.status(), TessStatus::InvalidInput);
    assert!(tess.mesh.is_empty());

    assert_eq!(tess.add_contour(2, &SQUARE), Err(err));
    assert_eq!(tess.tessellate(&TessParams::default()).unwrap_err(), err);

    tess.add_contour(2, &SQUARE).unwrap();
    assert_eq!(tess.tessellate(&TessParams::default()).unwrap().element_count(), 2);
    assert_eq!(tess.status(), TessStatus::Ok);
}

#[test]
fn run_state_is_cleared_after_each_run() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &SQUARE).unwrap();
    tess.tessellate(&TessParams::default()).unwrap();
    assert!(tess.mesh.is_empty());
    assert_eq!(tess.next_source, 0);
    assert_eq!(tess.input_edges, 0);
    assert_eq!(tess.vertex_count(), 4);
}

#[test]
fn empty_session_gives_empty_output() {
    let mut tess = Tessellator::new();
    let out = tess.tessellate(&TessParams::default()).unwrap();
    assert_eq!(out.element_count(), 0);
    assert!(out.vertices().is_empty());
}

#[test]
fn out_of_memory_during_ingestion_is_held_back() {
    let alloc = BudgetAllocator::default().with_limit(RecordKind::Edge, 0);
    let mut tess = Tessellator::with_allocator(alloc);
    let err = tess.add_contour(2, &SQUARE).unwrap_err();
    assert_eq!(err, TessError::OutOfMemory(RecordKind::Edge));
    assert_eq!(tess.status(), TessStatus::OutOfMemory);
    assert_eq!(tess.tessellate(&TessParams::default()).unwrap_err(), err);
    assert!(tess.output().is_none());
}

#[test]
fn reset_forgets_everything() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &SQUARE).unwrap();
    tess.tessellate(&TessParams::default()).unwrap();
    tess.set_option(TessOption::ReverseContours, true);
    tess.add_contour(2, &[Real::INFINITY, 0.0]).unwrap_err();
    tess.reset();
    assert_eq!(tess.status(), TessStatus::Ok);
    assert!(tess.output().is_none());
    assert!(tess.elements().is_empty());
    assert!(!tess.reverse_next);
}
