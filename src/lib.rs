// planar-tess: sweep-line polygon tessellation
// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)

pub mod bucketalloc;
pub mod dict;
pub mod error;
pub mod geom;
pub mod mesh;
pub mod priorityq;
pub mod sweep;
pub mod tess;

pub use bucketalloc::{AllocConfig, Allocator, BudgetAllocator, HeapAllocator, RecordKind, SharedAllocator};
pub use error::{InvalidInput, Result, TessError, TessStatus};
pub use geom::Real;
pub use tess::{
    ConnectedMesh, ContourSet, ElementType, PolygonMesh, TessOption, TessParams, Tessellation, Tessellator,
    VertexBuffer, WindingRule, TESS_UNDEF,
};
