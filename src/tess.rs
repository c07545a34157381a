// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// The tessellation session: contour ingestion, run parameters and results.
//
// A `Tessellator` collects contours into a half-edge mesh, then `tessellate`
// projects the mesh onto a plane, sweeps it to find the interior, and reads
// the requested output off the result. The mesh is cleared after every run,
// successful or not, so the session is ready for new contours right away.

pub(crate) mod geometry;
mod output;

#[cfg(test)]
mod tests;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::bucketalloc::{AllocConfig, Allocator, HeapAllocator, SharedAllocator};
use crate::error::{InvalidInput, Result, TessError, TessStatus};
use crate::geom::Real;
use crate::mesh::{HalfEdgeId, Mesh};
use crate::sweep::{self, SweepParams};

pub use output::{ConnectedMesh, ContourSet, PolygonMesh, Tessellation, VertexBuffer};

/// Marks an unused polygon slot, a missing neighbour, or an output vertex
/// that does not come from the input.
pub const TESS_UNDEF: u32 = u32::MAX;

/// Which winding numbers count as inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindingRule {
    #[default]
    Odd,
    NonZero,
    Positive,
    Negative,
    AbsGeqTwo,
}

impl WindingRule {
    pub fn is_inside(self, n: i32) -> bool {
        match self {
            WindingRule::Odd => n & 1 != 0,
            WindingRule::NonZero => n != 0,
            WindingRule::Positive => n > 0,
            WindingRule::Negative => n < 0,
            WindingRule::AbsGeqTwo => n >= 2 || n <= -2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementType {
    #[default]
    Triangles,
    Polygons,
    ConnectedPolygons,
    BoundaryContours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TessOption {
    /// Adds the next contour with its orientation reversed.
    ReverseContours,
}

/// Parameters of one tessellation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessParams {
    pub winding_rule: WindingRule,
    pub element_type: ElementType,
    /// Maximum vertices per output polygon. Forced to 3 for triangles.
    pub poly_size: usize,
    /// Coordinates per output vertex, 2 or 3.
    pub vertex_size: usize,
    /// Plane normal. `None` or the zero vector means "compute one".
    pub normal: Option<[Real; 3]>,
    /// Cap on vertices created at intersections. Defaults to one per pair of
    /// input edges plus some headroom.
    pub max_synthetic_vertices: Option<usize>,
}

impl Default for TessParams {
    fn default() -> Self {
        Self {
            winding_rule: WindingRule::Odd,
            element_type: ElementType::Triangles,
            poly_size: 3,
            vertex_size: 2,
            normal: None,
            max_synthetic_vertices: None,
        }
    }
}

impl TessParams {
    #[must_use]
    pub fn with_winding_rule(mut self, rule: WindingRule) -> Self {
        self.winding_rule = rule;
        self
    }

    #[must_use]
    pub fn with_element_type(mut self, element_type: ElementType) -> Self {
        self.element_type = element_type;
        self
    }

    #[must_use]
    pub fn with_poly_size(mut self, poly_size: usize) -> Self {
        self.poly_size = poly_size;
        self
    }

    #[must_use]
    pub fn with_vertex_size(mut self, vertex_size: usize) -> Self {
        self.vertex_size = vertex_size;
        self
    }

    #[must_use]
    pub fn with_normal(mut self, normal: [Real; 3]) -> Self {
        self.normal = Some(normal);
        self
    }

    #[must_use]
    pub fn with_max_synthetic_vertices(mut self, cap: usize) -> Self {
        self.max_synthetic_vertices = Some(cap);
        self
    }

    /// Checks the parameters and settles the polygon size.
    fn resolve(&self) -> Result<Self> {
        if !(2..=3).contains(&self.vertex_size) {
            return Err(InvalidInput::VertexSize(self.vertex_size).into());
        }
        let mut resolved = *self;
        match self.element_type {
            ElementType::Triangles => resolved.poly_size = 3,
            ElementType::Polygons | ElementType::ConnectedPolygons if self.poly_size < 3 => {
                return Err(InvalidInput::PolygonSize(self.poly_size).into());
            }
            _ => {}
        }
        Ok(resolved)
    }
}

/// Default intersection cap for `edges` input edges.
fn default_synthetic_cap(edges: usize, extra_vertices: usize) -> usize {
    let Some(twice_pairs) = edges.checked_mul(edges.saturating_sub(1)) else {
        return usize::MAX;
    };
    (twice_pairs / 2).saturating_add(extra_vertices.max(8))
}

/// A tessellation session.
///
/// Contours are added one at a time and consumed by the next call to
/// [`tessellate`](Tessellator::tessellate). Input errors are held back and
/// reported by that call, after which the session starts over.
pub struct Tessellator {
    alloc: SharedAllocator,
    mesh: Mesh,
    reverse_next: bool,
    next_source: u32,
    input_edges: usize,
    pending: Option<TessError>,
    status: TessStatus,
    output: Option<Tessellation>,
}

impl Default for Tessellator {
    fn default() -> Self {
        Self::new()
    }
}

impl Tessellator {
    pub fn new() -> Self {
        Self::with_allocator(HeapAllocator::default())
    }

    pub fn with_config(config: AllocConfig) -> Self {
        Self::with_allocator(HeapAllocator::new(config))
    }

    pub fn with_allocator<A: Allocator + 'static>(alloc: A) -> Self {
        Self::with_shared_allocator(Rc::new(RefCell::new(alloc)))
    }

    /// Uses an allocator the caller keeps a handle to, for instance to
    /// inspect what it has granted.
    pub fn with_shared_allocator(alloc: SharedAllocator) -> Self {
        Self {
            mesh: Mesh::new(alloc.clone()),
            alloc,
            reverse_next: false,
            next_source: 0,
            input_edges: 0,
            pending: None,
            status: TessStatus::Ok,
            output: None,
        }
    }

    pub fn set_option(&mut self, option: TessOption, value: bool) {
        match option {
            TessOption::ReverseContours => self.reverse_next = value,
        }
    }

    /// Adds a closed contour of `vertices.len() / size` vertices, `size`
    /// coordinates each. Trailing values that do not fill a vertex are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Fails on an unsupported `size`, a non-finite coordinate, or when the
    /// allocator runs dry. The error is also kept and reported by the next
    /// [`tessellate`](Tessellator::tessellate).
    pub fn add_contour(&mut self, size: usize, vertices: &[Real]) -> Result<()> {
        let count = if size == 0 { 0 } else { vertices.len() / size };
        self.add_contour_strided(size, size, vertices, count)
    }

    /// Adds a closed contour of `count` vertices whose first `size` values
    /// start every `stride` values of `vertices`.
    ///
    /// The whole contour is checked before anything is added.
    pub fn add_contour_strided(&mut self, size: usize, stride: usize, vertices: &[Real], count: usize) -> Result<()> {
        if let Some(err) = self.pending {
            return Err(err);
        }
        let reverse = std::mem::take(&mut self.reverse_next);
        let result = check_contour(size, stride, vertices, count)
            .and_then(|()| self.insert_contour(size, stride, vertices, count, reverse));
        if let Err(err) = result {
            self.pending = Some(err);
            self.status = TessStatus::from(&err);
        }
        result
    }

    fn insert_contour(
        &mut self,
        size: usize,
        stride: usize,
        vertices: &[Real],
        count: usize,
        reverse: bool,
    ) -> Result<()> {
        let winding = if reverse { -1 } else { 1 };
        let mut e: Option<HalfEdgeId> = None;
        for chunk in vertices.chunks(stride).take(count) {
            let cur = match e {
                None => {
                    // A single self-loop: one vertex, one edge.
                    let first = self.mesh.make_edge()?;
                    self.mesh.splice(first, first.sym())?;
                    first
                }
                Some(prev) => {
                    self.mesh.split_edge(prev)?;
                    self.mesh.lnext(prev)
                }
            };

            let org = self.mesh.org(cur);
            let vertex = self.mesh.vertex_mut(org);
            vertex.coords = [chunk[0], chunk[1], if size == 3 { chunk[2] } else { 0.0 }];
            vertex.source = Some(self.next_source);
            self.next_source += 1;

            self.mesh.set_winding(cur, winding);
            self.mesh.set_winding(cur.sym(), -winding);
            e = Some(cur);
        }
        self.input_edges += count;
        Ok(())
    }

    /// Tessellates the contours added since the last run.
    ///
    /// # Errors
    ///
    /// Reports an error held back from contour ingestion, invalid
    /// parameters, predicate overflow, too many intersections, or an
    /// allocator refusal. Either way the contours are consumed.
    pub fn tessellate(&mut self, params: &TessParams) -> Result<&Tessellation> {
        self.output = None;
        let result = match self.pending.take() {
            Some(err) => Err(err),
            None => params.resolve().and_then(|params| self.run(&params)),
        };

        self.mesh.clear();
        self.input_edges = 0;
        self.next_source = 0;

        match result {
            Ok(out) => {
                self.status = TessStatus::Ok;
                debug!(
                    elements = out.element_count(),
                    vertices = out.vertices().len(),
                    "tessellation finished"
                );
                Ok(self.output.insert(out))
            }
            Err(err) => {
                warn!(error = %err, "tessellation abandoned");
                self.status = TessStatus::from(&err);
                Err(err)
            }
        }
    }

    fn run(&mut self, params: &TessParams) -> Result<Tessellation> {
        debug!(
            vertices = self.mesh.vertex_count(),
            edges = self.input_edges,
            rule = ?params.winding_rule,
            element_type = ?params.element_type,
            "tessellation started"
        );
        let dims = params.vertex_size;
        let Some(bounds) = geometry::project(&mut self.mesh, params.normal)? else {
            return Ok(Tessellation::empty(params.element_type, params.poly_size, dims));
        };

        let extra = self.alloc.borrow().config().extra_vertices;
        let sweep_params = SweepParams {
            winding_rule: params.winding_rule,
            bounds,
            max_synthetic_vertices: params
                .max_synthetic_vertices
                .unwrap_or_else(|| default_synthetic_cap(self.input_edges, extra)),
        };
        sweep::compute_interior(&mut self.mesh, self.alloc.clone(), &sweep_params)?;

        if params.element_type == ElementType::BoundaryContours {
            self.mesh.set_winding_number(1, true)?;
            return Ok(output::contours(&self.mesh, dims));
        }

        self.mesh.discard_exterior();
        self.mesh.tessellate_interior()?;
        if params.poly_size > 3 {
            self.mesh.merge_convex_faces(params.poly_size)?;
        }
        output::polygons(&self.mesh, params.element_type, params.poly_size, dims)
    }

    /// Drops pending contours, any held-back error and the last output.
    pub fn reset(&mut self) {
        self.mesh.clear();
        self.reverse_next = false;
        self.next_source = 0;
        self.input_edges = 0;
        self.pending = None;
        self.status = TessStatus::Ok;
        self.output = None;
    }

    pub fn status(&self) -> TessStatus {
        self.status
    }

    /// The result of the last successful run.
    pub fn output(&self) -> Option<&Tessellation> {
        self.output.as_ref()
    }

    pub fn element_count(&self) -> usize {
        self.output.as_ref().map_or(0, Tessellation::element_count)
    }

    pub fn elements(&self) -> &[u32] {
        match &self.output {
            Some(out) => out.elements(),
            None => &[],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.output.as_ref().map_or(0, |out| out.vertices().len())
    }

    /// Flat output coordinates, `vertex_size` per vertex.
    pub fn vertices(&self) -> &[Real] {
        match &self.output {
            Some(out) => &out.vertices().coords,
            None => &[],
        }
    }

    pub fn vertex_indices(&self) -> &[u32] {
        match &self.output {
            Some(out) => &out.vertices().source_indices,
            None => &[],
        }
    }
}

fn check_contour(size: usize, stride: usize, vertices: &[Real], count: usize) -> Result<()> {
    if !(2..=3).contains(&size) {
        return Err(InvalidInput::VertexSize(size).into());
    }
    if stride < size {
        return Err(InvalidInput::Stride { stride, size }.into());
    }
    if count == 0 {
        return Ok(());
    }
    let needed = (count - 1).checked_mul(stride).and_then(|n| n.checked_add(size));
    if needed.map_or(true, |n| n > vertices.len()) {
        return Err(InvalidInput::BufferTooShort {
            len: vertices.len(),
            count,
        }
        .into());
    }
    let all_finite = vertices
        .chunks(stride)
        .take(count)
        .all(|chunk| chunk[..size].iter().all(|c| c.is_finite()));
    if !all_finite {
        return Err(InvalidInput::NonFiniteCoordinate.into());
    }
    Ok(())
}
