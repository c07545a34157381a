// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// The sweep: computes the interior of the input contours.
//
// A line sweeps across the mesh in increasing s. Edges that cross the sweep
// line are kept sorted in the active edge dictionary, and every gap between
// two neighbouring edges is an `ActiveRegion` that knows its winding number.
// Each event vertex closes off the regions to its left and opens new ones to
// its right. Crossing edges are split at their intersection, and temporary
// edges keep every region monotone, so when the sweep finishes every face of
// the mesh is monotone and marked inside or outside.

mod intersect;
mod region;

use slotmap::{new_key_type, Key, SecondaryMap};
use tracing::{debug, trace};

use region::ActiveRegion;

use crate::bucketalloc::{Pool, RecordKind, SharedAllocator};
use crate::dict::Dict;
use crate::error::{finite, InvalidInput, Result, TessError};
use crate::geom::{edge_eval, edge_sign, vert_eq, vert_leq, Bounds, Point, Real};
use crate::mesh::{EdgeKey, HalfEdgeId, Mesh, VertexKey};
use crate::priorityq::{EventHandle, EventQueue};
use crate::tess::WindingRule;

new_key_type! {
    pub struct RegionKey;
}

/// Where the sweep currently is. Traced on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SweepState {
    AwaitingEvent,
    ProcessingVertex,
    ResolvingIntersection,
    Done,
    Failed,
}

/// Everything the sweep needs besides the mesh itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepParams {
    pub winding_rule: WindingRule,
    /// Bounding box of the input vertices on the sweep plane.
    pub bounds: Bounds,
    /// Intersection vertices allowed before the run is abandoned.
    pub max_synthetic_vertices: usize,
}

/// The vertex being processed, with its position cached for comparisons.
#[derive(Debug, Clone, Copy)]
struct Event {
    vertex: VertexKey,
    pos: Point,
    coords: [Real; 3],
}

/// Computes the interior of `mesh`.
///
/// On return every face is marked inside or outside according to the
/// winding rule and every inside face is monotone. Degenerate faces are
/// gone; the sentinel edges remain, bordering outside faces only.
///
/// # Errors
///
/// Returns [`TessError::InvalidInput`] when a predicate leaves the finite
/// range or the intersection cap is reached, and [`TessError::OutOfMemory`]
/// when the allocator refuses a bucket. The mesh is left in an unspecified
/// state and should be cleared.
pub fn compute_interior(mesh: &mut Mesh, alloc: SharedAllocator, params: &SweepParams) -> Result<()> {
    let mut sweep = Sweep::new(mesh, alloc, params)?;
    let result = sweep.run(params.bounds);
    match &result {
        Ok(()) => sweep.set_state(SweepState::Done),
        Err(_) => sweep.set_state(SweepState::Failed),
    }
    result
}

/// Compares the active edges `e1` and `e2` at the current event: true when
/// `e1` is at or below `e2` on the sweep line.
///
/// Both edges point left. Edges that end at the event are ordered by slope.
fn edge_leq(mesh: &Mesh, event: Event, e1: HalfEdgeId, e2: HalfEdgeId) -> Result<bool> {
    let (e1_org, e1_dst) = (mesh.org_pos(e1), mesh.dst_pos(e1));
    let (e2_org, e2_dst) = (mesh.org_pos(e2), mesh.dst_pos(e2));
    let e1_at_event = mesh.dst(e1) == event.vertex;
    let e2_at_event = mesh.dst(e2) == event.vertex;

    if e1_at_event {
        if e2_at_event {
            if vert_leq(e1_org, e2_org) {
                return Ok(edge_sign(e2_dst, e1_org, e2_org)? <= 0.0);
            }
            return Ok(edge_sign(e1_dst, e2_org, e1_org)? >= 0.0);
        }
        return Ok(edge_sign(e2_dst, event.pos, e2_org)? <= 0.0);
    }
    if e2_at_event {
        return Ok(edge_sign(e1_dst, event.pos, e1_org)? >= 0.0);
    }

    let t1 = edge_eval(e1_dst, event.pos, e1_org)?;
    let t2 = edge_eval(e2_dst, event.pos, e2_org)?;
    Ok(t1 >= t2)
}

fn lost(what: &'static str) -> TessError {
    InvalidInput::Topology(what).into()
}

pub(crate) struct Sweep<'m> {
    mesh: &'m mut Mesh,
    rule: WindingRule,
    dict: Dict<RegionKey>,
    regions: Pool<RegionKey, ActiveRegion>,
    /// Region whose upper edge is this half-edge, per side of each pair.
    edge_regions: SecondaryMap<EdgeKey, [Option<RegionKey>; 2]>,
    queue: EventQueue<VertexKey>,
    handles: SecondaryMap<VertexKey, EventHandle>,
    event: Event,
    state: SweepState,
    extra_vertices: usize,
    synthetic: usize,
    max_synthetic: usize,
}

impl<'m> Sweep<'m> {
    fn new(mesh: &'m mut Mesh, alloc: SharedAllocator, params: &SweepParams) -> Result<Self> {
        let extra_vertices = alloc.borrow().config().extra_vertices;
        Ok(Self {
            mesh,
            rule: params.winding_rule,
            dict: Dict::new(alloc.clone())?,
            regions: Pool::new(RecordKind::Region, alloc),
            edge_regions: SecondaryMap::new(),
            queue: EventQueue::default(),
            handles: SecondaryMap::new(),
            event: Event {
                vertex: VertexKey::null(),
                pos: Point::default(),
                coords: [0.0; 3],
            },
            state: SweepState::AwaitingEvent,
            extra_vertices,
            synthetic: 0,
            max_synthetic: params.max_synthetic_vertices,
        })
    }

    fn set_state(&mut self, state: SweepState) {
        if self.state != state {
            trace!(from = ?self.state, to = ?state, "sweep state");
            self.state = state;
        }
    }

    fn run(&mut self, bounds: Bounds) -> Result<()> {
        self.remove_degenerate_edges()?;
        self.init_queue();
        self.init_edge_dict(bounds)?;
        debug!(
            vertices = self.queue.len(),
            edges = self.mesh.edge_count(),
            "sweep started"
        );

        loop {
            self.set_state(SweepState::AwaitingEvent);
            let Some(v) = self.pop_event() else {
                break;
            };
            // Vertices at exactly the same position are merged into one event.
            loop {
                let Some((_, next)) = self.queue.peek() else {
                    break;
                };
                if self.mesh.contains_vertex(next) && !vert_eq(self.mesh.pos(next), self.mesh.pos(v)) {
                    break;
                }
                self.queue.pop_min();
                self.handles.remove(next);
                if self.mesh.contains_vertex(next) {
                    let a = self.mesh.vertex(v).an_edge;
                    let b = self.mesh.vertex(next).an_edge;
                    self.mesh.splice(a, b)?;
                }
            }
            self.sweep_event(v)?;
        }

        self.done_edge_dict();
        self.remove_degenerate_faces()?;
        debug!(
            faces = self.mesh.face_count(),
            intersections = self.synthetic,
            "sweep finished"
        );
        Ok(())
    }

    /// The next queued vertex still present in the mesh.
    fn pop_event(&mut self) -> Option<VertexKey> {
        while let Some(v) = self.queue.pop_min() {
            self.handles.remove(v);
            if self.mesh.contains_vertex(v) {
                return Some(v);
            }
        }
        None
    }

    /// Removes zero-length edges and contours of fewer than three edges.
    fn remove_degenerate_edges(&mut self) -> Result<()> {
        for start in self.mesh.edge_keys() {
            if !self.mesh.contains_edge(start) {
                continue;
            }
            let mut e = start;
            let mut e_lnext = self.mesh.lnext(e);

            if vert_eq(self.mesh.org_pos(e), self.mesh.dst_pos(e)) && self.mesh.lnext(e_lnext) != e {
                // Zero-length edge on a contour of three or more edges.
                self.mesh.splice(e_lnext, e)?;
                self.mesh.delete_edge(e)?;
                e = e_lnext;
                e_lnext = self.mesh.lnext(e);
            }
            if self.mesh.lnext(e_lnext) == e {
                if e_lnext != e {
                    self.mesh.delete_edge(e_lnext)?;
                }
                self.mesh.delete_edge(e)?;
            }
        }
        Ok(())
    }

    fn init_queue(&mut self) {
        let verts = self.mesh.vertex_keys();
        let mut queue = EventQueue::with_capacity(verts.len() + self.extra_vertices.max(8));
        for v in verts {
            let h = queue.insert(v, self.mesh.pos(v));
            self.handles.insert(v, h);
        }
        queue.init();
        self.queue = queue;
    }

    /// Adds the two sentinel regions that bound the dictionary from below
    /// and above, so every real region has neighbours on both sides.
    fn init_edge_dict(&mut self, bounds: Bounds) -> Result<()> {
        let w = finite(bounds.max.s - bounds.min.s + 0.01, "sentinel extent")?;
        let h = finite(bounds.max.t - bounds.min.t + 0.01, "sentinel extent")?;
        let smin = finite(bounds.min.s - w, "sentinel extent")?;
        let smax = finite(bounds.max.s + w, "sentinel extent")?;
        let tmin = finite(bounds.min.t - h, "sentinel extent")?;
        let tmax = finite(bounds.max.t + h, "sentinel extent")?;

        self.add_sentinel(smin, smax, tmin)?;
        self.add_sentinel(smin, smax, tmax)
    }

    fn add_sentinel(&mut self, smin: Real, smax: Real, t: Real) -> Result<()> {
        let e = self.mesh.make_edge()?;
        let org = self.mesh.org(e);
        let dst = self.mesh.dst(e);
        self.mesh.vertex_mut(org).pos = Point::new(smax, t);
        self.mesh.vertex_mut(dst).pos = Point::new(smin, t);
        self.event = Event {
            vertex: dst,
            pos: Point::new(smin, t),
            coords: [0.0; 3],
        };

        let reg = self.regions.insert(ActiveRegion {
            e_up: e,
            sentinel: true,
            ..ActiveRegion::default()
        })?;
        let mesh = &*self.mesh;
        let regions = &self.regions;
        let event = self.event;
        let node = self.dict.insert(reg, |a, b| {
            edge_leq(mesh, event, regions[a].e_up, regions[b].e_up)
        })?;
        self.regions[reg].node_up = node;
        Ok(())
    }

    /// Deletes what is left of the dictionary: the two sentinels and at most
    /// one temporary edge region.
    fn done_edge_dict(&mut self) {
        while let Some(reg) = self.dict.key(self.dict.min()) {
            let region = &self.regions[reg];
            debug_assert!(region.sentinel || region.fix_upper_edge, "region left in the dictionary");
            self.delete_region(reg);
        }
    }

    /// Removes faces with only two edges, folding their winding into the
    /// edge that survives.
    fn remove_degenerate_faces(&mut self) -> Result<()> {
        for f in self.mesh.face_keys() {
            if !self.mesh.contains_face(f) {
                continue;
            }
            let e = self.mesh.face(f).an_edge;
            let e_lnext = self.mesh.lnext(e);
            if e_lnext != e && self.mesh.lnext(e_lnext) == e {
                let onext = self.mesh.onext(e);
                self.mesh.add_winding(onext, e);
                self.mesh.delete_edge(e)?;
            }
        }
        Ok(())
    }

    fn active_region(&self, e: HalfEdgeId) -> Option<RegionKey> {
        self.edge_regions
            .get(e.pair)
            .and_then(|sides| sides[e.rev as usize])
            .filter(|&reg| self.regions.contains_key(reg))
    }

    fn set_active_region(&mut self, e: HalfEdgeId, reg: Option<RegionKey>) {
        if let Some(entry) = self.edge_regions.entry(e.pair) {
            entry.or_insert([None; 2])[e.rev as usize] = reg;
        }
    }

    /// Processes one event vertex.
    ///
    /// Regions whose upper and lower edges both end here are finished first.
    /// Then the edges leaving the vertex to the right are added, or, if there
    /// are none, a temporary edge keeps the region below monotone.
    fn sweep_event(&mut self, v_event: VertexKey) -> Result<()> {
        let vertex = self.mesh.vertex(v_event);
        self.event = Event {
            vertex: v_event,
            pos: vertex.pos,
            coords: vertex.coords,
        };
        self.set_state(SweepState::ProcessingVertex);
        trace!(s = self.event.pos.s, t = self.event.pos.t, "sweep event");

        // Is this vertex the right end of an edge already in the dictionary?
        let start = self.mesh.vertex(v_event).an_edge;
        let mut e = start;
        let reg = loop {
            if let Some(reg) = self.active_region(e) {
                break reg;
            }
            e = self.mesh.onext(e);
            if e == start {
                // Every edge goes right.
                return self.connect_left_vertex(v_event);
            }
        };

        let reg_up = self.top_left_region(reg)?;
        let reg = self.below_of(reg_up)?;
        let e_top_left = self.regions[reg].e_up;
        let e_bottom_left = self.finish_left_regions(reg, None)?;

        if self.mesh.onext(e_bottom_left) == e_top_left {
            self.connect_right_vertex(reg_up, e_bottom_left)
        } else {
            let first = self.mesh.onext(e_bottom_left);
            self.add_right_edges(reg_up, first, e_top_left, Some(e_top_left), true)
        }
    }

    /// Handles an event with no left-going edges.
    ///
    /// If the vertex lies inside, it is connected to the rightmost processed
    /// vertex of the region containing it, which also makes it a right
    /// vertex, and the event is processed again.
    fn connect_left_vertex(&mut self, v_event: VertexKey) -> Result<()> {
        let an_edge = self.mesh.vertex(v_event).an_edge;
        let reversed = an_edge.sym();
        let mesh = &*self.mesh;
        let regions = &self.regions;
        let event = self.event;
        let node = self
            .dict
            .search(|existing| edge_leq(mesh, event, reversed, regions[existing].e_up))?;

        let Some(reg_up) = self.dict.key(node) else {
            return Ok(());
        };
        let Some(reg_lo) = self.below(reg_up) else {
            // Only possible when every input vertex is coincident.
            return Ok(());
        };
        let e_up = self.regions[reg_up].e_up;
        let e_lo = self.regions[reg_lo].e_up;

        if edge_sign(self.mesh.dst_pos(e_up), self.event.pos, self.mesh.org_pos(e_up))? == 0.0 {
            return self.connect_left_degenerate(reg_up, v_event);
        }

        let reg = if vert_leq(self.mesh.dst_pos(e_lo), self.mesh.dst_pos(e_up)) {
            reg_up
        } else {
            reg_lo
        };

        if self.regions[reg_up].inside || self.regions[reg].fix_upper_edge {
            let e_new = if reg == reg_up {
                let lnext = self.mesh.lnext(e_up);
                self.mesh.connect(an_edge.sym(), lnext)?
            } else {
                let dnext = self.mesh.dnext(e_lo);
                self.mesh.connect(dnext, an_edge)?.sym()
            };
            if self.regions[reg].fix_upper_edge {
                self.fix_upper_edge(reg, e_new)?;
            } else {
                let added = self.add_region_below(reg_up, e_new)?;
                self.compute_winding(added)?;
            }
            self.sweep_event(v_event)
        } else {
            // Outside the polygon: nothing to connect to.
            self.add_right_edges(reg_up, an_edge, an_edge, None, true)
        }
    }

    /// The event lies on the upper edge of the region that contains it.
    fn connect_left_degenerate(&mut self, reg_up: RegionKey, v_event: VertexKey) -> Result<()> {
        let e = self.regions[reg_up].e_up;
        if vert_eq(self.mesh.org_pos(e), self.event.pos) {
            // e.org is still queued: merge now, it is processed when popped.
            let an_edge = self.mesh.vertex(v_event).an_edge;
            return self.mesh.splice(e, an_edge);
        }

        if !vert_eq(self.mesh.dst_pos(e), self.event.pos) {
            // Split e where the event sits on it.
            self.mesh.split_edge(e.sym())?;
            if self.regions[reg_up].fix_upper_edge {
                let unused = self.mesh.onext(e);
                self.mesh.delete_edge(unused)?;
                self.regions[reg_up].fix_upper_edge = false;
            }
            let an_edge = self.mesh.vertex(v_event).an_edge;
            self.mesh.splice(an_edge, e)?;
            return self.sweep_event(v_event);
        }

        // The event coincides with e.dst, which was already processed.
        let reg_up = self.top_right_region(reg_up)?;
        let reg = self.below_of(reg_up)?;
        let mut e_top_right = self.regions[reg].e_up.sym();
        let e_last = self.mesh.onext(e_top_right);
        let mut e_top_left = Some(e_last);
        if self.regions[reg].fix_upper_edge {
            // The temporary edge is no longer needed now that real
            // right-going edges exist.
            self.delete_region(reg);
            self.mesh.delete_edge(e_top_right)?;
            e_top_right = self.mesh.oprev(e_last);
        }
        let an_edge = self.mesh.vertex(v_event).an_edge;
        self.mesh.splice(an_edge, e_top_right)?;
        if !self.mesh.edge_goes_left(e_last) {
            e_top_left = None;
        }
        let first = self.mesh.onext(e_top_right);
        self.add_right_edges(reg_up, first, e_last, e_top_left, true)
    }

    /// Handles an event with no right-going edges.
    ///
    /// The region below it would stop being monotone, so a temporary edge
    /// is added from the event to the closer origin of the region's bounding
    /// edges. It is marked `fix_upper_edge` and replaced as soon as a better
    /// candidate is found.
    fn connect_right_vertex(&mut self, reg_up: RegionKey, e_bottom_left: HalfEdgeId) -> Result<()> {
        let mut reg_up = reg_up;
        let mut e_bottom_left = e_bottom_left;
        let mut e_top_left = self.mesh.onext(e_bottom_left);
        let reg_lo = self.below_of(reg_up)?;
        let e_up = self.regions[reg_up].e_up;
        let e_lo = self.regions[reg_lo].e_up;
        let mut degenerate = false;

        if self.mesh.dst(e_up) != self.mesh.dst(e_lo) {
            self.check_for_intersect(reg_up)?;
        }

        // The upper or lower edge may now pass through the event.
        if vert_eq(self.mesh.org_pos(e_up), self.event.pos) {
            let oprev = self.mesh.oprev(e_top_left);
            self.mesh.splice(oprev, e_up)?;
            reg_up = self.top_left_region(reg_up)?;
            let below = self.below_of(reg_up)?;
            e_top_left = self.regions[below].e_up;
            self.finish_left_regions(below, Some(reg_lo))?;
            degenerate = true;
        }
        if vert_eq(self.mesh.org_pos(e_lo), self.event.pos) {
            let oprev = self.mesh.oprev(e_lo);
            self.mesh.splice(e_bottom_left, oprev)?;
            e_bottom_left = self.finish_left_regions(reg_lo, None)?;
            degenerate = true;
        }
        if degenerate {
            let first = self.mesh.onext(e_bottom_left);
            return self.add_right_edges(reg_up, first, e_top_left, Some(e_top_left), true);
        }

        let target = if vert_leq(self.mesh.org_pos(e_lo), self.mesh.org_pos(e_up)) {
            self.mesh.oprev(e_lo)
        } else {
            e_up
        };
        let lprev = self.mesh.lprev(e_bottom_left);
        let e_new = self.mesh.connect(lprev, target)?;

        // No cleanup yet: e_new must be marked before anything can remove it.
        let onext = self.mesh.onext(e_new);
        self.add_right_edges(reg_up, e_new, onext, Some(onext), false)?;
        let reg = self
            .active_region(e_new.sym())
            .ok_or_else(|| lost("temporary edge region"))?;
        self.regions[reg].fix_upper_edge = true;
        self.walk_dirty_regions(reg_up)
    }
}
