// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Keeping the dictionary ordered: splices where neighbouring edges touch,
// and new vertices where they cross.
//
// Neighbouring edges can fall out of order when an intersection vertex is
// rounded onto the sweep grid. Every region whose neighbours may be out of
// order is marked dirty; `walk_dirty_regions` repairs them before the next
// event is processed.

use tracing::trace;

use super::{RegionKey, Sweep, SweepState};
use crate::error::{InvalidInput, Result};
use crate::geom::{edge_intersect, edge_sign, vert_eq, vert_leq};
use crate::tess::geometry::intersection_coords;

impl Sweep<'_> {
    /// Checks the right (origin) ends of the edges above and below `reg_up`.
    ///
    /// If the upper origin lies below the lower edge, or the lower origin
    /// above the upper edge, the offending edge is split and spliced onto
    /// the other origin. Returns true when the mesh was changed.
    pub(super) fn check_for_right_splice(&mut self, reg_up: RegionKey) -> Result<bool> {
        let reg_lo = self.below_of(reg_up)?;
        let e_up = self.regions[reg_up].e_up;
        let e_lo = self.regions[reg_lo].e_up;
        let org_up = self.mesh.org_pos(e_up);
        let org_lo = self.mesh.org_pos(e_lo);

        if vert_leq(org_up, org_lo) {
            if edge_sign(self.mesh.dst_pos(e_lo), org_up, org_lo)? > 0.0 {
                return Ok(false);
            }
            if !vert_eq(org_up, org_lo) {
                // e_up.org is on e_lo: split e_lo there.
                self.mesh.split_edge(e_lo.sym())?;
                let oprev = self.mesh.oprev(e_lo);
                self.mesh.splice(e_up, oprev)?;
                self.regions[reg_up].dirty = true;
                self.regions[reg_lo].dirty = true;
            } else if self.mesh.org(e_up) != self.mesh.org(e_lo) {
                // Same position, different vertices: merge them. The upper
                // one has not been processed yet.
                let doomed = self.mesh.org(e_up);
                if let Some(handle) = self.handles.remove(doomed) {
                    self.queue.delete(handle);
                }
                let oprev = self.mesh.oprev(e_lo);
                self.mesh.splice(oprev, e_up)?;
            }
        } else {
            if edge_sign(self.mesh.dst_pos(e_up), org_lo, org_up)? < 0.0 {
                return Ok(false);
            }
            // e_lo.org is on e_up: split e_up there.
            if let Some(above) = self.above(reg_up) {
                self.regions[above].dirty = true;
            }
            self.regions[reg_up].dirty = true;
            self.mesh.split_edge(e_up.sym())?;
            let oprev = self.mesh.oprev(e_lo);
            self.mesh.splice(oprev, e_up)?;
        }
        Ok(true)
    }

    /// Checks the left (destination) ends of the edges above and below
    /// `reg_up`, which must differ. The mirror of
    /// [`check_for_right_splice`](Self::check_for_right_splice).
    pub(super) fn check_for_left_splice(&mut self, reg_up: RegionKey) -> Result<bool> {
        let reg_lo = self.below_of(reg_up)?;
        let e_up = self.regions[reg_up].e_up;
        let e_lo = self.regions[reg_lo].e_up;
        let dst_up = self.mesh.dst_pos(e_up);
        let dst_lo = self.mesh.dst_pos(e_lo);

        if vert_leq(dst_up, dst_lo) {
            if edge_sign(dst_up, dst_lo, self.mesh.org_pos(e_up))? < 0.0 {
                return Ok(false);
            }
            // e_lo.dst is above e_up: split e_up there.
            if let Some(above) = self.above(reg_up) {
                self.regions[above].dirty = true;
            }
            self.regions[reg_up].dirty = true;
            let e = self.mesh.split_edge(e_up)?;
            self.mesh.splice(e_lo.sym(), e)?;
            if let Some(f) = self.mesh.lface(e) {
                self.mesh.face_mut(f).inside = self.regions[reg_up].inside;
            }
        } else {
            if edge_sign(dst_lo, dst_up, self.mesh.org_pos(e_lo))? > 0.0 {
                return Ok(false);
            }
            // e_up.dst is below e_lo: split e_lo there.
            self.regions[reg_up].dirty = true;
            self.regions[reg_lo].dirty = true;
            let e = self.mesh.split_edge(e_lo)?;
            let lnext = self.mesh.lnext(e_up);
            self.mesh.splice(lnext, e_lo.sym())?;
            if let Some(f) = self.mesh.rface(e) {
                self.mesh.face_mut(f).inside = self.regions[reg_up].inside;
            }
        }
        Ok(true)
    }

    /// Checks whether the edges above and below `reg_up` cross, and if so
    /// splits both at the crossing.
    ///
    /// The crossing is clamped so it never lies left of the event or right
    /// of either origin. Returns true only when the regions were processed
    /// here and the caller must stop walking.
    pub(super) fn check_for_intersect(&mut self, reg_up: RegionKey) -> Result<bool> {
        let reg_lo = self.below_of(reg_up)?;
        let mut e_up = self.regions[reg_up].e_up;
        let mut e_lo = self.regions[reg_lo].e_up;
        let org_up = self.mesh.org(e_up);
        let org_lo = self.mesh.org(e_lo);
        let dst_up = self.mesh.dst(e_up);
        let dst_lo = self.mesh.dst(e_lo);
        let (p_org_up, p_org_lo) = (self.mesh.pos(org_up), self.mesh.pos(org_lo));
        let (p_dst_up, p_dst_lo) = (self.mesh.pos(dst_up), self.mesh.pos(dst_lo));
        let event = self.event;

        if org_up == org_lo {
            // Right endpoints are the same vertex.
            return Ok(false);
        }

        let t_min_up = p_org_up.t.min(p_dst_up.t);
        let t_max_lo = p_org_lo.t.max(p_dst_lo.t);
        if t_min_up > t_max_lo {
            // t ranges do not overlap.
            return Ok(false);
        }

        if vert_leq(p_org_up, p_org_lo) {
            if edge_sign(p_dst_lo, p_org_up, p_org_lo)? > 0.0 {
                return Ok(false);
            }
        } else if edge_sign(p_dst_up, p_org_lo, p_org_up)? < 0.0 {
            return Ok(false);
        }

        self.set_state(SweepState::ResolvingIntersection);
        let mut isect = edge_intersect(p_dst_up, p_org_up, p_dst_lo, p_org_lo)?;
        if vert_leq(isect, event.pos) {
            // Rounded to the left of the sweep line: snap to the event.
            isect = event.pos;
        }
        let org_min = if vert_leq(p_org_up, p_org_lo) { p_org_up } else { p_org_lo };
        if vert_leq(org_min, isect) {
            isect = org_min;
        }

        if vert_eq(isect, p_org_up) || vert_eq(isect, p_org_lo) {
            // Easy case: splice the edges at the shared origin.
            self.check_for_right_splice(reg_up)?;
            return Ok(false);
        }

        let up_dst_is_event = vert_eq(p_dst_up, event.pos);
        let lo_dst_is_event = vert_eq(p_dst_lo, event.pos);
        if (!up_dst_is_event && edge_sign(p_dst_up, event.pos, isect)? >= 0.0)
            || (!lo_dst_is_event && edge_sign(p_dst_lo, event.pos, isect)? <= 0.0)
        {
            // The crossing lies on the far side of a line through the event.
            // Splitting an edge at the event keeps the ordering intact.
            if dst_lo == event.vertex {
                self.mesh.split_edge(e_up.sym())?;
                self.mesh.splice(e_lo.sym(), e_up)?;
                let reg_up = self.top_left_region(reg_up)?;
                let below = self.below_of(reg_up)?;
                e_up = self.regions[below].e_up;
                self.finish_left_regions(below, Some(reg_lo))?;
                let oprev = self.mesh.oprev(e_up);
                self.add_right_edges(reg_up, oprev, e_up, Some(e_up), true)?;
                return Ok(true);
            }
            if dst_up == event.vertex {
                self.mesh.split_edge(e_lo.sym())?;
                let lnext = self.mesh.lnext(e_up);
                let oprev = self.mesh.oprev(e_lo);
                self.mesh.splice(lnext, oprev)?;
                let reg_lo = reg_up;
                let reg_up = self.top_right_region(reg_up)?;
                let below = self.below_of(reg_up)?;
                let e = self.mesh.rprev(self.regions[below].e_up);
                self.regions[reg_lo].e_up = self.mesh.oprev(e_lo);
                e_lo = self.finish_left_regions(reg_lo, None)?;
                let first = self.mesh.onext(e_lo);
                let last = self.mesh.rprev(e_up);
                self.add_right_edges(reg_up, first, last, Some(e), true)?;
                return Ok(true);
            }
            if edge_sign(p_dst_up, event.pos, isect)? >= 0.0 {
                if let Some(above) = self.above(reg_up) {
                    self.regions[above].dirty = true;
                }
                self.regions[reg_up].dirty = true;
                self.mesh.split_edge(e_up.sym())?;
                self.place_at_event(self.mesh.org(e_up));
            }
            if edge_sign(p_dst_lo, event.pos, isect)? <= 0.0 {
                self.regions[reg_up].dirty = true;
                self.regions[reg_lo].dirty = true;
                self.mesh.split_edge(e_lo.sym())?;
                self.place_at_event(self.mesh.org(e_lo));
            }
            return Ok(false);
        }

        // General case: split both edges and join them at a new vertex.
        if self.synthetic >= self.max_synthetic {
            return Err(InvalidInput::IntersectionLimit(self.max_synthetic).into());
        }
        self.mesh.split_edge(e_up.sym())?;
        self.mesh.split_edge(e_lo.sym())?;
        let oprev = self.mesh.oprev(e_lo);
        self.mesh.splice(oprev, e_up)?;

        let coords = intersection_coords(
            isect,
            &[
                (p_org_up, self.mesh.vertex(org_up).coords),
                (p_dst_up, self.mesh.vertex(dst_up).coords),
                (p_org_lo, self.mesh.vertex(org_lo).coords),
                (p_dst_lo, self.mesh.vertex(dst_lo).coords),
            ],
        )?;
        let v = self.mesh.org(e_up);
        let vertex = self.mesh.vertex_mut(v);
        vertex.pos = isect;
        vertex.coords = coords;
        vertex.source = None;
        let handle = self.queue.insert(v, isect);
        self.handles.insert(v, handle);
        self.synthetic += 1;
        trace!(s = isect.s, t = isect.t, "intersection vertex");

        if let Some(above) = self.above(reg_up) {
            self.regions[above].dirty = true;
        }
        self.regions[reg_up].dirty = true;
        self.regions[reg_lo].dirty = true;
        Ok(false)
    }

    /// Moves a vertex created by a split onto the event.
    fn place_at_event(&mut self, v: crate::mesh::VertexKey) {
        let vertex = self.mesh.vertex_mut(v);
        vertex.pos = self.event.pos;
        vertex.coords = self.event.coords;
        vertex.source = None;
    }

    /// Restores the dictionary invariants for every dirty region, starting
    /// from `reg_up` and working both up and down.
    pub(super) fn walk_dirty_regions(&mut self, reg_up: RegionKey) -> Result<()> {
        let mut reg_up = reg_up;
        let mut reg_lo = self.below_of(reg_up)?;

        loop {
            // Find the lowest dirty region; there could be many.
            while self.regions[reg_lo].dirty {
                reg_up = reg_lo;
                reg_lo = self.below_of(reg_lo)?;
            }
            if !self.regions[reg_up].dirty {
                reg_lo = reg_up;
                match self.above(reg_up) {
                    Some(above) if self.regions[above].dirty => reg_up = above,
                    _ => return Ok(()),
                }
            }
            self.regions[reg_up].dirty = false;
            let mut e_up = self.regions[reg_up].e_up;
            let mut e_lo = self.regions[reg_lo].e_up;

            if self.mesh.dst(e_up) != self.mesh.dst(e_lo) && self.check_for_left_splice(reg_up)? {
                // A temporary edge that now crosses its neighbour's endpoint
                // is dropped rather than split.
                if self.regions[reg_lo].fix_upper_edge {
                    self.delete_region(reg_lo);
                    self.mesh.delete_edge(e_lo)?;
                    reg_lo = self.below_of(reg_up)?;
                    e_lo = self.regions[reg_lo].e_up;
                } else if self.regions[reg_up].fix_upper_edge {
                    self.delete_region(reg_up);
                    self.mesh.delete_edge(e_up)?;
                    reg_up = self.above_of(reg_lo)?;
                    e_up = self.regions[reg_up].e_up;
                }
            }

            if self.mesh.org(e_up) != self.mesh.org(e_lo) {
                let dst_up = self.mesh.dst(e_up);
                let dst_lo = self.mesh.dst(e_lo);
                if dst_up != dst_lo
                    && !self.regions[reg_up].fix_upper_edge
                    && !self.regions[reg_lo].fix_upper_edge
                    && (dst_up == self.event.vertex || dst_lo == self.event.vertex)
                {
                    if self.check_for_intersect(reg_up)? {
                        // The regions were processed by a recursive call.
                        return Ok(());
                    }
                } else {
                    self.check_for_right_splice(reg_up)?;
                }
            }

            if self.mesh.org(e_up) == self.mesh.org(e_lo) && self.mesh.dst(e_up) == self.mesh.dst(e_lo) {
                // Coincident edges: fold the upper into the lower.
                self.mesh.add_winding(e_lo, e_up);
                self.delete_region(reg_up);
                self.mesh.delete_edge(e_up)?;
                reg_up = self.above_of(reg_lo)?;
            }
        }
    }
}
