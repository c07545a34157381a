// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Active regions: the gaps between neighbouring edges of the dictionary.

use super::{edge_leq, lost, RegionKey, Sweep};
use crate::dict::NodeKey;
use crate::error::Result;
use crate::mesh::HalfEdgeId;

/// The region between `e_up` and the next edge below it in the dictionary.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActiveRegion {
    /// Upper edge. Points left, so its origin is the rightmost endpoint.
    pub e_up: HalfEdgeId,
    pub node_up: NodeKey,
    pub winding_number: i32,
    pub inside: bool,
    /// One of the two regions bounding the whole sweep.
    pub sentinel: bool,
    /// Neighbour ordering must be rechecked before the next event.
    pub dirty: bool,
    /// `e_up` is a temporary edge, to be replaced once a better candidate
    /// turns up.
    pub fix_upper_edge: bool,
}

impl Sweep<'_> {
    pub(super) fn above(&self, reg: RegionKey) -> Option<RegionKey> {
        self.dict.key(self.dict.succ(self.regions[reg].node_up))
    }

    pub(super) fn below(&self, reg: RegionKey) -> Option<RegionKey> {
        self.dict.key(self.dict.pred(self.regions[reg].node_up))
    }

    pub(super) fn above_of(&self, reg: RegionKey) -> Result<RegionKey> {
        self.above(reg).ok_or_else(|| lost("region above"))
    }

    pub(super) fn below_of(&self, reg: RegionKey) -> Result<RegionKey> {
        self.below(reg).ok_or_else(|| lost("region below"))
    }

    pub(super) fn is_winding_inside(&self, n: i32) -> bool {
        self.rule.is_inside(n)
    }

    /// Inserts a region with upper edge `e_new_up` just below `above`.
    pub(super) fn add_region_below(&mut self, above: RegionKey, e_new_up: HalfEdgeId) -> Result<RegionKey> {
        let reg = self.regions.insert(ActiveRegion {
            e_up: e_new_up,
            ..ActiveRegion::default()
        })?;
        let mesh = &*self.mesh;
        let regions = &self.regions;
        let event = self.event;
        let hint = regions[above].node_up;
        let inserted = self.dict.insert_before(hint, reg, |a, b| {
            edge_leq(mesh, event, regions[a].e_up, regions[b].e_up)
        });
        let node = match inserted {
            Ok(node) => node,
            Err(err) => {
                self.regions.remove(reg);
                return Err(err);
            }
        };
        self.regions[reg].node_up = node;
        self.set_active_region(e_new_up, Some(reg));
        Ok(reg)
    }

    pub(super) fn delete_region(&mut self, reg: RegionKey) {
        if let Some(region) = self.regions.remove(reg) {
            self.set_active_region(region.e_up, None);
            self.dict.delete(region.node_up);
        }
    }

    /// Replaces the temporary upper edge of `reg` with `new_edge`.
    pub(super) fn fix_upper_edge(&mut self, reg: RegionKey, new_edge: HalfEdgeId) -> Result<()> {
        let old = self.regions[reg].e_up;
        self.mesh.delete_edge(old)?;
        let region = &mut self.regions[reg];
        region.fix_upper_edge = false;
        region.e_up = new_edge;
        self.set_active_region(new_edge, Some(reg));
        Ok(())
    }

    pub(super) fn compute_winding(&mut self, reg: RegionKey) -> Result<()> {
        let above = self.above_of(reg)?;
        let n = self.regions[above].winding_number + self.mesh.winding(self.regions[reg].e_up);
        let inside = self.is_winding_inside(n);
        let region = &mut self.regions[reg];
        region.winding_number = n;
        region.inside = inside;
        Ok(())
    }

    /// The face left of `e_up` is complete: record its classification and
    /// retire the region.
    pub(super) fn finish_region(&mut self, reg: RegionKey) -> Result<()> {
        let region = self.regions[reg];
        let f = self.mesh.lface(region.e_up).ok_or_else(|| lost("finished region face"))?;
        let face = self.mesh.face_mut(f);
        face.inside = region.inside;
        face.winding = region.winding_number;
        face.an_edge = region.e_up;
        self.delete_region(reg);
        Ok(())
    }

    /// The topmost region whose upper edge shares the origin of `reg`'s
    /// upper edge, skipping up past it. A temporary edge found there is
    /// replaced first, since its origin is about to be processed.
    pub(super) fn top_left_region(&mut self, reg: RegionKey) -> Result<RegionKey> {
        let org = self.mesh.org(self.regions[reg].e_up);
        let mut reg = reg;
        loop {
            reg = self.above_of(reg)?;
            if self.mesh.org(self.regions[reg].e_up) != org {
                break;
            }
        }

        if self.regions[reg].fix_upper_edge {
            let below = self.below_of(reg)?;
            let from = self.regions[below].e_up.sym();
            let to = self.mesh.lnext(self.regions[reg].e_up);
            let e = self.mesh.connect(from, to)?;
            self.fix_upper_edge(reg, e)?;
            reg = self.above_of(reg)?;
        }
        Ok(reg)
    }

    pub(super) fn top_right_region(&self, reg: RegionKey) -> Result<RegionKey> {
        let dst = self.mesh.dst(self.regions[reg].e_up);
        let mut reg = reg;
        loop {
            reg = self.above_of(reg)?;
            if self.mesh.dst(self.regions[reg].e_up) != dst {
                return Ok(reg);
            }
        }
    }

    /// Finishes the regions from `first` down to (not including) `last`,
    /// whose edges all end at the event. Stops early at the first region
    /// whose lower edge does not. Returns the lowest left-going edge at the
    /// event.
    ///
    /// Edges that meet the event only geometrically are spliced into its
    /// vertex ring on the way down, and temporary edges are replaced.
    pub(super) fn finish_left_regions(&mut self, first: RegionKey, last: Option<RegionKey>) -> Result<HalfEdgeId> {
        let mut reg_prev = first;
        let mut e_prev = self.regions[first].e_up;

        while Some(reg_prev) != last {
            self.regions[reg_prev].fix_upper_edge = false;
            let reg = self.below_of(reg_prev)?;
            let mut e = self.regions[reg].e_up;

            if self.mesh.org(e) != self.mesh.org(e_prev) {
                if !self.regions[reg].fix_upper_edge {
                    // Last left-going edge: the region below stays open.
                    self.finish_region(reg_prev)?;
                    break;
                }
                let lprev = self.mesh.lprev(e_prev);
                e = self.mesh.connect(lprev, e.sym())?;
                self.fix_upper_edge(reg, e)?;
            }

            if self.mesh.onext(e_prev) != e {
                let oprev = self.mesh.oprev(e);
                self.mesh.splice(oprev, e)?;
                self.mesh.splice(e_prev, e)?;
            }
            self.finish_region(reg_prev)?;
            e_prev = self.regions[reg].e_up;
            reg_prev = reg;
        }
        Ok(e_prev)
    }

    /// Adds a region below `reg_up` for every right-going edge from `first`
    /// up to (not including) `last`, in counter-clockwise order around the
    /// event. `top_left` is the edge just above them in the event's ring;
    /// when absent it is found from the dictionary.
    ///
    /// Windings are assigned from the top down and edges that turn out to
    /// coincide are merged. With `clean_up` the dirty regions are walked
    /// before returning.
    pub(super) fn add_right_edges(
        &mut self,
        reg_up: RegionKey,
        first: HalfEdgeId,
        last: HalfEdgeId,
        top_left: Option<HalfEdgeId>,
        clean_up: bool,
    ) -> Result<()> {
        let mut e = first;
        loop {
            self.add_region_below(reg_up, e.sym())?;
            e = self.mesh.onext(e);
            if e == last {
                break;
            }
        }

        let top_left = match top_left {
            Some(e) => e,
            None => {
                let below = self.below_of(reg_up)?;
                self.mesh.rprev(self.regions[below].e_up)
            }
        };

        let mut reg_prev = reg_up;
        let mut e_prev = top_left;
        let mut first_time = true;
        loop {
            let reg = self.below_of(reg_prev)?;
            let e = self.regions[reg].e_up.sym();
            if self.mesh.org(e) != self.mesh.org(e_prev) {
                break;
            }

            if self.mesh.onext(e) != e_prev {
                // Move e to sit just below e_prev in the vertex ring.
                let oprev = self.mesh.oprev(e);
                self.mesh.splice(oprev, e)?;
                let prev_oprev = self.mesh.oprev(e_prev);
                self.mesh.splice(prev_oprev, e)?;
            }
            let n = self.regions[reg_prev].winding_number - self.mesh.winding(e);
            let inside = self.is_winding_inside(n);
            self.regions[reg].winding_number = n;
            self.regions[reg].inside = inside;

            self.regions[reg_prev].dirty = true;
            if !first_time && self.check_for_right_splice(reg_prev)? {
                self.mesh.add_winding(e, e_prev);
                self.delete_region(reg_prev);
                self.mesh.delete_edge(e_prev)?;
            }
            first_time = false;
            reg_prev = reg;
            e_prev = e;
        }
        self.regions[reg_prev].dirty = true;

        if clean_up {
            self.walk_dirty_regions(reg_prev)?;
        }
        Ok(())
    }
}
