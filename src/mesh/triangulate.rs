// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Triangulation of the monotone interior faces left by the sweep.

use super::{FaceKey, HalfEdgeId, Mesh};
use crate::error::{InvalidInput, Result};
use crate::geom::{edge_sign, vert_flat, vert_leq};

impl Mesh {
    /// Triangulates one face that is monotone in the sweep direction.
    ///
    /// Edges run counter-clockwise around the face. Starting from the
    /// rightmost vertex, the upper and lower chains are advanced towards the
    /// left; whenever the chain behind the advancing side turns convexly a
    /// triangle is cut off with `connect`. Only strictly convex turns are
    /// cut. What remains is fanned from the leftmost vertex, after any run of
    /// vertices on a line through it has been fanned from its far end.
    ///
    /// # Errors
    ///
    /// Walks that fail to make progress within the size of the face are
    /// reported as [`InvalidInput::Topology`]; allocator failures propagate.
    pub fn tessellate_mono_region(&mut self, face: FaceKey) -> Result<()> {
        let budget = 4 * self.count_face_verts(face) + 4;
        let mut up = self.face(face).an_edge;
        if self.lnext(up) == up || self.lnext(self.lnext(up)) == up {
            return Ok(());
        }

        let mut steps = 0;
        let mut tick = |what: &'static str| -> Result<()> {
            steps += 1;
            if steps > budget {
                Err(InvalidInput::Topology(what).into())
            } else {
                Ok(())
            }
        };

        // Find the half-edge whose origin is rightmost. The sweep leaves
        // `an_edge` close to it.
        while vert_leq(self.dst_pos(up), self.org_pos(up)) {
            up = self.lprev(up);
            tick("monotone region search")?;
        }
        while vert_leq(self.org_pos(up), self.dst_pos(up)) {
            up = self.lnext(up);
            tick("monotone region search")?;
        }
        let mut lo = self.lprev(up);

        while self.lnext(up) != lo {
            tick("monotone chain walk")?;
            if vert_leq(self.dst_pos(up), self.org_pos(lo)) {
                // up.dst is on the left: cut triangles off lo.org.
                while self.lnext(lo) != up && self.lower_chain_convex(lo)? {
                    lo = self.connect(self.lnext(lo), lo)?.sym();
                    tick("monotone chain walk")?;
                }
                lo = self.lprev(lo);
            } else {
                // lo.org is on the left: cut triangles off up.dst.
                while self.lnext(lo) != up && self.upper_chain_convex(up)? {
                    up = self.connect(up, self.lprev(up))?.sym();
                    tick("monotone chain walk")?;
                }
                up = self.lnext(up);
            }
        }

        // lo.org == up.dst is now the leftmost vertex. Edges lying on a line
        // through it would give flat fan triangles, so those runs are fanned
        // from the first vertex off the line instead.
        let left = self.org_pos(lo);
        let mut u = self.lnext(lo);
        while u != up && vert_flat(left, self.org_pos(u), self.dst_pos(u))? {
            u = self.lnext(u);
            tick("monotone fan")?;
        }
        if u != up && u != self.lnext(lo) {
            while self.org(u) != self.org(lo) && !self.is_triangle(u) {
                u = self.connect(u, self.lprev(u))?.sym();
                tick("monotone fan")?;
            }
            if self.org(u) == self.org(lo) {
                lo = u;
            }
        }

        let mut d = self.lprev(up);
        while d != lo && vert_flat(left, self.org_pos(d), self.dst_pos(d))? {
            d = self.lprev(d);
            tick("monotone fan")?;
        }
        if d != lo && d != self.lprev(up) {
            while self.dst(d) != self.org(lo) && !self.is_triangle(d) {
                d = self.connect(self.lnext(d), d)?.sym();
                tick("monotone fan")?;
            }
            if self.dst(d) == self.org(lo) {
                up = d;
            }
        }

        while self.lnext(self.lnext(lo)) != up {
            lo = self.connect(self.lnext(lo), lo)?.sym();
            tick("monotone fan")?;
        }
        Ok(())
    }

    fn is_triangle(&self, e: HalfEdgeId) -> bool {
        self.lnext(self.lnext(self.lnext(e))) == e
    }

    fn lower_chain_convex(&self, lo: HalfEdgeId) -> Result<bool> {
        let next = self.lnext(lo);
        if self.edge_goes_left(next) {
            return Ok(true);
        }
        Ok(edge_sign(self.org_pos(lo), self.dst_pos(lo), self.dst_pos(next))? < 0.0)
    }

    fn upper_chain_convex(&self, up: HalfEdgeId) -> Result<bool> {
        let prev = self.lprev(up);
        if self.edge_goes_right(prev) {
            return Ok(true);
        }
        Ok(edge_sign(self.dst_pos(up), self.org_pos(up), self.org_pos(prev))? > 0.0)
    }

    /// Triangulates every interior face. Faces created along the way are
    /// already triangles and are not revisited.
    pub fn tessellate_interior(&mut self) -> Result<()> {
        for f in self.face_keys() {
            if self.contains_face(f) && self.face(f).inside {
                self.tessellate_mono_region(f)?;
            }
        }
        Ok(())
    }
}
