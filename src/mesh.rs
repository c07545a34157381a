// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Half-edge planar subdivision.
//
// Edges are stored in pairs: one `EdgeKey` owns both directed halves, and a
// `HalfEdgeId` picks a side. `sym` flips the side and never touches storage.
// Every half-edge sits on two rings at once: `onext` around its origin vertex
// and `lnext` around its left face. All mutation goes through a handful of
// primitives that keep both rings closed.
//
// Records live in allocator-backed pools with generational keys, so a handle
// that outlives its record (or a `clear`) resolves to nothing instead of to
// an unrelated record.

mod triangulate;

use slotmap::{new_key_type, Key};

use crate::bucketalloc::{Pool, RecordKind, SharedAllocator};
use crate::error::Result;
use crate::geom::{vert_ccw, vert_leq, Point, Real};

new_key_type! {
    pub struct VertexKey;
    pub struct EdgeKey;
    pub struct FaceKey;
}

/// One directed side of an edge pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HalfEdgeId {
    pub pair: EdgeKey,
    pub rev: bool,
}

impl HalfEdgeId {
    #[inline]
    pub fn new(pair: EdgeKey) -> Self {
        Self { pair, rev: false }
    }

    /// The opposite half of the same edge.
    #[inline]
    pub fn sym(self) -> Self {
        Self {
            pair: self.pair,
            rev: !self.rev,
        }
    }

    #[inline]
    fn side(self) -> usize {
        self.rev as usize
    }
}

#[derive(Debug, Clone)]
pub struct Vertex {
    pub an_edge: HalfEdgeId,
    /// Position in the caller's space (z is zero for 2D input).
    pub coords: [Real; 3],
    /// Position on the sweep plane.
    pub pos: Point,
    /// Index of the input vertex this came from; `None` for vertices the
    /// sweep created at intersections.
    pub source: Option<u32>,
}

impl Vertex {
    fn new(an_edge: HalfEdgeId) -> Self {
        Self {
            an_edge,
            coords: [0.0; 3],
            pos: Point::default(),
            source: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Face {
    pub an_edge: HalfEdgeId,
    /// Winding number of the region this face was closed off from.
    pub winding: i32,
    pub inside: bool,
}

#[derive(Debug, Clone)]
pub struct HalfEdge {
    /// Next half-edge counter-clockwise around the origin.
    pub onext: HalfEdgeId,
    /// Next half-edge counter-clockwise around the left face.
    pub lnext: HalfEdgeId,
    pub org: VertexKey,
    /// `None` only once the face has been zapped.
    pub lface: Option<FaceKey>,
    /// Change in winding number when crossing from the right face to the left.
    pub winding: i32,
}

impl HalfEdge {
    fn loose(onext: HalfEdgeId, lnext: HalfEdgeId) -> Self {
        Self {
            onext,
            lnext,
            org: VertexKey::null(),
            lface: None,
            winding: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdgePair {
    half: [HalfEdge; 2],
}

/// The half-edge mesh.
#[derive(Debug)]
pub struct Mesh {
    verts: Pool<VertexKey, Vertex>,
    edges: Pool<EdgeKey, EdgePair>,
    faces: Pool<FaceKey, Face>,
}

impl Mesh {
    pub fn new(alloc: SharedAllocator) -> Self {
        Self {
            verts: Pool::new(RecordKind::Vertex, alloc.clone()),
            edges: Pool::new(RecordKind::Edge, alloc.clone()),
            faces: Pool::new(RecordKind::Face, alloc),
        }
    }

    /// Drops every record and returns the budget to the allocator.
    pub fn clear(&mut self) {
        self.verts.clear();
        self.edges.clear();
        self.faces.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.verts.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex_keys(&self) -> Vec<VertexKey> {
        self.verts.keys().collect()
    }

    /// One half-edge per edge pair, in storage order.
    pub fn edge_keys(&self) -> Vec<HalfEdgeId> {
        self.edges.keys().map(HalfEdgeId::new).collect()
    }

    pub fn face_keys(&self) -> Vec<FaceKey> {
        self.faces.keys().collect()
    }

    pub fn contains_edge(&self, e: HalfEdgeId) -> bool {
        self.edges.contains_key(e.pair)
    }

    pub fn contains_vertex(&self, v: VertexKey) -> bool {
        self.verts.contains_key(v)
    }

    pub fn contains_face(&self, f: FaceKey) -> bool {
        self.faces.contains_key(f)
    }

    // Record access

    #[inline]
    pub fn vertex(&self, v: VertexKey) -> &Vertex {
        &self.verts[v]
    }

    #[inline]
    pub fn vertex_mut(&mut self, v: VertexKey) -> &mut Vertex {
        &mut self.verts[v]
    }

    #[inline]
    pub fn face(&self, f: FaceKey) -> &Face {
        &self.faces[f]
    }

    #[inline]
    pub fn face_mut(&mut self, f: FaceKey) -> &mut Face {
        &mut self.faces[f]
    }

    #[inline]
    pub fn half(&self, e: HalfEdgeId) -> &HalfEdge {
        &self.edges[e.pair].half[e.side()]
    }

    #[inline]
    fn half_mut(&mut self, e: HalfEdgeId) -> &mut HalfEdge {
        &mut self.edges[e.pair].half[e.side()]
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &Vertex)> + '_ {
        self.verts.iter()
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceKey, &Face)> + '_ {
        self.faces.iter()
    }

    // Navigation

    #[inline]
    pub fn onext(&self, e: HalfEdgeId) -> HalfEdgeId {
        self.half(e).onext
    }

    #[inline]
    pub fn lnext(&self, e: HalfEdgeId) -> HalfEdgeId {
        self.half(e).lnext
    }

    #[inline]
    pub fn org(&self, e: HalfEdgeId) -> VertexKey {
        self.half(e).org
    }

    #[inline]
    pub fn dst(&self, e: HalfEdgeId) -> VertexKey {
        self.half(e.sym()).org
    }

    #[inline]
    pub fn lface(&self, e: HalfEdgeId) -> Option<FaceKey> {
        self.half(e).lface
    }

    #[inline]
    pub fn rface(&self, e: HalfEdgeId) -> Option<FaceKey> {
        self.half(e.sym()).lface
    }

    #[inline]
    pub fn winding(&self, e: HalfEdgeId) -> i32 {
        self.half(e).winding
    }

    pub fn set_winding(&mut self, e: HalfEdgeId, winding: i32) {
        self.half_mut(e).winding = winding;
    }

    #[inline]
    pub fn oprev(&self, e: HalfEdgeId) -> HalfEdgeId {
        self.lnext(e.sym())
    }

    #[inline]
    pub fn lprev(&self, e: HalfEdgeId) -> HalfEdgeId {
        self.onext(e).sym()
    }

    #[inline]
    pub fn dprev(&self, e: HalfEdgeId) -> HalfEdgeId {
        self.lnext(e).sym()
    }

    #[inline]
    pub fn rprev(&self, e: HalfEdgeId) -> HalfEdgeId {
        self.onext(e.sym())
    }

    #[inline]
    pub fn dnext(&self, e: HalfEdgeId) -> HalfEdgeId {
        self.rprev(e).sym()
    }

    #[inline]
    pub fn rnext(&self, e: HalfEdgeId) -> HalfEdgeId {
        self.oprev(e).sym()
    }

    #[inline]
    pub fn pos(&self, v: VertexKey) -> Point {
        self.verts[v].pos
    }

    #[inline]
    pub fn org_pos(&self, e: HalfEdgeId) -> Point {
        self.pos(self.org(e))
    }

    #[inline]
    pub fn dst_pos(&self, e: HalfEdgeId) -> Point {
        self.pos(self.dst(e))
    }

    #[inline]
    pub fn edge_goes_left(&self, e: HalfEdgeId) -> bool {
        vert_leq(self.dst_pos(e), self.org_pos(e))
    }

    #[inline]
    pub fn edge_goes_right(&self, e: HalfEdgeId) -> bool {
        vert_leq(self.org_pos(e), self.dst_pos(e))
    }

    /// Folds the winding contribution of `src` into `dst` (both halves).
    pub fn add_winding(&mut self, dst: HalfEdgeId, src: HalfEdgeId) {
        let w = self.winding(src);
        let w_sym = self.winding(src.sym());
        self.half_mut(dst).winding += w;
        self.half_mut(dst.sym()).winding += w_sym;
    }

    pub fn is_inside(&self, f: Option<FaceKey>) -> bool {
        f.and_then(|f| self.faces.get(f)).map_or(false, |face| face.inside)
    }

    // Ring surgery

    /// Exchanges `a.onext` and `b.onext`, fixing up the matching `lnext`
    /// links. Applied twice with the same arguments it is the identity.
    fn splice_rings(&mut self, a: HalfEdgeId, b: HalfEdgeId) {
        let a_onext = self.onext(a);
        let b_onext = self.onext(b);
        self.half_mut(a_onext.sym()).lnext = b;
        self.half_mut(b_onext.sym()).lnext = a;
        self.half_mut(a).onext = b_onext;
        self.half_mut(b).onext = a_onext;
    }

    fn make_pair(&mut self) -> Result<HalfEdgeId> {
        let pair = self.edges.insert_with_key(|key| {
            let e = HalfEdgeId::new(key);
            EdgePair {
                half: [HalfEdge::loose(e, e.sym()), HalfEdge::loose(e.sym(), e)],
            }
        })?;
        Ok(HalfEdgeId::new(pair))
    }

    fn set_org_ring(&mut self, start: HalfEdgeId, v: VertexKey) {
        let mut e = start;
        loop {
            self.half_mut(e).org = v;
            e = self.onext(e);
            if e == start {
                break;
            }
        }
    }

    fn set_lface_ring(&mut self, start: HalfEdgeId, f: Option<FaceKey>) {
        let mut e = start;
        loop {
            self.half_mut(e).lface = f;
            e = self.lnext(e);
            if e == start {
                break;
            }
        }
    }

    fn make_vertex(&mut self, e_orig: HalfEdgeId) -> Result<VertexKey> {
        let v = self.verts.insert(Vertex::new(e_orig))?;
        self.set_org_ring(e_orig, v);
        Ok(v)
    }

    fn make_face(&mut self, e_orig: HalfEdgeId, inside: bool) -> Result<FaceKey> {
        let f = self.faces.insert(Face {
            an_edge: e_orig,
            winding: 0,
            inside,
        })?;
        self.set_lface_ring(e_orig, Some(f));
        Ok(f)
    }

    fn kill_vertex(&mut self, v: VertexKey, new_org: Option<VertexKey>) {
        if let Some(vertex) = self.verts.remove(v) {
            if let Some(new_org) = new_org {
                self.set_org_ring(vertex.an_edge, new_org);
            }
        }
    }

    fn kill_face(&mut self, f: Option<FaceKey>, new_lface: Option<FaceKey>) {
        if let Some(face) = f.and_then(|f| self.faces.remove(f)) {
            self.set_lface_ring(face.an_edge, new_lface);
        }
    }

    // Primitives

    /// Creates an isolated edge with two new vertices and one new face.
    pub fn make_edge(&mut self) -> Result<HalfEdgeId> {
        let e = self.make_pair()?;
        self.make_vertex(e)?;
        self.make_vertex(e.sym())?;
        self.make_face(e, false)?;
        Ok(e)
    }

    /// Joins or separates the origin rings and the face rings of `e_org`
    /// and `e_dst`.
    ///
    /// If the origins differ they are merged, discarding `e_dst`'s origin;
    /// otherwise the vertex is split in two. Likewise, distinct left faces
    /// are merged (discarding `e_dst`'s) and a shared one is split.
    pub fn splice(&mut self, e_org: HalfEdgeId, e_dst: HalfEdgeId) -> Result<()> {
        if e_org == e_dst {
            return Ok(());
        }

        let joining_vertices = self.org(e_dst) != self.org(e_org);
        if joining_vertices {
            self.kill_vertex(self.org(e_dst), Some(self.org(e_org)));
        }
        let joining_loops = self.lface(e_dst) != self.lface(e_org);
        if joining_loops {
            self.kill_face(self.lface(e_dst), self.lface(e_org));
        }

        self.splice_rings(e_dst, e_org);

        if !joining_vertices {
            self.make_vertex(e_dst)?;
            let org = self.org(e_org);
            self.vertex_mut(org).an_edge = e_org;
        }
        if !joining_loops {
            let lface = self.lface(e_org);
            self.make_face(e_dst, self.is_inside(lface))?;
            if let Some(f) = lface {
                self.face_mut(f).an_edge = e_org;
            }
        }
        Ok(())
    }

    /// Removes the edge `e_del`, merging faces or dropping vertices that
    /// become isolated.
    pub fn delete_edge(&mut self, e_del: HalfEdgeId) -> Result<()> {
        let e_sym = e_del.sym();

        let joining_loops = self.lface(e_del) != self.rface(e_del);
        if joining_loops {
            self.kill_face(self.lface(e_del), self.rface(e_del));
        }

        if self.onext(e_del) == e_del {
            self.kill_vertex(self.org(e_del), None);
        } else {
            if let Some(rf) = self.rface(e_del) {
                let oprev = self.oprev(e_del);
                self.face_mut(rf).an_edge = oprev;
            }
            let org = self.org(e_del);
            let onext = self.onext(e_del);
            self.vertex_mut(org).an_edge = onext;

            let oprev = self.oprev(e_del);
            self.splice_rings(e_del, oprev);
            if !joining_loops {
                let inside = self.is_inside(self.lface(e_del));
                self.make_face(e_del, inside)?;
            }
        }

        if self.onext(e_sym) == e_sym {
            self.kill_vertex(self.org(e_sym), None);
            self.kill_face(self.lface(e_sym), None);
        } else {
            if let Some(lf) = self.lface(e_del) {
                let oprev = self.oprev(e_sym);
                self.face_mut(lf).an_edge = oprev;
            }
            let org = self.org(e_sym);
            let onext = self.onext(e_sym);
            self.vertex_mut(org).an_edge = onext;
            let oprev = self.oprev(e_sym);
            self.splice_rings(e_sym, oprev);
        }

        self.edges.remove(e_del.pair);
        Ok(())
    }

    /// Adds an edge `e_new` with `e_new.org == e_org.dst` and a fresh
    /// destination vertex, placed right after `e_org` around the left face.
    pub fn add_edge_vertex(&mut self, e_org: HalfEdgeId) -> Result<HalfEdgeId> {
        let e_new = self.make_pair()?;
        let e_new_sym = e_new.sym();

        let lnext = self.lnext(e_org);
        self.splice_rings(e_new, lnext);

        let dst = self.dst(e_org);
        self.half_mut(e_new).org = dst;
        self.make_vertex(e_new_sym)?;

        let lface = self.lface(e_org);
        self.half_mut(e_new).lface = lface;
        self.half_mut(e_new_sym).lface = lface;
        Ok(e_new)
    }

    /// Splits `e_org` in two at a new vertex. `e_org` keeps its origin and
    /// ends at the new vertex; the returned edge runs from the new vertex to
    /// the old destination and inherits the winding.
    pub fn split_edge(&mut self, e_org: HalfEdgeId) -> Result<HalfEdgeId> {
        let e_new = self.add_edge_vertex(e_org)?.sym();

        let org_sym = e_org.sym();
        let oprev = self.oprev(org_sym);
        self.splice_rings(org_sym, oprev);
        self.splice_rings(org_sym, e_new);

        let mid = self.org(e_new);
        self.half_mut(org_sym).org = mid;
        let dst = self.dst(e_new);
        self.vertex_mut(dst).an_edge = e_new.sym();
        let rface = self.rface(e_org);
        self.half_mut(e_new.sym()).lface = rface;
        self.half_mut(e_new).winding = self.winding(e_org);
        self.half_mut(e_new.sym()).winding = self.winding(org_sym);
        Ok(e_new)
    }

    /// Creates an edge from `e_org.dst` to `e_dst.org`. If both lie on the
    /// same face the face is split and the new left face is fresh; otherwise
    /// the two faces merge.
    pub fn connect(&mut self, e_org: HalfEdgeId, e_dst: HalfEdgeId) -> Result<HalfEdgeId> {
        let e_new = self.make_pair()?;
        let e_new_sym = e_new.sym();

        let joining_loops = self.lface(e_dst) != self.lface(e_org);
        if joining_loops {
            self.kill_face(self.lface(e_dst), self.lface(e_org));
        }

        let lnext = self.lnext(e_org);
        self.splice_rings(e_new, lnext);
        self.splice_rings(e_new_sym, e_dst);

        let org = self.dst(e_org);
        self.half_mut(e_new).org = org;
        let dst = self.org(e_dst);
        self.half_mut(e_new_sym).org = dst;

        let lface = self.lface(e_org);
        self.half_mut(e_new).lface = lface;
        self.half_mut(e_new_sym).lface = lface;
        if let Some(f) = lface {
            self.face_mut(f).an_edge = e_new_sym;
        }

        if !joining_loops {
            self.make_face(e_new, self.is_inside(lface))?;
        }
        Ok(e_new)
    }

    /// Destroys a face. Edges left with no face on either side go with it,
    /// as do vertices left with no edges.
    pub fn zap_face(&mut self, f_zap: FaceKey) {
        let Some(face) = self.faces.remove(f_zap) else {
            return;
        };
        let start = face.an_edge;
        let mut e_next = self.lnext(start);
        loop {
            let e = e_next;
            e_next = self.lnext(e);

            self.half_mut(e).lface = None;
            if self.rface(e).is_none() {
                if self.onext(e) == e {
                    self.kill_vertex(self.org(e), None);
                } else {
                    let org = self.org(e);
                    let onext = self.onext(e);
                    self.vertex_mut(org).an_edge = onext;
                    let oprev = self.oprev(e);
                    self.splice_rings(e, oprev);
                }
                let e_sym = e.sym();
                if self.onext(e_sym) == e_sym {
                    self.kill_vertex(self.org(e_sym), None);
                } else {
                    let org = self.org(e_sym);
                    let onext = self.onext(e_sym);
                    self.vertex_mut(org).an_edge = onext;
                    let oprev = self.oprev(e_sym);
                    self.splice_rings(e_sym, oprev);
                }
                self.edges.remove(e.pair);
            }
            if e == start {
                break;
            }
        }
    }

    pub fn count_face_verts(&self, f: FaceKey) -> usize {
        let start = self.face(f).an_edge;
        let mut e = start;
        let mut n = 0;
        loop {
            n += 1;
            e = self.lnext(e);
            if e == start {
                break;
            }
        }
        n
    }

    /// Half-edges around `f`, starting at its anchor edge.
    pub fn face_edges(&self, f: FaceKey) -> Vec<HalfEdgeId> {
        let start = self.face(f).an_edge;
        let mut out = Vec::new();
        let mut e = start;
        loop {
            out.push(e);
            e = self.lnext(e);
            if e == start {
                break;
            }
        }
        out
    }

    // Whole-mesh passes

    /// Deletes edges between two interior faces when the merged face stays
    /// convex and has at most `max_verts` vertices.
    pub fn merge_convex_faces(&mut self, max_verts: usize) -> Result<()> {
        for e in self.edge_keys() {
            if !self.contains_edge(e) {
                continue;
            }
            let e_sym = e.sym();
            let (Some(left), Some(right)) = (self.lface(e), self.lface(e_sym)) else {
                continue;
            };
            if left == right || !self.face(left).inside || !self.face(right).inside {
                continue;
            }
            let left_nv = self.count_face_verts(left);
            let right_nv = self.count_face_verts(right);
            if left_nv + right_nv - 2 > max_verts {
                continue;
            }

            //      vf--ve--vd
            //          ^|
            // left   e ||   right
            //          |v
            //      va--vb--vc
            let va = self.org_pos(self.lprev(e));
            let vb = self.org_pos(e);
            let vc = self.dst_pos(self.lnext(e_sym));
            let vd = self.org_pos(self.lprev(e_sym));
            let ve = self.org_pos(e_sym);
            let vf = self.dst_pos(self.lnext(e));

            if vert_ccw(va, vb, vc)? && vert_ccw(vd, ve, vf)? {
                self.delete_edge(e)?;
            }
        }
        Ok(())
    }

    /// Gives boundary edges (interior on exactly one side) a winding of
    /// `value` towards the interior. Other edges get zero, or are removed
    /// when `keep_only_boundary` is set.
    pub fn set_winding_number(&mut self, value: i32, keep_only_boundary: bool) -> Result<()> {
        for e in self.edge_keys() {
            if !self.contains_edge(e) {
                continue;
            }
            let left_inside = self.is_inside(self.lface(e));
            let right_inside = self.is_inside(self.rface(e));
            if left_inside != right_inside {
                let w = if left_inside { value } else { -value };
                self.half_mut(e).winding = w;
                self.half_mut(e.sym()).winding = -w;
            } else if keep_only_boundary {
                self.delete_edge(e)?;
            } else {
                self.half_mut(e).winding = 0;
                self.half_mut(e.sym()).winding = 0;
            }
        }
        Ok(())
    }

    /// Zaps every face not marked inside.
    pub fn discard_exterior(&mut self) {
        for f in self.face_keys() {
            if self.faces.get(f).map_or(false, |face| !face.inside) {
                self.zap_face(f);
            }
        }
    }

    /// Checks the ring invariants of every face and vertex.
    ///
    /// # Errors
    ///
    /// Returns a short description of the first broken invariant.
    pub fn check_mesh(&self) -> std::result::Result<(), &'static str> {
        let limit = 2 * self.edges.len() + 1;
        for (f, face) in self.faces.iter() {
            let mut e = face.an_edge;
            let mut steps = 0;
            loop {
                if !self.contains_edge(e) {
                    return Err("face ring references a deleted edge");
                }
                if self.onext(self.lnext(e)).sym() != e {
                    return Err("lnext/onext rings disagree");
                }
                if self.lnext(self.onext(e).sym()) != e {
                    return Err("onext/lnext rings disagree");
                }
                if self.lface(e) != Some(f) {
                    return Err("half-edge on face ring names another face");
                }
                e = self.lnext(e);
                steps += 1;
                if e == face.an_edge {
                    break;
                }
                if steps > limit {
                    return Err("face ring does not close");
                }
            }
        }
        for (v, vertex) in self.verts.iter() {
            let mut e = vertex.an_edge;
            let mut steps = 0;
            loop {
                if !self.contains_edge(e) {
                    return Err("vertex ring references a deleted edge");
                }
                if self.org(e) != v {
                    return Err("half-edge on vertex ring names another origin");
                }
                e = self.onext(e);
                steps += 1;
                if e == vertex.an_edge {
                    break;
                }
                if steps > limit {
                    return Err("vertex ring does not close");
                }
            }
        }
        for (_, pair) in self.edges.iter() {
            for half in &pair.half {
                if !self.verts.contains_key(half.org) {
                    return Err("half-edge origin was deleted");
                }
                if let Some(f) = half.lface {
                    if !self.faces.contains_key(f) {
                        return Err("half-edge face was deleted");
                    }
                }
            }
        }
        Ok(())
    }
}
