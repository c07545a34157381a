// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Output extraction: read-only views of a finished mesh.

use slotmap::SecondaryMap;

use super::{ElementType, TESS_UNDEF};
use crate::error::{InvalidInput, Result};
use crate::geom::Real;
use crate::mesh::{FaceKey, Mesh, VertexKey};

/// Output vertices, `dims` coordinates each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBuffer {
    pub coords: Vec<Real>,
    pub dims: usize,
    /// Input index of each vertex, or [`TESS_UNDEF`] for vertices created
    /// at intersections.
    pub source_indices: Vec<u32>,
}

impl VertexBuffer {
    fn with_capacity(count: usize, dims: usize) -> Self {
        Self {
            coords: Vec::with_capacity(count * dims),
            dims,
            source_indices: Vec::with_capacity(count),
        }
    }

    fn push(&mut self, coords: &[Real; 3], source: Option<u32>) {
        self.coords.extend_from_slice(&coords[..self.dims]);
        self.source_indices.push(source.unwrap_or(TESS_UNDEF));
    }

    pub fn len(&self) -> usize {
        self.source_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_indices.is_empty()
    }

    /// Coordinates of vertex `i`.
    pub fn position(&self, i: usize) -> &[Real] {
        &self.coords[i * self.dims..(i + 1) * self.dims]
    }
}

/// Polygons of at most `poly_size` vertices; triangles when `poly_size`
/// is 3. Each polygon takes `poly_size` slots of `elements`, unused slots
/// hold [`TESS_UNDEF`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonMesh {
    pub vertices: VertexBuffer,
    pub poly_size: usize,
    pub elements: Vec<u32>,
}

impl PolygonMesh {
    pub fn len(&self) -> usize {
        self.elements.len() / self.poly_size.max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Vertex indices of polygon `i`, without padding.
    pub fn polygon(&self, i: usize) -> &[u32] {
        trim(&self.elements[i * self.poly_size..(i + 1) * self.poly_size])
    }

    pub fn polygons(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.elements.chunks_exact(self.poly_size.max(1)).map(trim)
    }
}

/// Polygons plus, for each polygon edge, the index of the polygon across it
/// ([`TESS_UNDEF`] on the boundary). Edge `k` runs from vertex `k` to vertex
/// `k + 1` of the polygon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectedMesh {
    pub vertices: VertexBuffer,
    pub poly_size: usize,
    /// `poly_size` vertex slots followed by `poly_size` neighbour slots per
    /// polygon.
    pub elements: Vec<u32>,
}

impl ConnectedMesh {
    pub fn len(&self) -> usize {
        self.elements.len() / (2 * self.poly_size).max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn polygon(&self, i: usize) -> &[u32] {
        let base = i * 2 * self.poly_size;
        trim(&self.elements[base..base + self.poly_size])
    }

    /// Neighbour slots of polygon `i`, one per edge of [`polygon`](Self::polygon).
    pub fn neighbours(&self, i: usize) -> &[u32] {
        let base = i * 2 * self.poly_size + self.poly_size;
        let n = self.polygon(i).len();
        &self.elements[base..base + n]
    }
}

/// Boundary loops between interior and exterior. Loop vertices are stored
/// consecutively; `elements` holds a `(first vertex, vertex count)` pair per
/// loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourSet {
    pub vertices: VertexBuffer,
    pub elements: Vec<u32>,
}

impl ContourSet {
    pub fn len(&self) -> usize {
        self.elements.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contour(&self, i: usize) -> (usize, usize) {
        (self.elements[2 * i] as usize, self.elements[2 * i + 1] as usize)
    }

    pub fn contours(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.elements
            .chunks_exact(2)
            .map(|pair| (pair[0] as usize, pair[1] as usize))
    }
}

/// The result of a tessellation run, shaped by the requested element type.
#[derive(Debug, Clone, PartialEq)]
pub enum Tessellation {
    Polygons(PolygonMesh),
    ConnectedPolygons(ConnectedMesh),
    Contours(ContourSet),
}

impl Tessellation {
    pub(crate) fn empty(element_type: ElementType, poly_size: usize, dims: usize) -> Self {
        let vertices = VertexBuffer {
            dims,
            ..VertexBuffer::default()
        };
        match element_type {
            ElementType::Triangles | ElementType::Polygons => Tessellation::Polygons(PolygonMesh {
                vertices,
                poly_size,
                elements: Vec::new(),
            }),
            ElementType::ConnectedPolygons => Tessellation::ConnectedPolygons(ConnectedMesh {
                vertices,
                poly_size,
                elements: Vec::new(),
            }),
            ElementType::BoundaryContours => Tessellation::Contours(ContourSet {
                vertices,
                elements: Vec::new(),
            }),
        }
    }

    pub fn element_count(&self) -> usize {
        match self {
            Tessellation::Polygons(m) => m.len(),
            Tessellation::ConnectedPolygons(m) => m.len(),
            Tessellation::Contours(c) => c.len(),
        }
    }

    pub fn vertices(&self) -> &VertexBuffer {
        match self {
            Tessellation::Polygons(m) => &m.vertices,
            Tessellation::ConnectedPolygons(m) => &m.vertices,
            Tessellation::Contours(c) => &c.vertices,
        }
    }

    /// The flat element buffer.
    pub fn elements(&self) -> &[u32] {
        match self {
            Tessellation::Polygons(m) => &m.elements,
            Tessellation::ConnectedPolygons(m) => &m.elements,
            Tessellation::Contours(c) => &c.elements,
        }
    }

    /// Triangles, when the output is polygons of size 3.
    pub fn triangles(&self) -> Option<impl Iterator<Item = [u32; 3]> + '_> {
        match self {
            Tessellation::Polygons(m) if m.poly_size == 3 => Some(
                m.elements
                    .chunks_exact(3)
                    .map(|tri| [tri[0], tri[1], tri[2]]),
            ),
            _ => None,
        }
    }

    pub fn polygons(&self) -> Option<&PolygonMesh> {
        match self {
            Tessellation::Polygons(m) => Some(m),
            _ => None,
        }
    }

    pub fn connected(&self) -> Option<&ConnectedMesh> {
        match self {
            Tessellation::ConnectedPolygons(m) => Some(m),
            _ => None,
        }
    }

    pub fn contours(&self) -> Option<&ContourSet> {
        match self {
            Tessellation::Contours(c) => Some(c),
            _ => None,
        }
    }
}

fn trim(slots: &[u32]) -> &[u32] {
    let n = slots.iter().position(|&i| i == TESS_UNDEF).unwrap_or(slots.len());
    &slots[..n]
}

/// Interior faces in output order, and their vertices numbered in order of
/// first appearance.
struct Numbering {
    faces: Vec<FaceKey>,
    face_ids: SecondaryMap<FaceKey, u32>,
    vertices: Vec<VertexKey>,
    vertex_ids: SecondaryMap<VertexKey, u32>,
}

fn number_interior(mesh: &Mesh) -> Numbering {
    let mut faces = Vec::new();
    let mut face_ids = SecondaryMap::new();
    let mut vertex_ids: SecondaryMap<VertexKey, u32> = SecondaryMap::new();
    let mut order = Vec::new();
    for (f, face) in mesh.faces() {
        if !face.inside {
            continue;
        }
        for e in mesh.face_edges(f) {
            let v = mesh.org(e);
            if !vertex_ids.contains_key(v) {
                vertex_ids.insert(v, order.len() as u32);
                order.push(v);
            }
        }
        face_ids.insert(f, faces.len() as u32);
        faces.push(f);
    }
    Numbering {
        faces,
        face_ids,
        vertices: order,
        vertex_ids,
    }
}

/// Polygon or connected-polygon output from a mesh whose interior faces
/// have at most `poly_size` vertices.
pub(crate) fn polygons(mesh: &Mesh, element_type: ElementType, poly_size: usize, dims: usize) -> Result<Tessellation> {
    let numbering = number_interior(mesh);
    let mut vertices = VertexBuffer::with_capacity(numbering.vertices.len(), dims);
    for &v in &numbering.vertices {
        let vertex = mesh.vertex(v);
        vertices.push(&vertex.coords, vertex.source);
    }

    let connected = element_type == ElementType::ConnectedPolygons;
    let stride = if connected { 2 * poly_size } else { poly_size };
    let mut elements = Vec::with_capacity(numbering.faces.len() * stride);
    for &f in &numbering.faces {
        let edges = mesh.face_edges(f);
        if edges.len() > poly_size {
            return Err(InvalidInput::Topology("polygon larger than poly_size").into());
        }
        let pad = poly_size - edges.len();
        elements.extend(edges.iter().map(|&e| numbering.vertex_ids[mesh.org(e)]));
        elements.extend(std::iter::repeat(TESS_UNDEF).take(pad));

        if connected {
            elements.extend(edges.iter().map(|&e| {
                mesh.rface(e)
                    .and_then(|rf| numbering.face_ids.get(rf).copied())
                    .unwrap_or(TESS_UNDEF)
            }));
            elements.extend(std::iter::repeat(TESS_UNDEF).take(pad));
        }
    }

    Ok(if connected {
        Tessellation::ConnectedPolygons(ConnectedMesh {
            vertices,
            poly_size,
            elements,
        })
    } else {
        Tessellation::Polygons(PolygonMesh {
            vertices,
            poly_size,
            elements,
        })
    })
}

/// One loop per interior face. Vertices are repeated per loop, not shared.
pub(crate) fn contours(mesh: &Mesh, dims: usize) -> Tessellation {
    let mut vertices = VertexBuffer::with_capacity(mesh.vertex_count(), dims);
    let mut elements = Vec::new();
    for (f, face) in mesh.faces() {
        if !face.inside {
            continue;
        }
        let first = vertices.len() as u32;
        let edges = mesh.face_edges(f);
        for &e in &edges {
            let vertex = mesh.vertex(mesh.org(e));
            vertices.push(&vertex.coords, vertex.source);
        }
        elements.push(first);
        elements.push(edges.len() as u32);
    }
    Tessellation::Contours(ContourSet { vertices, elements })
}
