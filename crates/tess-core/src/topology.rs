use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::{EDGE_COUNT, VERTEX_COUNT};
use crate::error::{Result, TopologyError};

/// A point in 4-space.
///
/// Hypercube vertices have every coordinate in {-1, +1}; rotated points are
/// general finite 4-vectors of the same norm.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex4D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Vertex4D {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Hypercube corner for `index`: bit k set → +1 on axis k, else -1.
    /// Bit 0 → x, bit 1 → y, bit 2 → z, bit 3 → w.
    pub fn from_index(index: usize) -> Self {
        let sign = |bit: usize| if index & (1 << bit) != 0 { 1.0 } else { -1.0 };
        Self::new(sign(0), sign(1), sign(2), sign(3))
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Euclidean norm in 4-space.
    pub fn norm(self) -> f64 {
        self.to_array().iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.to_array().iter().all(|c| c.is_finite())
    }

    /// Sign pattern as a 4-bit mask (bit k set iff coordinate k is non-negative).
    pub fn sign_mask(self) -> u8 {
        self.to_array()
            .iter()
            .enumerate()
            .fold(0u8, |mask, (k, c)| if *c >= 0.0 { mask | (1 << k) } else { mask })
    }

    /// Number of axes on which the sign vectors of `self` and `other` differ.
    pub fn hamming(self, other: Self) -> u32 {
        (self.sign_mask() ^ other.sign_mask()).count_ones()
    }
}

/// Unordered vertex pair, stored with `a < b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
}

impl Edge {
    pub fn new(i: usize, j: usize) -> Self {
        Self {
            a: i.min(j),
            b: i.max(j),
        }
    }
}

/// Fixed combinatorial structure of the 4-cube.
///
/// Built once, validated eagerly, immutable afterwards.
#[derive(Clone, Debug)]
pub struct HypercubeTopology {
    vertices: [Vertex4D; VERTEX_COUNT],
    edges: [Edge; EDGE_COUNT],
}

impl HypercubeTopology {
    /// Enumerate the 16 corners and join every pair at Hamming distance 1.
    pub fn new() -> Result<Self> {
        let vertices: Vec<Vertex4D> = (0..VERTEX_COUNT).map(Vertex4D::from_index).collect();

        let mut edges = Vec::with_capacity(EDGE_COUNT);
        for i in 0..vertices.len() {
            for j in (i + 1)..vertices.len() {
                if vertices[i].hamming(vertices[j]) == 1 {
                    edges.push(Edge::new(i, j));
                }
            }
        }

        Self::from_parts(vertices, edges)
    }

    /// Validate externally supplied parts. Every structural defect is reported
    /// as a `TopologyError` rather than silently under- or over-rendering.
    pub fn from_parts(vertices: Vec<Vertex4D>, edges: Vec<Edge>) -> Result<Self> {
        if vertices.len() != VERTEX_COUNT {
            return Err(TopologyError::VertexCount {
                expected: VERTEX_COUNT,
                found: vertices.len(),
            });
        }

        let mut seen = HashSet::with_capacity(edges.len());
        for edge in &edges {
            for index in [edge.a, edge.b] {
                if index >= vertices.len() {
                    return Err(TopologyError::VertexOutOfRange {
                        index,
                        len: vertices.len(),
                    });
                }
            }
            if edge.a == edge.b {
                return Err(TopologyError::SelfEdge(edge.a));
            }
            let distance = vertices[edge.a].hamming(vertices[edge.b]);
            if distance != 1 {
                return Err(TopologyError::NotAdjacent {
                    a: edge.a,
                    b: edge.b,
                    distance,
                });
            }
            if !seen.insert(Edge::new(edge.a, edge.b)) {
                return Err(TopologyError::DuplicateEdge(edge.a, edge.b));
            }
        }

        let found = edges.len();
        let edges: [Edge; EDGE_COUNT] = edges.try_into().map_err(|_| TopologyError::EdgeCount {
            expected: EDGE_COUNT,
            found,
        })?;
        let vertices = std::array::from_fn(|i| vertices[i]);

        Ok(Self { vertices, edges })
    }

    pub fn vertices(&self) -> &[Vertex4D; VERTEX_COUNT] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge; EDGE_COUNT] {
        &self.edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_bits_map_to_axes() {
        assert_eq!(Vertex4D::from_index(0), Vertex4D::new(-1.0, -1.0, -1.0, -1.0));
        assert_eq!(Vertex4D::from_index(1), Vertex4D::new(1.0, -1.0, -1.0, -1.0));
        assert_eq!(Vertex4D::from_index(8), Vertex4D::new(-1.0, -1.0, -1.0, 1.0));
        assert_eq!(Vertex4D::from_index(15), Vertex4D::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn test_vertices_unique_with_norm_two() {
        let topo = HypercubeTopology::new().unwrap();
        let masks: HashSet<u8> = topo.vertices().iter().map(|v| v.sign_mask()).collect();
        assert_eq!(masks.len(), VERTEX_COUNT);
        for v in topo.vertices() {
            assert!((v.norm() - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_exactly_32_edges() {
        let topo = HypercubeTopology::new().unwrap();
        assert_eq!(topo.edges().len(), EDGE_COUNT);
    }

    #[test]
    fn test_no_duplicate_or_self_edges() {
        let topo = HypercubeTopology::new().unwrap();
        let mut seen = HashSet::new();
        for e in topo.edges() {
            assert_ne!(e.a, e.b, "self edge on {}", e.a);
            assert!(seen.insert((e.a.min(e.b), e.a.max(e.b))), "duplicate {e:?}");
        }
    }

    #[test]
    fn test_edges_join_adjacent_corners() {
        let topo = HypercubeTopology::new().unwrap();
        let v = topo.vertices();
        for e in topo.edges() {
            assert_eq!(v[e.a].hamming(v[e.b]), 1, "edge {e:?}");
        }
    }

    #[test]
    fn test_every_vertex_has_degree_four() {
        let topo = HypercubeTopology::new().unwrap();
        let mut degree = [0usize; VERTEX_COUNT];
        for e in topo.edges() {
            degree[e.a] += 1;
            degree[e.b] += 1;
        }
        assert!(degree.iter().all(|&d| d == 4), "degrees: {degree:?}");
    }

    fn parts() -> (Vec<Vertex4D>, Vec<Edge>) {
        let topo = HypercubeTopology::new().unwrap();
        (topo.vertices().to_vec(), topo.edges().to_vec())
    }

    #[test]
    fn test_missing_edge_rejected() {
        let (vertices, mut edges) = parts();
        edges.pop();
        assert_eq!(
            HypercubeTopology::from_parts(vertices, edges).unwrap_err(),
            TopologyError::EdgeCount {
                expected: 32,
                found: 31
            }
        );
    }

    #[test]
    fn test_missing_vertex_rejected() {
        let (mut vertices, edges) = parts();
        vertices.pop();
        let err = HypercubeTopology::from_parts(vertices, edges).unwrap_err();
        assert!(matches!(err, TopologyError::VertexCount { found: 15, .. }));
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let (vertices, mut edges) = parts();
        edges[5] = Edge::new(edges[4].b, edges[4].a);
        let err = HypercubeTopology::from_parts(vertices, edges).unwrap_err();
        assert!(matches!(err, TopologyError::DuplicateEdge(..)), "{err}");
    }

    #[test]
    fn test_self_edge_rejected() {
        let (vertices, mut edges) = parts();
        edges[0] = Edge::new(3, 3);
        assert_eq!(
            HypercubeTopology::from_parts(vertices, edges).unwrap_err(),
            TopologyError::SelfEdge(3)
        );
    }

    #[test]
    fn test_diagonal_rejected() {
        let (vertices, mut edges) = parts();
        edges[0] = Edge::new(0, 15);
        assert_eq!(
            HypercubeTopology::from_parts(vertices, edges).unwrap_err(),
            TopologyError::NotAdjacent {
                a: 0,
                b: 15,
                distance: 4
            }
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        let (vertices, mut edges) = parts();
        edges[0] = Edge::new(2, 16);
        let err = HypercubeTopology::from_parts(vertices, edges).unwrap_err();
        assert!(err.to_string().contains("vertex 16"), "{err}");
    }
}
