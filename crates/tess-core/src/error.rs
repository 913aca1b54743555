use std::fmt;

/// Structural defect detected while building or validating a hypercube.
///
/// Only raised at construction: a running engine never produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    VertexCount { expected: usize, found: usize },
    EdgeCount { expected: usize, found: usize },
    VertexOutOfRange { index: usize, len: usize },
    SelfEdge(usize),
    DuplicateEdge(usize, usize),
    NotAdjacent { a: usize, b: usize, distance: u32 },
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::VertexCount { expected, found } => {
                write!(f, "expected {expected} vertices, found {found}")
            }
            TopologyError::EdgeCount { expected, found } => {
                write!(f, "expected {expected} edges, found {found}")
            }
            TopologyError::VertexOutOfRange { index, len } => {
                write!(f, "edge references vertex {index} but only {len} exist")
            }
            TopologyError::SelfEdge(i) => write!(f, "self edge on vertex {i}"),
            TopologyError::DuplicateEdge(a, b) => write!(f, "duplicate edge ({a}, {b})"),
            TopologyError::NotAdjacent { a, b, distance } => write!(
                f,
                "edge ({a}, {b}) joins vertices at Hamming distance {distance}, expected 1"
            ),
        }
    }
}

impl std::error::Error for TopologyError {}

pub type Result<T> = std::result::Result<T, TopologyError>;
