use std::fmt;

use serde::{Deserialize, Serialize};

pub type VertexId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Partition {
    Left,
    Right,
}

impl Partition {
    pub fn opposite(self) -> Self {
        match self {
            Partition::Left => Partition::Right,
            Partition::Right => Partition::Left,
        }
    }
}

/// Identity is (id, partition): the same id may appear on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub partition: Partition,
}

impl Vertex {
    pub fn new(id: VertexId, partition: Partition) -> Self {
        Self { id, partition }
    }

    pub fn left(id: VertexId) -> Self {
        Self::new(id, Partition::Left)
    }

    pub fn right(id: VertexId) -> Self {
        Self::new(id, Partition::Right)
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.partition {
            Partition::Left => 'L',
            Partition::Right => 'R',
        };
        write!(f, "{prefix}{}", self.id)
    }
}

/// Unordered pair of endpoints, stored left-first. Partition validity is
/// checked at graph admission, not at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub left: Vertex,
    pub right: Vertex,
}

impl Edge {
    pub fn new(left: Vertex, right: Vertex) -> Self {
        Self { left, right }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.left, self.right)
    }
}
