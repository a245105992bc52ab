mod types;

pub use types::{Edge, Partition, Vertex, VertexId};
