use thiserror::Error;

use crate::common::{Edge, Vertex};

pub type DynMbeResult<T> = Result<T, DynMbeError>;

#[derive(Debug, Error)]
pub enum DynMbeError {
    #[error("GraphError: {0}")]
    Graph(String),
    #[error("ProcessError: {0}")]
    Process(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Non-fatal admission failures. A rejected edge never mutates the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EdgeRejection {
    #[error("edge {0} is already present")]
    DuplicateEdge(Edge),
    #[error("vertex {0} is not registered in the graph")]
    UnknownVertex(Vertex),
    #[error("edge {0} does not connect a left vertex to a right vertex")]
    PartitionMismatch(Edge),
}
