use std::path::Path;

use csv::ReaderBuilder;
use dynmbe::common::{Edge, Partition, Vertex, VertexId};
use dynmbe::error::{DynMbeError, DynMbeResult};

pub fn read_vertices<P: AsRef<Path>>(path: P, partition: Partition) -> DynMbeResult<Vec<Vertex>> {
    let mut reader = ReaderBuilder::new().has_headers(false).from_path(path)?;
    reader
        .records()
        .enumerate()
        .map(|(line, record)| {
            let record = record?;
            let id = parse_id(record.get(0), line)?;
            Ok(Vertex::new(id, partition))
        })
        .collect()
}

pub fn read_edges<P: AsRef<Path>>(path: P) -> DynMbeResult<Vec<Edge>> {
    let mut reader = ReaderBuilder::new().has_headers(false).from_path(path)?;
    reader
        .records()
        .enumerate()
        .map(|(line, record)| {
            let record = record?;
            let left = parse_id(record.get(0), line)?;
            let right = parse_id(record.get(1), line)?;
            Ok(Edge::new(Vertex::left(left), Vertex::right(right)))
        })
        .collect()
}

fn parse_id(field: Option<&str>, line: usize) -> DynMbeResult<VertexId> {
    field
        .ok_or_else(|| {
            let err = format!("expect vertex id in line {line}");
            DynMbeError::Graph(err)
        })?
        .trim()
        .parse::<VertexId>()
        .map_err(|e| DynMbeError::Graph(e.to_string()))
}
