use crate::common::{Edge, Vertex, VertexId};
use crate::graph::BipartiteGraph;

pub fn lv(id: VertexId) -> Vertex {
    Vertex::left(id)
}

pub fn rv(id: VertexId) -> Vertex {
    Vertex::right(id)
}

pub fn edge(left: VertexId, right: VertexId) -> Edge {
    Edge::new(lv(left), rv(right))
}

pub fn build_graph(num_l: VertexId, num_r: VertexId, edges: &[(VertexId, VertexId)]) -> BipartiteGraph {
    let mut graph = BipartiteGraph::with_vertices((0..num_l).map(lv), (0..num_r).map(rv));
    for &(left, right) in edges {
        graph.insert_edge(edge(left, right)).unwrap();
    }
    graph
}
