use std::collections::BTreeSet;

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};

use crate::common::{Edge, Partition, Vertex};
use crate::error::EdgeRejection;

static NO_NEIGHBORS: BTreeSet<Vertex> = BTreeSet::new();

/// Bipartite graph with an adjacency index kept in sync with the edge set.
///
/// Neighbor sets are ordered so that the miner always walks candidates in
/// the same lexicographic order.
#[derive(Debug, Clone, Default)]
pub struct BipartiteGraph {
    vertices_l: BTreeSet<Vertex>,
    vertices_r: BTreeSet<Vertex>,
    edges: HashSet<Edge>,
    adjacency: HashMap<Vertex, BTreeSet<Vertex>>,
}

impl BipartiteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vertices(
        vertices_l: impl IntoIterator<Item = Vertex>,
        vertices_r: impl IntoIterator<Item = Vertex>,
    ) -> Self {
        let mut graph = Self::new();
        graph.insert_all_vertices(vertices_l);
        graph.insert_all_vertices(vertices_r);
        graph
    }

    pub fn vertices_l(&self) -> &BTreeSet<Vertex> {
        &self.vertices_l
    }

    pub fn vertices_r(&self) -> &BTreeSet<Vertex> {
        &self.vertices_r
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices_l.len() + self.vertices_r.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn contains_vertex(&self, vertex: &Vertex) -> bool {
        match vertex.partition {
            Partition::Left => self.vertices_l.contains(vertex),
            Partition::Right => self.vertices_r.contains(vertex),
        }
    }

    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    /// Returns false when the vertex was already registered.
    pub fn insert_vertex(&mut self, vertex: Vertex) -> bool {
        match vertex.partition {
            Partition::Left => self.vertices_l.insert(vertex),
            Partition::Right => self.vertices_r.insert(vertex),
        }
    }

    pub fn insert_all_vertices(&mut self, vertices: impl IntoIterator<Item = Vertex>) {
        for vertex in vertices {
            self.insert_vertex(vertex);
        }
    }

    /// Admits an edge, updating the edge set and the adjacency index.
    /// Duplicates are checked before endpoint validity.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), EdgeRejection> {
        if self.edges.contains(&edge) {
            return Err(EdgeRejection::DuplicateEdge(edge));
        }
        if edge.left.partition != Partition::Left || edge.right.partition != Partition::Right {
            return Err(EdgeRejection::PartitionMismatch(edge));
        }
        if !self.vertices_l.contains(&edge.left) {
            return Err(EdgeRejection::UnknownVertex(edge.left));
        }
        if !self.vertices_r.contains(&edge.right) {
            return Err(EdgeRejection::UnknownVertex(edge.right));
        }
        self.edges.insert(edge);
        self.adjacency.entry(edge.left).or_default().insert(edge.right);
        self.adjacency.entry(edge.right).or_default().insert(edge.left);
        Ok(())
    }

    pub fn insert_all_edges(
        &mut self,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Result<(), EdgeRejection> {
        for edge in edges {
            self.insert_edge(edge)?;
        }
        Ok(())
    }

    /// Adjacency of a single vertex; empty for absent vertices.
    pub fn neighbors(&self, vertex: &Vertex) -> &BTreeSet<Vertex> {
        self.adjacency.get(vertex).unwrap_or(&NO_NEIGHBORS)
    }

    /// Gamma closure: vertices adjacent to every vertex of the input set.
    /// Empty input yields the empty set.
    pub fn common_neighbors<'a>(
        &self,
        vertices: impl IntoIterator<Item = &'a Vertex>,
    ) -> BTreeSet<Vertex> {
        let mut iter = vertices.into_iter();
        let Some(first) = iter.next() else {
            return BTreeSet::new();
        };
        let mut closure = self.neighbors(first).clone();
        for vertex in iter {
            if closure.is_empty() {
                break;
            }
            closure = Self::intersect(&closure, self.neighbors(vertex));
        }
        closure
    }

    /// Set intersection iterating the smaller operand.
    pub fn intersect(a: &BTreeSet<Vertex>, b: &BTreeSet<Vertex>) -> BTreeSet<Vertex> {
        let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        small.iter().filter(|v| large.contains(v)).copied().collect()
    }

    /// Local closure of an inserted edge (u, v): verticesL = neighbors(v),
    /// verticesR = neighbors(u), plus every original edge between the two
    /// sets. The result owns all of its structure, so it can be mined
    /// concurrently while this graph keeps mutating.
    pub fn induced_subgraph(&self, edge: &Edge) -> BipartiteGraph {
        let vertices_l = self.neighbors(&edge.right).clone();
        let vertices_r = self.neighbors(&edge.left).clone();
        let mut edges = HashSet::new();
        let mut adjacency: HashMap<Vertex, BTreeSet<Vertex>> = HashMap::new();
        for left in &vertices_l {
            let shared = Self::intersect(self.neighbors(left), &vertices_r);
            for right in &shared {
                edges.insert(Edge::new(*left, *right));
                adjacency.entry(*right).or_default().insert(*left);
            }
            if !shared.is_empty() {
                adjacency.insert(*left, shared);
            }
        }
        BipartiteGraph {
            vertices_l,
            vertices_r,
            edges,
            adjacency,
        }
    }
}

#[cfg(test)]
mod tests {
    use maplit::btreeset;

    use super::*;
    use crate::test_utils::{build_graph, edge, lv, rv};

    #[test]
    fn test_insert_vertex_duplicate() {
        let mut graph = BipartiteGraph::new();
        assert!(graph.insert_vertex(lv(0)));
        assert!(!graph.insert_vertex(lv(0)));
        assert_eq!(graph.vertices_l().len(), 1);
    }

    #[test]
    fn test_insert_edge_rejections() {
        let mut graph = BipartiteGraph::with_vertices([lv(0)], [rv(0)]);
        assert!(graph.insert_edge(edge(0, 0)).is_ok());
        assert_eq!(
            graph.insert_edge(edge(0, 0)),
            Err(EdgeRejection::DuplicateEdge(edge(0, 0)))
        );
        assert_eq!(
            graph.insert_edge(edge(0, 1)),
            Err(EdgeRejection::UnknownVertex(rv(1)))
        );
        let swapped = Edge::new(rv(0), lv(0));
        assert_eq!(
            graph.insert_edge(swapped),
            Err(EdgeRejection::PartitionMismatch(swapped))
        );
        assert_eq!(graph.num_edges(), 1);
    }

    #[test]
    fn test_neighbors() {
        let graph = build_graph(2, 2, &[(0, 0), (0, 1), (1, 0)]);
        assert_eq!(*graph.neighbors(&lv(0)), btreeset! {rv(0), rv(1)});
        assert_eq!(*graph.neighbors(&rv(0)), btreeset! {lv(0), lv(1)});
        assert!(graph.neighbors(&lv(7)).is_empty());
    }

    #[test]
    fn test_common_neighbors_closure() {
        let graph = build_graph(3, 3, &[(0, 0), (0, 1), (1, 0), (1, 2), (2, 0)]);
        assert_eq!(graph.common_neighbors([]), btreeset! {});
        assert_eq!(
            graph.common_neighbors([&lv(0), &lv(1)]),
            BipartiteGraph::intersect(graph.neighbors(&lv(0)), graph.neighbors(&lv(1)))
        );
        assert_eq!(
            graph.common_neighbors([&lv(0), &lv(1), &lv(2)]),
            btreeset! {rv(0)}
        );
    }

    #[test]
    fn test_intersect() {
        let a = btreeset! {lv(0), lv(1), lv(2)};
        let b = btreeset! {lv(1), lv(2), lv(3)};
        assert_eq!(BipartiteGraph::intersect(&a, &b), btreeset! {lv(1), lv(2)});
        assert_eq!(BipartiteGraph::intersect(&a, &btreeset! {}), btreeset! {});
    }

    #[test]
    fn test_induced_subgraph() {
        // (L0, R0) plus a fringe that must not leak into the closure.
        let graph = build_graph(3, 3, &[(0, 0), (0, 1), (1, 0), (2, 2)]);
        let sub = graph.induced_subgraph(&edge(0, 0));
        assert_eq!(*sub.vertices_l(), btreeset! {lv(0), lv(1)});
        assert_eq!(*sub.vertices_r(), btreeset! {rv(0), rv(1)});
        assert!(sub.contains_edge(&edge(0, 0)));
        assert!(sub.contains_edge(&edge(0, 1)));
        assert!(sub.contains_edge(&edge(1, 0)));
        assert_eq!(sub.num_edges(), 3);
    }

    #[test]
    fn test_induced_subgraph_is_independent() {
        let mut graph = build_graph(2, 2, &[(0, 0), (1, 0)]);
        let sub = graph.induced_subgraph(&edge(0, 0));
        graph.insert_edge(edge(0, 1)).unwrap();
        assert_eq!(sub.num_edges(), 2);
        assert!(!sub.contains_edge(&edge(0, 1)));
    }
}
