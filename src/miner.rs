use std::collections::BTreeSet;

use ahash::{HashSet, HashSetExt};

use crate::biclique::Biclique;
use crate::common::Vertex;
use crate::graph::BipartiteGraph;

/// One branch of the closure expansion. `left` is the current clique X,
/// `right` its exact common neighborhood gamma(X), `candidates` the
/// untried right vertices in lexicographic order, `excluded` the right
/// vertices already rejected on this branch.
struct Frame {
    left: BTreeSet<Vertex>,
    right: BTreeSet<Vertex>,
    candidates: Vec<Vertex>,
    excluded: BTreeSet<Vertex>,
}

/// Enumerates every maximal biclique of the given graph, which may itself
/// be an induced subgraph snapshot. Each biclique is derived exactly once,
/// from its lexicographically smallest right-side derivation; duplicates
/// are pruned through the excluded set.
pub fn mine_maximal(graph: &BipartiteGraph) -> HashSet<Biclique> {
    let mut found = HashSet::new();
    let root = Frame {
        left: graph.vertices_l().clone(),
        right: BTreeSet::new(),
        candidates: graph.vertices_r().iter().copied().collect(),
        excluded: BTreeSet::new(),
    };
    expand(graph, root, &mut found);
    found
}

fn expand(graph: &BipartiteGraph, frame: Frame, found: &mut HashSet<Biclique>) {
    let Frame {
        left,
        right,
        candidates,
        mut excluded,
    } = frame;
    for (pos, &candidate) in candidates.iter().enumerate() {
        let branch_left = BipartiteGraph::intersect(&left, graph.neighbors(&candidate));
        if branch_left.is_empty() {
            // No support under the current clique, nor under any sub-clique.
            continue;
        }
        // An excluded vertex compatible with the shrunken left side means
        // this biclique was already reported on an earlier branch.
        if excluded.iter().any(|q| covers(graph, q, &branch_left)) {
            excluded.insert(candidate);
            continue;
        }
        let mut branch_right = right.clone();
        branch_right.insert(candidate);
        let mut remaining = Vec::new();
        for &later in &candidates[pos + 1..] {
            if covers(graph, &later, &branch_left) {
                // Closure absorption keeps branch_right equal to
                // gamma(branch_left).
                branch_right.insert(later);
            } else {
                remaining.push(later);
            }
        }
        found.insert(Biclique::new(branch_left.clone(), branch_right.clone()));
        if !remaining.is_empty() {
            let child = Frame {
                left: branch_left,
                right: branch_right,
                candidates: remaining,
                excluded: excluded.clone(),
            };
            expand(graph, child, found);
        }
        excluded.insert(candidate);
    }
}

fn covers(graph: &BipartiteGraph, vertex: &Vertex, vertices: &BTreeSet<Vertex>) -> bool {
    vertices.is_subset(graph.neighbors(vertex))
}
