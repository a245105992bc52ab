use std::collections::BTreeSet;
use std::fmt;

use ahash::HashSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::common::Vertex;

/// Complete bipartite subgraph (X, Y). Equality is by set contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Biclique {
    left: BTreeSet<Vertex>,
    right: BTreeSet<Vertex>,
}

impl Biclique {
    pub fn new(left: BTreeSet<Vertex>, right: BTreeSet<Vertex>) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &BTreeSet<Vertex> {
        &self.left
    }

    pub fn right(&self) -> &BTreeSet<Vertex> {
        &self.right
    }

    /// Componentwise containment of the other biclique's vertex sets.
    pub fn subsumes(&self, other: &Biclique) -> bool {
        other.left.is_subset(&self.left) && other.right.is_subset(&self.right)
    }
}

impl fmt::Display for Biclique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({{{}}}, {{{}}})",
            self.left.iter().join(", "),
            self.right.iter().join(", ")
        )
    }
}

/// De-duplicated set of bicliques with no member subsuming another.
#[derive(Debug, Clone, Default)]
pub struct MaximalBicliqueSet {
    bicliques: HashSet<Biclique>,
}

impl MaximalBicliqueSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bicliques.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bicliques.is_empty()
    }

    pub fn contains(&self, biclique: &Biclique) -> bool {
        self.bicliques.contains(biclique)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Biclique> {
        self.bicliques.iter()
    }

    /// Subsumption-aware insertion: a biclique subsumed by an existing
    /// member is dropped, otherwise it is added and every member it
    /// subsumes is removed. Returns true when the biclique was added.
    pub fn merge(&mut self, biclique: Biclique) -> bool {
        if self.bicliques.iter().any(|b| b.subsumes(&biclique)) {
            return false;
        }
        self.bicliques.retain(|b| !biclique.subsumes(b));
        self.bicliques.insert(biclique);
        true
    }

    /// Merges a batch, returning how many members were genuinely new.
    pub fn merge_all(&mut self, bicliques: impl IntoIterator<Item = Biclique>) -> usize {
        bicliques
            .into_iter()
            .filter(|b| self.merge(b.clone()))
            .count()
    }

    /// Ordered point-in-time copy of the current members.
    pub fn snapshot(&self) -> BTreeSet<Biclique> {
        self.bicliques.iter().cloned().collect()
    }
}
