//! Phylogenetic placements mapped onto a reference tree.
//!
//! A jplace sample pins query sequences ("pqueries") to edges of a reference
//! tree via edge numbers. The tree side carries [`PlacementEdgeData`] on
//! every edge; the pquery side keeps the per-placement fields from the
//! document.

pub mod jplace;
pub mod newick;

use crate::tree::{DefaultNodeData, EdgeId, Tree};
use std::collections::{BTreeMap, HashMap};

pub use jplace::JplaceReader;
pub use newick::{placement_processor, EdgeNumBehavior, PlacementCountBehavior};

/// Edge payload of a reference tree: the jplace edge number plus the number
/// of placements accumulated on this edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlacementEdgeData {
    pub edge_num: i64,
    pub placement_count: usize,
}

/// Reference tree with placement-aware edges.
pub type PlacementTree = Tree<DefaultNodeData, PlacementEdgeData>;

/// One placement of a pquery on one edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PqueryPlacement {
    pub edge_num: i64,
    pub likelihood: f64,
    pub like_weight_ratio: f64,
    pub distal_length: f64,
    pub pendant_length: f64,
    pub parsimony: f64,
}

/// A name attached to a pquery, with its multiplicity (0.0 when the document
/// used the plain `n` form).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PqueryName {
    pub name: String,
    pub multiplicity: f64,
}

/// One query sequence with all its candidate placements and names.
#[derive(Debug, Clone, Default)]
pub struct Pquery {
    pub placements: Vec<PqueryPlacement>,
    pub names: Vec<PqueryName>,
}

/// A complete placement sample: reference tree, pqueries, and document
/// metadata.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub tree: PlacementTree,
    pub pqueries: Vec<Pquery>,
    pub metadata: BTreeMap<String, String>,
}

impl Sample {
    pub fn pquery_count(&self) -> usize {
        self.pqueries.len()
    }

    /// Total number of placements across all pqueries.
    pub fn placement_count(&self) -> usize {
        self.pqueries.iter().map(|p| p.placements.len()).sum()
    }

    /// Map from edge number to edge index in the reference tree.
    pub fn edge_num_map(&self) -> HashMap<i64, EdgeId> {
        self.tree
            .edges()
            .map(|edge| (edge.data.edge_num, edge.index))
            .collect()
    }
}
