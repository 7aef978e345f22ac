//! Phylogenetic trees, traversals, and format conversions.
//!
//! The crate centers on [`tree::Tree`], an arena-backed link/node/edge
//! structure generic over its node and edge payloads. Text formats go
//! through [`tree::TreeBroker`], a flat depth-annotated list that both the
//! Newick processor and the phyloxml writer consume. The [`placement`]
//! module maps jplace samples onto reference trees.
//!
//! ```
//! use phylotk::io::newick::NewickProcessor;
//! use phylotk::tree::DefaultTree;
//!
//! let tree: DefaultTree = NewickProcessor::new()
//!     .from_string("((B,(D,E)C)A,F,(H,I)G)R;")
//!     .unwrap();
//! assert_eq!(tree.node_count(), 10);
//!
//! let names: String = tree
//!     .preorder()
//!     .map(|v| tree.node(v.node).unwrap().name.clone())
//!     .collect();
//! assert_eq!(names, "RABCDEFGHI");
//! ```

pub mod io;
pub mod placement;
pub mod tree;

pub use io::{NewickBehavior, NewickProcessor, PhyloxmlWriter};
pub use tree::{DefaultTree, Tree, TreeBroker, TreeError};
