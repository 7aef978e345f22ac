pub mod broker;
pub mod build;
pub mod elements;
pub mod error;
pub mod traversal;

pub use broker::{BrokerElement, TreeBroker};
pub use elements::{DefaultEdgeData, DefaultNodeData, Edge, EdgeId, Link, LinkId, Node, NodeId};
pub use error::TreeError;
pub use traversal::{Eulertour, Levelorder, Postorder, Preorder, TourStep, Visit};

/// A tree that carries nothing beyond names and branch lengths.
pub type DefaultTree = Tree<DefaultNodeData, DefaultEdgeData>;

/// An in-memory phylogenetic tree over arenas of links, nodes and edges.
///
/// All relations between elements are plain indices into the three arenas,
/// which sidesteps ownership cycles and makes `clear()` a bulk deallocation.
/// Indices are stable until the tree is cleared or rebuilt; they are NOT
/// stable across rebuilds. Holding an index past `clear()` is a caller bug
/// and is not guarded against.
///
/// # Example
/// ```
/// use phylotk::io::newick::NewickProcessor;
/// use phylotk::tree::DefaultTree;
///
/// let tree: DefaultTree = NewickProcessor::new().from_string("((A,B)C,D)R;").unwrap();
/// assert_eq!(tree.node_count(), 5);
/// assert_eq!(tree.edge_count(), 4);
/// assert_eq!(tree.node(tree.root().unwrap()).unwrap().name, "R");
/// ```
#[derive(Debug, Clone)]
pub struct Tree<N = DefaultNodeData, E = DefaultEdgeData> {
    /// Arena storage for all links
    pub(crate) links: Vec<Link>,

    /// Arena storage for all nodes
    pub(crate) nodes: Vec<Node<N>>,

    /// Arena storage for all edges
    pub(crate) edges: Vec<Edge<E>>,

    /// Optional root ID (a tree might be empty or in construction)
    pub(crate) root: Option<NodeId>,
}

impl<N, E> Default for Tree<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> Tree<N, E> {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            links: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            root: None,
        }
    }

    /// Release all owned nodes, edges and links. The tree becomes empty.
    pub fn clear(&mut self) {
        self.links.clear();
        self.nodes.clear();
        self.edges.clear();
        self.root = None;
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Get the root node ID.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Get a reference to a node by ID. Returns None if ID is invalid.
    pub fn node(&self, id: NodeId) -> Option<&Node<N>> {
        self.nodes.get(id)
    }

    /// Get a mutable reference to a node by ID.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<N>> {
        self.nodes.get_mut(id)
    }

    /// Get a reference to an edge by ID.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge<E>> {
        self.edges.get(id)
    }

    /// Get a mutable reference to an edge by ID.
    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge<E>> {
        self.edges.get_mut(id)
    }

    /// Get a reference to a link by ID.
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn nodes(&self) -> std::slice::Iter<'_, Node<N>> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> std::slice::Iter<'_, Edge<E>> {
        self.edges.iter()
    }

    /// Number of links around a node, i.e. the number of incident edges.
    pub fn degree(&self, id: NodeId) -> usize {
        let Some(first) = self.nodes.get(id).and_then(|n| n.link) else {
            return 0;
        };
        let mut count = 0;
        let mut l = first;
        loop {
            count += 1;
            l = self.links[l].next;
            if l == first {
                break;
            }
        }
        count
    }

    /// Children of a node, in the sibling order encoded in the link rings.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let Some(first) = self.nodes.get(id).and_then(|n| n.link) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if self.root == Some(id) {
            // All ring links of the root lead to children.
            let mut l = first;
            loop {
                out.push(self.links[self.links[l].outer].node);
                l = self.links[l].next;
                if l == first {
                    break;
                }
            }
        } else {
            // The primary link leads to the parent; skip it.
            let mut l = self.links[first].next;
            while l != first {
                out.push(self.links[self.links[l].outer].node);
                l = self.links[l].next;
            }
        }
        out
    }

    /// Parent of a node, None for the root or an invalid ID.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        if self.root == Some(id) {
            return None;
        }
        let first = self.nodes.get(id)?.link?;
        Some(self.links[self.links[first].outer].node)
    }

    /// The edge between a node and its parent, None for the root.
    pub fn rootward_edge(&self, id: NodeId) -> Option<EdgeId> {
        if self.root == Some(id) {
            return None;
        }
        let first = self.nodes.get(id)?.link?;
        Some(self.links[first].edge)
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.children(id).is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        (0..self.nodes.len()).filter(|&id| self.is_leaf(id)).count()
    }

    /// Maximum degree over all nodes. 0 for an empty or single-node tree.
    pub fn max_rank(&self) -> usize {
        (0..self.nodes.len())
            .map(|id| self.degree(id))
            .max()
            .unwrap_or(0)
    }

    /// Whether every node that has children has exactly two of them, the
    /// root included. This is deliberately stricter than a degree-based
    /// check, which would conflate the root's conventional degree with
    /// internal-node bifurcation.
    pub fn is_bifurcating(&self) -> bool {
        (0..self.nodes.len()).all(|id| {
            let n = self.children(id).len();
            n == 0 || n == 2
        })
    }

    /// Find the single node with the given name. Linear cost. Returns None
    /// if the name is absent or ambiguous.
    ///
    /// # Example
    /// ```
    /// use phylotk::io::newick::NewickProcessor;
    /// use phylotk::tree::DefaultTree;
    ///
    /// let tree: DefaultTree = NewickProcessor::new().from_string("(A,(A,B)C)R;").unwrap();
    /// assert!(tree.find_node("B").is_some());
    /// assert!(tree.find_node("A").is_none()); // ambiguous
    /// assert!(tree.find_node("X").is_none()); // absent
    /// ```
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        let mut found = None;
        for node in &self.nodes {
            if node.name == name {
                if found.is_some() {
                    return None;
                }
                found = Some(node.index);
            }
        }
        found
    }

    /// Check the structural invariants of the link/node/edge arenas.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.is_empty() {
            if !self.links.is_empty() || !self.edges.is_empty() || self.root.is_some() {
                return Err(TreeError::structure("empty tree with leftover elements"));
            }
            return Ok(());
        }

        if self.links.len() != 2 * self.edges.len() {
            return Err(TreeError::structure(format!(
                "{} links but {} edges, expected links == 2 * edges",
                self.links.len(),
                self.edges.len()
            )));
        }
        if self.edges.len() != self.nodes.len() - 1 {
            return Err(TreeError::structure(format!(
                "{} nodes but {} edges, expected edges == nodes - 1",
                self.nodes.len(),
                self.edges.len()
            )));
        }
        if self.root.map_or(true, |r| r >= self.nodes.len()) {
            return Err(TreeError::structure("root missing or out of range"));
        }

        for link in &self.links {
            let outer = self
                .links
                .get(link.outer)
                .ok_or_else(|| TreeError::structure("link outer out of range"))?;
            if outer.outer != link.index {
                return Err(TreeError::structure(format!(
                    "link {} is not its outer's outer",
                    link.index
                )));
            }
            let edge = self
                .edges
                .get(link.edge)
                .ok_or_else(|| TreeError::structure("link edge out of range"))?;
            if edge.primary_link != link.index && edge.secondary_link != link.index {
                return Err(TreeError::structure(format!(
                    "link {} not referenced by its edge {}",
                    link.index, link.edge
                )));
            }
            if link.node >= self.nodes.len() {
                return Err(TreeError::structure("link node out of range"));
            }
        }

        // Every ring must close on links of the same node, and all links
        // must be covered by exactly one ring.
        let mut seen = vec![false; self.links.len()];
        for node in &self.nodes {
            let Some(first) = node.link else {
                if self.nodes.len() > 1 {
                    return Err(TreeError::structure(format!(
                        "node {} has no link in a multi-node tree",
                        node.index
                    )));
                }
                continue;
            };
            let mut l = first;
            let mut steps = 0;
            loop {
                let link = self
                    .links
                    .get(l)
                    .ok_or_else(|| TreeError::structure("ring link out of range"))?;
                if link.node != node.index {
                    return Err(TreeError::structure(format!(
                        "ring of node {} passes through foreign link {}",
                        node.index, l
                    )));
                }
                if seen[l] {
                    return Err(TreeError::structure(format!("link {} in two rings", l)));
                }
                seen[l] = true;
                steps += 1;
                if steps > self.links.len() {
                    return Err(TreeError::structure(format!(
                        "ring of node {} does not close",
                        node.index
                    )));
                }
                l = link.next;
                if l == first {
                    break;
                }
            }
        }
        if seen.iter().any(|&s| !s) {
            return Err(TreeError::structure("orphaned links outside all rings"));
        }

        Ok(())
    }
}

impl<N: Default, E: Default> Tree<N, E> {
    /// Build a tree from a depth-annotated broker. See [`build::broker_to_tree`].
    pub fn from_broker(broker: &TreeBroker) -> Result<Self, TreeError> {
        let (tree, _) = build::broker_to_tree(broker, 0.0)?;
        Ok(tree)
    }

    /// Rebuild this tree from a broker, clearing prior state first.
    pub fn rebuild_from_broker(&mut self, broker: &TreeBroker) -> Result<(), TreeError> {
        let (tree, _) = build::broker_to_tree(broker, 0.0)?;
        *self = tree;
        Ok(())
    }
}

impl<N, E> Tree<N, E> {
    /// Emit the tree as a depth-annotated broker, one element per node in
    /// preorder.
    pub fn to_broker(&self) -> TreeBroker {
        let (broker, _) = build::tree_to_broker(self);
        broker
    }
}
