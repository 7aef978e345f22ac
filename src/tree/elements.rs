/// NodeId is an index into the tree's node arena.
/// It is lightweight (Copy) and safe (no pointers).
pub type NodeId = usize;

/// EdgeId is an index into the tree's edge arena.
pub type EdgeId = usize;

/// LinkId is an index into the tree's link arena.
pub type LinkId = usize;

/// A node of the tree: a taxon or an internal branching point.
///
/// Nodes do not own links or edges; they only carry a back-reference to
/// their primary link. For a non-root node the primary link points rootward,
/// for the root it points toward its first child. A single isolated node
/// has no link at all.
#[derive(Debug, Clone)]
pub struct Node<N> {
    /// Unique identifier for the node (index in the arena)
    pub index: NodeId,

    /// Display name, possibly empty (e.g., unnamed inner nodes)
    pub name: String,

    /// Primary link of this node, None only for an isolated single node
    pub link: Option<LinkId>,

    /// Caller-defined payload (e.g., nothing, or placement data)
    pub data: N,
}

impl<N> Node<N> {
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

/// An edge of the tree: a branch connecting two nodes.
///
/// The branch length default is format-dependent and applied by the format
/// processor (0.0 for Newick). Edges do not own nodes.
#[derive(Debug, Clone)]
pub struct Edge<E> {
    /// Unique identifier for the edge (index in the arena)
    pub index: EdgeId,

    /// Branch length
    pub length: f64,

    /// The link on the rootward side of this edge
    pub primary_link: LinkId,

    /// The link on the leafward side of this edge
    pub secondary_link: LinkId,

    /// Caller-defined payload (e.g., placement edge_num)
    pub data: E,
}

/// A link: one endpoint of an edge as seen from one incident node,
/// analogous to a half-edge in a doubly-connected structure.
#[derive(Debug, Clone)]
pub struct Link {
    /// Unique identifier for the link (index in the arena)
    pub index: LinkId,

    /// Next link around the same node; the ring is circular
    pub next: LinkId,

    /// The link at the opposite end of this link's edge
    pub outer: LinkId,

    /// The node this link belongs to
    pub node: NodeId,

    /// The edge this link belongs to
    pub edge: EdgeId,
}

/// Node payload for trees that carry nothing beyond names.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DefaultNodeData;

/// Edge payload for trees that carry nothing beyond branch lengths.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DefaultEdgeData;
