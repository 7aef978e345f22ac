//! Conversions between the flat [`TreeBroker`] form and the linked
//! [`Tree`] structure.
//!
//! The broker's depth column is the sole structural signal: an element's
//! parent is the nearest preceding element at depth - 1. Building keeps a
//! stack of the current ancestor path; writing is a plain preorder walk.

use super::broker::{BrokerElement, TreeBroker};
use super::elements::{Edge, EdgeId, Link, Node, NodeId};
use super::error::TreeError;
use super::Tree;

/// Which tree elements a broker element turned into (or came from). Format
/// processors use this to run their behaviors against the right node/edge.
#[derive(Debug, Clone, Copy)]
pub struct ElementHandles {
    pub node: NodeId,
    /// The rootward edge of the node; None for the root element.
    pub edge: Option<EdgeId>,
}

/// Construct a tree from a depth-annotated element sequence.
///
/// `default_length` is used for elements without a branch length (0.0 for
/// Newick). Depth inconsistencies fail with [`TreeError::Structure`]; an
/// empty broker builds an empty tree.
pub fn broker_to_tree<N: Default, E: Default>(
    broker: &TreeBroker,
    default_length: f64,
) -> Result<(Tree<N, E>, Vec<ElementHandles>), TreeError> {
    broker.validate()?;

    let mut tree = Tree::new();
    let mut handles = Vec::with_capacity(broker.len());

    // path[d] holds the most recent node at depth d.
    let mut path: Vec<NodeId> = Vec::new();

    for element in broker.iter() {
        let node_id = tree.nodes.len();
        tree.nodes.push(Node {
            index: node_id,
            name: element.name.clone(),
            link: None,
            data: N::default(),
        });

        let edge = if element.depth == 0 {
            tree.root = Some(node_id);
            None
        } else {
            let parent = path[element.depth - 1];
            let length = element.branch_length.unwrap_or(default_length);
            Some(connect(&mut tree, parent, node_id, length))
        };

        path.truncate(element.depth);
        path.push(node_id);
        handles.push(ElementHandles {
            node: node_id,
            edge,
        });
    }

    Ok((tree, handles))
}

/// Wire a new edge between `parent` and `child`, creating both links.
///
/// The child-side link becomes the child's primary (rootward) link; the
/// parent-side link is appended to the end of the parent's ring, so sibling
/// order follows broker order.
fn connect<N, E: Default>(
    tree: &mut Tree<N, E>,
    parent: NodeId,
    child: NodeId,
    length: f64,
) -> EdgeId {
    let pl = tree.links.len();
    let cl = pl + 1;
    let edge_id = tree.edges.len();

    tree.edges.push(Edge {
        index: edge_id,
        length,
        primary_link: pl,
        secondary_link: cl,
        data: E::default(),
    });
    tree.links.push(Link {
        index: pl,
        next: pl,
        outer: cl,
        node: parent,
        edge: edge_id,
    });
    tree.links.push(Link {
        index: cl,
        next: cl,
        outer: pl,
        node: child,
        edge: edge_id,
    });
    tree.nodes[child].link = Some(cl);

    match tree.nodes[parent].link {
        None => {
            tree.nodes[parent].link = Some(pl);
        }
        Some(first) => {
            let mut last = first;
            while tree.links[last].next != first {
                last = tree.links[last].next;
            }
            tree.links[last].next = pl;
            tree.links[pl].next = first;
        }
    }

    edge_id
}

/// Emit the tree as a broker: one element per node, preorder, depths from
/// the traversal. Tags and comments are left empty; format behaviors fill
/// them in.
pub fn tree_to_broker<N, E>(tree: &Tree<N, E>) -> (TreeBroker, Vec<ElementHandles>) {
    let mut broker = TreeBroker::new();
    let mut handles = Vec::with_capacity(tree.node_count());

    for visit in tree.preorder() {
        let node = &tree.nodes[visit.node];
        let edge = tree.rootward_edge(visit.node);
        broker.push(BrokerElement {
            name: node.name.clone(),
            branch_length: edge.map(|e| tree.edges[e].length),
            depth: visit.depth,
            ..Default::default()
        });
        handles.push(ElementHandles {
            node: visit.node,
            edge,
        });
    }

    (broker, handles)
}
