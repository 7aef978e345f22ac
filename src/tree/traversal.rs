//! Traversal iterators over the tree structure.
//!
//! All iterators are lazy, single-pass value types borrowing the tree;
//! restarting means constructing a new one. Constructed on an empty tree or
//! with an out-of-range start node they yield nothing.

use super::elements::{LinkId, NodeId};
use super::Tree;
use std::collections::VecDeque;

/// One step of a preorder/postorder/levelorder traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub node: NodeId,
    /// Depth relative to the traversal start (start = 0)
    pub depth: usize,
}

/// One step of an Euler tour. `link` is the link whose node is visited at
/// this step; None only for the degenerate single-node tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TourStep {
    pub node: NodeId,
    pub link: Option<LinkId>,
}

/// Depth-first traversal visiting a node before its children.
pub struct Preorder<'a, N, E> {
    tree: &'a Tree<N, E>,
    stack: Vec<(NodeId, usize)>,
}

impl<N, E> Iterator for Preorder<'_, N, E> {
    type Item = Visit;

    fn next(&mut self) -> Option<Visit> {
        let (node, depth) = self.stack.pop()?;
        // Reverse push so siblings come off the stack in ring order.
        for &child in self.tree.children(node).iter().rev() {
            self.stack.push((child, depth + 1));
        }
        Some(Visit { node, depth })
    }
}

/// Depth-first traversal visiting a node after all its children.
pub struct Postorder<'a, N, E> {
    tree: &'a Tree<N, E>,
    stack: Vec<Frame>,
}

enum Frame {
    Enter(NodeId, usize),
    Exit(NodeId, usize),
}

impl<N, E> Iterator for Postorder<'_, N, E> {
    type Item = Visit;

    fn next(&mut self) -> Option<Visit> {
        loop {
            match self.stack.pop()? {
                Frame::Exit(node, depth) => return Some(Visit { node, depth }),
                Frame::Enter(node, depth) => {
                    self.stack.push(Frame::Exit(node, depth));
                    for &child in self.tree.children(node).iter().rev() {
                        self.stack.push(Frame::Enter(child, depth + 1));
                    }
                }
            }
        }
    }
}

/// Breadth-first traversal in increasing depth from the start.
pub struct Levelorder<'a, N, E> {
    tree: &'a Tree<N, E>,
    queue: VecDeque<(NodeId, usize)>,
}

impl<N, E> Iterator for Levelorder<'_, N, E> {
    type Item = Visit;

    fn next(&mut self) -> Option<Visit> {
        let (node, depth) = self.queue.pop_front()?;
        for child in self.tree.children(node) {
            self.queue.push_back((child, depth + 1));
        }
        Some(Visit { node, depth })
    }
}

/// Traversal crossing every edge exactly twice, once per direction,
/// returning to the start node.
///
/// Starting from node S, the tour repeatedly moves to the current link's
/// outer side and on to that node's next ring link, recording the node at
/// every step. The closing return to S is recorded too, so a tree with E
/// edges yields `2 * E + 1` steps; a single-node tree yields `[S]`.
pub struct Eulertour<'a, N, E> {
    tree: &'a Tree<N, E>,
    start: Option<LinkId>,
    current: Option<LinkId>,
    moved: bool,
    lone: Option<NodeId>,
}

impl<N, E> Iterator for Eulertour<'_, N, E> {
    type Item = TourStep;

    fn next(&mut self) -> Option<TourStep> {
        if let Some(node) = self.lone.take() {
            return Some(TourStep { node, link: None });
        }
        let cur = self.current?;
        let start = self.start?;
        let step = TourStep {
            node: self.tree.links[cur].node,
            link: Some(cur),
        };
        if self.moved && cur == start {
            self.current = None;
        } else {
            self.moved = true;
            let outer = self.tree.links[cur].outer;
            self.current = Some(self.tree.links[outer].next);
        }
        Some(step)
    }
}

impl<N, E> Tree<N, E> {
    /// Preorder traversal from the root.
    pub fn preorder(&self) -> Preorder<'_, N, E> {
        Preorder {
            tree: self,
            stack: self.root.map(|r| (r, 0)).into_iter().collect(),
        }
    }

    /// Preorder traversal of the subtree under `start`.
    pub fn preorder_from(&self, start: NodeId) -> Preorder<'_, N, E> {
        Preorder {
            tree: self,
            stack: self.checked_start(start),
        }
    }

    /// Postorder traversal from the root.
    pub fn postorder(&self) -> Postorder<'_, N, E> {
        Postorder {
            tree: self,
            stack: self
                .root
                .map(|r| Frame::Enter(r, 0))
                .into_iter()
                .collect(),
        }
    }

    /// Postorder traversal of the subtree under `start`.
    pub fn postorder_from(&self, start: NodeId) -> Postorder<'_, N, E> {
        Postorder {
            tree: self,
            stack: self
                .checked_start(start)
                .into_iter()
                .map(|(n, d)| Frame::Enter(n, d))
                .collect(),
        }
    }

    /// Level-order (breadth-first) traversal from the root.
    pub fn levelorder(&self) -> Levelorder<'_, N, E> {
        Levelorder {
            tree: self,
            queue: self.root.map(|r| (r, 0)).into_iter().collect(),
        }
    }

    /// Level-order traversal of the subtree under `start`.
    pub fn levelorder_from(&self, start: NodeId) -> Levelorder<'_, N, E> {
        Levelorder {
            tree: self,
            queue: self.checked_start(start).into_iter().collect(),
        }
    }

    /// Euler tour starting (and ending) at the root.
    pub fn eulertour(&self) -> Eulertour<'_, N, E> {
        match self.root {
            Some(root) => self.eulertour_from(root),
            None => Eulertour {
                tree: self,
                start: None,
                current: None,
                moved: false,
                lone: None,
            },
        }
    }

    /// Euler tour starting (and ending) at `start`.
    pub fn eulertour_from(&self, start: NodeId) -> Eulertour<'_, N, E> {
        let link = self.nodes.get(start).and_then(|n| n.link);
        match link {
            Some(link) => Eulertour {
                tree: self,
                start: Some(link),
                current: Some(link),
                moved: false,
                lone: None,
            },
            None => Eulertour {
                tree: self,
                start: None,
                current: None,
                moved: false,
                lone: self.nodes.get(start).map(|n| n.index),
            },
        }
    }

    fn checked_start(&self, start: NodeId) -> Vec<(NodeId, usize)> {
        if start < self.nodes.len() {
            vec![(start, 0)]
        } else {
            Vec::new()
        }
    }
}
