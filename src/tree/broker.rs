use super::error::TreeError;
use itertools::Itertools;
use std::fmt;

/// One element of a [`TreeBroker`]: a node as seen by a text format.
///
/// Elements appear in preorder; `depth` (root = 0) is the only structural
/// signal, an element's parent being the nearest preceding element whose
/// depth is exactly one less.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BrokerElement {
    /// Node label, possibly empty
    pub name: String,

    /// Branch length toward the parent; None if the format did not give one
    pub branch_length: Option<f64>,

    /// Distance from the root (root = 0)
    pub depth: usize,

    /// Format-specific bracketed annotations, e.g. `{42}`
    pub tags: Vec<String>,

    /// Format-specific comments, e.g. `[0.9]`
    pub comments: Vec<String>,

    /// Line of the token that introduced this element (1-based, 0 if synthesized)
    pub line: usize,

    /// Column of the token that introduced this element (1-based, 0 if synthesized)
    pub column: usize,
}

impl BrokerElement {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    pub fn is_leaf_of(&self, next: Option<&BrokerElement>) -> bool {
        match next {
            Some(n) => n.depth <= self.depth,
            None => true,
        }
    }
}

/// Flat, ordered intermediate representation of a tree, the pivot between
/// text formats and the in-memory [`Tree`](super::Tree).
///
/// Elements are created transiently during one parse or one write and
/// discarded once the tree or the text output is produced.
///
/// # Example
/// ```
/// use phylotk::tree::{BrokerElement, TreeBroker};
/// let mut broker = TreeBroker::new();
/// broker.push(BrokerElement { name: "R".to_string(), depth: 0, ..Default::default() });
/// broker.push(BrokerElement { name: "A".to_string(), depth: 1, ..Default::default() });
/// assert!(broker.validate().is_ok());
/// assert_eq!(broker.leaf_count(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct TreeBroker {
    elements: Vec<BrokerElement>,
}

impl TreeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: BrokerElement) {
        self.elements.push(element);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BrokerElement> {
        self.elements.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut BrokerElement> {
        self.elements.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BrokerElement> {
        self.elements.iter()
    }

    /// Check that the depth sequence describes a single rooted tree:
    /// first element at depth 0, no depth jump greater than +1, and no
    /// second depth-0 element (a forest is not a tree).
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut prev_depth: Option<usize> = None;
        for (i, element) in self.elements.iter().enumerate() {
            match prev_depth {
                None => {
                    if element.depth != 0 {
                        return Err(TreeError::structure(format!(
                            "first broker element '{}' has depth {}, expected 0",
                            element.name, element.depth
                        )));
                    }
                }
                Some(prev) => {
                    if element.depth == 0 {
                        return Err(TreeError::structure(format!(
                            "broker element {} '{}' is a second root",
                            i, element.name
                        )));
                    }
                    if element.depth > prev + 1 {
                        return Err(TreeError::structure(format!(
                            "broker element {} '{}' jumps from depth {} to {}",
                            i, element.name, prev, element.depth
                        )));
                    }
                }
            }
            prev_depth = Some(element.depth);
        }
        Ok(())
    }

    /// Number of leaf elements: elements not followed by a deeper one.
    pub fn leaf_count(&self) -> usize {
        self.elements
            .iter()
            .enumerate()
            .filter(|(i, e)| e.is_leaf_of(self.elements.get(i + 1)))
            .count()
    }

    pub fn max_depth(&self) -> usize {
        self.elements.iter().map(|e| e.depth).max().unwrap_or(0)
    }
}

impl std::ops::Index<usize> for TreeBroker {
    type Output = BrokerElement;

    fn index(&self, index: usize) -> &BrokerElement {
        &self.elements[index]
    }
}

impl fmt::Display for TreeBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self
            .elements
            .iter()
            .map(|e| {
                let name = if e.name.is_empty() { "(inner)" } else { e.name.as_str() };
                format!("{}{}", "    ".repeat(e.depth), name)
            })
            .join("\n");
        write!(f, "{}", lines)
    }
}
