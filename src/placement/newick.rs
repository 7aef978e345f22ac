//! Newick behaviors for placement trees.
//!
//! Jplace reference trees annotate every branch with an edge number in
//! curly braces, e.g. `(A:0.2{0},B:0.09{1}):0.7{2};`. [`EdgeNumBehavior`]
//! moves those numbers between broker tags and [`PlacementEdgeData`];
//! [`PlacementCountBehavior`] additionally emits the accumulated placement
//! count as a `[count]` comment on write.

use super::PlacementEdgeData;
use crate::io::newick::{NewickBehavior, NewickProcessor};
use crate::tree::{BrokerElement, DefaultNodeData, Edge, TreeError};

/// Reads and writes the `{edge_num}` tag of every branch.
pub struct EdgeNumBehavior;

impl NewickBehavior<DefaultNodeData, PlacementEdgeData> for EdgeNumBehavior {
    fn element_to_edge(
        &self,
        element: &BrokerElement,
        edge: &mut Edge<PlacementEdgeData>,
    ) -> Result<(), TreeError> {
        if element.tags.len() != 1 {
            return Err(TreeError::format(
                format!(
                    "expected exactly one {{edge_num}} tag, found {}",
                    element.tags.len()
                ),
                element.line,
                element.column,
            ));
        }
        edge.data.edge_num = element.tags[0].parse::<i64>().map_err(|_| {
            TreeError::format(
                format!("invalid edge_num tag '{{{}}}'", element.tags[0]),
                element.line,
                element.column,
            )
        })?;
        Ok(())
    }

    fn edge_to_element(&self, edge: &Edge<PlacementEdgeData>, element: &mut BrokerElement) {
        element.tags.push(edge.data.edge_num.to_string());
    }
}

/// Writes the placement count of every branch as a `[count]` comment.
/// Write-only; counts are accumulated by the jplace reader, not parsed back.
pub struct PlacementCountBehavior;

impl NewickBehavior<DefaultNodeData, PlacementEdgeData> for PlacementCountBehavior {
    fn edge_to_element(&self, edge: &Edge<PlacementEdgeData>, element: &mut BrokerElement) {
        element.comments.push(edge.data.placement_count.to_string());
    }
}

/// Newick processor for jplace reference trees, composed with
/// [`EdgeNumBehavior`]. Add [`PlacementCountBehavior`] to also emit counts:
///
/// ```
/// use phylotk::placement::{placement_processor, PlacementCountBehavior};
///
/// let tree = placement_processor().from_string("(A{0},B{1})R;").unwrap();
/// let with_counts = placement_processor().with_behavior(Box::new(PlacementCountBehavior));
/// assert_eq!(with_counts.to_string(&tree), "(A{0}[0],B{1}[0])R;");
/// ```
pub fn placement_processor() -> NewickProcessor<DefaultNodeData, PlacementEdgeData> {
    NewickProcessor::new().with_behavior(Box::new(EdgeNumBehavior))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::PlacementTree;

    #[test]
    fn test_edge_num_round_trip() {
        let input = "((A{0},B{1})C{2},D{7})R;";
        let tree: PlacementTree = placement_processor().from_string(input).unwrap();

        let d = tree.find_node("D").unwrap();
        let edge = tree.edge(tree.rootward_edge(d).unwrap()).unwrap();
        assert_eq!(edge.data.edge_num, 7);

        assert_eq!(placement_processor().to_string(&tree), input);
    }

    #[test]
    fn test_edge_num_with_lengths() {
        let tree: PlacementTree = placement_processor()
            .from_string("(A:0.2{0},B:0.09{1})R;")
            .unwrap();
        let a = tree.find_node("A").unwrap();
        let edge = tree.edge(tree.rootward_edge(a).unwrap()).unwrap();
        assert_eq!(edge.data.edge_num, 0);
        assert!((edge.length - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_missing_tag_rejected() {
        let err = placement_processor().from_string("(A{0},B)R;").unwrap_err();
        match err {
            TreeError::Format { message, line, column } => {
                assert!(message.contains("edge_num"));
                assert_eq!(line, 1);
                assert_eq!(column, 7); // position of 'B'
            }
            other => panic!("expected Format error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        assert!(placement_processor().from_string("(A{0}{1},B{2})R;").is_err());
    }

    #[test]
    fn test_bad_tag_rejected() {
        assert!(placement_processor().from_string("(A{x},B{1})R;").is_err());
    }

    #[test]
    fn test_root_needs_no_tag() {
        // The root has no rootward edge, so no tag is required there.
        assert!(placement_processor().from_string("(A{0},B{1})R;").is_ok());
    }

    #[test]
    fn test_count_comments() {
        let mut tree: PlacementTree = placement_processor().from_string("(A{0},B{1})R;").unwrap();
        let a = tree.find_node("A").unwrap();
        let edge_id = tree.rootward_edge(a).unwrap();
        tree.edge_mut(edge_id).unwrap().data.placement_count = 5;

        let out = placement_processor()
            .with_behavior(Box::new(PlacementCountBehavior))
            .to_string(&tree);
        assert!(out.contains("A{0}[5]"));
        assert!(out.contains("B{1}[0]"));
    }
}
