//! Newick reading and writing through the tree broker.
//!
//! The processor itself only knows about names and branch lengths. Every
//! extra capability (edge numbers in `{}` tags, placement counts in `[]`
//! comments, ...) is a [`NewickBehavior`] composed into the processor at
//! construction time, contributing its own fragment on write and its own
//! extraction/validation on read.

use super::lexer::{self, Token, TokenKind};
use crate::tree::build;
use crate::tree::{BrokerElement, Edge, Node, Tree, TreeBroker, TreeError};
use std::io::Read;

/// Read/write hooks for one format capability. All hooks default to no-ops;
/// a behavior overrides only the sides it cares about. Read-side hooks may
/// fail with a [`TreeError::Format`] citing the element's position.
pub trait NewickBehavior<N, E> {
    fn element_to_node(&self, _element: &BrokerElement, _node: &mut Node<N>) -> Result<(), TreeError> {
        Ok(())
    }

    fn element_to_edge(&self, _element: &BrokerElement, _edge: &mut Edge<E>) -> Result<(), TreeError> {
        Ok(())
    }

    fn node_to_element(&self, _node: &Node<N>, _element: &mut BrokerElement) {}

    fn edge_to_element(&self, _edge: &Edge<E>, _element: &mut BrokerElement) {}
}

/// Bidirectional converter between Newick text and trees, pivoting through
/// the [`TreeBroker`].
///
/// # Example
/// ```
/// use phylotk::io::newick::NewickProcessor;
/// use phylotk::tree::DefaultTree;
///
/// let tree: DefaultTree = NewickProcessor::new()
///     .from_string("((A:0.1,B:0.2)C:0.3,D)R;")
///     .unwrap();
/// let out = NewickProcessor::new().branch_lengths(true).to_string(&tree);
/// assert_eq!(out, "((A:0.1,B:0.2)C:0.3,D:0)R;");
/// ```
pub struct NewickProcessor<N = crate::tree::DefaultNodeData, E = crate::tree::DefaultEdgeData> {
    behaviors: Vec<Box<dyn NewickBehavior<N, E>>>,

    /// Branch length for edges whose element carries none
    pub default_branch_length: f64,

    /// Write node names
    pub write_names: bool,

    /// Write a `:length` for every non-root node
    pub write_branch_lengths: bool,

    /// Write `{tag}` fragments contributed by behaviors
    pub write_tags: bool,

    /// Write `[comment]` fragments contributed by behaviors
    pub write_comments: bool,
}

impl<N, E> Default for NewickProcessor<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> NewickProcessor<N, E> {
    pub fn new() -> Self {
        Self {
            behaviors: Vec::new(),
            default_branch_length: 0.0,
            write_names: true,
            write_branch_lengths: false,
            write_tags: true,
            write_comments: true,
        }
    }

    /// Compose a behavior into this processor. Behaviors run in the order
    /// they were added.
    pub fn with_behavior(mut self, behavior: Box<dyn NewickBehavior<N, E>>) -> Self {
        self.behaviors.push(behavior);
        self
    }

    pub fn branch_lengths(mut self, value: bool) -> Self {
        self.write_branch_lengths = value;
        self
    }

    // ---------------------------------------------------------------------
    // Reading
    // ---------------------------------------------------------------------

    /// Tokenize and parse Newick text into a broker in one left-to-right
    /// pass. Nested parentheses increase depth, `,` separates siblings at
    /// the same depth, `;` terminates.
    ///
    /// An internal node's element is opened as a placeholder at its `(` and
    /// filled in once the matching `)` is reached, which keeps the broker in
    /// preorder. No partial result is returned on error.
    pub fn parse_broker(&self, text: &str) -> Result<TreeBroker, TreeError> {
        let tokens = lexer::tokenize(text)?;

        let mut broker = TreeBroker::new();
        let mut depth: usize = 0;
        // Indices of placeholder elements for the currently open '('s.
        let mut pending: Vec<usize> = Vec::new();
        // Element currently receiving label/length/tags, plus whether a
        // name may still be attached to it.
        let mut active: Option<usize> = None;
        let mut name_allowed = false;
        let mut finished = false;

        let mut iter = tokens.iter();
        while let Some(token) = iter.next() {
            if finished {
                return Err(TreeError::format(
                    format!("trailing input '{}' after ';'", token.value),
                    token.line,
                    token.column,
                ));
            }
            match token.kind {
                TokenKind::Bracket if token.is_bracket('(') => {
                    if active.is_some() {
                        return Err(TreeError::format("unexpected '('", token.line, token.column));
                    }
                    let mut element = BrokerElement::new(depth);
                    element.line = token.line;
                    element.column = token.column;
                    pending.push(broker.len());
                    broker.push(element);
                    depth += 1;
                }
                TokenKind::Bracket => {
                    // ')'
                    if depth == 0 {
                        return Err(TreeError::format("unmatched ')'", token.line, token.column));
                    }
                    if active.is_none() {
                        // Anonymous trailing child, e.g. "(A,)".
                        broker.push(BrokerElement::new(depth));
                    }
                    depth -= 1;
                    active = pending.pop();
                    name_allowed = true;
                }
                TokenKind::Operator if token.is_operator(',') => {
                    if depth == 0 {
                        return Err(TreeError::format(
                            "',' outside parentheses",
                            token.line,
                            token.column,
                        ));
                    }
                    if active.is_none() {
                        // Anonymous child, e.g. "(,B)".
                        broker.push(BrokerElement::new(depth));
                    }
                    active = None;
                    name_allowed = false;
                }
                TokenKind::Operator if token.is_operator(';') => {
                    if depth != 0 {
                        return Err(TreeError::format(
                            format!("';' with {} unclosed '('", depth),
                            token.line,
                            token.column,
                        ));
                    }
                    active = None;
                    finished = true;
                }
                TokenKind::Operator => {
                    // ':' introduces a branch length.
                    let idx = self.activate(&mut broker, &mut active, depth, token);
                    if broker[idx].branch_length.is_some() {
                        return Err(TreeError::format(
                            "second branch length for the same node",
                            token.line,
                            token.column,
                        ));
                    }
                    let length = match iter.next() {
                        Some(t) if t.kind == TokenKind::Number => {
                            t.value.parse::<f64>().map_err(|_| {
                                TreeError::format(
                                    format!("invalid branch length '{}'", t.value),
                                    t.line,
                                    t.column,
                                )
                            })?
                        }
                        Some(t) => {
                            return Err(TreeError::format(
                                format!("expected branch length after ':', found '{}'", t.value),
                                t.line,
                                t.column,
                            ));
                        }
                        None => {
                            let (line, column) = lexer::end_position(text);
                            return Err(TreeError::format(
                                "expected branch length after ':'",
                                line,
                                column,
                            ));
                        }
                    };
                    if let Some(element) = broker.get_mut(idx) {
                        element.branch_length = Some(length);
                    }
                    name_allowed = false;
                }
                TokenKind::Symbol | TokenKind::Number | TokenKind::String => {
                    match active {
                        Some(idx) if name_allowed => {
                            if let Some(element) = broker.get_mut(idx) {
                                element.name = token.value.clone();
                                element.line = token.line;
                                element.column = token.column;
                            }
                            name_allowed = false;
                        }
                        Some(_) => {
                            return Err(TreeError::format(
                                format!("unexpected label '{}'", token.value),
                                token.line,
                                token.column,
                            ));
                        }
                        None => {
                            let mut element = BrokerElement::new(depth);
                            element.name = token.value.clone();
                            element.line = token.line;
                            element.column = token.column;
                            active = Some(broker.len());
                            broker.push(element);
                            name_allowed = false;
                        }
                    }
                }
                TokenKind::Tag => {
                    let idx = self.activate(&mut broker, &mut active, depth, token);
                    if let Some(element) = broker.get_mut(idx) {
                        element.tags.push(token.value.clone());
                    }
                    name_allowed = false;
                }
                TokenKind::Comment => {
                    // Comments before any element (file headers) are skipped.
                    if let Some(idx) = active {
                        if let Some(element) = broker.get_mut(idx) {
                            element.comments.push(token.value.clone());
                        }
                    }
                }
            }
        }

        if !finished {
            let (line, column) = lexer::end_position(text);
            return Err(TreeError::format(
                "unexpected end of input, expected ';'",
                line,
                column,
            ));
        }

        broker.validate()?;
        Ok(broker)
    }

    /// Make sure there is an element to attach `:length`/`{tag}` pieces to,
    /// creating an anonymous one for inputs like `(:0.1,B)`.
    fn activate(
        &self,
        broker: &mut TreeBroker,
        active: &mut Option<usize>,
        depth: usize,
        token: &Token,
    ) -> usize {
        match *active {
            Some(idx) => idx,
            None => {
                let mut element = BrokerElement::new(depth);
                element.line = token.line;
                element.column = token.column;
                let idx = broker.len();
                broker.push(element);
                *active = Some(idx);
                idx
            }
        }
    }

    // ---------------------------------------------------------------------
    // Writing
    // ---------------------------------------------------------------------

    /// Serialize a broker to compact Newick text.
    pub fn write_broker(&self, broker: &TreeBroker) -> String {
        let mut out = String::new();
        if !broker.is_empty() {
            self.write_element(broker, 0, &mut out);
        }
        out.push(';');
        out
    }

    /// Write the element at `idx` and its subtree; returns the index just
    /// past the subtree.
    fn write_element(&self, broker: &TreeBroker, idx: usize, out: &mut String) -> usize {
        let element = &broker[idx];
        let child_depth = element.depth + 1;
        let mut next = idx + 1;

        if broker.get(next).map_or(false, |c| c.depth == child_depth) {
            out.push('(');
            let mut first = true;
            while broker.get(next).map_or(false, |c| c.depth == child_depth) {
                if !first {
                    out.push(',');
                }
                first = false;
                next = self.write_element(broker, next, out);
            }
            out.push(')');
        }

        if self.write_names {
            out.push_str(&quote_label(&element.name));
        }
        if self.write_branch_lengths {
            if let Some(length) = element.branch_length {
                out.push(':');
                out.push_str(&length.to_string());
            }
        }
        if self.write_tags {
            for tag in &element.tags {
                out.push('{');
                out.push_str(tag);
                out.push('}');
            }
        }
        if self.write_comments {
            for comment in &element.comments {
                out.push('[');
                out.push_str(comment);
                out.push(']');
            }
        }

        next
    }
}

impl<N: Default, E: Default> NewickProcessor<N, E> {
    /// Parse a Newick string into a tree, running all composed behaviors
    /// against the node and rootward edge of every element.
    ///
    /// # Example
    /// ```
    /// use phylotk::io::newick::NewickProcessor;
    /// use phylotk::tree::DefaultTree;
    ///
    /// let tree: DefaultTree = NewickProcessor::new().from_string("(A:0.1,B:0.2)R;").unwrap();
    /// assert_eq!(tree.node_count(), 3);
    ///
    /// let result: Result<DefaultTree, _> = NewickProcessor::new().from_string("(A,B;");
    /// assert!(result.is_err());
    /// ```
    pub fn from_string(&self, text: &str) -> Result<Tree<N, E>, TreeError> {
        let broker = self.parse_broker(text)?;
        self.broker_to_tree(&broker)
    }

    /// Read a Newick tree from a file ("stdin" for stdin, `.gz` transparent).
    pub fn from_file(&self, infile: &str) -> anyhow::Result<Tree<N, E>> {
        let mut reader = super::file::reader(infile)?;
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(self.from_string(&text)?)
    }

    /// Build a tree from an already parsed broker.
    pub fn broker_to_tree(&self, broker: &TreeBroker) -> Result<Tree<N, E>, TreeError> {
        let (mut tree, handles) = build::broker_to_tree(broker, self.default_branch_length)?;
        for (element, handle) in broker.iter().zip(&handles) {
            for behavior in &self.behaviors {
                behavior.element_to_node(element, &mut tree.nodes[handle.node])?;
                if let Some(edge) = handle.edge {
                    behavior.element_to_edge(element, &mut tree.edges[edge])?;
                }
            }
        }
        Ok(tree)
    }
}

impl<N, E> NewickProcessor<N, E> {
    /// Serialize a tree to compact Newick text.
    #[allow(clippy::wrong_self_convention)]
    pub fn to_string(&self, tree: &Tree<N, E>) -> String {
        self.write_broker(&self.tree_to_broker(tree))
    }

    /// Emit a tree as a broker, letting behaviors contribute their tags and
    /// comments per element.
    pub fn tree_to_broker(&self, tree: &Tree<N, E>) -> TreeBroker {
        let (mut broker, handles) = build::tree_to_broker(tree);
        for (i, handle) in handles.iter().enumerate() {
            if let Some(element) = broker.get_mut(i) {
                for behavior in &self.behaviors {
                    behavior.node_to_element(&tree.nodes[handle.node], element);
                    if let Some(edge) = handle.edge {
                        behavior.edge_to_element(&tree.edges[edge], element);
                    }
                }
            }
        }
        broker
    }
}

/// Quote a label if it contains reserved characters or whitespace.
fn quote_label(name: &str) -> String {
    if name.is_empty() || !name.chars().any(|c| super::lexer::needs_quoting(c)) {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::DefaultTree;
    use approx::assert_relative_eq;

    fn processor() -> NewickProcessor {
        NewickProcessor::new()
    }

    #[test]
    fn test_parse_simple() {
        let tree: DefaultTree = processor().from_string("(A,B)C;").unwrap();
        assert_eq!(tree.node_count(), 3);
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).unwrap().name, "C");
        assert_eq!(tree.children(root).len(), 2);
    }

    #[test]
    fn test_parse_lengths() {
        let tree: DefaultTree = processor().from_string("(A:0.1, B:0.2e-1)Root;").unwrap();
        let a = tree.find_node("A").unwrap();
        let b = tree.find_node("B").unwrap();
        assert_relative_eq!(tree.edge(tree.rootward_edge(a).unwrap()).unwrap().length, 0.1);
        assert_relative_eq!(tree.edge(tree.rootward_edge(b).unwrap()).unwrap().length, 0.02);
    }

    #[test]
    fn test_parse_whitespace() {
        let tree: DefaultTree = processor().from_string("  (  A : 0.1 ,  B  )  ;  ").unwrap();
        assert_eq!(tree.node_count(), 3);

        let tree: DefaultTree = processor()
            .from_string("\n(\n    A : 0.1,\n    B : 0.2\n) Root ;\n")
            .unwrap();
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.node(tree.root().unwrap()).unwrap().name, "Root");
    }

    #[test]
    fn test_parse_quoted() {
        let tree: DefaultTree = processor()
            .from_string("('Homo sapiens':0.1, \"Mus musculus\":0.2);")
            .unwrap();
        assert!(tree.find_node("Homo sapiens").is_some());
        assert!(tree.find_node("Mus musculus").is_some());
    }

    #[test]
    fn test_parse_anonymous_nodes() {
        let tree: DefaultTree = processor().from_string("((A,B),(C,D));").unwrap();
        assert_eq!(tree.node_count(), 7);
        assert_eq!(tree.node(tree.root().unwrap()).unwrap().name, "");
    }

    #[test]
    fn test_parse_broker_preorder() {
        let broker = processor().parse_broker("((B,(D,E)C)A,F)R;").unwrap();
        let names: Vec<&str> = broker.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["R", "A", "B", "C", "D", "E", "F"]);
        let depths: Vec<usize> = broker.iter().map(|e| e.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 2, 3, 3, 1]);
    }

    #[test]
    fn test_parse_tags_and_comments() {
        let broker = processor().parse_broker("(A{0}[c1][c2],B{1})R{2};").unwrap();
        assert_eq!(broker[1].tags, vec!["0"]);
        assert_eq!(broker[1].comments, vec!["c1", "c2"]);
        assert_eq!(broker[0].tags, vec!["2"]);
    }

    #[test]
    fn test_parse_unbalanced() {
        let err = processor().from_string("(A,B;").unwrap_err();
        match err {
            TreeError::Format { line, column, .. } => {
                assert_eq!(line, 1);
                assert_eq!(column, 5); // the ';'
            }
            other => panic!("expected Format error, got {:?}", other),
        }

        let err = processor().from_string("(A,B)C").unwrap_err();
        match err {
            TreeError::Format { line, column, .. } => {
                assert_eq!(line, 1);
                assert_eq!(column, 7); // just past the end
            }
            other => panic!("expected Format error, got {:?}", other),
        }

        assert!(processor().from_string("A,B;").is_err());
        assert!(processor().from_string(")A;").is_err());
        assert!(processor().from_string("(A,B)C;(").is_err());
    }

    #[test]
    fn test_parse_bad_length() {
        let err = processor().from_string("(A,B:invalid)C;").unwrap_err();
        match err {
            TreeError::Format { message, line, .. } => {
                assert_eq!(line, 1);
                assert!(message.contains("branch length"));
            }
            other => panic!("expected Format error, got {:?}", other),
        }
    }

    #[test]
    fn test_write_simple() {
        let tree: DefaultTree = processor().from_string("((B,(D,E)C)A,F,(H,I)G)R;").unwrap();
        assert_eq!(processor().to_string(&tree), "((B,(D,E)C)A,F,(H,I)G)R;");
    }

    #[test]
    fn test_write_lengths() {
        let input = "((A:0.1,B:0.2)C:0.3,D:0.4)R;";
        let tree: DefaultTree = processor().from_string(input).unwrap();
        assert_eq!(processor().branch_lengths(true).to_string(&tree), input);
    }

    #[test]
    fn test_write_quoting() {
        let tree: DefaultTree = processor().from_string("'Homo sapiens';").unwrap();
        assert_eq!(processor().to_string(&tree), "'Homo sapiens';");
    }

    #[test]
    fn test_write_empty_tree() {
        let tree = DefaultTree::new();
        assert_eq!(processor().to_string(&tree), ";");
    }

    #[test]
    fn test_round_trip_topology() {
        let inputs = [
            "((B,(D,E)C)A,F,(H,I)G)R;",
            "(A,B)C;",
            "A;",
            "((A:1,B:2):0.5,C:3)R;",
        ];
        for input in inputs {
            let tree: DefaultTree = processor().from_string(input).unwrap();
            let text = processor().branch_lengths(true).to_string(&tree);
            let back: DefaultTree = processor().from_string(&text).unwrap();
            assert_eq!(back.node_count(), tree.node_count());
            assert_eq!(back.edge_count(), tree.edge_count());
            let first: Vec<String> = tree
                .preorder()
                .map(|v| tree.node(v.node).unwrap().name.clone())
                .collect();
            let second: Vec<String> = back
                .preorder()
                .map(|v| back.node(v.node).unwrap().name.clone())
                .collect();
            assert_eq!(first, second);
        }
    }
}
