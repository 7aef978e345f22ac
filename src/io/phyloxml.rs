//! Phyloxml export.
//!
//! The writer consumes the same depth-annotated broker as the Newick writer,
//! but keeps an explicit stack of open `clade` elements: a new clade is
//! pushed when an element's depth increases, and clades are closed back down
//! to the ancestor when it does not.

use crate::tree::{Tree, TreeBroker, TreeError};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const PHYLOXML_NAMESPACE: &str = "http://www.phyloxml.org";
const SCHEMA_LOCATION: &str =
    "http://www.phyloxml.org http://www.phyloxml.org/1.10/phyloxml.xsd";

/// Phyloxml document writer.
///
/// # Example
/// ```
/// use phylotk::io::newick::NewickProcessor;
/// use phylotk::io::phyloxml::PhyloxmlWriter;
/// use phylotk::tree::DefaultTree;
///
/// let tree: DefaultTree = NewickProcessor::new().from_string("(A,B)C;").unwrap();
/// let xml = PhyloxmlWriter::new().to_string(&tree).unwrap();
/// assert!(xml.contains("<phylogeny rooted=\"true\">"));
/// ```
pub struct PhyloxmlWriter {
    /// Write `branch_length` child elements
    pub write_branch_lengths: bool,
}

impl Default for PhyloxmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PhyloxmlWriter {
    pub fn new() -> Self {
        Self {
            write_branch_lengths: false,
        }
    }

    pub fn branch_lengths(mut self, value: bool) -> Self {
        self.write_branch_lengths = value;
        self
    }

    /// Serialize a tree as an indented phyloxml document.
    pub fn to_string<N, E>(&self, tree: &Tree<N, E>) -> Result<String, TreeError> {
        let (broker, _) = crate::tree::build::tree_to_broker(tree);
        self.write_broker(&broker)
    }

    /// Serialize a broker as an indented phyloxml document.
    pub fn write_broker(&self, broker: &TreeBroker) -> Result<String, TreeError> {
        let mut buffer = Cursor::new(Vec::new());
        let mut writer = Writer::new_with_indent(&mut buffer, b' ', 4);

        write_event(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("phyloxml");
        root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        root.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
        root.push_attribute(("xmlns", PHYLOXML_NAMESPACE));
        write_event(&mut writer, Event::Start(root))?;

        let mut phylogeny = BytesStart::new("phylogeny");
        phylogeny.push_attribute(("rooted", "true"));
        write_event(&mut writer, Event::Start(phylogeny))?;

        // Depths of the currently open clades.
        let mut open: Vec<usize> = Vec::new();
        for element in broker.iter() {
            while open.last().map_or(false, |&d| d >= element.depth) {
                open.pop();
                write_event(&mut writer, Event::End(BytesEnd::new("clade")))?;
            }

            write_event(&mut writer, Event::Start(BytesStart::new("clade")))?;
            open.push(element.depth);

            if !element.name.is_empty() {
                write_event(&mut writer, Event::Start(BytesStart::new("name")))?;
                write_event(&mut writer, Event::Text(BytesText::new(&element.name)))?;
                write_event(&mut writer, Event::End(BytesEnd::new("name")))?;
            }
            if self.write_branch_lengths {
                if let Some(length) = element.branch_length {
                    let text = length.to_string();
                    write_event(&mut writer, Event::Start(BytesStart::new("branch_length")))?;
                    write_event(&mut writer, Event::Text(BytesText::new(&text)))?;
                    write_event(&mut writer, Event::End(BytesEnd::new("branch_length")))?;
                }
            }
        }
        while open.pop().is_some() {
            write_event(&mut writer, Event::End(BytesEnd::new("clade")))?;
        }

        write_event(&mut writer, Event::End(BytesEnd::new("phylogeny")))?;
        write_event(&mut writer, Event::End(BytesEnd::new("phyloxml")))?;

        let mut output = buffer.into_inner();
        output.push(b'\n');
        String::from_utf8(output)
            .map_err(|e| TreeError::structure(format!("invalid UTF-8 in XML output: {}", e)))
    }
}

fn write_event<W: std::io::Write>(
    writer: &mut Writer<W>,
    event: Event<'_>,
) -> Result<(), TreeError> {
    writer
        .write_event(event)
        .map_err(|e| TreeError::structure(format!("XML write error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::newick::NewickProcessor;
    use crate::tree::DefaultTree;

    fn tree(text: &str) -> DefaultTree {
        NewickProcessor::new().from_string(text).unwrap()
    }

    #[test]
    fn test_document_shape() {
        let xml = PhyloxmlWriter::new().to_string(&tree("(A,B)C;")).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("xmlns=\"http://www.phyloxml.org\""));
        assert!(xml.contains("<phylogeny rooted=\"true\">"));
        assert_eq!(xml.matches("<clade>").count(), 3);
        assert_eq!(xml.matches("</clade>").count(), 3);
        assert_eq!(xml.matches("<name>").count(), 3);
        assert!(xml.ends_with("</phyloxml>\n"));
    }

    #[test]
    fn test_nesting_follows_depth() {
        let xml = PhyloxmlWriter::new()
            .to_string(&tree("((B,(D,E)C)A,F,(H,I)G)R;"))
            .unwrap();
        assert_eq!(xml.matches("<clade>").count(), 10);
        assert_eq!(xml.matches("</clade>").count(), 10);
        // D's clade is nested inside C's, which is inside A's.
        let a = xml.find("<name>A</name>").unwrap();
        let c = xml.find("<name>C</name>").unwrap();
        let d = xml.find("<name>D</name>").unwrap();
        assert!(a < c && c < d);
    }

    #[test]
    fn test_branch_lengths() {
        let xml = PhyloxmlWriter::new()
            .branch_lengths(true)
            .to_string(&tree("(A:0.5,B:1.5)C;"))
            .unwrap();
        assert!(xml.contains("<branch_length>0.5</branch_length>"));
        assert!(xml.contains("<branch_length>1.5</branch_length>"));
    }

    #[test]
    fn test_empty_tree() {
        let xml = PhyloxmlWriter::new().to_string(&DefaultTree::new()).unwrap();
        assert!(xml.contains("<phylogeny rooted=\"true\">"));
        assert!(!xml.contains("<clade>"));
    }

    #[test]
    fn test_anonymous_clades_have_no_name() {
        let xml = PhyloxmlWriter::new().to_string(&tree("(A,B);")).unwrap();
        assert_eq!(xml.matches("<clade>").count(), 3);
        assert_eq!(xml.matches("<name>").count(), 2);
    }
}
