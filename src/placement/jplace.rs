//! Jplace document reader.
//!
//! Parses the jplace JSON format (version 3) into a [`Sample`]: the
//! reference tree is run through the placement Newick processor, pqueries
//! are decoded against the document's field list, and every placement's
//! edge number is resolved against the tree before counts are accumulated.

use super::{placement_processor, Pquery, PqueryName, PqueryPlacement, Sample};
use crate::tree::TreeError;
use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use tracing::warn;

/// The jplace version this reader is written for.
const VERSION: i64 = 3;

#[derive(Debug, Deserialize)]
struct JplaceDocument {
    version: i64,
    tree: String,
    fields: Vec<String>,
    placements: Vec<JplacePquery>,
    #[serde(default)]
    metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct JplacePquery {
    p: Vec<Vec<f64>>,
    n: Option<Vec<String>>,
    nm: Option<Vec<(String, f64)>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldKind {
    EdgeNum,
    Likelihood,
    LikeWeightRatio,
    DistalLength,
    PendantLength,
    Parsimony,
}

fn field_kind(name: &str) -> Option<FieldKind> {
    match name {
        "edge_num" => Some(FieldKind::EdgeNum),
        "likelihood" => Some(FieldKind::Likelihood),
        "like_weight_ratio" => Some(FieldKind::LikeWeightRatio),
        "distal_length" => Some(FieldKind::DistalLength),
        "pendant_length" => Some(FieldKind::PendantLength),
        "parsimony" => Some(FieldKind::Parsimony),
        _ => None,
    }
}

/// Reader for jplace v3 documents.
///
/// # Example
/// ```
/// use phylotk::placement::JplaceReader;
///
/// let text = r#"{
///     "version": 3,
///     "tree": "(A:0.2{0},B:0.09{1})R;",
///     "fields": ["edge_num", "likelihood", "like_weight_ratio"],
///     "placements": [
///         { "p": [[0, -1234.5, 0.9], [1, -1300.0, 0.1]], "n": ["query_1"] }
///     ]
/// }"#;
/// let sample = JplaceReader::new().from_string(text).unwrap();
/// assert_eq!(sample.pquery_count(), 1);
/// assert_eq!(sample.placement_count(), 2);
/// ```
pub struct JplaceReader;

impl Default for JplaceReader {
    fn default() -> Self {
        Self::new()
    }
}

impl JplaceReader {
    pub fn new() -> Self {
        Self
    }

    /// Read a sample from a file ("stdin" for stdin, `.gz` transparent).
    pub fn from_file(&self, infile: &str) -> anyhow::Result<Sample> {
        let mut reader = crate::io::file::reader(infile)?;
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        self.from_string(&text)
            .with_context(|| format!("in jplace file {}", infile))
    }

    pub fn from_string(&self, text: &str) -> anyhow::Result<Sample> {
        let doc: JplaceDocument =
            serde_json::from_str(text).context("invalid jplace document")?;
        self.process(doc)
    }

    fn process(&self, doc: JplaceDocument) -> anyhow::Result<Sample> {
        if doc.version != VERSION {
            warn!(
                version = doc.version,
                "jplace document has a version this reader is not written for, \
                 continuing in the hope that it still works"
            );
        }

        let tree = placement_processor().from_string(&doc.tree)?;

        // Resolve the field list. Unknown names are skipped but keep their
        // column, so every p row must still match the full list length.
        let mut kinds: Vec<Option<FieldKind>> = Vec::with_capacity(doc.fields.len());
        for (i, name) in doc.fields.iter().enumerate() {
            match field_kind(name) {
                Some(kind) => {
                    if kinds.contains(&Some(kind)) {
                        bail!("jplace field '{}' appears more than once", name);
                    }
                    kinds.push(Some(kind));
                }
                None => {
                    warn!(field = %name, index = i, "skipping unknown jplace field");
                    kinds.push(None);
                }
            }
        }
        if !kinds.contains(&Some(FieldKind::EdgeNum)) {
            bail!("jplace document lacks the required field 'edge_num'");
        }

        let mut sample = Sample {
            tree,
            ..Default::default()
        };
        let edge_nums = sample.edge_num_map();

        for (qi, jpqry) in doc.placements.into_iter().enumerate() {
            let mut pquery = Pquery::default();

            for row in &jpqry.p {
                if row.len() != kinds.len() {
                    bail!(
                        "jplace pquery {} has a placement with {} values for {} fields",
                        qi,
                        row.len(),
                        kinds.len()
                    );
                }
                let mut placement = PqueryPlacement::default();
                for (value, kind) in row.iter().zip(&kinds) {
                    match kind {
                        Some(FieldKind::EdgeNum) => placement.edge_num = *value as i64,
                        Some(FieldKind::Likelihood) => placement.likelihood = *value,
                        Some(FieldKind::LikeWeightRatio) => placement.like_weight_ratio = *value,
                        Some(FieldKind::DistalLength) => placement.distal_length = *value,
                        Some(FieldKind::PendantLength) => placement.pendant_length = *value,
                        Some(FieldKind::Parsimony) => placement.parsimony = *value,
                        None => {}
                    }
                }

                let edge_id = *edge_nums.get(&placement.edge_num).ok_or_else(|| {
                    TreeError::structure(format!(
                        "placement edge_num {} does not match any tree edge",
                        placement.edge_num
                    ))
                })?;
                if let Some(edge) = sample.tree.edge_mut(edge_id) {
                    edge.data.placement_count += 1;
                }
                pquery.placements.push(placement);
            }

            match (jpqry.n, jpqry.nm) {
                (Some(_), Some(_)) => {
                    bail!("jplace pquery {} has both an 'n' and an 'nm' key", qi)
                }
                (None, None) => {
                    bail!("jplace pquery {} has neither an 'n' nor an 'nm' key", qi)
                }
                (Some(names), None) => {
                    for name in names {
                        pquery.names.push(PqueryName {
                            name,
                            multiplicity: 0.0,
                        });
                    }
                }
                (None, Some(named)) => {
                    for (name, multiplicity) in named {
                        if multiplicity < 0.0 {
                            warn!(name = %name, multiplicity, "negative multiplicity in jplace pquery");
                        }
                        pquery.names.push(PqueryName { name, multiplicity });
                    }
                }
            }

            sample.pqueries.push(pquery);
        }

        for (key, value) in doc.metadata {
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            sample.metadata.insert(key, text);
        }

        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    const DOC: &str = r#"{
        "version": 3,
        "tree": "((A:0.2{0},B:0.09{1}):0.7{2},C:0.5{3})R;",
        "fields": ["edge_num", "likelihood", "like_weight_ratio",
                   "distal_length", "pendant_length"],
        "placements": [
            {
                "p": [[1, -2578.16, 0.78, 0.02, 0.15],
                      [0, -2580.00, 0.22, 0.01, 0.17]],
                "n": ["fragment_1"]
            },
            {
                "p": [[3, -1200.5, 1.0, 0.1, 0.05]],
                "nm": [["fragment_2", 2.0], ["fragment_3", 1.5]]
            }
        ],
        "metadata": { "invocation": "placer --ref tree.nwk" }
    }"#;

    #[test]
    fn test_full_document() {
        let sample = JplaceReader::new().from_string(DOC).unwrap();
        assert_eq!(sample.pquery_count(), 2);
        assert_eq!(sample.placement_count(), 3);
        assert_eq!(sample.tree.node_count(), 5);

        let first = &sample.pqueries[0];
        assert_eq!(first.placements[0].edge_num, 1);
        assert_relative_eq!(first.placements[0].likelihood, -2578.16);
        assert_relative_eq!(first.placements[0].like_weight_ratio, 0.78);
        assert_eq!(first.names[0].name, "fragment_1");
        assert_relative_eq!(first.names[0].multiplicity, 0.0);

        let second = &sample.pqueries[1];
        assert_eq!(second.names.len(), 2);
        assert_relative_eq!(second.names[1].multiplicity, 1.5);

        assert_eq!(
            sample.metadata.get("invocation").map(String::as_str),
            Some("placer --ref tree.nwk")
        );
    }

    #[test]
    fn test_counts_accumulate() {
        let sample = JplaceReader::new().from_string(DOC).unwrap();
        let map = sample.edge_num_map();
        let count = |num: i64| {
            sample.tree.edge(map[&num]).unwrap().data.placement_count
        };
        assert_eq!(count(0), 1);
        assert_eq!(count(1), 1);
        assert_eq!(count(2), 0);
        assert_eq!(count(3), 1);
    }

    #[test]
    fn test_missing_edge_num_field() {
        let text = r#"{
            "version": 3,
            "tree": "(A{0},B{1})R;",
            "fields": ["likelihood"],
            "placements": []
        }"#;
        let err = JplaceReader::new().from_string(text).unwrap_err();
        assert!(err.to_string().contains("edge_num"));
    }

    #[test]
    fn test_duplicate_field() {
        let text = r#"{
            "version": 3,
            "tree": "(A{0},B{1})R;",
            "fields": ["edge_num", "edge_num"],
            "placements": []
        }"#;
        assert!(JplaceReader::new().from_string(text).is_err());
    }

    #[test]
    fn test_unknown_field_skipped() {
        let text = r#"{
            "version": 3,
            "tree": "(A{0},B{1})R;",
            "fields": ["edge_num", "post_prob"],
            "placements": [ { "p": [[0, 0.99]], "n": ["q"] } ]
        }"#;
        let sample = JplaceReader::new().from_string(text).unwrap();
        assert_eq!(sample.pqueries[0].placements[0].edge_num, 0);
    }

    #[test]
    fn test_row_length_mismatch() {
        let text = r#"{
            "version": 3,
            "tree": "(A{0},B{1})R;",
            "fields": ["edge_num", "likelihood"],
            "placements": [ { "p": [[0]], "n": ["q"] } ]
        }"#;
        assert!(JplaceReader::new().from_string(text).is_err());
    }

    #[test]
    fn test_name_forms_exclusive() {
        let both = r#"{
            "version": 3,
            "tree": "(A{0},B{1})R;",
            "fields": ["edge_num"],
            "placements": [ { "p": [[0]], "n": ["q"], "nm": [["q", 1.0]] } ]
        }"#;
        assert!(JplaceReader::new().from_string(both).is_err());

        let neither = r#"{
            "version": 3,
            "tree": "(A{0},B{1})R;",
            "fields": ["edge_num"],
            "placements": [ { "p": [[0]] } ]
        }"#;
        assert!(JplaceReader::new().from_string(neither).is_err());
    }

    #[test]
    fn test_unresolvable_edge_num() {
        let text = r#"{
            "version": 3,
            "tree": "(A{0},B{1})R;",
            "fields": ["edge_num"],
            "placements": [ { "p": [[9]], "n": ["q"] } ]
        }"#;
        let err = JplaceReader::new().from_string(text).unwrap_err();
        assert!(err.to_string().contains("edge_num 9"));
    }

    #[test]
    fn test_bad_reference_tree() {
        let text = r#"{
            "version": 3,
            "tree": "(A{0},B)R;",
            "fields": ["edge_num"],
            "placements": []
        }"#;
        assert!(JplaceReader::new().from_string(text).is_err());
    }

    #[test]
    fn test_from_file_gz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.jplace.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        enc.write_all(DOC.as_bytes()).unwrap();
        enc.finish().unwrap();

        let sample = JplaceReader::new().from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(sample.pquery_count(), 2);
    }
}
