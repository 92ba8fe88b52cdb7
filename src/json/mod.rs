//! JSON export and import of annotated trees.
//!
//! Every node becomes an object whose `name` carries the consensus label
//! (with `|` at the start of its monophyletic tail) followed by the
//! annotation counts, `label{nleaf[/tax_size][+nxleaf]}`:
//!
//! ```json
//! {"name":"<D>X|<K>Y{2}","ntype":"Coincide","length":"0.50000","children":[...]}
//! ```
//!
//! `/tax_size` is present when the node holds only part of its taxon,
//! `+nxleaf` when leaves without resolved taxonomy are below it.

use crate::error::{Result, TaxError};
use crate::lineage;
use crate::model::{Node, NodeIndex, TaxTree};
use crate::newick::writer::MONO_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Value of `ntype` for nodes holding their whole taxon.
const COINCIDE: &str = "Coincide";

/// Serialized form of one node and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonNode {
    /// Label and counts payload
    pub name: String,
    /// `"true"` for nodes without resolved leaves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unclassified: Option<String>,
    /// [COINCIDE] when the node holds its whole taxon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ntype: Option<String>,
    /// Branch length with five decimals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    /// Children in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<JsonNode>,
}

impl JsonNode {
    /// Builds the JSON form of the subtree below `index`.
    pub fn from_tree(tree: &TaxTree, index: NodeIndex) -> Self {
        let node = &tree[index];
        let coincide = node.nleaf == node.tax_size || (node.nleaf == 0 && node.nxleaf == node.tax_size);
        Self {
            name: name_payload(node),
            unclassified: node.unclassified.then(|| "true".to_string()),
            ntype: coincide.then(|| COINCIDE.to_string()),
            length: node.branch_length.map(|l| format!("{:.5}", l)),
            children: node
                .children()
                .iter()
                .map(|&child| Self::from_tree(tree, child))
                .collect(),
        }
    }

    /// Adds this subtree to `tree`, returning the index of its top node.
    ///
    /// # Errors
    /// Returns [TaxError::InvalidTree] if a name payload or length is malformed.
    pub fn add_to_tree(&self, tree: &mut TaxTree) -> Result<NodeIndex> {
        let length = match &self.length {
            Some(text) => Some(text.trim().parse::<f64>().map_err(|_| {
                TaxError::InvalidTree(format!("invalid length {:?}", text))
            })?),
            None => None,
        };

        let payload = parse_name_payload(&self.name)?;
        let index = tree.add_node(String::new(), length);
        for child in &self.children {
            let child_index = child.add_to_tree(tree)?;
            tree.attach_child(index, child_index);
        }

        let node = &mut tree[index];
        node.mono_prefix = payload.mono_prefix;
        node.nleaf = payload.nleaf;
        node.nxleaf = payload.nxleaf;
        node.tax_size = payload.tax_size;
        node.tax_level = lineage::num_ranks(&payload.label);
        node.unclassified = self.unclassified.as_deref() == Some("true") || payload.nleaf == 0;
        if node.is_leaf() {
            node.name = lineage::last_name_no_rank(&payload.label).to_string();
            if !payload.label.contains(lineage::TAG_OPEN) {
                return Ok(index);
            }
            node.lineage = payload.label.clone();
        }
        node.label = payload.label;
        Ok(index)
    }
}

/// `label{nleaf[/tax_size][+nxleaf]}`
fn name_payload(node: &Node) -> String {
    let label = if node.is_leaf() && node.label.is_empty() {
        node.name.clone()
    } else if node.label.is_empty() {
        String::new()
    } else {
        let (head, tail) = node.label.split_at(node.mono_prefix.min(node.label.len()));
        format!("{head}{MONO_SEPARATOR}{tail}")
    };

    let mut payload = format!("{}{{{}", label, node.nleaf);
    if node.nleaf > 0 && node.nleaf < node.tax_size {
        payload.push_str(&format!("/{}", node.tax_size));
    }
    if node.nxleaf != 0 {
        payload.push_str(&format!("+{}", node.nxleaf));
    }
    payload.push('}');
    payload
}

struct NamePayload {
    label: String,
    mono_prefix: usize,
    nleaf: usize,
    nxleaf: usize,
    tax_size: usize,
}

fn parse_name_payload(name: &str) -> Result<NamePayload> {
    let invalid = || TaxError::InvalidTree(format!("invalid node name {:?}", name));
    let parse = |text: &str| text.trim().parse::<usize>().map_err(|_| invalid());

    let (marked, counts) = match name.rfind('{') {
        Some(open) => {
            let counts = name[open + 1..].strip_suffix('}').ok_or_else(invalid)?;
            (&name[..open], Some(counts))
        }
        None => (name, None),
    };

    let (label, mono_prefix) = match marked.find(MONO_SEPARATOR) {
        Some(pos) => (format!("{}{}", &marked[..pos], &marked[pos + 1..]), pos),
        None => (marked.to_string(), 0),
    };

    let Some(counts) = counts else {
        return Ok(NamePayload { label, mono_prefix, nleaf: 0, nxleaf: 0, tax_size: 0 });
    };
    let (classified, nxleaf) = match counts.split_once('+') {
        Some((classified, unclassified)) => (classified, parse(unclassified)?),
        None => (counts, 0),
    };
    let (nleaf, tax_size) = match classified.split_once('/') {
        Some((nleaf, size)) => (parse(nleaf)?, parse(size)?),
        None => {
            let nleaf = parse(classified)?;
            (nleaf, nleaf)
        }
    };

    Ok(NamePayload { label, mono_prefix, nleaf, nxleaf, tax_size })
}

// ============================================================================
// QUICK API (pub)
// ============================================================================
/// Serializes a tree to a JSON string.
pub fn to_json(tree: &TaxTree) -> Result<String> {
    Ok(serde_json::to_string(&JsonNode::from_tree(tree, tree.root_index()))?)
}

/// Parses a tree from a JSON string written by [to_json].
pub fn from_json(json: &str) -> Result<TaxTree> {
    let top: JsonNode = serde_json::from_str(json)?;
    let mut tree = TaxTree::new();
    let root = top.add_to_tree(&mut tree)?;
    tree.set_root(root);
    Ok(tree)
}

/// Writes a tree as JSON to `path`.
pub fn write_json_file<P: AsRef<Path>>(path: P, tree: &TaxTree) -> Result<()> {
    fs::write(path, to_json(tree)?)?;
    Ok(())
}

/// Reads a tree from a JSON file written by [write_json_file].
pub fn read_json_file<P: AsRef<Path>>(path: P) -> Result<TaxTree> {
    from_json(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_payload() {
        let payload = parse_name_payload("<D>X|<K>Y{2/5+1}").unwrap();
        assert_eq!(payload.label, "<D>X<K>Y");
        assert_eq!(payload.mono_prefix, 4);
        assert_eq!((payload.nleaf, payload.tax_size, payload.nxleaf), (2, 5, 1));

        let payload = parse_name_payload("|<D>X{3}").unwrap();
        assert_eq!((payload.nleaf, payload.tax_size, payload.nxleaf), (3, 3, 0));
        assert_eq!(payload.mono_prefix, 0);

        assert!(parse_name_payload("<D>X{3").is_err());
        assert!(parse_name_payload("<D>X{a}").is_err());
    }
}
