//! Newick format writing of annotated trees.

use crate::model::{Node, NodeIndex, TaxTree};
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Marks where the monophyletic tail of a label starts.
pub const MONO_SEPARATOR: char = '|';

/// Style for serializing a tree to Newick format,
/// controlling which name each node gets in the output string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewickStyle {
    /// Monophyletic tail of each consensus label (leaf display name for
    /// leaves without lineage)
    #[default]
    Annotated,
    /// Full consensus label with `|` where the monophyletic tail starts
    Marked,
    /// Leaf display names only, internal nodes keep their support values
    Plain,
}

/// Writes given list of trees to a file in Newick format, one tree per line.
///
/// # Errors
/// Returns an I/O error if writing fails.
pub fn write_newick_file(file: File, trees: &[TaxTree], style: NewickStyle) -> io::Result<()> {
    let mut writer = BufWriter::new(file);
    for tree in trees {
        writer.write_all(to_newick(style, tree).as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Returns the Newick representation of this tree with closing semicolon.
///
/// Branch lengths are written with five decimals; the root's length is
/// omitted. Labels are escaped with [escape_label].
///
/// # Example
/// ```
/// use taxwick::newick::{parse_str, to_newick, NewickStyle};
///
/// let tree = parse_str("(A:1,'B c':2)0.9;").unwrap();
/// assert_eq!(to_newick(NewickStyle::Plain, &tree), "(A:1.00000,'B c':2.00000)0.9;");
/// ```
pub fn to_newick(style: NewickStyle, tree: &TaxTree) -> String {
    /// Characters per node without label: "(,)" and ":0.00000"
    const NODE_CHARS: usize = 12;

    fn build_newick(tree: &TaxTree, newick: &mut String, index: NodeIndex, style: NewickStyle) {
        let node = &tree[index];

        if !node.is_leaf() {
            newick.push('(');
            for (i, &child) in node.children().iter().enumerate() {
                if i > 0 {
                    newick.push(',');
                }
                build_newick(tree, newick, child, style);
            }
            newick.push(')');
        }

        newick.push_str(&escape_label(&node_name(node, style)));

        if let Some(length) = node.branch_length {
            if index != tree.root_index() {
                newick.push_str(&format!(":{:.5}", length));
            }
        }
    }

    if !tree.is_root_set() {
        return String::new();
    }

    let mut newick = String::with_capacity(tree.num_leaves() * 2 * NODE_CHARS);
    build_newick(tree, &mut newick, tree.root_index(), style);
    newick.push(';');
    newick
}

/// Name of a node in the given style.
fn node_name(node: &Node, style: NewickStyle) -> String {
    match style {
        NewickStyle::Plain => {
            if node.is_leaf() {
                node.name.clone()
            } else {
                node.support.map(|s| s.to_string()).unwrap_or_default()
            }
        }
        NewickStyle::Annotated => {
            if node.is_leaf() && node.label.is_empty() {
                node.name.clone()
            } else {
                node.display_label().to_string()
            }
        }
        NewickStyle::Marked => {
            if node.is_leaf() && node.label.is_empty() {
                node.name.clone()
            } else if node.label.is_empty() {
                String::new()
            } else {
                let (head, tail) = node.label.split_at(node.mono_prefix.min(node.label.len()));
                format!("{head}{MONO_SEPARATOR}{tail}")
            }
        }
    }
}

/// Escapes a label for safe use in Newick strings.
///
/// Labels containing delimiters or quotes are wrapped in single quotes,
/// with internal single quotes doubled. Lineage tags (`<`, `>`) and the
/// monophyly separator need no quoting.
///
/// # Examples
/// ```
/// use taxwick::newick::escape_label;
/// assert_eq!(escape_label("Pukeko"), "Pukeko");
/// assert_eq!(escape_label("<D>Bacteria|<P>Firmicutes"), "<D>Bacteria|<P>Firmicutes");
/// assert_eq!(escape_label("Australasian Swamphen"), "'Australasian Swamphen'");
/// assert_eq!(escape_label("Baillon's Crake"), "'Baillon''s Crake'");
/// ```
pub fn escape_label(label: &str) -> String {
    let needs_quotes = label.chars().any(|c| {
        matches!(
            c,
            ' ' | ',' | ';' | '\t' | '\n' | '\r' | '(' | ')' | ':' | '[' | ']' | '\'' | '"'
        )
    });
    if needs_quotes {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}
