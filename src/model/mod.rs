/// Tree node with lineage, consensus label and annotation counts
pub mod node;
/// Arena tree, traversals and root moves
pub mod tree;

pub use node::Node;
pub use tree::{LinkChange, NodeIndex, TaxTree};
