//! Content and structure classifiers

pub mod content;
pub mod node;

pub use content::{classify, classify_with_threshold, ContentKind, PARAGRAPH_THRESHOLD};
pub use node::{
    classify_node, classify_node_with_depth, collection_shape, NodeClass, TableShape, SECTION_DEPTH,
};
