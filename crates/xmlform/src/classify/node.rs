//! Structural classification of XML elements

use crate::xml::{Body, XmlNode};

/// Deepest level rendered with a heading
pub const SECTION_DEPTH: usize = 2;

/// How an element is presented in the document view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NodeClass {
    /// Text only, no element children
    LeafField,
    /// Every element child shares one tag
    HomogeneousCollection,
    /// Heterogeneous children at a heading level
    Section,
    /// Anything else, including the document root and empty elements
    PlainContainer,
}

/// Classify `node` found at `depth` (the root is depth 0)
pub fn classify_node(node: &XmlNode, depth: usize) -> NodeClass {
    classify_node_with_depth(node, depth, SECTION_DEPTH)
}

/// [`classify_node`] with a custom deepest heading level
pub fn classify_node_with_depth(node: &XmlNode, depth: usize, section_depth: usize) -> NodeClass {
    let children = node.children();
    if children.is_empty() {
        return if node.text().is_some_and(|text| !text.is_empty()) {
            NodeClass::LeafField
        } else {
            NodeClass::PlainContainer
        };
    }
    if is_homogeneous(children) {
        NodeClass::HomogeneousCollection
    } else if (1..=section_depth).contains(&depth) {
        NodeClass::Section
    } else {
        NodeClass::PlainContainer
    }
}

/// Non-empty and every element carries the same tag
pub fn is_homogeneous(children: &[XmlNode]) -> bool {
    match children.split_first() {
        Some((first, rest)) => rest.iter().all(|child| child.tag == first.tag),
        None => false,
    }
}

/// The element has no element children (text or empty)
pub fn is_leaf(node: &XmlNode) -> bool {
    !node.has_children()
}

/// How the items of a collection map to table rows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TableShape {
    /// Each item holds leaf children, one per column
    Record,
    /// Each item is itself a leaf; the single column is the item
    Leaf,
}

/// Table shape of collection items, `None` when they do not fit in rows.
///
/// Record items may not carry text of their own or repeat a child tag, and
/// their children may not carry attributes: a row holds one bare value per
/// column.
pub fn collection_shape(items: &[XmlNode]) -> Option<TableShape> {
    if items.is_empty() {
        return None;
    }
    if items.iter().all(is_leaf) {
        return Some(TableShape::Leaf);
    }
    items
        .iter()
        .all(is_record)
        .then_some(TableShape::Record)
}

fn is_record(item: &XmlNode) -> bool {
    if !matches!(item.body, Body::Empty | Body::Children(_)) {
        return false;
    }
    let children = item.children();
    children.iter().all(|child| is_leaf(child) && child.attributes.is_empty())
        && children
            .iter()
            .enumerate()
            .all(|(i, child)| !children.iter().take(i).any(|prev| prev.tag == child.tag))
}
