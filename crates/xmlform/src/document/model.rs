//! Annotated, editable document tree
//!
//! Every editable unit keeps the tag (and for attributes, the name) it came
//! from. The reverse pass reads nothing else, so labels, roles and hints are
//! free to change without affecting what gets saved.

use std::fmt;

pub use crate::classify::TableShape;

use crate::classify::{classify, classify_with_threshold, ContentKind, PARAGRAPH_THRESHOLD};
use crate::schema::FieldKind;

/// Position of a node in pre-order, stable for the life of a document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Presentation role of a node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Role {
    Title,
    Section,
    Subsection,
    /// Grouping without a heading
    Container,
    Field,
    CollectionTable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeField {
    pub name: String,
    pub value: String,
}

impl AttributeField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnotatedNode {
    pub id: NodeId,
    /// Tag of the originating element
    pub source_tag: String,
    pub role: Role,
    pub label: String,
    pub attributes: Vec<AttributeField>,
    pub content: Content,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Content {
    Group {
        children: Vec<AnnotatedNode>,
        /// Text that sat between the children in the source
        mixed_text: Option<String>,
    },
    Field(FieldValue),
    Table(Table),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldValue {
    pub raw_value: String,
    pub editor: Editor,
    /// Schema documentation of the element
    pub documentation: Option<String>,
}

impl FieldValue {
    pub fn content_kind(&self) -> ContentKind {
        classify(&self.raw_value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Editor {
    /// Free text; `hint` picks the input widget
    Text { hint: ContentKind, schema_kind: FieldKind },
    /// Constrained to `options`, whose first entry is the unspecified choice
    Select {
        options: Vec<EnumOption>,
        /// Source value outside the enumeration, not written back
        rejected: Option<String>,
    },
}

impl Editor {
    pub fn text(schema_kind: FieldKind, value: &str) -> Self {
        Self::text_with_threshold(schema_kind, value, PARAGRAPH_THRESHOLD)
    }

    pub fn text_with_threshold(schema_kind: FieldKind, value: &str, threshold: usize) -> Self {
        Self::Text {
            hint: text_hint_with_threshold(schema_kind, value, threshold),
            schema_kind,
        }
    }

    pub fn permits(&self, value: &str) -> bool {
        match self {
            Self::Text { .. } => true,
            Self::Select { options, .. } => options.iter().any(|option| option.value == value),
        }
    }

    /// Refresh derived state after the value changed
    pub(crate) fn refresh(&mut self, value: &str, threshold: usize) {
        match self {
            Self::Text { hint, schema_kind } => {
                *hint = text_hint_with_threshold(*schema_kind, value, threshold);
            }
            Self::Select { rejected, .. } => *rejected = None,
        }
    }
}

/// Hint for a free-text editor: the schema's date and number kinds win
/// over what the text looks like
pub fn text_hint(schema_kind: FieldKind, value: &str) -> ContentKind {
    text_hint_with_threshold(schema_kind, value, PARAGRAPH_THRESHOLD)
}

pub fn text_hint_with_threshold(schema_kind: FieldKind, value: &str, threshold: usize) -> ContentKind {
    match schema_kind {
        FieldKind::Date => ContentKind::Date,
        FieldKind::Number => ContentKind::Number,
        FieldKind::Enum | FieldKind::String => classify_with_threshold(value, threshold),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumOption {
    /// Empty for the unspecified choice
    pub value: String,
    pub doc: Option<String>,
}

impl EnumOption {
    pub fn unspecified() -> Self {
        Self {
            value: String::new(),
            doc: None,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        self.value.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    /// Tag shared by every item
    pub item_tag: String,
    pub shape: TableShape,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Empty row matching the column layout
    pub fn blank_row(&self) -> Row {
        Row {
            attributes: Vec::new(),
            cells: self
                .columns
                .iter()
                .map(|column| Cell {
                    source_tag: column.source_tag.clone(),
                    raw_value: String::new(),
                    present: self.shape == TableShape::Leaf,
                    rejected: None,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    pub source_tag: String,
    pub label: String,
    /// Enumeration choices when the schema constrains the column
    pub options: Option<Vec<EnumOption>>,
}

impl Column {
    pub fn permits(&self, value: &str) -> bool {
        self.options
            .as_ref()
            .map_or(true, |options| options.iter().any(|o| o.value == value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    /// Attributes of the item element
    pub attributes: Vec<AttributeField>,
    pub cells: Vec<Cell>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub source_tag: String,
    pub raw_value: String,
    /// Whether the item had this element; absent cells are not written back
    pub present: bool,
    pub rejected: Option<String>,
}

impl Cell {
    pub fn content_kind(&self) -> ContentKind {
        classify(&self.raw_value)
    }
}

impl AnnotatedNode {
    pub fn is_editable_field(&self) -> bool {
        matches!(self.content, Content::Field(_))
    }

    pub fn children(&self) -> &[Self] {
        match &self.content {
            Content::Group { children, .. } => children,
            Content::Field(_) | Content::Table(_) => &[],
        }
    }

    pub fn field(&self) -> Option<&FieldValue> {
        match &self.content {
            Content::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn table(&self) -> Option<&Table> {
        match &self.content {
            Content::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn find(&self, id: NodeId) -> Option<&Self> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Self> {
        if self.id == id {
            return Some(self);
        }
        match &mut self.content {
            Content::Group { children, .. } => {
                children.iter_mut().find_map(|child| child.find_mut(id))
            }
            Content::Field(_) | Content::Table(_) => None,
        }
    }

    /// Detach the descendant `id`; `false` when it is not below this node
    pub fn remove_descendant(&mut self, id: NodeId) -> bool {
        let Content::Group { children, .. } = &mut self.content else {
            return false;
        };
        if let Some(index) = children.iter().position(|child| child.id == id) {
            children.remove(index);
            return true;
        }
        children.iter_mut().any(|child| child.remove_descendant(id))
    }

    /// Pre-order traversal of this subtree
    pub fn walk(&self) -> Vec<&Self> {
        let mut nodes = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            nodes.push(node);
            stack.extend(node.children().iter().rev());
        }
        nodes
    }
}

/// Result of a forward pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    /// `None` for an invalid source or after the title was removed
    pub root: Option<AnnotatedNode>,
    /// Message for the user, set on placeholders
    pub notice: Option<String>,
}

impl Document {
    pub fn new(root: AnnotatedNode) -> Self {
        Self {
            root: Some(root),
            notice: None,
        }
    }

    /// Stand-in for a source that could not be parsed
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            root: None,
            notice: Some(message.into()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.root.is_none()
    }

    pub fn find(&self, id: NodeId) -> Option<&AnnotatedNode> {
        self.root.as_ref().and_then(|root| root.find(id))
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut AnnotatedNode> {
        self.root.as_mut().and_then(|root| root.find_mut(id))
    }

    pub fn nodes(&self) -> Vec<&AnnotatedNode> {
        self.root.as_ref().map(AnnotatedNode::walk).unwrap_or_default()
    }

    /// First node generated from an element with this tag
    pub fn find_by_tag(&self, tag: &str) -> Option<&AnnotatedNode> {
        self.nodes().into_iter().find(|node| node.source_tag == tag)
    }
}
