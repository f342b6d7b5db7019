//! Editable document view of an XML tree and the transcoders between them

pub mod forward;
pub mod label;
pub mod model;
pub mod render;
pub mod reverse;

pub use forward::{to_document, to_document_with_options};
pub use label::humanize;
pub use model::{
    AnnotatedNode, AttributeField, Cell, Column, Content, Document, Editor, EnumOption,
    FieldValue, NodeId, Role, Row, Table, TableShape,
};
pub use render::render_html;
pub use reverse::{to_xml, to_xml_string};

use crate::classify::PARAGRAPH_THRESHOLD;

/// Where collection table columns come from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ColumnInference {
    /// Child tags of the first item only; fields that appear only in later
    /// items are dropped
    #[default]
    FirstRow,
    /// Child tags of every item, in first-seen order
    Union,
}

/// Forward transcode options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TranscodeOptions {
    pub column_inference: ColumnInference,
    /// Deepest level rendered with a heading
    pub section_depth: u8,
    /// Texts longer than this many characters get a paragraph editor
    pub paragraph_threshold: usize,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            column_inference: ColumnInference::FirstRow,
            section_depth: 2,
            paragraph_threshold: PARAGRAPH_THRESHOLD,
        }
    }
}

impl TranscodeOptions {
    pub const fn with_column_inference(mut self, column_inference: ColumnInference) -> Self {
        self.column_inference = column_inference;
        self
    }

    pub const fn with_section_depth(mut self, section_depth: u8) -> Self {
        self.section_depth = section_depth;
        self
    }

    pub const fn with_paragraph_threshold(mut self, threshold: usize) -> Self {
        self.paragraph_threshold = threshold;
        self
    }

    pub(crate) fn section_depth(&self) -> usize {
        usize::from(self.section_depth)
    }
}
