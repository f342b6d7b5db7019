//! Editor state driven by explicit commands
//!
//! Every change a user makes to a document goes through [`EditorState::apply`].
//! A rejected command leaves the document untouched.

use tracing::trace;

use crate::classify::PARAGRAPH_THRESHOLD;
use crate::document::model::{AnnotatedNode, AttributeField, Content, Document, NodeId, Table};
use crate::error::{Error, ErrorKind, Result};

/// One user edit
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "command", rename_all = "snake_case"))]
pub enum Command {
    BeginEditField { id: NodeId },
    CommitField { id: NodeId, value: String },
    CancelField { id: NodeId },
    /// Set an attribute, adding it when the node does not have it yet
    CommitAttribute { node: NodeId, name: String, value: String },
    CommitCell {
        table: NodeId,
        row: usize,
        column: usize,
        value: String,
    },
    AddRow { table: NodeId },
    RemoveRow { table: NodeId, row: usize },
    /// Remove a node and its subtree; removing the title empties the document
    RemoveNode { id: NodeId },
}

#[derive(Clone, Debug)]
pub struct EditorState {
    document: Document,
    editing: Option<NodeId>,
    paragraph_threshold: usize,
    dirty: bool,
}

impl EditorState {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            editing: None,
            paragraph_threshold: PARAGRAPH_THRESHOLD,
            dirty: false,
        }
    }

    pub const fn with_paragraph_threshold(mut self, threshold: usize) -> Self {
        self.paragraph_threshold = threshold;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Field currently open for editing
    pub fn editing(&self) -> Option<NodeId> {
        self.editing
    }

    /// Whether any command changed the document
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn apply(&mut self, command: Command) -> Result<()> {
        trace!(?command, "apply");
        match command {
            Command::BeginEditField { id } => {
                self.field_node(id)?;
                self.editing = Some(id);
            }
            Command::CommitField { id, value } => self.commit_field(id, value)?,
            Command::CancelField { id } => {
                if self.editing != Some(id) {
                    return Err(Error::bare(ErrorKind::NotEditing { id: id.0 }));
                }
                self.editing = None;
            }
            Command::CommitAttribute { node, name, value } => {
                let node = self.node_mut(node)?;
                match node.attributes.iter_mut().find(|a| a.name == name) {
                    Some(attribute) => attribute.value = value,
                    None => node.attributes.push(AttributeField { name, value }),
                }
                self.dirty = true;
            }
            Command::CommitCell {
                table,
                row,
                column,
                value,
            } => self.commit_cell(table, row, column, value)?,
            Command::AddRow { table } => {
                let table = self.table_mut(table)?;
                let row = table.blank_row();
                table.rows.push(row);
                self.dirty = true;
            }
            Command::RemoveRow { table, row } => {
                let table = self.table_mut(table)?;
                if row >= table.rows.len() {
                    return Err(Error::bare(ErrorKind::RowOutOfRange { row }));
                }
                table.rows.remove(row);
                self.dirty = true;
            }
            Command::RemoveNode { id } => self.remove_node(id)?,
        }
        Ok(())
    }

    fn commit_field(&mut self, id: NodeId, value: String) -> Result<()> {
        let threshold = self.paragraph_threshold;
        let node = self.field_node(id)?;
        let Content::Field(field) = &mut node.content else {
            return Err(not_editable(id));
        };
        if !field.editor.permits(&value) {
            return Err(Error::bare(ErrorKind::InvalidChoice { value }));
        }
        field.editor.refresh(&value, threshold);
        field.raw_value = value;
        if self.editing == Some(id) {
            self.editing = None;
        }
        self.dirty = true;
        Ok(())
    }

    fn commit_cell(
        &mut self,
        table: NodeId,
        row: usize,
        column: usize,
        value: String,
    ) -> Result<()> {
        let table = self.table_mut(table)?;
        let permitted = table
            .columns
            .get(column)
            .ok_or_else(|| Error::bare(ErrorKind::ColumnOutOfRange { column }))?
            .permits(&value);
        let cells = &mut table
            .rows
            .get_mut(row)
            .ok_or_else(|| Error::bare(ErrorKind::RowOutOfRange { row }))?
            .cells;
        let cell = cells
            .get_mut(column)
            .ok_or_else(|| Error::bare(ErrorKind::ColumnOutOfRange { column }))?;
        if !permitted {
            return Err(Error::bare(ErrorKind::InvalidChoice { value }));
        }
        cell.present = cell.present || !value.is_empty();
        cell.raw_value = value;
        cell.rejected = None;
        self.dirty = true;
        Ok(())
    }

    fn remove_node(&mut self, id: NodeId) -> Result<()> {
        let Some(root) = self.document.root.as_mut() else {
            return Err(unknown(id));
        };
        if root.id == id {
            self.document.root = None;
        } else if !root.remove_descendant(id) {
            return Err(unknown(id));
        }
        if self.editing.is_some_and(|editing| self.document.find(editing).is_none()) {
            self.editing = None;
        }
        self.dirty = true;
        Ok(())
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut AnnotatedNode> {
        self.document.find_mut(id).ok_or_else(|| unknown(id))
    }

    fn field_node(&mut self, id: NodeId) -> Result<&mut AnnotatedNode> {
        let node = self.node_mut(id)?;
        if node.is_editable_field() {
            Ok(node)
        } else {
            Err(not_editable(id))
        }
    }

    fn table_mut(&mut self, id: NodeId) -> Result<&mut Table> {
        match &mut self.node_mut(id)?.content {
            Content::Table(table) => Ok(table),
            Content::Field(_) | Content::Group { .. } => Err(not_editable(id)),
        }
    }
}

fn unknown(id: NodeId) -> Error {
    Error::bare(ErrorKind::UnknownNode { id: id.0 })
}

fn not_editable(id: NodeId) -> Error {
    Error::bare(ErrorKind::NotEditable { id: id.0 })
}
