//! Reverse transcode: annotated document → XML tree
//!
//! Only back-references are read: source tags, attribute names and values,
//! raw field values and table cells. Labels, roles and hints never influence
//! the output.

use tracing::debug;

use crate::document::model::{AnnotatedNode, Content, Document, Table, TableShape};
use crate::error::{Error, ErrorKind, Result, Span};
use crate::xml::{self, Body, XmlNode};

/// Rebuild the XML tree; fails with `StructureLost` when the root is gone
pub fn to_xml(doc: &Document) -> Result<XmlNode> {
    let root = doc.root.as_ref().ok_or_else(|| {
        Error::with_message(
            ErrorKind::StructureLost,
            Span::empty(),
            "document has no root element",
        )
    })?;
    let element = element(root)?;
    debug!(elements = element.count(), "reverse transcode complete");
    Ok(element)
}

/// [`to_xml`] serialized with the declaration and two-space indentation
pub fn to_xml_string(doc: &Document) -> Result<String> {
    to_xml(doc).map(|root| xml::to_string(&root))
}

fn element(node: &AnnotatedNode) -> Result<XmlNode> {
    let tag = node.source_tag.trim();
    if tag.is_empty() {
        return Err(Error::with_message(
            ErrorKind::StructureLost,
            Span::empty(),
            format!("node {} has no source tag", node.id),
        ));
    }

    let mut out = XmlNode::new(tag);
    for attribute in node.attributes.iter().filter(|a| !a.name.is_empty()) {
        out.attributes
            .insert(attribute.name.clone(), attribute.value.clone());
    }

    match &node.content {
        Content::Field(field) => {
            out.set_text(permitted(&field.raw_value, field.editor.permits(&field.raw_value)));
        }
        Content::Group {
            children,
            mixed_text,
        } => {
            let children = children.iter().map(element).collect::<Result<Vec<_>>>()?;
            out.body = group_body(children, mixed_text.as_deref());
        }
        Content::Table(table) => out.body = group_body(items(table), None),
    }
    Ok(out)
}

/// Value to write for an enumerated unit; outside the enumeration means unspecified
fn permitted(value: &str, allowed: bool) -> &str {
    if allowed {
        value
    } else {
        debug!(value, "value outside the enumeration written as unspecified");
        ""
    }
}

fn group_body(children: Vec<XmlNode>, mixed_text: Option<&str>) -> Body {
    match mixed_text.map(str::trim).filter(|text| !text.is_empty()) {
        _ if children.is_empty() => Body::Empty,
        Some(text) => Body::Mixed(text.to_string(), children),
        None => Body::Children(children),
    }
}

/// One item element per row; record rows only emit present cells
fn items(table: &Table) -> Vec<XmlNode> {
    table
        .rows
        .iter()
        .map(|row| {
            let mut item = XmlNode::new(table.item_tag.as_str());
            for attribute in row.attributes.iter().filter(|a| !a.name.is_empty()) {
                item.attributes
                    .insert(attribute.name.clone(), attribute.value.clone());
            }
            let value = |index: usize, raw: &str| {
                let allowed = table.columns.get(index).map_or(true, |column| column.permits(raw));
                permitted(raw, allowed).to_string()
            };
            match table.shape {
                TableShape::Leaf => {
                    if let Some(cell) = row.cells.first() {
                        item.set_text(value(0, &cell.raw_value));
                    }
                }
                TableShape::Record => {
                    for (index, cell) in row.cells.iter().enumerate().filter(|(_, cell)| cell.present) {
                        let text = value(index, &cell.raw_value);
                        item.push_child(XmlNode::leaf(cell.source_tag.as_str(), text));
                    }
                }
            }
            item
        })
        .collect()
}
