//! Forward transcode: XML tree → annotated document

use tracing::{debug, instrument, warn};

use crate::classify::node::{is_homogeneous, is_leaf};
use crate::classify::{classify_node_with_depth, collection_shape, NodeClass, TableShape};
use crate::document::label::humanize;
use crate::document::model::{
    AnnotatedNode, AttributeField, Cell, Column, Content, Document, Editor, EnumOption,
    FieldValue, NodeId, Role, Row, Table,
};
use crate::document::{ColumnInference, TranscodeOptions};
use crate::schema::{FieldDescriptor, FieldKind, SchemaIndex};
use crate::xml::XmlNode;

/// Transcode with default options
pub fn to_document(root: &XmlNode, schema: &SchemaIndex) -> Document {
    to_document_with_options(root, schema, &TranscodeOptions::default())
}

#[instrument(skip_all, fields(root = %root.tag))]
pub fn to_document_with_options(
    root: &XmlNode,
    schema: &SchemaIndex,
    options: &TranscodeOptions,
) -> Document {
    let mut transcoder = Transcoder {
        schema,
        options,
        next_id: 0,
        fields: 0,
        tables: 0,
    };
    let title = transcoder.title(root);
    debug!(
        nodes = transcoder.next_id,
        fields = transcoder.fields,
        tables = transcoder.tables,
        "forward transcode complete"
    );
    Document::new(title)
}

struct Transcoder<'a> {
    schema: &'a SchemaIndex,
    options: &'a TranscodeOptions,
    next_id: usize,
    fields: usize,
    tables: usize,
}

impl Transcoder<'_> {
    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// The root is always the title, whatever its shape
    fn title(&mut self, root: &XmlNode) -> AnnotatedNode {
        let id = self.allocate();
        let content = if is_leaf(root) {
            Content::Field(self.field(root))
        } else if let Some(table) = self.table(root) {
            Content::Table(table)
        } else {
            self.group(root, 0)
        };
        annotated(id, root, Role::Title, content)
    }

    fn node(&mut self, node: &XmlNode, depth: usize) -> AnnotatedNode {
        let id = self.allocate();
        if is_leaf(node) {
            let content = Content::Field(self.field(node));
            return annotated(id, node, Role::Field, content);
        }

        let section_depth = self.options.section_depth();
        let role = match classify_node_with_depth(node, depth, section_depth) {
            NodeClass::HomogeneousCollection => {
                if let Some(table) = self.table(node) {
                    return annotated(id, node, Role::CollectionTable, Content::Table(table));
                }
                heading_role(depth, section_depth)
            }
            NodeClass::Section => heading_role(depth, section_depth),
            NodeClass::LeafField | NodeClass::PlainContainer => Role::Container,
        };
        let content = self.group(node, depth);
        annotated(id, node, role, content)
    }

    fn group(&mut self, node: &XmlNode, depth: usize) -> Content {
        let children = node
            .children()
            .iter()
            .map(|child| self.node(child, depth + 1))
            .collect();
        Content::Group {
            children,
            mixed_text: node.mixed_text().map(str::to_string),
        }
    }

    fn field(&mut self, node: &XmlNode) -> FieldValue {
        self.fields += 1;
        let raw = node.text().unwrap_or_default();
        let descriptor = self.schema.get(&node.tag);
        let documentation = descriptor.and_then(|d| d.documentation.clone());

        let Some(descriptor) = descriptor.filter(|d| d.is_enum()) else {
            let kind = descriptor.map_or(FieldKind::String, |d| d.kind);
            return FieldValue {
                raw_value: raw.to_string(),
                editor: Editor::text_with_threshold(kind, raw, self.options.paragraph_threshold),
                documentation,
            };
        };

        let (raw_value, rejected) = constrain(&node.tag, descriptor, raw);
        FieldValue {
            raw_value,
            editor: Editor::Select {
                options: enum_options(descriptor),
                rejected,
            },
            documentation,
        }
    }

    /// Table for a flat homogeneous collection; `None` falls back to a group
    fn table(&mut self, node: &XmlNode) -> Option<Table> {
        let items = node.children();
        if !is_homogeneous(items) || node.mixed_text().is_some() {
            return None;
        }
        let shape = collection_shape(items)?;
        let item_tag = items.first()?.tag.clone();

        let column_tags = match shape {
            TableShape::Leaf => vec![item_tag.clone()],
            TableShape::Record => self.column_tags(items)?,
        };
        let columns: Vec<Column> = column_tags
            .iter()
            .map(|tag| Column {
                source_tag: tag.clone(),
                label: humanize(tag),
                options: self.schema.get(tag).filter(|d| d.is_enum()).map(enum_options),
            })
            .collect();

        let mut dropped = 0;
        let rows = items
            .iter()
            .map(|item| {
                let row = self.row(item, shape, &column_tags);
                if shape == TableShape::Record {
                    dropped += item.children().len() - row.cells.iter().filter(|c| c.present).count();
                }
                row
            })
            .collect();
        if dropped > 0 {
            warn!(
                collection = %node.tag,
                dropped,
                "fields missing from the first item are not shown"
            );
        }

        self.tables += 1;
        Some(Table {
            item_tag,
            shape,
            columns,
            rows,
        })
    }

    /// Column tags per the configured inference; `None` when an item orders
    /// its children differently from the columns
    fn column_tags(&self, items: &[XmlNode]) -> Option<Vec<String>> {
        let mut columns: Vec<String> = Vec::new();
        match self.options.column_inference {
            ColumnInference::FirstRow => {
                if let Some(first) = items.first() {
                    columns.extend(first.children().iter().map(|child| child.tag.clone()));
                }
            }
            ColumnInference::Union => {
                for item in items {
                    merge_columns(&mut columns, item);
                }
            }
        }

        let ordered = items.iter().all(|item| {
            let positions: Vec<usize> = item
                .children()
                .iter()
                .filter_map(|child| columns.iter().position(|tag| *tag == child.tag))
                .collect();
            positions.windows(2).all(|pair| pair.first() < pair.get(1))
        });
        if !ordered {
            debug!("collection items disagree on field order; rendering as a group");
            return None;
        }
        Some(columns)
    }

    fn row(&mut self, item: &XmlNode, shape: TableShape, columns: &[String]) -> Row {
        let cells = match shape {
            TableShape::Leaf => {
                let raw = item.text().unwrap_or_default();
                vec![self.cell(&item.tag, raw, true)]
            }
            TableShape::Record => columns
                .iter()
                .map(|tag| match item.child(tag) {
                    Some(child) => self.cell(tag, child.text().unwrap_or_default(), true),
                    None => self.cell(tag, "", false),
                })
                .collect(),
        };
        Row {
            attributes: attribute_fields(item),
            cells,
        }
    }

    fn cell(&mut self, tag: &str, raw: &str, present: bool) -> Cell {
        let (raw_value, rejected) = match self.schema.get(tag).filter(|d| d.is_enum()) {
            Some(descriptor) => constrain(tag, descriptor, raw),
            None => (raw.to_string(), None),
        };
        Cell {
            source_tag: tag.to_string(),
            raw_value,
            present,
            rejected,
        }
    }
}

/// Insert an item's child tags into the column list, keeping each new tag
/// right after the known tag that precedes it in the item
fn merge_columns(columns: &mut Vec<String>, item: &XmlNode) {
    let children = item.children();
    let mut previous: Option<usize> = None;
    for (i, child) in children.iter().enumerate() {
        if let Some(position) = columns.iter().position(|tag| *tag == child.tag) {
            previous = Some(position);
            continue;
        }
        let known_later = children
            .iter()
            .skip(i + 1)
            .any(|later| columns.contains(&later.tag));
        let at = match previous {
            Some(position) => position + 1,
            None if known_later => 0,
            None => columns.len(),
        };
        columns.insert(at, child.tag.clone());
        previous = Some(at);
    }
}

fn heading_role(depth: usize, section_depth: usize) -> Role {
    match depth {
        1 if section_depth >= 1 => Role::Section,
        d if (2..=section_depth).contains(&d) => Role::Subsection,
        _ => Role::Container,
    }
}

fn annotated(id: NodeId, node: &XmlNode, role: Role, content: Content) -> AnnotatedNode {
    AnnotatedNode {
        id,
        source_tag: node.tag.clone(),
        role,
        label: humanize(&node.tag),
        attributes: attribute_fields(node),
        content,
    }
}

fn attribute_fields(node: &XmlNode) -> Vec<AttributeField> {
    node.attributes
        .iter()
        .map(|(name, value)| AttributeField::new(name.as_str(), value.as_str()))
        .collect()
}

/// Unspecified choice followed by the declared values
fn enum_options(descriptor: &FieldDescriptor) -> Vec<EnumOption> {
    std::iter::once(EnumOption::unspecified())
        .chain(
            descriptor
                .enumeration_values
                .iter()
                .filter(|value| !value.is_empty())
                .map(|value| EnumOption {
                    value: value.clone(),
                    doc: descriptor.doc_for(value).map(str::to_string),
                }),
        )
        .collect()
}

/// Enumerated value to store, plus the source value when it had to be cleared
fn constrain(tag: &str, descriptor: &FieldDescriptor, raw: &str) -> (String, Option<String>) {
    if descriptor.permits(raw) {
        (raw.to_string(), None)
    } else {
        warn!(tag, value = raw, "value outside the enumeration; left unspecified");
        (String::new(), Some(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> XmlNode {
        XmlNode::new("person")
            .with_child(XmlNode::leaf("name", "Ada"))
            .with_child(XmlNode::leaf("email", "ada@example.com"))
    }

    fn items() -> XmlNode {
        XmlNode::new("items")
            .with_child(
                XmlNode::new("item")
                    .with_child(XmlNode::leaf("a", "1"))
                    .with_child(XmlNode::leaf("b", "2")),
            )
            .with_child(
                XmlNode::new("item")
                    .with_child(XmlNode::leaf("a", "3"))
                    .with_child(XmlNode::leaf("b", "4")),
            )
    }

    fn cell_values(table: &Table) -> Vec<Vec<&str>> {
        table
            .rows
            .iter()
            .map(|row| row.cells.iter().map(|c| c.raw_value.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_root_is_title_with_attributes() {
        let root = XmlNode::new("catalogEntry")
            .with_attribute("version", "2")
            .with_child(person())
            .with_child(XmlNode::leaf("note", "hi"));
        let doc = to_document(&root, &SchemaIndex::empty());
        let title = doc.root.as_ref();
        assert_eq!(title.map(|n| n.role), Some(Role::Title));
        assert_eq!(title.map(|n| n.label.as_str()), Some("Catalog Entry"));
        assert_eq!(
            title.map(|n| n.attributes.clone()),
            Some(vec![AttributeField::new("version", "2")])
        );
        let roles: Vec<Role> = doc.nodes().iter().map(|n| n.role).collect();
        assert_eq!(
            roles,
            [Role::Title, Role::Section, Role::Field, Role::Field, Role::Field]
        );
    }

    #[test]
    fn test_ids_are_pre_order() {
        let root = XmlNode::new("root").with_child(person()).with_child(XmlNode::leaf("x", "1"));
        let doc = to_document(&root, &SchemaIndex::empty());
        let ids: Vec<(usize, &str)> = doc
            .nodes()
            .iter()
            .map(|n| (n.id.0, n.source_tag.as_str()))
            .collect();
        assert_eq!(ids, [(0, "root"), (1, "person"), (2, "name"), (3, "email"), (4, "x")]);
    }

    #[test]
    fn test_section_roles_follow_depth() {
        let deep = XmlNode::new("d3")
            .with_child(XmlNode::leaf("x", "1"))
            .with_child(XmlNode::leaf("y", "2"));
        let d2 = XmlNode::new("d2").with_child(deep).with_child(XmlNode::leaf("z", "3"));
        let d1 = XmlNode::new("d1").with_child(d2).with_child(XmlNode::leaf("w", "4"));
        let root = XmlNode::new("root").with_child(d1).with_child(XmlNode::leaf("v", "5"));
        let doc = to_document(&root, &SchemaIndex::empty());
        let role = |tag: &str| doc.find_by_tag(tag).map(|n| n.role);
        assert_eq!(role("d1"), Some(Role::Section));
        assert_eq!(role("d2"), Some(Role::Subsection));
        assert_eq!(role("d3"), Some(Role::Container));

        let options = TranscodeOptions::default().with_section_depth(3);
        let doc = to_document_with_options(&root, &SchemaIndex::empty(), &options);
        assert_eq!(doc.find_by_tag("d3").map(|n| n.role), Some(Role::Subsection));
    }

    #[test]
    fn test_collection_becomes_table() {
        let root = XmlNode::new("order").with_child(items()).with_child(XmlNode::leaf("id", "7"));
        let doc = to_document(&root, &SchemaIndex::empty());
        let node = doc.find_by_tag("items");
        assert_eq!(node.map(|n| n.role), Some(Role::CollectionTable));
        let table = node.and_then(AnnotatedNode::table);
        assert_eq!(table.map(|t| t.item_tag.as_str()), Some("item"));
        assert_eq!(
            table.map(|t| t.columns.iter().map(|c| c.source_tag.as_str()).collect::<Vec<_>>()),
            Some(vec!["a", "b"])
        );
        assert_eq!(table.map(cell_values), Some(vec![vec!["1", "2"], vec!["3", "4"]]));
    }

    #[test]
    fn test_root_collection_is_table() {
        let doc = to_document(&items(), &SchemaIndex::empty());
        let root = doc.root.as_ref();
        assert_eq!(root.map(|n| n.role), Some(Role::Title));
        assert_eq!(root.and_then(AnnotatedNode::table).map(|t| t.rows.len()), Some(2));
    }

    #[test]
    fn test_leaf_items_single_column() {
        let tags = XmlNode::new("tags")
            .with_child(XmlNode::leaf("tag", "red").with_attribute("weight", "1"))
            .with_child(XmlNode::leaf("tag", "blue"));
        let root = XmlNode::new("root").with_child(tags).with_child(XmlNode::leaf("n", "1"));
        let doc = to_document(&root, &SchemaIndex::empty());
        let table = doc.find_by_tag("tags").and_then(AnnotatedNode::table);
        assert_eq!(table.map(|t| t.shape), Some(TableShape::Leaf));
        assert_eq!(table.map(|t| t.columns.len()), Some(1));
        assert_eq!(table.map(cell_values), Some(vec![vec!["red"], vec!["blue"]]));
        assert_eq!(
            table.and_then(|t| t.rows.first()).map(|r| r.attributes.clone()),
            Some(vec![AttributeField::new("weight", "1")])
        );
    }

    #[test]
    fn test_first_row_inference_drops_later_fields() {
        let items = XmlNode::new("items")
            .with_child(XmlNode::new("item").with_child(XmlNode::leaf("a", "1")))
            .with_child(
                XmlNode::new("item")
                    .with_child(XmlNode::leaf("a", "2"))
                    .with_child(XmlNode::leaf("extra", "x")),
            );
        let doc = to_document(&items, &SchemaIndex::empty());
        let table = doc.root.as_ref().and_then(AnnotatedNode::table);
        assert_eq!(table.map(|t| t.columns.len()), Some(1));

        let options = TranscodeOptions::default().with_column_inference(ColumnInference::Union);
        let doc = to_document_with_options(&items, &SchemaIndex::empty(), &options);
        let table = doc.root.as_ref().and_then(AnnotatedNode::table);
        assert_eq!(table.map(|t| t.columns.len()), Some(2));
        let presence: Option<Vec<bool>> = table
            .and_then(|t| t.rows.first())
            .map(|r| r.cells.iter().map(|c| c.present).collect());
        assert_eq!(presence, Some(vec![true, false]));
    }

    #[test]
    fn test_union_keeps_relative_order() {
        let mut columns = vec!["a".to_string(), "c".to_string()];
        let item = XmlNode::new("item")
            .with_child(XmlNode::leaf("b", "1"))
            .with_child(XmlNode::leaf("c", "2"))
            .with_child(XmlNode::leaf("d", "3"));
        merge_columns(&mut columns, &item);
        assert_eq!(columns, ["b", "a", "c", "d"]);
    }

    #[test]
    fn test_conflicting_order_falls_back_to_group() {
        let items = XmlNode::new("items")
            .with_child(
                XmlNode::new("item")
                    .with_child(XmlNode::leaf("a", "1"))
                    .with_child(XmlNode::leaf("b", "2")),
            )
            .with_child(
                XmlNode::new("item")
                    .with_child(XmlNode::leaf("b", "3"))
                    .with_child(XmlNode::leaf("a", "4")),
            );
        let root = XmlNode::new("root").with_child(items).with_child(XmlNode::leaf("n", "1"));
        let doc = to_document(&root, &SchemaIndex::empty());
        let node = doc.find_by_tag("items");
        assert_eq!(node.map(|n| n.role), Some(Role::Section));
        assert_eq!(node.map(|n| n.children().len()), Some(2));
    }

    #[test]
    fn test_enum_field_select() {
        let schema = SchemaIndex::empty().with_field(
            "status",
            FieldDescriptor::enumeration(["active", "retired"]).with_doc("active", "in use"),
        );
        let root = XmlNode::new("root")
            .with_child(XmlNode::leaf("status", "active"))
            .with_child(XmlNode::leaf("name", "x"));
        let doc = to_document(&root, &schema);
        let field = doc.find_by_tag("status").and_then(AnnotatedNode::field);
        let Some(FieldValue {
            raw_value,
            editor: Editor::Select { options, rejected },
            ..
        }) = field
        else {
            panic!("expected a select, got {field:?}");
        };
        assert_eq!(raw_value, "active");
        assert_eq!(rejected, &None);
        let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, ["", "active", "retired"]);
        assert_eq!(options.get(1).and_then(|o| o.doc.as_deref()), Some("in use"));
    }

    #[test]
    fn test_enum_value_outside_enumeration_is_cleared() {
        let schema =
            SchemaIndex::empty().with_field("status", FieldDescriptor::enumeration(["on", "off"]));
        let root = XmlNode::new("root")
            .with_child(XmlNode::leaf("status", "maybe"))
            .with_child(XmlNode::leaf("name", "x"));
        let doc = to_document(&root, &schema);
        let field = doc.find_by_tag("status").and_then(AnnotatedNode::field);
        assert_eq!(field.map(|f| f.raw_value.as_str()), Some(""));
        assert!(matches!(
            field.map(|f| &f.editor),
            Some(Editor::Select { rejected: Some(value), .. }) if value == "maybe"
        ));
    }

    #[test]
    fn test_schema_kind_drives_text_hint() {
        let schema = SchemaIndex::empty()
            .with_field("released", FieldDescriptor::of_kind(FieldKind::Date))
            .with_field("sku", FieldDescriptor::of_kind(FieldKind::Number));
        let root = XmlNode::new("root")
            .with_child(XmlNode::leaf("released", "soon"))
            .with_child(XmlNode::leaf("sku", "12"))
            .with_child(XmlNode::leaf("contact", "ada@example.com"));
        let doc = to_document(&root, &schema);
        let hint = |tag: &str| match doc.find_by_tag(tag).and_then(AnnotatedNode::field) {
            Some(FieldValue {
                editor: Editor::Text { hint, .. },
                ..
            }) => Some(*hint),
            _ => None,
        };
        assert_eq!(hint("released"), Some(crate::classify::ContentKind::Date));
        assert_eq!(hint("sku"), Some(crate::classify::ContentKind::Number));
        assert_eq!(hint("contact"), Some(crate::classify::ContentKind::Email));
    }

    #[test]
    fn test_empty_element_is_field() {
        let root = XmlNode::new("root")
            .with_child(XmlNode::new("middleName"))
            .with_child(XmlNode::leaf("name", "x"));
        let doc = to_document(&root, &SchemaIndex::empty());
        let node = doc.find_by_tag("middleName");
        assert_eq!(node.map(|n| n.role), Some(Role::Field));
        assert_eq!(node.and_then(AnnotatedNode::field).map(|f| f.raw_value.as_str()), Some(""));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let root = XmlNode::new("root").with_child(items()).with_child(person());
        let before = root.clone();
        let _ = to_document(&root, &SchemaIndex::empty());
        assert_eq!(root, before);
    }
}
