//! HTML fragment for a document
//!
//! Every editable unit carries `data-tag` and `data-value`, every attribute
//! `data-attr-name` and `data-attr-value`, and every node its `data-node` id,
//! so edits made in the page can be mapped back onto the document.

use crate::classify::ContentKind;
use crate::document::model::{
    AnnotatedNode, AttributeField, Content, Document, Editor, FieldValue, Role, Table,
};
use crate::xml::writer::{escape_attribute, escape_text};

pub fn render_html(doc: &Document) -> String {
    let mut renderer = Renderer::default();
    match &doc.root {
        Some(root) => renderer.node(root),
        None => {
            let notice = doc.notice.as_deref().unwrap_or("Invalid document");
            renderer.push("<div class=\"xf-invalid\" role=\"alert\">");
            renderer.text(notice);
            renderer.push("</div>\n");
        }
    }
    renderer.out
}

#[derive(Default)]
struct Renderer {
    out: String,
}

impl Renderer {
    fn push(&mut self, markup: &str) {
        self.out.push_str(markup);
    }

    fn text(&mut self, text: &str) {
        self.out.push_str(&escape_text(text));
    }

    fn attr(&mut self, name: &str, value: &str) {
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        self.out.push_str(&escape_attribute(value));
        self.out.push('"');
    }

    fn node(&mut self, node: &AnnotatedNode) {
        let (element, class, heading) = match node.role {
            Role::Title => ("article", "xf-document", Some("h1")),
            Role::Section => ("section", "xf-section", Some("h2")),
            Role::Subsection => ("section", "xf-subsection", Some("h3")),
            Role::Container => ("div", "xf-container", None),
            Role::Field => ("div", "xf-field", None),
            Role::CollectionTable => ("div", "xf-collection", Some("h4")),
        };

        self.push("<");
        self.push(element);
        self.attr("class", class);
        self.attr("data-node", &node.id.to_string());
        self.attr("data-tag", &node.source_tag);
        self.push(">\n");

        if let Some(heading) = heading {
            self.push("<");
            self.push(heading);
            self.push(">");
            self.text(&node.label);
            self.push("</");
            self.push(heading);
            self.push(">\n");
        }
        self.attributes(&node.attributes);

        match &node.content {
            Content::Field(field) => self.field(node, field),
            Content::Group {
                children,
                mixed_text,
            } => {
                if let Some(text) = mixed_text {
                    self.push("<p class=\"xf-mixed\">");
                    self.text(text);
                    self.push("</p>\n");
                }
                for child in children {
                    self.node(child);
                }
            }
            Content::Table(table) => self.table(table),
        }

        self.push("</");
        self.push(element);
        self.push(">\n");
    }

    fn attributes(&mut self, attributes: &[AttributeField]) {
        if attributes.is_empty() {
            return;
        }
        self.push("<dl class=\"xf-attributes\">\n");
        for attribute in attributes {
            self.push("<dt>");
            self.text(&attribute.name);
            self.push("</dt><dd contenteditable=\"true\"");
            self.attr("data-attr-name", &attribute.name);
            self.attr("data-attr-value", &attribute.value);
            self.push(">");
            self.text(&attribute.value);
            self.push("</dd>\n");
        }
        self.push("</dl>\n");
    }

    fn field(&mut self, node: &AnnotatedNode, field: &FieldValue) {
        self.push("<label");
        self.attr("for", &format!("xf-{}", node.id));
        self.push(">");
        self.text(&node.label);
        self.push("</label>\n");

        match &field.editor {
            Editor::Select { options, rejected } => {
                self.push("<select");
                self.attr("id", &format!("xf-{}", node.id));
                self.attr("data-tag", &node.source_tag);
                self.attr("data-value", &field.raw_value);
                if let Some(rejected) = rejected {
                    self.attr("data-rejected", rejected);
                }
                self.push(">\n");
                for option in options {
                    self.push("<option");
                    self.attr("value", &option.value);
                    if let Some(doc) = &option.doc {
                        self.attr("title", doc);
                    }
                    if option.value == field.raw_value {
                        self.push(" selected");
                    }
                    self.push(">");
                    if option.is_unspecified() {
                        self.push("(unspecified)");
                    } else {
                        self.text(&option.value);
                    }
                    self.push("</option>\n");
                }
                self.push("</select>\n");
            }
            Editor::Text { hint, .. } if *hint == ContentKind::Paragraph => {
                self.push("<textarea");
                self.attr("id", &format!("xf-{}", node.id));
                self.attr("data-tag", &node.source_tag);
                self.attr("data-value", &field.raw_value);
                self.push(">");
                self.text(&field.raw_value);
                self.push("</textarea>\n");
            }
            Editor::Text { hint, .. } => {
                self.push("<input");
                self.attr("id", &format!("xf-{}", node.id));
                self.attr("type", hint.input_hint());
                self.attr("data-kind", hint.name());
                self.attr("data-tag", &node.source_tag);
                self.attr("data-value", &field.raw_value);
                self.attr("value", &field.raw_value);
                self.push("/>\n");
            }
        }

        if let Some(doc) = &field.documentation {
            self.push("<small class=\"xf-help\">");
            self.text(doc);
            self.push("</small>\n");
        }
    }

    fn table(&mut self, table: &Table) {
        let with_attributes = table.rows.iter().any(|row| !row.attributes.is_empty());

        self.push("<table class=\"xf-table\"");
        self.attr("data-item-tag", &table.item_tag);
        self.push(">\n<thead><tr>");
        if with_attributes {
            self.push("<th></th>");
        }
        for column in &table.columns {
            self.push("<th");
            self.attr("data-tag", &column.source_tag);
            self.push(">");
            self.text(&column.label);
            self.push("</th>");
        }
        self.push("</tr></thead>\n<tbody>\n");

        for (index, row) in table.rows.iter().enumerate() {
            self.push("<tr");
            self.attr("data-row", &index.to_string());
            self.push(">");
            if with_attributes {
                self.push("<td class=\"xf-row-attributes\">");
                for attribute in &row.attributes {
                    self.push("<span");
                    self.attr("data-attr-name", &attribute.name);
                    self.attr("data-attr-value", &attribute.value);
                    self.push(">");
                    self.text(&attribute.name);
                    self.push("=");
                    self.text(&attribute.value);
                    self.push("</span>");
                }
                self.push("</td>");
            }
            for cell in &row.cells {
                self.push("<td contenteditable=\"true\"");
                self.attr("data-tag", &cell.source_tag);
                self.attr("data-value", &cell.raw_value);
                self.attr("data-kind", cell.content_kind().name());
                if !cell.present {
                    self.attr("data-absent", "true");
                }
                self.push(">");
                self.text(&cell.raw_value);
                self.push("</td>");
            }
            self.push("</tr>\n");
        }
        self.push("</tbody>\n</table>\n");
    }
}
