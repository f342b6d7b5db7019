//! Pretty-printing XML writer

use crate::xml::model::{Body, XmlNode};

pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Serialize a tree as a standalone document with the default layout
pub fn to_string(root: &XmlNode) -> String {
    Writer::default().document(root)
}

/// Indenting XML writer
#[derive(Clone, Debug)]
pub struct Writer {
    indent: usize,
    declaration: bool,
}

impl Default for Writer {
    fn default() -> Self {
        Self {
            indent: 2,
            declaration: true,
        }
    }
}

impl Writer {
    pub const fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub const fn without_declaration(mut self) -> Self {
        self.declaration = false;
        self
    }

    pub fn document(&self, root: &XmlNode) -> String {
        let mut output = String::new();
        if self.declaration {
            output.push_str(DECLARATION);
            output.push('\n');
        }
        self.element(root, 0, &mut output);
        output
    }

    fn element(&self, node: &XmlNode, level: usize, output: &mut String) {
        let pad = " ".repeat(self.indent * level);
        output.push_str(&pad);
        output.push('<');
        output.push_str(&node.tag);
        for (name, value) in &node.attributes {
            output.push(' ');
            output.push_str(name);
            output.push_str("=\"");
            output.push_str(&escape_attribute(value));
            output.push('"');
        }

        match &node.body {
            Body::Empty => output.push_str("/>\n"),
            Body::Text(text) => {
                output.push('>');
                output.push_str(&escape_text(text));
                self.close(&node.tag, output);
            }
            Body::Children(children) => {
                output.push_str(">\n");
                for child in children {
                    self.element(child, level + 1, output);
                }
                output.push_str(&pad);
                self.close(&node.tag, output);
            }
            Body::Mixed(text, children) => {
                output.push_str(">\n");
                output.push_str(&" ".repeat(self.indent * (level + 1)));
                output.push_str(&escape_text(text));
                output.push('\n');
                for child in children {
                    self.element(child, level + 1, output);
                }
                output.push_str(&pad);
                self.close(&node.tag, output);
            }
        }
    }

    fn close(&self, tag: &str, output: &mut String) {
        output.push_str("</");
        output.push_str(tag);
        output.push_str(">\n");
    }
}

pub fn escape_attribute(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn escape_text(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_document() {
        let root = XmlNode::new("order")
            .with_attribute("id", "7 \"rush\"")
            .with_child(XmlNode::leaf("note", "a < b & c"))
            .with_child(XmlNode::new("empty"));

        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<order id=\"7 &quot;rush&quot;\">\n\
\x20 <note>a &lt; b &amp; c</note>\n\
\x20 <empty/>\n\
</order>\n";
        assert_eq!(to_string(&root), expected);
    }

    #[test]
    fn test_custom_indent_without_declaration() {
        let root = XmlNode::new("a").with_child(XmlNode::new("b").with_child(XmlNode::leaf("c", "1")));
        let output = Writer::default()
            .with_indent(4)
            .without_declaration()
            .document(&root);
        assert_eq!(output, "<a>\n    <b>\n        <c>1</c>\n    </b>\n</a>\n");
    }

    #[test]
    fn test_mixed_text_precedes_children() {
        let root = XmlNode {
            body: Body::Mixed("hello".into(), vec![XmlNode::leaf("b", "x")]),
            ..XmlNode::new("p")
        };
        let output = Writer::default().without_declaration().document(&root);
        assert_eq!(output, "<p>\n  hello\n  <b>x</b>\n</p>\n");
    }
}
