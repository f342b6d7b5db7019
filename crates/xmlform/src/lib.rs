//! xmlform - bidirectional transcoder between XML and an editable document
//!
//! The forward pass turns an XML tree into a document of titled sections,
//! typed fields and tables; the reverse pass rebuilds the XML from the
//! back-references every editable unit keeps.
//!
//! # Quick Start
//!
//! ```
//! use xmlform::{round_trip, to_document, parse, SchemaIndex};
//! # fn main() -> Result<(), xmlform::Error> {
//! let root = parse("<person><name>Ada</name><email>ada@example.com</email></person>")?;
//! let doc = to_document(&root, &SchemaIndex::empty());
//! assert_eq!(doc.find_by_tag("email").map(|n| n.label.as_str()), Some("Email"));
//!
//! let xml = round_trip("<items><item>1</item><item>2</item></items>", &SchemaIndex::empty())?;
//! assert!(xml.contains("<item>2</item>"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Category, Error, ErrorKind, Pos, Result, Span};

pub mod input;
pub use input::Input;

pub mod cursor;

pub mod xml;
pub use xml::{Body, Config, MixedContent, XmlNode};

pub mod classify;
pub use classify::{classify, classify_node, ContentKind, NodeClass};

pub mod schema;
pub use schema::{FieldDescriptor, FieldKind, SchemaIndex};

pub mod document;
pub use document::{
    render_html, to_document, to_document_with_options, to_xml, to_xml_string, AnnotatedNode,
    ColumnInference, Content, Document, NodeId, Role, TranscodeOptions,
};

pub mod editor;
pub use editor::{Command, EditorState};

pub mod session;
pub use session::Session;

use tracing::debug;

/// Parse XML text, undoing whole-document entity escaping first
pub fn parse(source: &str) -> Result<XmlNode> {
    parse_with_config(source, Config::default())
}

/// [`parse`] with a custom parser configuration
pub fn parse_with_config(source: &str, config: Config) -> Result<XmlNode> {
    parse_input(&Input::from_str(source), config)
}

pub fn parse_input(input: &Input<'_>, config: Config) -> Result<XmlNode> {
    let markup = input.markup();
    let result = xml::Parser::with_config(markup.as_bytes(), config).parse();
    if let Err(err) = &result {
        debug!(file = input.filename().unwrap_or("<input>"), %err, "parse failed");
    }
    result
}

/// Forward transcode from source text. Unparsable input gives the invalid
/// document placeholder carrying the parse error as its notice.
pub fn render_source(source: &str, schema: &SchemaIndex, options: &TranscodeOptions) -> Document {
    match parse(source) {
        Ok(root) => to_document_with_options(&root, schema, options),
        Err(err) => Document::invalid(format!("Invalid document: {err}")),
    }
}

/// Parse, transcode forward and back, and serialize
pub fn round_trip(source: &str, schema: &SchemaIndex) -> Result<String> {
    let root = parse(source)?;
    to_xml_string(&to_document(&root, schema))
}
