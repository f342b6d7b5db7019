//! Load / edit / save cycle with "keep last known good state" semantics

use tracing::{debug, warn};

use crate::document::{to_document_with_options, to_xml, Document, TranscodeOptions};
use crate::editor::{Command, EditorState};
use crate::error::Result;
use crate::schema::SchemaIndex;
use crate::xml::{self, Config, XmlNode};

const NOTHING_LOADED: &str = "No document loaded";

/// One editing session over a document and its schema.
///
/// The session owns the last saved XML tree. The editable document is always
/// derived from it, so a failed save or a discard can rebuild from there.
#[derive(Clone, Debug)]
pub struct Session {
    schema: SchemaIndex,
    options: TranscodeOptions,
    config: Config,
    last_saved: Option<XmlNode>,
    editor: EditorState,
}

impl Session {
    /// Session with a schema; unparsable schema text gives an empty index
    pub fn new(schema_text: &str) -> Self {
        Self::with_schema(SchemaIndex::build(schema_text))
    }

    pub fn with_schema(schema: SchemaIndex) -> Self {
        let options = TranscodeOptions::default();
        Self {
            schema,
            options,
            config: Config::default(),
            last_saved: None,
            editor: EditorState::new(Document::invalid(NOTHING_LOADED))
                .with_paragraph_threshold(options.paragraph_threshold),
        }
    }

    pub fn with_options(mut self, options: TranscodeOptions) -> Self {
        self.options = options;
        self.rebuild();
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Parse and transcode `xml_text`. On failure the previous document and
    /// XML are kept and the parse error is returned.
    pub fn load(&mut self, xml_text: &str) -> Result<&Document> {
        let root = crate::parse_with_config(xml_text, self.config)?;
        debug!(elements = root.count(), "document loaded");
        self.last_saved = Some(root);
        self.rebuild();
        Ok(self.editor.document())
    }

    pub fn document(&self) -> &Document {
        self.editor.document()
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn schema(&self) -> &SchemaIndex {
        &self.schema
    }

    pub fn apply(&mut self, command: Command) -> Result<()> {
        self.editor.apply(command)
    }

    /// Reverse-transcode the edited document. On success the output becomes
    /// the new last saved XML; on `StructureLost` the previous XML is kept.
    pub fn save(&mut self) -> Result<String> {
        let root = match to_xml(self.editor.document()) {
            Ok(root) => root,
            Err(err) => {
                warn!(%err, "save rejected; keeping the previous XML");
                return Err(err);
            }
        };
        let content = xml::to_string(&root);
        self.last_saved = Some(root);
        self.rebuild();
        Ok(content)
    }

    /// Drop unsaved edits
    pub fn discard(&mut self) {
        self.rebuild();
    }

    /// Swap the schema, keeping unsaved edits when they still form a document
    pub fn replace_schema(&mut self, schema_text: &str) {
        self.schema = SchemaIndex::build(schema_text);
        let current = to_xml(self.editor.document()).ok();
        let source = current.as_ref().or(self.last_saved.as_ref());
        let document = match source {
            Some(root) => to_document_with_options(root, &self.schema, &self.options),
            None => Document::invalid(NOTHING_LOADED),
        };
        debug!(fields = self.schema.len(), "schema replaced");
        self.editor = self.fresh_editor(document);
    }

    pub fn last_saved(&self) -> Option<&XmlNode> {
        self.last_saved.as_ref()
    }

    pub fn last_saved_xml(&self) -> Option<String> {
        self.last_saved.as_ref().map(xml::to_string)
    }

    fn rebuild(&mut self) {
        let document = match &self.last_saved {
            Some(root) => to_document_with_options(root, &self.schema, &self.options),
            None => Document::invalid(NOTHING_LOADED),
        };
        self.editor = self.fresh_editor(document);
    }

    fn fresh_editor(&self, document: Document) -> EditorState {
        EditorState::new(document).with_paragraph_threshold(self.options.paragraph_threshold)
    }
}
