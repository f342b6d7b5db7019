//! Raw text input handed over by the surrounding shell

use std::borrow::Cow;

/// Entities a caller may have applied when it escaped the whole document
const ESCAPED_ENTITIES: [(&str, &str); 6] = [
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#x27;", "'"),
    ("&#39;", "'"),
    ("&amp;", "&"),
];

/// Input source abstraction
#[derive(Clone, Debug)]
pub struct Input<'a> {
    source: &'a str,
    filename: Option<&'a str>,
}

impl<'a> Input<'a> {
    /// Create from string
    pub const fn from_str(source: &'a str) -> Self {
        Self {
            source,
            filename: None,
        }
    }

    /// Set filename for log messages
    pub const fn with_filename(mut self, filename: &'a str) -> Self {
        self.filename = Some(filename);
        self
    }

    pub const fn filename(&self) -> Option<&str> {
        self.filename
    }

    pub const fn len(&self) -> usize {
        self.source.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Whether the shell handed over an entity-escaped document
    /// (`&lt;root&gt;...` instead of `<root>...`)
    pub fn is_escaped(&self) -> bool {
        self.source.trim_start().starts_with("&lt;")
    }

    /// Text ready for the XML parser.
    ///
    /// Escaped documents are unescaped once; `&amp;` goes last so that
    /// `&amp;lt;` decodes to the entity text `&lt;`, which the parser then
    /// resolves inside the element.
    pub fn markup(&self) -> Cow<'a, str> {
        if !self.is_escaped() {
            return Cow::Borrowed(self.source);
        }
        let mut text = self.source.to_string();
        for (entity, replacement) in ESCAPED_ENTITIES {
            text = text.replace(entity, replacement);
        }
        Cow::Owned(text)
    }
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(s: &'a str) -> Self {
        Self::from_str(s)
    }
}
