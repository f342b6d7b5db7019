//! XML parser implementation

use indexmap::IndexMap;
use tracing::warn;

use crate::cursor::Cursor;
use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::xml::model::{Body, XmlNode};

/// What to do with elements holding both text and element children
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MixedContent {
    /// Element children win; the text is dropped with a warning
    #[default]
    Collapse,
    /// Keep the text as [`Body::Mixed`]
    Preserve,
    /// Fail the parse
    Reject,
}

/// Configuration for the XML parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
    pub mixed_content: MixedContent,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_size: 10 * 1024 * 1024, // 10 MB default
            mixed_content: MixedContent::Collapse,
        }
    }
}

impl Config {
    pub const fn with_mixed_content(mut self, policy: MixedContent) -> Self {
        self.mixed_content = policy;
        self
    }
}

/// Non-validating XML parser producing an [`XmlNode`] tree
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    depth: u16,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    pub fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            depth: 0,
        }
    }

    /// Parse a whole document and return its root element
    pub fn parse(&mut self) -> Result<XmlNode> {
        let size = self.cursor.remaining().len();
        if self.config.max_size > 0 && size > self.config.max_size {
            return Err(Error::bare(ErrorKind::MaxSizeExceeded {
                max: self.config.max_size,
            }));
        }

        self.skip_misc()?;
        if self.cursor.is_eof() {
            return Err(Error::at(ErrorKind::MissingRoot, self.cursor.position()));
        }
        let root = self.parse_element()?;
        self.skip_misc()?;

        if !self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::InvalidToken, "content after root element"));
        }
        Ok(root)
    }

    /// Skip whitespace, comments, processing instructions and doctype
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?") {
                self.skip_markup(b"?>")?;
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_markup(b"-->")?;
            } else if self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self) -> Result<XmlNode> {
        let open_pos = self.cursor.position();
        self.expect_byte(b'<')?;
        if self.cursor.current() == Some(b'/') {
            return Err(self.error_here(ErrorKind::InvalidToken, "unexpected closing tag"));
        }

        self.depth = self.depth.saturating_add(1);
        if self.config.max_depth > 0 && self.depth > self.config.max_depth {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                open_pos,
            ));
        }

        let tag = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.eat(b"/>") {
            self.depth -= 1;
            return Ok(XmlNode {
                tag,
                attributes,
                body: Body::Empty,
            });
        }
        self.expect_byte(b'>')?;

        let mut text = String::new();
        let mut fragments = Vec::new();
        let mut children = Vec::new();
        loop {
            if self.cursor.eat(b"</") {
                let close_name = self.parse_name()?;
                if close_name != tag {
                    return Err(self.error_here(
                        ErrorKind::MismatchedTag {
                            expected: tag,
                            found: close_name,
                        },
                        "mismatched closing tag",
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                break;
            }

            if self.cursor.starts_with(b"<!--") {
                self.skip_markup(b"-->")?;
                continue;
            }
            if self.cursor.starts_with(b"<?") {
                self.skip_markup(b"?>")?;
                continue;
            }
            if self.cursor.eat(b"<![CDATA[") {
                text.push_str(&self.parse_cdata()?);
                continue;
            }

            if self.cursor.current() == Some(b'<') {
                flush_fragment(&mut text, &mut fragments);
                children.push(self.parse_element()?);
                continue;
            }

            if self.cursor.is_eof() {
                return Err(Error::with_message(
                    ErrorKind::UnexpectedEof,
                    Span::at(self.cursor.position()),
                    format!("unterminated element <{tag}>"),
                ));
            }

            text.push_str(&self.parse_text()?);
        }
        flush_fragment(&mut text, &mut fragments);

        self.depth -= 1;
        let body = self.resolve_body(&tag, fragments, children, open_pos)?;
        Ok(XmlNode {
            tag,
            attributes,
            body,
        })
    }

    fn resolve_body(
        &self,
        tag: &str,
        fragments: Vec<String>,
        children: Vec<XmlNode>,
        open_pos: Pos,
    ) -> Result<Body> {
        if children.is_empty() {
            return Ok(match fragments.join(" ") {
                text if text.is_empty() => Body::Empty,
                text => Body::Text(text),
            });
        }
        if fragments.is_empty() {
            return Ok(Body::Children(children));
        }

        match self.config.mixed_content {
            MixedContent::Collapse => {
                warn!(tag, line = open_pos.line, "dropping text mixed with child elements");
                Ok(Body::Children(children))
            }
            MixedContent::Preserve => Ok(Body::Mixed(fragments.join(" "), children)),
            MixedContent::Reject => Err(Error::at(
                ErrorKind::MixedContent {
                    tag: tag.to_string(),
                },
                open_pos,
            )),
        }
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) => {}
                None => return Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position())),
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(self.error_here(
                    ErrorKind::DuplicateAttribute { name },
                    "duplicate attribute",
                ));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => {
                return Err(
                    self.error_here(ErrorKind::InvalidToken, "expected quoted attribute value")
                )
            }
        };
        let value_pos = self.cursor.position();
        self.cursor.advance();

        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = bytes_to_str(raw, value_pos)?;
                return decode_entities(text, value_pos);
            }
            self.cursor.advance();
        }

        Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()))
    }

    fn parse_text(&mut self) -> Result<String> {
        let text_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = self.cursor.slice_from(start);
        decode_entities(bytes_to_str(raw, text_pos)?, text_pos)
    }

    fn parse_cdata(&mut self) -> Result<String> {
        let cdata_pos = self.cursor.position();
        let start = self.cursor.pos();
        if !self.cursor.skip_past(b"]]>") {
            return Err(Error::at(ErrorKind::UnexpectedEof, cdata_pos));
        }
        let raw = self.cursor.slice_from(start);
        let body = raw.get(..raw.len().saturating_sub(3)).unwrap_or_default();
        Ok(bytes_to_str(body, cdata_pos)?.to_string())
    }

    fn parse_name(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            Some(_) => return Err(Error::at(ErrorKind::InvalidToken, start_pos)),
            None => return Err(Error::at(ErrorKind::UnexpectedEof, start_pos)),
        }
        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        Ok(bytes_to_str(self.cursor.slice_from(start), start_pos)?.to_string())
    }

    fn skip_doctype(&mut self) -> Result<()> {
        let start = self.cursor.position();
        let mut brackets = 0_u32;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match b {
                b'[' => brackets += 1,
                b']' => brackets = brackets.saturating_sub(1),
                b'>' if brackets == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(Error::at(ErrorKind::UnexpectedEof, start))
    }

    fn skip_markup(&mut self, terminator: &[u8]) -> Result<()> {
        let start = self.cursor.position();
        self.cursor.advance_by(2);
        if self.cursor.skip_past(terminator) {
            Ok(())
        } else {
            Err(Error::with_message(
                ErrorKind::UnexpectedEof,
                Span::at(start),
                "unterminated markup",
            ))
        }
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.current() == Some(expected) {
            self.cursor.advance();
            Ok(())
        } else if self.cursor.is_eof() {
            Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()))
        } else {
            Err(self.error_here(
                ErrorKind::InvalidToken,
                &format!("expected '{}'", char::from(expected)),
            ))
        }
    }

    fn error_here(&self, kind: ErrorKind, message: &str) -> Error {
        let pos = self.cursor.position();
        let message = match &kind {
            ErrorKind::InvalidToken => message.to_string(),
            other => other.to_string(),
        };
        Error::with_message(kind, Span::at(pos), message)
    }
}

/// Move trimmed pending text into `fragments`
fn flush_fragment(text: &mut String, fragments: &mut Vec<String>) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        fragments.push(trimmed.to_string());
    }
    text.clear();
}

fn bytes_to_str(bytes: &[u8], pos: Pos) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| Error::at(ErrorKind::InvalidUtf8, pos))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str, pos: Pos) -> Result<String> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        result.push_str(rest.get(..amp).unwrap_or_default());
        let after = rest.get(amp + 1..).unwrap_or_default();
        let Some(semi) = after.find(';') else {
            return Err(Error::at(
                ErrorKind::InvalidEntity {
                    entity: after.chars().take(8).collect(),
                },
                pos,
            ));
        };
        let entity = after.get(..semi).unwrap_or_default();

        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };
        match decoded {
            Some(ch) => result.push(ch),
            None => {
                return Err(Error::at(
                    ErrorKind::InvalidEntity {
                        entity: entity.to_string(),
                    },
                    pos,
                ))
            }
        }
        rest = after.get(semi + 1..).unwrap_or_default();
    }
    result.push_str(rest);

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<XmlNode> {
        Parser::new(input.as_bytes()).parse()
    }

    #[test]
    fn test_parse_simple_element() -> Result<()> {
        let root = parse("<root></root>")?;
        assert_eq!(root.tag, "root");
        assert_eq!(root.body, Body::Empty);
        Ok(())
    }

    #[test]
    fn test_parse_with_attributes_in_order() -> Result<()> {
        let root = parse("<root id=\"1\" name='a &amp; b' z=\"\"></root>")?;
        let names: Vec<&str> = root.attributes.keys().map(String::as_str).collect();
        assert_eq!(names, ["id", "name", "z"]);
        assert_eq!(root.attributes.get("name").map(String::as_str), Some("a & b"));
        Ok(())
    }

    #[test]
    fn test_parse_nested_with_prolog() -> Result<()> {
        let input = "<?xml version=\"1.0\"?>\n<!DOCTYPE root [<!ENTITY x \"y\">]>\n<!-- c -->\n<root>\n  <child> text &lt;3 </child>\n</root>\n<!-- trailing -->";
        let root = parse(input)?;
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.child("child").and_then(XmlNode::text), Some("text <3"));
        Ok(())
    }

    #[test]
    fn test_parse_self_closing() -> Result<()> {
        let root = parse("<root><child /></root>")?;
        assert_eq!(root.child("child").map(|c| &c.body), Some(&Body::Empty));
        Ok(())
    }

    #[test]
    fn test_cdata_and_comments_join_leaf_text() -> Result<()> {
        let root = parse("<note>a<!-- skip --><![CDATA[<b>]]>c</note>")?;
        assert_eq!(root.text(), Some("a<b>c"));
        Ok(())
    }

    #[test]
    fn test_mixed_content_policies() -> Result<()> {
        let input = "<p>hello <b>bold</b> world</p>";

        let collapsed = parse(input)?;
        assert_eq!(collapsed.children().len(), 1);
        assert_eq!(collapsed.mixed_text(), None);

        let config = Config::default().with_mixed_content(MixedContent::Preserve);
        let preserved = Parser::with_config(input.as_bytes(), config).parse()?;
        assert_eq!(preserved.mixed_text(), Some("hello world"));

        let config = Config::default().with_mixed_content(MixedContent::Reject);
        let rejected = Parser::with_config(input.as_bytes(), config).parse();
        assert!(matches!(
            rejected.map_err(|e| e.kind().clone()),
            Err(ErrorKind::MixedContent { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_mismatched_tag() {
        let err = parse("<a><b></a></b>").err();
        assert!(matches!(
            err.as_ref().map(Error::kind),
            Some(ErrorKind::MismatchedTag { .. })
        ));
    }

    #[test]
    fn test_duplicate_attribute() {
        let err = parse("<a x='1' x='2'/>").err();
        assert!(matches!(
            err.as_ref().map(Error::kind),
            Some(ErrorKind::DuplicateAttribute { .. })
        ));
    }

    #[test]
    fn test_invalid_entity() {
        let err = parse("<a>&bogus;</a>").err();
        assert!(matches!(
            err.as_ref().map(Error::kind),
            Some(ErrorKind::InvalidEntity { .. })
        ));
    }

    #[test]
    fn test_numeric_entities() -> Result<()> {
        let root = parse("<a>&#65;&#x42;&#X43;</a>")?;
        assert_eq!(root.text(), Some("ABC"));
        Ok(())
    }

    #[test]
    fn test_empty_and_unterminated_inputs() {
        assert!(matches!(
            parse("   ").map_err(|e| e.kind().clone()),
            Err(ErrorKind::MissingRoot)
        ));
        assert!(matches!(
            parse("<a><b>").map_err(|e| e.kind().clone()),
            Err(ErrorKind::UnexpectedEof)
        ));
        assert!(parse("<a/><b/>").is_err());
    }

    #[test]
    fn test_depth_limit() {
        let config = Config {
            max_depth: 2,
            ..Config::default()
        };
        let result = Parser::with_config(b"<a><b><c/></b></a>", config).parse();
        assert!(matches!(
            result.map_err(|e| e.kind().clone()),
            Err(ErrorKind::MaxDepthExceeded { max: 2 })
        ));
    }

    #[test]
    fn test_size_limit() {
        let config = Config {
            max_size: 4,
            ..Config::default()
        };
        let result = Parser::with_config(b"<abc/>", config).parse();
        assert!(matches!(
            result.map_err(|e| e.kind().clone()),
            Err(ErrorKind::MaxSizeExceeded { max: 4 })
        ));
    }
}
