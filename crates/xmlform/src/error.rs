//! Error types for xmlform

use std::fmt;
use thiserror::Error;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub const fn empty() -> Self {
        Self::at(Pos::new(0, 0, 0))
    }
}

/// Coarse failure category.
///
/// Every category degrades to "keep the last known good state"; none of them
/// is fatal to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    /// Input text is not well-formed XML
    ParseFailure,
    /// The edited document no longer has a root element
    StructureLost,
    /// An editor command was rejected
    Edit,
}

/// Error kind for detailed categorization
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("invalid token")]
    InvalidToken,
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedTag { expected: String, found: String },
    #[error("duplicate attribute: {name}")]
    DuplicateAttribute { name: String },
    #[error("invalid entity: &{entity};")]
    InvalidEntity { entity: String },
    #[error("invalid utf-8")]
    InvalidUtf8,
    #[error("mixed text and element content in <{tag}>")]
    MixedContent { tag: String },
    #[error("document has no root element")]
    MissingRoot,
    #[error("max depth exceeded: {max}")]
    MaxDepthExceeded { max: u16 },
    #[error("max size exceeded: {max}")]
    MaxSizeExceeded { max: usize },
    #[error("document structure lost: no root element to save")]
    StructureLost,
    #[error("unknown node: {id}")]
    UnknownNode { id: usize },
    #[error("node {id} is not editable this way")]
    NotEditable { id: usize },
    #[error("'{value}' is not one of the permitted values")]
    InvalidChoice { value: String },
    #[error("row {row} out of range")]
    RowOutOfRange { row: usize },
    #[error("column {column} out of range")]
    ColumnOutOfRange { column: usize },
    #[error("node {id} is not being edited")]
    NotEditing { id: usize },
}

impl ErrorKind {
    pub const fn category(&self) -> Category {
        match self {
            Self::StructureLost => Category::StructureLost,
            Self::UnknownNode { .. }
            | Self::NotEditable { .. }
            | Self::InvalidChoice { .. }
            | Self::RowOutOfRange { .. }
            | Self::ColumnOutOfRange { .. }
            | Self::NotEditing { .. } => Category::Edit,
            _ => Category::ParseFailure,
        }
    }
}

/// Main error type for xmlform
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Error without a meaningful source position
    pub fn bare(kind: ErrorKind) -> Self {
        Self::new(kind, Span::empty())
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::at(pos))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span == Span::empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "error at {}: {}", self.span.start, self.message)
        }
    }
}

/// Result type alias for xmlform
pub type Result<T> = std::result::Result<T, Error>;
