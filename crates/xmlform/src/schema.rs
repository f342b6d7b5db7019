//! Schema field index: tag name → field descriptor
//!
//! Built once per loaded schema and read-only afterwards. Only a flat view of
//! the schema is extracted; content models and occurrence constraints are
//! ignored.

pub mod builder;
pub mod comments;
pub mod model;

use indexmap::IndexMap;
use tracing::trace;

pub use builder::{builtin_kind, local_name};
pub use model::{FieldDescriptor, FieldKind, NamedType, TypeId, TypeRegistry};

/// Lookup from element tag to its declared field
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaIndex {
    pub(crate) fields: IndexMap<String, FieldDescriptor>,
    pub(crate) types: TypeRegistry,
}

impl SchemaIndex {
    /// Build from schema text; unparsable text yields an empty index
    pub fn build(source: &str) -> Self {
        builder::build(source)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Add or replace the descriptor of `tag`
    pub fn insert(&mut self, tag: impl Into<String>, descriptor: FieldDescriptor) {
        self.fields.insert(tag.into(), descriptor);
    }

    pub fn with_field(mut self, tag: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.insert(tag, descriptor);
        self
    }

    /// Descriptor for a tag, falling back to its unprefixed name
    pub fn get(&self, tag: &str) -> Option<&FieldDescriptor> {
        let found = self
            .fields
            .get(tag)
            .or_else(|| self.fields.get(local_name(tag)));
        if found.is_none() {
            trace!(tag, "no schema descriptor");
        }
        found
    }

    /// Declared kind; tags the schema does not know are strings
    pub fn kind(&self, tag: &str) -> FieldKind {
        self.get(tag).map_or(FieldKind::String, |d| d.kind)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(tag, d)| (tag.as_str(), d))
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }
}
