//! Field descriptors and the named type registry

use std::fmt;

use indexmap::IndexMap;

/// Declared value kind of a schema field
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldKind {
    Enum,
    #[default]
    String,
    Number,
    Date,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enum => "enum",
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
        })
    }
}

/// Schema metadata for one tag name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDescriptor {
    pub kind: FieldKind,
    /// Permitted values in declaration order, unique; empty unless `Enum`
    pub enumeration_values: Vec<String>,
    /// Per-value documentation, possibly partial
    pub enumeration_docs: IndexMap<String, String>,
    /// Documentation of the element itself
    pub documentation: Option<String>,
}

impl FieldDescriptor {
    pub fn of_kind(kind: FieldKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Enumerated field; duplicate values are dropped
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut descriptor = Self::of_kind(FieldKind::Enum);
        for value in values {
            descriptor.push_value(value.into());
        }
        descriptor
    }

    pub fn with_doc(mut self, value: impl Into<String>, doc: impl Into<String>) -> Self {
        self.enumeration_docs.insert(value.into(), doc.into());
        self
    }

    pub(crate) fn push_value(&mut self, value: String) {
        if !self.enumeration_values.contains(&value) {
            self.enumeration_values.push(value);
        }
    }

    pub fn is_enum(&self) -> bool {
        self.kind == FieldKind::Enum
    }

    /// Whether `value` may be stored in this field. The empty string is the
    /// "unspecified" choice and always permitted.
    pub fn permits(&self, value: &str) -> bool {
        !self.is_enum() || value.is_empty() || self.enumeration_values.iter().any(|v| v == value)
    }

    pub fn doc_for(&self, value: &str) -> Option<&str> {
        self.enumeration_docs.get(value).map(String::as_str)
    }
}

/// Stable identifier of a named schema type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

impl TypeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A named simple type declared in the schema
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedType {
    pub name: String,
    pub descriptor: FieldDescriptor,
}

/// Named types addressed by [`TypeId`].
///
/// Names are matched exactly as declared; `Status` and `status` are two
/// different types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    types: Vec<NamedType>,
    by_name: IndexMap<String, TypeId>,
}

impl TypeRegistry {
    /// Register a type; a second declaration under the same name keeps the
    /// first one and returns its id
    pub fn register(&mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> TypeId {
        let name = name.into();
        if let Some(id) = self.by_name.get(&name) {
            return *id;
        }
        let id = TypeId(self.types.len());
        self.by_name.insert(name.clone(), id);
        self.types.push(NamedType { name, descriptor });
        id
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: TypeId) -> Option<&NamedType> {
        self.types.get(id.0)
    }

    pub fn resolve(&self, name: &str) -> Option<&FieldDescriptor> {
        self.lookup(name)
            .and_then(|id| self.get(id))
            .map(|named| &named.descriptor)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &NamedType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(index, named)| (TypeId(index), named))
    }
}
