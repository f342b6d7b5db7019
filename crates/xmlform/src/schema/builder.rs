//! Builds a [`SchemaIndex`] from XSD-like schema text

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::schema::comments::{self, Owner};
use crate::schema::model::{FieldDescriptor, FieldKind, TypeRegistry};
use crate::schema::SchemaIndex;
use crate::xml::{Config, Parser, XmlNode};

/// Build the index; any failure, including nesting past the parser's depth
/// limit, yields an empty index
pub fn build(source: &str) -> SchemaIndex {
    let root = match Parser::with_config(source.as_bytes(), Config::default()).parse() {
        Ok(root) => root,
        Err(err) => {
            warn!(%err, "schema could not be parsed; every field falls back to string");
            return SchemaIndex::default();
        }
    };

    let mut builder = Builder {
        source,
        registry: TypeRegistry::default(),
        complex_types: HashSet::new(),
        index: SchemaIndex::default(),
    };
    builder.collect_types(&root);
    builder.collect_elements(&root);

    debug!(
        fields = builder.index.len(),
        types = builder.registry.len(),
        "schema index built"
    );
    builder.index.types = builder.registry;
    builder.index
}

struct Builder<'s> {
    source: &'s str,
    registry: TypeRegistry,
    complex_types: HashSet<String>,
    index: SchemaIndex,
}

impl Builder<'_> {
    /// Register every named simple type and remember complex type names
    fn collect_types(&mut self, node: &XmlNode) {
        match local_name(&node.tag) {
            "simpleType" => {
                if let Some(name) = node.attributes.get("name") {
                    let mut descriptor = simple_type(node);
                    self.recover_docs(&mut descriptor, Owner::SimpleType, name);
                    self.registry.register(name.clone(), descriptor);
                }
            }
            "complexType" => {
                if let Some(name) = node.attributes.get("name") {
                    self.complex_types.insert(name.clone());
                }
            }
            _ => {}
        }
        for child in node.children() {
            self.collect_types(child);
        }
    }

    fn collect_elements(&mut self, node: &XmlNode) {
        if local_name(&node.tag) == "element" {
            if let Some(name) = node.attributes.get("name") {
                if let Some(mut descriptor) = self.element_descriptor(node) {
                    descriptor.documentation = documentation(node);
                    if self.index.fields.contains_key(name) {
                        debug!(element = %name, "element declared twice; keeping the first");
                    } else {
                        self.index.fields.insert(name.clone(), descriptor);
                    }
                }
            }
        }
        for child in node.children() {
            self.collect_elements(child);
        }
    }

    /// `None` for elements with complex content
    fn element_descriptor(&self, element: &XmlNode) -> Option<FieldDescriptor> {
        if let Some(type_name) = element.attributes.get("type") {
            if let Some(descriptor) = self.registry.resolve(type_name) {
                return Some(descriptor.clone());
            }
            let local = local_name(type_name);
            if let Some(descriptor) = self.registry.resolve(local) {
                return Some(descriptor.clone());
            }
            if self.complex_types.contains(type_name) || self.complex_types.contains(local) {
                return None;
            }
            return Some(FieldDescriptor::of_kind(builtin_kind(local)));
        }

        for child in element.children() {
            match local_name(&child.tag) {
                "simpleType" => {
                    let mut descriptor = simple_type(child);
                    if let Some(name) = element.attributes.get("name") {
                        self.recover_docs(&mut descriptor, Owner::Element, name);
                    }
                    return Some(descriptor);
                }
                "complexType" => return None,
                _ => {}
            }
        }
        Some(FieldDescriptor::default())
    }

    /// Fill missing enumeration docs from comments around the declarations
    /// of the type owned by `name`
    fn recover_docs(&self, descriptor: &mut FieldDescriptor, owner: Owner, name: &str) {
        if descriptor.enumeration_values.is_empty() {
            return;
        }
        let scope = comments::scope(self.source, owner, name);
        for value in &descriptor.enumeration_values {
            if descriptor.enumeration_docs.contains_key(value) {
                continue;
            }
            if let Some(doc) = comments::recover(scope, value) {
                descriptor.enumeration_docs.insert(value.clone(), doc);
            }
        }
    }
}

/// Descriptor of a `simpleType` element
fn simple_type(node: &XmlNode) -> FieldDescriptor {
    let Some(restriction) = node
        .children()
        .iter()
        .find(|child| local_name(&child.tag) == "restriction")
    else {
        return FieldDescriptor::default();
    };

    let enumerations: Vec<&XmlNode> = restriction
        .children()
        .iter()
        .filter(|child| local_name(&child.tag) == "enumeration")
        .collect();
    if enumerations.is_empty() {
        let base = restriction.attributes.get("base").map_or("", String::as_str);
        return FieldDescriptor::of_kind(builtin_kind(local_name(base)));
    }

    let mut descriptor = FieldDescriptor::of_kind(FieldKind::Enum);
    for enumeration in enumerations {
        let Some(value) = enumeration.attributes.get("value") else {
            continue;
        };
        descriptor.push_value(value.clone());
        if let Some(doc) = documentation(enumeration) {
            descriptor.enumeration_docs.entry(value.clone()).or_insert(doc);
        }
    }
    descriptor
}

/// Text of `annotation/documentation` directly under `node`
fn documentation(node: &XmlNode) -> Option<String> {
    node.children()
        .iter()
        .filter(|child| local_name(&child.tag) == "annotation")
        .flat_map(XmlNode::children)
        .filter(|child| local_name(&child.tag) == "documentation")
        .find_map(XmlNode::text)
        .map(str::to_string)
}

/// Field kind of a built-in XSD type
pub fn builtin_kind(local: &str) -> FieldKind {
    match local {
        "date" | "dateTime" => FieldKind::Date,
        "decimal" | "integer" | "int" | "long" | "short" | "byte" | "double" | "float"
        | "nonNegativeInteger" | "positiveInteger" | "nonPositiveInteger"
        | "negativeInteger" | "unsignedLong" | "unsignedInt" | "unsignedShort"
        | "unsignedByte" => FieldKind::Number,
        _ => FieldKind::String,
    }
}

/// Tag or type name without its namespace prefix
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}
