//! XML data model

use indexmap::IndexMap;

/// Content of an element
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Body {
    #[default]
    Empty,
    /// Trimmed, non-empty text
    Text(String),
    /// Element children only
    Children(Vec<XmlNode>),
    /// Text interleaved with element children; the text fragments are joined
    Mixed(String, Vec<XmlNode>),
}

/// One XML element
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XmlNode {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub body: Body,
}

impl XmlNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            body: Body::Empty,
        }
    }

    /// Leaf element; empty text collapses to [`Body::Empty`]
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self::new(tag);
        node.set_text(text);
        node
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Self) -> Self {
        self.push_child(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        for child in children {
            self.push_child(child);
        }
        self
    }

    pub fn push_child(&mut self, child: Self) {
        self.body = match std::mem::take(&mut self.body) {
            Body::Empty | Body::Text(_) => Body::Children(vec![child]),
            Body::Children(mut children) => {
                children.push(child);
                Body::Children(children)
            }
            Body::Mixed(text, mut children) => {
                children.push(child);
                Body::Mixed(text, children)
            }
        };
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.body = if text.trim().is_empty() {
            Body::Empty
        } else {
            Body::Text(text.trim().to_string())
        };
    }

    /// Element children; empty for leaves
    pub fn children(&self) -> &[Self] {
        match &self.body {
            Body::Children(children) | Body::Mixed(_, children) => children,
            Body::Empty | Body::Text(_) => &[],
        }
    }

    /// Direct text, present only when the element has no element children
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Text dropped from the element view when children are present
    pub fn mixed_text(&self) -> Option<&str> {
        match &self.body {
            Body::Mixed(text, _) => Some(text),
            _ => None,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    /// First child with the given tag
    pub fn child(&self, tag: &str) -> Option<&Self> {
        self.children().iter().find(|child| child.tag == tag)
    }

    /// Number of elements in this subtree, including `self`
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(Self::count).sum::<usize>()
    }
}
