//! Stanza node type for the FunXMPP binary protocol.
//!
//! A stanza is a tree of tagged nodes. Each node carries ordered attributes and
//! either child nodes, a raw byte payload, or nothing.

use std::fmt;

use indexmap::IndexMap;

/// Attributes of a node, in wire order.
///
/// Comparing two maps ignores insertion order.
pub type Attrs = IndexMap<String, String>;

/// Node represents one element of a binary stanza.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// The tag name of the element
    pub tag: String,
    /// The attributes of the element
    pub attrs: Attrs,
    /// The content inside the element (nothing, children, or bytes)
    pub content: NodeContent,
}

/// Content of a node
#[derive(Debug, Clone, Default)]
pub enum NodeContent {
    #[default]
    None,
    /// Child nodes
    Children(Vec<Node>),
    /// Binary data
    Bytes(Vec<u8>),
}

impl NodeContent {
    /// True when there is nothing to put on the wire: no content or an
    /// empty child list.
    pub fn is_empty(&self) -> bool {
        match self {
            NodeContent::None => true,
            NodeContent::Children(children) => children.is_empty(),
            NodeContent::Bytes(_) => false,
        }
    }
}

// An empty child list compares equal to no content.
impl PartialEq for NodeContent {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NodeContent::Bytes(a), NodeContent::Bytes(b)) => a == b,
            (NodeContent::Bytes(_), _) | (_, NodeContent::Bytes(_)) => false,
            (NodeContent::Children(a), NodeContent::Children(b)) => a == b,
            (a, b) => a.is_empty() && b.is_empty(),
        }
    }
}

impl Eq for NodeContent {}

impl Node {
    /// Create a new node with the given tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Attrs::new(),
            content: NodeContent::None,
        }
    }

    /// Create a new node with tag and attributes
    pub fn with_attrs(tag: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            tag: tag.into(),
            attrs,
            content: NodeContent::None,
        }
    }

    /// Builder form of [`Node::set_attr`].
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder form of [`Node::set_children`].
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.set_children(children);
        self
    }

    /// Builder form of [`Node::set_bytes`].
    pub fn with_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.set_bytes(bytes.into());
        self
    }

    /// Set an attribute. An existing key keeps its position.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// Get an attribute value
    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Set the content to child nodes
    pub fn set_children(&mut self, children: Vec<Node>) {
        self.content = NodeContent::Children(children);
    }

    /// Add a child node. Replaces a byte payload, if any.
    pub fn add_child(&mut self, child: Node) {
        match &mut self.content {
            NodeContent::Children(children) => children.push(child),
            _ => self.content = NodeContent::Children(vec![child]),
        }
    }

    /// Set the content to bytes
    pub fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.content = NodeContent::Bytes(bytes);
    }

    /// Get children if content is children
    pub fn get_children(&self) -> Option<&[Node]> {
        match &self.content {
            NodeContent::Children(children) => Some(children),
            _ => None,
        }
    }

    /// Get children by tag
    pub fn get_children_by_tag(&self, tag: &str) -> Vec<&Node> {
        match &self.content {
            NodeContent::Children(children) => {
                children.iter().filter(|n| n.tag == tag).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Get first child with the given tag
    pub fn get_child_by_tag(&self, tag: &str) -> Option<&Node> {
        self.get_children().and_then(|c| c.iter().find(|n| n.tag == tag))
    }

    /// Get an optional child by walking through nested tags
    pub fn get_optional_child_by_tag(&self, tags: &[&str]) -> Option<&Node> {
        let mut current = self;
        for tag in tags {
            current = current.get_child_by_tag(tag)?;
        }
        Some(current)
    }

    /// Get bytes content if present
    pub fn get_bytes(&self) -> Option<&[u8]> {
        match &self.content {
            NodeContent::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// XML-like rendering for logs. Payloads are shown as hex.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (key, value) in &self.attrs {
            write!(f, " {}=\"{}\"", key, value)?;
        }
        match &self.content {
            NodeContent::Children(children) if !children.is_empty() => {
                write!(f, ">")?;
                for child in children {
                    write!(f, "{}", child)?;
                }
                write!(f, "</{}>", self.tag)
            }
            NodeContent::Bytes(bytes) => {
                write!(f, ">{}</{}>", hex::encode(bytes), self.tag)
            }
            _ => write!(f, "/>"),
        }
    }
}
