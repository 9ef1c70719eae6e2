//! SyntaxNode definition.
//!
//! The tree type produced by the built-in grammar adapters.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::Span;

/// A node in a syntax tree.
///
/// `SyntaxNode` is a reference-counted handle: cloning it is cheap and the
/// clone refers to the same node. Two handles are the *same node* only if
/// [`SyntaxNode::ptr_eq`] says so; `PartialEq` is not implemented on purpose,
/// structurally equal subtrees are still distinct nodes.
///
/// # Example
///
/// ```rust
/// use codepatch_ast::{NodeData, Span, SyntaxNode};
///
/// let one = SyntaxNode::leaf("integer", Span::new(1, 2))
///     .with_value("1")
///     .with_data(NodeData::Integer(1));
/// let group = SyntaxNode::parent("group", Span::new(0, 3), vec![one]);
///
/// assert_eq!(group.children()[0].value(), Some("1"));
/// ```
#[derive(Clone)]
pub struct SyntaxNode(Rc<NodeInner>);

struct NodeInner {
    kind: &'static str,
    span: Span,
    children: Vec<SyntaxNode>,
    value: Option<String>,
    data: NodeData,
}

/// Additional node-specific data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeData {
    #[default]
    None,
    Heading(u8),
    List(bool),
    Code(Option<String>),
    Link(LinkData),
    Integer(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkData {
    pub url: String,
    pub title: Option<String>,
}

impl SyntaxNode {
    /// Creates a new parent node with children.
    pub fn parent(kind: &'static str, span: Span, children: Vec<SyntaxNode>) -> Self {
        Self(Rc::new(NodeInner {
            kind,
            span,
            children,
            value: None,
            data: NodeData::None,
        }))
    }

    /// Creates a new leaf node (no children, no value).
    pub fn leaf(kind: &'static str, span: Span) -> Self {
        Self::parent(kind, span, Vec::new())
    }

    /// Returns this node with its text value set.
    ///
    /// Only meaningful while the handle is unshared; builders call it right
    /// after construction.
    pub fn with_value(self, value: impl Into<String>) -> Self {
        self.map_inner(|inner| inner.value = Some(value.into()))
    }

    /// Returns this node with its data set.
    pub fn with_data(self, data: NodeData) -> Self {
        self.map_inner(|inner| inner.data = data)
    }

    fn map_inner(self, f: impl FnOnce(&mut NodeInner)) -> Self {
        let mut inner = match Rc::try_unwrap(self.0) {
            Ok(inner) => inner,
            Err(shared) => NodeInner {
                kind: shared.kind,
                span: shared.span,
                children: shared.children.clone(),
                value: shared.value.clone(),
                data: shared.data.clone(),
            },
        };
        f(&mut inner);
        Self(Rc::new(inner))
    }

    /// The node type name, e.g. `"paragraph"` or `"integer"`.
    #[inline]
    pub fn kind(&self) -> &'static str {
        self.0.kind
    }

    /// Returns true if this node is of the given kind.
    #[inline]
    pub fn is(&self, kind: &str) -> bool {
        self.0.kind == kind
    }

    /// Byte span in the source text.
    #[inline]
    pub fn span(&self) -> Span {
        self.0.span
    }

    /// Child nodes, in source order.
    #[inline]
    pub fn children(&self) -> &[SyntaxNode] {
        &self.0.children
    }

    /// Returns true if this node has children.
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.0.children.is_empty()
    }

    /// Text value, for nodes that carry one (text, code, integers).
    #[inline]
    pub fn value(&self) -> Option<&str> {
        self.0.value.as_deref()
    }

    #[inline]
    pub fn data(&self) -> &NodeData {
        &self.0.data
    }

    /// Returns true if both handles refer to the same node.
    #[inline]
    pub fn ptr_eq(&self, other: &SyntaxNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Counts this node and all of its descendants.
    pub fn descendant_count(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(SyntaxNode::descendant_count)
            .sum::<usize>()
    }
}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("SyntaxNode");
        debug.field("kind", &self.0.kind).field("span", &self.0.span);
        if let Some(value) = &self.0.value {
            debug.field("value", value);
        }
        if self.0.data != NodeData::None {
            debug.field("data", &self.0.data);
        }
        if !self.0.children.is_empty() {
            debug.field("children", &self.0.children);
        }
        debug.finish()
    }
}

impl Serialize for SyntaxNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let inner = &self.0;
        let mut len = 2; // type, range
        if !inner.children.is_empty() {
            len += 1;
        }
        if inner.value.is_some() {
            len += 1;
        }
        len += inner.data.present_field_count();

        let mut state = serializer.serialize_struct("SyntaxNode", len)?;
        state.serialize_field("type", inner.kind)?;
        state.serialize_field("range", &[inner.span.start, inner.span.end])?;
        if !inner.children.is_empty() {
            state.serialize_field("children", &inner.children)?;
        }
        if let Some(value) = &inner.value {
            state.serialize_field("value", value)?;
        }
        inner.data.serialize_fields(&mut state)?;
        state.end()
    }
}

impl NodeData {
    fn present_field_count(&self) -> usize {
        match self {
            NodeData::None | NodeData::Code(None) => 0,
            NodeData::Link(link) if link.title.is_some() => 2,
            _ => 1,
        }
    }

    fn serialize_fields<S: serde::ser::SerializeStruct>(
        &self,
        state: &mut S,
    ) -> Result<(), S::Error> {
        match self {
            NodeData::None => {}
            NodeData::Heading(depth) => state.serialize_field("depth", depth)?,
            NodeData::List(ordered) => state.serialize_field("ordered", ordered)?,
            NodeData::Code(lang) => {
                if let Some(lang) = lang {
                    state.serialize_field("lang", lang)?;
                }
            }
            NodeData::Link(link) => {
                state.serialize_field("url", &link.url)?;
                if let Some(title) = &link.title {
                    state.serialize_field("title", title)?;
                }
            }
            NodeData::Integer(value) => state.serialize_field("integer", value)?,
        }
        Ok(())
    }

    /// Returns the integer payload, if any.
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            NodeData::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Creates node data for a link.
    pub fn link(url: impl Into<String>, title: Option<String>) -> Self {
        Self::Link(LinkData {
            url: url.into(),
            title,
        })
    }
}
