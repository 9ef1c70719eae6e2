//! # codepatch_ast
//!
//! Span and syntax tree types for codepatch.
//!
//! Everything in codepatch addresses source text through [`Span`], a
//! half-open byte range. The built-in grammar adapters produce trees of
//! [`SyntaxNode`]; user-supplied adapters may bring their own node type and
//! only need to report a `Span` per node.
//!
//! ## Example
//!
//! ```rust
//! use codepatch_ast::{Span, SyntaxNode};
//!
//! let root = SyntaxNode::parent("program", Span::new(0, 5), vec![
//!     SyntaxNode::leaf("integer", Span::new(1, 2)).with_value("1"),
//! ]);
//!
//! assert_eq!(root.descendant_count(), 2);
//! assert_eq!(&"(1,2)"[root.children()[0].span().range()], "1");
//! ```

mod node;
mod span;

pub use node::{LinkData, NodeData, SyntaxNode};
pub use span::Span;
