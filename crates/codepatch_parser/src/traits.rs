//! Grammar adapter protocol.

use codepatch_ast::Span;

use crate::{Outcome, ParseError};

/// The contract between the transformation engine and a grammar.
///
/// The engine never looks inside a node. Everything it knows about a tree
/// comes from these four operations: parse the text, recognise a node,
/// list a node's children and locate a node in the source.
///
/// # Example
///
/// ```rust
/// use codepatch_ast::{Span, SyntaxNode};
/// use codepatch_parser::{Outcome, ParseError, ParserConfiguration};
///
/// /// Treats the whole input as a single leaf.
/// struct WholeText;
///
/// impl ParserConfiguration for WholeText {
///     type Node = SyntaxNode;
///     type Options = ();
///
///     fn name(&self) -> &str {
///         "whole-text"
///     }
///
///     fn parse(&self, code: &str, _options: &()) -> Outcome<Result<SyntaxNode, ParseError>> {
///         let span = Span::new(0, code.len() as u32);
///         Outcome::Immediate(Ok(SyntaxNode::leaf("text", span)))
///     }
///
///     fn collect_child_nodes(&self, node: &SyntaxNode) -> Vec<SyntaxNode> {
///         node.children().to_vec()
///     }
///
///     fn get_node_location(&self, node: &SyntaxNode) -> Span {
///         node.span()
///     }
/// }
/// ```
pub trait ParserConfiguration: 'static {
    /// The adapter's node type. Cloning must be cheap.
    type Node: Clone + 'static;

    /// Adapter-specific options, forwarded verbatim to [`parse`](Self::parse).
    type Options: Default + Clone + 'static;

    /// Returns the name of this adapter.
    fn name(&self) -> &str;

    /// Parses `code` into a root node.
    ///
    /// Return [`Outcome::Deferred`] when parsing has to wait on something;
    /// the future must own whatever it needs from `code`.
    fn parse(
        &self,
        code: &str,
        options: &Self::Options,
    ) -> Outcome<Result<Self::Node, ParseError>>;

    /// Returns true if `value` belongs to this adapter's tree shape.
    fn is_node(&self, _value: &Self::Node) -> bool {
        true
    }

    /// Direct children of `node`, in source order. Empty for leaves.
    fn collect_child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Half-open byte span of `node` in the parsed code.
    fn get_node_location(&self, node: &Self::Node) -> Span;
}
