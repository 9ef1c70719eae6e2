//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use codepatch_ast::{Span, SyntaxNode};
use codepatch_core::{TransformOutcome, TransformOutput};
use codepatch_parser::{Outcome, ParseError, ParserConfiguration};

/// Wraps an adapter so that parsing always completes deferred.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredParser<P>(pub P);

impl<P: ParserConfiguration> ParserConfiguration for DeferredParser<P> {
    type Node = P::Node;
    type Options = P::Options;

    fn name(&self) -> &str {
        "deferred"
    }

    fn parse(&self, code: &str, options: &P::Options) -> Outcome<Result<P::Node, ParseError>> {
        let parsed = self.0.parse(code, options);
        Outcome::deferred(async move {
            tokio::task::yield_now().await;
            parsed.resolve().await
        })
    }

    fn is_node(&self, value: &P::Node) -> bool {
        self.0.is_node(value)
    }

    fn collect_child_nodes(&self, node: &P::Node) -> Vec<P::Node> {
        self.0.collect_child_nodes(node)
    }

    fn get_node_location(&self, node: &P::Node) -> Span {
        self.0.get_node_location(node)
    }
}

/// Hands out a prebuilt tree regardless of the input.
///
/// Nodes of kind `"opaque"` are not recognised as nodes.
#[derive(Debug, Clone)]
pub struct FixedTree(pub SyntaxNode);

impl ParserConfiguration for FixedTree {
    type Node = SyntaxNode;
    type Options = ();

    fn name(&self) -> &str {
        "fixed"
    }

    fn parse(&self, _code: &str, _options: &()) -> Outcome<Result<SyntaxNode, ParseError>> {
        Outcome::Immediate(Ok(self.0.clone()))
    }

    fn is_node(&self, value: &SyntaxNode) -> bool {
        !value.is("opaque")
    }

    fn collect_child_nodes(&self, node: &SyntaxNode) -> Vec<SyntaxNode> {
        node.children().to_vec()
    }

    fn get_node_location(&self, node: &SyntaxNode) -> Span {
        node.span()
    }
}

/// Unwraps an outcome that must have completed without yielding.
pub fn immediate(outcome: TransformOutcome) -> TransformOutput {
    match outcome.try_into_immediate() {
        Ok(result) => result.expect("transformation failed"),
        Err(_) => panic!("expected an immediate result"),
    }
}

/// Shared log the manipulators append to.
pub fn recorder<T>() -> Rc<RefCell<Vec<T>>> {
    Rc::new(RefCell::new(Vec::new()))
}

/// Installs a test subscriber; `RUST_LOG=codepatch_core=trace` shows the
/// engine's events.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
