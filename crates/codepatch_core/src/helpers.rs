//! Node handles and the helpers handed to manipulators.

use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use codepatch_ast::Span;
use codepatch_parser::ParserConfiguration;

use crate::TransformError;
use crate::run::{Run, RunPhase};
use crate::store::{NodeId, RunId};

/// A node of an in-flight run.
///
/// Dereferences to the adapter's node value. Two `NodeRef`s are equal when
/// they address the same node of the same run, regardless of structure.
/// A handle keeps track of how its run ended, so a node of a completed run
/// still reports itself as handled.
pub struct NodeRef<P: ParserConfiguration> {
    run: RunId,
    id: NodeId,
    span: Span,
    value: P::Node,
    origin: Weak<Run<P>>,
    phase: Rc<Cell<RunPhase>>,
}

/// The run a [`NodeRef`] leads to.
pub(crate) enum Origin<P: ParserConfiguration> {
    InFlight(Rc<Run<P>>),
    /// Every node of the run is handled.
    Completed,
    /// The run failed or was dropped.
    Gone,
}

impl<P: ParserConfiguration> NodeRef<P> {
    pub(crate) fn new(
        run: RunId,
        id: NodeId,
        span: Span,
        value: P::Node,
        origin: Weak<Run<P>>,
        phase: Rc<Cell<RunPhase>>,
    ) -> Self {
        Self {
            run,
            id,
            span,
            value,
            origin,
            phase,
        }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn origin(&self) -> Origin<P> {
        match self.phase.get() {
            RunPhase::InFlight => self.origin.upgrade().map_or(Origin::Gone, Origin::InFlight),
            RunPhase::Completed => Origin::Completed,
            RunPhase::Failed => Origin::Gone,
        }
    }

    /// The run this node belongs to.
    pub fn run_id(&self) -> RunId {
        self.run
    }

    /// Location of the node in the original text.
    pub fn span(&self) -> Span {
        self.span
    }

    /// The adapter's node value.
    pub fn node(&self) -> &P::Node {
        &self.value
    }
}

impl<P: ParserConfiguration> Clone for NodeRef<P> {
    fn clone(&self) -> Self {
        Self {
            run: self.run,
            id: self.id,
            span: self.span,
            value: self.value.clone(),
            origin: Weak::clone(&self.origin),
            phase: Rc::clone(&self.phase),
        }
    }
}

impl<P: ParserConfiguration> Deref for NodeRef<P> {
    type Target = P::Node;

    fn deref(&self) -> &P::Node {
        &self.value
    }
}

impl<P: ParserConfiguration> PartialEq for NodeRef<P> {
    fn eq(&self, other: &Self) -> bool {
        self.run == other.run && self.id == other.id
    }
}

impl<P: ParserConfiguration> Eq for NodeRef<P> {}

impl<P: ParserConfiguration> fmt::Debug for NodeRef<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("run", &self.run)
            .field("id", &self.id)
            .field("span", &self.span)
            .finish_non_exhaustive()
    }
}

/// Helpers bound to the node currently being visited.
///
/// Every operation comes in a bound form acting on that node and an explicit
/// form taking another node. Explicit forms fall back to the bound node when
/// the adapter does not recognise the target as a node. A target from a
/// different run, of this binding or another, is resolved against that run.
///
/// `NodeHelpers` is cheap to clone and may be moved into deferred work or
/// timers; calls made after the node's turn has ended are rejected by the
/// override operations.
pub struct NodeHelpers<P: ParserConfiguration> {
    run: Rc<Run<P>>,
    node: NodeId,
}

impl<P: ParserConfiguration> Clone for NodeHelpers<P> {
    fn clone(&self) -> Self {
        Self {
            run: Rc::clone(&self.run),
            node: self.node,
        }
    }
}

impl<P: ParserConfiguration> fmt::Debug for NodeHelpers<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHelpers")
            .field("run", &self.run.id())
            .field("node", &self.node)
            .finish()
    }
}

enum Target<P: ParserConfiguration> {
    Local(NodeId),
    Foreign(Rc<Run<P>>, NodeId),
    Completed(Span),
    Gone,
}

impl<P: ParserConfiguration> NodeHelpers<P> {
    pub(crate) fn new(run: Rc<Run<P>>, node: NodeId) -> Self {
        Self { run, node }
    }

    fn resolve(&self, target: &NodeRef<P>) -> Target<P> {
        if !self.run.shared.config.is_node(target.node()) {
            return Target::Local(self.node);
        }
        if target.run_id() == self.run.id() {
            return Target::Local(target.id());
        }
        match target.origin() {
            Origin::InFlight(run) => Target::Foreign(run, target.id()),
            Origin::Completed => Target::Completed(target.span()),
            Origin::Gone => Target::Gone,
        }
    }

    /// The node being visited.
    pub fn node(&self) -> NodeRef<P> {
        self.run.node_ref(self.node)
    }

    /// Current text of the visited node's span, including edits already made
    /// to it or its descendants.
    pub fn source(&self) -> Result<String, TransformError> {
        self.run.source(self.node)
    }

    pub fn source_of(&self, target: &NodeRef<P>) -> Result<String, TransformError> {
        match self.resolve(target) {
            Target::Local(id) => self.run.source(id),
            Target::Foreign(run, id) => run.source(id),
            Target::Completed(_) | Target::Gone => Err(TransformError::RunFinished),
        }
    }

    /// Immediate parent of the visited node. `None` at the root.
    pub fn parent(&self) -> Option<NodeRef<P>> {
        self.ancestor(1)
    }

    pub fn parent_of(&self, target: &NodeRef<P>) -> Option<NodeRef<P>> {
        self.ancestor_of(target, 1)
    }

    /// The ancestor `levels` generations up. `0` behaves as `1`; `None` when
    /// the chain ends first.
    pub fn ancestor(&self, levels: usize) -> Option<NodeRef<P>> {
        self.run
            .ancestor(self.node, levels)
            .map(|id| self.run.node_ref(id))
    }

    pub fn ancestor_of(&self, target: &NodeRef<P>, levels: usize) -> Option<NodeRef<P>> {
        match self.resolve(target) {
            Target::Local(id) => self.run.ancestor(id, levels).map(|a| self.run.node_ref(a)),
            Target::Foreign(run, id) => run.ancestor(id, levels).map(|a| run.node_ref(a)),
            Target::Completed(_) | Target::Gone => None,
        }
    }

    /// Children of the visited node, in adapter order.
    pub fn children(&self) -> Vec<NodeRef<P>> {
        node_refs(&self.run, self.node)
    }

    /// Children of `target`. Empty when its run has finished.
    pub fn children_of(&self, target: &NodeRef<P>) -> Vec<NodeRef<P>> {
        match self.resolve(target) {
            Target::Local(id) => node_refs(&self.run, id),
            Target::Foreign(run, id) => node_refs(&run, id),
            Target::Completed(_) | Target::Gone => Vec::new(),
        }
    }

    /// Replaces the visited node's span with `text`.
    ///
    /// An empty span gets `text` inserted at its position instead. Fails with
    /// [`TransformError::NodeAlreadyHandled`] once the node's manipulator has
    /// completed.
    pub fn override_with(&self, text: &str) -> Result<(), TransformError> {
        self.run.override_node(self.node, text)
    }

    pub fn override_node(&self, target: &NodeRef<P>, text: &str) -> Result<(), TransformError> {
        match self.resolve(target) {
            Target::Local(id) => self.run.override_node(id, text),
            Target::Foreign(run, id) => run.override_node(id, text),
            Target::Completed(span) => Err(TransformError::NodeAlreadyHandled { span }),
            Target::Gone => Err(TransformError::RunFinished),
        }
    }
}

pub(crate) fn node_refs<P: ParserConfiguration>(run: &Run<P>, id: NodeId) -> Vec<NodeRef<P>> {
    run.children(id)
        .into_iter()
        .map(|child| run.node_ref(child))
        .collect()
}
