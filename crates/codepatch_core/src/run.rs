//! Per-run context.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use codepatch_parser::{Outcome, ParserConfiguration};

use crate::TransformError;
use crate::buffer::TextBuffer;
use crate::helpers::{NodeHelpers, NodeRef};
use crate::modifier::Shared;
use crate::options::SourceMapOptions;
use crate::result::TransformOutput;
use crate::source_map;
use crate::store::{NodeArena, NodeId, NodeState, RunId};

pub(crate) type BoxedManipulator<P> =
    Box<dyn FnMut(&NodeRef<P>, &NodeHelpers<P>) -> Outcome<Result<(), TransformError>>>;

/// How far a run got. Shared with every [`NodeRef`] of the run so that it
/// outlives the run itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunPhase {
    InFlight,
    /// The walk and rendering succeeded; every node is handled.
    Completed,
    /// A manipulator or rendering error ended the run.
    Failed,
}

/// Everything one transformation run owns.
pub(crate) struct Run<P: ParserConfiguration> {
    id: RunId,
    this: Weak<Run<P>>,
    pub(crate) shared: Rc<Shared<P>>,
    arena: RefCell<NodeArena<P::Node>>,
    buffer: RefCell<TextBuffer>,
    source_map: SourceMapOptions,
    manipulator: RefCell<BoxedManipulator<P>>,
    deferred: Cell<bool>,
    phase: Rc<Cell<RunPhase>>,
}

impl<P: ParserConfiguration> Run<P> {
    pub(crate) fn new(
        id: RunId,
        this: Weak<Run<P>>,
        shared: Rc<Shared<P>>,
        arena: NodeArena<P::Node>,
        code: String,
        source_map: SourceMapOptions,
        manipulator: BoxedManipulator<P>,
    ) -> Self {
        Self {
            id,
            this,
            shared,
            arena: RefCell::new(arena),
            buffer: RefCell::new(TextBuffer::new(code)),
            source_map,
            manipulator: RefCell::new(manipulator),
            deferred: Cell::new(false),
            phase: Rc::new(Cell::new(RunPhase::InFlight)),
        }
    }

    pub(crate) fn id(&self) -> RunId {
        self.id
    }

    pub(crate) fn node_ref(&self, id: NodeId) -> NodeRef<P> {
        let arena = self.arena.borrow();
        let entry = arena.get(id);
        NodeRef::new(
            self.id,
            id,
            entry.span,
            entry.node.clone(),
            Weak::clone(&self.this),
            Rc::clone(&self.phase),
        )
    }

    pub(crate) fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.arena.borrow().get(id).children.clone()
    }

    pub(crate) fn ancestor(&self, id: NodeId, levels: usize) -> Option<NodeId> {
        self.arena.borrow().ancestor(id, levels)
    }

    pub(crate) fn state(&self, id: NodeId) -> NodeState {
        self.arena.borrow().get(id).state
    }

    pub(crate) fn advance(&self, id: NodeId, state: NodeState) {
        self.arena.borrow_mut().advance(id, state);
    }

    /// Current text of the node's span.
    pub(crate) fn source(&self, id: NodeId) -> Result<String, TransformError> {
        let span = self.arena.borrow().get(id).span;
        self.buffer.borrow().slice(span)
    }

    /// Replaces the node's span, or inserts before it when the span is empty.
    pub(crate) fn override_node(&self, id: NodeId, text: &str) -> Result<(), TransformError> {
        let (span, state) = {
            let arena = self.arena.borrow();
            let entry = arena.get(id);
            (entry.span, entry.state)
        };

        if state == NodeState::Handled {
            warn!(run = %self.id, node = %span, "override rejected, node already handled");
            return Err(TransformError::NodeAlreadyHandled { span });
        }
        if self.phase.get() != RunPhase::InFlight {
            return Err(TransformError::RunFinished);
        }

        let mut buffer = self.buffer.borrow_mut();
        if span.is_empty() {
            buffer.insert(span.start, text)?;
        } else {
            buffer.overwrite(span, text)?;
        }
        trace!(run = %self.id, node = %span, "override applied");
        Ok(())
    }

    /// Calls the manipulator for `id`.
    pub(crate) fn manipulate(
        self: &Rc<Self>,
        id: NodeId,
    ) -> Outcome<Result<(), TransformError>> {
        let node = self.node_ref(id);
        let helpers = NodeHelpers::new(Rc::clone(self), id);
        let mut manipulator = self.manipulator.borrow_mut();
        (&mut *manipulator)(&node, &helpers)
    }

    /// Records that the run now completes asynchronously.
    pub(crate) fn mark_deferred(&self, id: NodeId) {
        if !self.deferred.replace(true) {
            let span = self.arena.borrow().get(id).span;
            debug!(run = %self.id, node = %span, "run continues deferred");
        }
    }

    /// Ends the run and renders its output.
    pub(crate) fn finish(
        &self,
        walked: Result<(), TransformError>,
    ) -> Result<TransformOutput, TransformError> {
        self.shared.store.deregister(self.id);

        let rendered = walked.and_then(|()| {
            let buffer = self.buffer.borrow();
            let map = source_map::generate(&buffer, &self.source_map)?;
            debug!(
                run = %self.id,
                edited = !buffer.is_pristine(),
                deferred = self.deferred.get(),
                resolution = ?self.source_map.hires,
                "run finished"
            );
            Ok(TransformOutput::new(buffer.to_code(), map))
        });

        match &rendered {
            Ok(_) => self.phase.set(RunPhase::Completed),
            Err(err) => {
                debug!(run = %self.id, error = %err, "run failed");
                self.phase.set(RunPhase::Failed);
            }
        }
        rendered
    }
}
