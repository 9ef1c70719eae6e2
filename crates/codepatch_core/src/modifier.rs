//! Binding between a grammar adapter and the transformation entry point.

use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use codepatch_parser::{Outcome, ParserConfiguration};

use crate::TransformError;
use crate::helpers::{NodeHelpers, NodeRef, Origin, node_refs};
use crate::options::TransformOptions;
use crate::result::TransformOutput;
use crate::run::{BoxedManipulator, Run};
use crate::store::{MetadataStore, NodeArena, NodeId, NodeState, RunId};
use crate::traversal::{self, ManipulatorResult};

/// What [`Modifier::transform`] returns: immediate when parsing and every
/// manipulator invocation were immediate, deferred otherwise.
pub type TransformOutcome = Outcome<Result<TransformOutput, TransformError>>;

/// State shared by every run of one binding.
pub(crate) struct Shared<P: ParserConfiguration> {
    pub(crate) config: P,
    pub(crate) store: MetadataStore<P>,
}

/// A grammar adapter bound to the transformation engine.
///
/// Create one per adapter and reuse it: each call to
/// [`transform`](Self::transform) is an independent run with its own node
/// metadata and text buffer. Clones share the same binding.
///
/// # Example
///
/// ```rust
/// use codepatch_core::Modifier;
/// use codepatch_parser::TupleParser;
///
/// let modifier = Modifier::new(TupleParser::new());
///
/// let output = modifier
///     .transform("(1, 5, 3)", |node, helpers| {
///         if node.data().as_integer() == Some(5) {
///             helpers.override_with("2")?;
///         }
///         Ok::<_, codepatch_core::TransformError>(())
///     })
///     .try_into_immediate()
///     .ok()
///     .unwrap()
///     .unwrap();
///
/// assert_eq!(output.code(), "(1, 2, 3)");
/// ```
pub struct Modifier<P: ParserConfiguration> {
    shared: Rc<Shared<P>>,
}

impl<P: ParserConfiguration> Clone for Modifier<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<P: ParserConfiguration> fmt::Debug for Modifier<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifier")
            .field("parser", &self.shared.config.name())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl<P: ParserConfiguration> Modifier<P> {
    /// Binds `config` to the engine.
    pub fn new(config: P) -> Self {
        Self {
            shared: Rc::new(Shared {
                config,
                store: MetadataStore::new(),
            }),
        }
    }

    /// The bound adapter.
    pub fn config(&self) -> &P {
        &self.shared.config
    }

    /// Transforms `code` with default options.
    pub fn transform<M, R>(&self, code: impl Into<String>, manipulator: M) -> TransformOutcome
    where
        M: FnMut(&NodeRef<P>, &NodeHelpers<P>) -> R + 'static,
        R: ManipulatorResult,
    {
        self.transform_with(code, TransformOptions::default(), manipulator)
    }

    /// Transforms `code`, calling `manipulator` once per node in post-order.
    pub fn transform_with<M, R>(
        &self,
        code: impl Into<String>,
        options: TransformOptions<P::Options>,
        mut manipulator: M,
    ) -> TransformOutcome
    where
        M: FnMut(&NodeRef<P>, &NodeHelpers<P>) -> R + 'static,
        R: ManipulatorResult,
    {
        let code = code.into();
        let manipulator: BoxedManipulator<P> =
            Box::new(move |node: &NodeRef<P>, helpers: &NodeHelpers<P>| {
                manipulator(node, helpers).into_outcome()
            });

        let parsed = self.shared.config.parse(&code, &options.parser);
        if parsed.is_deferred() {
            debug!(parser = self.shared.config.name(), "waiting for deferred parse");
        }

        let shared = Rc::clone(&self.shared);
        parsed.and_then(move |parsed| match parsed {
            Ok(root) => start(shared, code, options, root, manipulator),
            Err(err) => {
                debug!(parser = shared.config.name(), error = %err, "parse failed");
                Outcome::Immediate(Err(err.into()))
            }
        })
    }

    /// Current text of `node`, which must belong to an in-flight run.
    pub fn source(&self, node: &NodeRef<P>) -> Result<String, TransformError> {
        match self.locate(node) {
            Origin::InFlight(run) => run.source(node.id()),
            Origin::Completed | Origin::Gone => Err(TransformError::RunFinished),
        }
    }

    /// Immediate parent of `node`. `None` at the root or once its run has
    /// finished.
    pub fn parent(&self, node: &NodeRef<P>) -> Option<NodeRef<P>> {
        self.ancestor(node, 1)
    }

    /// The ancestor `levels` generations above `node`. `0` behaves as `1`.
    pub fn ancestor(&self, node: &NodeRef<P>, levels: usize) -> Option<NodeRef<P>> {
        match self.locate(node) {
            Origin::InFlight(run) => run.ancestor(node.id(), levels).map(|id| run.node_ref(id)),
            Origin::Completed | Origin::Gone => None,
        }
    }

    /// Children of `node`. Empty once its run has finished.
    pub fn children(&self, node: &NodeRef<P>) -> Vec<NodeRef<P>> {
        match self.locate(node) {
            Origin::InFlight(run) => node_refs(&run, node.id()),
            Origin::Completed | Origin::Gone => Vec::new(),
        }
    }

    /// Replaces the span of `node`, which must belong to an in-flight run
    /// and not be handled yet.
    ///
    /// Every node of a completed run counts as handled. A run that failed or
    /// was dropped yields [`TransformError::RunFinished`].
    pub fn override_node(&self, node: &NodeRef<P>, text: &str) -> Result<(), TransformError> {
        match self.locate(node) {
            Origin::InFlight(run) => run.override_node(node.id(), text),
            Origin::Completed => Err(TransformError::NodeAlreadyHandled { span: node.span() }),
            Origin::Gone => Err(TransformError::RunFinished),
        }
    }

    /// Lifecycle state of `node`. `Handled` once its run has completed, `None`
    /// when it failed or was dropped.
    pub fn state(&self, node: &NodeRef<P>) -> Option<NodeState> {
        match self.locate(node) {
            Origin::InFlight(run) => Some(run.state(node.id())),
            Origin::Completed => Some(NodeState::Handled),
            Origin::Gone => None,
        }
    }

    /// Number of runs currently in flight.
    pub fn in_flight(&self) -> usize {
        self.shared.store.in_flight()
    }

    /// Runs of this binding come from the store; anything else is resolved
    /// through the handle itself.
    fn locate(&self, node: &NodeRef<P>) -> Origin<P> {
        match self.shared.store.lookup(node.run_id()) {
            Some(run) => Origin::InFlight(run),
            None => node.origin(),
        }
    }
}

fn start<P: ParserConfiguration>(
    shared: Rc<Shared<P>>,
    code: String,
    options: TransformOptions<P::Options>,
    root: P::Node,
    manipulator: BoxedManipulator<P>,
) -> TransformOutcome {
    let arena = match NodeArena::register_tree(&shared.config, root, &code) {
        Ok(arena) => arena,
        Err(err) => return Outcome::Immediate(Err(err)),
    };

    let id = RunId::next();
    debug!(
        run = %id,
        parser = shared.config.name(),
        nodes = arena.len(),
        resolution = ?options.source_map.hires,
        "run started"
    );

    let run = Rc::new_cyclic(|this| {
        Run::new(
            id,
            Weak::clone(this),
            Rc::clone(&shared),
            arena,
            code,
            options.source_map,
            manipulator,
        )
    });
    shared.store.register(&run);

    let owner = Rc::clone(&run);
    traversal::walk(&run, NodeId::ROOT).map(move |walked| owner.finish(walked))
}
