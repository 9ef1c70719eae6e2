//! Node metadata.
//!
//! Each run owns a [`NodeArena`]: one entry per node reachable from the
//! root, recorded before any manipulator runs. The long-lived
//! [`MetadataStore`] maps run ids to the runs currently in flight so that a
//! node handle can always be resolved against its own run.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use codepatch_ast::Span;
use codepatch_parser::ParserConfiguration;

use crate::TransformError;
use crate::run::Run;

/// Run-scoped node handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(u32);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Run ids are unique across every binding in the process.
static NEXT_RUN_ID: AtomicU64 = AtomicU64::new(0);

/// Identifier of one transformation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u64);

impl RunId {
    pub(crate) fn next() -> Self {
        RunId(NEXT_RUN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// Lifecycle of a node within its run. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeState {
    /// Metadata recorded, traversal has not reached the node yet.
    Registered,
    /// The node's children are being walked.
    TraversingChildren,
    /// The manipulator is running for this node.
    Running,
    /// The manipulator completed. Overrides are rejected from now on.
    Handled,
}

#[derive(Debug)]
pub(crate) struct NodeEntry<N> {
    pub(crate) node: N,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) span: Span,
    pub(crate) state: NodeState,
}

/// Metadata for every node of one run, indexed by [`NodeId`].
#[derive(Debug)]
pub(crate) struct NodeArena<N> {
    entries: Vec<NodeEntry<N>>,
}

impl<N: Clone> NodeArena<N> {
    /// Registers `root` (without a parent) and, recursively, every descendant
    /// the adapter reports.
    pub(crate) fn register_tree<P>(config: &P, root: N, code: &str) -> Result<Self, TransformError>
    where
        P: ParserConfiguration<Node = N>,
    {
        let mut arena = Self {
            entries: Vec::new(),
        };
        let span = checked_location(config, &root, code)?;
        let root = arena.register(root, None, span);
        arena.register_descendants(config, root, code)?;
        Ok(arena)
    }

    fn register_descendants<P>(
        &mut self,
        config: &P,
        parent: NodeId,
        code: &str,
    ) -> Result<(), TransformError>
    where
        P: ParserConfiguration<Node = N>,
    {
        let node = self.entries[parent.index()].node.clone();
        for child in config.collect_child_nodes(&node) {
            let span = checked_location(config, &child, code)?;
            let id = self.register(child, Some(parent), span);
            self.entries[parent.index()].children.push(id);
            self.register_descendants(config, id, code)?;
        }
        Ok(())
    }

    fn register(&mut self, node: N, parent: Option<NodeId>, span: Span) -> NodeId {
        let id = NodeId(self.entries.len() as u32);
        self.entries.push(NodeEntry {
            node,
            parent,
            children: Vec::new(),
            span,
            state: NodeState::Registered,
        });
        id
    }
}

impl<N> NodeArena<N> {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, id: NodeId) -> &NodeEntry<N> {
        &self.entries[id.index()]
    }

    /// Moves `id` forward to `state`. Never moves a node backwards.
    pub(crate) fn advance(&mut self, id: NodeId, state: NodeState) {
        let entry = &mut self.entries[id.index()];
        if state > entry.state {
            trace!(node = %entry.span, from = ?entry.state, to = ?state, "node state");
            entry.state = state;
        }
    }

    /// The ancestor `levels` generations above `id`. `0` behaves as `1`.
    pub(crate) fn ancestor(&self, id: NodeId, levels: usize) -> Option<NodeId> {
        let mut current = id;
        for _ in 0..levels.max(1) {
            current = self.get(current).parent?;
        }
        Some(current)
    }
}

fn checked_location<P: ParserConfiguration>(
    config: &P,
    node: &P::Node,
    code: &str,
) -> Result<Span, TransformError> {
    let span = config.get_node_location(node);
    let valid = span.start <= span.end
        && (span.end as usize) <= code.len()
        && code.is_char_boundary(span.start as usize)
        && code.is_char_boundary(span.end as usize);
    if valid {
        Ok(span)
    } else {
        Err(TransformError::InvalidSpan {
            span,
            len: code.len(),
        })
    }
}

/// Runs currently in flight for one binding.
pub(crate) struct MetadataStore<P: ParserConfiguration> {
    runs: RefCell<HashMap<RunId, Weak<Run<P>>>>,
}

impl<P: ParserConfiguration> MetadataStore<P> {
    pub(crate) fn new() -> Self {
        Self {
            runs: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn register(&self, run: &Rc<Run<P>>) {
        let mut runs = self.runs.borrow_mut();
        runs.retain(|_, run| run.strong_count() > 0);
        runs.insert(run.id(), Rc::downgrade(run));
    }

    pub(crate) fn deregister(&self, id: RunId) {
        self.runs.borrow_mut().remove(&id);
    }

    /// The in-flight run with the given id.
    pub(crate) fn lookup(&self, id: RunId) -> Option<Rc<Run<P>>> {
        self.runs.borrow().get(&id).and_then(Weak::upgrade)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.runs
            .borrow()
            .values()
            .filter(|run| run.strong_count() > 0)
            .count()
    }
}
