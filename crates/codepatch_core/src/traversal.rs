//! Post-order traversal.
//!
//! Every child subtree completes, in adapter order, before the parent's
//! manipulator starts. As long as each step is immediate the walk runs to
//! completion without yielding. The first deferred step turns the remainder
//! of the walk into a chain of futures that keeps the same order.

use std::rc::Rc;

use codepatch_parser::{Outcome, ParserConfiguration};

use crate::TransformError;
use crate::run::Run;
use crate::store::{NodeId, NodeState};

type Step = Outcome<Result<(), TransformError>>;

/// Values a manipulator may return.
///
/// Implemented for `()`, `Result<(), E>`, `Outcome<()>` and
/// `Outcome<Result<(), E>>` where `E` converts into [`TransformError`].
pub trait ManipulatorResult: 'static {
    fn into_outcome(self) -> Outcome<Result<(), TransformError>>;
}

impl ManipulatorResult for () {
    fn into_outcome(self) -> Outcome<Result<(), TransformError>> {
        Outcome::Immediate(Ok(()))
    }
}

impl<E: Into<TransformError> + 'static> ManipulatorResult for Result<(), E> {
    fn into_outcome(self) -> Outcome<Result<(), TransformError>> {
        Outcome::Immediate(self.map_err(Into::into))
    }
}

impl ManipulatorResult for Outcome<()> {
    fn into_outcome(self) -> Outcome<Result<(), TransformError>> {
        self.map(Ok)
    }
}

impl<E: Into<TransformError> + 'static> ManipulatorResult for Outcome<Result<(), E>> {
    fn into_outcome(self) -> Outcome<Result<(), TransformError>> {
        self.map(|result| result.map_err(Into::into))
    }
}

/// Walks the subtree rooted at `id`.
pub(crate) fn walk<P: ParserConfiguration>(run: &Rc<Run<P>>, id: NodeId) -> Step {
    run.advance(id, NodeState::TraversingChildren);
    let children: Rc<[NodeId]> = run.children(id).into();

    let owner = Rc::clone(run);
    walk_children(run, children, 0).and_then(move |walked| match walked {
        Ok(()) => visit(&owner, id),
        Err(err) => Outcome::Immediate(Err(err)),
    })
}

fn walk_children<P: ParserConfiguration>(
    run: &Rc<Run<P>>,
    children: Rc<[NodeId]>,
    start: usize,
) -> Step {
    for index in start..children.len() {
        match walk(run, children[index]) {
            Outcome::Immediate(Ok(())) => {}
            Outcome::Immediate(Err(err)) => return Outcome::Immediate(Err(err)),
            Outcome::Deferred(pending) => {
                let run = Rc::clone(run);
                return Outcome::deferred(async move {
                    pending.await?;
                    walk_children(&run, children, index + 1).resolve().await
                });
            }
        }
    }
    Outcome::Immediate(Ok(()))
}

/// Runs the manipulator for `id` and marks the node handled once it
/// completes.
fn visit<P: ParserConfiguration>(run: &Rc<Run<P>>, id: NodeId) -> Step {
    run.advance(id, NodeState::Running);

    match run.manipulate(id) {
        Outcome::Immediate(result) => {
            run.advance(id, NodeState::Handled);
            Outcome::Immediate(result)
        }
        Outcome::Deferred(pending) => {
            run.mark_deferred(id);
            let run = Rc::clone(run);
            Outcome::deferred(async move {
                let result = pending.await;
                run.advance(id, NodeState::Handled);
                result
            })
        }
    }
}
