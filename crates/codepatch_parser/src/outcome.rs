//! Values that are either available now or resolve later.

use std::fmt;
use std::future::{Future, IntoFuture};

use futures_util::future::{self, FutureExt, LocalBoxFuture};

/// A value produced either immediately or by a future.
///
/// Adapters return an `Outcome` from [`parse`](crate::ParserConfiguration::parse)
/// and manipulators may return one from each invocation. Code that only ever
/// sees `Immediate` values never yields; the first `Deferred` value turns
/// everything chained after it into a `Deferred` value as well.
///
/// # Example
///
/// ```rust
/// use codepatch_parser::Outcome;
///
/// let doubled = Outcome::Immediate(21).map(|n| n * 2);
/// assert_eq!(doubled.try_into_immediate().ok(), Some(42));
///
/// let later = Outcome::deferred(async { 21 }).map(|n| n * 2);
/// assert!(later.is_deferred());
/// ```
pub enum Outcome<T> {
    /// The value is available now.
    Immediate(T),
    /// The value resolves once the future completes.
    Deferred(LocalBoxFuture<'static, T>),
}

impl<T: 'static> Outcome<T> {
    /// Wraps a future as a deferred outcome.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = T> + 'static,
    {
        Self::Deferred(future.boxed_local())
    }

    /// Returns true if the value is not available yet.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Returns the value if it is available now, or gives the outcome back.
    pub fn try_into_immediate(self) -> Result<T, Self> {
        match self {
            Self::Immediate(value) => Ok(value),
            deferred => Err(deferred),
        }
    }

    /// Transforms the value, keeping the outcome immediate if it was.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        U: 'static,
        F: FnOnce(T) -> U + 'static,
    {
        match self {
            Self::Immediate(value) => Outcome::Immediate(f(value)),
            Self::Deferred(pending) => Outcome::Deferred(pending.map(f).boxed_local()),
        }
    }

    /// Chains another outcome-producing step.
    ///
    /// The result is immediate only when both this outcome and the one
    /// returned by `f` are immediate.
    pub fn and_then<U, F>(self, f: F) -> Outcome<U>
    where
        U: 'static,
        F: FnOnce(T) -> Outcome<U> + 'static,
    {
        match self {
            Self::Immediate(value) => f(value),
            Self::Deferred(pending) => {
                Outcome::deferred(async move { f(pending.await).resolve().await })
            }
        }
    }

    /// Waits for the value.
    pub async fn resolve(self) -> T {
        match self {
            Self::Immediate(value) => value,
            Self::Deferred(pending) => pending.await,
        }
    }
}

impl<T: 'static> IntoFuture for Outcome<T> {
    type Output = T;
    type IntoFuture = LocalBoxFuture<'static, T>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Self::Immediate(value) => future::ready(value).boxed_local(),
            Self::Deferred(pending) => pending,
        }
    }
}

impl<T> From<T> for Outcome<T> {
    fn from(value: T) -> Self {
        Self::Immediate(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(value) => f.debug_tuple("Immediate").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_immediate_chain_stays_immediate() {
        let outcome = Outcome::Immediate(2)
            .map(|n| n + 1)
            .and_then(|n| Outcome::Immediate(n * 10));

        assert!(!outcome.is_deferred());
        assert_eq!(outcome.try_into_immediate().ok(), Some(30));
    }

    #[test]
    fn test_deferred_step_makes_chain_deferred() {
        let outcome = Outcome::Immediate(2).and_then(|n| Outcome::deferred(async move { n + 1 }));
        assert!(outcome.is_deferred());
        assert!(outcome.try_into_immediate().is_err());
    }

    #[test]
    fn test_deferred_does_not_run_until_polled() {
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let outcome = Outcome::deferred(async move { flag.set(true) });

        assert!(outcome.is_deferred());
        assert!(!ran.get());
        drop(outcome);
        assert!(!ran.get());
    }

    #[tokio::test]
    async fn test_deferred_chain_resolves() {
        let outcome = Outcome::deferred(async { 2 })
            .map(|n| n + 1)
            .and_then(|n| Outcome::Immediate(n * 10));

        assert_eq!(outcome.await, 30);
    }

    #[tokio::test]
    async fn test_resolve_immediate() {
        assert_eq!(Outcome::from("now").resolve().await, "now");
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", Outcome::Immediate(1)), "Immediate(1)");
        assert_eq!(
            format!("{:?}", Outcome::deferred(async { 1 })),
            "Deferred(..)"
        );
    }
}
