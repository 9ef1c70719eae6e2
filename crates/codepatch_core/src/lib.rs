//! # codepatch_core
//!
//! Parser-agnostic code transformation engine.
//!
//! This crate provides:
//! - The `Modifier` binding: one per grammar adapter, reused across runs
//! - Post-order traversal that stays synchronous until a manipulator or the
//!   parser returns a deferred value
//! - Node helpers to read, climb and override nodes while they are visited
//! - An incremental text buffer rendering the edited code and a v3 source map
//!
//! ## Example
//!
//! ```rust
//! use codepatch_core::{Modifier, TransformError};
//! use codepatch_parser::TupleParser;
//!
//! let modifier = Modifier::new(TupleParser::new());
//!
//! // Repeat the digits of every integer.
//! let outcome = modifier.transform("(1, (2, 3))", |node, helpers| {
//!     if node.is("integer") {
//!         let source = helpers.source()?;
//!         helpers.override_with(&format!("{source}{source}"))?;
//!     }
//!     Ok::<_, TransformError>(())
//! });
//!
//! let output = outcome.try_into_immediate().ok().unwrap().unwrap();
//! assert_eq!(output.to_string(), "(11, (22, 33))");
//! ```

mod buffer;
mod error;
mod helpers;
mod modifier;
mod options;
mod result;
mod run;
mod source_map;
mod store;
mod traversal;

pub use error::TransformError;
pub use helpers::{NodeHelpers, NodeRef};
pub use modifier::{Modifier, TransformOutcome};
pub use options::{Resolution, SourceMapOptions, TransformOptions};
pub use result::TransformOutput;
pub use source_map::SourceMap;
pub use store::{NodeState, RunId};
pub use traversal::ManipulatorResult;

pub use codepatch_parser::Outcome;
