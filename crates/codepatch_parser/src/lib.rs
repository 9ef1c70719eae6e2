//! # codepatch_parser
//!
//! Grammar adapter layer for codepatch.
//!
//! This crate provides:
//! - The `ParserConfiguration` trait every grammar adapter implements
//! - `Outcome`, the immediate-or-deferred value returned by parsing and by
//!   manipulators
//! - Built-in adapters: nested integer tuples and Markdown (`markdown-rs`)
//!
//! ## Example
//!
//! ```rust
//! use codepatch_parser::{ParserConfiguration, TupleOptions, TupleParser};
//!
//! let parser = TupleParser::new();
//! let root = parser
//!     .parse("(1, (2, 3))", &TupleOptions::default())
//!     .try_into_immediate()
//!     .ok()
//!     .and_then(Result::ok)
//!     .unwrap();
//!
//! assert_eq!(parser.collect_child_nodes(&root).len(), 1);
//! ```

mod error;
mod markdown;
mod outcome;
mod traits;
pub mod tuple;

pub use error::ParseError;
pub use markdown::{MarkdownOptions, MarkdownParser};
pub use outcome::Outcome;
pub use traits::ParserConfiguration;
pub use tuple::{TupleOptions, TupleParser};
