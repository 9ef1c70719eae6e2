//! Transformation error types.

use thiserror::Error;

use codepatch_ast::Span;
use codepatch_parser::ParseError;

/// Errors that can occur during a transformation run.
#[derive(Debug, Clone, PartialEq, Eq, Error, miette::Diagnostic)]
pub enum TransformError {
    /// The grammar adapter failed to parse the input.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// An override targeted a node whose manipulator already completed.
    #[error("Cannot override node at {span}: it has already been handled")]
    #[diagnostic(help(
        "overrides must happen while the node's manipulator is still running"
    ))]
    NodeAlreadyHandled {
        /// Span of the rejected node.
        span: Span,
    },

    /// The node belongs to a run that is no longer in flight.
    #[error("The run this node belongs to has already finished")]
    RunFinished,

    /// An edit would cut through an existing replacement.
    #[error("Edit at {span} partially overlaps the existing edit at {existing}")]
    OverlappingEdit {
        /// Span of the rejected edit.
        span: Span,
        /// Span of the replacement it collides with.
        existing: Span,
    },

    /// The adapter reported a location outside the parsed code.
    #[error("Node location {span} is not a valid range of the {len}-byte input")]
    InvalidSpan {
        /// The reported span.
        span: Span,
        /// Length of the input in bytes.
        len: usize,
    },

    /// The source map could not be built or serialized.
    #[error("Source map error: {0}")]
    SourceMap(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The manipulator reported a failure.
    #[error("Manipulator error: {0}")]
    Manipulator(String),
}

impl TransformError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a manipulator error.
    pub fn manipulator(message: impl Into<String>) -> Self {
        Self::Manipulator(message.into())
    }

    pub(crate) fn source_map(message: impl Into<String>) -> Self {
        Self::SourceMap(message.into())
    }
}

// `sourcemap::Error` is neither `Clone` nor `Eq`, so only its message is kept.
impl From<sourcemap::Error> for TransformError {
    fn from(err: sourcemap::Error) -> Self {
        Self::source_map(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_conversion() {
        let err: TransformError = ParseError::invalid_source("bad").into();
        assert_eq!(err.to_string(), "Parse error: Invalid source: bad");
    }

    #[test]
    fn test_node_already_handled_display() {
        let err = TransformError::NodeAlreadyHandled {
            span: Span::new(0, 7),
        };
        assert_eq!(
            err.to_string(),
            "Cannot override node at [0, 7): it has already been handled"
        );
    }

    #[test]
    fn test_source_map_error_conversion() {
        let err: TransformError = sourcemap::Error::BadJson(
            serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        )
        .into();
        assert!(matches!(err, TransformError::SourceMap(_)));
        assert!(err.to_string().starts_with("Source map error: "));
    }

    #[test]
    fn test_overlapping_edit_display() {
        let err = TransformError::OverlappingEdit {
            span: Span::new(2, 6),
            existing: Span::new(4, 8),
        };
        assert_eq!(
            err.to_string(),
            "Edit at [2, 6) partially overlaps the existing edit at [4, 8)"
        );
    }
}
