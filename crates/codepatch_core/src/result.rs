//! Transformation output.

use std::fmt;

use crate::source_map::SourceMap;

/// The spliced text and its source map.
///
/// `Display` writes the code.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    code: String,
    map: SourceMap,
}

impl TransformOutput {
    pub(crate) fn new(code: String, map: SourceMap) -> Self {
        Self { code, map }
    }

    /// The transformed text.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Source map from the transformed text back to the input.
    pub fn map(&self) -> &SourceMap {
        &self.map
    }

    pub fn into_parts(self) -> (String, SourceMap) {
        (self.code, self.map)
    }
}

impl fmt::Display for TransformOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}
