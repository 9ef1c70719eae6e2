//! Per-run options.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::TransformError;

/// Options for one transformation run.
///
/// `parser` is forwarded verbatim to the grammar adapter; `source_map`
/// controls map generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    rename_all = "camelCase",
    deny_unknown_fields,
    bound(
        serialize = "O: Serialize",
        deserialize = "O: Deserialize<'de> + Default"
    )
)]
pub struct TransformOptions<O> {
    /// Adapter-specific options.
    pub parser: O,
    /// Source map generation options.
    pub source_map: SourceMapOptions,
}

impl<O> TransformOptions<O> {
    /// Creates options with the given parser options and default map options.
    pub fn with_parser(parser: O) -> Self {
        Self {
            parser,
            source_map: SourceMapOptions::default(),
        }
    }

    /// Replaces the source map options.
    pub fn source_map(mut self, source_map: SourceMapOptions) -> Self {
        self.source_map = source_map;
        self
    }
}

impl<O: DeserializeOwned + Default> TransformOptions<O> {
    /// Loads options from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TransformError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| TransformError::config(format!("Failed to read options: {}", e)))?;

        Self::from_json(&content)
    }

    /// Parses options from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, TransformError> {
        serde_json::from_str(json)
            .map_err(|e| TransformError::config(format!("Invalid options: {}", e)))
    }
}

/// Options controlling source map generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SourceMapOptions {
    /// Mapping granularity. `false`, `true` or `"boundary"` in JSON.
    pub hires: Resolution,
    /// Name of the generated file. Only its basename is written to the map.
    pub file: Option<String>,
    /// Name of the original file.
    pub source: Option<String>,
    /// Embed the original text as `sourcesContent`.
    pub include_content: bool,
}

/// Granularity of unedited-text mappings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawResolution", into = "RawResolution")]
pub enum Resolution {
    /// One segment per line and per edit.
    #[default]
    Coarse,
    /// One segment per character.
    Characters,
    /// One segment per word start and per non-word character.
    Boundary,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawResolution {
    Flag(bool),
    Named(String),
}

impl TryFrom<RawResolution> for Resolution {
    type Error = String;

    fn try_from(raw: RawResolution) -> Result<Self, Self::Error> {
        match raw {
            RawResolution::Flag(false) => Ok(Self::Coarse),
            RawResolution::Flag(true) => Ok(Self::Characters),
            RawResolution::Named(name) if name == "boundary" => Ok(Self::Boundary),
            RawResolution::Named(name) => Err(format!(
                "invalid hires value {name:?}, expected true, false or \"boundary\""
            )),
        }
    }
}

impl From<Resolution> for RawResolution {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Coarse => Self::Flag(false),
            Resolution::Characters => Self::Flag(true),
            Resolution::Boundary => Self::Named("boundary".to_string()),
        }
    }
}
