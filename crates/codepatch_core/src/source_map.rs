//! Revision 3 source map generation.
//!
//! The rendered buffer is walked piece by piece and every mapping is handed
//! to [`SourceMapBuilder`]. Columns are counted in UTF-16 code units, as
//! consumers of source maps expect.

use std::fmt;

use sourcemap::SourceMapBuilder;

use crate::TransformError;
use crate::buffer::{Piece, TextBuffer};
use crate::options::{Resolution, SourceMapOptions};

/// A revision 3 source map from the transformed code back to the input.
///
/// `Display` writes the map as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMap {
    map: sourcemap::SourceMap,
    json: String,
}

impl SourceMap {
    /// The map as a JSON string.
    pub fn to_json(&self) -> String {
        self.json.clone()
    }

    /// Basename of the generated file, if one was configured.
    pub fn file(&self) -> Option<&str> {
        self.map.get_file()
    }

    /// The single original source.
    pub fn source(&self) -> Option<&str> {
        self.map.get_source(0)
    }

    /// The embedded original text, when `include_content` was set.
    pub fn source_content(&self) -> Option<&str> {
        self.map.get_source_contents(0)
    }

    /// Original `(line, column)` for a generated position, both zero-based.
    pub fn lookup(&self, line: u32, column: u32) -> Option<(u32, u32)> {
        self.map.lookup_token(line, column).map(|token| token.get_src())
    }

    /// The underlying [`sourcemap::SourceMap`].
    pub fn as_raw(&self) -> &sourcemap::SourceMap {
        &self.map
    }
}

impl fmt::Display for SourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.json)
    }
}

/// Builds the map for the buffer's current state.
pub(crate) fn generate(
    buffer: &TextBuffer,
    options: &SourceMapOptions,
) -> Result<SourceMap, TransformError> {
    let original = buffer.original();
    let file = options
        .file
        .as_deref()
        .and_then(|file| file.split(['/', '\\']).next_back());
    let source = options
        .source
        .as_deref()
        .or(options.file.as_deref())
        .unwrap_or_default();

    let mut builder = SourceMapBuilder::new(file);
    let source_id = builder.add_source(source);
    if options.include_content {
        builder.set_source_contents(source_id, Some(original));
    }

    let mut tokens = Tokens::new(builder, source_id, options.hires);
    let mut loc = Location::default();
    for piece in buffer.all_pieces() {
        match piece {
            Piece::Inserted(text) => tokens.advance(text),
            Piece::Replaced { text, origin } => {
                tokens.add_edit(text, loc);
                loc.advance(&original[origin.range()]);
            }
            Piece::Original { text, .. } => tokens.add_unedited(text, &mut loc),
        }
    }

    let map = tokens.builder.into_sourcemap();
    let mut json = Vec::new();
    map.to_writer(&mut json)?;
    let json = String::from_utf8(json).map_err(|e| TransformError::source_map(e.to_string()))?;
    Ok(SourceMap { map, json })
}

/// Line and column in the original text.
#[derive(Debug, Clone, Copy, Default)]
struct Location {
    line: u32,
    column: u32,
}

impl Location {
    fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += ch.len_utf16() as u32;
            }
        }
    }
}

/// Generated position plus the builder receiving the mappings.
struct Tokens {
    builder: SourceMapBuilder,
    source: u32,
    resolution: Resolution,
    line: u32,
    column: u32,
}

impl Tokens {
    fn new(builder: SourceMapBuilder, source: u32, resolution: Resolution) -> Self {
        Self {
            builder,
            source,
            resolution,
            line: 0,
            column: 0,
        }
    }

    fn push(&mut self, loc: Location) {
        self.builder.add_raw(
            self.line,
            self.column,
            loc.line,
            loc.column,
            Some(self.source),
            None,
            false,
        );
    }

    fn newline(&mut self) {
        self.line += 1;
        self.column = 0;
    }

    fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.newline();
            } else {
                self.column += ch.len_utf16() as u32;
            }
        }
    }

    /// One mapping at the start of the replacement and one per further line,
    /// not counting an empty last line.
    fn add_edit(&mut self, text: &str, loc: Location) {
        if text.is_empty() {
            return;
        }

        let mut rest = text;
        while let Some(newline) = rest.find('\n') {
            if newline + 1 == rest.len() {
                break;
            }
            self.push(loc);
            self.newline();
            rest = &rest[newline + 1..];
        }
        self.push(loc);
        self.advance(rest);
    }

    fn add_unedited(&mut self, text: &str, loc: &mut Location) {
        let mut first = true;
        let mut in_word = false;

        for ch in text.chars() {
            if ch == '\n' {
                loc.line += 1;
                loc.column = 0;
                self.newline();
                first = true;
                in_word = false;
                continue;
            }

            match self.resolution {
                Resolution::Coarse => {
                    if first {
                        self.push(*loc);
                    }
                }
                Resolution::Characters => self.push(*loc),
                Resolution::Boundary => {
                    let word = ch.is_ascii_alphanumeric() || ch == '_';
                    if !word || !in_word {
                        self.push(*loc);
                    }
                    in_word = word;
                }
            }

            let width = ch.len_utf16() as u32;
            loc.column += width;
            self.column += width;
            first = false;
        }
    }
}
