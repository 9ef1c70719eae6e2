//! Incremental text buffer.
//!
//! The original text is never modified. Edits are recorded as replacements
//! (non-empty original ranges with new text) and insertions (text queued
//! before an original position). Reading a span or rendering the whole
//! buffer splices them in on demand.

use std::collections::BTreeMap;
use std::ops::Bound;

use codepatch_ast::Span;

use crate::TransformError;

#[derive(Debug, Clone)]
struct Replacement {
    end: u32,
    text: String,
}

/// A contiguous piece of the rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece<'a> {
    /// Text inserted before an original position.
    Inserted(&'a str),
    /// Text replacing the original range `origin`.
    Replaced { text: &'a str, origin: Span },
    /// Unedited original text.
    Original { text: &'a str, start: u32 },
}

impl Piece<'_> {
    pub(crate) fn text(&self) -> &str {
        match self {
            Piece::Inserted(text) => text,
            Piece::Replaced { text, .. } => text,
            Piece::Original { text, .. } => text,
        }
    }
}

/// Original text plus pending edits.
#[derive(Debug, Clone)]
pub(crate) struct TextBuffer {
    original: String,
    /// Keyed by start offset. Ranges never overlap.
    replacements: BTreeMap<u32, Replacement>,
    /// Keyed by the original offset the text is inserted before.
    insertions: BTreeMap<u32, String>,
}

impl TextBuffer {
    pub(crate) fn new(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            replacements: BTreeMap::new(),
            insertions: BTreeMap::new(),
        }
    }

    pub(crate) fn original(&self) -> &str {
        &self.original
    }

    pub(crate) fn len(&self) -> u32 {
        self.original.len() as u32
    }

    /// Returns true if no edit has been recorded.
    pub(crate) fn is_pristine(&self) -> bool {
        self.replacements.is_empty() && self.insertions.is_empty()
    }

    /// The replacement whose range strictly contains `offset`, if any.
    fn straddling(&self, offset: u32) -> Option<Span> {
        self.replacements
            .range(..offset)
            .next_back()
            .filter(|(_, r)| offset < r.end)
            .map(|(&start, r)| Span::new(start, r.end))
    }

    fn check_edges(&self, span: Span) -> Result<(), TransformError> {
        for edge in [span.start, span.end] {
            if let Some(existing) = self.straddling(edge) {
                return Err(TransformError::OverlappingEdit { span, existing });
            }
        }
        Ok(())
    }

    /// Replaces the current content of a non-empty span.
    ///
    /// Edits fully inside `span`, and insertions queued at `span.start`,
    /// are discarded.
    pub(crate) fn overwrite(&mut self, span: Span, text: &str) -> Result<(), TransformError> {
        debug_assert!(!span.is_empty());
        self.check_edges(span)?;

        let covered: Vec<u32> = self
            .replacements
            .range(span.start..span.end)
            .map(|(&start, _)| start)
            .collect();
        for start in covered {
            self.replacements.remove(&start);
        }
        let queued: Vec<u32> = self
            .insertions
            .range(span.start..span.end)
            .map(|(&at, _)| at)
            .collect();
        for at in queued {
            self.insertions.remove(&at);
        }

        self.replacements.insert(
            span.start,
            Replacement {
                end: span.end,
                text: text.to_string(),
            },
        );
        Ok(())
    }

    /// Queues `text` before original offset `at`, after anything already
    /// queued there.
    pub(crate) fn insert(&mut self, at: u32, text: &str) -> Result<(), TransformError> {
        if let Some(existing) = self.straddling(at) {
            return Err(TransformError::OverlappingEdit {
                span: Span::empty(at),
                existing,
            });
        }
        if !text.is_empty() {
            self.insertions.entry(at).or_default().push_str(text);
        }
        Ok(())
    }

    /// Current content of `span`.
    pub(crate) fn slice(&self, span: Span) -> Result<String, TransformError> {
        self.check_edges(span)?;
        Ok(self.pieces(span).iter().map(Piece::text).collect())
    }

    /// The pieces making up the current content of `span`.
    ///
    /// Insertions at `span.start` are included; those at `span.end` are not,
    /// unless the span is empty. Callers must have checked the span edges.
    pub(crate) fn pieces(&self, span: Span) -> Vec<Piece<'_>> {
        let mut pieces = Vec::new();
        if let Some(text) = self.insertions.get(&span.start) {
            pieces.push(Piece::Inserted(text));
        }

        let mut pos = span.start;
        while pos < span.end {
            if let Some(replacement) = self.replacements.get(&pos) {
                pieces.push(Piece::Replaced {
                    text: &replacement.text,
                    origin: Span::new(pos, replacement.end),
                });
                pos = replacement.end;
            } else {
                let next = self.next_event(pos).min(span.end);
                pieces.push(Piece::Original {
                    text: &self.original[pos as usize..next as usize],
                    start: pos,
                });
                pos = next;
            }

            if pos < span.end
                && let Some(text) = self.insertions.get(&pos)
            {
                pieces.push(Piece::Inserted(text));
            }
        }

        pieces
    }

    /// Every piece of the rendered output, including trailing insertions.
    pub(crate) fn all_pieces(&self) -> Vec<Piece<'_>> {
        let end = self.len();
        let mut pieces = self.pieces(Span::new(0, end));
        if end > 0
            && let Some(text) = self.insertions.get(&end)
        {
            pieces.push(Piece::Inserted(text));
        }
        pieces
    }

    /// Renders the full spliced text.
    pub(crate) fn to_code(&self) -> String {
        self.all_pieces().iter().map(Piece::text).collect()
    }

    /// First replacement start or insertion offset after `pos`.
    fn next_event(&self, pos: u32) -> u32 {
        let after = (Bound::Excluded(pos), Bound::Unbounded);
        let replacement = self.replacements.range(after).next().map(|(&s, _)| s);
        let insertion = self.insertions.range(after).next().map(|(&s, _)| s);
        [replacement, insertion]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(u32::MAX)
    }
}
