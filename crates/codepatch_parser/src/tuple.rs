//! Parser for nested integer tuples such as `(1, (2, 3), 4)`.
//!
//! The grammar is deliberately tiny so that transformation behaviour can be
//! exercised without a real language in the way:
//!
//! ```text
//! program := group*
//! group   := "(" [ item ( DELIM item )* ] ")"
//! item    := INTEGER | group
//! ```
//!
//! Whitespace between tokens is ignored. The delimiter defaults to `,`.

use codepatch_ast::{NodeData, Span, SyntaxNode};
use serde::{Deserialize, Serialize};

use crate::{Outcome, ParseError, ParserConfiguration};

/// Node kind of the root.
pub const PROGRAM: &str = "program";
/// Node kind of a parenthesised group.
pub const GROUP: &str = "group";
/// Node kind of an integer literal.
pub const INTEGER: &str = "integer";

/// Options for [`TupleParser`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TupleOptions {
    /// Character separating the items of a group.
    pub delimiter: char,
}

impl Default for TupleOptions {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

impl TupleOptions {
    /// Creates options with a custom delimiter.
    pub fn with_delimiter(delimiter: char) -> Self {
        Self { delimiter }
    }

    fn validate(&self) -> Result<(), ParseError> {
        let d = self.delimiter;
        if d.is_ascii_digit() || d == '(' || d == ')' || d.is_whitespace() {
            return Err(ParseError::config(format!(
                "delimiter {d:?} collides with the tuple grammar"
            )));
        }
        Ok(())
    }
}

/// Nested integer tuple parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct TupleParser;

impl TupleParser {
    /// Creates a new tuple parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses `code` synchronously.
    pub fn parse_str(&self, code: &str, options: &TupleOptions) -> Result<SyntaxNode, ParseError> {
        options.validate()?;
        let tokens = tokenize(code, options.delimiter)?;
        Grammar {
            code,
            tokens: &tokens,
            pos: 0,
        }
        .program()
    }
}

impl ParserConfiguration for TupleParser {
    type Node = SyntaxNode;
    type Options = TupleOptions;

    fn name(&self) -> &str {
        "tuple"
    }

    fn parse(
        &self,
        code: &str,
        options: &TupleOptions,
    ) -> Outcome<Result<SyntaxNode, ParseError>> {
        Outcome::Immediate(self.parse_str(code, options))
    }

    fn is_node(&self, value: &SyntaxNode) -> bool {
        matches!(value.kind(), PROGRAM | GROUP | INTEGER)
    }

    fn collect_child_nodes(&self, node: &SyntaxNode) -> Vec<SyntaxNode> {
        node.children().to_vec()
    }

    fn get_node_location(&self, node: &SyntaxNode) -> Span {
        node.span()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Integer,
    Open,
    Close,
    Delimiter,
}

impl TokenKind {
    fn describe(self) -> &'static str {
        match self {
            TokenKind::Integer => "integer",
            TokenKind::Open => "opening paren",
            TokenKind::Close => "closing paren",
            TokenKind::Delimiter => "delimiter",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenKind,
    span: Span,
}

impl Token {
    fn unexpected(&self) -> ParseError {
        ParseError::invalid_source_at(
            format!(
                "Unexpected {} at offset {}",
                self.kind.describe(),
                self.span.start
            ),
            self.span.start as usize,
        )
    }
}

fn tokenize(code: &str, delimiter: char) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = code.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        let kind = match ch {
            '0'..='9' => {
                let mut end = start + 1;
                while let Some(&(i, '0'..='9')) = chars.peek() {
                    end = i + 1;
                    chars.next();
                }
                tokens.push(Token {
                    kind: TokenKind::Integer,
                    span: Span::new(start as u32, end as u32),
                });
                continue;
            }
            '(' => TokenKind::Open,
            ')' => TokenKind::Close,
            c if c == delimiter => TokenKind::Delimiter,
            c if c.is_whitespace() => continue,
            c => {
                return Err(ParseError::invalid_source_at(
                    format!("Unexpected character {c:?} at offset {start}"),
                    start,
                ));
            }
        };
        let end = start + ch.len_utf8();
        tokens.push(Token {
            kind,
            span: Span::new(start as u32, end as u32),
        });
    }

    Ok(tokens)
}

struct Grammar<'a> {
    code: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl Grammar<'_> {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied();
        self.pos += 1;
        token
    }

    fn program(&mut self) -> Result<SyntaxNode, ParseError> {
        let mut groups = Vec::new();
        while let Some(token) = self.next() {
            match token.kind {
                TokenKind::Open => groups.push(self.group(token.span)?),
                TokenKind::Integer => {
                    return Err(ParseError::invalid_source_at(
                        format!(
                            "Unexpected integer at offset {} outside of group",
                            token.span.start
                        ),
                        token.span.start as usize,
                    ));
                }
                _ => return Err(token.unexpected()),
            }
        }

        let span = match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => first.span.merge(&last.span),
            _ => Span::empty(0),
        };
        Ok(SyntaxNode::parent(PROGRAM, span, groups))
    }

    fn group(&mut self, open: Span) -> Result<SyntaxNode, ParseError> {
        let mut items = Vec::new();
        // After "(" or a delimiter an item is due; after an item a delimiter or ")".
        let mut expecting_item = true;

        loop {
            let Some(token) = self.next() else {
                return Err(ParseError::invalid_source_at(
                    "Unexpected end of input, missing closing paren",
                    self.code.len(),
                ));
            };

            match (token.kind, expecting_item) {
                (TokenKind::Close, _) if !expecting_item || items.is_empty() => {
                    return Ok(SyntaxNode::parent(GROUP, open.merge(&token.span), items));
                }
                (TokenKind::Integer, true) => {
                    items.push(self.integer(token)?);
                    expecting_item = false;
                }
                (TokenKind::Open, true) => {
                    items.push(self.group(token.span)?);
                    expecting_item = false;
                }
                (TokenKind::Delimiter, false) => expecting_item = true,
                _ => return Err(token.unexpected()),
            }
        }
    }

    fn integer(&self, token: Token) -> Result<SyntaxNode, ParseError> {
        let raw = &self.code[token.span.range()];
        let value: u64 = raw.parse().map_err(|_| {
            ParseError::invalid_source_at(
                format!("Integer {raw} at offset {} is out of range", token.span.start),
                token.span.start as usize,
            )
        })?;

        Ok(SyntaxNode::leaf(INTEGER, token.span)
            .with_value(raw)
            .with_data(NodeData::Integer(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(code: &str) -> Result<SyntaxNode, ParseError> {
        TupleParser::new().parse_str(code, &TupleOptions::default())
    }

    #[test]
    fn test_parse_flat_group() {
        let program = parse("(1, 5, 3)").unwrap();

        assert_eq!(program.kind(), PROGRAM);
        assert_eq!(program.span(), Span::new(0, 9));
        assert_eq!(program.children().len(), 1);

        let group = &program.children()[0];
        assert_eq!(group.kind(), GROUP);
        assert_eq!(group.span(), Span::new(0, 9));

        let values: Vec<_> = group
            .children()
            .iter()
            .map(|n| n.data().as_integer())
            .collect();
        assert_eq!(values, vec![Some(1), Some(5), Some(3)]);
        assert_eq!(group.children()[1].span(), Span::new(4, 5));
        assert_eq!(group.children()[1].value(), Some("5"));
    }

    #[test]
    fn test_parse_nested_groups() {
        let program = parse("(1, (2, 3), 4)").unwrap();
        let group = &program.children()[0];

        assert_eq!(group.children().len(), 3);
        let inner = &group.children()[1];
        assert_eq!(inner.kind(), GROUP);
        assert_eq!(inner.span(), Span::new(4, 10));
        assert_eq!(inner.children().len(), 2);
        assert_eq!(program.descendant_count(), 7);
    }

    #[test]
    fn test_parse_multiple_top_level_groups() {
        let program = parse(" (1) (2) ").unwrap();

        assert_eq!(program.span(), Span::new(1, 8));
        assert_eq!(program.children().len(), 2);
    }

    #[test]
    fn test_parse_empty_group() {
        let program = parse("()").unwrap();
        let group = &program.children()[0];

        assert_eq!(group.span(), Span::new(0, 2));
        assert!(!group.has_children());
    }

    #[test]
    fn test_parse_blank_input() {
        let program = parse("   ").unwrap();

        assert_eq!(program.span(), Span::empty(0));
        assert!(!program.has_children());
    }

    #[test]
    fn test_parse_multi_digit_integer() {
        let program = parse("(123,45)").unwrap();
        let group = &program.children()[0];

        assert_eq!(group.children()[0].value(), Some("123"));
        assert_eq!(group.children()[0].span(), Span::new(1, 4));
        assert_eq!(group.children()[1].data(), &NodeData::Integer(45));
    }

    #[test]
    fn test_parse_custom_delimiter() {
        let options = TupleOptions::with_delimiter('/');
        let program = TupleParser::new().parse_str("(1/2/3)", &options).unwrap();
        assert_eq!(program.children()[0].children().len(), 3);

        let err = TupleParser::new()
            .parse_str("(1,2,3)", &options)
            .unwrap_err();
        assert_eq!(err.offset(), Some(2));
    }

    #[rstest]
    #[case::outside_group("1,2,3", "Unexpected integer at offset 0 outside of group")]
    #[case::unclosed("(1,2,3", "Unexpected end of input, missing closing paren")]
    #[case::unknown_char("(1/2)", "Unexpected character '/' at offset 2")]
    #[case::missing_delimiter("(1 2)", "Unexpected integer at offset 3")]
    #[case::top_level_delimiter("(1), (2)", "Unexpected delimiter at offset 3")]
    #[case::trailing_delimiter("(1,)", "Unexpected closing paren at offset 3")]
    #[case::doubled_delimiter("(1,,2)", "Unexpected delimiter at offset 3")]
    #[case::leading_delimiter("(,1)", "Unexpected delimiter at offset 1")]
    #[case::stray_close(")", "Unexpected closing paren at offset 0")]
    #[case::group_after_item("(1 (2))", "Unexpected opening paren at offset 3")]
    fn test_parse_rejects(#[case] code: &str, #[case] message: &str) {
        match parse(code) {
            Err(ParseError::InvalidSource { message: actual, .. }) => assert_eq!(actual, message),
            other => panic!("expected invalid source, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_integer_out_of_range() {
        let err = parse("(99999999999999999999999)").unwrap_err();
        assert_eq!(err.offset(), Some(1));
    }

    #[rstest]
    #[case::digit('7')]
    #[case::open_paren('(')]
    #[case::close_paren(')')]
    #[case::space(' ')]
    fn test_invalid_delimiter(#[case] delimiter: char) {
        let err = TupleParser::new()
            .parse_str("(1)", &TupleOptions::with_delimiter(delimiter))
            .unwrap_err();
        assert!(matches!(err, ParseError::Config(_)));
    }

    #[test]
    fn test_options_from_json() {
        let options: TupleOptions = serde_json::from_str(r#"{"delimiter":";"}"#).unwrap();
        assert_eq!(options.delimiter, ';');

        let defaulted: TupleOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(defaulted, TupleOptions::default());

        assert!(serde_json::from_str::<TupleOptions>(r#"{"separator":";"}"#).is_err());
    }

    #[test]
    fn test_is_node() {
        let parser = TupleParser::new();
        let program = parse("(1)").unwrap();

        assert!(parser.is_node(&program));
        assert!(parser.is_node(&program.children()[0].children()[0]));
        assert!(!parser.is_node(&SyntaxNode::leaf("paragraph", Span::empty(0))));
    }

    #[test]
    fn test_parse_is_immediate() {
        let outcome = TupleParser::new().parse("(1)", &TupleOptions::default());
        assert!(!outcome.is_deferred());
    }
}
