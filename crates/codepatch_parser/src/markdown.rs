//! Markdown parser using markdown-rs (wooorm/markdown-rs).
//!
//! This parser converts mdast into [`SyntaxNode`] trees. Node kinds are the
//! mdast type names (`root`, `paragraph`, `heading`, `text`, ...), spans are
//! the byte offsets markdown-rs reports.

use markdown::mdast::Node;
use markdown::{ParseOptions, to_mdast};
use serde::{Deserialize, Serialize};
use tracing::trace;

use codepatch_ast::{NodeData, Span, SyntaxNode};

use crate::{Outcome, ParseError, ParserConfiguration};

/// Options for [`MarkdownParser`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownOptions {
    /// GitHub Flavored Markdown (tables, strikethrough, footnotes, ...).
    /// Plain CommonMark when false.
    pub gfm: bool,
    /// YAML / TOML frontmatter.
    pub frontmatter: bool,
    /// `$inline$` and `$$` block math.
    pub math: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            frontmatter: false,
            math: false,
        }
    }
}

impl MarkdownOptions {
    fn to_parse_options(&self) -> ParseOptions {
        let mut options = if self.gfm {
            ParseOptions::gfm()
        } else {
            ParseOptions::default()
        };
        options.constructs.frontmatter = self.frontmatter;
        options.constructs.math_flow = self.math;
        options.constructs.math_text = self.math;
        options
    }
}

/// Markdown parser implementation.
///
/// Uses `markdown-rs` for parsing, which supports:
/// - CommonMark
/// - GFM (GitHub Flavored Markdown)
/// - Math (optional)
/// - Frontmatter (optional)
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownParser;

impl MarkdownParser {
    /// Creates a new Markdown parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses `source` synchronously.
    pub fn parse_str(
        &self,
        source: &str,
        options: &MarkdownOptions,
    ) -> Result<SyntaxNode, ParseError> {
        let mdast = to_mdast(source, &options.to_parse_options())
            .map_err(|e| ParseError::invalid_source(e.to_string()))?;

        Ok(self.convert_node(&mdast))
    }

    /// Converts an mdast node to SyntaxNode.
    fn convert_node(&self, node: &Node) -> SyntaxNode {
        let children = node
            .children()
            .map(|children| children.iter().map(|c| self.convert_node(c)).collect())
            .unwrap_or_default();

        let mut converted = SyntaxNode::parent(Self::kind(node), Self::node_span(node), children);
        if let Some(value) = Self::value(node) {
            converted = converted.with_value(value);
        }
        match Self::data(node) {
            NodeData::None => converted,
            data => converted.with_data(data),
        }
    }

    fn kind(node: &Node) -> &'static str {
        match node {
            Node::Root(_) => "root",
            Node::Paragraph(_) => "paragraph",
            Node::Heading(_) => "heading",
            Node::Text(_) => "text",
            Node::Emphasis(_) => "emphasis",
            Node::Strong(_) => "strong",
            Node::Delete(_) => "delete",
            Node::InlineCode(_) => "inlineCode",
            Node::Code(_) => "code",
            Node::Link(_) => "link",
            Node::Image(_) => "image",
            Node::LinkReference(_) => "linkReference",
            Node::ImageReference(_) => "imageReference",
            Node::Definition(_) => "definition",
            Node::List(_) => "list",
            Node::ListItem(_) => "listItem",
            Node::Blockquote(_) => "blockquote",
            Node::ThematicBreak(_) => "thematicBreak",
            Node::Break(_) => "break",
            Node::Html(_) => "html",
            Node::Table(_) => "table",
            Node::TableRow(_) => "tableRow",
            Node::TableCell(_) => "tableCell",
            Node::FootnoteDefinition(_) => "footnoteDefinition",
            Node::FootnoteReference(_) => "footnoteReference",
            Node::Math(_) => "math",
            Node::InlineMath(_) => "inlineMath",
            Node::Yaml(_) => "yaml",
            Node::Toml(_) => "toml",
            other => {
                trace!(?other, "unmapped mdast node");
                "unknown"
            }
        }
    }

    fn value(node: &Node) -> Option<&str> {
        match node {
            Node::Text(n) => Some(&n.value),
            Node::InlineCode(n) => Some(&n.value),
            Node::Code(n) => Some(&n.value),
            Node::Html(n) => Some(&n.value),
            Node::Math(n) => Some(&n.value),
            Node::InlineMath(n) => Some(&n.value),
            Node::Yaml(n) => Some(&n.value),
            Node::Toml(n) => Some(&n.value),
            _ => None,
        }
    }

    fn data(node: &Node) -> NodeData {
        match node {
            Node::Heading(heading) => NodeData::Heading(heading.depth),
            Node::List(list) => NodeData::List(list.ordered),
            Node::Code(code) => NodeData::Code(code.lang.clone()),
            Node::Link(link) => NodeData::link(&link.url, link.title.clone()),
            Node::Image(image) => NodeData::link(&image.url, image.title.clone()),
            Node::Definition(def) => NodeData::link(&def.url, def.title.clone()),
            _ => NodeData::None,
        }
    }

    /// Gets the span for an mdast node.
    fn node_span(node: &Node) -> Span {
        if let Some(pos) = node.position() {
            Span::new(pos.start.offset as u32, pos.end.offset as u32)
        } else {
            Span::new(0, 0)
        }
    }
}

impl ParserConfiguration for MarkdownParser {
    type Node = SyntaxNode;
    type Options = MarkdownOptions;

    fn name(&self) -> &str {
        "markdown"
    }

    fn parse(
        &self,
        code: &str,
        options: &MarkdownOptions,
    ) -> Outcome<Result<SyntaxNode, ParseError>> {
        Outcome::Immediate(self.parse_str(code, options))
    }

    fn collect_child_nodes(&self, node: &SyntaxNode) -> Vec<SyntaxNode> {
        node.children().to_vec()
    }

    fn get_node_location(&self, node: &SyntaxNode) -> Span {
        node.span()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> SyntaxNode {
        MarkdownParser::new()
            .parse_str(source, &MarkdownOptions::default())
            .unwrap()
    }

    #[test]
    fn test_parse_simple_markdown() {
        let ast = parse("# Hello\n\nThis is a paragraph.");

        assert_eq!(ast.kind(), "root");
        assert!(ast.has_children());
    }

    #[test]
    fn test_parse_heading() {
        let ast = parse("# Level 1\n\n## Level 2");

        assert_eq!(ast.children().len(), 2);
        assert_eq!(ast.children()[0].kind(), "heading");
        assert_eq!(ast.children()[0].data(), &NodeData::Heading(1));
        assert_eq!(ast.children()[1].data(), &NodeData::Heading(2));
    }

    #[test]
    fn test_parse_link_with_title() {
        let ast = parse("[Link](https://example.com \"Example Title\")");

        // Root > Paragraph > Link
        let link = &ast.children()[0].children()[0];

        assert_eq!(link.kind(), "link");
        assert_eq!(
            link.data(),
            &NodeData::link("https://example.com", Some("Example Title".to_string()))
        );
    }

    #[test]
    fn test_parse_empty_document() {
        let ast = parse("");

        assert_eq!(ast.kind(), "root");
        assert!(ast.children().is_empty());
    }

    #[test]
    fn test_parse_code_block() {
        let ast = parse("```rust\nfn main() {}\n```");

        let code_block = &ast.children()[0];
        assert_eq!(code_block.kind(), "code");
        assert_eq!(code_block.data(), &NodeData::Code(Some("rust".to_string())));
        assert_eq!(code_block.value(), Some("fn main() {}"));
    }

    #[test]
    fn test_parse_inline_code_value() {
        let ast = parse("Use `code` here");

        let inline = ast.children()[0]
            .children()
            .iter()
            .find(|c| c.is("inlineCode"))
            .cloned()
            .unwrap();
        assert_eq!(inline.value(), Some("code"));
        assert_eq!(inline.span(), Span::new(4, 10));
    }

    #[test]
    fn test_parse_ordered_list() {
        let ast = parse("1. First\n2. Second\n3. Third");

        let list = &ast.children()[0];
        assert_eq!(list.kind(), "list");
        assert_eq!(list.data(), &NodeData::List(true));
        assert_eq!(list.children().len(), 3);
        assert!(list.children().iter().all(|item| item.is("listItem")));
    }

    #[test]
    fn test_parse_strikethrough_requires_gfm() {
        let with_gfm = parse("~~deleted~~");
        assert!(with_gfm.children()[0].children()[0].is("delete"));

        let options = MarkdownOptions {
            gfm: false,
            ..MarkdownOptions::default()
        };
        let without = MarkdownParser::new()
            .parse_str("~~deleted~~", &options)
            .unwrap();
        assert!(!without.children()[0].children()[0].is("delete"));
    }

    #[test]
    fn test_parse_frontmatter() {
        let options = MarkdownOptions {
            frontmatter: true,
            ..MarkdownOptions::default()
        };
        let ast = MarkdownParser::new()
            .parse_str("---\ntitle: x\n---\n\nBody", &options)
            .unwrap();

        assert_eq!(ast.children()[0].kind(), "yaml");
        assert_eq!(ast.children()[0].value(), Some("title: x"));
    }

    #[test]
    fn test_parse_math() {
        let options = MarkdownOptions {
            math: true,
            ..MarkdownOptions::default()
        };
        let ast = MarkdownParser::new()
            .parse_str("Energy $E=mc^2$", &options)
            .unwrap();

        let paragraph = &ast.children()[0];
        assert!(paragraph.children().iter().any(|c| c.is("inlineMath")));
    }

    #[test]
    fn test_span_positions() {
        let ast = parse("Hello");

        assert_eq!(ast.span(), Span::new(0, 5));
    }

    #[test]
    fn test_parser_name() {
        assert_eq!(MarkdownParser::new().name(), "markdown");
    }

    #[test]
    fn test_options_from_json() {
        let options: MarkdownOptions = serde_json::from_str(r#"{"math":true}"#).unwrap();
        assert!(options.gfm);
        assert!(options.math);
        assert!(!options.frontmatter);
    }
}
