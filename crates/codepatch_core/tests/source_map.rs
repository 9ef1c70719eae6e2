//! Output rendering and source maps.

mod support;

use std::io::Write;

use codepatch_core::{
    Modifier, Resolution, SourceMap, SourceMapOptions, TransformError, TransformOptions,
};
use codepatch_parser::{MarkdownOptions, MarkdownParser, TupleOptions, TupleParser};
use pretty_assertions::assert_eq;
use rstest::rstest;

use support::immediate;

fn twenty_two(
    node: &codepatch_core::NodeRef<TupleParser>,
    helpers: &codepatch_core::NodeHelpers<TupleParser>,
) -> Result<(), TransformError> {
    if node.data().as_integer() == Some(2) {
        helpers.override_with("22")?;
    }
    Ok(())
}

fn mappings(map: &SourceMap) -> String {
    let json: serde_json::Value = serde_json::from_str(&map.to_json()).unwrap();
    json["mappings"].as_str().unwrap().to_string()
}

fn with_map(source_map: SourceMapOptions) -> TransformOptions<TupleOptions> {
    TransformOptions::default().source_map(source_map)
}

#[rstest]
#[case::coarse(Resolution::Coarse, "AAAA,GAAG,EAAC")]
#[case::characters(Resolution::Characters, "AAAA,CAAC,CAAC,CAAC,EAAC,CAAC,CAAC")]
fn test_mappings_for_single_edit(#[case] hires: Resolution, #[case] expected: &str) {
    let modifier = Modifier::new(TupleParser::new());
    let options = with_map(SourceMapOptions {
        hires,
        ..SourceMapOptions::default()
    });

    let output = immediate(modifier.transform_with("(1,2,3)", options, twenty_two));

    assert_eq!(output.code(), "(1,22,3)");
    assert_eq!(mappings(output.map()), expected);
}

#[test]
fn test_map_json() {
    let modifier = Modifier::new(TupleParser::new());
    let options = with_map(SourceMapOptions {
        hires: Resolution::Characters,
        file: Some("out/tuple.min".to_string()),
        source: Some("tuple.txt".to_string()),
        include_content: true,
    });

    let output = immediate(modifier.transform_with("(1,2,3)", options, twenty_two));

    insta::assert_snapshot!(
        output.map().to_json(),
        @r#"{"version":3,"file":"tuple.min","sources":["tuple.txt"],"sourcesContent":["(1,2,3)"],"names":[],"mappings":"AAAA,CAAC,CAAC,CAAC,EAAC,CAAC,CAAC"}"#
    );
}

#[test]
fn test_map_defaults() {
    let modifier = Modifier::new(TupleParser::new());

    let output = immediate(modifier.transform("(1)", |_, _| {}));

    let map = output.map();
    assert_eq!(map.as_raw().get_source_count(), 1);
    assert_eq!(map.file(), None);
    assert_eq!(map.source(), Some(""));
    assert_eq!(map.source_content(), None);
    assert_eq!(mappings(map), "AAAA");
}

#[test]
fn test_map_source_falls_back_to_file() {
    let modifier = Modifier::new(TupleParser::new());
    let options = with_map(SourceMapOptions {
        file: Some("build/out.txt".to_string()),
        ..SourceMapOptions::default()
    });

    let output = immediate(modifier.transform_with("(1)", options, twenty_two));

    assert_eq!(output.map().file(), Some("out.txt"));
    assert_eq!(output.map().source(), Some("build/out.txt"));
}

#[test]
fn test_options_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "sourceMap": {{ "hires": "boundary" }} }}"#).unwrap();

    let options = TransformOptions::<TupleOptions>::from_file(file.path()).unwrap();
    assert_eq!(options.source_map.hires, Resolution::Boundary);

    let modifier = Modifier::new(TupleParser::new());
    let output = immediate(modifier.transform_with("(10,200)", options, twenty_two));

    assert_eq!(mappings(output.map()), "AAAA,CAAC,EAAE,CAAC,GAAG");
}

#[test]
fn test_lookup_maps_back_across_edit() {
    let modifier = Modifier::new(TupleParser::new());
    let options = with_map(SourceMapOptions {
        hires: Resolution::Characters,
        ..SourceMapOptions::default()
    });

    let output = immediate(modifier.transform_with("(1,2,3)", options, twenty_two));

    // "(1,22,3)": both digits of "22" come from the original "2".
    assert_eq!(output.map().lookup(0, 3), Some((0, 3)));
    assert_eq!(output.map().lookup(0, 4), Some((0, 3)));
    assert_eq!(output.map().lookup(0, 6), Some((0, 5)));
}

#[test]
fn test_output_display_is_code() {
    let modifier = Modifier::new(TupleParser::new());

    let output = immediate(modifier.transform("(1,2,3)", twenty_two));

    assert_eq!(output.to_string(), "(1,22,3)");
    let (code, map) = output.into_parts();
    assert_eq!(code, "(1,22,3)");
    assert_eq!(map.to_string(), map.to_json());
}

#[test]
fn test_markdown_heading_edit() {
    let modifier = Modifier::new(MarkdownParser::new());
    let options = TransformOptions::with_parser(MarkdownOptions::default());

    let output = immediate(modifier.transform_with(
        "# Hello\n\nWorld\n",
        options,
        |node, helpers| {
            let in_heading = helpers.parent().is_some_and(|parent| parent.is("heading"));
            if node.is("text") && in_heading {
                let upper = node.value().unwrap_or_default().to_uppercase();
                helpers.override_with(&upper)?;
            }
            Ok::<_, TransformError>(())
        },
    ));

    assert_eq!(output.code(), "# HELLO\n\nWorld\n");
    assert_eq!(mappings(output.map()), "AAAA,EAAE;;AAEF");
    assert_eq!(output.map().lookup(2, 3), Some((2, 0)));
}
