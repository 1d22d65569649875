//! Fixture trees for the bundled grammars.

use canopy::grammar::{builtin, GrammarRegistry};
use canopy::pool::parse_source;
use canopy::ts::{SyntaxParser, TextEdit};
use rstest::rstest;

#[rstest]
#[case::css(
    "css",
    "p { color: red; }",
    "(stylesheet (rule_set (selectors (tag_name)) (block (declaration (property_name) (plain_value)))))"
)]
#[case::go("go", "package main", "(source_file (package_clause (package_identifier)))")]
#[case::rust("rust", "mod one;", "(source_file (mod_item name: (identifier)))")]
#[case::python("python", "pass", "(module (pass_statement))")]
#[case::c(
    "c",
    "int x;",
    "(translation_unit (declaration type: (primitive_type) declarator: (identifier)))"
)]
#[case::cpp(
    "cpp",
    "int x;",
    "(translation_unit (declaration type: (primitive_type) declarator: (identifier)))"
)]
#[case::java(
    "java",
    "class A {}",
    "(program (class_declaration name: (identifier) body: (class_body)))"
)]
#[case::javascript("javascript", "x;", "(program (expression_statement (identifier)))")]
#[case::ruby("ruby", "x", "(program (identifier))")]
#[case::html(
    "html",
    "<p></p>",
    "(document (element (start_tag (tag_name)) (end_tag (tag_name))))"
)]
fn fixture_trees(#[case] language: &str, #[case] source: &str, #[case] expected: &str) {
    let registry = GrammarRegistry::with_builtins().unwrap();
    let grammar = registry.get(language).unwrap();

    let parsed = parse_source(grammar, source.as_bytes(), None, None).unwrap();
    assert!(!parsed.has_errors());
    assert_eq!(parsed.to_sexp(), expected);
}

#[test]
fn typescript_and_tsx_are_distinct() {
    let source = b"const a = <div />;";
    let ts = parse_source(&builtin::typescript(), source, None, None).unwrap();
    let tsx = parse_source(&builtin::tsx(), source, None, None).unwrap();

    assert!(!tsx.has_errors());
    assert_ne!(ts.to_sexp(), tsx.to_sexp());
}

#[test]
fn incremental_reparse_reports_changed_ranges() {
    let grammar = builtin::rust();
    let mut parser = SyntaxParser::new(&grammar).unwrap();
    let old_source = b"fn a() {}\nfn b() {}\n";
    let old_tree = parser.parse(old_source, None, None).unwrap();

    let (edit, new_source) = TextEdit::replace(old_source, 13, 14, b"renamed").unwrap();
    assert_eq!(new_source, b"fn a() {}\nfn renamed() {}\n");

    let mut edited = old_tree.clone();
    edit.apply(&mut edited);
    let new_tree = parser.parse(&new_source, Some(&edited), None).unwrap();

    let changed: Vec<_> = edited.changed_ranges(&new_tree).collect();
    assert!(changed.iter().all(|r| r.start_byte >= 10));
    assert_eq!(
        new_tree.root_node().to_sexp(),
        old_tree.root_node().to_sexp()
    );

    let name = new_tree
        .root_node()
        .named_child(1)
        .unwrap()
        .child_by_field_name("name")
        .unwrap();
    assert_eq!(name.utf8_text(&new_source).unwrap(), "renamed");
}
