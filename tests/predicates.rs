//! Predicate validation and evaluation through the public query API.

use canopy::grammar::{builtin, Grammar};
use canopy::pool::parse_source;
use canopy::query::{MatchCursor, PatternQuery, QueryErrorKind};
use proptest::prelude::*;
use rstest::rstest;

const ASSIGNMENT: &str = "(assignment left: (identifier) @a right: (identifier) @b)";

/// Accept/reject verdict of each match of `query` over `source`.
fn verdicts(grammar: &Grammar, query: &str, source: &str) -> Vec<bool> {
    let query = PatternQuery::new(grammar, query).unwrap();
    let parsed = parse_source(grammar, source.as_bytes(), None, None).unwrap();
    let mut cursor = MatchCursor::new();
    cursor
        .matches(&query, parsed.root_node())
        .map(|m| query.filter(&m, source.as_bytes()).is_accepted())
        .collect()
}

fn assignment_query(predicate: &str) -> String {
    format!("({ASSIGNMENT} {predicate})")
}

#[rstest]
#[case("eq?", "@a")]
#[case("eq?", "@a @b @a")]
#[case("not-eq?", "@a")]
#[case("match?", "@a")]
#[case("match?", "@a \"x\" \"y\"")]
#[case("not-match?", "")]
#[case("set!", "")]
#[case("set!", "a b c")]
#[case("is?", "")]
#[case("is-not?", "a b c")]
fn wrong_arity_names_the_operator(#[case] operator: &str, #[case] args: &str) {
    let source = assignment_query(&format!("(#{operator} {args})"));
    let err = PatternQuery::new(&builtin::python(), &source).unwrap_err();

    assert_eq!(err.kind, QueryErrorKind::WrongArity);
    assert_eq!(err.operator.as_deref(), Some(operator));
    assert!(
        err.message.contains(&format!("`#{operator}`")),
        "{}",
        err.message
    );
}

#[rstest]
#[case("(#eq? \"a\" @b)", "first argument of `#eq?` predicate must be a capture. Got a")]
#[case("(#match? @a @b)", "second argument of `#match?` predicate must be a string. Got @b")]
#[case("(#is? @a)", "first argument of `#is?` predicate must be a string. Got @a")]
fn wrong_argument_kind(#[case] predicate: &str, #[case] message: &str) {
    let err = PatternQuery::new(&builtin::python(), &assignment_query(predicate)).unwrap_err();
    assert_eq!(err.kind, QueryErrorKind::WrongArgumentKind);
    assert_eq!(err.message, message);
}

#[test]
fn predicate_without_operator_is_malformed() {
    let err = PatternQuery::new(&builtin::python(), &assignment_query("(# @a @b)")).unwrap_err();
    assert_eq!(err.kind, QueryErrorKind::MalformedPredicate);
}

#[rstest]
#[case("red", "match?", true)]
#[case("red", "not-match?", false)]
#[case("blue", "match?", false)]
#[case("blue", "not-match?", true)]
fn match_tests_regex_against_capture(
    #[case] value: &str,
    #[case] operator: &str,
    #[case] accepted: bool,
) {
    let query = format!("((plain_value) @v (#{operator} @v \"^r\"))");
    let source = format!("p {{ color: {value}; }}");
    assert_eq!(verdicts(&builtin::css(), &query, &source), [accepted]);
}

#[test]
fn eq_rejects_after_one_byte_change() {
    let query = assignment_query("(#eq? @a @b)");
    let grammar = builtin::python();

    assert_eq!(verdicts(&grammar, &query, "total = total\n"), [true]);
    assert_eq!(verdicts(&grammar, &query, "total = totaL\n"), [false]);
    assert_eq!(verdicts(&grammar, &query, "xotal = total\n"), [false]);
}

#[test]
fn eq_literal_checks_every_occurrence() {
    let query = "((assignment left: (pattern_list (identifier) @n (identifier) @n)) (#eq? @n \"x\"))";
    let grammar = builtin::python();

    assert_eq!(verdicts(&grammar, query, "x, x = 1, 2\n"), [true]);
    assert_eq!(verdicts(&grammar, query, "x, y = 1, 2\n"), [false]);
}

const FIRST_LEFT: &str = "((assignment left: (pattern_list (identifier) @a (identifier) @a) \
                          right: (identifier) @b) (#eq? @a @b))";
const BARE_RETURN: &str = "def f():\n    return\n";

#[rstest]
#[case::first_occurrence_matches(FIRST_LEFT, "x, y = x\n", true)]
#[case::later_occurrence_ignored(FIRST_LEFT, "y, x = x\n", false)]
#[case::eq_absent_capture(
    "((return_statement (identifier)? @b) @a (#eq? @a @b))",
    BARE_RETURN,
    false
)]
#[case::not_eq_absent_capture(
    "((return_statement (identifier)? @b) @a (#not-eq? @a @b))",
    BARE_RETURN,
    true
)]
#[case::not_eq_present_capture(
    "((return_statement (identifier)? @b) @a (#not-eq? @a @b))",
    "def f(x):\n    return x\n",
    true
)]
fn eq_between_captures(#[case] query: &str, #[case] source: &str, #[case] accepted: bool) {
    assert_eq!(verdicts(&builtin::python(), query, source), [accepted]);
}

fn identifier() -> impl Strategy<Value = String> {
    "[a-z]{1,4}".prop_map(|tail| format!("v_{tail}"))
}

fn identifier_pair() -> impl Strategy<Value = (String, String)> {
    prop_oneof![
        identifier().prop_map(|a| (a.clone(), a)),
        (identifier(), identifier()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn eq_is_symmetric((left, right) in identifier_pair()) {
        let grammar = builtin::python();
        let source = format!("{left} = {right}\n");
        let equal = left == right;

        for predicate in ["(#eq? @a @b)", "(#eq? @b @a)"] {
            let verdict = verdicts(&grammar, &assignment_query(predicate), &source);
            prop_assert_eq!(verdict, vec![equal]);
        }
        for predicate in ["(#not-eq? @a @b)", "(#not-eq? @b @a)"] {
            let verdict = verdicts(&grammar, &assignment_query(predicate), &source);
            prop_assert_eq!(verdict, vec![!equal]);
        }
    }

    #[test]
    fn unknown_operators_never_reject(
        (left, right) in identifier_pair(),
        operator in "[a-z]{3,8}[?!]",
    ) {
        prop_assume!(!matches!(
            operator.as_str(),
            "eq?" | "not-eq?" | "match?" | "not-match?" | "set!" | "is?" | "is-not?"
        ));
        let grammar = builtin::python();
        let source = format!("{left} = {right}\n");
        let predicate = format!("(#{operator} @a \"{right}\" @b)");

        let verdict = verdicts(&grammar, &assignment_query(&predicate), &source);
        prop_assert_eq!(verdict, vec![true]);
    }
}
