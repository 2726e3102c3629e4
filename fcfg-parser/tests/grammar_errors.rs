//! Grammar compilation errors
//!
//! Every malformed grammar must be rejected as a whole, with the line and column of
//! the offending text and, once known, the rule being defined.

use fcfg_parser::{compile, GrammarSyntaxError, SyntaxErrorKind};
use rstest::rstest;

fn reject(source: &str) -> GrammarSyntaxError {
    compile(source).expect_err("grammar should be rejected")
}

#[rstest]
#[case("T -> a\nT[X] A[X]", 2, 1, SyntaxErrorKind::MissingArrow)]
#[case("T[{x: X} -> A[X]", 1, 2, SyntaxErrorKind::UnclosedBracket('['))]
#[case("T -> a\n\nU -> b ] c", 3, 8, SyntaxErrorKind::UnmatchedBracket(']'))]
#[case("D -> | r", 1, 6, SyntaxErrorKind::EmptyAlternative)]
#[case("T[X] -> go[X]", 1, 9, SyntaxErrorKind::TerminalWithArgument("go".into()))]
#[case("lower -> a", 1, 1, SyntaxErrorKind::InvalidRuleName("lower".into()))]
#[case("T[\"open] -> a", 1, 3, SyntaxErrorKind::UnterminatedString)]
#[case("T -> a - b", 1, 8, SyntaxErrorKind::InvalidCharacter('-'))]
#[case("T[<A, A>] -> X[A]", 1, 3, SyntaxErrorKind::DuplicateListVariable("A".into()))]
fn test_located_errors(
    #[case] source: &str,
    #[case] line: usize,
    #[case] column: usize,
    #[case] kind: SyntaxErrorKind,
) {
    let error = reject(source);
    assert_eq!(error.kind, kind);
    assert_eq!((error.line, error.column), (line, column), "{error}");
}

#[test]
fn test_unbound_template_variable_names_rule_variable_and_line() {
    let error = reject("A -> a\n\nVP[{\"action\": \"go\", \"to\": L}] -> go A | go to A[L]");
    assert_eq!(error.line, 3);
    assert_eq!(error.rule.as_deref(), Some("VP"));
    assert_eq!(
        error.kind,
        SyntaxErrorKind::UnboundTemplateVariable {
            variable: "L".into(),
            alternative: 1,
        }
    );
}

#[test]
fn test_left_recursion_through_several_rules() {
    let error = reject("S -> NP VP\nNP -> DET N\nDET -> NP s | the\nN -> dog\nVP -> runs");
    assert_eq!(
        error.kind,
        SyntaxErrorKind::LeftRecursion(vec!["NP".into(), "DET".into(), "NP".into()])
    );
}

#[test]
fn test_no_partial_grammar_after_late_error() {
    assert!(compile("A -> a\nB -> b\nC -> c |").is_err());
}

#[test]
fn test_rendered_error() {
    let source = "T -> greet P\nP -> rein\nP -> loy |\nQ -> q";
    let error = reject(source);
    insta::assert_snapshot!(error.render(source), @r"
    error: line 3, column 11 (rule P): empty alternative

         1 | T -> greet P
         2 | P -> rein
    >>   3 | P -> loy |
         4 | Q -> q
    ");
}

#[test]
fn test_comments_and_blank_lines_are_ignored() {
    let grammar = compile("# header\n\nT -> a # trailing\n   \n# done\n").unwrap();
    assert_eq!(grammar.entry_count(), 1);
    assert_eq!(grammar.entries("T")[0].line, 3);
}
