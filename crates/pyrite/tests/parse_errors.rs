mod common;

use common::eval_capture;
use pyrite::EvalError;

fn parse_errors(source: &str) -> Vec<pyrite::ParseError> {
    let (result, _) = eval_capture(source);
    match result {
        Err(EvalError::Parse(errors)) => errors,
        other => panic!("expected parse errors, got {other:?}"),
    }
}

#[test]
fn multiple_errors_in_one_pass() {
    let errors = parse_errors("x = = 1\ny = 2\nz = ) 3\n");
    assert!(errors.len() >= 2);
    assert_eq!(errors[0].line, 1);
    assert!(errors.iter().any(|e| e.line == 3));
}

#[test]
fn unterminated_string_reports_its_line() {
    let errors = parse_errors("a = 1\nb = 'unclosed\n");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line, 2);
}

#[test]
fn inconsistent_dedent_is_rejected() {
    let errors = parse_errors("if x:\n        a = 1\n    b = 2\n");
    assert!(errors[0].message.contains("unindent"));
}

#[test]
fn assignment_to_literal_is_rejected() {
    let errors = parse_errors("1 = x\n");
    assert!(errors[0].message.contains("cannot assign"));
}

#[test]
fn two_starred_targets_are_rejected() {
    let errors = parse_errors("*a, *b = [1, 2, 3]\n");
    assert!(errors[0].message.contains("starred"));
}

#[test]
fn multiple_inheritance_is_rejected() {
    let errors = parse_errors("class C(A, B):\n    pass\n");
    assert!(errors[0].message.contains("multiple inheritance"));
}

#[test]
fn parameter_default_ordering_enforced() {
    let errors = parse_errors("def f(a=1, b):\n    pass\n");
    assert!(errors[0].message.contains("default"));
}

#[test]
fn empty_block_is_an_error() {
    let errors = parse_errors("if x:\nprint(1)\n");
    assert!(!errors.is_empty());
}

#[test]
fn try_without_except_or_finally() {
    let errors = parse_errors("try:\n    pass\nx = 1\n");
    assert!(errors[0].message.contains("except"));
}

#[test]
fn bad_fstring_spec_is_a_parse_error() {
    let errors = parse_errors("s = f\"{x:zz}\"\n");
    assert!(!errors.is_empty());
}

#[test]
fn unbalanced_fstring_brace() {
    let errors = parse_errors("s = f\"{x\"\n");
    assert!(!errors.is_empty());
}

#[test]
fn deep_nesting_is_bounded() {
    let mut source = String::from("x = ");
    for _ in 0..300 {
        source.push('(');
    }
    source.push('1');
    for _ in 0..300 {
        source.push(')');
    }
    source.push('\n');
    let errors = parse_errors(&source);
    assert!(errors[0].message.contains("nested"));
}
