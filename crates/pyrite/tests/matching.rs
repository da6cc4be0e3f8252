mod common;

use common::{stdout_of, value_of};

#[test]
fn match_with_guard_and_wildcard() {
    let output = stdout_of(
        r#"
def classify(x):
    match x:
        case 0: return "zero"
        case n if n < 0: return "neg"
        case _: return "pos"
print(classify(0), classify(-4), classify(7))
"#,
    );
    assert_eq!(output, "zero neg pos\n");
}

#[test]
fn literal_patterns_match_by_equality() {
    let output = stdout_of(
        r#"
def describe(x):
    match x:
        case 1: return "one"
        case 2.5: return "two and a half"
        case "hi": return "greeting"
        case True: return "unreachable, 1 matches first"
        case None: return "nothing"
        case _: return "other"
print(describe(1), describe(2.5), describe("hi"), describe(None), describe([]))
"#,
    );
    assert_eq!(output, "one two and a half greeting nothing other\n");
}

#[test]
fn sequence_patterns_bind_elements() {
    let output = stdout_of(
        r#"
def pair(p):
    match p:
        case [x, y]: return x + y
        case (a, b, c): return a + b + c
        case _: return -1
print(pair([1, 2]), pair((3, 4, 5)), pair([1, 2, 3, 4]))
"#,
    );
    assert_eq!(output, "3 12 -1\n");
}

#[test]
fn mapping_patterns_check_keys_and_subpatterns() {
    let output = stdout_of(
        r#"
def route(msg):
    match msg:
        case {"kind": "ping"}: return "pong"
        case {"kind": "add", "value": v}: return v + 1
        case _: return "unknown"
print(route({"kind": "ping", "extra": 1}), route({"kind": "add", "value": 41}), route({}))
"#,
    );
    assert_eq!(output, "pong 42 unknown\n");
}

#[test]
fn as_capture_binds_the_subject() {
    let output = stdout_of(
        r#"
match [1, 2]:
    case [a, b] as whole:
        print(a, b, whole)
"#,
    );
    assert_eq!(output, "1 2 [1, 2]\n");
}

#[test]
fn class_identifier_is_a_type_pattern() {
    let output = stdout_of(
        r#"
class Shape:
    pass
class Circle(Shape):
    pass
def kind(x):
    match x:
        case Circle: return "circle"
        case Shape: return "shape"
        case other: return "bound " + str(other)
print(kind(Circle()), kind(Shape()), kind(5))
"#,
    );
    assert_eq!(output, "circle shape bound 5\n");
}

#[test]
fn shadowed_class_name_becomes_a_binding_wildcard() {
    let output = stdout_of(
        r#"
class Tag:
    pass
def f(x):
    Tag = None
    match x:
        case Tag: return "bound anything"
print(f(123))
"#,
    );
    assert_eq!(output, "bound anything\n");
}

#[test]
fn builtin_type_names_match_by_type() {
    let output = stdout_of(
        r#"
def kind(x):
    match x:
        case int: return "int"
        case str: return "str"
        case list: return "list"
        case _: return "other"
print(kind(5), kind("s"), kind([1]), kind(2.5))
"#,
    );
    assert_eq!(output, "int str list other\n");
}

#[test]
fn guard_failure_falls_through_to_later_cases() {
    let output = stdout_of(
        r#"
def bucket(n):
    match n:
        case x if x > 100: return "big"
        case x if x > 10: return "medium"
        case _: return "small"
print(bucket(500), bucket(50), bucket(5))
"#,
    );
    assert_eq!(output, "big medium small\n");
}

#[test]
fn no_matching_case_is_a_no_op() {
    let value = value_of(
        r#"
match 99:
    case 1: x = "one"
"done"
"#,
    );
    assert_eq!(value.py_str(), "done");
}

#[test]
fn negative_literal_patterns() {
    let output = stdout_of(
        r#"
def sign(n):
    match n:
        case -1: return "neg one"
        case 0: return "zero"
        case _: return "other"
print(sign(-1), sign(0), sign(3))
"#,
    );
    assert_eq!(output, "neg one zero other\n");
}

#[test]
fn tuple_pattern_without_parens() {
    let output = stdout_of(
        r#"
match (1, 2):
    case 1, 2:
        print("matched")
"#,
    );
    assert_eq!(output, "matched\n");
}
