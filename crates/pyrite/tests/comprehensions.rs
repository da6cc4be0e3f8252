mod common;

use common::{stdout_of, value_of};
use pretty_assertions::assert_eq;

#[test]
fn dict_comprehension_with_format_specs() {
    let output = stdout_of(
        r#"
squares = {n: n*n for n in range(1, 4)}
for k, v in squares.items():
    print(f"{k:2d} -> {v:04d}")
"#,
    );
    assert_eq!(output, " 1 -> 0001\n 2 -> 0004\n 3 -> 0009\n");
}

#[test]
fn list_comprehension_with_filter() {
    let value = value_of("[x * x for x in range(6) if x % 2 == 0]");
    assert_eq!(value.py_repr(), "[0, 4, 16]");
}

#[test]
fn nested_for_clauses() {
    let value = value_of("[(a, b) for a in range(2) for b in range(2) if a != b]");
    assert_eq!(value.py_repr(), "[(0, 1), (1, 0)]");
}

#[test]
fn set_comprehension_deduplicates() {
    let value = value_of("{x % 3 for x in range(9)}");
    assert_eq!(value.py_repr(), "{0, 1, 2}");
}

#[test]
fn comprehension_variables_do_not_leak() {
    let value = value_of(
        r#"
x = "outer"
ys = [x for x in range(3)]
x
"#,
    );
    assert_eq!(value.py_str(), "outer");
}

#[test]
fn tuple_unpacking_in_comprehension_target() {
    let value = value_of("[k + str(v) for k, v in [('a', 1), ('b', 2)]]");
    assert_eq!(value.py_repr(), "['a1', 'b2']");
}

#[test]
fn generator_expression_realises_eagerly() {
    let value = value_of("sum(x * x for x in range(4))");
    assert_eq!(value.py_repr(), "14");
}

#[test]
fn fstring_literal_and_escape_handling() {
    let output = stdout_of(
        r#"
n = 3
print(f"{{literal}} {n} end")
"#,
    );
    assert_eq!(output, "{literal} 3 end\n");
}

#[test]
fn fstring_expressions_run_the_full_grammar() {
    let output = stdout_of(
        r#"
d = {"key": [10, 20, 30]}
print(f"{d['key'][1] + 1} and {len(d)}")
"#,
    );
    assert_eq!(output, "21 and 1\n");
}

#[test]
fn fstring_float_and_string_specs() {
    let output = stdout_of(
        r#"
pi = 3.14159
name = "pi"
print(f"{name:>5}={pi:.2f}")
print(f"{pi:10.3f}|")
print(f"{name:^6}|")
"#,
    );
    assert_eq!(output, "   pi=3.14\n     3.142|\n  pi  |\n");
}

#[test]
fn fstring_without_spec_uses_str_form() {
    let output = stdout_of(
        r#"
items = [1, "two"]
print(f"{items} {None} {True}")
"#,
    );
    assert_eq!(output, "[1, 'two'] None True\n");
}

#[test]
fn dict_comprehension_key_collisions_keep_last_value() {
    let value = value_of("{x % 2: x for x in range(5)}");
    assert_eq!(value.py_repr(), "{0: 4, 1: 3}");
}
