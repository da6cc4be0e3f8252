mod common;

use common::{eval_capture, value_of};
use pyrite::Interpreter;

/// The interpreter can be reused across eval calls with persistent state.
#[test]
fn repeat_eval() {
    let interp = Interpreter::new();
    let r = interp.eval("1 + 2").unwrap();
    assert_eq!(r.py_repr(), "3");

    let r = interp.eval("1 + 2").unwrap();
    assert_eq!(r.py_repr(), "3");

    interp.eval("x = 10").unwrap();
    let r = interp.eval("x * x").unwrap();
    assert_eq!(r.py_repr(), "100");
}

#[test]
fn string_result() {
    let r = value_of("'foo' + 'bar'");
    assert_eq!(r.py_str(), "foobar");
    assert_eq!(r.py_repr(), "'foobar'");
}

#[test]
fn sum_of_evens_via_for_loop() {
    let (result, output) = eval_capture(
        r#"
total = 0
for i in range(1, 11):
    if i % 2 == 0:
        total += i
print(total)
"#,
    );
    result.unwrap();
    assert_eq!(output, "30\n");
}

#[test]
fn print_sep_and_end_kwargs() {
    let (result, output) = eval_capture("print(1, 2, 3, sep='-', end='!')\nprint('x')\n");
    result.unwrap();
    assert_eq!(output, "1-2-3!x\n");
}
