mod common;

use common::{error_of, eval_capture, stdout_of, value_of};
use pyrite::{EvalError, ExcType};

#[test]
fn typed_except_catches_zero_division() {
    let output = stdout_of(
        r#"
def div(a, b):
    try:
        return a / b
    except ZeroDivisionError as e:
        return "no"
print(div(6, 2), div(1, 0))
"#,
    );
    assert_eq!(output, "3.0 no\n");
}

#[test]
fn bare_except_matches_anything() {
    let output = stdout_of(
        r#"
try:
    raise ValueError("boom")
except:
    print("caught")
"#,
    );
    assert_eq!(output, "caught\n");
}

#[test]
fn handlers_are_consulted_in_order() {
    let output = stdout_of(
        r#"
try:
    {}[1]
except ValueError:
    print("wrong")
except KeyError:
    print("right")
except:
    print("too late")
"#,
    );
    assert_eq!(output, "right\n");
}

#[test]
fn except_exception_catches_subtypes() {
    let output = stdout_of(
        r#"
try:
    int("nope")
except Exception as e:
    print("caught:", str(e))
"#,
    );
    assert!(output.starts_with("caught:"));
}

#[test]
fn finally_runs_on_normal_exit_and_return() {
    let output = stdout_of(
        r#"
def f():
    try:
        return "value"
    finally:
        print("finally ran")
print(f())
try:
    pass
finally:
    print("also ran")
"#,
    );
    assert_eq!(output, "finally ran\nvalue\nalso ran\n");
}

#[test]
fn finally_runs_on_break_and_continue() {
    let output = stdout_of(
        r#"
for i in range(3):
    try:
        if i == 1:
            continue
        if i == 2:
            break
    finally:
        print("f", i)
print("done")
"#,
    );
    assert_eq!(output, "f 0\nf 1\nf 2\ndone\n");
}

#[test]
fn finally_runs_on_uncaught_exception() {
    let (result, output) = eval_capture(
        r#"
try:
    raise ValueError("boom")
finally:
    print("cleanup")
"#,
    );
    assert_eq!(output, "cleanup\n");
    let Err(EvalError::Exception(exc)) = result else { panic!() };
    assert_eq!(exc.exc_type, ExcType::ValueError);
}

#[test]
fn finally_raise_replaces_in_flight_exception() {
    let err = error_of(
        r#"
try:
    raise ValueError("first")
finally:
    raise TypeError("second")
"#,
    );
    let EvalError::Exception(exc) = err else { panic!() };
    assert_eq!(exc.exc_type, ExcType::TypeError);
}

#[test]
fn bare_raise_rethrows_current_exception() {
    let (result, output) = eval_capture(
        r#"
try:
    try:
        raise ValueError("original")
    except ValueError:
        print("seen")
        raise
except ValueError as e:
    print("again:", str(e))
"#,
    );
    result.unwrap();
    assert_eq!(output, "seen\nagain: original\n");
}

#[test]
fn bare_raise_outside_handler_is_runtime_error() {
    let err = error_of("raise\n");
    let EvalError::Exception(exc) = err else { panic!() };
    assert_eq!(exc.exc_type, ExcType::RuntimeError);
}

#[test]
fn raising_a_string_becomes_a_plain_exception() {
    let err = error_of("raise 'something went wrong'\n");
    let EvalError::Exception(exc) = err else { panic!() };
    assert_eq!(exc.exc_type, ExcType::Exception);
    assert_eq!(exc.message.as_deref(), Some("something went wrong"));
}

#[test]
fn exception_values_carry_messages() {
    let value = value_of(
        r#"
try:
    raise ValueError("bad input")
except ValueError as e:
    out = str(e)
out
"#,
    );
    assert_eq!(value.py_str(), "bad input");
}

#[test]
fn uncaught_exception_reports_line() {
    let err = error_of("x = 1\ny = 2\nraise ValueError('here')\n");
    let EvalError::Exception(exc) = err else { panic!() };
    assert_eq!(exc.line, Some(3));
}

#[test]
fn system_exit_is_not_caught_by_except_exception() {
    let (result, output) = eval_capture(
        r#"
try:
    exit(7)
except Exception:
    print("swallowed")
"#,
    );
    assert_eq!(output, "");
    let Err(err) = result else { panic!() };
    assert_eq!(err.system_exit_code(), Some(7));
}

#[test]
fn system_exit_can_be_caught_by_name() {
    let output = stdout_of(
        r#"
try:
    exit(7)
except SystemExit:
    print("intercepted")
"#,
    );
    assert_eq!(output, "intercepted\n");
}

#[test]
fn division_by_zero_variants() {
    let output = stdout_of(
        r#"
results = []
for expr in range(2):
    try:
        if expr == 0:
            1 / 0
        else:
            1 // 0
    except ZeroDivisionError:
        results.append("zde")
print(results)
"#,
    );
    assert_eq!(output, "['zde', 'zde']\n");
}

#[test]
fn stop_iteration_from_next() {
    let output = stdout_of(
        r#"
it = iter([1])
print(next(it))
try:
    next(it)
except StopIteration:
    print("empty")
print(next(iter([]), "default"))
"#,
    );
    assert_eq!(output, "1\nempty\ndefault\n");
}
