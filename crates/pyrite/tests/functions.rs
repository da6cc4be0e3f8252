mod common;

use common::{error_of, stdout_of, value_of};
use pyrite::{EvalError, ExcType, Interpreter, ResourceLimits};

#[test]
fn counter_closure_with_nonlocal() {
    let output = stdout_of(
        r#"
def counter():
    n = 0
    def tick():
        nonlocal n
        n += 1
        return n
    return tick
c = counter()
print(c(), c(), c())
"#,
    );
    assert_eq!(output, "1 2 3\n");
}

#[test]
fn closures_capture_independently() {
    let output = stdout_of(
        r#"
def make(n):
    return lambda: n
fs = [make(i) for i in range(3)]
print(fs[0](), fs[1](), fs[2]())
"#,
    );
    assert_eq!(output, "0 1 2\n");
}

#[test]
fn local_assignment_does_not_leak() {
    let output = stdout_of(
        r#"
x = 1
def f():
    x = 2
f()
print(x)
"#,
    );
    assert_eq!(output, "1\n");
}

#[test]
fn global_marker_writes_to_module_scope() {
    let output = stdout_of(
        r#"
x = 1
def f():
    global x
    x = 2
f()
print(x)
"#,
    );
    assert_eq!(output, "2\n");
}

#[test]
fn nonlocal_without_binding_is_name_error() {
    let err = error_of(
        r#"
def f():
    nonlocal missing
    missing = 1
f()
"#,
    );
    let EvalError::Exception(exc) = err else {
        panic!("expected exception, got {err}");
    };
    assert_eq!(exc.exc_type, ExcType::NameError);
}

#[test]
fn defaults_evaluate_at_definition_time() {
    let output = stdout_of(
        r#"
base = 10
def f(a, b=base):
    return a + b
base = 99
print(f(1), f(1, 2))
"#,
    );
    assert_eq!(output, "11 3\n");
}

#[test]
fn variadic_and_kwargs_binding() {
    let output = stdout_of(
        r#"
def f(a, *rest, **extra):
    return [a, list(rest), extra]
print(f(1, 2, 3, x=4, y=5))
"#,
    );
    assert_eq!(output, "[1, [2, 3], {'x': 4, 'y': 5}]\n");
}

#[test]
fn keyword_arguments_route_to_names() {
    let output = stdout_of(
        r#"
def f(a, b, c=3):
    return a * 100 + b * 10 + c
print(f(b=2, a=1), f(1, 2, c=9))
"#,
    );
    assert_eq!(output, "123 129\n");
}

#[test]
fn unknown_keyword_is_type_error() {
    let err = error_of("def f(a): return a\nf(a=1, zz=2)\n");
    let EvalError::Exception(exc) = err else { panic!() };
    assert_eq!(exc.exc_type, ExcType::TypeError);
}

#[test]
fn star_unpacking_at_call_site() {
    let output = stdout_of(
        r#"
def f(a, b, c):
    return a + b + c
args = [1, 2]
print(f(*args, 3), f(*[4], *[5, 6]))
"#,
    );
    assert_eq!(output, "6 15\n");
}

#[test]
fn dict_star_unpacking_at_call_site() {
    let output = stdout_of(
        r#"
def f(a, b):
    return a - b
kw = {"b": 3}
print(f(10, **kw))
"#,
    );
    assert_eq!(output, "7\n");
}

#[test]
fn lambda_with_default_and_conditional_body() {
    let output = stdout_of(
        r#"
f = lambda x, cap=10: x if x < cap else cap
print(f(3), f(30), f(30, 100))
"#,
    );
    assert_eq!(output, "3 10 30\n");
}

#[test]
fn falling_off_the_end_returns_none() {
    let output = stdout_of("def f():\n    pass\nprint(f())\n");
    assert_eq!(output, "None\n");
}

#[test]
fn recursion_limit_raises_recursion_error() {
    let mut interp = Interpreter::new();
    interp.set_limits(ResourceLimits {
        max_recursion_depth: 20,
    });
    let err = interp.eval("def f(n):\n    return f(n + 1)\nf(0)\n").unwrap_err();
    let EvalError::Exception(exc) = err else { panic!() };
    assert_eq!(exc.exc_type, ExcType::RecursionError);
}

#[test]
fn recursion_error_is_catchable_as_runtime_error() {
    let mut interp = Interpreter::new();
    interp.set_limits(ResourceLimits {
        max_recursion_depth: 20,
    });
    let result = interp
        .eval(
            r#"
def f(n):
    return f(n + 1)
try:
    f(0)
    out = "no"
except RuntimeError:
    out = "caught"
out
"#,
        )
        .unwrap();
    assert_eq!(result.py_str(), "caught");
}

#[test]
fn functions_are_first_class() {
    let value = value_of(
        r#"
def double(x):
    return x * 2
def apply(f, v):
    return f(v)
apply(double, 21)
"#,
    );
    assert_eq!(value.py_repr(), "42");
}
