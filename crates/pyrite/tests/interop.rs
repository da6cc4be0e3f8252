mod common;

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use common::capturing_interp as capturing;
use pyrite::{
    json_to_value, value_to_json, EvalError, Interpreter, Kwargs, Library, NativeContext, QueueInput, Value, Variadic,
};

#[test]
fn typed_native_function_round_trips() {
    let interp = Interpreter::new();
    interp.register_func("add", |a: i64, b: i64| a + b);
    assert_eq!(interp.eval("add(40, 2)").unwrap().py_repr(), "42");
}

#[test]
fn int_promotes_to_float_parameter() {
    let interp = Interpreter::new();
    interp.register_func("halve", |x: f64| x / 2.0);
    assert_eq!(interp.eval("halve(5)").unwrap().py_repr(), "2.5");
}

#[test]
fn conversion_failure_is_an_error_not_an_exception() {
    let interp = Interpreter::new();
    interp.register_func("add", |a: i64, b: i64| a + b);
    let err = interp.eval("add('x', 2)").unwrap_err();
    let EvalError::Error(e) = err else {
        panic!("expected the recoverable error channel, got {err}");
    };
    assert_eq!(e.message, "type error: expected int, got str");
}

#[test]
fn conversion_errors_cannot_be_caught_by_script() {
    let interp = Interpreter::new();
    interp.register_func("add", |a: i64, b: i64| a + b);
    let err = interp
        .eval("try:\n    add('x', 2)\nexcept:\n    out = 'caught'\n")
        .unwrap_err();
    assert!(matches!(err, EvalError::Error(_)));
}

#[test]
fn argument_count_mismatch_message() {
    let interp = Interpreter::new();
    interp.register_func("pair", |a: i64, b: i64| a * b);
    let err = interp.eval("pair(1)").unwrap_err();
    let EvalError::Error(e) = err else { panic!() };
    assert_eq!(e.message, "argument error: got 1, want 2");
}

#[test]
fn host_result_error_becomes_error_value() {
    let interp = Interpreter::new();
    interp.register_func("checked_div", |a: i64, b: i64| -> Result<i64, String> {
        if b == 0 {
            Err("denominator is zero".to_owned())
        } else {
            Ok(a / b)
        }
    });
    assert_eq!(interp.eval("checked_div(10, 2)").unwrap().py_repr(), "5");
    let err = interp.eval("checked_div(1, 0)").unwrap_err();
    let EvalError::Error(e) = err else { panic!() };
    assert_eq!(e.message, "denominator is zero");
}

#[test]
fn variadic_parameter_collects_the_tail() {
    let interp = Interpreter::new();
    interp.register_func("total", |first: i64, rest: Variadic<i64>| {
        first + rest.into_iter().sum::<i64>()
    });
    assert_eq!(interp.eval("total(1, 2, 3, 4)").unwrap().py_repr(), "10");
    assert_eq!(interp.eval("total(1)").unwrap().py_repr(), "1");
}

#[test]
fn kwargs_container_receives_keywords() {
    let interp = Interpreter::new();
    interp.register_func("describe", |kwargs: Kwargs, name: String| {
        let suffix = kwargs
            .get("suffix")
            .map(Value::py_str)
            .unwrap_or_default();
        format!("{name}{suffix}")
    });
    assert_eq!(
        interp.eval("describe('x', suffix='!')").unwrap().py_str(),
        "x!"
    );
}

#[test]
fn context_handle_reaches_script_callables() {
    let interp = Interpreter::new();
    interp.register_func("apply_twice", |ctx: &NativeContext<'_>, f: Value, x: i64| {
        let once = ctx.call(&f, vec![Value::Int(x)])?;
        ctx.call(&f, vec![once])
    });
    let result = interp
        .eval("def inc(n):\n    return n + 1\napply_twice(inc, 5)")
        .unwrap();
    assert_eq!(result.py_repr(), "7");
}

#[test]
fn collections_convert_both_ways() {
    let interp = Interpreter::new();
    interp.register_func("double_all", |xs: Vec<i64>| -> Vec<i64> {
        xs.into_iter().map(|x| x * 2).collect()
    });
    assert_eq!(interp.eval("double_all([1, 2, 3])").unwrap().py_repr(), "[2, 4, 6]");
    assert_eq!(interp.eval("double_all((4, 5))").unwrap().py_repr(), "[8, 10]");
}

#[test]
fn library_functions_constants_and_docs() {
    let (interp, buffer) = capturing();
    interp.register_library(
        Library::builder("geometry")
            .constant("pi", std::f64::consts::PI)
            .func_doc("area", "Area of a circle with radius r.", |r: f64| {
                std::f64::consts::PI * r * r
            })
            .build(),
    );
    interp
        .eval("import geometry\nprint(geometry.pi > 3.14, geometry.area(1.0) > 3.14)\n")
        .unwrap();
    assert_eq!(buffer.0.lock().unwrap().as_str(), "True True\n");

    let lib = Library::builder("x")
        .func_doc("f", "docstring here", || 1i64)
        .build();
    assert_eq!(lib.doc("f"), Some("docstring here"));
}

#[test]
fn import_as_and_from_import() {
    let (interp, buffer) = capturing();
    interp.register_library(
        Library::builder("mathlib")
            .constant("tau", std::f64::consts::TAU)
            .func("double", |x: i64| x * 2)
            .build(),
    );
    interp
        .eval(
            r#"
import mathlib as m
from mathlib import double, tau as t
print(m.double(2), double(3), t > 6)
"#,
        )
        .unwrap();
    assert_eq!(buffer.0.lock().unwrap().as_str(), "4 6 True\n");
}

#[test]
fn dotted_sub_libraries() {
    let (interp, buffer) = capturing();
    let parse = Library::builder("parse")
        .func("quote", |s: String| s.replace(' ', "%20"))
        .build();
    interp.register_library(Library::builder("urllib").sub_library(parse).build());
    interp
        .eval(
            r#"
import urllib.parse
from urllib.parse import quote
print(urllib.parse.quote("a b"), quote("c d"))
"#,
        )
        .unwrap();
    assert_eq!(buffer.0.lock().unwrap().as_str(), "a%20b c%20d\n");
}

#[test]
fn library_dict_view_iterates() {
    let (interp, buffer) = capturing();
    interp.register_library(
        Library::builder("tiny")
            .constant("version", 3i64)
            .func("noop", || ())
            .build(),
    );
    interp
        .eval(
            r#"
import tiny
names = sorted([k for k in tiny.__dict__])
print(names)
"#,
        )
        .unwrap();
    assert_eq!(buffer.0.lock().unwrap().as_str(), "['noop', 'version']\n");
}

#[test]
fn missing_import_lists_available_libraries() {
    let interp = Interpreter::new();
    interp.register_library(Library::builder("alpha").build());
    let err = interp.eval("import missing_lib").unwrap_err();
    let EvalError::Exception(exc) = err else { panic!() };
    let message = exc.message.unwrap_or_default();
    assert!(message.contains("missing_lib"));
    assert!(message.contains("alpha"));
}

#[test]
fn import_callback_resolves_on_demand() {
    let interp = Interpreter::new();
    let calls = Arc::new(AtomicI64::new(0));
    let calls_in_cb = Arc::clone(&calls);
    interp.set_import_callback(move |name| {
        calls_in_cb.fetch_add(1, Ordering::SeqCst);
        (name == "lazy").then(|| Library::builder("lazy").constant("ready", true).build())
    });
    interp.eval("import lazy\nx = lazy.ready").unwrap();
    assert!(matches!(interp.global("x"), Some(Value::Bool(true))));
    // Resolved libraries are cached; a second import does not re-invoke.
    interp.eval("import lazy").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn instantiable_library_carries_instance_data() {
    struct Client {
        base: String,
    }

    let interp = Interpreter::new();
    interp.register_class(
        Library::builder("HttpClient")
            .constructor(|_ctx, args| {
                let base = match args.args() {
                    [Value::Str(s)] => s.to_string(),
                    _ => String::new(),
                };
                Ok(Arc::new(Client { base }))
            })
            .func("url_for", |ctx: &NativeContext<'_>, path: String| {
                let client = ctx.instance::<Client>().expect("instance data");
                format!("{}/{}", client.base, path)
            })
            .build(),
    );
    let result = interp
        .eval(
            r#"
c = HttpClient("https://example.com")
c.url_for("items")
"#,
        )
        .unwrap();
    assert_eq!(result.py_str(), "https://example.com/items");
}

#[test]
fn two_instances_keep_separate_data() {
    struct Counter {
        start: i64,
    }

    let interp = Interpreter::new();
    interp.register_class(
        Library::builder("Counter")
            .constructor(|_ctx, args| {
                let start = match args.args() {
                    [Value::Int(n)] => *n,
                    _ => 0,
                };
                Ok(Arc::new(Counter { start }))
            })
            .func("value", |ctx: &NativeContext<'_>| {
                ctx.instance::<Counter>().map_or(0, |c| c.start)
            })
            .build(),
    );
    let result = interp
        .eval("a = Counter(10)\nb = Counter(20)\n[a.value(), b.value()]")
        .unwrap();
    assert_eq!(result.py_repr(), "[10, 20]");
}

#[test]
fn registered_values_and_globals() {
    let interp = Interpreter::new();
    interp.register_value("answer", 42i64);
    interp.register_value("greeting", "hello");
    assert_eq!(interp.eval("answer + len(greeting)").unwrap().py_repr(), "47");
}

#[test]
fn stdin_redirection_feeds_input() {
    let (interp, buffer) = capturing();
    interp.set_stdin(QueueInput::new(["alice"]));
    interp.eval("name = input('who? ')\nprint('hi', name)\n").unwrap();
    assert_eq!(buffer.0.lock().unwrap().as_str(), "who? hi alice\n");
}

#[test]
fn json_mapping_round_trips() {
    let interp = Interpreter::new();
    let value = interp
        .eval(r#"{"a": [1, 2.5, True, None], "b": "text"}"#)
        .unwrap();
    let json = value_to_json(&value).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"a": [1, 2.5, true, null], "b": "text"})
    );
    let back = json_to_value(&json);
    assert!(back.py_eq(&value));
}

#[test]
fn cancellation_surfaces_from_natives() {
    let interp = Interpreter::new();
    let token = interp.cancel_token();
    interp.register_func("blocking_io", move |ctx: &NativeContext<'_>| -> Result<i64, String> {
        ctx.check_cancelled().map_err(|e| e.to_string())?;
        Ok(1)
    });
    assert_eq!(interp.eval("blocking_io()").unwrap().py_repr(), "1");
    token.cancel();
    assert!(interp.eval("blocking_io()").is_err());
}
