mod common;

use common::{error_of, stdout_of, value_of};
use pyrite::{EvalError, ExcType};

#[test]
fn inheritance_with_super_call() {
    let output = stdout_of(
        r#"
class A:
    def greet(self): return "hi from A"
class B(A):
    def greet(self): return super().greet() + " and B"
print(B().greet())
"#,
    );
    assert_eq!(output, "hi from A and B\n");
}

#[test]
fn init_sets_fields() {
    let output = stdout_of(
        r#"
class Point:
    def __init__(self, x, y):
        self.x = x
        self.y = y
    def norm1(self):
        return abs(self.x) + abs(self.y)
p = Point(3, -4)
print(p.x, p.y, p.norm1())
"#,
    );
    assert_eq!(output, "3 -4 7\n");
}

#[test]
fn super_chain_through_three_levels() {
    let output = stdout_of(
        r#"
class A:
    def name(self): return "A"
class B(A):
    def name(self): return super().name() + "B"
class C(B):
    def name(self): return super().name() + "C"
print(C().name())
"#,
    );
    assert_eq!(output, "ABC\n");
}

#[test]
fn inherited_init_runs_via_super() {
    let output = stdout_of(
        r#"
class Animal:
    def __init__(self, name):
        self.name = name
class Dog(Animal):
    def __init__(self, name):
        super().__init__(name)
        self.sound = "woof"
d = Dog("rex")
print(d.name, d.sound)
"#,
    );
    assert_eq!(output, "rex woof\n");
}

#[test]
fn methods_resolve_through_mro() {
    let output = stdout_of(
        r#"
class Base:
    def shared(self): return "base"
class Child(Base):
    pass
print(Child().shared())
"#,
    );
    assert_eq!(output, "base\n");
}

#[test]
fn class_attributes_are_reachable() {
    let output = stdout_of(
        r#"
class Config:
    retries = 3
print(Config.retries)
c = Config()
print(c.retries)
"#,
    );
    assert_eq!(output, "3\n3\n");
}

#[test]
fn instance_fields_shadow_class_attributes() {
    let output = stdout_of(
        r#"
class C:
    v = 1
a = C()
b = C()
a.v = 2
print(a.v, b.v)
"#,
    );
    assert_eq!(output, "2 1\n");
}

#[test]
fn property_getter_and_setter() {
    let output = stdout_of(
        r#"
class Celsius:
    def __init__(self, degrees):
        self._degrees = degrees
    def get_f(self):
        return self._degrees * 9 / 5 + 32
    def set_f(self, value):
        self._degrees = (value - 32) * 5 / 9
    fahrenheit = property(get_f, set_f)
c = Celsius(100)
print(c.fahrenheit)
c.fahrenheit = 32
print(c._degrees)
"#,
    );
    assert_eq!(output, "212.0\n0.0\n");
}

#[test]
fn property_without_setter_rejects_assignment() {
    let err = error_of(
        r#"
class C:
    def get_x(self):
        return 1
    x = property(get_x)
c = C()
c.x = 5
"#,
    );
    let EvalError::Exception(exc) = err else { panic!() };
    assert_eq!(exc.exc_type, ExcType::AttributeError);
}

#[test]
fn static_methods_need_no_receiver() {
    let output = stdout_of(
        r#"
class MathUtil:
    def square(x):
        return x * x
    square = staticmethod(square)
print(MathUtil.square(7))
m = MathUtil()
print(m.square(3))
"#,
    );
    assert_eq!(output, "49\n9\n");
}

#[test]
fn callable_instances_dispatch_to_dunder_call() {
    let output = stdout_of(
        r#"
class Adder:
    def __init__(self, n):
        self.n = n
    def __call__(self, x):
        return x + self.n
add5 = Adder(5)
print(add5(10))
"#,
    );
    assert_eq!(output, "15\n");
}

#[test]
fn missing_attribute_is_attribute_error() {
    let err = error_of("class C:\n    pass\nC().nope\n");
    let EvalError::Exception(exc) = err else { panic!() };
    assert_eq!(exc.exc_type, ExcType::AttributeError);
}

#[test]
fn isinstance_with_user_classes() {
    let value = value_of(
        r#"
class A:
    pass
class B(A):
    pass
[isinstance(B(), A), isinstance(A(), B), isinstance(1, A)]
"#,
    );
    assert_eq!(value.py_repr(), "[True, False, False]");
}

#[test]
fn bound_methods_remember_their_receiver() {
    let output = stdout_of(
        r#"
class Counter:
    def __init__(self):
        self.n = 0
    def bump(self):
        self.n += 1
        return self.n
c = Counter()
bump = c.bump
print(bump(), bump(), c.n)
"#,
    );
    assert_eq!(output, "1 2 2\n");
}
