mod common;

use common::{error_of, stdout_of, value_of};
use pretty_assertions::assert_eq;
use pyrite::{EvalError, ExcType};

#[test]
fn small_int_identity_inside_and_outside_the_cache() {
    let output = stdout_of(
        r#"
a = 5 + 5
b = 10
print(a is b)
c = 10000 + 1
d = 10001
print(c is d, c == d)
e = -5 - 1
f = -6
print(e is f, e == f)
"#,
    );
    assert_eq!(output, "True\nFalse True\nFalse True\n");
}

#[test]
fn singleton_identity() {
    let value = value_of("[None is None, True is True, True is 1, 1 is True]");
    assert_eq!(value.py_repr(), "[True, True, False, False]");
}

#[test]
fn canonical_keys_unify_numeric_kinds() {
    let output = stdout_of(
        r#"
d = {}
d[1] = "one"
print(d[True], d[1.0])
d[True] = "uno"
print(d[1], len(d))
"#,
    );
    assert_eq!(output, "one one\nuno 1\n");
}

#[test]
fn tuple_keys_are_structural() {
    let output = stdout_of(
        r#"
d = {(1, "a"): "x"}
print(d[(True, "a")])
"#,
    );
    assert_eq!(output, "x\n");
}

#[test]
fn unhashable_keys_raise_type_error() {
    let err = error_of("d = {}\nd[[1, 2]] = 'no'\n");
    let EvalError::Exception(exc) = err else { panic!() };
    assert_eq!(exc.exc_type, ExcType::TypeError);
}

#[test]
fn dict_iteration_skips_keys_deleted_mid_loop() {
    let output = stdout_of(
        r#"
d = {"a": 1, "b": 2, "c": 3}
seen = []
for k in d:
    if k == "a":
        d.pop("b")
    seen.append(k)
print(seen)
"#,
    );
    assert_eq!(output, "['a', 'c']\n");
}

#[test]
fn chained_comparisons() {
    let value = value_of("[1 < 2 < 3, 1 < 2 > 3, 3 >= 3 >= 3, 1 < 5 < 4]");
    assert_eq!(value.py_repr(), "[True, False, True, False]");
}

#[test]
fn boolean_operators_return_operands() {
    let value = value_of(r#"[0 or "fallback", "first" or "second", 1 and "kept", "" and "skipped"]"#);
    assert_eq!(value.py_repr(), "['fallback', 'first', 'kept', '']");
}

#[test]
fn truthiness_of_containers() {
    let value = value_of(r#"[bool([]), bool([0]), bool({}), bool(""), bool("x"), bool(0.0), bool(-1)]"#);
    assert_eq!(value.py_repr(), "[False, True, False, False, True, False, True]");
}

#[test]
fn slicing_rules() {
    let output = stdout_of(
        r#"
xs = [0, 1, 2, 3, 4]
print(xs[1:3], xs[:2], xs[3:], xs[::2], xs[::-1])
s = "hello"
print(s[1:4], s[-3:], s[::-1])
t = (1, 2, 3, 4)
print(t[1:3])
"#,
    );
    assert_eq!(
        output,
        "[1, 2] [0, 1] [3, 4] [0, 2, 4] [4, 3, 2, 1, 0]\nell llo olleh\n(2, 3)\n"
    );
}

#[test]
fn negative_indexing_and_errors() {
    let output = stdout_of(
        r#"
xs = [1, 2, 3]
print(xs[-1], "abc"[-2])
try:
    xs[3]
except IndexError:
    print("oob")
"#,
    );
    assert_eq!(output, "3 b\noob\n");
}

#[test]
fn string_methods_work_together() {
    let output = stdout_of(
        r#"
s = "  Hello, World  "
print(s.strip().lower())
print("a,b,,c".split(","))
print("-".join(["x", "y", "z"]))
print("hello".replace("l", "L"), "hello".find("ll"), "hello".count("l"))
print("42".zfill(5), "hi".upper(), "PYTHON".capitalize())
print("abc".startswith("ab"), "abc".endswith("bc"), "12".isdigit())
"#,
    );
    assert_eq!(
        output,
        "hello, world\n['a', 'b', '', 'c']\nx-y-z\nheLLo 2 2\n00042 HI Python\nTrue True True\n"
    );
}

#[test]
fn list_methods_mutate_in_place() {
    let output = stdout_of(
        r#"
xs = [3, 1]
xs.append(2)
xs.extend([5, 4])
xs.sort()
print(xs)
xs.reverse()
popped = xs.pop()
print(xs, popped)
xs.insert(0, 9)
xs.remove(4)
print(xs, xs.index(3), xs.count(9))
"#,
    );
    assert_eq!(output, "[1, 2, 3, 4, 5]\n[5, 4, 3, 2] 1\n[9, 5, 3, 2] 2 1\n");
}

#[test]
fn sort_with_key_and_reverse() {
    let output = stdout_of(
        r#"
words = ["bb", "a", "ccc"]
print(sorted(words, key=len))
print(sorted([3, 1, 2], reverse=True))
words.sort(key=len, reverse=True)
print(words)
"#,
    );
    assert_eq!(output, "['a', 'bb', 'ccc']\n[3, 2, 1]\n['ccc', 'bb', 'a']\n");
}

#[test]
fn dict_methods() {
    let output = stdout_of(
        r#"
d = {"a": 1}
print(d.get("a"), d.get("z"), d.get("z", 0))
d.update({"b": 2})
print(list(d.keys()), list(d.values()), list(d.items()))
print(d.setdefault("c", 3), d.pop("a"), len(d))
"#,
    );
    assert_eq!(
        output,
        "1 None 0\n['a', 'b'] [1, 2] [('a', 1), ('b', 2)]\n3 1 2\n"
    );
}

#[test]
fn set_operations() {
    let output = stdout_of(
        r#"
a = {1, 2, 3}
b = {2, 3, 4}
print(sorted(a | b), sorted(a & b), sorted(a - b), sorted(a ^ b))
print(a.issubset({1, 2, 3, 9}), {1, 2} <= a, a < a)
c = a.copy()
c.add(99)
print(3 in a, 99 in a, 99 in c)
"#,
    );
    assert_eq!(
        output,
        "[1, 2, 3, 4] [2, 3] [1] [1, 4]\nTrue True False\nTrue False True\n"
    );
}

#[test]
fn augmented_assignment_in_place_for_lists() {
    let output = stdout_of(
        r#"
xs = [1]
ys = xs
xs += [2]
print(ys)
xs *= 2
print(ys)
n = 5
n += 2
print(n)
"#,
    );
    assert_eq!(output, "[1, 2]\n[1, 2, 1, 2]\n7\n");
}

#[test]
fn star_targets_unpack() {
    let output = stdout_of(
        r#"
*rest, last = [1, 2, 3, 4]
print(rest, last)
first, *mid, end = (1, 2, 3, 4, 5)
print(first, mid, end)
a, b = 1, 2
b, a = a, b
print(a, b)
"#,
    );
    assert_eq!(output, "[1, 2, 3] 4\n1 [2, 3, 4] 5\n2 1\n");
}

#[test]
fn conversion_builtins() {
    let value = value_of(r#"[int("42"), int(3.9), float("2.5"), str(17), int("ff", 16), ord("A"), chr(66)]"#);
    assert_eq!(value.py_repr(), "[42, 3, 2.5, '17', 255, 65, 'B']");
}

#[test]
fn aggregate_builtins() {
    let value = value_of(
        r#"[len("abc"), abs(-3), min(4, 2, 9), max([1, 7, 5]), sum([1, 2, 3]), round(2.5), round(3.14159, 2), any([0, "", 3]), all([1, True])]"#,
    );
    assert_eq!(value.py_repr(), "[3, 3, 2, 7, 6, 2, 3.14, True, True]");
}

#[test]
fn functional_builtins() {
    let value = value_of(
        r#"[list(map(lambda x: x + 1, [1, 2])), list(filter(lambda x: x % 2, range(5))), list(zip([1, 2, 3], "ab")), list(enumerate("ab", 1))]"#,
    );
    assert_eq!(
        value.py_repr(),
        "[[2, 3], [1, 3], [(1, 'a'), (2, 'b')], [(1, 'a'), (2, 'b')]]"
    );
}

#[test]
fn deepcopy_detaches_nested_containers() {
    let output = stdout_of(
        r#"
a = {"xs": [1, 2]}
b = deepcopy(a)
b["xs"].append(3)
print(a["xs"], b["xs"])
"#,
    );
    assert_eq!(output, "[1, 2] [1, 2, 3]\n");
}

#[test]
fn iterators_are_single_pass() {
    let output = stdout_of(
        r#"
it = iter([1, 2, 3])
print(list(it))
print(list(it))
"#,
    );
    assert_eq!(output, "[1, 2, 3]\n[]\n");
}

#[test]
fn repr_of_nested_values() {
    let value = value_of(r#"repr({"k": [1, (2,), {3}], "s": "txt"})"#);
    assert_eq!(value.py_str(), "{'k': [1, (2,), {3}], 's': 'txt'}");
}

#[test]
fn membership_operator_variants() {
    let value = value_of(
        r#"["ell" in "hello", 2 in [1, 2], 5 not in (1, 2), "k" in {"k": 1}, 1 in {1, 2}, "v" in {"k": 1}.values()]"#,
    );
    assert_eq!(value.py_repr(), "[True, True, True, True, True, False]");
}
