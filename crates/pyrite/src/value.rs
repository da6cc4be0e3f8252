//! Runtime value model.
//!
//! A single tagged enum covers every runtime value. Immediate values (ints,
//! floats, bools, None) are stored inline; containers and callables are
//! `Arc`-shared with interior `RwLock`s so values stay `Send + Sync` for
//! multi-thread embedding. Mutating script operations take the container's
//! own lock; the environment lock only covers name binding.

use std::cmp::Ordering;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::ast::{FunctionDef, LambdaDef};
use crate::bridge::library::Library;
use crate::bridge::NativeFunction;
use crate::env::Env;
use crate::exception::{ExcType, Exception, RunError, RunResult};
use crate::fstring::fix_exponent;
use crate::iter::ScriptIter;
use crate::key::{canonical_key, Key};

/// Small integers inside this range behave as interned singletons: `is`
/// reports identity for equal values inside the range and never outside it.
pub(crate) const SMALL_INT_MIN: i64 = -5;
pub(crate) const SMALL_INT_MAX: i64 = 10_000;

/// Recovers the guard from a poisoned lock; a panic while holding a value
/// lock cannot leave the data structurally broken, only partially updated.
pub(crate) fn read_lock<T: ?Sized>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T: ?Sized>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Primary value type representing script objects at runtime.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Arc<RwLock<Vec<Value>>>),
    Tuple(Arc<[Value]>),
    Dict(Arc<RwLock<Dict>>),
    Set(Arc<RwLock<Set>>),
    Slice(Arc<SliceValue>),
    /// Single-pass iterator; restartable only by reconstructing via `iter()`.
    Iterator(Arc<ScriptIter>),
    /// Lazy view over a dict (`keys()`/`values()`/`items()`).
    DictView(Arc<DictView>),
    /// Script-defined function with its captured environment.
    Function(Arc<Function>),
    Lambda(Arc<LambdaValue>),
    /// Callable produced by attribute access on an instance or via `super()`.
    BoundMethod(Arc<BoundMethod>),
    /// Method of a built-in type, bound to its receiver at attribute access.
    TypeMethod(Arc<TypeMethod>),
    /// Native host function wrapped by the interop bridge.
    Builtin(Arc<NativeFunction>),
    /// Importable namespace of native functions, constants and sub-libraries.
    Library(Arc<Library>),
    Class(Arc<Class>),
    Instance(Arc<Instance>),
    Super(Arc<SuperValue>),
    Property(Arc<PropertyValue>),
    StaticMethod(Arc<Value>),
    /// An exception type used as a constructor / `except` filter / pattern.
    ExcClass(ExcType),
    /// A constructed (not necessarily raised) exception instance.
    Exception(Arc<Exception>),
}

/// Insertion-ordered mapping keyed by the canonical key function.
///
/// The original key value is retained alongside the canonical key so
/// iteration yields what the script inserted (`True` stays `True` even
/// though it shares a slot with `1`). Python semantics keep the first key
/// on overwrite.
#[derive(Debug, Default)]
pub struct Dict {
    map: IndexMap<Key, DictEntry, ahash::RandomState>,
}

#[derive(Debug)]
pub(crate) struct DictEntry {
    pub key: Value,
    pub value: Value,
}

impl Dict {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: Value, value: Value) -> RunResult<()> {
        let canonical = canonical_key(&key)?;
        match self.map.entry(canonical) {
            indexmap::map::Entry::Occupied(mut entry) => entry.get_mut().value = value,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(DictEntry { key, value });
            }
        }
        Ok(())
    }

    pub(crate) fn get(&self, key: &Key) -> Option<&Value> {
        self.map.get(key).map(|entry| &entry.value)
    }

    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.map.contains_key(key)
    }

    /// Removes an entry, preserving the order of the rest.
    pub(crate) fn remove(&mut self, key: &Key) -> Option<Value> {
        self.map.shift_remove(key).map(|entry| entry.value)
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.map.clear();
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.map.values().map(|entry| (&entry.key, &entry.value))
    }

    /// Snapshot of `(canonical, original)` keys for safe iteration while the
    /// dict is concurrently mutated.
    pub(crate) fn key_snapshot(&self) -> Vec<(Key, Value)> {
        self.map
            .iter()
            .map(|(canonical, entry)| (canonical.clone(), entry.key.clone()))
            .collect()
    }
}

/// Insertion-ordered set, also keyed canonically; stores the original
/// element for iteration and display.
#[derive(Debug, Default)]
pub struct Set {
    map: IndexMap<Key, Value, ahash::RandomState>,
}

impl Set {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, value: Value) -> RunResult<bool> {
        let canonical = canonical_key(&value)?;
        Ok(self.map.insert(canonical, value).is_none())
    }

    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.map.contains_key(key)
    }

    pub(crate) fn remove(&mut self, key: &Key) -> Option<Value> {
        self.map.shift_remove(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.map.clear();
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Value> {
        self.map.values()
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &Key> {
        self.map.keys()
    }

    pub(crate) fn pop_first(&mut self) -> Option<Value> {
        self.map.shift_remove_index(0).map(|(_, v)| v)
    }
}

/// Normalized slice bounds as written; `None` means the bound was omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceValue {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViewKind {
    Keys,
    Values,
    Items,
}

#[derive(Debug)]
pub struct DictView {
    pub(crate) dict: Arc<RwLock<Dict>>,
    pub(crate) kind: ViewKind,
}

impl DictView {
    /// Materializes the view's current contents.
    pub(crate) fn snapshot(&self) -> Vec<Value> {
        let dict = read_lock(&self.dict);
        match self.kind {
            ViewKind::Keys => dict.iter().map(|(k, _)| k.clone()).collect(),
            ViewKind::Values => dict.iter().map(|(_, v)| v.clone()).collect(),
            ViewKind::Items => dict
                .iter()
                .map(|(k, v)| Value::Tuple(Arc::from(vec![k.clone(), v.clone()])))
                .collect(),
        }
    }

    fn label(&self) -> &'static str {
        match self.kind {
            ViewKind::Keys => "dict_keys",
            ViewKind::Values => "dict_values",
            ViewKind::Items => "dict_items",
        }
    }
}

/// A script-defined function: shared definition, evaluated defaults, and the
/// environment captured where its `def` executed.
#[derive(Debug)]
pub struct Function {
    pub(crate) def: Arc<FunctionDef>,
    /// Evaluated default values, aligned with the tail of `def.params`.
    pub(crate) defaults: Vec<Value>,
    pub(crate) env: Arc<Env>,
}

#[derive(Debug)]
pub struct LambdaValue {
    pub(crate) def: Arc<LambdaDef>,
    pub(crate) defaults: Vec<Value>,
    pub(crate) env: Arc<Env>,
}

#[derive(Debug)]
pub struct BoundMethod {
    pub(crate) func: Value,
    pub(crate) receiver: Value,
    /// The class the method was found on; `super()` resolution starts at its
    /// base.
    pub(crate) defining_class: Option<Arc<Class>>,
}

#[derive(Debug)]
pub struct TypeMethod {
    pub(crate) receiver: Value,
    pub(crate) name: Arc<str>,
}

/// A class object. Single inheritance: at most one base.
#[derive(Debug)]
pub struct Class {
    pub(crate) name: Arc<str>,
    pub(crate) base: Option<Arc<Class>>,
    pub(crate) attrs: RwLock<AHashMap<Arc<str>, Value>>,
}

impl Class {
    /// Walks the MRO (self, base, base.base, …) for a named attribute,
    /// returning the value and the class it was found on.
    pub(crate) fn lookup(self: &Arc<Self>, name: &str) -> Option<(Value, Arc<Self>)> {
        let mut current = Some(Arc::clone(self));
        while let Some(class) = current {
            if let Some(value) = read_lock(&class.attrs).get(name) {
                return Some((value.clone(), Arc::clone(&class)));
            }
            current = class.base.clone();
        }
        None
    }

    /// True if `self` is `other` or inherits from it.
    pub(crate) fn is_subclass_of(self: &Arc<Self>, other: &Arc<Self>) -> bool {
        let mut current = Some(Arc::clone(self));
        while let Some(class) = current {
            if Arc::ptr_eq(&class, other) {
                return true;
            }
            current = class.base.clone();
        }
        false
    }
}

#[derive(Debug)]
pub struct Instance {
    pub(crate) class: Arc<Class>,
    pub(crate) fields: RwLock<AHashMap<Arc<str>, Value>>,
}

/// `super()` binding: attribute lookup starts at the base of `class` and
/// binds against `instance`.
#[derive(Debug)]
pub struct SuperValue {
    pub(crate) class: Arc<Class>,
    pub(crate) instance: Arc<Instance>,
}

#[derive(Debug)]
pub struct PropertyValue {
    pub(crate) getter: Value,
    pub(crate) setter: Option<Value>,
}

impl Value {
    pub(crate) fn str(s: impl Into<Arc<str>>) -> Self {
        Self::Str(s.into())
    }

    pub(crate) fn list(items: Vec<Self>) -> Self {
        Self::List(Arc::new(RwLock::new(items)))
    }

    pub(crate) fn tuple(items: Vec<Self>) -> Self {
        Self::Tuple(Arc::from(items))
    }

    pub(crate) fn dict(dict: Dict) -> Self {
        Self::Dict(Arc::new(RwLock::new(dict)))
    }

    pub(crate) fn set(set: Set) -> Self {
        Self::Set(Arc::new(RwLock::new(set)))
    }

    pub(crate) fn iterator(iter: ScriptIter) -> Self {
        Self::Iterator(Arc::new(iter))
    }

    /// Type name used in diagnostics; instances report their class name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Dict(_) => "dict",
            Self::Set(_) => "set",
            Self::Slice(_) => "slice",
            Self::Iterator(_) => "iterator",
            Self::DictView(view) => view.label(),
            Self::Function(_) | Self::Lambda(_) => "function",
            Self::BoundMethod(_) => "method",
            Self::TypeMethod(_) | Self::Builtin(_) => "builtin_function_or_method",
            Self::Library(_) => "module",
            Self::Class(_) | Self::ExcClass(_) => "type",
            Self::Instance(instance) => &instance.class.name,
            Self::Super(_) => "super",
            Self::Property(_) => "property",
            Self::StaticMethod(_) => "staticmethod",
            Self::Exception(exc) => exc.exc_type.into(),
        }
    }

    /// Truthiness: None and False are falsy, numbers iff non-zero,
    /// containers iff non-empty, everything else truthy.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !read_lock(items).is_empty(),
            Self::Tuple(items) => !items.is_empty(),
            Self::Dict(dict) => !read_lock(dict).is_empty(),
            Self::Set(set) => !read_lock(set).is_empty(),
            Self::DictView(view) => !read_lock(&view.dict).is_empty(),
            _ => true,
        }
    }

    /// Length where defined (`len()` support).
    pub(crate) fn py_len(&self) -> Option<usize> {
        match self {
            Self::Str(s) => Some(s.chars().count()),
            Self::List(items) => Some(read_lock(items).len()),
            Self::Tuple(items) => Some(items.len()),
            Self::Dict(dict) => Some(read_lock(dict).len()),
            Self::Set(set) => Some(read_lock(set).len()),
            Self::DictView(view) => Some(read_lock(&view.dict).len()),
            _ => None,
        }
    }

    /// Value equality following the language rules: numeric kinds compare by
    /// value (`1 == 1.0 == True`), sequences element-wise, dicts and sets by
    /// canonical keys.
    #[must_use]
    pub fn py_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            (Self::Bool(a), Self::Int(b)) | (Self::Int(b), Self::Bool(a)) => i64::from(*a) == *b,
            (Self::Bool(a), Self::Float(b)) | (Self::Float(b), Self::Bool(a)) => f64::from(i8::from(*a)) == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let a = read_lock(a);
                let b = read_lock(b);
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.py_eq(y))
            }
            (Self::Tuple(a), Self::Tuple(b)) => a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.py_eq(y)),
            (Self::Dict(a), Self::Dict(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let a = read_lock(a);
                let b = read_lock(b);
                a.len() == b.len()
                    && a.map
                        .iter()
                        .all(|(key, entry)| b.get(key).is_some_and(|v| entry.value.py_eq(v)))
            }
            (Self::Set(a), Self::Set(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let a = read_lock(a);
                let b = read_lock(b);
                a.len() == b.len() && a.keys().all(|key| b.contains(key))
            }
            (Self::Slice(a), Self::Slice(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => Arc::ptr_eq(a, b),
            (Self::Lambda(a), Self::Lambda(b)) => Arc::ptr_eq(a, b),
            (Self::Builtin(a), Self::Builtin(b)) => Arc::ptr_eq(a, b),
            (Self::Library(a), Self::Library(b)) => Arc::ptr_eq(a, b),
            (Self::Class(a), Self::Class(b)) => Arc::ptr_eq(a, b),
            (Self::Instance(a), Self::Instance(b)) => Arc::ptr_eq(a, b),
            (Self::ExcClass(a), Self::ExcClass(b)) => a == b,
            (Self::Exception(a), Self::Exception(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }

    /// Identity comparison (`is`). Singletons and cached small integers are
    /// identical when equal; containers and callables compare by pointer.
    #[must_use]
    pub fn is_identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b && (SMALL_INT_MIN..=SMALL_INT_MAX).contains(a),
            (Self::Str(a), Self::Str(b)) => Arc::ptr_eq(a, b),
            (Self::List(a), Self::List(b)) => Arc::ptr_eq(a, b),
            (Self::Tuple(a), Self::Tuple(b)) => Arc::ptr_eq(a, b),
            (Self::Dict(a), Self::Dict(b)) => Arc::ptr_eq(a, b),
            (Self::Set(a), Self::Set(b)) => Arc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Arc::ptr_eq(a, b),
            (Self::Lambda(a), Self::Lambda(b)) => Arc::ptr_eq(a, b),
            (Self::Builtin(a), Self::Builtin(b)) => Arc::ptr_eq(a, b),
            (Self::Library(a), Self::Library(b)) => Arc::ptr_eq(a, b),
            (Self::Class(a), Self::Class(b)) => Arc::ptr_eq(a, b),
            (Self::Instance(a), Self::Instance(b)) => Arc::ptr_eq(a, b),
            (Self::Iterator(a), Self::Iterator(b)) => Arc::ptr_eq(a, b),
            (Self::ExcClass(a), Self::ExcClass(b)) => a == b,
            (Self::Exception(a), Self::Exception(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Ordering for `<`/`>`/`<=`/`>=`. Numbers compare numerically, strings
    /// and sequences lexicographically; anything else is not ordered.
    pub(crate) fn py_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Bool(a), _) => Self::Int(i64::from(*a)).py_cmp(other),
            (_, Self::Bool(b)) => self.py_cmp(&Self::Int(i64::from(*b))),
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            (Self::List(a), Self::List(b)) => {
                if Arc::ptr_eq(a, b) {
                    return Some(Ordering::Equal);
                }
                let a = read_lock(a);
                let b = read_lock(b);
                cmp_sequences(&a, &b)
            }
            (Self::Tuple(a), Self::Tuple(b)) => cmp_sequences(a, b),
            _ => None,
        }
    }

    /// Human-facing string form (`str()`); strings render without quotes.
    #[must_use]
    pub fn py_str(&self) -> String {
        match self {
            Self::Str(s) => s.to_string(),
            Self::Exception(exc) => exc.message.clone().unwrap_or_default(),
            _ => self.py_repr(),
        }
    }

    /// Developer-facing form (`repr()`); cycles render as `[...]`-style
    /// placeholders.
    #[must_use]
    pub fn py_repr(&self) -> String {
        let mut out = String::new();
        let mut visited = Vec::new();
        self.repr_into(&mut out, &mut visited);
        out
    }

    fn repr_into(&self, out: &mut String, visited: &mut Vec<usize>) {
        match self {
            Self::None => out.push_str("None"),
            Self::Bool(true) => out.push_str("True"),
            Self::Bool(false) => out.push_str("False"),
            Self::Int(n) => out.push_str(&n.to_string()),
            Self::Float(f) => out.push_str(&format_float(*f)),
            Self::Str(s) => out.push_str(&repr_str(s)),
            Self::List(items) => {
                let addr = Arc::as_ptr(items) as usize;
                if visited.contains(&addr) {
                    out.push_str("[...]");
                    return;
                }
                visited.push(addr);
                out.push('[');
                for (i, item) in read_lock(items).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.repr_into(out, visited);
                }
                out.push(']');
                visited.pop();
            }
            Self::Tuple(items) => {
                let addr = Arc::as_ptr(items).cast::<Self>() as usize;
                if visited.contains(&addr) {
                    out.push_str("(...)");
                    return;
                }
                visited.push(addr);
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.repr_into(out, visited);
                }
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
                visited.pop();
            }
            Self::Dict(dict) => {
                let addr = Arc::as_ptr(dict) as usize;
                if visited.contains(&addr) {
                    out.push_str("{...}");
                    return;
                }
                visited.push(addr);
                out.push('{');
                for (i, (key, value)) in read_lock(dict).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.repr_into(out, visited);
                    out.push_str(": ");
                    value.repr_into(out, visited);
                }
                out.push('}');
                visited.pop();
            }
            Self::Set(set) => {
                let addr = Arc::as_ptr(set) as usize;
                if visited.contains(&addr) {
                    out.push_str("{...}");
                    return;
                }
                visited.push(addr);
                let set = read_lock(set);
                if set.is_empty() {
                    out.push_str("set()");
                } else {
                    out.push('{');
                    for (i, item) in set.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        item.repr_into(out, visited);
                    }
                    out.push('}');
                }
                visited.pop();
            }
            Self::Slice(slice) => {
                let bound = |b: Option<i64>| b.map_or_else(|| "None".to_owned(), |n| n.to_string());
                out.push_str(&format!(
                    "slice({}, {}, {})",
                    bound(slice.start),
                    bound(slice.stop),
                    bound(slice.step)
                ));
            }
            Self::Iterator(_) => out.push_str("<iterator>"),
            Self::DictView(view) => {
                out.push_str(view.label());
                out.push('(');
                Self::list(view.snapshot()).repr_into(out, visited);
                out.push(')');
            }
            Self::Function(function) => {
                out.push_str("<function ");
                out.push_str(&function.def.name);
                out.push('>');
            }
            Self::Lambda(_) => out.push_str("<lambda>"),
            Self::BoundMethod(method) => {
                out.push_str("<bound method ");
                match &method.func {
                    Self::Function(function) => out.push_str(&function.def.name),
                    other => out.push_str(other.type_name()),
                }
                out.push('>');
            }
            Self::TypeMethod(method) => {
                out.push_str(&format!(
                    "<built-in method {} of {} object>",
                    method.name,
                    method.receiver.type_name()
                ));
            }
            Self::Builtin(function) => {
                out.push_str(&format!("<built-in function {}>", function.name()));
            }
            Self::Library(library) => {
                out.push_str(&format!("<module '{}'>", library.name()));
            }
            Self::Class(class) => out.push_str(&format!("<class '{}'>", class.name)),
            Self::Instance(instance) => out.push_str(&format!("<{} object>", instance.class.name)),
            Self::Super(sup) => out.push_str(&format!("<super: '{}'>", sup.class.name)),
            Self::Property(_) => out.push_str("<property>"),
            Self::StaticMethod(_) => out.push_str("<staticmethod>"),
            Self::ExcClass(exc_type) => out.push_str(&format!("<class '{exc_type}'>")),
            Self::Exception(exc) => match &exc.message {
                Some(message) => out.push_str(&format!("{}({})", exc.exc_type, repr_str(message))),
                None => out.push_str(&format!("{}()", exc.exc_type)),
            },
        }
    }

    /// Deep copy for explicit hand-off: containers are recursed, instances
    /// get fresh field maps, immutable and callable values are shared.
    /// Cycles are not tracked and will recurse without bound.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        match self {
            Self::List(items) => Self::list(read_lock(items).iter().map(Self::deep_copy).collect()),
            Self::Tuple(items) => Self::tuple(items.iter().map(Self::deep_copy).collect()),
            Self::Dict(dict) => {
                let mut copy = Dict::new();
                for (key, value) in read_lock(dict).iter() {
                    // Keys were hashable when inserted, so re-inserting the
                    // deep copies cannot fail.
                    let _ = copy.insert(key.deep_copy(), value.deep_copy());
                }
                Self::dict(copy)
            }
            Self::Set(set) => {
                let mut copy = Set::new();
                for item in read_lock(set).iter() {
                    let _ = copy.insert(item.deep_copy());
                }
                Self::set(copy)
            }
            Self::Instance(instance) => {
                let fields = read_lock(&instance.fields)
                    .iter()
                    .map(|(name, value)| (Arc::clone(name), value.deep_copy()))
                    .collect();
                Self::Instance(Arc::new(Instance {
                    class: Arc::clone(&instance.class),
                    fields: RwLock::new(fields),
                }))
            }
            other => other.clone(),
        }
    }

    /// Strict accessor: the i64 payload or a type error.
    pub(crate) fn as_int(&self) -> RunResult<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            Self::Bool(b) => Ok(i64::from(*b)),
            other => Err(RunError::type_error(format!(
                "expected int, got {}",
                other.type_name()
            ))),
        }
    }

    /// Coercing accessor: parses strings and truncates floats like `int()`.
    pub(crate) fn coerce_int(&self) -> RunResult<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            Self::Bool(b) => Ok(i64::from(*b)),
            Self::Float(f) => Ok(*f as i64),
            Self::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| RunError::value_error(format!("invalid literal for int(): {}", repr_str(s)))),
            other => Err(RunError::type_error(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))),
        }
    }

    pub(crate) fn as_float(&self) -> RunResult<f64> {
        match self {
            Self::Float(f) => Ok(*f),
            Self::Int(n) => Ok(*n as f64),
            Self::Bool(b) => Ok(f64::from(i8::from(*b))),
            other => Err(RunError::type_error(format!(
                "expected float, got {}",
                other.type_name()
            ))),
        }
    }

    pub(crate) fn coerce_float(&self) -> RunResult<f64> {
        match self {
            Self::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| RunError::value_error(format!("could not convert string to float: {}", repr_str(s)))),
            other => other.as_float(),
        }
    }

    pub(crate) fn as_str(&self) -> RunResult<&Arc<str>> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(RunError::type_error(format!(
                "expected str, got {}",
                other.type_name()
            ))),
        }
    }
}

fn cmp_sequences(a: &[Value], b: &[Value]) -> Option<Ordering> {
    for (x, y) in a.iter().zip(b.iter()) {
        if x.py_eq(y) {
            continue;
        }
        return x.py_cmp(y);
    }
    Some(a.len().cmp(&b.len()))
}

/// Float rendering matching Python's `str`: `3.0` keeps its point, large
/// magnitudes use `e+NN` exponents, non-finite values are `inf`/`nan`.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_owned();
    }
    if f.is_infinite() {
        return if f < 0.0 { "-inf".to_owned() } else { "inf".to_owned() };
    }
    let mut buffer = ryu::Buffer::new();
    let s = buffer.format_finite(f);
    if s.contains('e') { fix_exponent(s) } else { s.to_owned() }
}

/// Quoted string form matching Python's repr: single quotes preferred,
/// switching to double quotes when the text contains a single quote only.
pub(crate) fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Builds an exception value from a constructor call, e.g.
/// `ValueError("boom")` or `SystemExit(2)`.
pub(crate) fn construct_exception(exc_type: ExcType, args: &[Value]) -> RunResult<Value> {
    let mut exc = Exception::new(exc_type);
    match args {
        [] => {}
        [arg] => {
            if exc_type == ExcType::SystemExit {
                match arg {
                    Value::Int(code) => exc.exit_code = Some(i32::try_from(*code).unwrap_or(1)),
                    Value::None => {}
                    other => exc.message = Some(other.py_str()),
                }
            } else {
                exc.message = Some(arg.py_str());
            }
        }
        args => {
            return Err(RunError::type_error(format!(
                "{exc_type}() takes at most 1 argument ({} given)",
                args.len()
            )));
        }
    }
    Ok(Value::Exception(Arc::new(exc)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::None.truthy());
        assert!(!Value::Int(0).truthy());
        assert!(Value::Int(-1).truthy());
        assert!(!Value::str("").truthy());
        assert!(Value::str("x").truthy());
        assert!(!Value::list(vec![]).truthy());
        assert!(Value::list(vec![Value::None]).truthy());
    }

    #[test]
    fn numeric_equality_crosses_kinds() {
        assert!(Value::Int(1).py_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).py_eq(&Value::Int(1)));
        assert!(!Value::Int(1).py_eq(&Value::str("1")));
    }

    #[test]
    fn small_int_identity_range() {
        assert!(Value::Int(5).is_identical(&Value::Int(5)));
        assert!(Value::Int(10_000).is_identical(&Value::Int(10_000)));
        assert!(!Value::Int(10_001).is_identical(&Value::Int(10_001)));
        assert!(!Value::Int(-6).is_identical(&Value::Int(-6)));
    }

    #[test]
    fn float_repr_keeps_point() {
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(1e20), "1e+20");
    }

    #[test]
    fn cyclic_list_repr_uses_placeholder() {
        let inner = Arc::new(RwLock::new(vec![Value::Int(1)]));
        let list = Value::List(Arc::clone(&inner));
        write_lock(&inner).push(list.clone());
        assert_eq!(list.py_repr(), "[1, [...]]");
    }

    #[test]
    fn string_repr_quoting() {
        assert_eq!(repr_str("ab"), "'ab'");
        assert_eq!(repr_str("it's"), "\"it's\"");
        assert_eq!(repr_str("a\nb"), "'a\\nb'");
    }

    #[test]
    fn tuple_repr_single_element() {
        assert_eq!(Value::tuple(vec![Value::Int(1)]).py_repr(), "(1,)");
    }
}
