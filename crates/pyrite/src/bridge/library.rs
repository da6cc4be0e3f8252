//! Importable libraries.
//!
//! A library is a named namespace of native functions, constants and
//! sub-libraries, exposed to scripts via `import`. Functions are reachable
//! both by direct attribute lookup (`lib.fn(...)`) and through a lazily
//! built dict view (`lib.__dict__`). A library may be instantiated with
//! host instance data (e.g. an HTTP client); scripted code keeps seeing the
//! same library surface while natives pull the instance data from their
//! context handle.

use std::any::Any;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;

use super::{IntoNativeFn, NativeCtor, NativeFunction};
use crate::bridge::convert::IntoScript;
use crate::value::{Dict, Value};

type Map<V> = IndexMap<String, V, ahash::RandomState>;

pub struct Library {
    name: String,
    functions: Map<Arc<NativeFunction>>,
    constants: Map<Value>,
    children: Map<Arc<Library>>,
    constructor: Option<Arc<NativeCtor>>,
    instance: Option<Arc<dyn Any + Send + Sync>>,
    dict_view: OnceLock<Value>,
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("functions", &self.functions.len())
            .field("constants", &self.constants.len())
            .field("children", &self.children.len())
            .finish()
    }
}

impl Library {
    /// Starts a library definition.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> LibraryBuilder {
        LibraryBuilder {
            name: name.into(),
            functions: Map::default(),
            constants: Map::default(),
            children: Map::default(),
            constructor: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a member: functions first, then constants, then
    /// sub-libraries; `__dict__` resolves to the lazily built dict view.
    pub(crate) fn attr(self: &Arc<Self>, name: &str) -> Option<Value> {
        if name == "__dict__" {
            return Some(self.dict_value());
        }
        if let Some(function) = self.functions.get(name) {
            return Some(Value::Builtin(Arc::clone(function)));
        }
        if let Some(constant) = self.constants.get(name) {
            return Some(constant.clone());
        }
        if let Some(child) = self.children.get(name) {
            return Some(Value::Library(Arc::clone(child)));
        }
        None
    }

    /// Member names for diagnostics and `dir()`-style listings.
    pub(crate) fn attr_names(&self) -> Vec<String> {
        self.functions
            .keys()
            .chain(self.constants.keys())
            .chain(self.children.keys())
            .cloned()
            .collect()
    }

    /// Walks a dotted path (`a.b.c`) through sub-libraries.
    pub(crate) fn lookup_path(self: &Arc<Self>, path: &[impl AsRef<str>]) -> Option<Arc<Self>> {
        let mut current = Arc::clone(self);
        for segment in path {
            let next = current.children.get(segment.as_ref())?;
            current = Arc::clone(next);
        }
        Some(current)
    }

    pub(crate) fn constructor(&self) -> Option<Arc<NativeCtor>> {
        self.constructor.clone()
    }

    pub(crate) fn instance_data(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.instance.clone()
    }

    /// Creates a new library sharing this one's definition with instance
    /// data attached. Function shells are re-bound so their context handle
    /// resolves to the instantiated library.
    #[must_use]
    pub fn instantiate(self: &Arc<Self>, instance: Arc<dyn Any + Send + Sync>) -> Arc<Self> {
        let library = Arc::new(Self {
            name: self.name.clone(),
            functions: self
                .functions
                .iter()
                .map(|(name, function)| (name.clone(), Arc::new(function.shell_clone())))
                .collect(),
            constants: self.constants.clone(),
            children: self.children.clone(),
            constructor: self.constructor.clone(),
            instance: Some(instance),
            dict_view: OnceLock::new(),
        });
        for function in library.functions.values() {
            function.bind_owner(&library);
        }
        library
    }

    /// The `__dict__` view: built on first access, then shared.
    pub(crate) fn dict_value(self: &Arc<Self>) -> Value {
        self.dict_view
            .get_or_init(|| {
                let mut dict = Dict::new();
                for (name, function) in &self.functions {
                    let _ = dict.insert(Value::str(name.as_str()), Value::Builtin(Arc::clone(function)));
                }
                for (name, constant) in &self.constants {
                    let _ = dict.insert(Value::str(name.as_str()), constant.clone());
                }
                for (name, child) in &self.children {
                    let _ = dict.insert(Value::str(name.as_str()), Value::Library(Arc::clone(child)));
                }
                Value::dict(dict)
            })
            .clone()
    }

    /// Docstring of a member function, if present.
    #[must_use]
    pub fn doc(&self, name: &str) -> Option<&str> {
        self.functions.get(name).and_then(|f| f.doc())
    }
}

/// Builder for [`Library`] definitions.
///
/// ```
/// use pyrite::Library;
///
/// let lib = Library::builder("geometry")
///     .constant("pi", std::f64::consts::PI)
///     .func("area", |r: f64| std::f64::consts::PI * r * r)
///     .build();
/// assert_eq!(lib.name(), "geometry");
/// ```
pub struct LibraryBuilder {
    name: String,
    functions: Map<Arc<NativeFunction>>,
    constants: Map<Value>,
    children: Map<Arc<Library>>,
    constructor: Option<Arc<NativeCtor>>,
}

impl LibraryBuilder {
    /// Adds a typed native function.
    #[must_use]
    pub fn func<M>(mut self, name: &str, f: impl IntoNativeFn<M>) -> Self {
        self.functions
            .insert(name.to_owned(), Arc::new(NativeFunction::new(name, f)));
        self
    }

    /// Adds a typed native function with a docstring.
    #[must_use]
    pub fn func_doc<M>(mut self, name: &str, doc: &str, f: impl IntoNativeFn<M>) -> Self {
        self.functions
            .insert(name.to_owned(), Arc::new(NativeFunction::new(name, f).with_doc(doc)));
        self
    }

    /// Adds a pre-built native function under its own name.
    #[must_use]
    pub fn function(mut self, function: NativeFunction) -> Self {
        self.functions.insert(function.name().to_owned(), Arc::new(function));
        self
    }

    #[must_use]
    pub fn constant(mut self, name: &str, value: impl IntoScript) -> Self {
        self.constants.insert(name.to_owned(), value.into_script());
        self
    }

    /// Attaches a sub-library, enabling dotted imports like `a.b.c`.
    #[must_use]
    pub fn sub_library(mut self, child: Arc<Library>) -> Self {
        self.children.insert(child.name().to_owned(), child);
        self
    }

    /// Makes the library callable as a class: the constructor produces the
    /// instance data attached to the returned library instance.
    #[must_use]
    pub fn constructor(
        mut self,
        f: impl Fn(&super::NativeContext<'_>, super::CallArgs) -> Result<Arc<dyn Any + Send + Sync>, crate::exception::OpError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.constructor = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<Library> {
        let library = Arc::new(Library {
            name: self.name,
            functions: self.functions,
            constants: self.constants,
            children: self.children,
            constructor: self.constructor,
            instance: None,
            dict_view: OnceLock::new(),
        });
        for function in library.functions.values() {
            function.bind_owner(&library);
        }
        library
    }
}
