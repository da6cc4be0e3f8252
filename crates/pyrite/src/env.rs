//! Lexically scoped environments.
//!
//! An environment owns a name→value map and points at its enclosing
//! environment; lookup walks the chain. `global`/`nonlocal` marker sets are
//! lazily allocated so plain function calls pay nothing for them. All maps
//! sit behind `RwLock`s: script execution is single-threaded, but the host
//! may read-share an environment across native worker threads.
//!
//! Environments also carry the captured stdout writer, stdin reader, and the
//! import hooks, each searched upward so only the root normally stores them.

use std::sync::{Arc, Mutex, RwLock};

use ahash::{AHashMap, AHashSet};

use crate::bridge::library::Library;
use crate::exception::{RunError, RunResult};
use crate::io::{ScriptInput, ScriptOutput};
use crate::value::{read_lock, write_lock, Value};

pub(crate) type SharedOutput = Arc<Mutex<dyn ScriptOutput>>;
pub(crate) type SharedInput = Arc<Mutex<dyn ScriptInput>>;
/// Resolves a module name the interpreter doesn't know to a library.
pub(crate) type ImportResolver = dyn Fn(&str) -> Option<Arc<Library>> + Send + Sync;
/// Enumerates the importable library names the host has registered.
pub(crate) type LibraryEnumerator = dyn Fn() -> Vec<String> + Send + Sync;

#[derive(Default)]
pub struct Env {
    bindings: RwLock<AHashMap<Arc<str>, Value>>,
    globals: RwLock<Option<AHashSet<Arc<str>>>>,
    nonlocals: RwLock<Option<AHashSet<Arc<str>>>>,
    outer: Option<Arc<Env>>,
    stdout: RwLock<Option<SharedOutput>>,
    stdin: RwLock<Option<SharedInput>>,
    import_resolver: RwLock<Option<Arc<ImportResolver>>>,
    library_names: RwLock<Option<Arc<LibraryEnumerator>>>,
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("bindings", &read_lock(&self.bindings).len())
            .field("has_outer", &self.outer.is_some())
            .finish()
    }
}

impl Env {
    /// Creates a root (module-level) environment.
    pub(crate) fn new_root() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a fresh environment enclosed in `outer`, as used for each
    /// function call.
    pub(crate) fn enclosed(outer: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self {
            outer: Some(Arc::clone(outer)),
            ..Self::default()
        })
    }

    /// Looks a name up through the scope chain.
    pub(crate) fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = read_lock(&self.bindings).get(name) {
            return Some(value.clone());
        }
        self.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// True if this scope (not the chain) binds `name`.
    pub(crate) fn binds_locally(&self, name: &str) -> bool {
        read_lock(&self.bindings).contains_key(name)
    }

    /// Binds a name in this scope unconditionally, ignoring markers.
    ///
    /// Used for parameter binding and internal bindings.
    pub(crate) fn insert(&self, name: Arc<str>, value: Value) {
        write_lock(&self.bindings).insert(name, value);
    }

    /// Assigns respecting `global`/`nonlocal` markers: a marked-global name
    /// writes to the outermost environment, a marked-nonlocal name writes to
    /// the nearest enclosing scope that already binds it.
    pub(crate) fn set(&self, name: &Arc<str>, value: Value) -> RunResult<()> {
        if self.is_marked(&self.globals, name) {
            self.root_env().insert(Arc::clone(name), value);
            return Ok(());
        }
        if self.is_marked(&self.nonlocals, name) {
            let mut scope = self.outer.as_deref();
            while let Some(env) = scope {
                if env.binds_locally(name) {
                    env.insert(Arc::clone(name), value);
                    return Ok(());
                }
                scope = env.outer.as_deref();
            }
            return Err(RunError::name_error(format!(
                "no binding for nonlocal '{name}' found"
            )));
        }
        self.insert(Arc::clone(name), value);
        Ok(())
    }

    /// Removes a binding from this scope, walking outward if absent locally.
    pub(crate) fn delete(&self, name: &str) -> bool {
        if write_lock(&self.bindings).remove(name).is_some() {
            return true;
        }
        self.outer.as_ref().is_some_and(|outer| outer.delete(name))
    }

    /// Drains this scope's bindings, as used when a class body's scope
    /// becomes the class attribute map.
    pub(crate) fn take_bindings(&self) -> AHashMap<Arc<str>, Value> {
        std::mem::take(&mut *write_lock(&self.bindings))
    }

    pub(crate) fn mark_global(&self, name: Arc<str>) {
        write_lock(&self.globals).get_or_insert_with(AHashSet::new).insert(name);
    }

    pub(crate) fn mark_nonlocal(&self, name: Arc<str>) {
        write_lock(&self.nonlocals)
            .get_or_insert_with(AHashSet::new)
            .insert(name);
    }

    fn is_marked(&self, set: &RwLock<Option<AHashSet<Arc<str>>>>, name: &str) -> bool {
        read_lock(set).as_ref().is_some_and(|marks| marks.contains(name))
    }

    fn root_env(&self) -> &Self {
        let mut env = self;
        while let Some(outer) = env.outer.as_deref() {
            env = outer;
        }
        env
    }

    pub(crate) fn set_stdout(&self, writer: SharedOutput) {
        *write_lock(&self.stdout) = Some(writer);
    }

    pub(crate) fn set_stdin(&self, reader: SharedInput) {
        *write_lock(&self.stdin) = Some(reader);
    }

    /// The nearest captured stdout writer up the chain.
    pub(crate) fn stdout(&self) -> Option<SharedOutput> {
        if let Some(writer) = read_lock(&self.stdout).as_ref() {
            return Some(Arc::clone(writer));
        }
        self.outer.as_ref().and_then(|outer| outer.stdout())
    }

    pub(crate) fn stdin(&self) -> Option<SharedInput> {
        if let Some(reader) = read_lock(&self.stdin).as_ref() {
            return Some(Arc::clone(reader));
        }
        self.outer.as_ref().and_then(|outer| outer.stdin())
    }

    pub(crate) fn set_import_resolver(&self, resolver: Arc<ImportResolver>) {
        *write_lock(&self.import_resolver) = Some(resolver);
    }

    pub(crate) fn set_library_enumerator(&self, names: Arc<LibraryEnumerator>) {
        *write_lock(&self.library_names) = Some(names);
    }

    /// Resolves an importable library by name, searching the chain upward.
    pub(crate) fn resolve_import(&self, name: &str) -> Option<Arc<Library>> {
        if let Some(resolver) = read_lock(&self.import_resolver).as_ref() {
            if let Some(library) = resolver(name) {
                return Some(library);
            }
        }
        self.outer.as_ref().and_then(|outer| outer.resolve_import(name))
    }

    /// Names of the libraries available for import, for diagnostics.
    pub(crate) fn available_libraries(&self) -> Vec<String> {
        if let Some(names) = read_lock(&self.library_names).as_ref() {
            return names();
        }
        self.outer
            .as_ref()
            .map_or_else(Vec::new, |outer| outer.available_libraries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_the_chain() {
        let root = Env::new_root();
        root.insert("x".into(), Value::Int(1));
        let inner = Env::enclosed(&root);
        assert!(matches!(inner.get("x"), Some(Value::Int(1))));
        assert!(inner.get("y").is_none());
    }

    #[test]
    fn assignment_is_local_by_default() {
        let root = Env::new_root();
        root.insert("x".into(), Value::Int(1));
        let inner = Env::enclosed(&root);
        inner.set(&Arc::from("x"), Value::Int(2)).unwrap();
        assert!(matches!(root.get("x"), Some(Value::Int(1))));
        assert!(matches!(inner.get("x"), Some(Value::Int(2))));
    }

    #[test]
    fn global_marker_writes_to_root() {
        let root = Env::new_root();
        root.insert("x".into(), Value::Int(1));
        let inner = Env::enclosed(&root);
        inner.mark_global(Arc::from("x"));
        inner.set(&Arc::from("x"), Value::Int(2)).unwrap();
        assert!(matches!(root.get("x"), Some(Value::Int(2))));
        assert!(!inner.binds_locally("x"));
    }

    #[test]
    fn nonlocal_writes_to_nearest_binding_scope() {
        let root = Env::new_root();
        let mid = Env::enclosed(&root);
        mid.insert("n".into(), Value::Int(0));
        let inner = Env::enclosed(&mid);
        inner.mark_nonlocal(Arc::from("n"));
        inner.set(&Arc::from("n"), Value::Int(5)).unwrap();
        assert!(matches!(mid.get("n"), Some(Value::Int(5))));
        assert!(!root.binds_locally("n"));
    }

    #[test]
    fn nonlocal_without_binding_is_a_name_error() {
        let root = Env::new_root();
        let inner = Env::enclosed(&root);
        inner.mark_nonlocal(Arc::from("missing"));
        assert!(inner.set(&Arc::from("missing"), Value::None).is_err());
    }

    #[test]
    fn stdout_is_searched_upward() {
        let root = Env::new_root();
        root.set_stdout(Arc::new(Mutex::new(crate::io::CollectStringOutput::new())));
        let inner = Env::enclosed(&Env::enclosed(&root));
        assert!(inner.stdout().is_some());
    }
}
