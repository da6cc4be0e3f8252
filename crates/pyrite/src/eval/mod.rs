//! Tree-walking evaluator.
//!
//! A recursive walk over the syntax tree. Non-normal completion (`return`,
//! `break`, `continue`, raised exceptions and recoverable errors) rides the
//! `Err` side of [`EvalResult`] as [`Unwind`] values, so every recursive
//! call propagates with `?` and the defining construct unwraps what belongs
//! to it: loops absorb `Break`/`Continue`, calls absorb `Return`, `try`
//! absorbs matching exceptions, `finally` runs on every path.

pub(crate) mod attr;
pub(crate) mod binop;
pub(crate) mod call;
pub(crate) mod index;
pub(crate) mod matching;

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use crate::ast::{CompClause, Comprehension, Expr, ExprKind, FStringPart, Stmt};
use crate::bridge::CancelToken;
use crate::env::Env;
use crate::exception::{ExcType, Exception, RunError, Unwind};
use crate::iter::{collect_iterable, ScriptIter};
use crate::resource::ResourceLimits;
use crate::tracer::EvalTracer;
use crate::value::{Dict, Set, Value};

pub(crate) type EvalResult<T = Value> = Result<T, Unwind>;

/// Shared per-interpreter execution state: limits, tracing, cancellation.
pub(crate) struct Machine {
    pub limits: ResourceLimits,
    pub tracer: Arc<dyn EvalTracer>,
    pub cancel: CancelToken,
}

/// One evaluation session over a machine.
///
/// Holds the script call depth and the stack of currently-handled exceptions
/// (for bare `raise`). The evaluator itself carries no bindings; those live
/// in the environment chain.
pub(crate) struct Evaluator<'a> {
    machine: &'a Machine,
    depth: Cell<usize>,
    handling: RefCell<Vec<Exception>>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(machine: &'a Machine) -> Self {
        Self {
            machine,
            depth: Cell::new(0),
            handling: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn machine(&self) -> &Machine {
        self.machine
    }

    pub(crate) fn cancel_token(&self) -> &CancelToken {
        &self.machine.cancel
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth.get()
    }

    pub(crate) fn enter_frame(&self) -> EvalResult<()> {
        self.machine.limits.check_recursion_depth(self.depth.get())?;
        self.depth.set(self.depth.get() + 1);
        Ok(())
    }

    pub(crate) fn exit_frame(&self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }

    /// Executes a statement block; the value of the last expression
    /// statement becomes the block's value (`None` otherwise).
    pub(crate) fn exec_block(&self, stmts: &[Stmt], env: &Arc<Env>) -> EvalResult {
        let mut last = Value::None;
        for stmt in stmts {
            last = self.exec_stmt(stmt, env)?;
        }
        Ok(last)
    }

    fn exec_stmt(&self, stmt: &Stmt, env: &Arc<Env>) -> EvalResult {
        let line = stmt.line();
        self.machine.tracer.on_statement(line);
        let result = self.exec_stmt_inner(stmt, env);
        result.map_err(|unwind| {
            if let Unwind::Raise(error) = &unwind {
                self.machine.tracer.on_raise(error);
            }
            unwind.with_line(line)
        })
    }

    fn exec_stmt_inner(&self, stmt: &Stmt, env: &Arc<Env>) -> EvalResult {
        match stmt {
            Stmt::Expr { expr, .. } => self.eval_expr(expr, env),
            Stmt::Assign { target, value, .. } => {
                let value = self.eval_expr(value, env)?;
                self.assign(target, value, env)?;
                Ok(Value::None)
            }
            Stmt::AugAssign { target, op, value, .. } => {
                self.aug_assign(target, *op, value, env)?;
                Ok(Value::None)
            }
            Stmt::If { branches, orelse, .. } => {
                for (cond, body) in branches {
                    if self.eval_expr(cond, env)?.truthy() {
                        return self.exec_block(body, env).map(|_| Value::None);
                    }
                }
                if let Some(body) = orelse {
                    self.exec_block(body, env)?;
                }
                Ok(Value::None)
            }
            Stmt::While { cond, body, .. } => {
                while self.eval_expr(cond, env)?.truthy() {
                    match self.exec_block(body, env) {
                        Ok(_) | Err(Unwind::Continue) => {}
                        Err(Unwind::Break) => break,
                        Err(unwind) => return Err(unwind),
                    }
                }
                Ok(Value::None)
            }
            Stmt::For {
                target, iterable, body, ..
            } => {
                let iterable = self.eval_expr(iterable, env)?;
                let Value::Iterator(iter) = ScriptIter::for_value(&iterable)? else {
                    unreachable!("for_value always returns an iterator");
                };
                while let Some(item) = iter.advance() {
                    self.assign(target, item, env)?;
                    match self.exec_block(body, env) {
                        Ok(_) | Err(Unwind::Continue) => {}
                        Err(Unwind::Break) => break,
                        Err(unwind) => return Err(unwind),
                    }
                }
                Ok(Value::None)
            }
            Stmt::FunctionDef(def) => {
                let function = self.make_function(def, env)?;
                env.set(&def.name, function)?;
                Ok(Value::None)
            }
            Stmt::ClassDef { name, base, body, .. } => {
                let class = self.make_class(name, base.as_ref(), body, env)?;
                env.set(name, class)?;
                Ok(Value::None)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::None,
                };
                Err(Unwind::Return(value))
            }
            Stmt::Break { .. } => Err(Unwind::Break),
            Stmt::Continue { .. } => Err(Unwind::Continue),
            Stmt::Pass { .. } => Ok(Value::None),
            Stmt::Import { items, .. } => {
                self.exec_import(items, env)?;
                Ok(Value::None)
            }
            Stmt::FromImport { module, names, .. } => {
                self.exec_from_import(module, names, env)?;
                Ok(Value::None)
            }
            Stmt::Try {
                body,
                handlers,
                finally,
                ..
            } => self.exec_try(body, handlers, finally.as_deref(), env),
            Stmt::Raise { value, .. } => Err(self.exec_raise(value.as_ref(), env)),
            Stmt::Global { names, .. } => {
                for name in names {
                    env.mark_global(Arc::clone(name));
                }
                Ok(Value::None)
            }
            Stmt::Nonlocal { names, .. } => {
                for name in names {
                    env.mark_nonlocal(Arc::clone(name));
                }
                Ok(Value::None)
            }
            Stmt::Assert { cond, message, .. } => {
                if !self.eval_expr(cond, env)?.truthy() {
                    let message = match message {
                        Some(expr) => Some(self.eval_expr(expr, env)?.py_str()),
                        None => None,
                    };
                    let mut exc = Exception::new(ExcType::AssertionError);
                    exc.message = message;
                    return Err(exc.into());
                }
                Ok(Value::None)
            }
            Stmt::Match { subject, cases, .. } => {
                let subject = self.eval_expr(subject, env)?;
                matching::exec_match(self, &subject, cases, env)?;
                Ok(Value::None)
            }
        }
    }

    // -- expressions --------------------------------------------------------

    pub(crate) fn eval_expr(&self, expr: &Expr, env: &Arc<Env>) -> EvalResult {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(f) => Ok(Value::Float(*f)),
            ExprKind::Str(s) => Ok(Value::Str(Arc::clone(s))),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::NoneLit => Ok(Value::None),
            ExprKind::FString(parts) => self.eval_fstring(parts, env),
            ExprKind::Ident(name) => env.get(name).ok_or_else(|| {
                Unwind::Raise(RunError::name_error(format!("name '{name}' is not defined")).with_expr_line(expr.line))
            }),
            ExprKind::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                self.eval_sequence_items(items, env, &mut values)?;
                Ok(Value::list(values))
            }
            ExprKind::Tuple(items) => {
                let mut values = Vec::with_capacity(items.len());
                self.eval_sequence_items(items, env, &mut values)?;
                Ok(Value::tuple(values))
            }
            ExprKind::Set(items) => {
                let mut values = Vec::with_capacity(items.len());
                self.eval_sequence_items(items, env, &mut values)?;
                let mut set = Set::new();
                for value in values {
                    set.insert(value)?;
                }
                Ok(Value::set(set))
            }
            ExprKind::Dict(entries) => {
                let mut dict = Dict::new();
                for (key_expr, value_expr) in entries {
                    let key = self.eval_expr(key_expr, env)?;
                    let value = self.eval_expr(value_expr, env)?;
                    dict.insert(key, value)?;
                }
                Ok(Value::dict(dict))
            }
            ExprKind::Starred(_) => Err(RunError::type_error("starred expression outside of assignment or call").into()),
            ExprKind::Prefix { op, operand } => {
                let value = self.eval_expr(operand, env)?;
                Ok(binop::prefix(*op, &value)?)
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval_expr(left, env)?;
                let right = self.eval_expr(right, env)?;
                Ok(binop::binary(*op, &left, &right)?)
            }
            ExprKind::BoolOp { op, left, right } => {
                let left = self.eval_expr(left, env)?;
                let commit_on_left = match op {
                    crate::ast::BoolOpKind::And => !left.truthy(),
                    crate::ast::BoolOpKind::Or => left.truthy(),
                };
                if commit_on_left {
                    Ok(left)
                } else {
                    self.eval_expr(right, env)
                }
            }
            ExprKind::Conditional { cond, then, orelse } => {
                if self.eval_expr(cond, env)?.truthy() {
                    self.eval_expr(then, env)
                } else {
                    self.eval_expr(orelse, env)
                }
            }
            ExprKind::Call { callee, args } => self.eval_call_expr(callee, args, env, expr.line),
            ExprKind::Attr { obj, name } => {
                let obj = self.eval_expr(obj, env)?;
                Ok(attr::get_attr(self, &obj, name, env)?)
            }
            ExprKind::Index { obj, index } => {
                let obj = self.eval_expr(obj, env)?;
                let index = self.eval_expr(index, env)?;
                Ok(index::get_index(&obj, &index)?)
            }
            ExprKind::Slice {
                obj,
                start,
                stop,
                step,
            } => {
                let obj = self.eval_expr(obj, env)?;
                let start = self.eval_slice_bound(start.as_deref(), env)?;
                let stop = self.eval_slice_bound(stop.as_deref(), env)?;
                let step = self.eval_slice_bound(step.as_deref(), env)?;
                Ok(index::get_slice(&obj, start, stop, step)?)
            }
            ExprKind::Lambda(def) => {
                let mut defaults = Vec::new();
                for param in &def.params {
                    if let Some(default) = &param.default {
                        defaults.push(self.eval_expr(default, env)?);
                    }
                }
                Ok(Value::Lambda(Arc::new(crate::value::LambdaValue {
                    def: Arc::clone(def),
                    defaults,
                    env: Arc::clone(env),
                })))
            }
            ExprKind::ListComp(comp) | ExprKind::Generator(comp) => {
                let mut items = Vec::new();
                let scope = Env::enclosed(env);
                self.run_comp_clauses(comp, 0, &scope, &mut |evaluator, scope| {
                    items.push(evaluator.eval_expr(&comp.element, scope)?);
                    Ok(())
                })?;
                Ok(Value::list(items))
            }
            ExprKind::SetComp(comp) => {
                let mut set = Set::new();
                let scope = Env::enclosed(env);
                self.run_comp_clauses(comp, 0, &scope, &mut |evaluator, scope| {
                    set.insert(evaluator.eval_expr(&comp.element, scope)?)?;
                    Ok(())
                })?;
                Ok(Value::set(set))
            }
            ExprKind::DictComp(comp) => {
                let mut dict = Dict::new();
                let scope = Env::enclosed(env);
                self.run_comp_clauses(comp, 0, &scope, &mut |evaluator, scope| {
                    let key_expr = comp.key.as_ref().expect("dict comprehension has a key");
                    let key = evaluator.eval_expr(key_expr, scope)?;
                    let value = evaluator.eval_expr(&comp.element, scope)?;
                    dict.insert(key, value)?;
                    Ok(())
                })?;
                Ok(Value::dict(dict))
            }
        }
    }

    /// Evaluates sequence items, splicing `*expr` unpackings in place.
    fn eval_sequence_items(&self, items: &[Expr], env: &Arc<Env>, out: &mut Vec<Value>) -> EvalResult<()> {
        for item in items {
            if let ExprKind::Starred(inner) = &item.kind {
                let value = self.eval_expr(inner, env)?;
                out.extend(collect_iterable(&value)?);
            } else {
                out.push(self.eval_expr(item, env)?);
            }
        }
        Ok(())
    }

    fn eval_slice_bound(&self, bound: Option<&Expr>, env: &Arc<Env>) -> EvalResult<Option<i64>> {
        match bound {
            None => Ok(None),
            Some(expr) => match self.eval_expr(expr, env)? {
                Value::None => Ok(None),
                value => Ok(Some(value.as_int()?)),
            },
        }
    }

    /// Runs one `for` clause of a comprehension, recursing into the next
    /// clause or emitting the element at the innermost level.
    fn run_comp_clauses(
        &self,
        comp: &Comprehension,
        clause_idx: usize,
        scope: &Arc<Env>,
        emit: &mut dyn FnMut(&Self, &Arc<Env>) -> EvalResult<()>,
    ) -> EvalResult<()> {
        let Some(CompClause {
            target,
            iterable,
            conds,
        }) = comp.clauses.get(clause_idx)
        else {
            return emit(self, scope);
        };
        let iterable = self.eval_expr(iterable, scope)?;
        let Value::Iterator(iter) = ScriptIter::for_value(&iterable)? else {
            unreachable!("for_value always returns an iterator");
        };
        'items: while let Some(item) = iter.advance() {
            self.assign(target, item, scope)?;
            for cond in conds {
                if !self.eval_expr(cond, scope)?.truthy() {
                    continue 'items;
                }
            }
            self.run_comp_clauses(comp, clause_idx + 1, scope, emit)?;
        }
        Ok(())
    }

    fn eval_fstring(&self, parts: &[FStringPart], env: &Arc<Env>) -> EvalResult {
        let mut out = String::new();
        for part in parts {
            match part {
                FStringPart::Literal(text) => out.push_str(text),
                FStringPart::Interp { expr, spec } => {
                    let value = self.eval_expr(expr, env)?;
                    match spec {
                        Some(spec) => out.push_str(&spec.format(&value)?),
                        None => out.push_str(&value.py_str()),
                    }
                }
            }
        }
        Ok(Value::str(out))
    }

    // -- assignment ---------------------------------------------------------

    /// Assigns a value to any assignable target expression, including tuple
    /// unpacking with an optional starred name.
    pub(crate) fn assign(&self, target: &Expr, value: Value, env: &Arc<Env>) -> EvalResult<()> {
        match &target.kind {
            ExprKind::Ident(name) => {
                env.set(name, value)?;
                Ok(())
            }
            ExprKind::Attr { obj, name } => {
                let obj = self.eval_expr(obj, env)?;
                attr::set_attr(self, &obj, name, value, env)?;
                Ok(())
            }
            ExprKind::Index { obj, index } => {
                let obj = self.eval_expr(obj, env)?;
                let index = self.eval_expr(index, env)?;
                index::set_index(&obj, &index, value)?;
                Ok(())
            }
            ExprKind::Tuple(targets) | ExprKind::List(targets) => self.unpack_assign(targets, value, env),
            ExprKind::Slice { .. } => Err(RunError::type_error("slice assignment is not supported").into()),
            _ => Err(RunError::type_error("cannot assign to this expression").into()),
        }
    }

    /// `a, b = seq` and `*rest, a = seq`.
    fn unpack_assign(&self, targets: &[Expr], value: Value, env: &Arc<Env>) -> EvalResult<()> {
        let values = collect_iterable(&value)?;
        let star_pos = targets
            .iter()
            .position(|t| matches!(t.kind, ExprKind::Starred(_)));
        match star_pos {
            None => {
                if values.len() != targets.len() {
                    return Err(RunError::value_error(format!(
                        "expected {} values to unpack, got {}",
                        targets.len(),
                        values.len()
                    ))
                    .into());
                }
                for (target, value) in targets.iter().zip(values) {
                    self.assign(target, value, env)?;
                }
                Ok(())
            }
            Some(star) => {
                let after = targets.len() - star - 1;
                if values.len() < targets.len() - 1 {
                    return Err(RunError::value_error(format!(
                        "not enough values to unpack (expected at least {}, got {})",
                        targets.len() - 1,
                        values.len()
                    ))
                    .into());
                }
                let mut values = values;
                let tail: Vec<Value> = values.split_off(values.len() - after);
                let middle: Vec<Value> = values.split_off(star);
                for (target, value) in targets[..star].iter().zip(values) {
                    self.assign(target, value, env)?;
                }
                let ExprKind::Starred(star_target) = &targets[star].kind else {
                    unreachable!("position found a starred target");
                };
                self.assign(star_target, Value::list(middle), env)?;
                for (target, value) in targets[star + 1..].iter().zip(tail) {
                    self.assign(target, value, env)?;
                }
                Ok(())
            }
        }
    }

    /// `x op= y`, with in-place semantics for lists.
    fn aug_assign(&self, target: &Expr, op: crate::ast::BinOp, value_expr: &Expr, env: &Arc<Env>) -> EvalResult<()> {
        let rhs = self.eval_expr(value_expr, env)?;
        let current = match &target.kind {
            ExprKind::Ident(name) => env
                .get(name)
                .ok_or_else(|| RunError::name_error(format!("name '{name}' is not defined")))?,
            ExprKind::Attr { obj, name } => {
                let obj = self.eval_expr(obj, env)?;
                let current = attr::get_attr(self, &obj, name, env)?;
                let updated = binop::aug_binary(op, &current, &rhs)?;
                attr::set_attr(self, &obj, name, updated, env)?;
                return Ok(());
            }
            ExprKind::Index { obj, index } => {
                let obj = self.eval_expr(obj, env)?;
                let index = self.eval_expr(index, env)?;
                let current = index::get_index(&obj, &index)?;
                let updated = binop::aug_binary(op, &current, &rhs)?;
                index::set_index(&obj, &index, updated)?;
                return Ok(());
            }
            _ => return Err(RunError::type_error("invalid augmented assignment target").into()),
        };
        let updated = binop::aug_binary(op, &current, &rhs)?;
        let ExprKind::Ident(name) = &target.kind else {
            unreachable!("non-ident targets returned above");
        };
        env.set(name, updated)?;
        Ok(())
    }

    // -- definitions --------------------------------------------------------

    fn make_function(&self, def: &Arc<crate::ast::FunctionDef>, env: &Arc<Env>) -> EvalResult {
        let mut defaults = Vec::new();
        for param in &def.params {
            if let Some(default) = &param.default {
                defaults.push(self.eval_expr(default, env)?);
            }
        }
        Ok(Value::Function(Arc::new(crate::value::Function {
            def: Arc::clone(def),
            defaults,
            env: Arc::clone(env),
        })))
    }

    fn make_class(&self, name: &Arc<str>, base: Option<&Expr>, body: &[Stmt], env: &Arc<Env>) -> EvalResult {
        let base = match base {
            None => None,
            Some(expr) => match self.eval_expr(expr, env)? {
                Value::Class(class) => Some(class),
                other => {
                    return Err(RunError::type_error(format!(
                        "class base must be a class, not {}",
                        other.type_name()
                    ))
                    .into());
                }
            },
        };
        // The class body runs in its own scope; its bindings become the
        // class attributes.
        let class_env = Env::enclosed(env);
        self.exec_block(body, &class_env)?;
        let attrs = class_env.take_bindings();
        let class = Arc::new(crate::value::Class {
            name: Arc::clone(name),
            base,
            attrs: std::sync::RwLock::new(attrs),
        });
        // Methods captured the class-body scope; binding the finished class
        // there lets zero-argument `super()` find it even on unbound calls.
        class_env.insert(Arc::from("__class__"), Value::Class(Arc::clone(&class)));
        Ok(Value::Class(class))
    }

    // -- raise / try --------------------------------------------------------

    fn exec_raise(&self, value: Option<&Expr>, env: &Arc<Env>) -> Unwind {
        let Some(expr) = value else {
            // Bare raise: re-raise the exception currently being handled.
            return match self.handling.borrow().last() {
                Some(exc) => Unwind::Raise(RunError::Exc(exc.clone())),
                None => Exception::with_message(ExcType::RuntimeError, "no active exception to re-raise").into(),
            };
        };
        let value = match self.eval_expr(expr, env) {
            Ok(value) => value,
            Err(unwind) => return unwind,
        };
        match value {
            Value::Exception(exc) => Unwind::Raise(RunError::Exc((*exc).clone())),
            Value::ExcClass(exc_type) => Exception::new(exc_type).into(),
            Value::Str(message) => Exception::with_message(ExcType::Exception, message.to_string()).into(),
            other => Exception::with_message(
                ExcType::TypeError,
                format!("exceptions must be exception instances, not {}", other.type_name()),
            )
            .into(),
        }
    }

    fn exec_try(
        &self,
        body: &[Stmt],
        handlers: &[crate::ast::ExceptHandler],
        finally: Option<&[Stmt]>,
        env: &Arc<Env>,
    ) -> EvalResult {
        let mut outcome = self.exec_block(body, env);

        if let Err(Unwind::Raise(RunError::Exc(exc))) = &outcome {
            let exc = exc.clone();
            if let Some(handler) = self.find_handler(handlers, &exc, env)? {
                if let Some(bind) = &handler.bind {
                    env.insert(Arc::clone(bind), Value::Exception(Arc::new(exc.clone())));
                }
                self.handling.borrow_mut().push(exc);
                let handled = self.exec_block(&handler.body, env);
                self.handling.borrow_mut().pop();
                outcome = handled.map(|_| Value::None);
            }
        }

        // The finally block runs on every path; if it raises (or returns),
        // its unwind replaces whatever was in flight.
        if let Some(finally) = finally {
            if let Err(unwind) = self.exec_block(finally, env) {
                return Err(unwind);
            }
        }
        outcome
    }

    /// Finds the first handler whose type matches, resolving handler names
    /// through the environment.
    fn find_handler<'h>(
        &self,
        handlers: &'h [crate::ast::ExceptHandler],
        exc: &Exception,
        env: &Arc<Env>,
    ) -> EvalResult<Option<&'h crate::ast::ExceptHandler>> {
        for handler in handlers {
            let Some(type_name) = &handler.exc_type else {
                return Ok(Some(handler));
            };
            let handler_type = match env.get(type_name) {
                Some(Value::ExcClass(t)) => t,
                Some(other) => {
                    return Err(RunError::type_error(format!(
                        "catching '{}' is not allowed",
                        other.type_name()
                    ))
                    .into());
                }
                None => {
                    return Err(RunError::name_error(format!("name '{type_name}' is not defined")).into());
                }
            };
            if exc.exc_type.is_subclass_of(handler_type) {
                return Ok(Some(handler));
            }
        }
        Ok(None)
    }

    // -- imports ------------------------------------------------------------

    fn exec_import(&self, items: &[crate::ast::ImportItem], env: &Arc<Env>) -> EvalResult<()> {
        for item in items {
            let top = &item.path[0];
            let library = env.resolve_import(top).ok_or_else(|| self.import_error(top, env))?;
            // Validate the full dotted path resolves through sub-libraries.
            let leaf = library
                .lookup_path(&item.path[1..])
                .ok_or_else(|| self.import_error(&item.path.join("."), env))?;
            match &item.alias {
                // `import a.b.c as n` binds the leaf under the alias.
                Some(alias) => env.set(alias, Value::Library(leaf))?,
                // `import a.b.c` binds the top-level library; the dotted
                // name stays reachable through attribute walks.
                None => env.set(top, Value::Library(library))?,
            }
        }
        Ok(())
    }

    fn exec_from_import(
        &self,
        module: &[Arc<str>],
        names: &[(Arc<str>, Option<Arc<str>>)],
        env: &Arc<Env>,
    ) -> EvalResult<()> {
        let top = &module[0];
        let library = env.resolve_import(top).ok_or_else(|| self.import_error(top, env))?;
        let dotted = module.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(".");
        let leaf = library
            .lookup_path(&module[1..])
            .ok_or_else(|| self.import_error(&dotted, env))?;
        for (name, alias) in names {
            let value = leaf.attr(name).ok_or_else(|| {
                Unwind::from(Exception::with_message(
                    ExcType::ImportError,
                    format!("cannot import name '{name}' from '{dotted}'"),
                ))
            })?;
            let bind_name = alias.as_ref().unwrap_or(name);
            env.set(bind_name, value)?;
        }
        Ok(())
    }

    fn import_error(&self, name: &str, env: &Arc<Env>) -> Unwind {
        let available = env.available_libraries();
        let message = if available.is_empty() {
            format!("no module named '{name}'")
        } else {
            format!("no module named '{name}' (available: {})", available.join(", "))
        };
        Exception::with_message(ExcType::ImportError, message).into()
    }
}

impl RunError {
    /// Decorates an error raised while evaluating an expression with the
    /// expression's line when no line is known yet.
    fn with_expr_line(self, line: u32) -> Self {
        match self {
            Self::Exc(mut exc) => {
                if exc.line.is_none() {
                    exc.line = Some(line);
                }
                Self::Exc(exc)
            }
            other => other,
        }
    }
}
