use crate::error::{RuntimeError, RuntimeErrorKind, RuntimeResult};
use crate::token::Token;
use crate::value::Value;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope frame. Closures, bound methods and running
/// calls all hold these, so a frame lives as long as its longest holder.
pub type Env = Rc<RefCell<Environment>>;

/// One lexical scope at run time: bindings plus a link to the enclosing
/// frame (absent only for the global frame).
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Env>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Env) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Fresh frame as a shareable handle.
    pub fn new_child(enclosing: &Env) -> Env {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            enclosing,
        ))))
    }

    pub fn enclosing(&self) -> Option<Env> {
        self.enclosing.clone()
    }

    /// Insert or overwrite `name` in this frame only.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define '{}' = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Names bound directly in this frame, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.keys().cloned().collect();
        names.sort();
        names
    }

    /// Walk outward until `name` is found.
    pub fn get(&self, name: &Token) -> RuntimeResult<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Walk outward until `name` is found, then overwrite it there.
    pub fn assign(&mut self, name: &Token, value: Value) -> RuntimeResult<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// The frame exactly `distance` hops outward from `env`.
    pub fn ancestor(env: &Env, distance: usize) -> Option<Env> {
        let mut current: Env = Rc::clone(env);

        for _ in 0..distance {
            let next: Env = current.borrow().enclosing.clone()?;
            current = next;
        }

        Some(current)
    }

    /// Read `name` from the frame `distance` hops out. A miss means the
    /// resolver and evaluator disagree.
    pub fn get_at(env: &Env, distance: usize, name: &str, line: usize) -> RuntimeResult<Value> {
        let frame: Env = Self::ancestor(env, distance).ok_or_else(|| missing(distance, name, line))?;

        let value: Option<Value> = frame.borrow().values.get(name).cloned();

        value.ok_or_else(|| missing(distance, name, line))
    }

    pub fn assign_at(
        env: &Env,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> RuntimeResult<()> {
        let frame: Env = Self::ancestor(env, distance)
            .ok_or_else(|| missing(distance, &name.lexeme, name.line))?;

        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(missing(distance, &name.lexeme, name.line)),
        }
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::UndefinedVariable,
        name.line,
        format!("Undefined variable '{}'.", name.lexeme),
    )
}

fn missing(distance: usize, name: &str, line: usize) -> RuntimeError {
    RuntimeError::internal(
        line,
        format!("Resolved variable '{}' not found {} scope(s) out.", name, distance),
    )
}
