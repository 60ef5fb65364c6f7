use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::rc::Rc;

use super::{FlintError, Result, Token, Value};

/// One link in the chain of lexical scopes: this scope's bindings plus a
/// shared reference to the scope enclosing it.
///
/// Children hold their parent behind `Rc`, so several short-lived block
/// scopes can share one longer-lived enclosing scope without ever being
/// responsible for its lifetime. Lookups and assignment walk outward from
/// the innermost scope; definition always lands in the innermost scope.
#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// Creates a new root environment with no enclosing scope.
    #[must_use]
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// Creates a child scope chained to `enclosing`.
    #[must_use]
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Inserts `(name : value)` into this scope, overwriting any existing
    /// binding here and shadowing any same-named binding further out.
    pub fn define(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }

    /// Returns the value bound to `name` in the innermost scope that binds
    /// it.
    ///
    /// # Errors
    /// `FlintError::UndefinedVariable` if no scope in the chain binds the
    /// name.
    pub fn get(&self, name: &Token) -> Result<Value> {
        let key = name.token_type.to_string();

        match self.values.get(&key) {
            Some(value) => Ok(value.clone()),
            None => {
                if let Some(e) = &self.enclosing {
                    return e.borrow().get(name);
                }

                Err(FlintError::UndefinedVariable(name.clone()))
            }
        }
    }

    /// Overwrites `name` in the innermost scope that already binds it,
    /// preserving which scope owns the binding.
    ///
    /// # Errors
    /// `FlintError::UndefinedVariable` if no scope binds the name;
    /// assignment never creates a binding.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<Value> {
        match self.values.entry(name.token_type.to_string()) {
            Entry::Vacant(_) => {
                if let Some(e) = &self.enclosing {
                    return e.borrow_mut().assign(name, value);
                }

                Err(FlintError::UndefinedVariable(name.clone()))
            }
            Entry::Occupied(mut e) => {
                e.insert(value);
                Ok(e.get().clone())
            }
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
