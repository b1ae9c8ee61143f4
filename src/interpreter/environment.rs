//! Runtime environment for variable scopes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// A runtime environment containing variable bindings.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Self {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Define a variable in the current scope. Redefinition overwrites.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Get a variable's value, searching up the scope chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        if let Some(ref enclosing) = self.enclosing {
            return enclosing.borrow().get(name);
        }
        None
    }

    /// Assign to an existing variable, searching up the scope chain.
    /// Returns false if no scope defines `name`.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            return true;
        }
        if let Some(ref enclosing) = self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }
        false
    }

    /// Check if a variable exists in the current scope only.
    pub fn contains_local(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outward() {
        let globals = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("x", Value::Int(1));

        let mut inner = Environment::with_enclosing(globals.clone());
        inner.define("y", Value::Int(2));

        assert_eq!(inner.get("x"), Some(Value::Int(1)));
        assert_eq!(inner.get("y"), Some(Value::Int(2)));
        assert!(!inner.contains_local("x"));
        assert_eq!(globals.borrow().get("y"), None);
    }

    #[test]
    fn test_assign_updates_defining_scope() {
        let globals = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("x", Value::Int(1));

        let mut inner = Environment::with_enclosing(globals.clone());
        assert!(inner.assign("x", Value::Int(5)));
        assert_eq!(globals.borrow().get("x"), Some(Value::Int(5)));
    }

    #[test]
    fn test_assign_undefined_is_rejected() {
        let mut env = Environment::new();
        assert!(!env.assign("missing", Value::Nil));
        assert_eq!(env.get("missing"), None);
    }
}
