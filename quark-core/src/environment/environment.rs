use im::HashMap;
use log::debug;

use crate::ast::prelude::{ApplicationExpression, Expression, LambdaExpression, Scoped};

/// The active mapping from identifier to the *unevaluated* expression
/// bound to it. Binding stores the expression, not its result; names
/// resolve by re-evaluating whatever was stored for them.
///
/// Cloning an environment is the defensive per-scope copy. The
/// underlying map shares structure, so the copy is cheap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    store: HashMap<String, Expression>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            store: HashMap::new()
        }
    }

    pub fn get(&self, name: &str) -> Option<&Expression> {
        self.store.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.store.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.store.keys()
    }

    /// Binds `name` to `expression`. When the name is already bound and
    /// the new expression still depends on it, the previous value is
    /// threaded through a wrapped application before being replaced:
    /// `(\ name. expression)(previous)`.
    pub fn bind(&mut self, name: String, expression: Expression) {
        let stored = match self.store.get(&name) {
            Some(previous) if expression.free_variables().contains(&name) => {
                debug!("rebinding `{name}` through its previous value");

                Expression::Application(ApplicationExpression::new(
                    Expression::Lambda(LambdaExpression::new(name.clone(), expression)),
                    previous.clone(),
                ))
            },
            _ => expression,
        };

        self.store.insert(name, stored);
    }
}
