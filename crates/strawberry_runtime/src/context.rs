//! Request-scoped context handed to resolvers and permissions.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Execution context.
///
/// Holds JSON data keyed by name, typed extensions keyed by type, and the
/// coerced variables of the running operation.
#[derive(Clone, Default)]
pub struct Context {
    data: HashMap<String, Value>,
    extensions: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    variables: serde_json::Map<String, Value>,
}

impl Context {
    /// Creates a new context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value in the context.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) {
        if let Ok(value) = serde_json::to_value(value) {
            self.data.insert(key.into(), value);
        }
    }

    /// Gets a value from the context.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Stores a typed extension, replacing any previous value of that type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Builder form of [`Context::insert`].
    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Returns the typed extension of type `T`.
    #[must_use]
    pub fn extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref())
    }

    /// Gets a variable of the running operation.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    #[must_use]
    pub fn variables(&self) -> &serde_json::Map<String, Value> {
        &self.variables
    }

    pub(crate) fn set_variables(&mut self, variables: serde_json::Map<String, Value>) {
        self.variables = variables;
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("data", &self.data)
            .field("extensions", &self.extensions.len())
            .field("variables", &self.variables)
            .finish()
    }
}
