//! Variables handed to a template at render time.
//!
//! Callers hold their data in many shapes: `HashMap`s, `BTreeMap`s, JSON
//! objects, or a ready-made [`tera::Context`]. [`Binding`] accepts all of them
//! through `From` and normalizes them into a Tera context, which is the only
//! shape the renderer deals with. `()` and JSON `null` are the empty binding.
//!
//! A JSON value that is not an object cannot be a binding. Converting one still
//! succeeds, but the render it is passed to fails with [`EngineError::Binding`].

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tera::{Context, Value};

use crate::core::{EngineError, Result};

/// Template variables, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Binding {
    context: Context,
    /// Why the source data could not be used, if it could not
    invalid: Option<String>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a binding from any value that serializes to a map.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self> {
        let value = serde_json::to_value(data).map_err(|e| EngineError::Binding {
            reason: e.to_string(),
        })?;
        Self::from_value(value)
    }

    /// Build a binding from a JSON object; `null` yields an empty binding.
    pub fn from_value(value: Value) -> Result<Self> {
        Self::from(value).into_result()
    }

    /// Set one variable, replacing an existing one of the same name.
    pub fn insert<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) {
        self.context.insert(key, value);
    }

    #[must_use]
    pub fn with<T: Serialize + ?Sized>(mut self, key: impl Into<String>, value: &T) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.context.contains_key(key)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The Tera context, or the reason the source data was rejected.
    pub fn into_context(self) -> Result<Context> {
        Ok(self.into_result()?.context)
    }

    fn into_result(self) -> Result<Self> {
        match self.invalid {
            Some(reason) => Err(EngineError::Binding {
                reason,
            }),
            None => Ok(self),
        }
    }

    fn from_context(context: Context) -> Self {
        Self {
            context,
            invalid: None,
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl From<()> for Binding {
    fn from((): ()) -> Self {
        Self::new()
    }
}

impl From<Context> for Binding {
    fn from(context: Context) -> Self {
        Self::from_context(context)
    }
}

impl From<Value> for Binding {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::new(),
            Value::Object(map) => Self::from(map),
            other => Self {
                context: Context::new(),
                invalid: Some(format!("expected a key/value mapping, got {}", kind(&other))),
            },
        }
    }
}

impl From<serde_json::Map<String, Value>> for Binding {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        let mut context = Context::new();
        for (key, value) in map {
            context.insert(key, &value);
        }
        Self::from_context(context)
    }
}

impl<K, V, S> From<HashMap<K, V, S>> for Binding
where
    K: Into<String>,
    V: Serialize,
{
    fn from(map: HashMap<K, V, S>) -> Self {
        let mut context = Context::new();
        for (key, value) in map {
            context.insert(key, &value);
        }
        Self::from_context(context)
    }
}

impl<K, V> From<BTreeMap<K, V>> for Binding
where
    K: Into<String>,
    V: Serialize,
{
    fn from(map: BTreeMap<K, V>) -> Self {
        let mut context = Context::new();
        for (key, value) in map {
            context.insert(key, &value);
        }
        Self::from_context(context)
    }
}

impl<T: Into<Binding>> From<Option<T>> for Binding {
    fn from(data: Option<T>) -> Self {
        data.map(Into::into).unwrap_or_default()
    }
}

impl From<&Binding> for Binding {
    fn from(binding: &Binding) -> Self {
        binding.clone()
    }
}
