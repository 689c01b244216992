//! Functions callable from templates.
//!
//! A [`TemplateFunction`] is a plain Rust closure over positional arguments plus a
//! [`Signature`] naming those arguments. Tera calls functions with keyword
//! arguments (`{{ formatTime(value=created, format="%Y") }}`); the signature is
//! used to bind them to positions, so a function never has to pick through a map
//! itself.
//!
//! Every engine starts with the built-ins below. Registering a function under the
//! same name replaces it.
//!
//! | Name | Arguments | Result |
//! |------|-----------|--------|
//! | `toString` | `value` | `value` as text; `null` becomes `""` |
//! | `toInt` | `value` | integer value, `0` when not numeric |
//! | `formatTime` | `value`, optional `format` | formatted UTC time |

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write as _};
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use tera::{Tera, Value};
use thiserror::Error;

/// Default `formatTime` output format.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors raised while binding or running a template function.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FunctionError {
    #[error("missing required argument '{argument}'")]
    MissingArgument { argument: String },

    #[error("unexpected argument '{argument}'")]
    UnknownArgument { argument: String },

    #[error("invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("{0}")]
    Failed(String),
}

/// Names of a function's parameters, required ones first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    required: Vec<String>,
    optional: Vec<String>,
}

impl Signature {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            optional: Vec::new(),
        }
    }

    /// A signature with no parameters.
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_optional<I, S>(mut self, optional: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optional.extend(optional.into_iter().map(Into::into));
        self
    }

    /// Smallest and largest accepted argument count.
    pub fn arity(&self) -> (usize, usize) {
        (self.required.len(), self.required.len() + self.optional.len())
    }

    /// Bind keyword arguments to positions.
    ///
    /// Required parameters must all be present. Optional parameters are passed up
    /// to the last one supplied; gaps before it are filled with `null`.
    pub fn bind(&self, args: &HashMap<String, Value>) -> Result<Vec<Value>, FunctionError> {
        if let Some(unknown) = args
            .keys()
            .find(|name| !self.required.contains(name) && !self.optional.contains(name))
        {
            return Err(FunctionError::UnknownArgument {
                argument: unknown.clone(),
            });
        }

        let mut bound = Vec::with_capacity(self.arity().1);
        for name in &self.required {
            let value = args.get(name).ok_or_else(|| FunctionError::MissingArgument {
                argument: name.clone(),
            })?;
            bound.push(value.clone());
        }

        let supplied = self.optional.iter().rposition(|name| args.contains_key(name));
        if let Some(last) = supplied {
            for name in &self.optional[..=last] {
                bound.push(args.get(name).cloned().unwrap_or(Value::Null));
            }
        }

        Ok(bound)
    }
}

type Callable = dyn Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync;

/// A function exposed to templates.
#[derive(Clone)]
pub struct TemplateFunction {
    signature: Signature,
    callable: Arc<Callable>,
}

impl TemplateFunction {
    pub fn new<F>(signature: Signature, callable: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        Self {
            signature,
            callable: Arc::new(callable),
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Call with already-bound positional arguments.
    pub fn call(&self, args: &[Value]) -> Result<Value, FunctionError> {
        (self.callable)(args)
    }
}

impl fmt::Debug for TemplateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateFunction").field("signature", &self.signature).finish_non_exhaustive()
    }
}

/// Named template functions.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, TemplateFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `toString`, `toInt` and `formatTime`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert("toString", TemplateFunction::new(Signature::new(["value"]), to_string));
        registry.insert("toInt", TemplateFunction::new(Signature::new(["value"]), to_int));
        registry.insert(
            "formatTime",
            TemplateFunction::new(
                Signature::new(["value"]).with_optional(["format"]),
                format_time,
            ),
        );
        registry
    }

    /// Register `function` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, function: TemplateFunction) {
        self.functions.insert(name.into(), function);
    }

    pub fn get(&self, name: &str) -> Option<&TemplateFunction> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Register every function with a Tera instance.
    pub(crate) fn register_into(&self, tera: &mut Tera) {
        for (name, function) in &self.functions {
            tera.register_function(
                name,
                TeraFunction {
                    name: name.clone(),
                    function: function.clone(),
                },
            );
        }
    }
}

/// Adapter from keyword-argument calls to [`TemplateFunction`].
struct TeraFunction {
    name: String,
    function: TemplateFunction,
}

impl tera::Function for TeraFunction {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        self.function
            .signature
            .bind(args)
            .and_then(|bound| self.function.call(&bound))
            .map_err(|e| tera::Error::msg(format!("function '{}': {e}", self.name)))
    }
}

fn first(args: &[Value]) -> &Value {
    args.first().unwrap_or(&Value::Null)
}

fn to_string(args: &[Value]) -> Result<Value, FunctionError> {
    let text = match first(args) {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    Ok(Value::String(text))
}

fn to_int(args: &[Value]) -> Result<Value, FunctionError> {
    let number = match first(args) {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().map(|f| f as i64)).unwrap_or(0)
        }
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    };
    Ok(Value::from(number))
}

fn format_time(args: &[Value]) -> Result<Value, FunctionError> {
    let format = match args.get(1) {
        None | Some(Value::Null) => DEFAULT_TIME_FORMAT,
        Some(Value::String(format)) => format.as_str(),
        Some(_) => {
            return Err(FunctionError::InvalidArgument {
                argument: "format".to_string(),
                reason: "expected a string".to_string(),
            });
        }
    };

    let time = parse_time(first(args))?;
    let mut out = String::new();
    write!(out, "{}", time.format(format)).map_err(|_| FunctionError::InvalidArgument {
        argument: "format".to_string(),
        reason: format!("unsupported format string '{format}'"),
    })?;
    Ok(Value::String(out))
}

fn parse_time(value: &Value) -> Result<DateTime<Utc>, FunctionError> {
    let invalid = |reason: String| FunctionError::InvalidArgument {
        argument: "value".to_string(),
        reason,
    };

    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(from_timestamp)
            .ok_or_else(|| invalid(format!("timestamp out of range: {n}"))),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(seconds) = s.parse::<f64>() {
                return from_timestamp(seconds)
                    .ok_or_else(|| invalid(format!("timestamp out of range: {s}")));
            }
            if let Ok(time) = DateTime::parse_from_rfc3339(s) {
                return Ok(time.with_timezone(&Utc));
            }
            NaiveDateTime::parse_from_str(s, DEFAULT_TIME_FORMAT)
                .map(|naive| naive.and_utc())
                .map_err(|_| invalid(format!("unrecognized time '{s}'")))
        }
        other => Err(invalid(format!("expected a timestamp or time string, got {other}"))),
    }
}

fn from_timestamp(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.trunc();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}
