//! The callable a layout uses to place its content.
//!
//! When a render names a layout, the content template is compiled first and a
//! [`SlotFunction`] wrapping it is registered on the layout's compilation under the
//! configured slot name. `{{ slot() }}` in the layout then executes the content
//! template against the same binding and inserts its output in place.

use std::collections::HashMap;
use std::sync::Arc;

use tera::{Context, Value};

use super::CompiledTemplate;
use crate::config::SlotErrorPolicy;
use crate::core::error_chain;
use crate::observer::{EngineObserver, ErrorOrigin, SwallowedError};

pub(crate) struct SlotFunction {
    slot: String,
    content: Arc<CompiledTemplate>,
    context: Context,
    policy: SlotErrorPolicy,
    observer: Arc<dyn EngineObserver>,
}

impl SlotFunction {
    pub(crate) fn new(
        slot: impl Into<String>,
        content: CompiledTemplate,
        context: Context,
        policy: SlotErrorPolicy,
        observer: Arc<dyn EngineObserver>,
    ) -> Self {
        Self {
            slot: slot.into(),
            content: Arc::new(content),
            context,
            policy,
            observer,
        }
    }
}

impl tera::Function for SlotFunction {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        if !args.is_empty() {
            return Err(tera::Error::msg(format!("'{}' takes no arguments", self.slot)));
        }

        match self.content.render(&self.context) {
            Ok(output) => Ok(Value::String(output)),
            Err(error) => match self.policy {
                SlotErrorPolicy::Propagate => Err(tera::Error::chain(
                    format!("content of '{}' failed to render", self.slot),
                    error,
                )),
                SlotErrorPolicy::Swallow => {
                    self.observer.swallowed(&SwallowedError {
                        origin: ErrorOrigin::Slot,
                        target: self.content.name().to_string(),
                        message: error_chain(&error),
                    });
                    Ok(Value::String(String::new()))
                }
            },
        }
    }

    fn is_safe(&self) -> bool {
        true
    }
}
