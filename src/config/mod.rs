//! Engine configuration.
//!
//! [`EngineOptions`] holds everything that changes how templates are discovered and
//! executed. It is plain data: construct it with [`EngineOptions::default`] or
//! [`EngineOptions::for_mode`], or deserialize it from a table in the host's own
//! configuration file.
//!
//! # TOML Format
//!
//! ```toml
//! extensions = [".html.tera", ".html"]
//! layout = "slot"
//! debug = false
//! reload = false
//! slot-errors = "swallow"
//!
//! [delimiters]
//! left = "[["
//! right = "]]"
//! ```
//!
//! Every key is optional; missing keys take their default value.

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result};

/// Extensions recognized when no other set is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".html", ".tera"];

/// Binding name under which layouts receive the content callable.
pub const DEFAULT_LAYOUT_SLOT: &str = "slot";

/// Tera's native expression delimiters.
pub const DEFAULT_LEFT_DELIMITER: &str = "{{";
pub const DEFAULT_RIGHT_DELIMITER: &str = "}}";

/// Expression delimiters used in template sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delimiters {
    pub left: String,
    pub right: String,
}

impl Delimiters {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Whether these are Tera's own delimiters, in which case sources need no translation.
    #[must_use]
    pub fn is_native(&self) -> bool {
        self.left == DEFAULT_LEFT_DELIMITER && self.right == DEFAULT_RIGHT_DELIMITER
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new(DEFAULT_LEFT_DELIMITER, DEFAULT_RIGHT_DELIMITER)
    }
}

/// What happens when the content template fails inside a layout slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotErrorPolicy {
    /// Report the error to the observer and render the slot as empty.
    /// The layout render still succeeds.
    #[default]
    Swallow,
    /// Fail the layout render with the content template's error.
    Propagate,
}

/// Options controlling template discovery, compilation and reloading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineOptions {
    /// Recognized template suffixes. Order does not matter for matching,
    /// the longest matching suffix always wins.
    pub extensions: Vec<String>,

    /// Name of the callable injected into layouts.
    pub layout: String,

    /// Expression delimiters used by template sources.
    pub delimiters: Delimiters,

    /// Log loaded and skipped template names during load.
    pub debug: bool,

    /// Reload sources on every render and keep the store in sync with the
    /// directory through a file watcher.
    pub reload: bool,

    /// Handling of content errors inside a layout slot.
    pub slot_errors: SlotErrorPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| (*ext).to_string()).collect(),
            layout: DEFAULT_LAYOUT_SLOT.to_string(),
            delimiters: Delimiters::default(),
            debug: false,
            reload: false,
            slot_errors: SlotErrorPolicy::default(),
        }
    }
}

impl EngineOptions {
    /// Defaults for a host running in debug or release mode.
    ///
    /// In debug mode both `debug` and `reload` are switched on, so edits to
    /// templates show up without restarting the host.
    #[must_use]
    pub fn for_mode(debug: bool) -> Self {
        Self {
            debug,
            reload: debug,
            ..Self::default()
        }
    }

    /// Parse options from a TOML document and validate them.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let options: Self = toml::from_str(input).map_err(|source| EngineError::Config {
            source,
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Replace the extension set.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_delimiters(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.delimiters = Delimiters::new(left, right);
        self
    }

    #[must_use]
    pub fn with_layout(mut self, slot: impl Into<String>) -> Self {
        self.layout = slot.into();
        self
    }

    #[must_use]
    pub fn with_reload(mut self, reload: bool) -> Self {
        self.reload = reload;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_slot_errors(mut self, policy: SlotErrorPolicy) -> Self {
        self.slot_errors = policy;
        self
    }

    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(invalid("at least one template extension is required"));
        }
        for ext in &self.extensions {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(invalid(format!(
                    "extension '{ext}' must start with '.' and name a suffix"
                )));
            }
        }
        if self.delimiters.left.is_empty() || self.delimiters.right.is_empty() {
            return Err(invalid("delimiters must not be empty"));
        }
        if self.delimiters.left == self.delimiters.right {
            return Err(invalid("left and right delimiters must differ"));
        }
        if self.layout.trim().is_empty() {
            return Err(invalid("layout slot name must not be empty"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> EngineError {
    EngineError::InvalidOptions {
        reason: reason.into(),
    }
}
