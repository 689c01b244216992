//! Error handling for hotplate
//!
//! The library reports failures through one strongly-typed enum, [`EngineError`].
//! Callers that only need a message can rely on its `Display` implementation; the
//! CLI goes one step further and converts any error into an [`ErrorContext`] with a
//! suggestion via [`user_friendly_error`].
//!
//! # Error Categories
//!
//! - **Configuration**: [`EngineError::InvalidOptions`], [`EngineError::Config`],
//!   [`EngineError::RootUnreadable`], [`EngineError::FileSystemUnavailable`]
//! - **Loading**: [`EngineError::Walk`], [`EngineError::Read`]
//! - **Lookup**: [`EngineError::TemplateNotFound`], [`EngineError::Parse`],
//!   [`EngineError::Syntax`]
//! - **Execution**: [`EngineError::Render`], [`EngineError::Binding`]
//! - **Store misuse**: [`EngineError::ReadOnlyStore`]
//!
//! Errors raised while the watcher reconciles file-system events never reach a
//! caller; they are reported to the engine's observer instead (see
//! [`crate::observer`]).
//!
//! # Examples
//!
//! ```rust,no_run
//! use hotplate::{Engine, EngineError, EngineOptions};
//!
//! let engine = Engine::new("views", EngineOptions::default())?;
//! let mut out = Vec::new();
//! match engine.render(&mut out, "missing", (), None) {
//!     Err(EngineError::TemplateNotFound { name, suggestions }) => {
//!         eprintln!("no template named {name}, did you mean {suggestions:?}?");
//!     }
//!     other => other?,
//! }
//! # Ok::<(), EngineError>(())
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for every fallible engine operation.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Engine options failed validation
    #[error("Invalid engine options: {reason}")]
    InvalidOptions {
        /// Which rule the options broke
        reason: String,
    },

    /// Options could not be parsed from TOML
    #[error("Failed to parse engine options")]
    Config {
        #[source]
        source: toml::de::Error,
    },

    /// The template root directory does not exist or cannot be listed
    #[error("Template root is not readable: {}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A foreign filesystem refused to be wrapped as a template source
    #[error("Filesystem cannot be used as a template source: {reason}")]
    FileSystemUnavailable { reason: String },

    /// Walking the template directory failed part way through
    #[error("Failed to walk template directory")]
    Walk {
        #[source]
        source: walkdir::Error,
    },

    /// A template file could not be read
    #[error("Failed to read template file: {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// No template is stored under the requested name
    #[error("Template '{name}' not found")]
    TemplateNotFound {
        name: String,
        /// Closest existing keys, best match first
        suggestions: Vec<String>,
    },

    /// Template source with custom delimiters is malformed
    #[error("Template syntax error in '{name}': {message}")]
    Syntax { name: String, message: String },

    /// Tera rejected the template source
    #[error("Failed to compile template '{name}'")]
    Parse {
        name: String,
        #[source]
        source: tera::Error,
    },

    /// Template execution failed
    #[error("Failed to render template '{name}'")]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },

    /// Data passed as a binding is not a key/value mapping
    #[error("Invalid template binding: {reason}")]
    Binding { reason: String },

    /// A mutation was attempted on a store that cannot be written
    #[error("Template store is read-only")]
    ReadOnlyStore,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// An error paired with an optional explanation and a suggested fix.
///
/// Built by [`user_friendly_error`] for display at the command line.
#[derive(Debug)]
pub struct ErrorContext {
    /// The rendered error chain
    pub error: String,
    /// Actionable advice for the user
    pub suggestion: Option<String>,
    /// Additional background on the failure
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Join an error and all of its sources into one line.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut current = error.source();
    while let Some(source) = current {
        message.push_str(": ");
        message.push_str(&source.to_string());
        current = source.source();
    }
    message
}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain = error.chain().map(ToString::to_string).collect::<Vec<_>>().join(": ");

    let Some(engine_error) = error.chain().find_map(|e| e.downcast_ref::<EngineError>()) else {
        return ErrorContext::new(chain);
    };

    match engine_error {
        EngineError::TemplateNotFound { suggestions, .. } if !suggestions.is_empty() => {
            ErrorContext::new(chain)
                .with_suggestion(format!("Did you mean: {}?", suggestions.join(", ")))
        }
        EngineError::TemplateNotFound { .. } => ErrorContext::new(chain).with_suggestion(
            "Template names are paths relative to the root without the file extension",
        ),
        EngineError::RootUnreadable { .. } => ErrorContext::new(chain)
            .with_suggestion("Check that the template directory exists and is readable"),
        EngineError::InvalidOptions { .. } | EngineError::Config { .. } => {
            ErrorContext::new(chain)
                .with_suggestion("Check the extensions, delimiters and layout slot name")
        }
        EngineError::Parse { .. } | EngineError::Syntax { .. } => ErrorContext::new(chain)
            .with_details("The template source could not be compiled")
            .with_suggestion("Check the template for unbalanced tags or delimiters"),
        EngineError::Render { .. } => ErrorContext::new(chain)
            .with_suggestion("Check that every variable used by the template is bound"),
        _ => ErrorContext::new(chain),
    }
}
