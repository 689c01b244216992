//! Core types shared by every module: the error enum and its CLI presentation.

pub mod error;

pub use error::{EngineError, ErrorContext, Result, error_chain, user_friendly_error};
