//! Integration test suite for hotplate
//!
//! End-to-end tests against the public API and the `hotplate` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **rendering**: Loading a directory and rendering with and without layouts
//! - **concurrency**: Many threads loading and rendering one engine
//! - **watch**: Live file-system changes reaching the store
//! - **filesystem**: Engines backed by a caller-supplied file system
//! - **cli**: The `hotplate` binary

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod concurrency;
mod filesystem;
mod rendering;
mod watch;
