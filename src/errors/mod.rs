//! # Error Handling
//!
//! Error types built on `thiserror`. See [`types`] for the crate-level [`Error`];
//! secret fetch failures live in [`crate::secrets::SecretsError`].

pub mod types;

pub use types::{Error, Result};
