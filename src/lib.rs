//! Layered configuration loader.
//!
//! Builds one configuration tree from a base YAML file, named override files
//! and environment-variable mappings, and exposes path-addressed access to it.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;

pub use config::ConfigStore;
pub use error::{CastError, ConfigError, PathError, Result};
