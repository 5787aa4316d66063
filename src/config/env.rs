//! Environment-variable overrides.
//!
//! The `env_mapping` file maps variable names to configuration paths:
//!
//! ```yaml
//! VERSION: version            # copied verbatim as a string
//! PORT:
//!   key: port
//!   type: number              # cast before assignment
//! USE_SSL:
//!   key: useSsl
//!   type: boolean
//! ```
//!
//! Variables absent from the environment are skipped. The resulting tree is
//! merged last, so environment values win over every file.

use super::path::ConfigPath;
use crate::error::{CastError, ConfigError, Result};
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::env::VarError;
use tracing::{debug, warn};

/// Source of environment variables.
pub trait Environment {
    /// Value of `name`, or `None` when unset or not valid unicode.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the live process environment on every lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        match std::env::var(name) {
            Ok(value) => Some(value),
            Err(VarError::NotPresent) => None,
            Err(VarError::NotUnicode(_)) => {
                warn!(var = %name, "Ignoring environment variable that is not valid unicode");
                None
            }
        }
    }
}

/// An explicit set of variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

/// Explicit variables layered over another environment.
///
/// Lookups try the explicit variables first and fall back to `base`.
#[derive(Debug, Clone, Default)]
pub struct Overlay<E> {
    vars: MapEnv,
    base: E,
}

impl<E> Overlay<E> {
    pub fn new(base: E) -> Self {
        Self {
            vars: MapEnv::new(),
            base,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name, value);
    }
}

impl<E: Environment> Environment for Overlay<E> {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.var(name).or_else(|| self.base.var(name))
    }
}

/// Target type for an environment value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CastType {
    Number,
    Boolean,
    /// Keep the raw string
    #[default]
    Raw,
}

impl CastType {
    /// Map a `type:` name from the mapping file. Unknown names keep the raw string.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("number") => CastType::Number,
            Some("boolean") => CastType::Boolean,
            _ => CastType::Raw,
        }
    }
}

/// Convert a raw environment string into a typed value.
///
/// Numbers are trimmed, then read as an integer when they fit `i64` or
/// `u64` and as a finite float otherwise. Unlike JavaScript's `Number()`,
/// an empty or blank string is an error rather than `0`. Hex literals such
/// as `0x10`, `NaN` and infinities are rejected as well.
///
/// Booleans accept exactly `true`, `1`, `false` and `0`.
pub fn cast(kind: CastType, raw: &str) -> std::result::Result<Value, CastError> {
    match kind {
        CastType::Number => cast_number(raw),
        CastType::Boolean => match raw {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(CastError::BadBoolean {
                value: raw.to_string(),
            }),
        },
        CastType::Raw => Ok(Value::String(raw.to_string())),
    }
}

fn cast_number(raw: &str) -> std::result::Result<Value, CastError> {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(Value::Number(i.into()));
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return Ok(Value::Number(u.into()));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| CastError::BadNumber {
            value: raw.to_string(),
        })
}

/// One entry of the `env_mapping` file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvMapping {
    /// Bare destination path; the value is copied as a string.
    Path(String),
    /// Destination path with a cast.
    Typed {
        key: String,
        #[serde(rename = "type", default)]
        kind: Option<String>,
    },
}

impl EnvMapping {
    /// Destination path.
    pub fn key(&self) -> &str {
        match self {
            EnvMapping::Path(key) | EnvMapping::Typed { key, .. } => key,
        }
    }

    pub fn cast_type(&self) -> CastType {
        match self {
            EnvMapping::Path(_) => CastType::Raw,
            EnvMapping::Typed { kind, .. } => CastType::from_name(kind.as_deref()),
        }
    }
}

/// Parse the tree read from `env_mapping`, keeping file order.
pub fn parse_env_mappings(tree: &Value) -> Result<Vec<(String, EnvMapping)>> {
    let Some(map) = tree.as_object() else {
        return Ok(Vec::new());
    };

    map.iter()
        .map(|(var, entry)| -> Result<(String, EnvMapping)> {
            let mapping = serde_json::from_value::<EnvMapping>(entry.clone()).map_err(|_| {
                ConfigError::InvalidMapping {
                    var: var.clone(),
                    reason: format!(
                        "expected a path string or {{ key, type }} mapping, got {}",
                        entry
                    ),
                }
            })?;
            Ok((var.clone(), mapping))
        })
        .collect()
}

/// Overrides collected from the environment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnvOverrides {
    /// Tree holding only the overridden paths
    pub tree: Value,
    /// Variables that were present and applied, in mapping order
    pub applied: Vec<String>,
}

/// Build the override tree for the variables present in `env`.
pub fn env_overrides<E: Environment + ?Sized>(
    mappings: &[(String, EnvMapping)],
    env: &E,
) -> Result<EnvOverrides> {
    let mut tree = Value::Object(Map::new());
    let mut applied = Vec::new();

    for (var, mapping) in mappings {
        let Some(raw) = env.var(var) else {
            continue;
        };

        let path = ConfigPath::parse(mapping.key());
        if path.is_empty() {
            return Err(ConfigError::InvalidMapping {
                var: var.clone(),
                reason: "destination path is empty".to_string(),
            });
        }

        let value = cast(mapping.cast_type(), &raw).map_err(|source| ConfigError::Cast {
            var: var.clone(),
            source,
        })?;

        debug!(var = %var, key = %mapping.key(), "Applying environment override");
        path.assign(&mut tree, value).map_err(|source| ConfigError::InvalidPath {
            path: mapping.key().to_string(),
            source,
        })?;
        applied.push(var.clone());
    }

    Ok(EnvOverrides { tree, applied })
}
