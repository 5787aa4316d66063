//! Reading configuration files from disk.
//!
//! File names are given without extension; `.yaml` is preferred and `.yml`
//! is the fallback. A name that already carries an extension is used as-is.

use crate::error::{ConfigError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension tried first for extension-less names.
pub const PRIMARY_EXTENSION: &str = "yaml";

/// Extension used when the primary candidate is not readable.
pub const SECONDARY_EXTENSION: &str = "yml";

/// A parsed configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// The path the file was read from, after extension resolution
    pub path: PathBuf,
    /// Parsed content; always an object
    pub tree: Value,
}

/// Resolve the on-disk path for a configuration file name.
///
/// Only the primary candidate is checked. The secondary candidate is returned
/// unchecked and is validated when it is actually read.
pub fn resolve_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        return path.to_path_buf();
    }

    let primary = with_extension(path, PRIMARY_EXTENSION);
    if std::fs::File::open(&primary).is_ok() {
        return primary;
    }

    with_extension(path, SECONDARY_EXTENSION)
}

/// Append an extension without replacing anything after a dot in the stem.
fn with_extension(path: &Path, extension: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".");
    os.push(extension);
    PathBuf::from(os)
}

/// Read a configuration file that must exist.
pub fn read_required(path: &Path) -> Result<ConfigFile> {
    let resolved = resolve_extension(path);
    let content = std::fs::read_to_string(&resolved).map_err(|e| ConfigError::io(&resolved, e))?;
    let tree = parse_document(&resolved, &content)?;
    debug!(path = %resolved.display(), "Read configuration file");
    Ok(ConfigFile {
        path: resolved,
        tree,
    })
}

/// Read a configuration file that may be absent.
///
/// Returns `Ok(None)` when no candidate file exists. Parse failures and
/// other I/O errors are still reported.
pub fn read_optional(path: &Path) -> Result<Option<ConfigFile>> {
    match read_required(path) {
        Ok(file) => Ok(Some(file)),
        Err(ConfigError::MissingFile { path }) => {
            debug!(path = %path.display(), "Optional configuration file not found");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Parse YAML text into a configuration tree.
///
/// An empty document yields an empty object; any other non-mapping root is
/// rejected.
pub fn parse_document(path: &Path, content: &str) -> Result<Value> {
    let value: Value = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(value),
        _ => Err(ConfigError::NotAMapping {
            path: path.to_path_buf(),
        }),
    }
}
