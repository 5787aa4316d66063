//! Configuration store with layered loading.
//!
//! `load()` merges, in order:
//! 1. `base` (required)
//! 2. each file named in `CONF_FILES`, in list order (required once named)
//! 3. environment variables mapped by `env_mapping` (optional file)
//!
//! The new tree is assembled off to the side and published with a single
//! atomic swap, so concurrent readers see either the old tree or the new
//! one, never a partial merge. A failed load leaves the old tree in place.

use super::env::{Environment, ProcessEnv, env_overrides, parse_env_mappings};
use super::files::{read_optional, read_required};
use super::merge::deep_merge_all;
use super::overrides::{BASE_FILE, ENV_MAPPING_FILE, parse_override_list};
use super::path::ConfigPath;
use crate::error::{ConfigError, Result};
use arc_swap::ArcSwap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Variable selecting the configuration directory.
pub const CONF_DIR_VAR: &str = "CONF_DIR";

/// Variable holding the comma-separated override file names.
pub const CONF_FILES_VAR: &str = "CONF_FILES";

/// Directory used when `CONF_DIR` is unset, relative to the working directory.
pub const DEFAULT_CONF_DIR: &str = "conf";

/// What the last successful load read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Directory the files were read from
    pub conf_dir: PathBuf,
    /// Base file followed by override files, in merge order
    pub files: Vec<PathBuf>,
    /// The env mapping file, if one was found
    pub env_mapping: Option<PathBuf>,
    /// Environment variables that overrode a value
    pub env_vars: Vec<String>,
}

/// Process-wide configuration tree.
///
/// Construct one at startup, call [`ConfigStore::load`], then share it
/// (typically behind an `Arc`) with whatever needs settings.
pub struct ConfigStore<E = ProcessEnv> {
    env: E,
    default_dir: PathBuf,
    tree: ArcSwap<Value>,
    report: ArcSwap<LoadReport>,
}

impl<E: Environment> ConfigStore<E> {
    /// Create an empty store. Nothing is read until [`ConfigStore::load`].
    pub fn new(env: E) -> Self {
        Self {
            env,
            default_dir: PathBuf::from(DEFAULT_CONF_DIR),
            tree: ArcSwap::from_pointee(Value::Object(Map::new())),
            report: ArcSwap::from_pointee(LoadReport::default()),
        }
    }

    /// Directory to use when `CONF_DIR` is unset.
    pub fn with_default_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_dir = dir.into();
        self
    }

    /// Directory configuration files are read from.
    pub fn conf_dir(&self) -> PathBuf {
        match self.env.var(CONF_DIR_VAR) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => self.default_dir.clone(),
        }
    }

    /// Override file names from `CONF_FILES`, filtered and de-duplicated.
    pub fn override_names(&self) -> Vec<String> {
        self.env
            .var(CONF_FILES_VAR)
            .map(|raw| parse_override_list(&raw))
            .unwrap_or_default()
    }

    /// Run the full load pipeline and publish the result.
    ///
    /// On error the previously loaded tree stays in place.
    pub fn load(&self) -> Result<()> {
        match self.build() {
            Ok((tree, report)) => {
                info!(
                    conf_dir = %report.conf_dir.display(),
                    files = report.files.len(),
                    env_overrides = report.env_vars.len(),
                    "Configuration loaded"
                );
                self.tree.store(Arc::new(tree));
                self.report.store(Arc::new(report));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Configuration load failed, keeping previous configuration");
                Err(e)
            }
        }
    }

    fn build(&self) -> Result<(Value, LoadReport)> {
        let conf_dir = self.conf_dir();
        let overrides = self.override_names();
        debug!(conf_dir = %conf_dir.display(), ?overrides, "Loading configuration");

        let mut layers = Vec::with_capacity(overrides.len() + 2);
        let mut files = Vec::with_capacity(overrides.len() + 1);

        for name in std::iter::once(BASE_FILE).chain(overrides.iter().map(String::as_str)) {
            let file = read_required(&conf_dir.join(name))?;
            layers.push(file.tree);
            files.push(file.path);
        }

        let mut env_mapping = None;
        let mut env_vars = Vec::new();
        if let Some(mapping_file) = read_optional(&conf_dir.join(ENV_MAPPING_FILE))? {
            let mappings = parse_env_mappings(&mapping_file.tree)?;
            let overrides = env_overrides(&mappings, &self.env)?;
            layers.push(overrides.tree);
            env_mapping = Some(mapping_file.path);
            env_vars = overrides.applied;
        }

        let tree = deep_merge_all(layers);
        let report = LoadReport {
            conf_dir,
            files,
            env_mapping,
            env_vars,
        };
        Ok((tree, report))
    }

    /// Value at `path`, or `None` when any segment is missing.
    pub fn get(&self, path: &str) -> Option<Value> {
        ConfigPath::parse(path).get(&self.tree.load()).cloned()
    }

    /// Deserialize the value at `path` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let Some(value) = self.get(path) else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| ConfigError::Deserialize {
                key: path.to_string(),
                source,
            })
    }

    /// Whether `path` resolves to a value.
    pub fn contains(&self, path: &str) -> bool {
        ConfigPath::parse(path).get(&self.tree.load()).is_some()
    }

    /// Assign `value` at `path`; `Value::Null` removes the entry instead.
    ///
    /// Only an explicit null removes. `0`, `false` and `""` are stored.
    /// Writes the path cannot address (the empty path, or an index far past
    /// the end of a sequence) are rejected and leave the tree unchanged.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<()> {
        let parsed = ConfigPath::parse(path);
        let value = value.into();
        let mut outcome = Ok(());
        self.tree.rcu(|current| {
            let mut next = Value::clone(current);
            outcome = parsed.set(&mut next, value.clone());
            match outcome {
                Ok(()) => Arc::new(next),
                Err(_) => Arc::clone(current),
            }
        });
        outcome.map_err(|source| ConfigError::InvalidPath {
            path: path.to_string(),
            source,
        })
    }

    /// Remove the entry at `path`, returning the removed value.
    pub fn remove(&self, path: &str) -> Option<Value> {
        let path = ConfigPath::parse(path);
        let mut removed = None;
        self.tree.rcu(|current| {
            let mut next = Value::clone(current);
            removed = path.unset(&mut next);
            next
        });
        removed
    }

    /// The currently published tree.
    ///
    /// This is the live tree shared with the store, not a deep copy. It
    /// stays valid after later loads, which publish a new tree rather than
    /// mutating this one.
    pub fn dump(&self) -> Arc<Value> {
        self.tree.load_full()
    }

    /// Summary of the last successful load.
    pub fn load_report(&self) -> Arc<LoadReport> {
        self.report.load_full()
    }
}

impl<E> std::fmt::Debug for ConfigStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("default_dir", &self.default_dir)
            .field("tree", &self.tree.load_full())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::MapEnv;
    use crate::error::PathError;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn store_in(dir: &Path, env: MapEnv) -> ConfigStore<MapEnv> {
        ConfigStore::new(env.with_var(CONF_DIR_VAR, dir.to_string_lossy()))
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = ConfigStore::new(MapEnv::new());
        assert_eq!(*store.dump(), json!({}));
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn test_conf_dir_defaults() {
        let store = ConfigStore::new(MapEnv::new());
        assert_eq!(store.conf_dir(), PathBuf::from("conf"));

        let store = ConfigStore::new(MapEnv::new()).with_default_dir("/etc/app");
        assert_eq!(store.conf_dir(), PathBuf::from("/etc/app"));

        let store = ConfigStore::new(MapEnv::new().with_var(CONF_DIR_VAR, "custom"))
            .with_default_dir("/etc/app");
        assert_eq!(store.conf_dir(), PathBuf::from("custom"));
    }

    #[test]
    fn test_override_names_from_env() {
        let store = ConfigStore::new(MapEnv::new().with_var(CONF_FILES_VAR, "a, base, b,a"));
        assert_eq!(store.override_names(), vec!["a", "b"]);

        let store = ConfigStore::new(MapEnv::new());
        assert!(store.override_names().is_empty());
    }

    #[test]
    fn test_load_base_only() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("base.yaml"), "name: app0\nport: 8080\n").unwrap();

        let store = store_in(temp.path(), MapEnv::new());
        store.load().unwrap();

        assert_eq!(*store.dump(), json!({"name": "app0", "port": 8080}));
        let report = store.load_report();
        assert_eq!(report.files, vec![temp.path().join("base.yaml")]);
        assert_eq!(report.env_mapping, None);
    }

    #[test]
    fn test_failed_load_keeps_previous_tree() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("base.yaml"), "port: 8080\n").unwrap();

        let store = store_in(temp.path(), MapEnv::new());
        store.load().unwrap();

        std::fs::write(temp.path().join("base.yaml"), "port: 8080\n  bad: yaml\n").unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(*store.dump(), json!({"port": 8080}));
    }

    #[test]
    fn test_set_get_remove() {
        let store = ConfigStore::new(MapEnv::new());
        store.set("server.port", 8080).unwrap();
        store.set("server.hosts[0]", "a").unwrap();
        assert_eq!(store.get("server.port"), Some(json!(8080)));
        assert_eq!(store.get("server.hosts"), Some(json!(["a"])));
        assert!(store.contains("server.hosts[0]"));

        assert_eq!(store.remove("server.port"), Some(json!(8080)));
        assert_eq!(store.get("server.port"), None);
        assert_eq!(store.remove("server.port"), None);

        store.set("server", Value::Null).unwrap();
        assert_eq!(*store.dump(), json!({}));
    }

    #[test]
    fn test_dump_snapshot_survives_set() {
        let store = ConfigStore::new(MapEnv::new());
        store.set("a", 1).unwrap();
        let before = store.dump();
        store.set("a", 2).unwrap();
        assert_eq!(*before, json!({"a": 1}));
        assert_eq!(*store.dump(), json!({"a": 2}));
    }

    #[test]
    fn test_get_as_typed() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Server {
            host: String,
            port: u16,
        }

        let store = ConfigStore::new(MapEnv::new());
        store
            .set("server", json!({"host": "localhost", "port": 8080}))
            .unwrap();

        let server: Server = store.get_as("server").unwrap().unwrap();
        assert_eq!(
            server,
            Server {
                host: "localhost".into(),
                port: 8080
            }
        );
        assert_eq!(store.get_as::<u16>("missing").unwrap(), None);

        let err = store.get_as::<u16>("server.host").unwrap_err();
        assert!(matches!(err, ConfigError::Deserialize { ref key, .. } if key == "server.host"));
    }

    #[test]
    fn test_rejected_set_leaves_tree_unchanged() {
        let store = ConfigStore::new(MapEnv::new());
        store.set("a", 1).unwrap();

        let err = store.set("", 5).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPath {
                source: PathError::Root,
                ..
            }
        ));

        let err = store.set("fresh[18446744073709551615].x", 1).unwrap_err();
        match err {
            ConfigError::InvalidPath { path, .. } => {
                assert_eq!(path, "fresh[18446744073709551615].x")
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*store.dump(), json!({"a": 1}));
    }

    #[test]
    fn test_store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConfigStore<ProcessEnv>>();
        assert_send_sync::<ConfigStore<MapEnv>>();
    }
}
