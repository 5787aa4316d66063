//! Layered configuration loading.
//!
//! A configuration directory holds:
//! - `base.yaml` / `base.yml` - required, lowest precedence
//! - `<name>.yaml` / `<name>.yml` - override files, merged in the order named
//! - `env_mapping.yaml` / `env_mapping.yml` - optional map of environment
//!   variables to config paths, applied last
//!
//! ## Merge Strategy
//! - Mappings: deep merge key by key
//! - Sequences and scalars: replaced wholesale by the later source
//!
//! ## Environment Variables
//! - `CONF_DIR` - Configuration directory (default: `./conf`)
//! - `CONF_FILES` - Comma-separated override file names, e.g. `staging,local`

pub mod env;
pub mod files;
mod loader;
mod merge;
mod overrides;
pub mod path;

pub use env::{CastType, EnvMapping, Environment, MapEnv, Overlay, ProcessEnv, cast};
pub use files::{ConfigFile, read_optional, read_required, resolve_extension};
pub use loader::{CONF_DIR_VAR, CONF_FILES_VAR, ConfigStore, DEFAULT_CONF_DIR, LoadReport};
pub use merge::{deep_merge, deep_merge_all};
pub use overrides::{BASE_FILE, ENV_MAPPING_FILE, parse_override_list};
pub use path::{ConfigPath, Segment};
