//! CLI command definitions for layered-conf
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::config::{CONF_DIR_VAR, CONF_FILES_VAR, Environment, Overlay, ProcessEnv};
use crate::format::OutputFormat;
use clap::{Parser, Subcommand};

/// Load layered YAML configuration and inspect the merged result
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration directory (overrides CONF_DIR)
    #[arg(short = 'd', long, global = true)]
    pub conf_dir: Option<String>,

    /// Comma-separated override file names (overrides CONF_FILES)
    #[arg(short = 'f', long, global = true)]
    pub conf_files: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the merged configuration (default if no subcommand given)
    Dump {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },

    /// Print the value at a path such as `api.hosts[0].port`
    Get {
        /// Path to read
        path: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },

    /// List the files and environment variables that contributed
    Sources {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },
}

impl Cli {
    /// Environment for the store: the process environment with CLI
    /// overrides applied on top.
    pub fn environment(&self) -> Overlay<ProcessEnv> {
        self.environment_over(ProcessEnv)
    }

    /// Layer the CLI's directory and file overrides over `base`.
    pub fn environment_over<E: Environment>(&self, base: E) -> Overlay<E> {
        let mut env = Overlay::new(base);
        if let Some(ref dir) = self.conf_dir {
            env.insert(CONF_DIR_VAR, dir.as_str());
        }
        if let Some(ref files) = self.conf_files {
            env.insert(CONF_FILES_VAR, files.as_str());
        }
        env
    }
}
