//! layered-conf
//!
//! Loads a configuration directory the same way a host application would and
//! prints the merged result.

use anyhow::{Result, bail};
use clap::Parser;
use layered_conf::cli::{Cli, Command};
use layered_conf::config::ConfigStore;
use layered_conf::format::OutputFormat;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let store = ConfigStore::new(cli.environment());
    store.load()?;

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Some(Command::Dump { format }) => {
            stdout.write_all(format.render(&*store.dump())?.as_bytes())?;
        }
        None => {
            stdout.write_all(OutputFormat::default().render(&*store.dump())?.as_bytes())?;
        }
        Some(Command::Get { ref path, format }) => {
            let Some(value) = store.get(path) else {
                bail!("no value at {}", path);
            };
            stdout.write_all(format.render(&value)?.as_bytes())?;
        }
        Some(Command::Sources { format }) => {
            stdout.write_all(format.render(&*store.load_report())?.as_bytes())?;
        }
    }

    Ok(())
}
