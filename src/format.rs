//! Output formatting utilities for YAML and JSON.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

/// Output format for printed configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    /// Render a value, always ending with a newline.
    pub fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let mut out = match self {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
        };
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoadReport;
    use serde_json::{Value, json};
    use std::path::PathBuf;

    #[test]
    fn test_render_json() {
        let out = OutputFormat::Json.render(&json!({"port": 8080})).unwrap();
        assert_eq!(out, "{\n  \"port\": 8080\n}\n");
    }

    #[test]
    fn test_render_yaml() {
        let out = OutputFormat::Yaml
            .render(&json!({"name": "app0", "port": 8080}))
            .unwrap();
        assert_eq!(out, "name: app0\nport: 8080\n");
    }

    #[test]
    fn test_render_load_report() {
        let report = LoadReport {
            conf_dir: PathBuf::from("conf"),
            files: vec![PathBuf::from("conf/base.yaml"), PathBuf::from("conf/o1.yml")],
            env_mapping: Some(PathBuf::from("conf/env_mapping.yaml")),
            env_vars: vec!["PORT".into()],
        };
        let expected = json!({
            "conf_dir": "conf",
            "files": ["conf/base.yaml", "conf/o1.yml"],
            "env_mapping": "conf/env_mapping.yaml",
            "env_vars": ["PORT"]
        });

        let yaml = OutputFormat::Yaml.render(&report).unwrap();
        assert_eq!(serde_yaml::from_str::<Value>(&yaml).unwrap(), expected);

        let json = OutputFormat::Json.render(&report).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), expected);
    }

    #[test]
    fn test_render_report_without_mapping() {
        let yaml = OutputFormat::Yaml.render(&LoadReport::default()).unwrap();
        let value: Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value["env_mapping"], Value::Null);
        assert_eq!(value["env_vars"], json!([]));
    }
}
