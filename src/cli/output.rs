//! Output formatting for CLI commands

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Print data in the specified format
pub fn print_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    println!("{}", render(data, format)?);
    Ok(())
}

/// Render data in the specified format without printing it
pub fn render<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).context("Failed to serialize to JSON")
        }
        OutputFormat::Yaml => serde_yaml::to_string(data).context("Failed to serialize to YAML"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn data() -> TestData {
        TestData { name: "test".to_string(), value: 42 }
    }

    #[test]
    fn test_render_json() {
        let json = render(&data(), OutputFormat::Json).unwrap();
        assert!(json.contains("\"name\": \"test\""));
    }

    #[test]
    fn test_render_yaml() {
        let yaml = render(&data(), OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("value: 42"));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("yaml", true).unwrap(), OutputFormat::Yaml);
        assert!(OutputFormat::from_str("table", true).is_err());
    }
}
