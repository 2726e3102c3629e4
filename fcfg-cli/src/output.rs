//! Output formatting for CLI commands
//!
//! Parse results are printed in the format chosen by `[output]` in the
//! configuration (or `--format`); enumerated trees always use treeviz.

use fcfg_config::{OutputConfig, OutputFormat};
use fcfg_parser::fcfg::formats::treeviz::to_treeviz_str;
use fcfg_parser::Expansion;
use serde_json::Value;

/// Names accepted by `--format`
pub const AVAILABLE_FORMATS: &[&str] = &["json", "yaml", "debug"];

/// Render a parse result
pub fn format_value(value: &Value, output: &OutputConfig) -> Result<String, String> {
    match output.format {
        OutputFormat::Json if output.pretty => serde_json::to_string_pretty(value)
            .map_err(|e| format!("JSON serialization failed: {}", e)),
        OutputFormat::Json => {
            serde_json::to_string(value).map_err(|e| format!("JSON serialization failed: {}", e))
        }
        OutputFormat::Yaml => serde_yaml::to_string(value)
            .map(|yaml| yaml.trim_end().to_string())
            .map_err(|e| format!("YAML serialization failed: {}", e)),
        OutputFormat::Debug if output.pretty => Ok(format!("{:#?}", value)),
        OutputFormat::Debug => Ok(format!("{:?}", value)),
    }
}

/// Render enumerated trees, one block per tree
pub fn format_trees<'a>(trees: impl IntoIterator<Item = &'a Expansion>) -> String {
    trees
        .into_iter()
        .map(to_treeviz_str)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse `name=word,other words,...` into an open class and its phrases
pub fn parse_class_spec(spec: &str) -> Result<(String, Vec<String>), String> {
    let (name, phrases) = spec
        .split_once('=')
        .ok_or_else(|| format!("invalid open class '{}', expected name=phrase,phrase", spec))?;
    let name = name.trim().trim_start_matches('$');
    if name.is_empty() {
        return Err(format!("open class '{}' has no name", spec));
    }
    let phrases: Vec<String> = phrases
        .split(',')
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .map(String::from)
        .collect();
    Ok((name.to_string(), phrases))
}
