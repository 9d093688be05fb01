use std::path::Path;

use tiered_bonus_core::bonus::BonusPolicy;

use crate::input;

/// Policy file formats, picked by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            _ => Err(format!(
                "Unsupported config file '{}': expected .toml, .yaml, .yml or .json",
                path
            )
            .into()),
        }
    }
}

/// Load a policy file. Keys left out fall back to the built-in defaults.
pub fn load_policy(path: &str) -> Result<BonusPolicy, Box<dyn std::error::Error>> {
    let format = ConfigFormat::from_path(path)?;
    let contents = input::file::read_text(path)?;
    let policy = parse_policy(&contents, format)
        .map_err(|e| format!("Failed to parse '{}': {}", path, e))?;
    tracing::debug!(path, "loaded policy file");
    Ok(policy)
}

fn parse_policy(
    contents: &str,
    format: ConfigFormat,
) -> Result<BonusPolicy, Box<dyn std::error::Error>> {
    let policy = match format {
        ConfigFormat::Toml => toml::from_str(contents)?,
        ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
        ConfigFormat::Json => serde_json::from_str(contents)?,
    };
    Ok(policy)
}

/// Render a policy as a TOML document (used as an editable template).
pub fn policy_to_toml(policy: &BonusPolicy) -> Result<String, Box<dyn std::error::Error>> {
    Ok(toml::to_string_pretty(policy)?)
}
