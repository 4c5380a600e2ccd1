use std::path::Path;

use anyhow::Context;
use rutube::SessionConfig;

/// Loads session settings from a TOML file. Missing keys keep their defaults.
pub fn load(path: &Path) -> anyhow::Result<SessionConfig> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = toml::from_str(&data)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}
