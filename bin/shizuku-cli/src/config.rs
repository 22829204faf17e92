use std::path::Path;

use anyhow::Context;
use shizuku::DownloadConfig;

/// Read download settings from a TOML file.
pub fn load_config(path: &Path) -> anyhow::Result<DownloadConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid config file {}", path.display()))
}

fn parse_config(text: &str) -> anyhow::Result<DownloadConfig> {
    Ok(toml::from_str(text)?)
}
