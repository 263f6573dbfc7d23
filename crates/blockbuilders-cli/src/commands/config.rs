use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::services::load_config;

pub fn show(config_path: Option<PathBuf>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if !config.auth.anon_key.is_empty() {
        config.auth.anon_key = "<redacted>".to_string();
    }

    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}
