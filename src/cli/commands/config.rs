//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;

/// Keys that are absent from the serialized settings until they are set.
const OPTIONAL_KEYS: &[&str] = &[
    "transcription.language",
    "image.file_name",
    "prompts.custom_dir",
];

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: PathBuf) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_value(&settings, key, value)?;
            updated.save_to(&config_path)?;
            Output::success(&format!("Set {} = {}", key, value));
        }

        ConfigAction::Edit => {
            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Return a copy of `settings` with the dotted `key` set to `raw`.
///
/// `raw` is read as a TOML value when it parses as one and as a plain string
/// otherwise. The result must still deserialize into [`Settings`].
fn set_value(settings: &Settings, key: &str, raw: &str) -> Result<Settings> {
    let mut root = toml::Value::try_from(settings)?;

    let (path, leaf) = match key.rsplit_once('.') {
        Some((path, leaf)) => (Some(path), leaf),
        None => (None, key),
    };

    let mut table = root
        .as_table_mut()
        .ok_or_else(|| anyhow!("configuration is not a table"))?;
    for part in path.into_iter().flat_map(|p| p.split('.')) {
        table = table
            .get_mut(part)
            .and_then(toml::Value::as_table_mut)
            .ok_or_else(|| anyhow!("Unknown config section: {}", part))?;
    }

    let value = match table.get(leaf) {
        Some(existing) if existing.is_table() => bail!("{} is a section, not a value", key),
        Some(toml::Value::String(_)) => toml::Value::String(raw.to_string()),
        Some(_) => parse_value(raw),
        None if OPTIONAL_KEYS.contains(&key) || path == Some("prompts.variables") => {
            toml::Value::String(raw.to_string())
        }
        None => bail!("Unknown config key: {}", key),
    };
    table.insert(leaf.to_string(), value);

    root.try_into()
        .map_err(|e: toml::de::Error| anyhow!("Invalid value for {}: {}", key, e.message()))
}

fn parse_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {}", raw))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}
