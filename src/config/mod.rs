mod schema;

pub use schema::{Config, Settings, DEFAULT_FUZZY_THRESHOLD};

use anyhow::{anyhow, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "BWM_CONFIG";

/// config path: explicit override, then `BWM_CONFIG`, then `~/.bwm/config.json`
pub fn get_config_path_with_override(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not find home directory"))?
        .join(".bwm")
        .join("config.json"))
}

/// load the config, writing defaults when the file does not exist yet
pub fn load_with_override(override_path: Option<&Path>) -> Result<Config> {
    let path = get_config_path_with_override(override_path)?;

    if !path.exists() {
        let config = Config::default();
        save_with_override(&config, Some(&path))?;
        return Ok(config);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

pub fn save_with_override(config: &Config, override_path: Option<&Path>) -> Result<()> {
    let path = get_config_path_with_override(override_path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(&path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(())
}

/// blueprint search dirs with `~` expanded, relative ones resolved against `base`
pub fn blueprint_dirs(config: &Config, base: &Path) -> Vec<PathBuf> {
    config
        .settings
        .blueprint_dirs
        .iter()
        .map(|d| {
            let dir = PathBuf::from(shellexpand::tilde(d).to_string());
            if dir.is_absolute() {
                dir
            } else {
                base.join(dir)
            }
        })
        .collect()
}

pub fn set_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["settings", "dry_run"] => {
            config.settings.dry_run = parse_bool(value)?;
        }
        ["settings", "fuzzy_threshold"] => {
            config.settings.fuzzy_threshold = value
                .parse()
                .with_context(|| format!("Invalid number: {}", value))?;
        }
        ["settings", "blueprint_dirs"] => {
            // comma separated
            let dirs: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect();
            if dirs.is_empty() {
                return Err(anyhow!("blueprint_dirs needs at least one directory"));
            }
            config.settings.blueprint_dirs = dirs;
        }
        ["settings", "log_level"] => {
            config.settings.log_level = match value.trim() {
                "" | "none" => None,
                level => Some(level.to_string()),
            };
        }
        _ => {
            return Err(anyhow!(
                "Unknown config key: {}. Valid keys: settings.blueprint_dirs, settings.dry_run, settings.fuzzy_threshold, settings.log_level",
                key
            ));
        }
    }

    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(anyhow!(
            "Invalid boolean value: {}. Use true/false, yes/no, 1/0, or on/off",
            value
        )),
    }
}
