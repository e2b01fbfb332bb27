//! Handlers for `assessa config {path,get,set,init,export}` and the TOML
//! dotted-key helpers they share.

use std::path::{Path, PathBuf};

use assessa_core::{Error, Result};

use crate::cli::ConfigAction;
use crate::config::AssessaConfig;

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand.
///
/// Receives the raw `--config` path rather than a loaded config because
/// `path` and `init` must work before a config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Get { key } => {
            let config = AssessaConfig::load(config_path)?;
            println!("{}", config_value(&config, &key)?);
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let path = AssessaConfig::resolve_config_path(config_path)
                .ok_or_else(|| Error::config("Could not determine config directory"))?;
            set_in_file(&path, &key, &value)?;
            println!("Set {key} = {value} in {}", path.display());
            Ok(())
        }
        ConfigAction::Init { file, force } => {
            let path = match file {
                Some(p) => PathBuf::from(p),
                None => AssessaConfig::default_config_path()
                    .ok_or_else(|| Error::config("Could not determine config directory"))?,
            };
            write_default_config(&path, force)?;
            println!("Config file created at {}", path.display());
            Ok(())
        }
        ConfigAction::Export { docker_env } => {
            let config = AssessaConfig::load(config_path)?;
            for (key, value) in config.to_env_vars()? {
                if docker_env {
                    println!("--env {key}={value}");
                } else {
                    println!("{key}={value}");
                }
            }
            Ok(())
        }
    }
}

// ============================================================================
// Command handlers
// ============================================================================

fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    let path = AssessaConfig::resolve_config_path(config_path).ok_or_else(|| {
        Error::config("Could not determine config directory for this platform")
    })?;
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(file does not exist; run `assessa config init` to create it)");
    }
    Ok(())
}

/// Display form of the value at dotted `key`.
fn config_value(config: &AssessaConfig, key: &str) -> Result<String> {
    let value = toml::Value::try_from(config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

/// Set dotted `key` in the file at `path`.
///
/// The edited document must still deserialize as an [`AssessaConfig`];
/// otherwise the file is left untouched.
fn set_in_file(path: &Path, key: &str, value: &str) -> Result<()> {
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `assessa config init` first.",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    let mut doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;

    set_nested_value(&mut doc, key, parse_value(value))?;

    let toml_str = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    toml::from_str::<AssessaConfig>(&toml_str)
        .map_err(|e| Error::config(format!("Invalid value for '{key}': {e}")))?;
    std::fs::write(path, toml_str).map_err(|e| Error::io_with_path(e, path))?;
    Ok(())
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }
    let toml_str = AssessaConfig::default().to_toml_string()?;
    std::fs::write(path, toml_str).map_err(|e| Error::io_with_path(e, path))
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

/// Navigate a dotted key path in a TOML value tree.
fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        return Err(Error::config("Empty key path"));
    }

    let mut current = root;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
        current = table
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?
        .insert(leaf.to_string(), value);
    Ok(())
}

/// Parse a string value into a TOML value: bool, integer, float, then string.
fn parse_value(s: &str) -> toml::Value {
    match s {
        "true" => toml::Value::Boolean(true),
        "false" => toml::Value::Boolean(false),
        _ => {
            if let Ok(i) = s.parse::<i64>() {
                toml::Value::Integer(i)
            } else if let Ok(f) = s.parse::<f64>() {
                toml::Value::Float(f)
            } else {
                toml::Value::String(s.to_string())
            }
        }
    }
}

fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
