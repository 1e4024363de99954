//! Merge config resolution and `kesher validate`.

use std::path::{Path, PathBuf};

use kesher_recon::MergeConfig;

use crate::CliError;

const CONFIG_FILE: &str = "config.toml";

/// `$CONFIG_DIR/kesher/config.toml`, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("kesher").join(CONFIG_FILE))
}

/// Load the config named on the command line, else the user config file
/// when it exists, else the built-in defaults.
pub fn resolve(explicit: Option<&Path>) -> Result<MergeConfig, CliError> {
    if let Some(path) = explicit {
        return load(path);
    }
    match user_config_path() {
        Some(path) if path.is_file() => {
            log::info!("using config {}", path.display());
            load(&path)
        }
        _ => Ok(MergeConfig::default()),
    }
}

fn load(path: &Path) -> Result<MergeConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::config(format!("cannot read config {}: {e}", path.display())))?;
    MergeConfig::from_toml(&text)
        .map_err(|e| CliError::config(format!("{}: {e}", path.display())))
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load(&config_path)?;
    eprintln!(
        "valid: {} noise marker(s), sheet '{}', {:?} headers",
        config.filter.noise_markers.len(),
        config.output.sheet_name,
        config.output.header_language,
    );
    Ok(())
}
