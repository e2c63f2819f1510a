//! Optional TOML config file, layered under the CLI: any field the CLI
//! didn't set falls back to the file, and any field neither set falls
//! back to a hard default. Mirrors `bootstrap/utxo-dump/src/main.rs`'s
//! flat `Args` struct in shape; the file-layering itself has no direct
//! teacher analogue, so it's built in that same derive-heavy style,
//! using the `toml`/`serde` pairing `luisschwab-Floresta` depends on.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub idx: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub chain: Option<PathBuf>,
    pub blocks: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub windows: Option<Vec<u64>>,
    pub compress: Option<bool>,
    pub log_dir: Option<PathBuf>,
    pub quiet: Option<bool>,
}

pub fn load(path: &std::path::Path) -> anyhow::Result<FileConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
    toml::from_str(&text).map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))
}

/// Picks the CLI value if present, else the file's, else `default`.
pub fn resolve<T>(cli: Option<T>, file: Option<T>, default: T) -> T {
    cli.or(file).unwrap_or(default)
}
