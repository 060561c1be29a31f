//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "aesKeyLength": 256,
//!   "maxKeyLength": 256,
//!   "kdfIterations": 65536,
//!   "statsOutput": "ccstats_stats.txt"
//! }
//! ```
//! Fields this crate does not manage are kept as-is on save.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_KDF_ITERATIONS, DEFAULT_KEY_LENGTH, MAX_KEY_LENGTH};
use crate::services::CipherCodec;

const SETTINGS_FILE: &str = "settings.json";

/// Requested AES key length override, in bits
pub const KEY_LENGTH_ENV: &str = "CCSTATS_KEY_LENGTH";

const DEFAULT_STATS_OUTPUT: &str = "ccstats_stats.txt";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aes_key_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_key_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kdf_iterations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stats_output: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Ccstats configuration (resolved view of settings)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Requested AES key length in bits
    pub aes_key_length: u32,
    /// Key length policy; requests above it are clamped
    pub max_key_length: u32,
    pub kdf_iterations: u32,
    /// Where `analyze --output-stats` writes its report
    pub stats_output: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aes_key_length: DEFAULT_KEY_LENGTH,
            max_key_length: MAX_KEY_LENGTH,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            stats_output: DEFAULT_STATS_OUTPUT.to_string(),
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// A missing or unparseable settings file yields defaults. The key length
    /// can be overridden with `CCSTATS_KEY_LENGTH`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let mut config = Self::load_saved(data_dir)?;
        config.apply_key_length_override(std::env::var(KEY_LENGTH_ENV).ok().as_deref())?;
        Ok(config)
    }

    /// Settings as stored on disk, without environment overrides
    pub fn load_saved(data_dir: &Path) -> Result<Self> {
        let raw = read_settings(&data_dir.join(SETTINGS_FILE))?;
        Ok(Self::from_settings(&raw))
    }

    fn from_settings(raw: &SettingsFile) -> Self {
        let defaults = Self::default();
        Self {
            aes_key_length: raw.aes_key_length.unwrap_or(defaults.aes_key_length),
            max_key_length: raw.max_key_length.unwrap_or(defaults.max_key_length),
            kdf_iterations: raw.kdf_iterations.unwrap_or(defaults.kdf_iterations),
            stats_output: raw.stats_output.clone().unwrap_or(defaults.stats_output),
        }
    }

    fn apply_key_length_override(&mut self, value: Option<&str>) -> Result<()> {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.aes_key_length = value.parse().with_context(|| {
                format!("{} must be a number of bits, got '{}'", KEY_LENGTH_ENV, value)
            })?;
        }
        Ok(())
    }

    /// Save config to the data directory, keeping fields ccstats doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;
        let settings_path = data_dir.join(SETTINGS_FILE);

        let mut settings = read_settings(&settings_path)?;
        settings.aes_key_length = Some(self.aes_key_length);
        settings.max_key_length = Some(self.max_key_length);
        settings.kdf_iterations = Some(self.kdf_iterations);
        settings.stats_output = Some(self.stats_output.clone());

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {:?}", settings_path))?;
        Ok(())
    }

    /// Cipher codec for the configured key length, policy and KDF cost
    pub fn codec(&self) -> crate::CoreResult<CipherCodec> {
        CipherCodec::with_policy(self.aes_key_length, self.max_key_length, self.kdf_iterations)
    }
}

fn read_settings(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}
