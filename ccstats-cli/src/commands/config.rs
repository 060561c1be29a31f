//! Config command - show or change the settings in settings.json

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use super::get_data_dir;
use crate::output;
use ccstats_core::config::Config;

#[derive(Args, Default)]
pub struct ConfigArgs {
    /// Requested AES key length in bits
    #[arg(long, value_name = "BITS")]
    pub key_length: Option<u32>,
    /// Largest key length to use; larger requests are clamped to it
    #[arg(long, value_name = "BITS")]
    pub max_key_length: Option<u32>,
    /// PBKDF2 iteration count for new stores
    #[arg(long, value_name = "N")]
    pub kdf_iterations: Option<u32>,
    /// Report file for `analyze --output-stats`
    #[arg(long, value_name = "PATH")]
    pub stats_output: Option<String>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ConfigArgs {
    fn changes(&self) -> bool {
        self.key_length.is_some()
            || self.max_key_length.is_some()
            || self.kdf_iterations.is_some()
            || self.stats_output.is_some()
    }

    fn apply(&self, config: &mut Config) {
        if let Some(bits) = self.key_length {
            config.aes_key_length = bits;
        }
        if let Some(bits) = self.max_key_length {
            config.max_key_length = bits;
        }
        if let Some(iterations) = self.kdf_iterations {
            config.kdf_iterations = iterations;
        }
        if let Some(path) = &self.stats_output {
            config.stats_output = path.clone();
        }
    }
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let data_dir = get_data_dir()?;
    let mut config = Config::load_saved(&data_dir)?;

    if args.changes() {
        args.apply(&mut config);
        // Refuse to save settings no store could be written with
        config.codec().context("Settings not saved")?;
        config.save(&data_dir)?;
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "aesKeyLength": config.aes_key_length,
                "maxKeyLength": config.max_key_length,
                "kdfIterations": config.kdf_iterations,
                "statsOutput": config.stats_output,
            }))?
        );
        return Ok(());
    }

    if args.changes() {
        output::success("Settings saved");
    }
    println!("{}", "Settings".bold());
    println!("  Key length: {} bits", config.aes_key_length);
    println!("  Max key length: {} bits", config.max_key_length);
    println!("  KDF iterations: {}", config.kdf_iterations);
    println!("  Stats output: {}", config.stats_output);
    Ok(())
}
