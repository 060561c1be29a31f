//! CLI command implementations

pub mod analyze;
pub mod config;
pub mod list;
pub mod logs;
pub mod remove;
pub mod save;
pub mod stats;

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use dialoguer::Password;
use ccstats_core::domain::parse_statement_date;
use ccstats_core::{CcstatsContext, EntryPoint, LogEvent, LoggingService, Statement};

use crate::output;

/// Password source consulted before prompting
pub const PASSWORD_ENV: &str = "CCSTATS_PASSWORD";

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Log a failed command. Only the error category is recorded so amounts,
/// dates and descriptions never reach the log.
pub fn log_failure(
    logger: &Option<LoggingService>,
    event: &str,
    command: &str,
    err: &anyhow::Error,
) {
    let category = err
        .downcast_ref::<ccstats_core::Error>()
        .map_or("other", |e| e.category());
    if let Some(l) = logger {
        let _ = l.log_failure(event, command, category);
    }
}

/// Get the ccstats directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = env::var("CCSTATS_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".ccstats"))
        .context("Could not find home directory; set CCSTATS_DIR")
}

/// Load settings and build the services
///
/// Prints the key length advisory here, once per run, when the configured
/// key length had to be clamped.
pub fn get_context(quiet: bool) -> Result<CcstatsContext> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create ccstats directory: {:?}", data_dir))?;

    let ctx = CcstatsContext::new(&data_dir).context("Failed to initialize ccstats context")?;
    match ctx.advisory() {
        Some(advisory) if !quiet => output::warning(&format!("Warning: {}", advisory.message())),
        _ => {}
    }
    Ok(ctx)
}

/// Get password from --password flag, CCSTATS_PASSWORD env var, or prompt
pub fn get_password(password_flag: Option<String>, prompt: &str) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }

    if let Ok(p) = env::var(PASSWORD_ENV) {
        return Ok(p);
    }

    let p = Password::new().with_prompt(prompt).interact()?;
    Ok(p)
}

/// Like [`get_password`], but an interactive prompt asks twice
pub fn get_new_password(password_flag: Option<String>) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }

    if let Ok(p) = env::var(PASSWORD_ENV) {
        return Ok(p);
    }

    let p = Password::new()
        .with_prompt("Store password")
        .with_confirmation("Confirm store password", "Passwords do not match")
        .interact()?;
    Ok(p)
}

/// Decrypt a store, showing progress unless `quiet`
pub fn read_store(
    ctx: &CcstatsContext,
    path: &Path,
    password: &str,
    quiet: bool,
) -> Result<Statement> {
    let bar = output::progress_bar("Decrypting", quiet);
    let statement = ctx
        .store
        .read_with_progress(path, password, output::track(&bar))
        .with_context(|| format!("Failed to read store {:?}", path))?;
    bar.finish_and_clear();
    Ok(statement)
}

/// Parse an optional `--from` / `--to` pair. Both or neither must be given.
pub fn parse_range(from: Option<&str>, to: Option<&str>) -> Result<Option<(NaiveDate, NaiveDate)>> {
    match (from, to) {
        (None, None) => Ok(None),
        (Some(from), Some(to)) => {
            let start = parse_statement_date(from)?;
            let end = parse_statement_date(to)?;
            if end < start {
                anyhow::bail!("--to ({}) is before --from ({})", to, from);
            }
            Ok(Some((start, end)))
        }
        _ => anyhow::bail!("--from and --to must be given together"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert!(parse_range(None, None).unwrap().is_none());

        let (start, end) = parse_range(Some("Jan 01, 2024"), Some("Jan 31, 2024"))
            .unwrap()
            .unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn test_parse_range_rejects_bad_input() {
        assert!(parse_range(Some("Jan 01, 2024"), None).is_err());
        assert!(parse_range(Some("Feb 01, 2024"), Some("Jan 01, 2024")).is_err());
        assert!(parse_range(Some("2024-01-01"), Some("Jan 01, 2024")).is_err());
    }

    #[test]
    fn test_password_flag_wins() {
        assert_eq!(get_password(Some("pw".to_string()), "unused").unwrap(), "pw");
        assert_eq!(get_new_password(Some("pw".to_string())).unwrap(), "pw");
    }
}
