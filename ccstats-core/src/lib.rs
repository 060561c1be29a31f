//! Ccstats Core - Credit card statement statistics and encrypted storage
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Transaction, TransactionPool, Statement, cipher blocks)
//! - **ports**: Trait definitions for external collaborators (StatementSource)
//! - **services**: Business logic orchestration (codec, store, reports, logging)
//! - **adapters**: Concrete implementations (HTML statement extraction)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};

use anyhow::Result;

use config::Config;
use services::{ReportService, StatementStore};

pub use services::{EntryPoint, LogEntry, LogEvent, LoggingService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result as CoreResult};
pub use domain::{
    CipherBlock, KeyLength, KeyLengthAdvisory, RawTransaction, Statement, Transaction,
    TransactionKind, TransactionPool, TransactionStatus,
};

/// Main context for ccstats operations
///
/// Holds the resolved configuration and the services built from it. The
/// codec inside the store is fixed for the lifetime of the context, so a
/// clamped key length is reported once through [`CcstatsContext::advisory`].
pub struct CcstatsContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub store: StatementStore,
    pub report_service: ReportService,
}

impl CcstatsContext {
    /// Create a new context from the settings in `data_dir`
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        Self::with_config(data_dir, config)
    }

    /// Create a context from an already resolved configuration
    pub fn with_config(data_dir: &Path, config: Config) -> Result<Self> {
        let codec = config.codec()?;
        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            store: StatementStore::new(codec),
            report_service: ReportService::new(),
        })
    }

    /// Set when the configured key length exceeded the policy
    pub fn advisory(&self) -> Option<KeyLengthAdvisory> {
        self.store.codec().advisory()
    }
}
