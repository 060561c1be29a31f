//! Service layer - business logic orchestration
//!
//! Services sit on top of the domain types: the cipher codec, the encrypted
//! statement store built on it, statistics reports and the event log.

pub mod cipher;
pub mod logging;
mod report;
mod store;

pub use cipher::CipherCodec;
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use report::{PeriodSummary, ReportService, StatisticsSummary};
pub use store::{StatementStore, WriteSummary};
