//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - scraper based HTML parsing for the StatementSource port

pub mod html;

pub use html::{parse_html, HtmlStatementSource};
