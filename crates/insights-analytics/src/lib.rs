//! Analytics, aggregation, and reporting for bot chat sessions.
//!
//! Computes engagement, tool efficiency, usage breakdowns, time histograms,
//! review sentiment, and top queries from fetched sessions, plus markdown
//! report generation.

pub mod aggregations;
pub mod overview;
pub mod reports;

pub use aggregations::{process_session_data, Aggregator, AnalyticsSummary, Series};
pub use overview::SessionOverview;
pub use reports::ReportGenerator;
