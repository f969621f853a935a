//! Retrieval of session data from the remote session-data service.
//!
//! [`SessionSource`] is the seam between the paging logic and the transport;
//! [`HttpSessionSource`] is the production implementation.

pub mod fetch;
pub mod http;

use async_trait::async_trait;
use insights_core::error::Result;
use insights_core::{SessionDataRequest, SessionDataResponse};

pub use fetch::{fetch_all_sessions, fetch_page, FetchedSessions};
pub use http::{session_data_url, HttpSessionSource};

/// A paginated source of sessions.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Fetch the single page described by `request`.
    async fn fetch_page(&self, request: &SessionDataRequest) -> Result<SessionDataResponse>;
}
