pub mod config;
pub mod error;
pub mod time;
pub mod types;

pub use config::AppConfig;
pub use error::{InsightsError, Result};
pub use types::{
    Filters, Message, Pagination, Session, SessionDataRequest, SessionDataResponse,
    SessionPayload, UserAction,
};
