use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Session data request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to fetch page {page}: {source}")]
    Page {
        page: u32,
        source: Box<InsightsError>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InsightsError {
    /// Wrap a page-level failure with the page number it came from.
    pub fn page(page: u32, source: InsightsError) -> Self {
        Self::Page {
            page,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, InsightsError>;
