mod graphql;
mod mock;

pub use graphql::{GraphqlProductSource, GraphqlSourceConfig};
pub use mock::MockPageSource;

use async_trait::async_trait;
use thiserror::Error;

/// One page yielded by a source. Consumed once by the extractor.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub has_more: bool,
    /// Opaque continuation token; `None` on the last page, or for sources
    /// that only support offset advancement.
    pub next_token: Option<String>,
    /// Total record count, when the source's envelope carries one.
    pub total_count: Option<usize>,
}

impl<T> Page<T> {
    /// A terminal page: no continuation, loop exits normally.
    pub fn last(records: Vec<T>) -> Self {
        Self {
            records,
            has_more: false,
            next_token: None,
            total_count: None,
        }
    }
}

/// All source failures are transient from the loop's perspective: the
/// extractor retries the same token up to its budget, with shape problems
/// treated no differently from transport ones.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status: {0}")]
    Status(u16),

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed page payload: {0}")]
    Shape(String),
}

impl SourceError {
    /// Coarse bucket for failure accounting.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status(_) => "status",
            Self::Decode(_) => "decode",
            Self::Shape(_) => "shape",
        }
    }
}

/// The page-source capability: one operation, `fetch_page`. Concrete
/// adapters (HTTP/GraphQL here, anything else elsewhere) are swappable
/// behind it; the extraction loop never sees past this trait.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Record: Send;

    async fn fetch_page(&self, token: &str) -> Result<Page<Self::Record>, SourceError>;
}
