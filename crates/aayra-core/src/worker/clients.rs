use async_trait::async_trait;
use url::Url;

use crate::error::Result;

/// An open application window visible to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClient {
    pub id: String,
    pub url: Url,
}

impl WindowClient {
    pub fn new(id: impl Into<String>, url: Url) -> Self {
        Self { id: id.into(), url }
    }

    pub fn same_origin(&self, other: &Url) -> bool {
        self.url.origin() == other.origin()
    }
}

/// Host window management as seen from the worker.
#[async_trait]
pub trait WindowClients: Send + Sync {
    async fn match_all(&self) -> Result<Vec<WindowClient>>;

    async fn focus(&self, id: &str) -> Result<()>;

    async fn open_window(&self, url: &Url) -> Result<()>;

    /// Take control of already-open windows on activation.
    async fn claim(&self) -> Result<()> {
        Ok(())
    }
}
