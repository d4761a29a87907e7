use crate::domain::{LinesRequest, PageRequest, PageResponse, RawLine, SingleFileResponse};
use anyhow::Result;
use async_trait::async_trait;

/// Network seam of the engine. Implementations own retries and timeouts;
/// the engine only consumes response bodies.
#[async_trait]
pub trait DiffTransport: Send + Sync {
    fn id(&self) -> &str;
    async fn fetch_page(&self, endpoint: &str, request: &PageRequest) -> Result<PageResponse>;
    async fn fetch_lines(&self, endpoint: &str, request: &LinesRequest) -> Result<Vec<RawLine>>;
    async fn fetch_single_file(&self, url: &str) -> Result<SingleFileResponse>;
}
