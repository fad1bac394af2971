use crate::error::ApiError;
use crate::movies::PaginationParams;
use async_trait::async_trait;
use cinelist_models::{Category, MoviePage};

/// Anything that can produce one page of a category feed.
///
/// The feed fetcher only depends on this trait, so tests and alternative backends can
/// stand in for the HTTP service.
#[async_trait]
pub trait MovieFeedSource: Send + Sync {
    async fn fetch_page(&self, category: Category, params: &PaginationParams) -> Result<MoviePage, ApiError>;
}
