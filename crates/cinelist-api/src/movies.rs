use crate::client::{HttpClient, RequestOptions};
use crate::error::ApiError;
use crate::traits::MovieFeedSource;
use async_trait::async_trait;
use cinelist_models::{Category, Movie, MovieCredits, MoviePage};
use std::sync::Arc;

pub const GET_NOW_PLAYING_MOVIES: &str = "/movie/now_playing";
pub const GET_UPCOMING_MOVIES: &str = "/movie/upcoming";
pub const GET_POPULAR_MOVIES: &str = "/movie/popular";
pub const GET_MOVIE_DETAIL: &str = "/movie/{movie_id}";
pub const GET_MOVIE_CREDITS: &str = "/movie/{movie_id}/credits";
pub const GET_MOVIE_RECOMMENDATIONS: &str = "/movie/{movie_id}/recommendations";

pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Query parameters accepted by the list endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub language: Option<String>,
    pub region: Option<String>,
    pub sort_by: Option<String>,
}

impl PaginationParams {
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn sort_by(mut self, sort_by: Option<String>) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// `page` and `language` are always sent; `region` and `sort_by` only when set
    pub fn to_options(&self) -> RequestOptions {
        let mut options = RequestOptions::new()
            .param("page", self.page.unwrap_or(1))
            .param("language", self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE));

        if let Some(region) = &self.region {
            options = options.param("region", region);
        }
        if let Some(sort_by) = &self.sort_by {
            options = options.param("sort_by", sort_by);
        }
        options
    }
}

pub(crate) fn with_id(template: &str, placeholder: &str, id: &str) -> String {
    template.replace(placeholder, &urlencoding::encode(id))
}

fn movie_route(template: &str, movie_id: u64) -> String {
    with_id(template, "{movie_id}", &movie_id.to_string())
}

/// Typed access to the movie endpoints. Failures come back exactly as the client
/// reported them.
#[derive(Clone)]
pub struct MovieService {
    client: Arc<HttpClient>,
}

impl MovieService {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<HttpClient> {
        &self.client
    }

    async fn list(&self, route: &str, params: &PaginationParams) -> Result<MoviePage, ApiError> {
        let response = self.client.get::<MoviePage>(route, &params.to_options()).await?;
        Ok(response.data)
    }

    pub async fn popular(&self, params: &PaginationParams) -> Result<MoviePage, ApiError> {
        self.list(GET_POPULAR_MOVIES, params).await
    }

    pub async fn now_playing(&self, params: &PaginationParams) -> Result<MoviePage, ApiError> {
        self.list(GET_NOW_PLAYING_MOVIES, params).await
    }

    pub async fn upcoming(&self, params: &PaginationParams) -> Result<MoviePage, ApiError> {
        self.list(GET_UPCOMING_MOVIES, params).await
    }

    pub async fn by_category(&self, category: Category, params: &PaginationParams) -> Result<MoviePage, ApiError> {
        match category {
            Category::Popular => self.popular(params).await,
            Category::NowPlaying => self.now_playing(params).await,
            Category::Upcoming => self.upcoming(params).await,
        }
    }

    pub async fn detail(&self, movie_id: u64) -> Result<Movie, ApiError> {
        let route = movie_route(GET_MOVIE_DETAIL, movie_id);
        Ok(self.client.get::<Movie>(&route, &RequestOptions::new()).await?.data)
    }

    pub async fn credits(&self, movie_id: u64) -> Result<MovieCredits, ApiError> {
        let route = movie_route(GET_MOVIE_CREDITS, movie_id);
        Ok(self.client.get::<MovieCredits>(&route, &RequestOptions::new()).await?.data)
    }

    pub async fn recommendations(&self, movie_id: u64) -> Result<MoviePage, ApiError> {
        let route = movie_route(GET_MOVIE_RECOMMENDATIONS, movie_id);
        Ok(self.client.get::<MoviePage>(&route, &RequestOptions::new()).await?.data)
    }
}

#[async_trait]
impl MovieFeedSource for MovieService {
    async fn fetch_page(&self, category: Category, params: &PaginationParams) -> Result<MoviePage, ApiError> {
        self.by_category(category, params).await
    }
}
