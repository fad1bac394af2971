pub mod client;
pub mod error;
pub mod movies;
pub mod profile;
pub mod traits;

pub use client::{ApiResponse, ClientConfig, HttpClient, RequestOptions, ResponseBody};
pub use error::ApiError;
pub use movies::{MovieService, PaginationParams, DEFAULT_LANGUAGE};
pub use profile::ProfileService;
pub use traits::MovieFeedSource;

pub use reqwest::Method;
