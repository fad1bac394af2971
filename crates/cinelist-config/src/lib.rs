pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{ApiConfig, Config, FeedConfig, LoggingConfig, DEFAULT_BASE_URL, DEFAULT_IMAGE_BASE_URL};
pub use credentials::{CredentialStore, ACCESS_TOKEN_ENV};
pub use paths::{PathManager, home_override};
