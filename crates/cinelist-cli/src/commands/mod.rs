pub mod browse;
pub mod config;
pub mod detail;
pub mod prefs;
pub mod profile;
pub mod progress;
pub mod prompts;
pub mod watchlist;

use cinelist_api::{ApiError, ClientConfig, HttpClient, MovieService};
use cinelist_config::{Config, CredentialStore, PathManager};
use cinelist_core::{FeedOptions, FileStorage, KeyValueStorage};
use color_eyre::Result;
use std::sync::Arc;

/// Paths, configuration and credentials shared by every command
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
    pub credentials: CredentialStore,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        Self::load_from(PathManager::default())
    }

    pub fn load_from(paths: PathManager) -> Result<Self> {
        paths
            .ensure_directories()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create {}: {}", paths.config_dir().display(), e))?;

        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        config
            .validate()
            .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

        let credentials_file = paths.credentials_file();
        let mut credentials = CredentialStore::new(credentials_file.clone());
        credentials
            .load()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;

        Ok(Self {
            paths,
            config,
            credentials,
        })
    }

    pub fn storage(&self) -> Result<Arc<dyn KeyValueStorage>> {
        let storage = FileStorage::new(&self.paths.storage_dir())?;
        Ok(Arc::new(storage))
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new(self.config.api.base_url.clone()).with_timeout(self.config.api.timeout());
        if let Some(token) = self.credentials.resolve_access_token() {
            client_config = client_config.with_access_token(token);
        }
        if let Some(api_key) = self.credentials.get_api_key() {
            client_config = client_config.with_api_key(api_key.clone());
        }
        client_config
    }

    pub fn http_client(&self) -> Result<Arc<HttpClient>> {
        let client_config = self.client_config();
        if client_config.access_token.is_none() && client_config.api_key.is_none() {
            tracing::warn!("No access token configured; run `cinelist config token` first");
        }
        Ok(Arc::new(HttpClient::new(client_config)?))
    }

    pub fn movie_service(&self) -> Result<MovieService> {
        Ok(MovieService::new(self.http_client()?))
    }

    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions {
            language: self.config.api.language.clone(),
            region: self.config.api.region.clone(),
            stale_time: self.config.feed.stale_time(),
            gc_time: self.config.feed.gc_time(),
        }
    }
}

/// Status line plus the upstream `status_message` when the body carried one
pub fn describe_api_error(error: &ApiError) -> String {
    match error.upstream_message() {
        Some(message) => format!("{} ({})", error, message),
        None => error.to_string(),
    }
}

/// Keep the first and last two characters of a secret
pub fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "<not set>");
        assert_eq!(mask_string("abcd"), "****");
        assert_eq!(mask_string("eyJhbGciOi"), "ey***Oi");
    }

    #[test]
    fn test_context_from_empty_home() {
        let dir = tempfile::tempdir().unwrap();
        let context = AppContext::load_from(PathManager::from_base(dir.path().to_path_buf())).unwrap();

        assert!(dir.path().join("data").join("storage").is_dir());
        assert_eq!(context.config.api.language, "en-US");

        let options = context.feed_options();
        assert_eq!(options.stale_time, std::time::Duration::from_secs(300));
        assert!(context.storage().is_ok());
    }
}
