//! Configuration types for the resolver

use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::resolver::core::{ResolveError, Result, SourceRepository};

/// Default GitHub REST endpoint
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default game index used by the search step
pub const DEFAULT_SEARCH_URL: &str = "https://steamui.com/api/loadGames.php";

/// Repositories tried by default, highest priority first
pub const DEFAULT_REPOSITORIES: [&str; 3] = [
    "SteamAutoCracks/ManifestHub",
    "Auiowu/ManifestAutoUpdate",
    "tymolu233/ManifestAutoUpdate-fix",
];

/// Configuration for resolution runs
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Base URL of the repository hosting API
    pub api_base: String,
    /// Candidate repositories in priority order
    pub repositories: Vec<SourceRepository>,
    /// Directory under which `[<appid>]` is created
    pub output_root: PathBuf,
    /// Extension of the descriptor script
    pub descriptor_extension: String,
    pub user_agent: String,
    /// Request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
    pub search_url: String,
}

impl ResolverConfig {
    /// Load configuration from the environment, reading `.env` if present
    ///
    /// Recognised variables: `MANIFEST_API_BASE`, `MANIFEST_REPOSITORIES`
    /// (comma separated, in priority order), `MANIFEST_OUTPUT_DIR`,
    /// `MANIFEST_SEARCH_URL` and `MANIFEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Ignore error if .env not present
        let mut config = Self::default();

        if let Ok(base) = std::env::var("MANIFEST_API_BASE") {
            config.api_base = base;
        }
        if let Ok(list) = std::env::var("MANIFEST_REPOSITORIES") {
            config = config.with_repositories(list.split(',').map(str::trim).filter(|s| !s.is_empty()));
        }
        if let Ok(dir) = std::env::var("MANIFEST_OUTPUT_DIR") {
            config.output_root = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("MANIFEST_SEARCH_URL") {
            config.search_url = url;
        }
        if let Ok(secs) = std::env::var("MANIFEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| ResolveError::Configuration {
                message: format!("MANIFEST_TIMEOUT_SECS must be a whole number of seconds, got '{}'", secs),
                field: Some("MANIFEST_TIMEOUT_SECS".to_string()),
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        config.validate()?;
        debug!("Loaded resolver configuration: {:?}", config);
        Ok(config)
    }

    /// Replace the repository list; ranks follow iteration order
    pub fn with_repositories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repositories = names
            .into_iter()
            .enumerate()
            .map(|(rank, name)| SourceRepository::new(name, rank))
            .collect();
        self
    }

    pub fn with_api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_output_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn with_search_url<S: Into<String>>(mut self, url: S) -> Self {
        self.search_url = url.into();
        self
    }

    /// Reject configurations that cannot resolve anything
    pub fn validate(&self) -> Result<()> {
        if self.repositories.is_empty() {
            return Err(ResolveError::Configuration {
                message: "at least one source repository is required".to_string(),
                field: Some("repositories".to_string()),
            });
        }
        if let Some(bad) = self.repositories.iter().find(|r| r.name.split('/').count() != 2) {
            return Err(ResolveError::Configuration {
                message: format!("repository '{}' is not of the form owner/name", bad.name),
                field: Some("repositories".to_string()),
            });
        }
        url::Url::parse(&self.api_base)?;
        url::Url::parse(&self.search_url)?;
        if self.descriptor_extension.is_empty() {
            return Err(ResolveError::Configuration {
                message: "descriptor extension must not be empty".to_string(),
                field: Some("descriptor_extension".to_string()),
            });
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            repositories: DEFAULT_REPOSITORIES
                .iter()
                .enumerate()
                .map(|(rank, name)| SourceRepository::new(*name, rank))
                .collect(),
            output_root: PathBuf::from("."),
            descriptor_extension: "lua".to_string(),
            user_agent: concat!("steam-manifest/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: None,
            search_url: DEFAULT_SEARCH_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_repositories_are_ranked_in_order() {
        let config = ResolverConfig::default();
        let names: Vec<&str> = config.repositories.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, DEFAULT_REPOSITORIES.to_vec());
        assert!(config.repositories.iter().enumerate().all(|(i, r)| r.rank == i));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_repository_list_is_rejected() {
        let config = ResolverConfig::default().with_repositories(Vec::<String>::new());
        assert!(matches!(config.validate(), Err(ResolveError::Configuration { .. })));
    }

    #[test]
    fn malformed_repository_name_is_rejected() {
        let config = ResolverConfig::default().with_repositories(["no-slash"]);
        assert!(matches!(config.validate(), Err(ResolveError::Configuration { .. })));
    }

    #[test]
    fn malformed_api_base_is_rejected() {
        let config = ResolverConfig::default().with_api_base("not a url");
        assert!(config.validate().is_err());
    }
}
