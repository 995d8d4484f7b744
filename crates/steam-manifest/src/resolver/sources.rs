//! Source repository selection
//!
//! Candidates are tried strictly in order; the first success wins and every
//! failure before it is kept so callers can report what was skipped.

use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::resolver::config::ResolverConfig;
use crate::resolver::core::{AppId, ResolveError, Result, SourceRepository, TreeReference};
use crate::resolver::http::{Fetcher, get_json};

/// Result of running candidates through [`first_success`]
#[derive(Debug)]
pub struct Fallback<C, T> {
    /// Winning candidate and its value
    pub success: Option<(C, T)>,
    /// Failures recorded before the winner (or all of them)
    pub failures: Vec<ResolveError>,
}

impl<C, T> Fallback<C, T> {
    pub fn is_success(&self) -> bool {
        self.success.is_some()
    }

    /// Turn the outcome into a `Result`
    ///
    /// On exhaustion the recorded failures are joined with a terminal
    /// `NotFound { what }`.
    pub fn into_result(self, what: impl Into<String>) -> Result<(C, T)> {
        match self.success {
            Some(found) => Ok(found),
            None => {
                let mut failures = self.failures;
                failures.push(ResolveError::NotFound { what: what.into() });
                Err(ResolveError::Exhausted { failures })
            }
        }
    }
}

/// Run `attempt` over `candidates` in order until one succeeds
pub async fn first_success<C, T, I, F, Fut>(candidates: I, mut attempt: F) -> Fallback<C, T>
where
    I: IntoIterator<Item = C>,
    C: Clone,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut failures = Vec::new();
    for candidate in candidates {
        match attempt(candidate.clone()).await {
            Ok(value) => {
                return Fallback {
                    success: Some((candidate, value)),
                    failures,
                };
            }
            Err(e) => failures.push(e),
        }
    }
    Fallback { success: None, failures }
}

#[derive(Debug, Default, Deserialize)]
struct BranchResponse {
    #[serde(default)]
    commit: BranchCommit,
}

#[derive(Debug, Default, Deserialize)]
struct BranchCommit {
    #[serde(default)]
    commit: CommitDetail,
}

#[derive(Debug, Default, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    tree: CommitTree,
}

#[derive(Debug, Default, Deserialize)]
struct CommitTree {
    #[serde(default)]
    url: String,
}

/// Resolves an AppID branch to a tree reference across repositories
pub struct SourceSelector {
    fetcher: Arc<dyn Fetcher>,
    api_base: String,
    repositories: Vec<SourceRepository>,
}

impl SourceSelector {
    pub fn new(fetcher: Arc<dyn Fetcher>, api_base: impl Into<String>, mut repositories: Vec<SourceRepository>) -> Self {
        repositories.sort_by_key(|r| r.rank);
        Self {
            fetcher,
            api_base: api_base.into(),
            repositories,
        }
    }

    pub fn from_config(fetcher: Arc<dyn Fetcher>, config: &ResolverConfig) -> Self {
        Self::new(fetcher, config.api_base.clone(), config.repositories.clone())
    }

    /// Repositories in the order they are tried
    pub fn repositories(&self) -> &[SourceRepository] {
        &self.repositories
    }

    fn branch_url(&self, repository: &SourceRepository, app_id: AppId) -> String {
        format!(
            "{}/repos/{}/branches/{}",
            self.api_base.trim_end_matches('/'),
            repository.name,
            app_id
        )
    }

    /// Look up the AppID branch in a single repository
    pub async fn resolve_in(&self, repository: &SourceRepository, app_id: AppId) -> Result<TreeReference> {
        let url = self.branch_url(repository, app_id);
        debug!("Looking up branch {} in {}", app_id, repository);

        let branch: BranchResponse = match get_json(self.fetcher.as_ref(), &url).await {
            Ok(branch) => branch,
            Err(ResolveError::HttpStatus { status: 404, .. }) => {
                return Err(ResolveError::BranchNotFound {
                    repo: repository.name.clone(),
                    branch: app_id.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let tree_url = branch.commit.commit.tree.url;
        if tree_url.is_empty() {
            return Err(ResolveError::MissingTreeUrl { url });
        }
        Ok(TreeReference {
            repository: repository.name.clone(),
            url: tree_url,
        })
    }

    /// Try every repository in priority order, keeping all failures
    pub async fn resolve_with_failures(&self, app_id: AppId) -> Fallback<SourceRepository, TreeReference> {
        first_success(self.repositories.iter().cloned(), move |repository| async move {
            self.resolve_in(&repository, app_id).await.map_err(|e| {
                warn!("Repository {} has no usable branch {}: {}", repository, app_id, e);
                e.in_repository(repository.name.clone())
            })
        })
        .await
    }

    /// First tree reference found, or the combined error of every repository
    pub async fn resolve(&self, app_id: AppId) -> Result<TreeReference> {
        self.resolve_with_failures(app_id)
            .await
            .into_result(format!("manifest for AppID {}", app_id))
            .map(|(_, reference)| reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_success_stops_at_the_first_winner() {
        let mut calls = Vec::new();
        let outcome = first_success(vec!["a", "b", "c", "d"], |c| {
            calls.push(c);
            async move {
                if c == "c" {
                    Ok(c.to_uppercase())
                } else {
                    Err(ResolveError::NotFound { what: c.to_string() })
                }
            }
        })
        .await;

        assert_eq!(calls, vec!["a", "b", "c"]);
        assert_eq!(outcome.failures.len(), 2);
        let (winner, value) = outcome.success.unwrap();
        assert_eq!(winner, "c");
        assert_eq!(value, "C");
    }

    #[tokio::test]
    async fn exhaustion_appends_a_terminal_not_found() {
        let outcome: Fallback<&str, ()> = first_success(vec!["a", "b"], |c| async move {
            Err(ResolveError::NotFound { what: c.to_string() })
        })
        .await;

        assert!(!outcome.is_success());
        match outcome.into_result("thing") {
            Err(ResolveError::Exhausted { failures }) => {
                assert_eq!(failures.len(), 3);
                assert_eq!(failures[2].to_string(), "thing not found");
            }
            other => panic!("Expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn no_candidates_is_plain_not_found() {
        let outcome: Fallback<&str, ()> = first_success(Vec::<&str>::new(), |_| async { Ok(()) }).await;
        match outcome.into_result("thing") {
            Err(ResolveError::Exhausted { failures }) => assert_eq!(failures.len(), 1),
            other => panic!("Expected Exhausted, got {:?}", other),
        }
    }
}
