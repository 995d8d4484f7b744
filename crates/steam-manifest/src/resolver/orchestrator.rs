//! Main entry point for resolving an AppID
//!
//! The call chain flows as follows:
//!
//! User Code
//! ↓
//! ManifestResolver (this file)
//! ↓
//! SourceSelector (sources.rs), one repository at a time
//! ↓
//! fetch_tree / filter_entries (tree.rs)
//! ↓
//! ContentResolver (content.rs) → decode_content / parse_key_file
//! ↓
//! build_script (assemble.rs)

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::resolver::assemble::build_script;
use crate::resolver::config::ResolverConfig;
use crate::resolver::content::ContentResolver;
use crate::resolver::core::files::{ensure_dir, remove_dir, write_atomically};
use crate::resolver::core::progress::report;
use crate::resolver::core::{
    AppId, AssemblyResult, EntryOutcome, ProgressCallback, ProgressEvent, Result, SourceRepository,
};
use crate::resolver::http::{Fetcher, HttpClient};
use crate::resolver::sources::{SourceSelector, first_success};
use crate::resolver::tree::{fetch_tree, filter_entries};

/// Drives one resolution run per AppID
///
/// Repositories are attempted in priority order. The destination directory is
/// created up front and removed again, with everything in it, once every
/// repository has failed.
pub struct ManifestResolver {
    config: ResolverConfig,
    selector: SourceSelector,
    content: ContentResolver,
    fetcher: Arc<dyn Fetcher>,
    progress: Option<ProgressCallback>,
}

impl ManifestResolver {
    /// Create a resolver with the default `reqwest` client
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpClient::from_config(&config)?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Create a resolver that talks to the network through `fetcher`
    pub fn with_fetcher(config: ResolverConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            selector: SourceSelector::from_config(fetcher.clone(), &config),
            content: ContentResolver::new(fetcher.clone()),
            config,
            fetcher,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Directory that receives the manifests of `app_id`
    pub fn output_dir(&self, app_id: AppId) -> PathBuf {
        self.config.output_root.join(format!("[{}]", app_id))
    }

    /// Path of the descriptor script of `app_id`
    pub fn descriptor_path(&self, app_id: AppId) -> PathBuf {
        self.output_dir(app_id)
            .join(format!("{}.{}", app_id, self.config.descriptor_extension))
    }

    /// Resolve `app_id` into manifests and a descriptor script
    pub async fn resolve(&self, app_id: AppId) -> Result<AssemblyResult> {
        let dir = self.output_dir(app_id);
        ensure_dir(&dir).await?;

        let attempt_dir = dir.clone();
        let outcome = first_success(self.selector.repositories().iter().cloned(), move |repository| {
            let dir = attempt_dir.clone();
            async move {
                report(
                    self.progress.as_ref(),
                    ProgressEvent::RepositoryStarted { repository: repository.name.clone() },
                );
                self.attempt(&repository, app_id, &dir).await.map_err(|e| {
                    warn!("Repository {} failed for AppID {}: {}", repository, app_id, e);
                    report(
                        self.progress.as_ref(),
                        ProgressEvent::RepositoryFailed {
                            repository: repository.name.clone(),
                            error: e.to_string(),
                        },
                    );
                    e.in_repository(repository.name.clone())
                })
            }
        })
        .await;

        match outcome.into_result(format!("manifest for AppID {}", app_id)) {
            Ok((_, result)) => Ok(result),
            Err(e) => {
                if let Err(cleanup) = remove_dir(&dir).await {
                    warn!("Failed to roll back {}: {}", dir.display(), cleanup);
                }
                Err(e)
            }
        }
    }

    /// One full pass against a single repository
    async fn attempt(&self, repository: &SourceRepository, app_id: AppId, dir: &Path) -> Result<AssemblyResult> {
        let reference = self.selector.resolve_in(repository, app_id).await?;
        let mut tree = fetch_tree(self.fetcher.as_ref(), &reference).await?;
        tree.entries = filter_entries(&tree.entries);
        info!(
            "Repository {} lists {} relevant entries for AppID {}",
            repository,
            tree.entries.len(),
            app_id
        );

        let mut saved = 0;
        let mut existing = 0;
        for entry in &tree.entries {
            match self.content.resolve(entry, dir, &mut tree.depots).await? {
                Some(EntryOutcome::Saved { size }) => {
                    saved += 1;
                    report(
                        self.progress.as_ref(),
                        ProgressEvent::EntrySaved { path: entry.path.clone(), size },
                    );
                }
                Some(EntryOutcome::AlreadyExists) => {
                    existing += 1;
                    report(self.progress.as_ref(), ProgressEvent::EntrySkipped { path: entry.path.clone() });
                }
                Some(EntryOutcome::KeysLoaded { depots }) => {
                    report(self.progress.as_ref(), ProgressEvent::KeysLoaded { depots });
                }
                None => {}
            }
        }

        if tree.depots.is_none() {
            warn!("Repository {} has no key file for AppID {}", repository, app_id);
        }
        let depots = tree.depots.take().unwrap_or_default();
        let script = build_script(app_id, &depots, tree.manifest_paths());

        let descriptor_path = self.descriptor_path(app_id);
        write_atomically(&descriptor_path, script.as_bytes()).await?;
        report(
            self.progress.as_ref(),
            ProgressEvent::DescriptorWritten { path: descriptor_path.clone() },
        );
        info!("Wrote {} ({} depots)", descriptor_path.display(), depots.len());

        Ok(AssemblyResult {
            app_id,
            repository: repository.name.clone(),
            directory: dir.to_path_buf(),
            descriptor_path,
            script,
            manifests_saved: saved,
            manifests_existing: existing,
        })
    }
}
