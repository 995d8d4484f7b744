//! Per-entry content retrieval
//!
//! Manifests are written verbatim into the destination directory; the key
//! file is parsed and its depot keys are handed back to the caller's tree.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::resolver::core::files::{file_exists, join_entry_path, write_atomically};
use crate::resolver::core::{
    DepotKeys, EntryOutcome, EntryRole, FileOperation, ResolveError, Result, TreeEntry,
};
use crate::resolver::decode::decode_content;
use crate::resolver::http::{Fetcher, get_json};
use crate::resolver::keyfile::parse_key_file;

/// Retrieves, decodes and stores filtered tree entries
pub struct ContentResolver {
    fetcher: Arc<dyn Fetcher>,
}

impl ContentResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Resolve one entry into `dest_dir`
    ///
    /// An entry whose file already exists is not fetched again. A parsed key
    /// file replaces `depots`. Entries that are neither manifests nor the key
    /// file are ignored.
    pub async fn resolve(
        &self,
        entry: &TreeEntry,
        dest_dir: &Path,
        depots: &mut Option<DepotKeys>,
    ) -> Result<Option<EntryOutcome>> {
        let Some(role) = entry.role() else {
            debug!("Ignoring unrelated entry {}", entry.path);
            return Ok(None);
        };
        let dest_path = join_entry_path(dest_dir, &entry.path)?;

        if file_exists(&dest_path).await? {
            return match role {
                EntryRole::Manifest => {
                    debug!("Skipping {}, already downloaded", entry.path);
                    Ok(Some(EntryOutcome::AlreadyExists))
                }
                EntryRole::KeyFile => {
                    let bytes = tokio::fs::read(&dest_path)
                        .await
                        .map_err(|e| ResolveError::fs(&dest_path, FileOperation::Read, e))?;
                    Ok(Some(load_keys(&bytes, depots)?))
                }
            };
        }

        let bytes = self.content_of(entry).await?;
        match role {
            EntryRole::Manifest => {
                write_atomically(&dest_path, &bytes).await?;
                info!("Saved {} ({} bytes)", entry.path, bytes.len());
                Ok(Some(EntryOutcome::Saved { size: bytes.len() as u64 }))
            }
            EntryRole::KeyFile => Ok(Some(load_keys(&bytes, depots)?)),
        }
    }

    /// Decoded bytes of an entry, from inline content or a blob fetch
    pub async fn content_of(&self, entry: &TreeEntry) -> Result<Vec<u8>> {
        if let Some(content) = entry.inline_content() {
            return decode_content(content, entry.encoding.as_deref().unwrap_or_default());
        }
        let url = entry
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ResolveError::MissingContentUrl { path: entry.path.clone() })?;

        let blob: TreeEntry = get_json(self.fetcher.as_ref(), url).await?;
        debug!(
            "Blob for {} has encoding {:?} and declared size {:?}",
            entry.path, blob.encoding, blob.size
        );
        decode_content(
            blob.content.as_deref().unwrap_or_default(),
            blob.encoding.as_deref().unwrap_or_default(),
        )
    }
}

fn load_keys(bytes: &[u8], depots: &mut Option<DepotKeys>) -> Result<EntryOutcome> {
    let keys = parse_key_file(bytes)?;
    let count = keys.len();
    debug!("Key file lists {} depots", count);
    *depots = Some(keys);
    Ok(EntryOutcome::KeysLoaded { depots: count })
}
