//! Core types used throughout the resolution pipeline
//!
//! This module contains the fundamental types that all other modules depend on:
//! identifiers, repository and tree descriptions, and the attempt-scoped state.

pub mod error;
pub mod files;
pub mod progress;

pub use error::{ErrorKind, FileOperation, ResolveError, Result};
pub use progress::{ProgressCallback, ProgressEvent};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::resolver::keyfile::KeyFileError;

/// Name of the key file carried by every manifest branch
pub const KEY_FILE_NAME: &str = "key.vdf";

/// Suffix of depot manifest files
pub const MANIFEST_SUFFIX: &str = ".manifest";

/// Numeric Steam application identifier
///
/// Its decimal rendering doubles as the branch name in the source repositories
/// and as the name of the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct AppId(pub u32);

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AppId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(AppId)
    }
}

impl From<u32> for AppId {
    fn from(id: u32) -> Self {
        AppId(id)
    }
}

/// A community repository that publishes one branch per AppID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRepository {
    /// `owner/name` on the hosting service
    pub name: String,
    /// Position in the fallback order, 0 is tried first
    pub rank: usize,
}

impl SourceRepository {
    pub fn new<S: Into<String>>(name: S, rank: usize) -> Self {
        Self { name: name.into(), rank }
    }
}

impl fmt::Display for SourceRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Locator of a tree listing, produced by a successful branch lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeReference {
    pub repository: String,
    pub url: String,
}

/// Kind of a listing entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Commit,
    #[serde(other)]
    Other,
}

/// What a filtered entry is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRole {
    Manifest,
    KeyFile,
}

/// One entry of a tree listing, or the body of a blob fetch
///
/// Listing entries carry `url`; blob responses carry `content` and `encoding`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TreeEntry {
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: Option<EntryKind>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl TreeEntry {
    /// Create a listing entry pointing at a blob locator
    pub fn blob<P: Into<String>, U: Into<String>>(path: P, url: U) -> Self {
        Self {
            path: path.into(),
            kind: Some(EntryKind::Blob),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Create an entry whose content is already inlined
    pub fn inline<P: Into<String>, C: Into<String>, E: Into<String>>(path: P, content: C, encoding: E) -> Self {
        Self {
            path: path.into(),
            kind: Some(EntryKind::Blob),
            content: Some(content.into()),
            encoding: Some(encoding.into()),
            ..Self::default()
        }
    }

    /// Classify the entry; `None` means it is irrelevant to assembly
    pub fn role(&self) -> Option<EntryRole> {
        if self.path.eq_ignore_ascii_case(KEY_FILE_NAME) {
            Some(EntryRole::KeyFile)
        } else if self.path.ends_with(MANIFEST_SUFFIX) {
            Some(EntryRole::Manifest)
        } else {
            None
        }
    }

    /// Inline content, if the listing provided any
    pub fn inline_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

/// Depot identifier as written in the key file
///
/// The text is kept verbatim so it still matches `<depot>_<manifest>.manifest`
/// paths; ordering is by numeric value, then by text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepotId {
    value: u64,
    text: String,
}

impl DepotId {
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for DepotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for DepotId {
    type Err = KeyFileError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || KeyFileError::InvalidDepotId { depot: s.to_string() };
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        Ok(DepotId {
            value: s.parse().map_err(|_| invalid())?,
            text: s.to_string(),
        })
    }
}

impl From<u64> for DepotId {
    fn from(value: u64) -> Self {
        DepotId {
            value,
            text: value.to_string(),
        }
    }
}

/// Decryption keys indexed by depot id, iterated in ascending depot order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepotKeys {
    entries: BTreeMap<DepotId, String>,
}

impl DepotKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, depot: DepotId, key: S) {
        self.entries.insert(depot, key.into());
    }

    /// Key of the depot whose id text is exactly `depot`
    pub fn get(&self, depot: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(id, _)| id.as_str() == depot)
            .map(|(_, key)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DepotId, &str)> {
        self.entries.iter().map(|(depot, key)| (depot, key.as_str()))
    }
}

impl FromIterator<(u64, String)> for DepotKeys {
    fn from_iter<I: IntoIterator<Item = (u64, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(depot, key)| (DepotId::from(depot), key)).collect(),
        }
    }
}

/// Listing fetched for one repository attempt, plus the keys parsed from it
#[derive(Debug, Clone, Default)]
pub struct ManifestTree {
    pub entries: Vec<TreeEntry>,
    pub depots: Option<DepotKeys>,
}

impl ManifestTree {
    pub fn new(entries: Vec<TreeEntry>) -> Self {
        Self { entries, depots: None }
    }

    /// Paths of the manifest entries, in listing order
    pub fn manifest_paths(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.role() == Some(EntryRole::Manifest))
            .map(|e| e.path.as_str())
    }
}

/// Outcome of resolving a single entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Manifest fetched, decoded and written
    Saved { size: u64 },
    /// Manifest already on disk, nothing fetched
    AlreadyExists,
    /// Key file parsed into this many depots
    KeysLoaded { depots: usize },
}

/// The descriptor produced by a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyResult {
    pub app_id: AppId,
    pub repository: String,
    pub directory: PathBuf,
    pub descriptor_path: PathBuf,
    pub script: String,
    pub manifests_saved: usize,
    pub manifests_existing: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_matches_key_file_case_insensitively() {
        assert_eq!(TreeEntry::blob("Key.VDF", "u").role(), Some(EntryRole::KeyFile));
        assert_eq!(TreeEntry::blob("key.vdf", "u").role(), Some(EntryRole::KeyFile));
        assert_eq!(TreeEntry::blob("1_2.manifest", "u").role(), Some(EntryRole::Manifest));
        assert_eq!(TreeEntry::blob("other.vdf", "u").role(), None);
        assert_eq!(TreeEntry::blob("README.md", "u").role(), None);
    }

    #[test]
    fn tree_entry_deserializes_listing_shape() {
        let entry: TreeEntry = serde_json::from_str(
            r#"{"path":"1_2.manifest","mode":"100644","type":"blob","sha":"abc","size":12,"url":"https://x/blobs/abc"}"#,
        )
        .unwrap();
        assert_eq!(entry.kind, Some(EntryKind::Blob));
        assert_eq!(entry.size, Some(12));
        assert_eq!(entry.url.as_deref(), Some("https://x/blobs/abc"));
        assert!(entry.inline_content().is_none());
    }

    #[test]
    fn unknown_entry_kind_is_preserved_as_other() {
        let entry: TreeEntry = serde_json::from_str(r#"{"path":"x","type":"symlink"}"#).unwrap();
        assert_eq!(entry.kind, Some(EntryKind::Other));
    }

    #[test]
    fn app_id_parses_and_renders() {
        let id: AppId = " 348970 ".parse().unwrap();
        assert_eq!(id, AppId(348970));
        assert_eq!(id.to_string(), "348970");
        assert!("abc".parse::<AppId>().is_err());
    }

    #[test]
    fn depot_keys_iterate_in_ascending_order() {
        let keys: DepotKeys = vec![(30, "c".to_string()), (10, "a".to_string()), (20, "b".to_string())]
            .into_iter()
            .collect();
        let order: Vec<u64> = keys.iter().map(|(d, _)| d.value()).collect();
        assert_eq!(order, vec![10, 20, 30]);
        assert_eq!(keys.get("20"), Some("b"));
    }

    #[test]
    fn depot_ids_keep_their_text() {
        let mut keys = DepotKeys::new();
        keys.insert("0123".parse().unwrap(), "padded");
        keys.insert("124".parse().unwrap(), "next");
        keys.insert("123".parse().unwrap(), "plain");

        let order: Vec<&str> = keys.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(order, vec!["0123", "123", "124"]);
        assert_eq!(keys.get("0123"), Some("padded"));
        assert_eq!(keys.get("123"), Some("plain"));
        assert!("12a".parse::<DepotId>().is_err());
        assert!("+12".parse::<DepotId>().is_err());
    }
}
