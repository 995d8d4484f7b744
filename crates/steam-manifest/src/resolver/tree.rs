//! Tree listing retrieval and filtering

use serde::Deserialize;
use tracing::debug;

use crate::resolver::core::{ManifestTree, ResolveError, Result, TreeEntry, TreeReference};
use crate::resolver::http::{Fetcher, get_json};

#[derive(Debug, Deserialize)]
struct TreeListing {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

/// Fetch the listing behind `reference`
///
/// The tree is only built once the whole body decoded.
pub async fn fetch_tree(fetcher: &dyn Fetcher, reference: &TreeReference) -> Result<ManifestTree> {
    if reference.url.is_empty() {
        return Err(ResolveError::MissingTreeUrl {
            url: reference.repository.clone(),
        });
    }
    let listing: TreeListing = get_json(fetcher, &reference.url).await?;
    if listing.truncated {
        debug!("Tree listing {} was truncated by the server", reference.url);
    }
    debug!("Tree {} lists {} entries", reference.url, listing.tree.len());
    Ok(ManifestTree::new(listing.tree))
}

/// Keep only the key file and manifest entries, preserving order
pub fn filter_entries(entries: &[TreeEntry]) -> Vec<TreeEntry> {
    entries.iter().filter(|e| e.role().is_some()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::core::{EntryRole, KEY_FILE_NAME, MANIFEST_SUFFIX};

    fn paths(entries: &[TreeEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.path.as_str()).collect()
    }

    fn sample() -> Vec<TreeEntry> {
        [
            "README.md",
            "1_10.manifest",
            "KEY.vdf",
            "config.vdf",
            "2_20.manifest",
            "key.vdf.bak",
            "manifest",
            "3_30.manifest",
        ]
        .iter()
        .map(|p| TreeEntry::blob(*p, format!("https://example/{}", p)))
        .collect()
    }

    #[test]
    fn keeps_manifests_and_key_file_in_order() {
        let filtered = filter_entries(&sample());
        assert_eq!(paths(&filtered), vec!["1_10.manifest", "KEY.vdf", "2_20.manifest", "3_30.manifest"]);
    }

    #[test]
    fn filtered_output_is_an_ordered_subset_satisfying_the_predicate() {
        let input = sample();
        let filtered = filter_entries(&input);

        let mut cursor = input.iter();
        for kept in &filtered {
            assert!(cursor.any(|e| e == kept), "{} out of order or not in input", kept.path);
            assert!(kept.path.eq_ignore_ascii_case(KEY_FILE_NAME) || kept.path.ends_with(MANIFEST_SUFFIX));
        }
        let dropped = input.iter().filter(|e| !filtered.contains(e));
        for e in dropped {
            assert_eq!(e.role(), None, "{} should have been kept", e.path);
        }
    }

    #[test]
    fn filtering_is_idempotent() {
        let once = filter_entries(&sample());
        let twice = filter_entries(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_listing_stays_empty() {
        assert!(filter_entries(&[]).is_empty());
    }

    #[test]
    fn key_file_role_survives_filtering() {
        let filtered = filter_entries(&sample());
        assert_eq!(filtered.iter().filter(|e| e.role() == Some(EntryRole::KeyFile)).count(), 1);
    }
}
