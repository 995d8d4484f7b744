//! Descriptor script assembly

use std::fmt::Write;

use crate::resolver::core::{AppId, DepotKeys, MANIFEST_SUFFIX};

/// Build the descriptor script for `app_id`
///
/// Depots are emitted in ascending order, each followed by one
/// `setManifestid` line per `<depot>_<manifest>.manifest` path. Paths that
/// belong to no known depot are ignored.
pub fn build_script<'a, I>(app_id: AppId, depots: &DepotKeys, manifest_paths: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let paths: Vec<&str> = manifest_paths.into_iter().collect();
    let mut script = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(script, "addappid({})", app_id);

    for (depot, key) in depots.iter() {
        let _ = writeln!(script, "addappid({},0,{})", depot, quote(key));
        let prefix = format!("{}_", depot);
        for path in &paths {
            if let Some(manifest_id) = path
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(MANIFEST_SUFFIX))
            {
                let _ = writeln!(script, "setManifestid({},{})", depot, quote(manifest_id));
            }
        }
    }
    script
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: &str = "2266ca31f6f2666ebe75906201e72f9398694030ff1c8214aacebcf74dc94ee3";
    const KEY_B: &str = "a55f79607c32a7e24a388464ddc3cfbc91b2dcee6691061bca3fb32d231ccb32";
    const KEY_C: &str = "1e65f8baa259f487dcdc1d3dce1e198dd23c9f7b77236e4e56fcc9f6b915a449";

    fn fixture() -> DepotKeys {
        vec![
            (3596190, KEY_C.to_string()),
            (3489701, KEY_A.to_string()),
            (3596180, KEY_B.to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn builds_expected_script() {
        let script = build_script(AppId(348970), &fixture(), ["3489701_123.manifest", "9999999_1.manifest"]);
        let expected = format!(
            "addappid(348970)\n\
             addappid(3489701,0,\"{KEY_A}\")\n\
             setManifestid(3489701,\"123\")\n\
             addappid(3596180,0,\"{KEY_B}\")\n\
             addappid(3596190,0,\"{KEY_C}\")\n"
        );
        assert_eq!(script, expected);
    }

    #[test]
    fn every_matching_manifest_gets_its_own_line() {
        let keys: DepotKeys = vec![(10, "k".to_string())].into_iter().collect();
        let script = build_script(AppId(1), &keys, ["10_1.manifest", "10_2.manifest", "10_1.manifest"]);
        assert_eq!(
            script,
            "addappid(1)\naddappid(10,0,\"k\")\nsetManifestid(10,\"1\")\nsetManifestid(10,\"2\")\nsetManifestid(10,\"1\")\n"
        );
    }

    #[test]
    fn depot_prefix_must_end_at_the_underscore() {
        let keys: DepotKeys = vec![(10, "k".to_string())].into_iter().collect();
        let script = build_script(AppId(1), &keys, ["100_5.manifest", "10_5.txt"]);
        assert_eq!(script, "addappid(1)\naddappid(10,0,\"k\")\n");
    }

    #[test]
    fn zero_padded_depot_matches_its_manifest() {
        let mut keys = DepotKeys::new();
        keys.insert("0123".parse().unwrap(), "k");
        let script = build_script(AppId(1), &keys, ["0123_9.manifest", "123_8.manifest"]);
        assert_eq!(script, "addappid(1)\naddappid(0123,0,\"k\")\nsetManifestid(0123,\"9\")\n");
    }

    #[test]
    fn no_depots_yields_only_the_app_line() {
        let script = build_script(AppId(7), &DepotKeys::new(), ["1_1.manifest"]);
        assert_eq!(script, "addappid(7)\n");
    }

    #[test]
    fn keys_are_quoted_safely() {
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }
}
