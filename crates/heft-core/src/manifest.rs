//! Dependency manifest extraction from stored artifacts.
//!
//! Stored artifacts are plain zip archives (a different container than the
//! registry's gzip-tar tarballs). The package's own `package.json` declares
//! its direct dependencies; anything under a vendored `node_modules/` tree is
//! already part of the archive's measured size and must not be counted again.

use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Directory holding vendored dependency trees.
const VENDORED_DIR: &str = "node_modules";

/// The dependency manifest file name.
const MANIFEST_NAME: &str = "package.json";

/// Dependency manifest extracted from a stored artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Direct dependencies as name -> version range, sorted by name.
    pub dependencies: BTreeMap<String, String>,
}

/// Extract the package root's dependency manifest from stored artifact bytes.
///
/// Returns `None` — a normal outcome, not an error — when the bytes are not a
/// valid zip archive, no manifest entry exists outside vendored trees, or the
/// manifest is not valid JSON. When several candidates exist, the shallowest
/// path wins.
#[must_use]
pub fn extract_manifest(zip_bytes: &[u8]) -> Option<Manifest> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes)).ok()?;

    let manifest_path = archive
        .file_names()
        .filter(|path| is_manifest_path(path))
        .min_by_key(|path| path.split('/').count())
        .map(str::to_string)?;

    let mut content = String::new();
    archive
        .by_name(&manifest_path)
        .ok()?
        .read_to_string(&mut content)
        .ok()?;

    parse_manifest(&content)
}

fn is_manifest_path(path: &str) -> bool {
    let mut segments = path.split('/');
    let Some(last) = segments.next_back() else {
        return false;
    };
    last == MANIFEST_NAME && !path.split('/').any(|seg| seg == VENDORED_DIR)
}

fn parse_manifest(content: &str) -> Option<Manifest> {
    let json: Value = serde_json::from_str(content).ok()?;

    let mut dependencies = BTreeMap::new();
    if let Some(deps) = json.get("dependencies").and_then(Value::as_object) {
        for (name, range) in deps {
            // Non-string ranges are skipped rather than failing the manifest.
            if let Some(range) = range.as_str() {
                dependencies.insert(name.clone(), range.to_string());
            }
        }
    }

    Some(Manifest { dependencies })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn zip_with_files(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, content) in files {
            writer
                .start_file(*path, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extracts_root_manifest() {
        let bytes = zip_with_files(&[
            (
                "package/package.json",
                r#"{"name":"app","version":"1.0.0","dependencies":{"lib":"^1.2.0","util":"2.0.0"}}"#,
            ),
            ("package/index.js", "module.exports = 42;"),
        ]);

        let manifest = extract_manifest(&bytes).unwrap();
        assert_eq!(manifest.dependencies.len(), 2);
        assert_eq!(manifest.dependencies["lib"], "^1.2.0");
        assert_eq!(manifest.dependencies["util"], "2.0.0");
    }

    #[test]
    fn test_excludes_vendored_manifests() {
        let bytes = zip_with_files(&[(
            "package/node_modules/lib/package.json",
            r#"{"name":"lib","dependencies":{"nested":"1.0.0"}}"#,
        )]);

        assert_eq!(extract_manifest(&bytes), None);
    }

    #[test]
    fn test_prefers_shallowest_manifest() {
        let bytes = zip_with_files(&[
            (
                "package/vendor/inner/package.json",
                r#"{"dependencies":{"wrong":"1.0.0"}}"#,
            ),
            (
                "package/package.json",
                r#"{"dependencies":{"right":"1.0.0"}}"#,
            ),
        ]);

        let manifest = extract_manifest(&bytes).unwrap();
        assert_eq!(manifest.dependencies.len(), 1);
        assert!(manifest.dependencies.contains_key("right"));
    }

    #[test]
    fn test_no_dependencies_section_is_empty_manifest() {
        let bytes = zip_with_files(&[("package/package.json", r#"{"name":"leaf"}"#)]);

        let manifest = extract_manifest(&bytes).unwrap();
        assert!(manifest.dependencies.is_empty());
    }

    #[test]
    fn test_non_string_ranges_are_skipped() {
        let bytes = zip_with_files(&[(
            "package/package.json",
            r#"{"dependencies":{"good":"^1.0.0","bad":123,"worse":null}}"#,
        )]);

        let manifest = extract_manifest(&bytes).unwrap();
        assert_eq!(manifest.dependencies.len(), 1);
        assert!(manifest.dependencies.contains_key("good"));
    }

    #[test]
    fn test_invalid_zip_is_absent() {
        assert_eq!(extract_manifest(b"not a zip archive"), None);
        assert_eq!(extract_manifest(&[]), None);
    }

    #[test]
    fn test_invalid_json_is_absent() {
        let bytes = zip_with_files(&[("package/package.json", "not json {{{")]);
        assert_eq!(extract_manifest(&bytes), None);
    }

    #[test]
    fn test_no_manifest_entry_is_absent() {
        let bytes = zip_with_files(&[("package/readme.md", "hello")]);
        assert_eq!(extract_manifest(&bytes), None);
    }
}
