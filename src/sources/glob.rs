use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::core::WindsmithError;

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Whether a pattern contains glob syntax.
pub(super) fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(GLOB_META)
}

/// Resolves `.` and `..` lexically, without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Turns a pattern declared relative to `base` into an absolute glob.
///
/// A pattern without glob syntax and without an extension names a directory
/// and matches everything below it.
pub(super) fn absolute_glob(base: &Path, pattern: &str) -> String {
    let joined = normalize(&base.join(pattern));
    let text = joined.to_string_lossy().replace('\\', "/");

    if has_glob_meta(pattern) || Path::new(pattern).extension().is_some() {
        text
    } else {
        format!("{}/**/*", text.trim_end_matches('/'))
    }
}

/// The longest directory prefix of an absolute glob without glob syntax.
pub(super) fn static_root(glob: &str) -> PathBuf {
    let mut root = PathBuf::new();
    let mut literal = true;

    for component in Path::new(glob).components() {
        if has_glob_meta(&component.as_os_str().to_string_lossy()) {
            literal = false;
            break;
        }
        root.push(component);
    }

    if literal {
        root.pop();
    }
    root
}

pub(super) fn build_globset<'a>(
    globs: impl IntoIterator<Item = &'a str>,
) -> Result<GlobSet, WindsmithError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in globs {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|err| WindsmithError::InvalidGlob {
                pattern: pattern.to_string(),
                details: err.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| WindsmithError::InvalidGlob {
        pattern: "<set>".to_string(),
        details: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn globs_are_made_absolute() {
        let base = Path::new("/app/src");
        assert_eq!(absolute_glob(base, "../shared/**/*.html"), "/app/shared/**/*.html");
        assert_eq!(absolute_glob(base, "./legacy"), "/app/src/legacy/**/*");
        assert_eq!(absolute_glob(base, "pages/index.html"), "/app/src/pages/index.html");
    }

    #[test]
    fn static_roots_stop_at_glob_syntax() {
        assert_eq!(static_root("/app/shared/**/*.html"), PathBuf::from("/app/shared"));
        assert_eq!(static_root("/app/src/pages/index.html"), PathBuf::from("/app/src/pages"));
    }

    #[test]
    fn wildcards_do_not_cross_directories() {
        let set = build_globset(["/app/*.html"]).unwrap();
        assert!(set.is_match("/app/index.html"));
        assert!(!set.is_match("/app/nested/index.html"));
    }

    #[test]
    fn invalid_globs_are_reported() {
        let err = build_globset(["/app/[unclosed"]).unwrap_err();
        assert!(matches!(err, WindsmithError::InvalidGlob { .. }));
    }
}
