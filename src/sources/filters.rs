use std::path::Path;

/// Directories never scanned by default.
const IGNORED_DIRS: &[&str] = &[".git", ".hg", ".svn", "node_modules", ".next", ".turbo"];

/// Files never scanned by default.
const IGNORED_FILES: &[&str] = &[".gitignore", ".DS_Store"];

/// Whether a file found through a default source should be skipped.
///
/// Default sources cover the whole project, so dependency folders, VCS
/// metadata, lockfiles, stylesheets and binary assets are left out.
pub(super) fn skip_default(path: &Path) -> bool {
    if path
        .components()
        .any(|component| IGNORED_DIRS.iter().any(|dir| component.as_os_str() == *dir))
    {
        return true;
    }

    let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");
    if IGNORED_FILES.contains(&file_name) || is_common_lock_file(file_name) {
        return true;
    }

    match extension(path).as_deref() {
        Some(ext) => is_css_extension(ext) || is_binary_extension(ext),
        None => false,
    }
}

/// Whether a file matched by an explicitly declared source should be skipped.
///
/// Declared sources opt into everything except binary files.
pub(super) fn skip_declared(path: &Path) -> bool {
    extension(path).as_deref().is_some_and(is_binary_extension)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
}

fn is_css_extension(ext: &str) -> bool {
    matches!(ext, "css" | "scss" | "sass" | "less" | "styl" | "pcss")
}

fn is_binary_extension(ext: &str) -> bool {
    matches!(
        ext,
        "png"
            | "jpg"
            | "jpeg"
            | "gif"
            | "webp"
            | "ico"
            | "bmp"
            | "tiff"
            | "avif"
            | "mp4"
            | "mov"
            | "avi"
            | "mkv"
            | "webm"
            | "mp3"
            | "wav"
            | "ogg"
            | "flac"
            | "zip"
            | "gz"
            | "tgz"
            | "rar"
            | "7z"
            | "pdf"
            | "woff"
            | "woff2"
            | "ttf"
            | "otf"
            | "eot"
            | "wasm"
            | "exe"
            | "so"
            | "dylib"
    )
}

fn is_common_lock_file(file_name: &str) -> bool {
    matches!(
        file_name,
        "package-lock.json"
            | "pnpm-lock.yaml"
            | "yarn.lock"
            | "bun.lockb"
            | "bun.lock"
            | "npm-shrinkwrap.json"
            | "Cargo.lock"
            | "composer.lock"
            | "Gemfile.lock"
            | "poetry.lock"
            | "Pipfile.lock"
    )
}
