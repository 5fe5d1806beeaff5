#![allow(clippy::unwrap_used)]

use std::{fs, path::Path};

use tempfile::TempDir;

use crate::{
    config::{ConfigLayer, LayerStack},
    input::RootStylesheet,
    sources::{SourceOrigin, SourceRegistry},
};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "index.html", "<div class=\"flex\"></div>");
    write(root, "src/app.ts", "const a = 'p-4'");
    write(root, "src/app.css", "@import \"windsmith\";");
    write(root, "node_modules/ui/button.js", "'btn'");
    write(root, "dist/bundle.js", "'built'");
    write(root, "package-lock.json", "{}");
    write(root, "public/logo.png", "png");
    write(root, ".gitignore", "dist/\n");
    dir
}

fn relative(root: &Path, files: Vec<std::path::PathBuf>) -> Vec<String> {
    files
        .iter()
        .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect()
}

#[test]
fn default_scan_skips_ignored_and_noise() {
    let dir = project();
    let registry = SourceRegistry::for_project(dir.path());

    let files = registry.matcher().unwrap().scan();

    assert_eq!(relative(dir.path(), files), vec!["index.html", "src/app.ts"]);
}

#[test]
fn declared_sources_reach_into_ignored_folders() {
    let dir = project();
    let mut registry = SourceRegistry::for_project(dir.path());
    registry.add_source("node_modules/ui/**/*.js", dir.path());

    let matcher = registry.matcher().unwrap();

    assert!(matcher.is_source(&dir.path().join("node_modules/ui/button.js")));
    assert!(relative(dir.path(), matcher.scan()).contains(&"node_modules/ui/button.js".to_string()));
}

#[test]
fn exclusions_always_win() {
    let dir = project();
    let mut registry = SourceRegistry::for_project(dir.path());
    registry.add_source("node_modules/ui", dir.path());
    registry.exclude_source("node_modules/ui/button.js", dir.path());
    registry.exclude_source("src", dir.path());

    let matcher = registry.matcher().unwrap();

    assert!(!matcher.is_source(&dir.path().join("node_modules/ui/button.js")));
    assert!(!matcher.is_source(&dir.path().join("src/app.ts")));
    assert!(matcher.is_source(&dir.path().join("index.html")));
}

#[test]
fn gitignored_paths_do_not_match_default_sources() {
    let dir = project();
    let matcher = SourceRegistry::for_project(dir.path()).matcher().unwrap();

    assert!(!matcher.is_source(&dir.path().join("dist/bundle.js")));
    assert!(matcher.is_source(&dir.path().join("src/new-file.tsx")));
}

#[test]
fn registry_collects_stylesheet_and_layer_globs() {
    let stylesheet = RootStylesheet::parse(
        "/app/src/app.css",
        "@import \"windsmith\";\n@source \"../shared\";\n@source not \"./legacy\";\n",
    );
    let layers: LayerStack = [ConfigLayer::from_toml_str(
        "content = [\"./templates/**/*.html\", \"!./templates/old/**\"]",
        "/app",
    )
    .unwrap()]
    .into_iter()
    .collect();

    let mut registry = SourceRegistry::for_project("/app");
    registry.extend_from_stylesheet(&stylesheet);
    registry.extend_from_layers(&layers);
    registry.add_source("../shared", "/app/src");

    let globs: Vec<String> = registry.sources().iter().map(|entry| entry.glob()).collect();
    assert_eq!(
        globs,
        vec!["/app/**/*", "/app/shared/**/*", "/app/templates/**/*.html"]
    );

    let excluded: Vec<String> = registry.exclusions().map(|entry| entry.glob()).collect();
    assert_eq!(excluded, vec!["/app/src/legacy/**/*", "/app/templates/old/**"]);
    assert!(
        registry
            .entries()
            .iter()
            .filter(|entry| entry.origin == SourceOrigin::Declared)
            .count()
            == 2
    );
}

#[test]
fn roots_collapse_nested_directories() {
    let mut registry = SourceRegistry::for_project("/app");
    registry.add_source("src/**/*.html", "/app");
    registry.add_source("../shared/*.js", "/app");

    assert_eq!(
        registry.roots(),
        vec![std::path::PathBuf::from("/app"), std::path::PathBuf::from("/shared")]
    );
}

#[test]
fn exact_exclusions_remove_sources() {
    let mut registry = SourceRegistry::for_project("/app");
    registry.add_source("vendor", "/app");
    registry.exclude_source("./vendor", "/app");

    let globs: Vec<String> = registry.sources().iter().map(|entry| entry.glob()).collect();
    assert_eq!(globs, vec!["/app/**/*"]);
}

#[test]
fn declared_scan_ignores_default_sources() {
    let dir = project();
    let mut registry = SourceRegistry::for_project(dir.path());
    registry.add_source("src/**/*.ts", dir.path());

    let matcher = registry.matcher().unwrap();

    assert_eq!(relative(dir.path(), matcher.scan_declared()), vec!["src/app.ts"]);
    assert!(matcher.is_declared_source(&dir.path().join("src/app.ts")));
    assert!(!matcher.is_declared_source(&dir.path().join("index.html")));
    assert!(matcher.is_source(&dir.path().join("index.html")));
}
