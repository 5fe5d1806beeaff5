#![allow(clippy::unwrap_used)]

use std::{fs, path::Path};

use tempfile::TempDir;

use crate::{
    candidates::CandidateSet,
    core::WindsmithError,
    generator::ThemeManifestGenerator,
    input::RootStylesheet,
    session::{
        BuildArtifact, Diagnostic, Severity, SessionOptions,
        inputs::{SessionInputs, render},
    },
    theme::ResolvedTheme,
};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn candidates(items: &[&str]) -> CandidateSet {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn root_stylesheet_is_generated_before_its_body() {
    let stylesheet = RootStylesheet::parse(
        "/project/app.css",
        "@import \"windsmith\";\n.card { color: red; }\n",
    );

    let artifact = render(
        &stylesheet,
        &ResolvedTheme::default(),
        &candidates(&["flex"]).snapshot(),
        &ThemeManifestGenerator,
        3,
    )
    .unwrap();

    let flex = artifact.css().find(".flex").unwrap();
    let card = artifact.css().find(".card").unwrap();
    assert!(flex < card);
    assert!(!artifact.is_passthrough());
    assert_eq!(artifact.theme_revision(), 3);
    assert!(!artifact.css().contains("@import"));
}

#[test]
fn kept_imports_lead_the_output() {
    let stylesheet = RootStylesheet::parse(
        "/project/app.css",
        "@import \"windsmith\";\n@import url(\"https://fonts.example/x.css\");\n.card { color: red; }\n",
    );

    let artifact = render(
        &stylesheet,
        &ResolvedTheme::default(),
        &candidates(&["flex"]).snapshot(),
        &ThemeManifestGenerator,
        0,
    )
    .unwrap();

    assert!(artifact.css().starts_with("@import url(\"https://fonts.example/x.css\");\n"));
    assert_eq!(artifact.css().matches("@import").count(), 1);
    assert!(artifact.css().find(".flex").unwrap() < artifact.css().find(".card").unwrap());
}

#[test]
fn non_root_stylesheet_passes_through() {
    let css = ".card { color: red; }\n";
    let stylesheet = RootStylesheet::parse("/project/app.css", css);

    let artifact = render(
        &stylesheet,
        &ResolvedTheme::default(),
        &candidates(&["flex"]).snapshot(),
        &ThemeManifestGenerator,
        0,
    )
    .unwrap();

    assert!(artifact.is_passthrough());
    assert_eq!(artifact.css(), css);
}

#[test]
fn artifact_is_current_only_for_matching_revisions() {
    let artifact = BuildArtifact::generated(String::new(), 2, 5);

    assert!(artifact.is_current(2, 5));
    assert!(!artifact.is_current(3, 5));
    assert!(!artifact.is_current(2, 6));
}

#[test]
fn diagnostics_keep_the_failing_path() {
    let err = WindsmithError::extraction("/project/a.bin", "stream did not contain valid UTF-8");
    let diagnostic = Diagnostic::warning(&err);

    assert_eq!(diagnostic.severity, Severity::Warning);
    assert_eq!(diagnostic.path.as_deref(), Some(Path::new("/project/a.bin")));
    assert!(diagnostic.to_string().starts_with("warning: "));
}

#[test]
fn inputs_track_config_files_and_exclude_output() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "src/app.css",
        "@import \"windsmith\";\n@config \"../windsmith.toml\";\n",
    );
    write(root, "windsmith.toml", "[theme.colors]\nbrand = \"#0af\"\n");
    write(root, "index.html", "<div class=\"flex\"></div>");
    write(root, "dist/out.css", ".old {}");

    let options = SessionOptions::new(root.join("src/app.css"))
        .with_output(root.join("dist/out.css"))
        .with_root(root)
        .resolve()
        .unwrap();
    let inputs = SessionInputs::load(&options).unwrap();

    assert!(inputs.is_theme_file(&options.input));
    assert!(inputs.is_theme_file(&options.root.join("windsmith.toml")));
    assert!(!inputs.matcher.is_source(&options.root.join("dist/out.css")));
    assert!(inputs.matcher.is_source(&options.root.join("index.html")));

    let theme = inputs.resolve_theme().unwrap();
    assert_eq!(theme.get("colors.brand").unwrap().as_str(), Some("#0af"));
}

#[test]
fn imported_stylesheets_are_theme_files() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "src/app.css",
        "@import \"windsmith\";\n@import \"./custom-theme.css\";\n",
    );
    write(root, "src/custom-theme.css", "@theme { --color-primary: black; }\n");

    let options = SessionOptions::new(root.join("src/app.css"))
        .with_root(root)
        .resolve()
        .unwrap();
    let inputs = SessionInputs::load(&options).unwrap();

    assert!(inputs.is_theme_file(&options.root.join("src/custom-theme.css")));
    let theme = inputs.resolve_theme().unwrap();
    assert_eq!(theme.get("colors.primary").unwrap().as_str(), Some("black"));
}

#[test]
fn missing_input_fails_to_resolve() {
    let dir = TempDir::new().unwrap();
    let result = SessionOptions::new(dir.path().join("missing.css"))
        .with_root(dir.path())
        .resolve();

    assert!(matches!(result, Err(WindsmithError::Io(_))));
}
