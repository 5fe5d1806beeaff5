use std::path::PathBuf;

use crate::coordinator::{
    Action, Change, CoordinatorState, ExtractionWork, RebuildCoordinator,
};

fn source(name: &str) -> Change {
    Change::Source(PathBuf::from(format!("/app/{name}")))
}

fn extract(paths: &[&str], reload_theme: bool) -> Action {
    Action::Extract(ExtractionWork {
        paths: paths.iter().map(|p| PathBuf::from(format!("/app/{p}"))).collect(),
        reload_theme,
    })
}

#[test]
fn idle_change_runs_one_full_cycle() {
    let mut coordinator = RebuildCoordinator::new();
    assert_eq!(coordinator.state(), CoordinatorState::Idle);

    assert_eq!(coordinator.on_change(source("a.html")), extract(&["a.html"], false));
    assert_eq!(coordinator.state(), CoordinatorState::Extracting);

    assert_eq!(coordinator.on_extracted(true), Action::Generate);
    assert_eq!(coordinator.state(), CoordinatorState::Generating);

    assert_eq!(coordinator.on_generated(), Action::Settle);
    assert!(coordinator.is_idle());
    assert_eq!(coordinator.cycles(), 1);
    assert_eq!(coordinator.generations(), 1);
}

#[test]
fn unchanged_candidates_skip_generation() {
    let mut coordinator = RebuildCoordinator::new();

    coordinator.on_change(source("a.html"));
    assert_eq!(coordinator.on_extracted(false), Action::Settle);
    assert_eq!(coordinator.generations(), 0);
}

#[test]
fn theme_changes_always_generate() {
    let mut coordinator = RebuildCoordinator::new();

    let action = coordinator.on_change(Change::Theme(PathBuf::from("/app/app.css")));
    assert_eq!(action, extract(&[], true));
    assert_eq!(coordinator.on_extracted(false), Action::Generate);
    assert_eq!(coordinator.on_generated(), Action::Settle);
}

#[test]
fn changes_during_generation_coalesce_into_one_rerun() {
    let mut coordinator = RebuildCoordinator::new();
    coordinator.on_change(source("a.html"));
    coordinator.on_extracted(true);

    for name in ["b.html", "c.html", "b.html", "d.html"] {
        assert_eq!(coordinator.on_change(source(name)), Action::Wait);
        assert_eq!(coordinator.state(), CoordinatorState::PendingRerun);
    }

    assert_eq!(
        coordinator.on_generated(),
        extract(&["b.html", "c.html", "d.html"], false)
    );
    assert_eq!(coordinator.on_extracted(true), Action::Generate);
    assert_eq!(coordinator.on_generated(), Action::Settle);

    assert_eq!(coordinator.cycles(), 2);
    assert_eq!(coordinator.generations(), 2);
}

#[test]
fn changes_during_extraction_rerun_after_the_cycle() {
    let mut coordinator = RebuildCoordinator::new();
    coordinator.on_change(source("a.html"));

    assert_eq!(
        coordinator.on_change(Change::Theme(PathBuf::from("/app/windsmith.toml"))),
        Action::Wait
    );

    assert_eq!(coordinator.on_extracted(false), extract(&[], true));
    assert_eq!(coordinator.on_extracted(false), Action::Generate);
    assert_eq!(coordinator.on_generated(), Action::Settle);
}

#[test]
fn out_of_order_reports_are_ignored() {
    let mut coordinator = RebuildCoordinator::new();

    assert_eq!(coordinator.on_generated(), Action::Wait);
    assert_eq!(coordinator.on_extracted(true), Action::Wait);
    assert!(coordinator.is_idle());

    coordinator.on_change(source("a.html"));
    assert_eq!(coordinator.on_generated(), Action::Wait);
    assert_eq!(coordinator.state(), CoordinatorState::Extracting);
}

#[test]
fn at_most_one_phase_in_flight() {
    let mut coordinator = RebuildCoordinator::new();
    let mut starts = 0;

    for i in 0..10 {
        if let Action::Extract(_) = coordinator.on_change(source(&format!("{i}.html"))) {
            starts += 1;
        }
    }

    assert_eq!(starts, 1);
    assert_eq!(coordinator.state(), CoordinatorState::PendingRerun);
}
