//! End-to-end tests over a small directory tree, through the library and
//! through the `pathfinder` binary.

use pathfinder::engine::SearchEngine;
use pathfinder::query::SearchConfig;
use pathfinder::utils::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const FIXTURE: &[&str] = &[
    "finance/budget_report.csv",
    "old_archive/budget_report.csv",
    "old_archive/budget_2023.xlsx",
    "readme.md",
];

fn create_fixture(root: &Path, files: &[&str]) {
    for rel in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"").unwrap();
    }
}

struct Setup {
    data: TempDir,
    files: TempDir,
}

impl Setup {
    fn new() -> Self {
        let files = TempDir::new().unwrap();
        create_fixture(files.path(), FIXTURE);
        Self {
            data: TempDir::new().unwrap(),
            files,
        }
    }

    fn root(&self) -> PathBuf {
        self.files.path().canonicalize().unwrap()
    }

    fn engine(&self, search: SearchConfig) -> SearchEngine {
        let config = AppConfig {
            roots: vec![self.root()],
            search,
            ..AppConfig::default()
        };
        let engine = SearchEngine::open(self.data.path(), config).unwrap();
        engine.index_all_roots().unwrap();
        engine
    }
}

fn rel<'a>(root: &Path, paths: &'a [String]) -> Vec<&'a str> {
    let prefix = format!("{}/", root.display());
    paths
        .iter()
        .map(|p| p.strip_prefix(&prefix).unwrap_or(p))
        .collect()
}

#[test]
fn test_shortest_completion_ranks_first() {
    let setup = Setup::new();
    let engine = setup.engine(SearchConfig::default());

    let results = engine.search("budget");
    let paths: Vec<String> = results.iter().map(|r| r.path.clone()).collect();
    let paths = rel(&setup.root(), &paths);

    assert_eq!(paths.len(), 3);
    assert_eq!(paths[0], "old_archive/budget_2023.xlsx");
    assert_eq!(results[0].score, 10);
    assert_eq!(results[1].score, 11);
    assert_eq!(results[2].score, 11);
    assert!(!paths.contains(&"readme.md"));
}

#[test]
fn test_partial_word_prefers_matching_basename() {
    let setup = Setup::new();
    let engine = setup.engine(SearchConfig::default());

    let paths = engine.query("budget_rep");
    let paths = rel(&setup.root(), &paths);
    assert!(paths[0].ends_with("budget_report.csv"));
    assert!(paths[1].ends_with("budget_report.csv"));
    assert_eq!(paths[2], "old_archive/budget_2023.xlsx");
}

#[test]
fn test_directory_segment_reranks() {
    let setup = Setup::new();
    let engine = setup.engine(SearchConfig::default());

    let paths = engine.query("budget/finance");
    let paths = rel(&setup.root(), &paths);
    assert_eq!(paths[0], "finance/budget_report.csv");

    let paths = engine.query("budget/old_archive");
    let paths = rel(&setup.root(), &paths);
    assert!(paths[0].starts_with("old_archive/"));
}

#[test]
fn test_short_queries_need_enough_trigrams() {
    let setup = Setup::new();

    // Four characters give two trigram positions, below the default of three
    let engine = setup.engine(SearchConfig::default());
    assert!(engine.query("read").is_empty());
    assert_eq!(engine.query("readme").len(), 1);
    drop(engine);

    let engine = setup.engine(SearchConfig {
        min_trigram_matches: 2,
        ..SearchConfig::default()
    });
    let paths = engine.query("read");
    assert_eq!(rel(&setup.root(), &paths), vec!["readme.md"]);
}

#[test]
fn test_result_limit() {
    let setup = Setup::new();
    let engine = setup.engine(SearchConfig {
        result_limit: 1,
        ..SearchConfig::default()
    });
    assert_eq!(engine.query("budget").len(), 1);
}

#[test]
fn test_index_survives_restart() {
    let setup = Setup::new();
    let first = setup.engine(SearchConfig::default()).query("budget");
    assert_eq!(first.len(), 3);

    let engine = SearchEngine::open(setup.data.path(), AppConfig::default()).unwrap();
    assert!(!engine.needs_index());
    assert_eq!(engine.query("budget"), first);
}

#[test]
fn test_two_roots_are_merged() {
    let setup = Setup::new();
    let other = TempDir::new().unwrap();
    create_fixture(other.path(), &["budget_forecast.ods", "photos/holiday.jpg"]);

    let engine = setup.engine(SearchConfig::default());
    engine.add_root(other.path()).unwrap();

    let paths = engine.query("budget");
    assert_eq!(paths.len(), 4);
    assert!(paths.iter().any(|p| p.ends_with("budget_forecast.ods")));
    assert_eq!(engine.query("holiday").len(), 1);
}

#[test]
fn test_removed_files_disappear_after_reindex() {
    let setup = Setup::new();
    let engine = setup.engine(SearchConfig::default());
    assert_eq!(engine.query("readme").len(), 1);

    fs::remove_file(setup.files.path().join("readme.md")).unwrap();
    engine.index_all_roots().unwrap();
    assert!(engine.query("readme").is_empty());
}

fn run_pathfinder(data_dir: &Path, args: &[&str]) -> (String, String, bool) {
    let mut cmd_args = vec![
        "--data-dir",
        data_dir.to_str().unwrap(),
        "--direct",
        "--no-color",
    ];
    cmd_args.extend(args);

    let output = Command::new(env!("CARGO_BIN_EXE_pathfinder"))
        .args(&cmd_args)
        .output()
        .expect("Failed to run pathfinder");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

#[test]
fn test_cli_add_root_and_query() {
    let setup = Setup::new();
    let root = setup.root();
    let data = setup.data.path();

    let (stdout, stderr, ok) = run_pathfinder(data, &["add-root", root.to_str().unwrap()]);
    assert!(ok, "add-root failed: {}", stderr);
    assert!(stdout.contains("Indexed 4 paths from 1 root"));

    let (stdout, _, ok) = run_pathfinder(data, &["roots"]);
    assert!(ok);
    assert_eq!(stdout.trim(), root.to_str().unwrap());

    let (stdout, _, ok) = run_pathfinder(data, &["query", "budget/finance"]);
    assert!(ok);
    let first = stdout.lines().next().unwrap();
    assert_eq!(first, root.join("finance/budget_report.csv").to_str().unwrap());

    // Bare words are queries too
    let (stdout, _, ok) = run_pathfinder(data, &["budget"]);
    assert!(ok);
    assert_eq!(stdout.lines().count(), 3);
}

#[test]
fn test_cli_scores_stats_and_clear() {
    let setup = Setup::new();
    let root = setup.root();
    let data = setup.data.path();
    run_pathfinder(data, &["add-root", root.to_str().unwrap()]);

    let (stdout, _, ok) = run_pathfinder(data, &["query", "--scores", "budget"]);
    assert!(ok);
    let first = stdout.lines().next().unwrap();
    assert!(first.trim_start().starts_with("10 "));
    assert!(first.ends_with("budget_2023.xlsx"));

    let (stdout, _, ok) = run_pathfinder(data, &["stats"]);
    assert!(ok);
    assert!(stdout.contains("Interned paths:   4"));

    let (_, _, ok) = run_pathfinder(data, &["clear"]);
    assert!(ok);
    let (stdout, _, ok) = run_pathfinder(data, &["stats"]);
    assert!(ok);
    assert!(stdout.contains("Interned paths:   0"));
    assert!(stdout.contains(root.to_str().unwrap()));
}

#[test]
fn test_cli_no_matches_goes_to_stderr() {
    let setup = Setup::new();
    let data = setup.data.path();
    let (stdout, stderr, ok) = run_pathfinder(data, &["query", "zzzzzz"]);
    assert!(ok);
    assert!(stdout.is_empty());
    assert!(stderr.contains("No matches"));
}

#[test]
fn test_cli_config_init() {
    let data = TempDir::new().unwrap();
    let (stdout, _, ok) = run_pathfinder(data.path(), &["config", "--init"]);
    assert!(ok);

    let written = fs::read_to_string(data.path().join("config.json")).unwrap();
    let written: AppConfig = serde_json::from_str(&written).unwrap();
    let printed: AppConfig = serde_json::from_str(&stdout).unwrap();
    assert_eq!(written, printed);
    assert_eq!(written.search.min_trigram_matches, 3);
}
