//! File lookup and loading.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use envfile_rs::{
    EnvMap, Encoding, Error, LoadOptions, default_search_dirs, find_env_file, load_from,
};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dirs");
    }
    fs::write(&path, contents).expect("write env file");
    path
}

/// Temp tree `root/a/b` with `root/.env` written.
fn nested_tree() -> (TempDir, PathBuf) {
    let root = tempfile::tempdir().expect("tempdir");
    let deep = root.path().join("a").join("b");
    fs::create_dir_all(&deep).expect("create dirs");
    write(root.path(), ".env", b"FROM=root\n");
    (root, deep)
}

fn capture() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync + 'static) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    (lines, move |line: &str| {
        sink.lock().expect("lock").push(line.to_string());
    })
}

// -----------------------------------------------------------
// Lookup.
// -----------------------------------------------------------

#[test]
fn load_absolute_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(dir.path(), "custom.env", b"A=1\nB='two'\n");
    let env = load_from(&LoadOptions::new().path(&path), &[]).expect("load");
    assert_eq!(env.get("A"), Some("1"));
    assert_eq!(env.get("B"), Some("two"));
}

#[test]
fn load_relative_to_base_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), ".env", b"KEY=value\n");
    let env = load_from(&LoadOptions::new(), &[dir.path().to_path_buf()]).expect("load");
    assert_eq!(env.get("KEY"), Some("value"));
}

#[test]
fn load_relative_path_with_subdirectory() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "config/app.env", b"APP=yes\n");
    let options = LoadOptions::new().path("config/app.env");
    let env = load_from(&options, &[dir.path().to_path_buf()]).expect("load");
    assert_eq!(env.get("APP"), Some("yes"));
}

#[test]
fn search_walks_up_parents_within_depth() {
    let (root, deep) = nested_tree();
    let found = find_env_file(Path::new(".env"), &[deep], 3).expect("found");
    assert_eq!(found, root.path().join(".env"));
}

#[test]
fn search_stops_at_depth() {
    let (_root, deep) = nested_tree();
    let err = find_env_file(Path::new(".env"), std::slice::from_ref(&deep), 2).unwrap_err();
    let Error::NotFound { path, searched } = err else {
        panic!("expected not found, got {err:?}");
    };
    assert_eq!(path, PathBuf::from(".env"));
    assert_eq!(searched.len(), 2);
    assert_eq!(searched[0], deep);
    assert_eq!(Some(searched[1].as_path()), deep.parent());
}

#[test]
fn search_tries_every_base_in_order() {
    let first = tempfile::tempdir().expect("tempdir");
    let second = tempfile::tempdir().expect("tempdir");
    write(second.path(), ".env", b"WHERE=second\n");
    write(first.path(), ".env", b"WHERE=first\n");

    let bases = [first.path().to_path_buf(), second.path().to_path_buf()];
    let env = load_from(&LoadOptions::new(), &bases).expect("load");
    assert_eq!(env.get("WHERE"), Some("first"));

    let bases = [second.path().to_path_buf(), first.path().to_path_buf()];
    let env = load_from(&LoadOptions::new(), &bases).expect("load");
    assert_eq!(env.get("WHERE"), Some("second"));
}

#[test]
fn search_deduplicates_base_dirs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().to_path_buf();
    let err = find_env_file(Path::new(".env"), &[base.clone(), base.clone()], 1).unwrap_err();
    let Error::NotFound { searched, .. } = err else {
        panic!("expected not found, got {err:?}");
    };
    assert_eq!(searched, vec![base]);
}

#[test]
fn not_found_message_lists_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_from(&LoadOptions::new(), &[dir.path().to_path_buf()]).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("env file '.env' not found in:"), "{message}");
    assert!(message.contains(&dir.path().display().to_string()), "{message}");
}

#[test]
fn default_search_dirs_include_working_directory() {
    let cwd = std::env::current_dir().expect("cwd");
    assert!(default_search_dirs().contains(&cwd));
}

// -----------------------------------------------------------
// Options.
// -----------------------------------------------------------

#[test]
fn ignore_missing_yields_empty_map() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = LoadOptions::new().ignore_missing(true);
    let env = load_from(&options, &[dir.path().to_path_buf()]).expect("load");
    assert_eq!(env, EnvMap::new());
}

#[test]
fn ignore_missing_does_not_hide_parse_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), ".env", b"NO_VALUE\n");
    let options = LoadOptions::new().ignore_missing(true);
    let err = load_from(&options, &[dir.path().to_path_buf()]).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn load_with_encoding() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bytes: Vec<u8> = "\u{feff}WIDE=chars\n"
        .encode_utf16()
        .flat_map(u16::to_be_bytes)
        .collect();
    let path = write(dir.path(), "wide.env", &bytes);
    let options = LoadOptions::new().path(path).encoding(Encoding::Utf16Be);
    let env = load_from(&options, &[]).expect("load");
    assert_eq!(env.get("WIDE"), Some("chars"));
}

#[test]
fn debug_logger_traces_loading() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(dir.path(), ".env", b"A=1\nB=2\n");
    let (lines, logger) = capture();
    let options = LoadOptions::new().path(&path).debug(true).debug_logger(logger);

    load_from(&options, &[]).expect("load");

    let lines = lines.lock().expect("lock");
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert!(lines[0].starts_with("Loading env file: "));
    assert_eq!(
        lines[1],
        format!("Loaded 2 variable(s) from {}", path.display())
    );
}

#[test]
fn debug_logger_reports_ignored_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (lines, logger) = capture();
    let options = LoadOptions::new()
        .ignore_missing(true)
        .debug(true)
        .debug_logger(logger);

    load_from(&options, &[dir.path().to_path_buf()]).expect("load");

    let lines = lines.lock().expect("lock");
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Ignoring missing env file: "));
}

#[test]
fn debug_logger_silent_without_debug() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(dir.path(), ".env", b"A=1\n");
    let (lines, logger) = capture();
    let options = LoadOptions::new().path(path).debug_logger(logger);

    load_from(&options, &[]).expect("load");

    assert!(lines.lock().expect("lock").is_empty());
}
