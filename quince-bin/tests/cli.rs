use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::tempdir;

use quince_lib::Cache;

fn main_command() -> Command {
    Command::cargo_bin("quince").expect("couldn't find quince binary")
}

/// Build a small cache with two entries and persist it
fn seeded_cache(root: &Path) -> Cache {
    let mut cache = Cache::open(root).unwrap();
    cache
        .set("home", "http://x/y.htm", "htm", "text/html", b"<html>hi</html>")
        .unwrap();
    cache
        .set("logo", "http://x/logo.png", "png", "image/png", &[137, 80, 78, 71])
        .unwrap();
    cache.save().unwrap();
    cache
}

#[test]
fn test_list_empty_cache() {
    let dir = tempdir().unwrap();

    main_command()
        .arg("--dir")
        .arg(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_list_names_sorted() {
    let dir = tempdir().unwrap();
    seeded_cache(dir.path());

    main_command()
        .arg("--dir")
        .arg(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout("home\nlogo\n");
}

#[test]
fn test_cat_text_entry() {
    let dir = tempdir().unwrap();
    seeded_cache(dir.path());

    main_command()
        .arg("--dir")
        .arg(dir.path())
        .arg("cat")
        .arg("home")
        .assert()
        .success()
        .stdout("<html>hi</html>\n");
}

#[test]
fn test_cat_binary_entry_is_raw() {
    let dir = tempdir().unwrap();
    seeded_cache(dir.path());

    let output = main_command()
        .arg("--dir")
        .arg(dir.path())
        .arg("cat")
        .arg("logo")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(output, vec![137, 80, 78, 71]);
}

#[test]
fn test_cat_unknown_name_fails() {
    let dir = tempdir().unwrap();
    seeded_cache(dir.path());

    main_command()
        .arg("--dir")
        .arg(dir.path())
        .arg("cat")
        .arg("nope")
        .assert()
        .failure()
        .stderr(contains("no cache entry for `nope`"));
}

#[test]
fn test_path_points_at_existing_file() {
    let dir = tempdir().unwrap();
    let cache = seeded_cache(dir.path());
    let expected = cache.path("home").unwrap();

    let output = main_command()
        .arg("--dir")
        .arg(dir.path())
        .arg("path")
        .arg("home")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let printed = String::from_utf8(output).unwrap();
    assert_eq!(printed.trim_end(), expected.to_str().unwrap());
    assert!(expected.is_file());
}

#[test]
fn test_cache_survives_inspection() {
    let dir = tempdir().unwrap();
    seeded_cache(dir.path());

    main_command()
        .arg("--dir")
        .arg(dir.path())
        .arg("cat")
        .arg("home")
        .assert()
        .success();

    // Inspection must not mutate the cache
    let cache = Cache::open(dir.path()).unwrap();
    let mut names = cache.list();
    names.sort();
    assert_eq!(names, vec!["home".to_string(), "logo".to_string()]);
}
