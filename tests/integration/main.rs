//! Integration tests for Strata
//!
//! These tests build real git repositories and drive the walker, the store
//! and the CLI binary against them.

use std::fs;
use std::path::Path;
use std::process::Command;

use git2::{Oid, Repository, Signature};
use strata_history::{
    outline, reconstruct, DagWalker, DifferentialStore, EdgeRecord, GitSource, WalkOptions,
};
use tempfile::TempDir;

const AREA: &str = "class Shape {\n  area() { return 0; }\n}\n";
const AREA_PERIMETER: &str = "class Shape {\n  area() { return 0; }\n  perimeter() { return 4; }\n}\n";
const AREA_CHANGED: &str = "class Shape {\n  area() { return this.w * this.h; }\n}\n";
const MERGED: &str =
    "class Shape {\n  area() { return this.w * this.h; }\n  perimeter() { return 4; }\n}\n";

/// Commit exactly `files` as the full tree, with the given parents.
fn commit(repo: &Repository, files: &[(&str, &str)], parents: &[Oid], message: &str) -> Oid {
    let root = repo.workdir().unwrap();
    let mut index = repo.index().unwrap();
    index.clear().unwrap();
    for (path, content) in files {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(&full, content).unwrap();
        index.add_path(Path::new(path)).unwrap();
    }
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let parents: Vec<_> = parents.iter().map(|id| repo.find_commit(*id).unwrap()).collect();
    let parent_refs: Vec<_> = parents.iter().collect();
    let sig = Signature::now("Strata", "strata@example.com").unwrap();
    repo.commit(None, &sig, &sig, message, &tree, &parent_refs).unwrap()
}

struct Fixture {
    dir: TempDir,
    base: Oid,
    left: Oid,
    right: Oid,
    merge: Oid,
}

/// A diamond history: two branches off `base` joined by `merge`.
fn diamond_repo() -> Fixture {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path().join("repo")).unwrap();

    let base = commit(&repo, &[("src/shape.js", AREA), ("README.md", "shapes\n")], &[], "base");
    let left = commit(
        &repo,
        &[("src/shape.js", AREA_PERIMETER), ("README.md", "shapes\n")],
        &[base],
        "add perimeter",
    );
    let right = commit(
        &repo,
        &[("src/shape.js", AREA_CHANGED), ("README.md", "shapes\n")],
        &[base],
        "real area",
    );
    let merge = commit(
        &repo,
        &[("src/shape.js", MERGED), ("README.md", "shapes\n")],
        &[left, right],
        "merge",
    );
    repo.reference("refs/heads/main", merge, true, "test fixture").unwrap();

    Fixture {
        dir,
        base,
        left,
        right,
        merge,
    }
}

fn methods_of(store: &DifferentialStore, version: &str) -> Vec<String> {
    let graph = reconstruct(store, version).unwrap();
    let modules = outline(&graph);
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].path, "src/shape.js");
    assert_eq!(modules[0].classes.len(), 1);
    assert_eq!(modules[0].classes[0].name, "Shape");
    modules[0].classes[0].methods.iter().map(|m| m.name.clone()).collect()
}

#[test]
fn test_walk_git_history_with_merge() {
    let fixture = diamond_repo();
    let source = GitSource::open(&fixture.dir.path().join("repo")).unwrap();
    let output = fixture.dir.path().join("out");

    let mut store = DifferentialStore::create(output.clone()).unwrap();
    let options = WalkOptions {
        progress: false,
        ..WalkOptions::default()
    };
    let stats = DagWalker::new(&source, &mut store, options).walk("main").unwrap();
    store.save_manifest().unwrap();

    assert_eq!(stats.vertices, 4);
    assert_eq!(stats.orphans, 1);
    assert_eq!(stats.edges, 4);
    assert_eq!(stats.forward, 4);
    assert_eq!(stats.forks, 1);
    assert_eq!(stats.skipped_files, 0);

    // Reopen from disk so replay only sees what was persisted
    let store = DifferentialStore::open(output.clone()).unwrap();
    let merge = fixture.merge.to_string();
    let entry = store.entry(&merge).unwrap();
    assert_eq!(entry.parents, vec![fixture.left.to_string(), fixture.right.to_string()]);
    for parent in [fixture.left, fixture.right] {
        let file = format!("{parent}-{merge}.json");
        assert_eq!(
            entry.edges.get(&parent.to_string()),
            Some(&EdgeRecord::Artifact { file: file.clone() })
        );
        assert!(output.join("differentials").join(&file).exists());
    }

    assert_eq!(methods_of(&store, &fixture.base.to_string()), vec!["Shape::area"]);
    assert_eq!(methods_of(&store, &fixture.left.to_string()), vec!["Shape::area", "Shape::perimeter"]);
    assert_eq!(methods_of(&store, &fixture.right.to_string()), vec!["Shape::area"]);
    assert_eq!(methods_of(&store, &merge[..12]), vec!["Shape::area", "Shape::perimeter"]);

    // Same method name, different body on the two sides of the fork
    let body = |version: Oid| {
        let graph = reconstruct(&store, &version.to_string()).unwrap();
        outline(&graph)[0].classes[0].methods[0].body
    };
    assert_eq!(body(fixture.base), body(fixture.left));
    assert_ne!(body(fixture.base), body(fixture.right));
    assert_eq!(body(fixture.right), body(fixture.merge));
}

#[test]
fn test_unknown_branch_is_an_error() {
    let fixture = diamond_repo();
    let source = GitSource::open(&fixture.dir.path().join("repo")).unwrap();
    let mut store = DifferentialStore::create(fixture.dir.path().join("out")).unwrap();
    let options = WalkOptions {
        progress: false,
        ..WalkOptions::default()
    };

    assert!(DagWalker::new(&source, &mut store, options).walk("no-such-branch").is_err());
}

/// Mining without a repository and branch prints usage and fails
#[test]
fn test_cli_mine_requires_arguments() {
    let output = Command::new(env!("CARGO_BIN_EXE_strata"))
        .arg("mine")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"));
}

#[test]
fn test_cli_mine_then_replay() {
    let fixture = diamond_repo();
    let workdir = fixture.dir.path();
    let strata = |args: &[&str]| {
        Command::new(env!("CARGO_BIN_EXE_strata"))
            .args(args)
            .current_dir(workdir)
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute command")
    };

    let mined = strata(&["mine", "repo", "main", "--output", "out"]);
    assert!(mined.status.success(), "{}", String::from_utf8_lossy(&mined.stderr));
    assert!(String::from_utf8_lossy(&mined.stdout).contains("edges=4"));
    assert!(workdir.join("out").join("versionDAG.json").exists());

    let replayed = strata(&["replay", &fixture.left.to_string()[..10], "--output", "out"]);
    assert!(replayed.status.success(), "{}", String::from_utf8_lossy(&replayed.stderr));
    let report: serde_json::Value = serde_json::from_slice(&replayed.stdout).unwrap();
    assert_eq!(report["version"], fixture.left.to_string());
    let methods = &report["modules"][0]["classes"][0]["methods"];
    assert_eq!(methods[0]["name"], "Shape::area");
    assert_eq!(methods[1]["name"], "Shape::perimeter");

    let analyzed = strata(&["analyze", "--output", "out"]);
    assert!(analyzed.status.success());
    let analysis: serde_json::Value = serde_json::from_slice(&analyzed.stdout).unwrap();
    assert!(analysis["edges"].as_array().is_some_and(|edges| !edges.is_empty()));

    let cleared = strata(&["clear", "--output", "out"]);
    assert!(cleared.status.success());
    assert!(!workdir.join("out").exists());
}
