//! CLI command implementations

use crate::config::Config;
use std::path::PathBuf;
use strata_history::{
    analyze as analyze_history, clear_output, outline, reconstruct, DagWalker, DifferentialStore, GitSource,
    WalkOptions, WalkStats,
};

pub async fn mine(repo: PathBuf, branch: String, config: Config) -> anyhow::Result<()> {
    tracing::info!("Mining {} from {}", repo.display(), branch);
    tracing::info!("Output directory: {}", config.output_dir.display());

    // git2 handles are not Sync; the whole walk stays on one blocking thread
    let stats = tokio::task::spawn_blocking(move || -> anyhow::Result<WalkStats> {
        let source = GitSource::open(&repo)?;
        let mut store = DifferentialStore::create(config.output_dir.clone())?;
        let options = WalkOptions {
            extensions: config.extensions,
            progress: config.progress,
        };
        let stats = DagWalker::new(&source, &mut store, options).walk(&branch)?;
        let manifest = store.save_manifest()?;
        tracing::info!("Manifest written to {}", manifest.display());
        Ok(stats)
    })
    .await??;

    println!("{stats}");
    Ok(())
}

pub fn replay(version: &str, config: &Config) -> anyhow::Result<()> {
    let store = DifferentialStore::open(config.output_dir.clone())?;
    let id = store.resolve(version)?;
    let graph = reconstruct(&store, id)?;
    tracing::info!(
        "Rebuilt {}: {} identities, {} relations",
        id,
        graph.identity_count(),
        graph.triple_count()
    );

    let report = serde_json::json!({
        "version": id,
        "modules": outline(&graph),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn analyze(config: &Config) -> anyhow::Result<()> {
    let store = DifferentialStore::open(config.output_dir.clone())?;
    let analysis = analyze_history(&store)?;
    tracing::info!(
        "{} non-empty edges, {} methods changed",
        analysis.edges.len(),
        analysis.churn.len()
    );
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

pub fn clear(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Clearing output: {}", config.output_dir.display());

    clear_output(&config.output_dir)?;

    tracing::info!("Output cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Repository, Signature};
    use std::path::Path;

    fn single_commit_repo(root: &Path) {
        let repo = Repository::init(root).unwrap();
        std::fs::write(root.join("app.js"), "class App {\n  run() { return 1; }\n}\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("app.js")).unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Strata", "strata@example.com").unwrap();
        repo.commit(Some("refs/heads/main"), &sig, &sig, "init", &tree, &[]).unwrap();
    }

    #[tokio::test]
    async fn test_mine_writes_manifest_and_clear_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        single_commit_repo(&repo);
        let config = Config {
            output_dir: dir.path().join("out"),
            progress: false,
            ..Config::default()
        };

        mine(repo, "main".to_string(), config.clone()).await.unwrap();
        assert!(config.output_dir.join("versionDAG.json").exists());

        let store = DifferentialStore::open(config.output_dir.clone()).unwrap();
        assert_eq!(store.manifest().versions.len(), 1);
        analyze(&config).unwrap();

        clear(&config).unwrap();
        assert!(!config.output_dir.exists());
    }

    #[tokio::test]
    async fn test_mine_missing_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_dir: dir.path().join("out"),
            progress: false,
            ..Config::default()
        };

        assert!(mine(dir.path().join("nope"), "main".to_string(), config).await.is_err());
    }

    #[test]
    fn test_replay_without_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_dir: dir.path().join("out"),
            ..Config::default()
        };

        assert!(replay("abc", &config).is_err());
    }
}
