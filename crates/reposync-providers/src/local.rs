use anyhow::{Context, bail};
use reposync_core::git_sync;
use reposync_core::model::{RepoScope, RepoSummary, SourceKind};
use reposync_core::paths::destination_for;
use reposync_core::provider::RepoSource;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Git repositories found directly under the configured source directories.
#[derive(Debug, Default)]
pub struct LocalSource;

impl LocalSource {
    pub fn new() -> Self {
        Self
    }

    fn scan_dir(dir: &Path, seen: &mut BTreeSet<PathBuf>, out: &mut Vec<RepoSummary>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "Skipping unreadable source directory");
                return;
            }
        };
        for entry in entries.flatten() {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            if !path.is_dir() || !git_sync::is_repository(&path) {
                continue;
            }
            let path = fs::canonicalize(&path).unwrap_or(path);
            if !seen.insert(path.clone()) {
                continue;
            }
            out.push(summary_for(&path, dir));
        }
    }
}

fn summary_for(path: &Path, source_dir: &Path) -> RepoSummary {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mut summary = RepoSummary::new(path.display().to_string(), name);
    summary.description = path.display().to_string();
    summary = summary.with_meta("source_dir", source_dir.display().to_string());
    if let Some(branch) = git_sync::current_branch(path) {
        summary = summary.with_meta("branch", branch);
    }
    summary
}

impl RepoSource for LocalSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Local
    }

    fn list_repositories(&self, scope: &RepoScope) -> anyhow::Result<Vec<RepoSummary>> {
        let RepoScope::LocalPaths(dirs) = scope else {
            bail!("local source only lists directories");
        };
        let mut seen = BTreeSet::new();
        let mut repos = Vec::new();
        for dir in dirs {
            debug!(dir = %dir.display(), "Scanning source directory");
            Self::scan_dir(dir, &mut seen, &mut repos);
        }
        repos.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        info!(count = repos.len(), "Found local repositories");
        Ok(repos)
    }

    fn clone_or_copy(&self, identifier: &str, target_dir: &Path) -> anyhow::Result<()> {
        let (_, destination) = destination_for(SourceKind::Local, identifier, target_dir)?;
        if !Path::new(identifier).is_dir() {
            bail!("source repository {identifier} does not exist");
        }
        fs::create_dir_all(target_dir)
            .with_context(|| format!("create {}", target_dir.display()))?;
        git_sync::clone_repo(&destination, identifier, None)
    }

    fn refresh(&self, path: &Path) -> anyhow::Result<()> {
        git_sync::refresh_repo(path, None)?;
        Ok(())
    }
}
