use crate::model::{RepoScope, RepoSummary, SourceKind, TemplateOrigin};
use crate::paths::destination_for;
use crate::provider::{RepoSource, TemplateSource};
use crate::tree::{TreeEntry, TreeNode};
use anyhow::{anyhow, bail};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// In-memory repository source. Destinations are tracked as a path set
/// instead of touching disk.
pub struct FakeRepoSource {
    kind: SourceKind,
    repos: Vec<RepoSummary>,
    orgs: Vec<String>,
    existing: Mutex<HashSet<PathBuf>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeRepoSource {
    pub fn remote() -> Self {
        Self::new(SourceKind::Remote)
    }

    pub fn local() -> Self {
        Self::new(SourceKind::Local)
    }

    fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            repos: Vec::new(),
            orgs: Vec::new(),
            existing: Mutex::new(HashSet::new()),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_repos(mut self, ids: &[&str]) -> Self {
        self.repos = ids
            .iter()
            .map(|id| RepoSummary::new(*id, id.rsplit('/').next().unwrap_or(id)))
            .collect();
        self
    }

    pub fn with_orgs(mut self, orgs: &[&str]) -> Self {
        self.orgs = orgs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn failing_on(mut self, identifier: &str) -> Self {
        self.failing.insert(identifier.to_string());
        self
    }

    pub fn add_existing(&self, path: impl Into<PathBuf>) {
        self.existing.lock().unwrap().insert(path.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl RepoSource for FakeRepoSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn list_repositories(&self, scope: &RepoScope) -> anyhow::Result<Vec<RepoSummary>> {
        self.calls.lock().unwrap().push(format!("list {scope:?}"));
        Ok(self.repos.clone())
    }

    fn list_organizations(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.orgs.clone())
    }

    fn exists(&self, path: &Path) -> bool {
        self.existing.lock().unwrap().contains(path)
    }

    fn clone_or_copy(&self, identifier: &str, target_dir: &Path) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("clone {identifier}"));
        if self.failing.contains(identifier) {
            bail!("clone failed for {identifier}");
        }
        let (_, dest) = destination_for(self.kind, identifier, target_dir)?;
        self.add_existing(dest);
        Ok(())
    }

    fn refresh(&self, path: &Path) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("refresh {}", path.display()));
        Ok(())
    }
}

/// Template source backed by a fixed file map.
pub struct FakeTemplateSource {
    pub branch: String,
    pub files: BTreeMap<String, String>,
}

impl FakeTemplateSource {
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self {
            branch: "main".into(),
            files: files
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl TemplateSource for FakeTemplateSource {
    fn resolve_default_branch(&self, owner: &str, repo: &str) -> anyhow::Result<String> {
        if repo == "missing" {
            bail!("repository {owner}/{repo} not found");
        }
        Ok(self.branch.clone())
    }

    fn fetch_tree(&self, _owner: &str, repo: &str, _branch: &str) -> anyhow::Result<TreeNode> {
        let entries = self.files.keys().map(|path| TreeEntry {
            path: path.clone(),
            is_dir: false,
            size: None,
        });
        Ok(TreeNode::from_entries(repo, entries))
    }

    fn read_file(&self, _origin: &TemplateOrigin, path: &str) -> anyhow::Result<Vec<u8>> {
        self.files
            .get(path)
            .map(|body| body.clone().into_bytes())
            .ok_or_else(|| anyhow!("404 for {path}"))
    }
}
