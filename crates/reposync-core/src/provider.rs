use crate::model::{RepoScope, RepoSummary, SourceKind, TemplateOrigin};
use crate::tree::{self, TreeNode};
use std::path::Path;

/// A place repositories can be listed from and copied out of.
pub trait RepoSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    fn list_repositories(&self, scope: &RepoScope) -> anyhow::Result<Vec<RepoSummary>>;

    /// Organizations visible to the current user. Sources without the concept
    /// report none.
    fn list_organizations(&self) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// Materializes `identifier` as `target_dir/<name>`.
    fn clone_or_copy(&self, identifier: &str, target_dir: &Path) -> anyhow::Result<()>;

    /// Brings an existing destination up to date with its upstream.
    fn refresh(&self, path: &Path) -> anyhow::Result<()>;
}

/// Reads template trees and file contents.
pub trait TemplateSource: Send + Sync {
    fn resolve_default_branch(&self, owner: &str, repo: &str) -> anyhow::Result<String>;

    fn fetch_tree(&self, owner: &str, repo: &str, branch: &str) -> anyhow::Result<TreeNode>;

    fn walk_local_directory(&self, path: &Path) -> anyhow::Result<TreeNode> {
        tree::walk_local_directory(path)
    }

    /// Raw bytes of `path` (relative, `/`-separated) within the template.
    fn read_file(&self, origin: &TemplateOrigin, path: &str) -> anyhow::Result<Vec<u8>>;
}
