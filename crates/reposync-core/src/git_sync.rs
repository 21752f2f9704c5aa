use crate::model::RepoAuth;
use anyhow::{Context, bail};
use git2::{
    Cred, FetchOptions, Oid, RemoteCallbacks, Repository, StatusOptions,
    build::{CheckoutBuilder, RepoBuilder},
};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RefreshOutcome {
    FastForwarded,
    UpToDate,
}

/// Clones `source` (a URL or a local repository path) into `repo_path`.
pub fn clone_repo(repo_path: &Path, source: &str, auth: Option<&RepoAuth>) -> anyhow::Result<()> {
    let mut fo = FetchOptions::new();
    fo.remote_callbacks(remote_callbacks(auth));
    info!(path = %repo_path.display(), source = %redact(source), "Cloning repository");
    let mut builder = RepoBuilder::new();
    builder.fetch_options(fo);
    builder
        .clone(source, repo_path)
        .with_context(|| format!("clone into {}", repo_path.display()))?;
    Ok(())
}

/// Pulls the checked-out branch: fetch origin, then fast-forward. A dirty
/// working tree or a branch that has commits origin lacks is an error.
pub fn refresh_repo(repo_path: &Path, auth: Option<&RepoAuth>) -> anyhow::Result<RefreshOutcome> {
    let repo = Repository::open(repo_path).context("open repo")?;
    if !is_working_tree_clean(&repo)? {
        warn!(path = %repo_path.display(), "Working tree dirty; not refreshing");
        bail!("working tree has uncommitted changes");
    }
    fetch_origin(&repo, auth)?;
    let outcome = fast_forward_head(&repo)?;
    info!(path = %repo_path.display(), outcome = ?outcome, "Refreshed repository");
    Ok(outcome)
}

/// Name of the checked-out branch, if HEAD points at one.
pub fn current_branch(repo_path: &Path) -> Option<String> {
    let repo = Repository::open(repo_path).ok()?;
    let head = repo.head().ok()?;
    if !head.is_branch() {
        return None;
    }
    head.shorthand().map(str::to_string)
}

pub fn is_repository(path: &Path) -> bool {
    path.join(".git").exists()
}

fn is_working_tree_clean(repo: &Repository) -> anyhow::Result<bool> {
    let mut options = StatusOptions::new();
    options
        .include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);
    let statuses = repo.statuses(Some(&mut options)).context("status repo")?;
    Ok(statuses.is_empty())
}

fn fetch_origin(repo: &Repository, auth: Option<&RepoAuth>) -> anyhow::Result<()> {
    let mut remote = repo.find_remote("origin").context("find origin remote")?;
    let mut fo = FetchOptions::new();
    fo.remote_callbacks(remote_callbacks(auth));
    info!("Fetching origin");
    remote
        .fetch(&[] as &[&str], Some(&mut fo), None)
        .context("fetch origin")?;
    Ok(())
}

fn fast_forward_head(repo: &Repository) -> anyhow::Result<RefreshOutcome> {
    let head = repo.head().context("resolve HEAD")?;
    if !head.is_branch() {
        bail!("HEAD is detached");
    }
    let branch = head.shorthand().context("read HEAD branch name")?.to_string();
    let local_ref = format!("refs/heads/{branch}");
    let remote_ref = format!("refs/remotes/origin/{branch}");

    let remote_oid = repo
        .refname_to_id(&remote_ref)
        .with_context(|| format!("branch {branch} not found on origin"))?;
    let local_oid = repo
        .refname_to_id(&local_ref)
        .with_context(|| format!("resolve {local_ref}"))?;

    let (ahead, behind) = repo
        .graph_ahead_behind(local_oid, remote_oid)
        .context("compare local and remote")?;
    if ahead > 0 {
        bail!("branch {branch} has diverged from origin ({ahead} ahead, {behind} behind)");
    }
    if behind == 0 {
        return Ok(RefreshOutcome::UpToDate);
    }

    update_branch_ref(repo, &local_ref, remote_oid)?;
    checkout_head(repo)?;
    Ok(RefreshOutcome::FastForwarded)
}

fn update_branch_ref(repo: &Repository, local_ref: &str, target: Oid) -> anyhow::Result<()> {
    let mut reference = repo
        .find_reference(local_ref)
        .with_context(|| format!("find local ref {local_ref}"))?;
    reference
        .set_target(target, "fast-forward")
        .context("set local ref target")?;
    Ok(())
}

fn checkout_head(repo: &Repository) -> anyhow::Result<()> {
    let mut checkout = CheckoutBuilder::new();
    checkout.safe();
    repo.checkout_head(Some(&mut checkout))
        .context("checkout head")?;
    Ok(())
}

fn remote_callbacks(auth: Option<&RepoAuth>) -> RemoteCallbacks<'static> {
    let auth = auth.cloned();
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, _allowed| {
        if let Some(auth) = auth.as_ref() {
            let username = if auth.username.is_empty() {
                username_from_url.unwrap_or("x-access-token")
            } else {
                auth.username.as_str()
            };
            Cred::userpass_plaintext(username, &auth.token)
        } else {
            Cred::default()
        }
    });
    callbacks
}

fn redact(source: &str) -> String {
    match source.split_once('@') {
        Some((scheme_and_creds, rest)) if scheme_and_creds.contains("://") => {
            let scheme = scheme_and_creds.split("://").next().unwrap_or("https");
            format!("{scheme}://***@{rest}")
        }
        _ => source.to_string(),
    }
}
