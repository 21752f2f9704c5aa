use crate::model::SourceKind;
use anyhow::{Context, bail};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

/// Resolves the display name and destination directory for a repository
/// identifier. Remote ids must look like `owner/repo`; local ids are paths
/// and use their last component.
pub fn destination_for(
    kind: SourceKind,
    identifier: &str,
    target_dir: &Path,
) -> anyhow::Result<(String, PathBuf)> {
    let name = match kind {
        SourceKind::Remote => remote_repo_name(identifier)?,
        SourceKind::Local => Path::new(identifier)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("invalid local repository path {identifier:?}"))?,
    };
    let path = target_dir.join(sanitize_repo_name(&name));
    Ok((name, path))
}

fn remote_repo_name(identifier: &str) -> anyhow::Result<String> {
    let mut parts = identifier.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
            Ok(repo.to_string())
        }
        _ => bail!("invalid repository format (expected owner/repo, got {identifier:?})"),
    }
}

pub fn sanitize_repo_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            _ => ch,
        })
        .collect();
    while sanitized.ends_with('.') || sanitized.ends_with(' ') {
        sanitized.pop();
    }
    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}

/// Expands a leading `~` against `home`.
pub fn expand_tilde(raw: &str, home: Option<&Path>) -> PathBuf {
    match (raw, home) {
        ("~", Some(home)) => home.to_path_buf(),
        (raw, Some(home)) if raw.starts_with("~/") => home.join(&raw[2..]),
        (raw, _) => PathBuf::from(raw),
    }
}

pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Path equality ignoring trailing separators.
pub fn same_path(a: &Path, b: &Path) -> bool {
    let trim = |p: &Path| {
        let text = p.to_string_lossy();
        let trimmed = text.trim_end_matches(['/', '\\']);
        if trimmed.is_empty() {
            text.into_owned()
        } else {
            trimmed.to_string()
        }
    };
    trim(a) == trim(b)
}
