use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Personal,
    Organization,
    Local,
    Template,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::Personal,
        Mode::Organization,
        Mode::Local,
        Mode::Template,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Personal => "Personal",
            Mode::Organization => "Organization",
            Mode::Local => "Local",
            Mode::Template => "Template",
        }
    }

    pub fn shortcut(self) -> char {
        match self {
            Mode::Personal => '1',
            Mode::Organization => '2',
            Mode::Local => '3',
            Mode::Template => '4',
        }
    }

    pub fn from_shortcut(ch: char) -> Option<Mode> {
        Mode::ALL.into_iter().find(|mode| mode.shortcut() == ch)
    }

    pub fn next(self) -> Mode {
        let index = Mode::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Mode::ALL[(index + 1) % Mode::ALL.len()]
    }

    pub fn prev(self) -> Mode {
        let index = Mode::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Mode::ALL[(index + Mode::ALL.len() - 1) % Mode::ALL.len()]
    }

    /// Which repository source backs the list view; `None` for the template wizard.
    pub fn source_kind(self) -> Option<SourceKind> {
        match self {
            Mode::Personal | Mode::Organization => Some(SourceKind::Remote),
            Mode::Local => Some(SourceKind::Local),
            Mode::Template => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SourceKind {
    Remote,
    Local,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RepoScope {
    Personal(String),
    Organization(String),
    LocalPaths(Vec<PathBuf>),
}

/// A repository as shown in the list view. `id` is `owner/repo` for remote
/// sources and an absolute path for local ones.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RepoSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub archived: bool,
    pub metadata: BTreeMap<String, String>,
}

impl RepoSummary {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncResult {
    pub repo: String,
    pub success: bool,
    pub skipped: bool,
    pub error: Option<String>,
}

impl SyncResult {
    pub fn synced(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            success: true,
            skipped: false,
            error: None,
        }
    }

    pub fn skipped(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            success: true,
            skipped: true,
            error: None,
        }
    }

    pub fn failed(repo: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            success: false,
            skipped: false,
            error: Some(error.into()),
        }
    }

    pub fn from_outcome(repo: impl Into<String>, outcome: anyhow::Result<()>) -> Self {
        match outcome {
            Ok(()) => Self::synced(repo),
            Err(err) => Self::failed(repo, format!("{err:#}")),
        }
    }
}

/// Where a template is read from once its branch (if any) is known.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TemplateOrigin {
    GitHub {
        owner: String,
        repo: String,
        branch: String,
    },
    Local(PathBuf),
}

impl TemplateOrigin {
    pub fn display_name(&self) -> String {
        match self {
            TemplateOrigin::GitHub { owner, repo, .. } => format!("{owner}/{repo}"),
            TemplateOrigin::Local(path) => {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                format!("{name} (local)")
            }
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            TemplateOrigin::Local(path) => Some(path),
            TemplateOrigin::GitHub { .. } => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RepoAuth {
    pub username: String,
    pub token: String,
}
