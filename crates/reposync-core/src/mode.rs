use crate::error::WorkflowError;
use crate::model::{Mode, RepoScope};
use std::path::PathBuf;
use tracing::info;

/// What the caller has to do after a successful mode change.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ModeEntry {
    LoadRepositories(RepoScope),
    EnterTemplate,
}

/// Tracks the active mode together with the user/owner context the remote
/// modes list against.
#[derive(Clone, Debug)]
pub struct ModeMachine {
    mode: Mode,
    username: String,
    owner: String,
    organizations: Vec<String>,
    source_dirs: Vec<PathBuf>,
}

impl ModeMachine {
    pub fn new(mode: Mode, username: String, owner: Option<String>, source_dirs: Vec<PathBuf>) -> Self {
        let owner = owner.unwrap_or_else(|| username.clone());
        Self {
            mode,
            username,
            owner,
            organizations: Vec::new(),
            source_dirs,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn organizations(&self) -> &[String] {
        &self.organizations
    }

    pub fn source_dirs(&self) -> &[PathBuf] {
        &self.source_dirs
    }

    pub fn set_source_dirs(&mut self, source_dirs: Vec<PathBuf>) {
        self.source_dirs = source_dirs;
    }

    pub fn set_organizations(&mut self, organizations: Vec<String>) {
        self.organizations = organizations;
    }

    /// Scope for the current mode's list; `None` in template mode.
    pub fn scope(&self) -> Option<RepoScope> {
        match self.mode {
            Mode::Personal => Some(RepoScope::Personal(self.owner.clone())),
            Mode::Organization => Some(RepoScope::Organization(self.owner.clone())),
            Mode::Local => Some(RepoScope::LocalPaths(self.source_dirs.clone())),
            Mode::Template => None,
        }
    }

    pub fn entry(&self) -> ModeEntry {
        match self.scope() {
            Some(scope) => ModeEntry::LoadRepositories(scope),
            None => ModeEntry::EnterTemplate,
        }
    }

    pub fn switch(&mut self, target: Mode) -> Result<ModeEntry, WorkflowError> {
        match target {
            Mode::Organization => {
                let first = self
                    .organizations
                    .first()
                    .cloned()
                    .ok_or(WorkflowError::NoOrganizations)?;
                self.owner = first;
            }
            Mode::Personal => self.owner = self.username.clone(),
            Mode::Local | Mode::Template => {}
        }
        info!(from = %self.mode, to = %target, owner = %self.owner, "Switching mode");
        self.mode = target;
        Ok(self.entry())
    }

    /// Picks an explicit owner from the owner selector.
    pub fn select_owner(&mut self, owner: String, is_org: bool) -> ModeEntry {
        self.owner = owner;
        self.mode = if is_org {
            Mode::Organization
        } else {
            Mode::Personal
        };
        info!(owner = %self.owner, mode = %self.mode, "Selected owner");
        self.entry()
    }
}
