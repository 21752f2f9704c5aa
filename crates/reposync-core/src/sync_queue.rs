use crate::error::WorkflowError;
use crate::model::{SourceKind, SyncResult};
use crate::paths::destination_for;
use crate::provider::RepoSource;
use std::path::PathBuf;
use tracing::{info, warn};

/// The user's answer to a "destination already exists" prompt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExistsAction {
    Skip,
    Refresh,
    SkipAll,
    RefreshAll,
}

/// How the worker treats an existing destination, fixed when an item is
/// dispatched.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExistingPolicy {
    Prompt,
    Skip,
    Refresh,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConflictPrompt {
    pub index: usize,
    pub repo: String,
    pub destination: PathBuf,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncItemJob {
    pub index: usize,
    pub identifier: String,
    pub repo: String,
    pub destination: PathBuf,
    pub target_dir: PathBuf,
    pub kind: SourceKind,
    pub policy: ExistingPolicy,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RefreshJob {
    pub index: usize,
    pub repo: String,
    pub destination: PathBuf,
    pub kind: SourceKind,
}

/// What a worker reports back for one item.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ItemOutcome {
    Finished(SyncResult),
    Exists,
}

/// Next thing the caller must do to drive the queue.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueueStep {
    Dispatch(SyncItemJob),
    Refresh(RefreshJob),
    Prompt(ConflictPrompt),
    Finished(Vec<SyncResult>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum QueueState {
    InFlight(usize),
    AwaitingDecision(ConflictPrompt),
    Done,
}

/// Processes selected repositories one at a time. At most one item is ever
/// in flight, and the cursor advances by exactly one per resolved item.
#[derive(Clone, Debug)]
pub struct SyncQueue {
    items: Vec<String>,
    target_dir: PathBuf,
    kind: SourceKind,
    cursor: usize,
    results: Vec<SyncResult>,
    skip_all: bool,
    refresh_all: bool,
    state: QueueState,
}

impl SyncQueue {
    pub fn start(items: Vec<String>, target_dir: PathBuf, kind: SourceKind) -> (Self, QueueStep) {
        info!(count = items.len(), target = %target_dir.display(), "Starting sync queue");
        let mut queue = Self {
            items,
            target_dir,
            kind,
            cursor: 0,
            results: Vec::new(),
            skip_all: false,
            refresh_all: false,
            state: QueueState::Done,
        };
        let step = queue.advance();
        (queue, step)
    }

    fn advance(&mut self) -> QueueStep {
        while let Some(identifier) = self.items.get(self.cursor).cloned() {
            match destination_for(self.kind, &identifier, &self.target_dir) {
                Ok((repo, destination)) => {
                    self.state = QueueState::InFlight(self.cursor);
                    let policy = if self.refresh_all {
                        ExistingPolicy::Refresh
                    } else if self.skip_all {
                        ExistingPolicy::Skip
                    } else {
                        ExistingPolicy::Prompt
                    };
                    return QueueStep::Dispatch(SyncItemJob {
                        index: self.cursor,
                        identifier,
                        repo,
                        destination,
                        target_dir: self.target_dir.clone(),
                        kind: self.kind,
                        policy,
                    });
                }
                Err(err) => {
                    warn!(repo = %identifier, error = %err, "Rejecting repository");
                    self.results
                        .push(SyncResult::failed(identifier, err.to_string()));
                    self.cursor += 1;
                }
            }
        }
        self.state = QueueState::Done;
        info!(count = self.results.len(), "Sync queue finished");
        QueueStep::Finished(self.results.clone())
    }

    /// Applies a worker report. Reports for anything but the in-flight item
    /// are ignored.
    pub fn on_outcome(&mut self, index: usize, outcome: ItemOutcome) -> Option<QueueStep> {
        if self.state != QueueState::InFlight(index) {
            warn!(index, "Ignoring stale sync report");
            return None;
        }
        match outcome {
            ItemOutcome::Finished(result) => {
                self.results.push(result);
                self.cursor += 1;
                Some(self.advance())
            }
            ItemOutcome::Exists => {
                match destination_for(self.kind, &self.items[index], &self.target_dir) {
                    Ok((repo, destination)) => {
                        let prompt = ConflictPrompt {
                            index,
                            repo,
                            destination,
                        };
                        self.state = QueueState::AwaitingDecision(prompt.clone());
                        Some(QueueStep::Prompt(prompt))
                    }
                    Err(err) => {
                        self.results
                            .push(SyncResult::failed(self.items[index].clone(), err.to_string()));
                        self.cursor += 1;
                        Some(self.advance())
                    }
                }
            }
        }
    }

    pub fn decide(&mut self, action: ExistsAction) -> Result<QueueStep, WorkflowError> {
        let QueueState::AwaitingDecision(prompt) = self.state.clone() else {
            return Err(WorkflowError::NoPendingConflict);
        };
        info!(repo = %prompt.repo, action = ?action, "Resolved existing destination");
        match action {
            ExistsAction::SkipAll => self.skip_all = true,
            ExistsAction::RefreshAll => self.refresh_all = true,
            ExistsAction::Skip | ExistsAction::Refresh => {}
        }
        match action {
            ExistsAction::Skip | ExistsAction::SkipAll => {
                self.results.push(SyncResult::skipped(prompt.repo));
                self.cursor += 1;
                Ok(self.advance())
            }
            ExistsAction::Refresh | ExistsAction::RefreshAll => {
                self.state = QueueState::InFlight(prompt.index);
                Ok(QueueStep::Refresh(RefreshJob {
                    index: prompt.index,
                    repo: prompt.repo,
                    destination: prompt.destination,
                    kind: self.kind,
                }))
            }
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn results(&self) -> &[SyncResult] {
        &self.results
    }

    pub fn is_finished(&self) -> bool {
        self.state == QueueState::Done
    }

    pub fn pending_prompt(&self) -> Option<&ConflictPrompt> {
        match &self.state {
            QueueState::AwaitingDecision(prompt) => Some(prompt),
            _ => None,
        }
    }

    pub fn skip_all(&self) -> bool {
        self.skip_all
    }

    pub fn refresh_all(&self) -> bool {
        self.refresh_all
    }

    /// Display name of the item at the cursor.
    pub fn current_repo(&self) -> Option<String> {
        let identifier = self.items.get(self.cursor)?;
        destination_for(self.kind, identifier, &self.target_dir)
            .map(|(name, _)| name)
            .ok()
    }
}

/// Worker side of a sync item: copy when absent, otherwise apply `policy`.
pub fn run_item(source: &dyn RepoSource, job: &SyncItemJob) -> ItemOutcome {
    if !source.exists(&job.destination) {
        let outcome = source.clone_or_copy(&job.identifier, &job.target_dir);
        return ItemOutcome::Finished(SyncResult::from_outcome(job.repo.clone(), outcome));
    }
    match job.policy {
        ExistingPolicy::Prompt => ItemOutcome::Exists,
        ExistingPolicy::Skip => ItemOutcome::Finished(SyncResult::skipped(job.repo.clone())),
        ExistingPolicy::Refresh => ItemOutcome::Finished(SyncResult::from_outcome(
            job.repo.clone(),
            source.refresh(&job.destination),
        )),
    }
}

pub fn run_refresh(source: &dyn RepoSource, job: &RefreshJob) -> SyncResult {
    SyncResult::from_outcome(job.repo.clone(), source.refresh(&job.destination))
}
