use crate::config::{AppConfig, Settings};
use crate::model::{Mode, RepoScope, RepoSummary};
use crate::progress::{ProgressReceiver, WorkerEnds};
use crate::sync_queue::{ExistsAction, ItemOutcome, RefreshJob, SyncItemJob};
use crate::template_job::{FileConflictAction, JobMessage, TemplateJob};
use crate::template_wizard::{ResolvedTemplate, TemplateRequest};
use std::path::PathBuf;

/// Everything the controller reacts to: user intents first, then results
/// coming back from commands.
#[derive(Debug)]
pub enum Event {
    SwitchMode(Mode),
    NextMode,
    PrevMode,
    SelectOwner { owner: String, is_org: bool },
    Reload,

    ToggleRepo(String),
    SelectAllRepos,
    ClearRepoSelection,
    SetRepoFilter(String),
    CycleRepoSort,
    StartSync,
    ExistsDecision(ExistsAction),
    DismissResults,

    SubmitTemplate { input: String, local: bool },
    CancelTemplateResolution,
    ToggleTreeNode(String),
    ToggleTreeExpanded(String),
    SetTreeExpanded { path: String, expanded: bool },
    SelectAllFiles(bool),
    ExpandAll(bool),
    ToggleTarget(PathBuf),
    SelectAllTargets(bool),
    AdvanceWizard,
    WizardBack,
    TemplateConflictDecision(FileConflictAction),
    SaveSettings(Settings),

    OrganizationsLoaded(Result<Vec<String>, String>),
    RepositoriesLoaded {
        load: u64,
        result: Result<Vec<RepoSummary>, String>,
    },
    TemplateTargetsLoaded(Result<Vec<PathBuf>, String>),
    SyncItemFinished { index: usize, outcome: ItemOutcome },
    TemplateResolved {
        generation: u64,
        key: String,
        result: Result<ResolvedTemplate, String>,
    },
    TemplateMessage(JobMessage),
    TemplateQueueClosed,
    SettingsSaved(Result<AppConfig, String>),
}

impl Event {
    pub fn is_user_intent(&self) -> bool {
        !matches!(
            self,
            Event::OrganizationsLoaded(_)
                | Event::RepositoriesLoaded { .. }
                | Event::TemplateTargetsLoaded(_)
                | Event::SyncItemFinished { .. }
                | Event::TemplateResolved { .. }
                | Event::TemplateMessage(_)
                | Event::TemplateQueueClosed
                | Event::SettingsSaved(_)
        )
    }
}

/// Side effects requested by the controller. Each one runs off the UI
/// thread and yields at most one follow-up event.
#[derive(Debug)]
pub enum Command {
    LoadOrganizations,
    LoadRepositories { load: u64, scope: RepoScope },
    LoadTemplateTargets(Vec<PathBuf>),
    SyncItem(SyncItemJob),
    RefreshItem(RefreshJob),
    ResolveTemplate {
        generation: u64,
        request: TemplateRequest,
    },
    RecordRecentTemplate(String),
    RecordRecentOwner(String),
    StartTemplateJob { job: TemplateJob, worker: WorkerEnds },
    AwaitTemplateMessage(ProgressReceiver),
    SaveSettings(Settings),
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Command::LoadOrganizations => "load-organizations",
            Command::LoadRepositories { .. } => "load-repositories",
            Command::LoadTemplateTargets(_) => "load-template-targets",
            Command::SyncItem(_) => "sync-item",
            Command::RefreshItem(_) => "refresh-item",
            Command::ResolveTemplate { .. } => "resolve-template",
            Command::RecordRecentTemplate(_) => "record-recent-template",
            Command::RecordRecentOwner(_) => "record-recent-owner",
            Command::StartTemplateJob { .. } => "start-template-job",
            Command::AwaitTemplateMessage(_) => "await-template-message",
            Command::SaveSettings(_) => "save-settings",
        }
    }
}
