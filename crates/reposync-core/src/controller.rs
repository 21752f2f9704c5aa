use crate::config::AppConfig;
use crate::error::WorkflowError;
use crate::event::{Command, Event};
use crate::mode::{ModeEntry, ModeMachine};
use crate::model::{Mode, SyncResult};
use crate::repo_list::RepoList;
use crate::sync_queue::{QueueStep, SyncQueue};
use crate::template_wizard::{TemplateRequest, TemplateWizard, WizardEffect};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct ControllerSettings {
    pub username: String,
    pub owner: Option<String>,
    pub mode: Mode,
    pub target_dir: PathBuf,
    pub source_dirs: Vec<PathBuf>,
    pub recent_templates: Vec<String>,
}

/// Owns all workflow state. Every input arrives as an [`Event`]; every side
/// effect leaves as a [`Command`] for the caller to run elsewhere.
#[derive(Debug)]
pub struct Controller {
    modes: ModeMachine,
    repos: RepoList,
    queue: Option<SyncQueue>,
    last_results: Option<Vec<SyncResult>>,
    wizard: TemplateWizard,
    target_dir: PathBuf,
    targets_loading: bool,
    targets_error: Option<String>,
    notice: Option<String>,
}

impl Controller {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            modes: ModeMachine::new(
                settings.mode,
                settings.username,
                settings.owner,
                settings.source_dirs,
            ),
            repos: RepoList::default(),
            queue: None,
            last_results: None,
            wizard: TemplateWizard::new(settings.recent_templates),
            target_dir: settings.target_dir,
            targets_loading: false,
            targets_error: None,
            notice: None,
        }
    }

    /// Commands for session start: organizations plus the initial mode.
    pub fn start(&mut self) -> Vec<Command> {
        let mut commands = vec![Command::LoadOrganizations];
        commands.extend(self.enter(self.modes.entry()));
        commands
    }

    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        if event.is_user_intent() {
            self.notice = None;
        }
        match self.apply(event) {
            Ok(commands) => commands,
            Err(err) => {
                warn!(error = %err, "Rejected action");
                self.notice = Some(err.to_string());
                Vec::new()
            }
        }
    }

    fn apply(&mut self, event: Event) -> Result<Vec<Command>, WorkflowError> {
        match event {
            Event::SwitchMode(mode) => self.switch_mode(mode),
            Event::NextMode => self.switch_mode(self.modes.mode().next()),
            Event::PrevMode => self.switch_mode(self.modes.mode().prev()),
            Event::SelectOwner { owner, is_org } => {
                self.ensure_idle()?;
                let entry = self.modes.select_owner(owner.clone(), is_org);
                let mut commands = self.enter(entry);
                commands.push(Command::RecordRecentOwner(owner));
                Ok(commands)
            }
            Event::Reload => {
                self.ensure_idle()?;
                if self.modes.mode() == Mode::Template {
                    Ok(self.load_targets())
                } else {
                    Ok(self.enter(self.modes.entry()))
                }
            }

            Event::ToggleRepo(id) => {
                self.repos.toggle(&id);
                Ok(Vec::new())
            }
            Event::SelectAllRepos => {
                self.repos.select_all();
                Ok(Vec::new())
            }
            Event::ClearRepoSelection => {
                self.repos.clear_selection();
                Ok(Vec::new())
            }
            Event::SetRepoFilter(query) => {
                self.repos.set_filter(&query);
                Ok(Vec::new())
            }
            Event::CycleRepoSort => {
                let sort = self.repos.cycle_sort();
                info!(sort = sort.label(), "Changed repository sort");
                Ok(Vec::new())
            }
            Event::StartSync => self.start_sync(),
            Event::ExistsDecision(action) => {
                let queue = self.queue.as_mut().ok_or(WorkflowError::NoPendingConflict)?;
                let step = queue.decide(action)?;
                Ok(self.queue_commands(step))
            }
            Event::DismissResults => {
                self.last_results = None;
                Ok(Vec::new())
            }

            Event::SubmitTemplate { input, local } => {
                self.ensure_mode(Mode::Template)?;
                let request = TemplateRequest::parse(&input, local)?;
                let effects = self.wizard.submit(request)?;
                Ok(wizard_commands(effects))
            }
            Event::CancelTemplateResolution => {
                self.wizard.cancel_resolution()?;
                Ok(Vec::new())
            }
            Event::ToggleTreeNode(path) => {
                self.wizard.toggle_node(&path)?;
                Ok(Vec::new())
            }
            Event::ToggleTreeExpanded(path) => {
                self.wizard.toggle_expanded(&path)?;
                Ok(Vec::new())
            }
            Event::SetTreeExpanded { path, expanded } => {
                self.wizard.set_expanded(&path, expanded)?;
                Ok(Vec::new())
            }
            Event::SelectAllFiles(selected) => {
                self.wizard.select_all_files(selected)?;
                Ok(Vec::new())
            }
            Event::ExpandAll(expanded) => {
                self.wizard.expand_all(expanded)?;
                Ok(Vec::new())
            }
            Event::ToggleTarget(path) => {
                self.wizard.toggle_target(path)?;
                Ok(Vec::new())
            }
            Event::SelectAllTargets(selected) => {
                self.wizard.select_all_targets(selected)?;
                Ok(Vec::new())
            }
            Event::AdvanceWizard => {
                self.ensure_mode(Mode::Template)?;
                let effects = self.wizard.advance()?;
                Ok(wizard_commands(effects))
            }
            Event::WizardBack => {
                self.wizard.back()?;
                Ok(Vec::new())
            }
            Event::TemplateConflictDecision(action) => {
                let effects = self.wizard.decide_conflict(action)?;
                Ok(wizard_commands(effects))
            }
            Event::SaveSettings(settings) => {
                self.ensure_idle()?;
                Ok(vec![Command::SaveSettings(settings)])
            }

            Event::OrganizationsLoaded(result) => {
                match result {
                    Ok(orgs) => {
                        info!(count = orgs.len(), "Loaded organizations");
                        self.modes.set_organizations(orgs);
                    }
                    Err(err) => {
                        warn!(error = %err, "Failed to load organizations");
                        self.notice = Some(format!("failed to load organizations: {err}"));
                    }
                }
                Ok(Vec::new())
            }
            Event::RepositoriesLoaded { load, result } => {
                if !self.repos.finish_load(load, result) {
                    info!(load, "Dropping stale repository list");
                }
                Ok(Vec::new())
            }
            Event::TemplateTargetsLoaded(result) => {
                self.targets_loading = false;
                match result {
                    Ok(paths) => {
                        self.targets_error = None;
                        self.wizard.set_candidates(paths);
                    }
                    Err(err) => self.targets_error = Some(err),
                }
                Ok(Vec::new())
            }
            Event::SyncItemFinished { index, outcome } => {
                let step = self
                    .queue
                    .as_mut()
                    .and_then(|queue| queue.on_outcome(index, outcome));
                Ok(step.map(|step| self.queue_commands(step)).unwrap_or_default())
            }
            Event::TemplateResolved {
                generation,
                key,
                result,
            } => Ok(wizard_commands(self.wizard.on_resolved(generation, key, result))),
            Event::TemplateMessage(message) => {
                Ok(wizard_commands(self.wizard.on_job_message(message)))
            }
            Event::TemplateQueueClosed => {
                self.wizard.on_queue_closed();
                Ok(Vec::new())
            }
            Event::SettingsSaved(result) => Ok(self.apply_settings(result)),
        }
    }

    fn apply_settings(&mut self, result: Result<AppConfig, String>) -> Vec<Command> {
        let config = match result {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "Failed to save settings");
                self.notice = Some(format!("failed to save settings: {err}"));
                return Vec::new();
            }
        };
        info!(target_dir = %config.target_dir.display(), "Saved settings");
        self.target_dir = config.target_dir;
        let dirs_changed = self.modes.source_dirs() != config.source_dirs.as_slice();
        self.modes.set_source_dirs(config.source_dirs);
        if !dirs_changed || self.ensure_idle().is_err() {
            return Vec::new();
        }
        match self.modes.mode() {
            Mode::Local => self.enter(self.modes.entry()),
            Mode::Template => self.load_targets(),
            Mode::Personal | Mode::Organization => Vec::new(),
        }
    }

    fn load_targets(&mut self) -> Vec<Command> {
        self.targets_loading = true;
        self.targets_error = None;
        vec![Command::LoadTemplateTargets(
            self.modes.source_dirs().to_vec(),
        )]
    }

    fn ensure_idle(&self) -> Result<(), WorkflowError> {
        if self.sync_running() || self.wizard.state().is_syncing() {
            return Err(WorkflowError::SyncInProgress);
        }
        Ok(())
    }

    fn ensure_mode(&self, mode: Mode) -> Result<(), WorkflowError> {
        if self.modes.mode() != mode {
            return Err(WorkflowError::StepUnavailable);
        }
        Ok(())
    }

    fn switch_mode(&mut self, mode: Mode) -> Result<Vec<Command>, WorkflowError> {
        self.ensure_idle()?;
        if self.wizard.state().is_resolving() {
            return Err(WorkflowError::ResolutionPending);
        }
        let entry = self.modes.switch(mode)?;
        Ok(self.enter(entry))
    }

    fn enter(&mut self, entry: ModeEntry) -> Vec<Command> {
        match entry {
            ModeEntry::LoadRepositories(scope) => {
                let load = self.repos.begin_load(self.modes.mode());
                vec![Command::LoadRepositories { load, scope }]
            }
            ModeEntry::EnterTemplate => {
                self.repos.clear();
                self.wizard.reset();
                self.load_targets()
            }
        }
    }

    fn start_sync(&mut self) -> Result<Vec<Command>, WorkflowError> {
        let kind = self
            .modes
            .mode()
            .source_kind()
            .ok_or(WorkflowError::StepUnavailable)?;
        if self.sync_running() {
            return Err(WorkflowError::SyncInProgress);
        }
        let selected = self.repos.selected().to_vec();
        if selected.is_empty() {
            return Err(WorkflowError::NothingSelected);
        }
        self.last_results = None;
        let (queue, step) = SyncQueue::start(selected, self.target_dir.clone(), kind);
        self.queue = Some(queue);
        Ok(self.queue_commands(step))
    }

    fn queue_commands(&mut self, step: QueueStep) -> Vec<Command> {
        match step {
            QueueStep::Dispatch(job) => vec![Command::SyncItem(job)],
            QueueStep::Refresh(job) => vec![Command::RefreshItem(job)],
            QueueStep::Prompt(_) => Vec::new(),
            QueueStep::Finished(results) => {
                self.queue = None;
                self.repos.clear_selection();
                self.last_results = Some(results);
                Vec::new()
            }
        }
    }

    pub fn sync_running(&self) -> bool {
        self.queue.as_ref().is_some_and(|queue| !queue.is_finished())
    }

    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    pub fn owner(&self) -> &str {
        self.modes.owner()
    }

    pub fn username(&self) -> &str {
        self.modes.username()
    }

    pub fn organizations(&self) -> &[String] {
        self.modes.organizations()
    }

    pub fn repos(&self) -> &RepoList {
        &self.repos
    }

    pub fn queue(&self) -> Option<&SyncQueue> {
        self.queue.as_ref()
    }

    pub fn last_results(&self) -> Option<&[SyncResult]> {
        self.last_results.as_deref()
    }

    pub fn wizard(&self) -> &TemplateWizard {
        &self.wizard
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn targets_loading(&self) -> bool {
        self.targets_loading
    }

    pub fn targets_error(&self) -> Option<&str> {
        self.targets_error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}

fn wizard_commands(effects: Vec<WizardEffect>) -> Vec<Command> {
    let mut commands = Vec::new();
    for effect in effects {
        match effect {
            WizardEffect::Resolve {
                generation,
                request,
            } => commands.push(Command::ResolveTemplate {
                generation,
                request,
            }),
            WizardEffect::RecordRecent(key) => commands.push(Command::RecordRecentTemplate(key)),
            WizardEffect::StartJob { job, worker, inbox } => {
                commands.push(Command::StartTemplateJob { job, worker });
                commands.push(Command::AwaitTemplateMessage(inbox));
            }
            WizardEffect::AwaitMessage(inbox) => commands.push(Command::AwaitTemplateMessage(inbox)),
        }
    }
    commands
}

#[cfg(test)]
mod tests;
