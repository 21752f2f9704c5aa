use crate::config::push_recent;
use crate::error::WorkflowError;
use crate::model::TemplateOrigin;
use crate::paths::{expand_tilde, home_dir, same_path};
use crate::progress::{ControllerEnds, ProgressReceiver, WorkerEnds, open_bridge};
use crate::template_job::{
    FileConflict, FileConflictAction, FileFailure, JobMessage, TemplateJob, TemplateProgress,
    TemplateSummary,
};
use crate::tree::TreeNode;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WizardStep {
    SelectTemplate,
    BrowseTree,
    SelectTargets,
    Syncing,
    Complete,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::SelectTemplate,
        WizardStep::BrowseTree,
        WizardStep::SelectTargets,
        WizardStep::Syncing,
        WizardStep::Complete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::SelectTemplate => "Select template",
            WizardStep::BrowseTree => "Choose files",
            WizardStep::SelectTargets => "Choose targets",
            WizardStep::Syncing => "Syncing",
            WizardStep::Complete => "Done",
        }
    }

    /// Step reached by "back"; only the file and target pickers have one.
    pub fn predecessor(self) -> Option<WizardStep> {
        match self {
            WizardStep::BrowseTree => Some(WizardStep::SelectTemplate),
            WizardStep::SelectTargets => Some(WizardStep::BrowseTree),
            _ => None,
        }
    }
}

/// A template the user asked for, before its branch or tree is known.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TemplateRequest {
    GitHub { owner: String, repo: String },
    Local(PathBuf),
}

impl TemplateRequest {
    pub fn parse(input: &str, local: bool) -> Result<Self, WorkflowError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(WorkflowError::InvalidTemplateInput(
                "enter a template".to_string(),
            ));
        }
        if local {
            return Ok(TemplateRequest::Local(expand_tilde(input, home_dir().as_deref())));
        }
        match input.split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(TemplateRequest::GitHub {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(WorkflowError::InvalidTemplateInput(format!(
                "invalid template format (expected owner/repo, got {input:?})"
            ))),
        }
    }

    /// Key stored in the recent-templates list.
    pub fn recent_key(&self) -> String {
        match self {
            TemplateRequest::GitHub { owner, repo } => format!("{owner}/{repo}"),
            TemplateRequest::Local(path) => path.display().to_string(),
        }
    }
}

/// Outcome of resolving a request: the concrete origin and its file tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedTemplate {
    pub origin: TemplateOrigin,
    pub tree: TreeNode,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SyncCounters {
    pub synced: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Everything one pass through the wizard accumulates. Reset wipes it all.
#[derive(Debug)]
pub struct TemplateWorkflowState {
    pub step: WizardStep,
    pub source: Option<TemplateOrigin>,
    pub tree: Option<TreeNode>,
    pub selected_files: Vec<String>,
    pub selected_targets: Vec<PathBuf>,
    pub overwrite_all: bool,
    pub skip_all: bool,
    pub counters: SyncCounters,
    pub progress: Option<TemplateProgress>,
    pub pending_conflict: Option<FileConflict>,
    pub failures: Vec<FileFailure>,
    pub error: Option<String>,
    resolving: Option<u64>,
    job: Option<ControllerEnds>,
}

impl Default for TemplateWorkflowState {
    fn default() -> Self {
        Self {
            step: WizardStep::SelectTemplate,
            source: None,
            tree: None,
            selected_files: Vec::new(),
            selected_targets: Vec::new(),
            overwrite_all: false,
            skip_all: false,
            counters: SyncCounters::default(),
            progress: None,
            pending_conflict: None,
            failures: Vec::new(),
            error: None,
            resolving: None,
            job: None,
        }
    }
}

impl TemplateWorkflowState {
    pub fn is_resolving(&self) -> bool {
        self.resolving.is_some()
    }

    pub fn is_syncing(&self) -> bool {
        self.step == WizardStep::Syncing
    }
}

/// Work the wizard needs done outside itself.
#[derive(Debug)]
pub enum WizardEffect {
    Resolve {
        generation: u64,
        request: TemplateRequest,
    },
    RecordRecent(String),
    StartJob {
        job: TemplateJob,
        worker: WorkerEnds,
        inbox: ProgressReceiver,
    },
    AwaitMessage(ProgressReceiver),
}

/// The five-step template wizard. Candidate targets and the recent list
/// live outside the per-pass state so they survive a reset.
#[derive(Debug, Default)]
pub struct TemplateWizard {
    state: TemplateWorkflowState,
    candidates: Vec<PathBuf>,
    recent: Vec<String>,
    generation: u64,
}

impl TemplateWizard {
    pub fn new(recent: Vec<String>) -> Self {
        Self {
            recent,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &TemplateWorkflowState {
        &self.state
    }

    pub fn step(&self) -> WizardStep {
        self.state.step
    }

    pub fn recent(&self) -> &[String] {
        &self.recent
    }

    pub fn reset(&mut self) {
        if self.state.job.is_some() {
            warn!("Resetting template wizard while a job is attached");
        }
        self.state = TemplateWorkflowState::default();
    }

    pub fn set_candidates(&mut self, candidates: Vec<PathBuf>) {
        self.candidates = candidates;
    }

    /// Target candidates, minus the local template directory itself.
    pub fn candidates(&self) -> Vec<&PathBuf> {
        let excluded = self.state.source.as_ref().and_then(TemplateOrigin::local_path);
        self.candidates
            .iter()
            .filter(|path| !excluded.is_some_and(|ex| same_path(ex, path)))
            .collect()
    }

    pub fn submit(&mut self, request: TemplateRequest) -> Result<Vec<WizardEffect>, WorkflowError> {
        if self.state.resolving.is_some() {
            return Err(WorkflowError::ResolutionPending);
        }
        if self.state.step != WizardStep::SelectTemplate {
            return Err(WorkflowError::StepUnavailable);
        }
        self.generation += 1;
        self.state.resolving = Some(self.generation);
        self.state.error = None;
        info!(template = %request.recent_key(), generation = self.generation, "Resolving template");
        Ok(vec![WizardEffect::Resolve {
            generation: self.generation,
            request,
        }])
    }

    pub fn cancel_resolution(&mut self) -> Result<(), WorkflowError> {
        match self.state.resolving.take() {
            Some(generation) => {
                info!(generation, "Cancelled template resolution");
                Ok(())
            }
            None => Err(WorkflowError::StepUnavailable),
        }
    }

    pub fn on_resolved(
        &mut self,
        generation: u64,
        request_key: String,
        result: Result<ResolvedTemplate, String>,
    ) -> Vec<WizardEffect> {
        if self.state.resolving != Some(generation) {
            info!(generation, "Dropping stale template resolution");
            return Vec::new();
        }
        self.state.resolving = None;
        match result {
            Ok(resolved) => {
                let mut tree = resolved.tree;
                tree.set_selected(true);
                info!(
                    template = %resolved.origin.display_name(),
                    files = tree.file_count(),
                    "Template loaded"
                );
                self.state.source = Some(resolved.origin);
                self.state.tree = Some(tree);
                self.state.step = WizardStep::BrowseTree;
                push_recent(&mut self.recent, &request_key);
                vec![WizardEffect::RecordRecent(request_key)]
            }
            Err(err) => {
                warn!(error = %err, "Template resolution failed");
                self.state.error = Some(err);
                Vec::new()
            }
        }
    }

    fn tree_mut(&mut self) -> Result<&mut TreeNode, WorkflowError> {
        if self.state.step != WizardStep::BrowseTree {
            return Err(WorkflowError::StepUnavailable);
        }
        self.state.tree.as_mut().ok_or(WorkflowError::StepUnavailable)
    }

    pub fn toggle_node(&mut self, path: &str) -> Result<(), WorkflowError> {
        self.tree_mut()?.toggle(path);
        Ok(())
    }

    pub fn toggle_expanded(&mut self, path: &str) -> Result<(), WorkflowError> {
        self.tree_mut()?.toggle_expanded(path);
        Ok(())
    }

    pub fn set_expanded(&mut self, path: &str, expanded: bool) -> Result<(), WorkflowError> {
        self.tree_mut()?.set_expanded(path, expanded);
        Ok(())
    }

    pub fn select_all_files(&mut self, selected: bool) -> Result<(), WorkflowError> {
        self.tree_mut()?.set_selected(selected);
        Ok(())
    }

    pub fn expand_all(&mut self, expanded: bool) -> Result<(), WorkflowError> {
        let tree = self.tree_mut()?;
        if expanded {
            tree.expand_all();
        } else {
            tree.collapse_all();
        }
        Ok(())
    }

    pub fn toggle_target(&mut self, path: PathBuf) -> Result<(), WorkflowError> {
        if self.state.step != WizardStep::SelectTargets {
            return Err(WorkflowError::StepUnavailable);
        }
        if let Some(source) = self.state.source.as_ref().and_then(TemplateOrigin::local_path)
            && same_path(source, &path)
        {
            return Err(WorkflowError::TargetIsTemplate(path.display().to_string()));
        }
        if let Some(pos) = self.state.selected_targets.iter().position(|p| *p == path) {
            self.state.selected_targets.remove(pos);
        } else {
            self.state.selected_targets.push(path);
        }
        Ok(())
    }

    pub fn select_all_targets(&mut self, selected: bool) -> Result<(), WorkflowError> {
        if self.state.step != WizardStep::SelectTargets {
            return Err(WorkflowError::StepUnavailable);
        }
        self.state.selected_targets = if selected {
            self.candidates().into_iter().cloned().collect()
        } else {
            Vec::new()
        };
        Ok(())
    }

    /// Moves forward from the current step, starting the job when leaving
    /// target selection.
    pub fn advance(&mut self) -> Result<Vec<WizardEffect>, WorkflowError> {
        match self.state.step {
            WizardStep::BrowseTree => {
                let files = self
                    .state
                    .tree
                    .as_ref()
                    .map(TreeNode::selected_files)
                    .unwrap_or_default();
                if files.is_empty() {
                    return Err(WorkflowError::NoFilesSelected);
                }
                self.state.selected_files = files;
                self.state.step = WizardStep::SelectTargets;
                Ok(Vec::new())
            }
            WizardStep::SelectTargets => self.start_job(),
            WizardStep::Complete => {
                self.reset();
                Ok(Vec::new())
            }
            WizardStep::SelectTemplate | WizardStep::Syncing => Err(WorkflowError::StepUnavailable),
        }
    }

    fn start_job(&mut self) -> Result<Vec<WizardEffect>, WorkflowError> {
        let source = self
            .state
            .source
            .as_ref()
            .and_then(TemplateOrigin::local_path)
            .map(PathBuf::from);
        self.state
            .selected_targets
            .retain(|target| !source.as_deref().is_some_and(|s| same_path(s, target)));
        if self.state.selected_targets.is_empty() {
            return Err(WorkflowError::NoTargetsSelected);
        }
        let origin = self
            .state
            .source
            .clone()
            .ok_or(WorkflowError::StepUnavailable)?;
        let job = TemplateJob {
            origin,
            files: self.state.selected_files.clone(),
            targets: self.state.selected_targets.clone(),
            overwrite_all: self.state.overwrite_all,
            skip_all: self.state.skip_all,
        };
        let (controller, worker) = open_bridge();
        let inbox = controller.inbox.clone();
        self.state.job = Some(controller);
        self.state.step = WizardStep::Syncing;
        self.state.counters = SyncCounters::default();
        self.state.progress = None;
        self.state.failures.clear();
        Ok(vec![WizardEffect::StartJob { job, worker, inbox }])
    }

    pub fn back(&mut self) -> Result<(), WorkflowError> {
        let previous = self
            .state
            .step
            .predecessor()
            .ok_or(WorkflowError::StepUnavailable)?;
        self.state.step = previous;
        Ok(())
    }

    pub fn on_job_message(&mut self, message: JobMessage) -> Vec<WizardEffect> {
        if self.state.step != WizardStep::Syncing {
            warn!("Dropping template message outside of sync");
            return Vec::new();
        }
        match message {
            JobMessage::Progress(progress) => {
                self.state.progress = Some(progress);
                self.await_next()
            }
            JobMessage::Conflict(conflict) => {
                info!(file = %conflict.file, target = %conflict.target.display(), "Template file exists");
                self.state.pending_conflict = Some(conflict);
                Vec::new()
            }
            JobMessage::Summary(summary) => {
                self.finish(summary);
                Vec::new()
            }
        }
    }

    /// The job's queue closed without a summary.
    pub fn on_queue_closed(&mut self) {
        if self.state.step == WizardStep::Syncing {
            warn!("Template job ended without a summary");
            self.state.job = None;
            self.state.pending_conflict = None;
            self.state.error = Some("template sync ended unexpectedly".to_string());
            self.state.step = WizardStep::Complete;
        }
    }

    pub fn decide_conflict(
        &mut self,
        action: FileConflictAction,
    ) -> Result<Vec<WizardEffect>, WorkflowError> {
        let conflict = self
            .state
            .pending_conflict
            .take()
            .ok_or(WorkflowError::NoPendingConflict)?;
        match action {
            FileConflictAction::OverwriteAll => self.state.overwrite_all = true,
            FileConflictAction::SkipAll => self.state.skip_all = true,
            FileConflictAction::Overwrite | FileConflictAction::Skip => {}
        }
        info!(file = %conflict.file, action = ?action, "Resolved template conflict");
        if let Some(job) = &self.state.job
            && job.decisions.send(action).is_err()
        {
            warn!("Template job is gone; decision dropped");
        }
        Ok(self.await_next())
    }

    fn await_next(&self) -> Vec<WizardEffect> {
        match &self.state.job {
            Some(job) => vec![WizardEffect::AwaitMessage(job.inbox.clone())],
            None => Vec::new(),
        }
    }

    fn finish(&mut self, summary: TemplateSummary) {
        self.state.counters = SyncCounters {
            synced: summary.synced,
            skipped: summary.skipped,
            errors: summary.errors,
        };
        self.state.failures = summary.failures;
        self.state.pending_conflict = None;
        self.state.job = None;
        self.state.step = WizardStep::Complete;
    }
}

/// One-line result text, worst news first.
pub fn summary_line(counters: &SyncCounters) -> String {
    if counters.errors > 0 {
        format!(
            "Completed with {} error(s): {} synced, {} skipped",
            counters.errors, counters.synced, counters.skipped
        )
    } else if counters.skipped > 0 {
        format!(
            "Synced {} file(s), skipped {} existing",
            counters.synced, counters.skipped
        )
    } else {
        format!("Successfully synced {} file(s)", counters.synced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeEntry;

    fn resolved_local(path: &str) -> ResolvedTemplate {
        ResolvedTemplate {
            origin: TemplateOrigin::Local(PathBuf::from(path)),
            tree: TreeNode::from_entries(
                "tmpl",
                ["a.txt", "b/c.txt"].iter().map(|p| TreeEntry {
                    path: p.to_string(),
                    is_dir: false,
                    size: None,
                }),
            ),
        }
    }

    fn wizard_at_tree() -> TemplateWizard {
        let mut wizard = TemplateWizard::default();
        wizard.set_candidates(vec![
            PathBuf::from("/src/tmpl"),
            PathBuf::from("/src/app"),
            PathBuf::from("/src/lib"),
        ]);
        let effects = wizard
            .submit(TemplateRequest::Local(PathBuf::from("/src/tmpl")))
            .unwrap();
        let WizardEffect::Resolve { generation, .. } = effects[0] else {
            panic!("expected resolve");
        };
        wizard.on_resolved(generation, "/src/tmpl".into(), Ok(resolved_local("/src/tmpl/")));
        wizard
    }

    #[test]
    fn parse_rejects_bad_remote_input() {
        assert!(matches!(
            TemplateRequest::parse("acme", false),
            Err(WorkflowError::InvalidTemplateInput(_))
        ));
        assert!(TemplateRequest::parse("a/b/c", false).is_err());
        assert!(TemplateRequest::parse("  ", true).is_err());
        assert_eq!(
            TemplateRequest::parse(" acme/starter ", false),
            Ok(TemplateRequest::GitHub {
                owner: "acme".into(),
                repo: "starter".into()
            })
        );
    }

    #[test]
    fn resolution_selects_everything_and_records_recent() {
        let wizard = wizard_at_tree();
        assert_eq!(wizard.step(), WizardStep::BrowseTree);
        assert_eq!(
            wizard.state().tree.as_ref().unwrap().selected_files(),
            vec!["b/c.txt", "a.txt"]
        );
        assert_eq!(wizard.recent(), ["/src/tmpl"]);
    }

    #[test]
    fn pending_resolution_blocks_resubmit_and_cancel_drops_result() {
        let mut wizard = TemplateWizard::default();
        wizard
            .submit(TemplateRequest::GitHub {
                owner: "a".into(),
                repo: "b".into(),
            })
            .unwrap();
        assert!(matches!(
            wizard.submit(TemplateRequest::Local(PathBuf::from("/x"))),
            Err(WorkflowError::ResolutionPending)
        ));
        wizard.cancel_resolution().unwrap();
        let effects = wizard.on_resolved(1, "a/b".into(), Ok(resolved_local("/x")));
        assert!(effects.is_empty());
        assert_eq!(wizard.step(), WizardStep::SelectTemplate);
    }

    #[test]
    fn failed_resolution_stays_on_first_step() {
        let mut wizard = TemplateWizard::default();
        wizard
            .submit(TemplateRequest::Local(PathBuf::from("/nope")))
            .unwrap();
        wizard.on_resolved(1, "/nope".into(), Err("not a directory".into()));
        assert_eq!(wizard.step(), WizardStep::SelectTemplate);
        assert_eq!(wizard.state().error.as_deref(), Some("not a directory"));
        assert!(!wizard.state().is_resolving());
    }

    #[test]
    fn empty_file_selection_cannot_advance() {
        let mut wizard = wizard_at_tree();
        wizard.select_all_files(false).unwrap();
        assert!(matches!(
            wizard.advance(),
            Err(WorkflowError::NoFilesSelected)
        ));
        assert_eq!(wizard.step(), WizardStep::BrowseTree);
    }

    #[test]
    fn local_template_is_excluded_from_targets() {
        let mut wizard = wizard_at_tree();
        wizard.advance().unwrap();
        assert_eq!(
            wizard.candidates(),
            vec![&PathBuf::from("/src/app"), &PathBuf::from("/src/lib")]
        );
        assert!(matches!(
            wizard.toggle_target(PathBuf::from("/src/tmpl")),
            Err(WorkflowError::TargetIsTemplate(_))
        ));
        assert!(matches!(
            wizard.advance(),
            Err(WorkflowError::NoTargetsSelected)
        ));
    }

    #[test]
    fn back_walks_to_previous_step_only_where_allowed() {
        let mut wizard = wizard_at_tree();
        wizard.advance().unwrap();
        wizard.back().unwrap();
        assert_eq!(wizard.step(), WizardStep::BrowseTree);
        wizard.back().unwrap();
        assert_eq!(wizard.step(), WizardStep::SelectTemplate);
        assert!(wizard.back().is_err());
    }

    #[test]
    fn job_lifecycle_through_summary_and_reset() {
        let mut wizard = wizard_at_tree();
        wizard.advance().unwrap();
        wizard.toggle_target(PathBuf::from("/src/app")).unwrap();
        let effects = wizard.advance().unwrap();
        let Some(WizardEffect::StartJob { job, .. }) = effects.into_iter().next() else {
            panic!("expected job start");
        };
        assert_eq!(job.targets, vec![PathBuf::from("/src/app")]);
        assert_eq!(job.files, vec!["b/c.txt", "a.txt"]);
        assert_eq!(wizard.step(), WizardStep::Syncing);

        let follow = wizard.on_job_message(JobMessage::Conflict(FileConflict {
            file: "a.txt".into(),
            target: PathBuf::from("/src/app"),
        }));
        assert!(follow.is_empty());
        let follow = wizard.decide_conflict(FileConflictAction::OverwriteAll).unwrap();
        assert!(matches!(follow[0], WizardEffect::AwaitMessage(_)));
        assert!(wizard.state().overwrite_all);
        assert!(wizard.decide_conflict(FileConflictAction::Skip).is_err());

        wizard.on_job_message(JobMessage::Summary(TemplateSummary {
            synced: 2,
            ..TemplateSummary::default()
        }));
        assert_eq!(wizard.step(), WizardStep::Complete);
        assert_eq!(wizard.state().counters.synced, 2);

        wizard.advance().unwrap();
        assert_eq!(wizard.step(), WizardStep::SelectTemplate);
        assert!(wizard.state().tree.is_none());
        assert!(!wizard.state().overwrite_all);
        assert_eq!(wizard.candidates().len(), 3);
    }

    #[test]
    fn reset_from_target_step_clears_everything() {
        let mut wizard = wizard_at_tree();
        wizard.advance().unwrap();
        wizard.toggle_target(PathBuf::from("/src/app")).unwrap();
        wizard.state.overwrite_all = true;
        wizard.state.skip_all = true;
        assert_eq!(wizard.step(), WizardStep::SelectTargets);
        assert!(!wizard.state().selected_files.is_empty());

        wizard.reset();
        let state = wizard.state();
        assert_eq!(state.step, WizardStep::SelectTemplate);
        assert!(state.selected_files.is_empty());
        assert!(state.selected_targets.is_empty());
        assert!(!state.overwrite_all);
        assert!(!state.skip_all);
        assert!(state.source.is_none());
        assert!(state.tree.is_none());
        assert!(!state.is_resolving());

        wizard.reset();
        assert_eq!(wizard.step(), WizardStep::SelectTemplate);
        assert_eq!(wizard.recent(), ["/src/tmpl"]);
    }

    #[test]
    fn summary_line_prefers_errors_then_skips() {
        let c = SyncCounters {
            synced: 3,
            skipped: 1,
            errors: 1,
        };
        assert!(summary_line(&c).starts_with("Completed with 1 error"));
        let c = SyncCounters {
            errors: 0,
            ..c
        };
        assert!(summary_line(&c).contains("skipped 1"));
        assert_eq!(
            summary_line(&SyncCounters {
                synced: 3,
                ..SyncCounters::default()
            }),
            "Successfully synced 3 file(s)"
        );
    }
}
