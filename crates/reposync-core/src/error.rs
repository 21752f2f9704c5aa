use thiserror::Error;

/// Rejections raised by the workflow state machines. These never abort the
/// session; the controller turns them into an inline notice.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("no organizations found - use 'o' to select an owner")]
    NoOrganizations,
    #[error("no repositories selected")]
    NothingSelected,
    #[error("no files selected")]
    NoFilesSelected,
    #[error("no target repositories selected")]
    NoTargetsSelected,
    #[error("{0}")]
    InvalidTemplateInput(String),
    #[error("template is still loading")]
    ResolutionPending,
    #[error("a sync is already running")]
    SyncInProgress,
    #[error("no conflict is waiting for a decision")]
    NoPendingConflict,
    #[error("action not available in this step")]
    StepUnavailable,
    #[error("{0} is the template source and cannot be a target")]
    TargetIsTemplate(String),
}
