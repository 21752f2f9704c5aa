use crate::model::TemplateOrigin;
use crate::progress::WorkerEnds;
use crate::provider::TemplateSource;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileConflictAction {
    Overwrite,
    Skip,
    OverwriteAll,
    SkipAll,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TemplateProgress {
    pub current: usize,
    pub total: usize,
    pub file: String,
    pub target: PathBuf,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileConflict {
    pub file: String,
    pub target: PathBuf,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileFailure {
    pub file: String,
    pub target: PathBuf,
    pub error: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TemplateSummary {
    pub synced: usize,
    pub skipped: usize,
    pub errors: usize,
    pub failures: Vec<FileFailure>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JobMessage {
    Progress(TemplateProgress),
    Conflict(FileConflict),
    Summary(TemplateSummary),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TemplateJob {
    pub origin: TemplateOrigin,
    pub files: Vec<String>,
    pub targets: Vec<PathBuf>,
    pub overwrite_all: bool,
    pub skip_all: bool,
}

#[derive(Debug)]
enum FileOutcome {
    Synced,
    Skipped,
}

/// Copies every selected file into every target, targets outer and files
/// inner. Existing files are resolved by the sticky flags or by asking the
/// controller through the bridge. Always finishes with a summary, then
/// closes the queue by dropping its sender.
pub fn run_job(job: TemplateJob, source: &dyn TemplateSource, ends: WorkerEnds) -> TemplateSummary {
    let WorkerEnds { outbox, decisions } = ends;
    let total = job.files.len() * job.targets.len();
    let mut overwrite_all = job.overwrite_all;
    let mut skip_all = job.skip_all;
    let mut summary = TemplateSummary::default();
    let mut current = 0;

    info!(
        template = %job.origin.display_name(),
        files = job.files.len(),
        targets = job.targets.len(),
        "Starting template sync"
    );

    for target in &job.targets {
        for file in &job.files {
            current += 1;
            let dest = destination(target, file);
            let outcome = if dest.exists() {
                let overwrite = if overwrite_all {
                    true
                } else if skip_all {
                    false
                } else {
                    let conflict = FileConflict {
                        file: file.clone(),
                        target: target.clone(),
                    };
                    if outbox.send(JobMessage::Conflict(conflict)).is_err() {
                        warn!("Progress queue closed; skipping conflicting file");
                        false
                    } else {
                        match decisions.recv() {
                            Ok(FileConflictAction::Overwrite) => true,
                            Ok(FileConflictAction::OverwriteAll) => {
                                overwrite_all = true;
                                true
                            }
                            Ok(FileConflictAction::SkipAll) => {
                                skip_all = true;
                                false
                            }
                            Ok(FileConflictAction::Skip) | Err(_) => false,
                        }
                    }
                };
                if overwrite {
                    copy_file(source, &job.origin, file, &dest).map(|_| FileOutcome::Synced)
                } else {
                    Ok(FileOutcome::Skipped)
                }
            } else {
                copy_file(source, &job.origin, file, &dest).map(|_| FileOutcome::Synced)
            };

            match outcome {
                Ok(FileOutcome::Synced) => summary.synced += 1,
                Ok(FileOutcome::Skipped) => summary.skipped += 1,
                Err(err) => {
                    warn!(file = %file, target = %target.display(), error = %format!("{err:#}"), "Template file failed");
                    summary.errors += 1;
                    summary.failures.push(FileFailure {
                        file: file.clone(),
                        target: target.clone(),
                        error: format!("{err:#}"),
                    });
                }
            }

            let _ = outbox.send(JobMessage::Progress(TemplateProgress {
                current,
                total,
                file: file.clone(),
                target: target.clone(),
            }));
        }
    }

    info!(
        synced = summary.synced,
        skipped = summary.skipped,
        errors = summary.errors,
        "Template sync finished"
    );
    let _ = outbox.send(JobMessage::Summary(summary.clone()));
    summary
}

fn destination(target: &Path, file: &str) -> PathBuf {
    file.split('/')
        .filter(|part| !part.is_empty())
        .fold(target.to_path_buf(), |path, part| path.join(part))
}

fn copy_file(
    source: &dyn TemplateSource,
    origin: &TemplateOrigin,
    file: &str,
    dest: &Path,
) -> anyhow::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    match origin {
        TemplateOrigin::Local(root) => {
            let src = destination(root, file);
            fs::copy(&src, dest)
                .with_context(|| format!("failed to copy {}", src.display()))?;
        }
        TemplateOrigin::GitHub { .. } => {
            let bytes = source
                .read_file(origin, file)
                .with_context(|| format!("failed to fetch {file}"))?;
            fs::write(dest, bytes)
                .with_context(|| format!("failed to write {}", dest.display()))?;
        }
    }
    Ok(())
}
