use crate::config::{AppConfig, ConfigStore, EnvOverrides, Settings};
use crate::event::{Command, Event};
use crate::model::{RepoScope, SourceKind, TemplateOrigin};
use crate::paths::home_dir;
use crate::provider::{RepoSource, TemplateSource};
use crate::sync_queue::{ItemOutcome, run_item, run_refresh};
use crate::template_job::run_job;
use crate::template_wizard::{ResolvedTemplate, TemplateRequest};
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Adapters and settings the commands run against.
#[derive(Clone)]
pub struct Services {
    pub remote: Arc<dyn RepoSource>,
    pub local: Arc<dyn RepoSource>,
    pub templates: Arc<dyn TemplateSource>,
    pub store: Option<ConfigStore>,
}

impl Services {
    fn source(&self, kind: SourceKind) -> &dyn RepoSource {
        match kind {
            SourceKind::Remote => self.remote.as_ref(),
            SourceKind::Local => self.local.as_ref(),
        }
    }

    /// Runs one command to completion on the calling thread. The template
    /// job itself is the exception: it gets its own thread and reports
    /// through the progress bridge.
    pub fn execute(&self, command: Command) -> Option<Event> {
        debug!(command = command.label(), "Executing command");
        match command {
            Command::LoadOrganizations => Some(Event::OrganizationsLoaded(
                self.remote.list_organizations().map_err(error_text),
            )),
            Command::LoadRepositories { load, scope } => {
                let kind = match scope {
                    RepoScope::LocalPaths(_) => SourceKind::Local,
                    RepoScope::Personal(_) | RepoScope::Organization(_) => SourceKind::Remote,
                };
                let result = self
                    .source(kind)
                    .list_repositories(&scope)
                    .map_err(error_text);
                Some(Event::RepositoriesLoaded { load, result })
            }
            Command::LoadTemplateTargets(source_dirs) => {
                let result = self
                    .local
                    .list_repositories(&RepoScope::LocalPaths(source_dirs))
                    .map(|repos| repos.into_iter().map(|repo| PathBuf::from(repo.id)).collect())
                    .map_err(error_text);
                Some(Event::TemplateTargetsLoaded(result))
            }
            Command::SyncItem(job) => {
                let outcome = run_item(self.source(job.kind), &job);
                Some(Event::SyncItemFinished {
                    index: job.index,
                    outcome,
                })
            }
            Command::RefreshItem(job) => {
                let result = run_refresh(self.source(job.kind), &job);
                Some(Event::SyncItemFinished {
                    index: job.index,
                    outcome: ItemOutcome::Finished(result),
                })
            }
            Command::ResolveTemplate {
                generation,
                request,
            } => {
                let key = request.recent_key();
                let result = self.resolve_template(request).map_err(error_text);
                Some(Event::TemplateResolved {
                    generation,
                    key,
                    result,
                })
            }
            Command::RecordRecentTemplate(key) => {
                if let Some(store) = &self.store
                    && let Err(err) = store.record_recent_template(&key)
                {
                    warn!(error = %format!("{err:#}"), "Failed to save recent templates");
                }
                None
            }
            Command::RecordRecentOwner(owner) => {
                if let Some(store) = &self.store
                    && let Err(err) = store.record_recent_owner(&owner)
                {
                    warn!(error = %format!("{err:#}"), "Failed to save recent owners");
                }
                None
            }
            Command::StartTemplateJob { job, worker } => {
                let templates = Arc::clone(&self.templates);
                thread::spawn(move || {
                    run_job(job, templates.as_ref(), worker);
                });
                None
            }
            Command::AwaitTemplateMessage(inbox) => Some(match inbox.wait_next() {
                Some(message) => Event::TemplateMessage(message),
                None => Event::TemplateQueueClosed,
            }),
            Command::SaveSettings(settings) => Some(Event::SettingsSaved(
                self.save_settings(&settings).map_err(error_text),
            )),
        }
    }

    /// Persists the form and re-resolves the effective config, so
    /// environment overrides still win.
    fn save_settings(&self, settings: &Settings) -> anyhow::Result<AppConfig> {
        let store = self.store.as_ref().context("no config file is available")?;
        let persisted = store
            .save_settings(settings)
            .with_context(|| format!("failed to write {}", store.path().display()))?;
        Ok(AppConfig::resolve(
            &EnvOverrides::from_env(),
            &persisted,
            home_dir().as_deref(),
        ))
    }

    fn resolve_template(&self, request: TemplateRequest) -> anyhow::Result<ResolvedTemplate> {
        match request {
            TemplateRequest::GitHub { owner, repo } => {
                let branch = self
                    .templates
                    .resolve_default_branch(&owner, &repo)
                    .context("failed to get default branch")?;
                let tree = self
                    .templates
                    .fetch_tree(&owner, &repo, &branch)
                    .context("failed to get repository tree")?;
                Ok(ResolvedTemplate {
                    origin: TemplateOrigin::GitHub {
                        owner,
                        repo,
                        branch,
                    },
                    tree,
                })
            }
            TemplateRequest::Local(path) => {
                let tree = self.templates.walk_local_directory(&path)?;
                Ok(ResolvedTemplate {
                    origin: TemplateOrigin::Local(path),
                    tree,
                })
            }
        }
    }
}

fn error_text(err: anyhow::Error) -> String {
    format!("{err:#}")
}
