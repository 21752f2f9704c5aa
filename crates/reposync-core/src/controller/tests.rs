use super::*;
use crate::config::{ConfigStore, Settings};
use crate::executor::Services;
use crate::sync_queue::ExistsAction;
use crate::template_job::FileConflictAction;
use crate::template_wizard::WizardStep;
use crate::testing::{FakeRepoSource, FakeTemplateSource};
use std::collections::VecDeque;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    controller: Controller,
    services: Services,
    remote: Arc<FakeRepoSource>,
    local: Arc<FakeRepoSource>,
}

impl Harness {
    fn new(remote: FakeRepoSource, local: FakeRepoSource, mode: Mode) -> Self {
        let remote = Arc::new(remote);
        let local = Arc::new(local);
        let services = Services {
            remote: remote.clone(),
            local: local.clone(),
            templates: Arc::new(FakeTemplateSource::new(&[("README.md", "hi")])),
            store: None,
        };
        let mut controller = Controller::new(ControllerSettings {
            username: "octo".into(),
            owner: None,
            mode,
            target_dir: PathBuf::from("/t"),
            source_dirs: vec![PathBuf::from("/src")],
            recent_templates: Vec::new(),
        });
        let commands = controller.start();
        let mut harness = Self {
            controller,
            services,
            remote,
            local,
        };
        harness.drive(commands);
        harness
    }

    fn send(&mut self, event: Event) {
        let commands = self.controller.handle(event);
        self.drive(commands);
    }

    /// Runs commands inline until nothing is left; the template job thread
    /// is the only concurrency.
    fn drive(&mut self, commands: Vec<Command>) {
        let mut pending: VecDeque<Command> = commands.into();
        while let Some(command) = pending.pop_front() {
            if let Some(event) = self.services.execute(command) {
                let next = self.controller.handle(event);
                let in_flight = next
                    .iter()
                    .filter(|c| matches!(c, Command::SyncItem(_) | Command::RefreshItem(_)))
                    .count();
                assert!(in_flight <= 1, "more than one repository operation issued");
                pending.extend(next);
            }
        }
    }
}

fn remote_with(ids: &[&str]) -> FakeRepoSource {
    FakeRepoSource::remote().with_repos(ids)
}

#[test]
fn start_loads_organizations_and_repositories() {
    let h = Harness::new(
        remote_with(&["octo/a", "octo/b"]).with_orgs(&["acme"]),
        FakeRepoSource::local(),
        Mode::Personal,
    );
    assert_eq!(h.controller.organizations(), ["acme"]);
    assert_eq!(h.controller.repos().items().len(), 2);
    assert!(!h.controller.repos().is_loading());
}

#[test]
fn organization_mode_without_orgs_shows_notice() {
    let mut h = Harness::new(remote_with(&["octo/a"]), FakeRepoSource::local(), Mode::Personal);
    h.send(Event::SwitchMode(Mode::Organization));
    assert_eq!(h.controller.mode(), Mode::Personal);
    assert_eq!(
        h.controller.notice(),
        Some("no organizations found - use 'o' to select an owner")
    );
    h.send(Event::ToggleRepo("octo/a".into()));
    assert_eq!(h.controller.notice(), None);
}

#[test]
fn organization_mode_lists_first_org() {
    let mut h = Harness::new(
        remote_with(&["acme/x"]).with_orgs(&["acme", "initech"]),
        FakeRepoSource::local(),
        Mode::Personal,
    );
    h.send(Event::SwitchMode(Mode::Organization));
    assert_eq!(h.controller.owner(), "acme");
    assert!(
        h.remote
            .calls()
            .contains(&"list Organization(\"acme\")".to_string())
    );
}

#[test]
fn conflict_pauses_queue_until_decision() {
    let mut h = Harness::new(
        remote_with(&["octo/a", "octo/b", "octo/c"]),
        FakeRepoSource::local(),
        Mode::Personal,
    );
    h.remote.add_existing("/t/b");
    for id in ["octo/a", "octo/b", "octo/c"] {
        h.send(Event::ToggleRepo(id.into()));
    }
    h.send(Event::StartSync);

    let queue = h.controller.queue().unwrap();
    assert_eq!(queue.pending_prompt().unwrap().repo, "b");
    assert_eq!(queue.cursor(), 1);
    assert_eq!(h.remote.calls().iter().filter(|c| c.starts_with("clone")).count(), 1);

    h.send(Event::ExistsDecision(ExistsAction::Skip));
    assert!(h.controller.queue().is_none());
    assert_eq!(
        h.controller.last_results().unwrap(),
        [
            SyncResult::synced("a"),
            SyncResult::skipped("b"),
            SyncResult::synced("c"),
        ]
    );
    assert!(h.controller.repos().selected().is_empty());
}

#[test]
fn refresh_all_applies_to_later_conflicts() {
    let mut h = Harness::new(
        remote_with(&["octo/a", "octo/b", "octo/c"]),
        FakeRepoSource::local(),
        Mode::Personal,
    );
    h.remote.add_existing("/t/a");
    h.remote.add_existing("/t/c");
    h.send(Event::SelectAllRepos);
    h.send(Event::StartSync);
    h.send(Event::ExistsDecision(ExistsAction::RefreshAll));

    let results = h.controller.last_results().unwrap();
    assert!(results.iter().all(|r| r.success && !r.skipped));
    let calls: Vec<String> = h
        .remote
        .calls()
        .into_iter()
        .filter(|c| !c.starts_with("list"))
        .collect();
    assert_eq!(calls, vec!["refresh /t/a", "clone octo/b", "refresh /t/c"]);
}

#[test]
fn clone_failure_is_recorded_and_queue_continues() {
    let mut h = Harness::new(
        remote_with(&["octo/a", "octo/b"]).failing_on("octo/a"),
        FakeRepoSource::local(),
        Mode::Personal,
    );
    h.send(Event::SelectAllRepos);
    h.send(Event::StartSync);
    let results = h.controller.last_results().unwrap();
    assert!(!results[0].success);
    assert!(results[0].error.as_deref().unwrap().contains("clone failed"));
    assert!(results[1].success);
}

#[test]
fn invalid_identifier_fails_synchronously() {
    let mut h = Harness::new(remote_with(&["broken"]), FakeRepoSource::local(), Mode::Personal);
    h.send(Event::ToggleRepo("broken".into()));
    h.send(Event::StartSync);
    let results = h.controller.last_results().unwrap();
    assert_eq!(results.len(), 1);
    assert!(
        results[0]
            .error
            .as_deref()
            .unwrap()
            .starts_with("invalid repository format")
    );
    assert!(h.remote.calls().iter().all(|c| !c.starts_with("clone")));
}

#[test]
fn empty_selection_is_rejected() {
    let mut h = Harness::new(remote_with(&["octo/a"]), FakeRepoSource::local(), Mode::Personal);
    h.send(Event::StartSync);
    assert_eq!(h.controller.notice(), Some("no repositories selected"));
}

#[test]
fn mode_switch_is_blocked_while_prompting() {
    let mut h = Harness::new(remote_with(&["octo/a"]), FakeRepoSource::local(), Mode::Personal);
    h.remote.add_existing("/t/a");
    h.send(Event::ToggleRepo("octo/a".into()));
    h.send(Event::StartSync);
    h.send(Event::SwitchMode(Mode::Local));
    assert_eq!(h.controller.mode(), Mode::Personal);
    assert_eq!(h.controller.notice(), Some("a sync is already running"));
}

#[test]
fn skip_all_skips_later_conflicts_and_clones_the_rest() {
    let mut h = Harness::new(
        remote_with(&["alice/repo1", "alice/repo2", "alice/repo3"]),
        FakeRepoSource::local(),
        Mode::Personal,
    );
    h.remote.add_existing("/t/repo1");
    h.remote.add_existing("/t/repo3");
    h.send(Event::SelectAllRepos);
    h.send(Event::StartSync);
    assert_eq!(
        h.controller.queue().unwrap().pending_prompt().unwrap().repo,
        "repo1"
    );

    h.send(Event::ExistsDecision(ExistsAction::SkipAll));
    assert!(h.controller.queue().is_none());
    assert_eq!(
        h.controller.last_results().unwrap(),
        [
            SyncResult::skipped("repo1"),
            SyncResult::synced("repo2"),
            SyncResult::skipped("repo3"),
        ]
    );
    let clones: Vec<String> = h
        .remote
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("clone"))
        .collect();
    assert_eq!(clones, vec!["clone alice/repo2"]);
}

#[test]
fn filter_limits_select_all_but_keeps_earlier_picks() {
    let mut h = Harness::new(
        remote_with(&["octo/api", "octo/web", "octo/cli"]),
        FakeRepoSource::local(),
        Mode::Personal,
    );
    h.send(Event::ToggleRepo("octo/cli".into()));
    h.send(Event::SetRepoFilter("w".into()));
    h.send(Event::SelectAllRepos);
    assert_eq!(h.controller.repos().selected(), ["octo/cli", "octo/web"]);

    h.send(Event::CycleRepoSort);
    assert_eq!(h.controller.repos().sort(), crate::repo_list::SortMode::Stars);

    h.send(Event::StartSync);
    let results = h.controller.last_results().unwrap();
    assert_eq!(results, [SyncResult::synced("cli"), SyncResult::synced("web")]);
}

#[test]
fn mode_switch_is_blocked_while_template_resolves() {
    let mut h = Harness::new(remote_with(&[]), FakeRepoSource::local(), Mode::Template);
    let pending = h.controller.handle(Event::SubmitTemplate {
        input: "acme/starter".into(),
        local: false,
    });
    h.send(Event::PrevMode);
    h.send(Event::SwitchMode(Mode::Personal));
    assert_eq!(h.controller.mode(), Mode::Template);
    assert_eq!(h.controller.notice(), Some("template is still loading"));

    h.drive(pending);
    assert_eq!(h.controller.wizard().step(), WizardStep::BrowseTree);
}

#[test]
fn saved_settings_apply_and_rescan_local_mode() {
    let tmp = TempDir::new().unwrap();
    let mut h = Harness::new(remote_with(&[]), FakeRepoSource::local(), Mode::Local);
    let store = ConfigStore::new(tmp.path().join("config.json"));
    h.services.store = Some(store.clone());

    h.send(Event::SaveSettings(Settings {
        target_dir: "/work/clones".into(),
        source_dirs: "/work/a:/work/b".into(),
        default_owner: "acme".into(),
    }));
    assert_eq!(h.controller.notice(), None);
    assert_eq!(h.controller.target_dir(), Path::new("/work/clones"));
    assert!(
        h.local
            .calls()
            .contains(&"list LocalPaths([\"/work/a\", \"/work/b\"])".to_string())
    );
    let persisted = store.load().unwrap();
    assert_eq!(persisted.default_owner.as_deref(), Some("acme"));
    assert_eq!(persisted.source_dirs, vec!["/work/a", "/work/b"]);
}

#[test]
fn settings_without_config_file_show_notice() {
    let mut h = Harness::new(remote_with(&[]), FakeRepoSource::local(), Mode::Personal);
    h.send(Event::SaveSettings(Settings::default()));
    assert_eq!(
        h.controller.notice(),
        Some("failed to save settings: no config file is available")
    );
    assert_eq!(h.controller.target_dir(), Path::new("/t"));
}

#[test]
fn stale_repository_lists_are_dropped() {
    let mut h = Harness::new(remote_with(&["octo/a"]), FakeRepoSource::local(), Mode::Personal);
    let first = h.controller.handle(Event::SwitchMode(Mode::Local));
    let second = h.controller.handle(Event::SwitchMode(Mode::Personal));
    // Complete the newer load first, then let the older one arrive late.
    h.drive(second);
    h.drive(first);
    assert_eq!(h.controller.mode(), Mode::Personal);
    assert_eq!(h.controller.repos().items()[0].id, "octo/a");
}

#[test]
fn selecting_owner_records_it_and_reloads() {
    let mut h = Harness::new(remote_with(&["x/a"]), FakeRepoSource::local(), Mode::Personal);
    h.send(Event::SelectOwner {
        owner: "initech".into(),
        is_org: true,
    });
    assert_eq!(h.controller.mode(), Mode::Organization);
    assert!(
        h.remote
            .calls()
            .contains(&"list Organization(\"initech\")".to_string())
    );
}

fn local_targets(paths: &[&std::path::Path]) -> FakeRepoSource {
    let ids: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    FakeRepoSource::local().with_repos(&refs)
}

#[test]
fn template_wizard_end_to_end_with_conflict() {
    let root = TempDir::new().unwrap();
    let template = root.path().join("starter");
    let target = root.path().join("app");
    fs::create_dir_all(template.join(".github")).unwrap();
    fs::write(template.join(".github/ci.yml"), "ci").unwrap();
    fs::write(template.join("LICENSE"), "new").unwrap();
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("LICENSE"), "old").unwrap();

    let mut h = Harness::new(
        remote_with(&[]),
        local_targets(&[template.as_path(), target.as_path()]),
        Mode::Personal,
    );
    h.send(Event::SwitchMode(Mode::Template));
    assert_eq!(h.controller.wizard().candidates().len(), 2);

    h.send(Event::SubmitTemplate {
        input: template.display().to_string(),
        local: true,
    });
    assert_eq!(h.controller.wizard().step(), WizardStep::BrowseTree);
    assert_eq!(h.controller.wizard().candidates(), vec![&target]);

    h.send(Event::AdvanceWizard);
    h.send(Event::ToggleTarget(target.clone()));
    h.send(Event::AdvanceWizard);

    let state = h.controller.wizard().state();
    assert_eq!(state.step, WizardStep::Syncing);
    assert_eq!(
        state.pending_conflict.as_ref().map(|c| c.file.as_str()),
        Some("LICENSE")
    );
    h.send(Event::SwitchMode(Mode::Local));
    assert_eq!(h.controller.mode(), Mode::Template);

    h.send(Event::TemplateConflictDecision(FileConflictAction::Overwrite));
    let state = h.controller.wizard().state();
    assert_eq!(state.step, WizardStep::Complete);
    assert_eq!(state.counters.synced, 2);
    assert_eq!(fs::read_to_string(target.join("LICENSE")).unwrap(), "new");
    assert_eq!(fs::read_to_string(target.join(".github/ci.yml")).unwrap(), "ci");

    h.send(Event::AdvanceWizard);
    assert_eq!(h.controller.wizard().step(), WizardStep::SelectTemplate);
}

#[test]
fn remote_template_resolution_failure_stays_on_selector() {
    let mut h = Harness::new(remote_with(&[]), FakeRepoSource::local(), Mode::Template);
    h.send(Event::SubmitTemplate {
        input: "acme/missing".into(),
        local: false,
    });
    let state = h.controller.wizard().state();
    assert_eq!(state.step, WizardStep::SelectTemplate);
    assert!(
        state
            .error
            .as_deref()
            .unwrap()
            .starts_with("failed to get default branch")
    );
}

#[test]
fn cancelled_resolution_result_is_ignored() {
    let mut h = Harness::new(remote_with(&[]), FakeRepoSource::local(), Mode::Template);
    let commands = h.controller.handle(Event::SubmitTemplate {
        input: "acme/starter".into(),
        local: false,
    });
    h.send(Event::CancelTemplateResolution);
    h.drive(commands);
    assert_eq!(h.controller.wizard().step(), WizardStep::SelectTemplate);
    assert!(h.controller.wizard().recent().is_empty());
}

#[test]
fn remote_template_resolves_and_records_recent() {
    let mut h = Harness::new(remote_with(&[]), FakeRepoSource::local(), Mode::Template);
    h.send(Event::SubmitTemplate {
        input: "acme/starter".into(),
        local: false,
    });
    let wizard = h.controller.wizard();
    assert_eq!(wizard.step(), WizardStep::BrowseTree);
    assert_eq!(wizard.recent(), ["acme/starter"]);
    assert_eq!(
        wizard.state().source,
        Some(crate::model::TemplateOrigin::GitHub {
            owner: "acme".into(),
            repo: "starter".into(),
            branch: "main".into(),
        })
    );
}
