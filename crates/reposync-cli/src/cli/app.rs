use super::*;
use reposync_core::config::{EnvOverrides, PersistedConfig};
use reposync_core::controller::ControllerSettings;
use reposync_core::executor::Services;
use reposync_core::paths::home_dir;
use reposync_providers::{GitHubClient, GitHubSource, GitHubTemplates, LocalSource};
use std::sync::Arc;

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_buffer = LogBuffer::new(LOG_CAPACITY);
    init_tracing(
        &log_buffer,
        log_directive(cli.verbose),
        logs_to_stderr(cli.command.as_ref()),
    );

    info!(command = command_label(cli.command.as_ref()), "Running command");
    match cli.command {
        Some(Commands::Token(args)) => token_cmd::handle_token(args),
        Some(Commands::Github(args)) => launch(StartMode::GitHub(args.owner), log_buffer),
        Some(Commands::Local) => launch(StartMode::Local, log_buffer),
        None => launch(StartMode::Default, log_buffer),
    }
}

/// Logs always feed the in-memory panel; stderr only gets them when the
/// terminal UI is not drawing over it.
fn init_tracing(log_buffer: &LogBuffer, directive: &str, to_stderr: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let stderr_layer =
        to_stderr.then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(logging::LogLayer::new(log_buffer.clone()))
        .init();
}

pub(super) fn log_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Only commands that never open the terminal UI write to stderr.
pub(super) fn logs_to_stderr(command: Option<&Commands>) -> bool {
    matches!(command, Some(Commands::Token(_)))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum StartMode {
    Default,
    GitHub(Option<String>),
    Local,
}

fn launch(start: StartMode, log_buffer: LogBuffer) -> anyhow::Result<()> {
    let store = match ConfigStore::open_default() {
        Ok(store) => Some(store),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "Config directory unavailable; settings will not be saved");
            None
        }
    };
    let config = match &store {
        Some(store) => AppConfig::load(store),
        None => AppConfig::resolve(
            &EnvOverrides::from_env(),
            &PersistedConfig::default(),
            home_dir().as_deref(),
        ),
    };

    let client = match auth::get_token().and_then(GitHubClient::new) {
        Ok(client) => Some(Arc::new(client)),
        Err(err) if matches!(start, StartMode::GitHub(_)) => {
            return Err(err).context("GitHub mode needs a token");
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "GitHub unavailable; starting in local mode");
            None
        }
    };
    let fallback_user = || config.github_owner.clone().unwrap_or_default();
    let username = match &client {
        Some(client) => client.current_user().unwrap_or_else(|err| {
            warn!(error = %format!("{err:#}"), "Failed to get current user");
            fallback_user()
        }),
        None => fallback_user(),
    };

    let requested_owner = match &start {
        StartMode::GitHub(Some(owner)) => Some(owner.clone()),
        _ => config.github_owner.clone(),
    };
    let is_org = match (&client, &requested_owner) {
        (Some(client), Some(owner)) if !owner.eq_ignore_ascii_case(&username) => client
            .list_organizations()
            .map(|orgs| orgs.iter().any(|org| org.eq_ignore_ascii_case(owner)))
            .unwrap_or_else(|err| {
                warn!(error = %format!("{err:#}"), "Could not check owner type");
                false
            }),
        _ => false,
    };
    let mode = start_mode(&start, client.is_some(), is_org);
    info!(mode = %mode, username = %username, owner = ?requested_owner, "Starting session");

    let services = Services {
        remote: Arc::new(GitHubSource::new(client.clone())),
        local: Arc::new(LocalSource::new()),
        templates: Arc::new(GitHubTemplates::new(client)),
        store,
    };
    let settings = ControllerSettings {
        username,
        owner: requested_owner,
        mode,
        target_dir: config.target_dir.clone(),
        source_dirs: config.source_dirs.clone(),
        recent_templates: config.recent_templates.clone(),
    };
    tui::run_tui(
        Launch {
            settings,
            services,
            recent_owners: config.recent_owners,
        },
        log_buffer,
    )
}

pub(super) fn start_mode(start: &StartMode, github_available: bool, owner_is_org: bool) -> Mode {
    match start {
        StartMode::Local => Mode::Local,
        _ if !github_available => Mode::Local,
        _ if owner_is_org => Mode::Organization,
        _ => Mode::Personal,
    }
}
