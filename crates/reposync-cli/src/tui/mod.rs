use crate::logging::LogBuffer;
use anyhow::Context;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use reposync_core::config::{PersistedConfig, Settings};
use reposync_core::controller::{Controller, ControllerSettings};
use reposync_core::event::{Command, Event as WorkflowEvent};
use reposync_core::executor::Services;
use reposync_core::model::Mode;
use reposync_core::sync_queue::ExistsAction;
use reposync_core::template_job::FileConflictAction;
use reposync_core::template_wizard::WizardStep;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const TICK_RATE: Duration = Duration::from_millis(100);
const LOG_PANEL_HEIGHT: u16 = 8;
const LOG_PANEL_BORDER_HEIGHT: u16 = 2;
const PROGRESS_WIDTH: usize = 30;

/// Label and hint for each settings field, in form order.
const SETTINGS_FIELDS: [(&str, &str); 3] = [
    ("Target directory", "Where repositories are cloned"),
    (
        "Source directories",
        "Colon separated directories scanned for local repositories",
    ),
    ("Default owner", "GitHub user or organization listed at start"),
];

/// Everything the terminal UI needs to start a session.
pub struct Launch {
    pub settings: ControllerSettings,
    pub services: Services,
    pub recent_owners: Vec<String>,
}

pub fn run_tui(launch: Launch, log_buffer: LogBuffer) -> anyhow::Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    info!(mode = %launch.settings.mode, "Starting TUI");
    let result = run_app(&mut terminal, launch, log_buffer);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    if let Err(err) = &result {
        error!(error = %err, "TUI exited with error");
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    launch: Launch,
    log_buffer: LogBuffer,
) -> anyhow::Result<()> {
    let mut app = TuiApp::new(launch, log_buffer);
    app.start();
    let mut last_tick = Instant::now();
    debug!(tick_rate_ms = TICK_RATE.as_millis(), "TUI event loop started");

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && app.handle_key(key)?
        {
            info!("Leaving TUI");
            return Ok(());
        }

        if last_tick.elapsed() >= TICK_RATE {
            last_tick = Instant::now();
        }

        app.poll_workflow_events();
    }
}

mod app_core;
mod draw;
mod handle;
mod helpers;

use helpers::*;

#[derive(Clone, Debug, PartialEq, Eq)]
struct OwnerEntry {
    owner: String,
    is_org: bool,
}

#[derive(Clone, Debug)]
struct OwnerPicker {
    entries: Vec<OwnerEntry>,
    index: usize,
}

#[derive(Clone, Debug)]
struct SettingsForm {
    values: [String; 3],
    index: usize,
    path: Option<PathBuf>,
}

impl SettingsForm {
    fn new(settings: Settings, path: Option<PathBuf>) -> Self {
        Self {
            values: [
                settings.target_dir,
                settings.source_dirs,
                settings.default_owner,
            ],
            index: 0,
            path,
        }
    }

    fn to_settings(&self) -> Settings {
        let [target_dir, source_dirs, default_owner] = self.values.clone();
        Settings {
            target_dir,
            source_dirs,
            default_owner,
        }
    }
}

struct TuiApp {
    controller: Controller,
    services: Arc<Services>,
    events_tx: mpsc::Sender<WorkflowEvent>,
    events_rx: mpsc::Receiver<WorkflowEvent>,
    log_buffer: LogBuffer,
    recent_owners: Vec<String>,
    repo_cursor: usize,
    owner_picker: Option<OwnerPicker>,
    settings: Option<SettingsForm>,
    searching: bool,
    template_input: String,
    template_local: bool,
    suggestion_index: Option<usize>,
    tree_cursor: usize,
    target_cursor: usize,
    show_help: bool,
}
