use super::*;

impl TuiApp {
    pub(super) fn new(launch: Launch, log_buffer: LogBuffer) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            controller: Controller::new(launch.settings),
            services: Arc::new(launch.services),
            events_tx,
            events_rx,
            log_buffer,
            recent_owners: launch.recent_owners,
            repo_cursor: 0,
            owner_picker: None,
            settings: None,
            searching: false,
            template_input: String::new(),
            template_local: false,
            suggestion_index: None,
            tree_cursor: 0,
            target_cursor: 0,
            show_help: false,
        }
    }

    pub(super) fn start(&mut self) {
        let commands = self.controller.start();
        self.dispatch(commands);
    }

    /// Feeds one event through the controller and schedules whatever it
    /// asks for.
    pub(in crate::tui) fn send(&mut self, event: WorkflowEvent) {
        let commands = self.controller.handle(event);
        self.dispatch(commands);
        self.clamp_cursors();
    }

    /// Each command runs on its own thread; its follow-up event comes back
    /// through the channel and is picked up on the next tick.
    fn dispatch(&self, commands: Vec<Command>) {
        for command in commands {
            debug!(command = command.label(), "Scheduling command");
            let services = Arc::clone(&self.services);
            let events_tx = self.events_tx.clone();
            thread::spawn(move || {
                if let Some(event) = services.execute(command) {
                    let _ = events_tx.send(event);
                }
            });
        }
    }

    pub(super) fn poll_workflow_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.send(event);
        }
    }

    fn clamp_cursors(&mut self) {
        let repos = self.controller.repos().visible().len();
        self.repo_cursor = self.repo_cursor.min(repos.saturating_sub(1));
        let rows = self.tree_rows_len();
        self.tree_cursor = self.tree_cursor.min(rows.saturating_sub(1));
        let targets = self.controller.wizard().candidates().len();
        self.target_cursor = self.target_cursor.min(targets.saturating_sub(1));
    }

    pub(in crate::tui) fn tree_rows_len(&self) -> usize {
        self.controller
            .wizard()
            .state()
            .tree
            .as_ref()
            .map(|tree| tree.visible_rows().len())
            .unwrap_or(0)
    }

    /// Owners offered by the picker: yourself, your organizations, then
    /// owners picked in earlier sessions.
    pub(in crate::tui) fn owner_entries(&self) -> Vec<OwnerEntry> {
        let mut entries: Vec<OwnerEntry> = Vec::new();
        let mut push = |owner: &str, is_org: bool| {
            if owner.is_empty()
                || entries
                    .iter()
                    .any(|entry| entry.owner.eq_ignore_ascii_case(owner))
            {
                return;
            }
            entries.push(OwnerEntry {
                owner: owner.to_string(),
                is_org,
            });
        };
        push(self.controller.username(), false);
        for org in self.controller.organizations() {
            push(org, true);
        }
        for owner in &self.recent_owners {
            push(owner, false);
        }
        entries
    }

    /// Suggestions under the template input: recent templates for GitHub,
    /// discovered repositories for a local source.
    pub(in crate::tui) fn template_suggestions(&self) -> Vec<String> {
        let wizard = self.controller.wizard();
        if self.template_local {
            let mut suggestions: Vec<String> = wizard
                .recent()
                .iter()
                .filter(|entry| looks_like_path(entry))
                .cloned()
                .collect();
            for candidate in wizard.candidates() {
                let text = candidate.display().to_string();
                if !suggestions.contains(&text) {
                    suggestions.push(text);
                }
            }
            suggestions
        } else {
            wizard
                .recent()
                .iter()
                .filter(|entry| !looks_like_path(entry))
                .cloned()
                .collect()
        }
    }
}
