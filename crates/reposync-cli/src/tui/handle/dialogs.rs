use super::*;

impl TuiApp {
    pub(in crate::tui) fn open_owner_picker(&mut self) {
        let entries = self.owner_entries();
        let index = entries
            .iter()
            .position(|entry| entry.owner == self.controller.owner())
            .unwrap_or(0);
        self.owner_picker = Some(OwnerPicker { entries, index });
    }

    pub(in crate::tui) fn handle_owner_picker(&mut self, key: KeyEvent) {
        let Some(picker) = self.owner_picker.as_mut() else {
            return;
        };
        let len = picker.entries.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.owner_picker = None,
            KeyCode::Up | KeyCode::Char('k') => {
                picker.index = wrap_index(Some(picker.index), -1, len).unwrap_or(0);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                picker.index = wrap_index(Some(picker.index), 1, len).unwrap_or(0);
            }
            KeyCode::Enter => {
                let chosen = picker.entries.get(picker.index).cloned();
                self.owner_picker = None;
                if let Some(entry) = chosen {
                    self.repo_cursor = 0;
                    self.send(WorkflowEvent::SelectOwner {
                        owner: entry.owner,
                        is_org: entry.is_org,
                    });
                }
            }
            _ => {}
        }
    }

    pub(in crate::tui) fn handle_exists_prompt(&mut self, key: KeyEvent) {
        let action = match key.code {
            KeyCode::Char('s') => ExistsAction::Skip,
            KeyCode::Char('r') => ExistsAction::Refresh,
            KeyCode::Char('S') => ExistsAction::SkipAll,
            KeyCode::Char('R') => ExistsAction::RefreshAll,
            _ => return,
        };
        self.send(WorkflowEvent::ExistsDecision(action));
    }

    pub(in crate::tui) fn handle_file_conflict(&mut self, key: KeyEvent) {
        let action = match key.code {
            KeyCode::Char('o') => FileConflictAction::Overwrite,
            KeyCode::Char('s') => FileConflictAction::Skip,
            KeyCode::Char('O') => FileConflictAction::OverwriteAll,
            KeyCode::Char('S') => FileConflictAction::SkipAll,
            _ => return,
        };
        self.send(WorkflowEvent::TemplateConflictDecision(action));
    }

    pub(in crate::tui) fn open_settings(&mut self) {
        if self.controller.sync_running() {
            return;
        }
        let store = self.services.store.as_ref();
        let persisted = match store.map(|store| store.load()) {
            Some(Ok(config)) => config,
            Some(Err(err)) => {
                warn!(error = %format!("{err:#}"), "Config unreadable; editing defaults");
                PersistedConfig::default()
            }
            None => PersistedConfig::default(),
        };
        self.settings = Some(SettingsForm::new(
            Settings::from_persisted(&persisted),
            store.map(|store| store.path().to_path_buf()),
        ));
    }

    pub(in crate::tui) fn handle_settings(&mut self, key: KeyEvent) {
        let Some(form) = self.settings.as_mut() else {
            return;
        };
        let last = form.values.len() - 1;
        match key.code {
            KeyCode::Esc => self.settings = None,
            KeyCode::Enter => {
                let settings = form.to_settings();
                self.settings = None;
                self.send(WorkflowEvent::SaveSettings(settings));
            }
            KeyCode::Up | KeyCode::BackTab => form.index = form.index.saturating_sub(1),
            KeyCode::Down | KeyCode::Tab => form.index = (form.index + 1).min(last),
            KeyCode::Backspace => {
                form.values[form.index].pop();
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                form.values[form.index].push(ch);
            }
            _ => {}
        }
    }
}
