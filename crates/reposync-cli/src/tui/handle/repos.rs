use super::*;

impl TuiApp {
    pub(in crate::tui) fn handle_repos(&mut self, key: KeyEvent) {
        if self.controller.last_results().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.send(WorkflowEvent::DismissResults);
            }
            return;
        }
        let count = self.controller.repos().visible().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.repo_cursor = self.repo_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.repo_cursor + 1 < count {
                    self.repo_cursor += 1;
                }
            }
            KeyCode::Home => self.repo_cursor = 0,
            KeyCode::End => self.repo_cursor = count.saturating_sub(1),
            KeyCode::Char(' ') => {
                let id = self
                    .controller
                    .repos()
                    .visible()
                    .get(self.repo_cursor)
                    .map(|repo| repo.id.clone());
                if let Some(id) = id {
                    self.send(WorkflowEvent::ToggleRepo(id));
                }
            }
            KeyCode::Char('a') => self.send(WorkflowEvent::SelectAllRepos),
            KeyCode::Char('n') => self.send(WorkflowEvent::ClearRepoSelection),
            KeyCode::Enter => self.send(WorkflowEvent::StartSync),
            KeyCode::Char('r') => {
                self.repo_cursor = 0;
                self.send(WorkflowEvent::Reload);
            }
            KeyCode::Char('o') if self.controller.mode() != Mode::Local => {
                self.open_owner_picker();
            }
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Char('s') => {
                self.repo_cursor = 0;
                self.send(WorkflowEvent::CycleRepoSort);
            }
            KeyCode::Char('c') => self.open_settings(),
            _ => {}
        }
    }

    /// Typing narrows the list live; Enter keeps the filter, Esc drops it.
    pub(in crate::tui) fn handle_search(&mut self, key: KeyEvent) {
        let mut query = self.controller.repos().filter().to_string();
        match key.code {
            KeyCode::Enter => {
                self.searching = false;
                return;
            }
            KeyCode::Esc => {
                self.searching = false;
                query.clear();
            }
            KeyCode::Backspace => {
                query.pop();
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => query.push(ch),
            _ => return,
        }
        self.repo_cursor = 0;
        self.send(WorkflowEvent::SetRepoFilter(query));
    }
}
