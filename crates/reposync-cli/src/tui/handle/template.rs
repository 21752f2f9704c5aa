use super::*;

impl TuiApp {
    pub(in crate::tui) fn handle_template_input(&mut self, key: KeyEvent) {
        if self.controller.wizard().state().is_resolving() {
            if key.code == KeyCode::Esc {
                self.send(WorkflowEvent::CancelTemplateResolution);
            }
            return;
        }
        match key.code {
            KeyCode::BackTab => self.send(WorkflowEvent::PrevMode),
            KeyCode::Tab => {
                self.template_local = !self.template_local;
                self.suggestion_index = None;
            }
            KeyCode::Esc => {
                self.template_input.clear();
                self.suggestion_index = None;
            }
            KeyCode::Up | KeyCode::Down => {
                let suggestions = self.template_suggestions();
                let delta = if key.code == KeyCode::Up { -1 } else { 1 };
                self.suggestion_index = wrap_index(self.suggestion_index, delta, suggestions.len());
                if let Some(choice) = self.suggestion_index.and_then(|i| suggestions.get(i)) {
                    self.template_input = choice.clone();
                }
            }
            KeyCode::Backspace => {
                self.template_input.pop();
                self.suggestion_index = None;
            }
            KeyCode::Enter => {
                self.tree_cursor = 0;
                self.send(WorkflowEvent::SubmitTemplate {
                    input: self.template_input.clone(),
                    local: self.template_local,
                });
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.template_input.push(ch);
                self.suggestion_index = None;
            }
            _ => {}
        }
    }

    pub(in crate::tui) fn handle_template(&mut self, key: KeyEvent) {
        match self.controller.wizard().step() {
            WizardStep::SelectTemplate => self.handle_template_input(key),
            WizardStep::BrowseTree => self.handle_tree(key),
            WizardStep::SelectTargets => self.handle_targets(key),
            WizardStep::Syncing => {}
            WizardStep::Complete => self.start_template_over(),
        }
    }

    /// Any key on the summary returns to a fresh template selector.
    pub(in crate::tui) fn start_template_over(&mut self) {
        self.tree_cursor = 0;
        self.target_cursor = 0;
        self.send(WorkflowEvent::AdvanceWizard);
    }

    fn current_tree_row(&self) -> Option<(String, bool, bool)> {
        let tree = self.controller.wizard().state().tree.as_ref()?;
        let rows = tree.visible_rows();
        let row = rows.get(self.tree_cursor)?;
        Some((row.node.path.clone(), row.node.is_dir, row.node.expanded))
    }

    fn handle_tree(&mut self, key: KeyEvent) {
        let rows = self.tree_rows_len();
        let current = self.current_tree_row();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.tree_cursor = self.tree_cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.tree_cursor + 1 < rows {
                    self.tree_cursor += 1;
                }
            }
            KeyCode::Home => self.tree_cursor = 0,
            KeyCode::End => self.tree_cursor = rows.saturating_sub(1),
            KeyCode::Char(' ') => {
                if let Some((path, _, _)) = current {
                    self.send(WorkflowEvent::ToggleTreeNode(path));
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if let Some((path, true, _)) = current {
                    self.send(WorkflowEvent::SetTreeExpanded {
                        path,
                        expanded: true,
                    });
                }
            }
            KeyCode::Left | KeyCode::Char('h') => match current {
                Some((path, true, true)) => self.send(WorkflowEvent::SetTreeExpanded {
                    path,
                    expanded: false,
                }),
                Some((path, _, _)) => self.jump_to_parent(&path),
                None => {}
            },
            KeyCode::Char('a') => self.send(WorkflowEvent::SelectAllFiles(true)),
            KeyCode::Char('n') => self.send(WorkflowEvent::SelectAllFiles(false)),
            KeyCode::Char('e') => self.send(WorkflowEvent::ExpandAll(true)),
            KeyCode::Char('c') => {
                self.tree_cursor = 0;
                self.send(WorkflowEvent::ExpandAll(false));
            }
            KeyCode::Enter => {
                self.target_cursor = 0;
                self.send(WorkflowEvent::AdvanceWizard);
            }
            KeyCode::Esc | KeyCode::Backspace => self.send(WorkflowEvent::WizardBack),
            _ => {}
        }
    }

    fn jump_to_parent(&mut self, path: &str) {
        let Some((parent, _)) = path.rsplit_once('/') else {
            return;
        };
        let position = self.controller.wizard().state().tree.as_ref().and_then(|tree| {
            tree.visible_rows()
                .iter()
                .position(|row| row.node.path == parent)
        });
        if let Some(position) = position {
            self.tree_cursor = position;
        }
    }

    fn handle_targets(&mut self, key: KeyEvent) {
        let candidates: Vec<PathBuf> = self
            .controller
            .wizard()
            .candidates()
            .into_iter()
            .cloned()
            .collect();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.target_cursor = self.target_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.target_cursor + 1 < candidates.len() {
                    self.target_cursor += 1;
                }
            }
            KeyCode::Char(' ') => {
                if let Some(path) = candidates.get(self.target_cursor) {
                    self.send(WorkflowEvent::ToggleTarget(path.clone()));
                }
            }
            KeyCode::Char('a') => self.send(WorkflowEvent::SelectAllTargets(true)),
            KeyCode::Char('n') => self.send(WorkflowEvent::SelectAllTargets(false)),
            KeyCode::Char('r') => self.send(WorkflowEvent::Reload),
            KeyCode::Char('c') => self.open_settings(),
            KeyCode::Enter => self.send(WorkflowEvent::AdvanceWizard),
            KeyCode::Esc | KeyCode::Backspace => self.send(WorkflowEvent::WizardBack),
            _ => {}
        }
    }
}
