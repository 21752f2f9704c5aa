use super::*;

mod dialogs;
mod repos;
mod template;

impl TuiApp {
    /// Maps one key press to workflow events. Returns `true` to quit.
    pub(in crate::tui) fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(true);
        }
        if self.show_help {
            self.show_help = false;
            return Ok(false);
        }
        if self.owner_picker.is_some() {
            self.handle_owner_picker(key);
            return Ok(false);
        }
        if self.settings.is_some() {
            self.handle_settings(key);
            return Ok(false);
        }
        if self
            .controller
            .queue()
            .and_then(|queue| queue.pending_prompt())
            .is_some()
        {
            self.handle_exists_prompt(key);
            return Ok(false);
        }
        if self.controller.wizard().state().pending_conflict.is_some() {
            self.handle_file_conflict(key);
            return Ok(false);
        }
        if self.template_complete() {
            if key.code == KeyCode::Char('q') {
                return Ok(true);
            }
            self.start_template_over();
            return Ok(false);
        }
        if self.editing_template() {
            self.handle_template_input(key);
            return Ok(false);
        }
        if self.searching {
            self.handle_search(key);
            return Ok(false);
        }

        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab => self.send(WorkflowEvent::NextMode),
            KeyCode::BackTab => self.send(WorkflowEvent::PrevMode),
            KeyCode::Char(ch) if Mode::from_shortcut(ch).is_some() => {
                if let Some(mode) = Mode::from_shortcut(ch) {
                    self.send(WorkflowEvent::SwitchMode(mode));
                }
            }
            _ => match self.controller.mode() {
                Mode::Template => self.handle_template(key),
                Mode::Personal | Mode::Organization | Mode::Local => self.handle_repos(key),
            },
        }
        Ok(false)
    }

    fn template_complete(&self) -> bool {
        self.controller.mode() == Mode::Template
            && self.controller.wizard().step() == WizardStep::Complete
    }

    /// The template selector owns the keyboard while it is on screen.
    pub(in crate::tui) fn editing_template(&self) -> bool {
        self.controller.mode() == Mode::Template
            && self.controller.wizard().step() == WizardStep::SelectTemplate
    }
}
