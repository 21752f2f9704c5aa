use super::*;
use tracing::Level;

mod dialogs;
mod repos;
mod template;

impl TuiApp {
    pub(in crate::tui) fn draw(&mut self, frame: &mut ratatui::Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(LOG_PANEL_HEIGHT),
                Constraint::Length(3),
            ])
            .split(frame.area());

        self.draw_tabs(frame, layout[0]);
        match self.controller.mode() {
            Mode::Template => self.draw_template(frame, layout[1]),
            Mode::Personal | Mode::Organization | Mode::Local => self.draw_repos(frame, layout[1]),
        }
        self.draw_log_panel(frame, layout[2]);
        self.draw_footer(frame, layout[3]);

        let area = frame.area();
        if self.owner_picker.is_some() {
            self.draw_owner_picker(frame, area);
        }
        if self.settings.is_some() {
            self.draw_settings(frame, area);
        }
        if let Some(prompt) = self.controller.queue().and_then(|queue| queue.pending_prompt()) {
            let prompt = prompt.clone();
            self.draw_exists_prompt(frame, area, &prompt);
        }
        if let Some(conflict) = self.controller.wizard().state().pending_conflict.clone() {
            self.draw_file_conflict(frame, area, &conflict);
        }
        if self.show_help {
            self.draw_help(frame, area);
        }
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame, area: Rect) {
        let titles: Vec<Line> = Mode::ALL
            .iter()
            .map(|mode| Line::from(format!("{} {}", mode.shortcut(), mode.label())))
            .collect();
        let selected = Mode::ALL
            .iter()
            .position(|mode| *mode == self.controller.mode())
            .unwrap_or(0);
        let title = if self.controller.username().is_empty() {
            "reposync".to_string()
        } else {
            format!("reposync - {}", self.controller.username())
        };
        let tabs = Tabs::new(titles)
            .select(selected)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(tabs, area);
    }

    fn draw_log_panel(&self, frame: &mut ratatui::Frame, area: Rect) {
        let max_lines = area.height.saturating_sub(LOG_PANEL_BORDER_HEIGHT) as usize;
        let lines: Vec<Line> = self
            .log_buffer
            .tail(max_lines)
            .into_iter()
            .map(|entry| {
                let style = match entry.level {
                    Level::ERROR => Style::default().fg(Color::Red),
                    Level::WARN => Style::default().fg(Color::Yellow),
                    Level::DEBUG | Level::TRACE => Style::default().fg(Color::DarkGray),
                    _ => Style::default(),
                };
                Line::from(Span::styled(entry.line(), style))
            })
            .collect();
        let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Log"));
        frame.render_widget(panel, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame, area: Rect) {
        let footer = match self.controller.notice() {
            Some(notice) => Paragraph::new(Span::styled(
                notice.to_string(),
                Style::default().fg(Color::Red),
            )),
            None => Paragraph::new(self.footer_text()),
        };
        frame.render_widget(
            footer.block(Block::default().borders(Borders::ALL).title("Help")),
            area,
        );
    }

    pub(in crate::tui) fn footer_text(&self) -> String {
        if self.owner_picker.is_some() {
            return "Up/Down: choose | Enter: select owner | Esc: close".to_string();
        }
        if self.settings.is_some() {
            return "Up/Down: field | Enter: save | Esc: cancel".to_string();
        }
        if self.searching {
            return "Type to filter | Enter: keep filter | Esc: clear".to_string();
        }
        if self.controller.queue().and_then(|q| q.pending_prompt()).is_some() {
            return "s: skip | r: refresh | S: skip all | R: refresh all".to_string();
        }
        if self.controller.wizard().state().pending_conflict.is_some() {
            return "o: overwrite | s: skip | O: overwrite all | S: skip all".to_string();
        }
        match self.controller.mode() {
            Mode::Template => match self.controller.wizard().step() {
                WizardStep::SelectTemplate if self.controller.wizard().state().is_resolving() => {
                    "Loading template... | Esc: cancel".to_string()
                }
                WizardStep::SelectTemplate => {
                    "Type owner/repo or a path | Tab: GitHub/local | Up/Down: suggestions | Enter: load | Esc: cancel/clear | Shift-Tab: previous mode"
                        .to_string()
                }
                WizardStep::BrowseTree => {
                    "Space: toggle | Left/Right: collapse/expand | a/n: select all/none | e/c: expand/collapse all | Enter: next | Esc: back"
                        .to_string()
                }
                WizardStep::SelectTargets => {
                    "Space: toggle | a/n: select all/none | r: rescan | c: settings | Enter: sync | Esc: back"
                        .to_string()
                }
                WizardStep::Syncing => "Syncing template files... | q: quit".to_string(),
                WizardStep::Complete => "Any key: start over | q: quit".to_string(),
            },
            Mode::Personal | Mode::Organization | Mode::Local => {
                if self.controller.last_results().is_some() {
                    return "Enter/Esc: dismiss results".to_string();
                }
                let owner = if self.controller.mode() == Mode::Local {
                    ""
                } else {
                    "o: owner | "
                };
                format!(
                    "1-4/Tab: mode | Space: select | a/n: all/none | /: search | s: sort | Enter: sync | r: reload | {owner}c: settings | ?: help | q: quit"
                )
            }
        }
    }
}
