use super::*;
use reposync_core::sync_queue::ConflictPrompt;
use reposync_core::template_job::FileConflict;

impl TuiApp {
    pub(in crate::tui) fn draw_owner_picker(&self, frame: &mut ratatui::Frame, area: Rect) {
        let Some(picker) = &self.owner_picker else {
            return;
        };
        let height = (picker.entries.len() as u16).saturating_add(2).min(16);
        let popup = centered_rect(50, height, area);
        let items: Vec<ListItem> = picker
            .entries
            .iter()
            .map(|entry| {
                let kind = if entry.is_org { "org" } else { "user" };
                ListItem::new(format!("{} ({kind})", entry.owner))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Select owner"))
            .highlight_style(highlight_style())
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(picker.index));
        frame.render_widget(Clear, popup);
        frame.render_stateful_widget(list, popup, &mut state);
    }

    pub(in crate::tui) fn draw_exists_prompt(
        &self,
        frame: &mut ratatui::Frame,
        area: Rect,
        prompt: &ConflictPrompt,
    ) {
        let lines = vec![
            Line::from(Span::styled(
                prompt.repo.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("already exists at {}", prompt.destination.display())),
            Line::from(""),
            Line::from("s: skip   r: refresh   S: skip all   R: refresh all"),
        ];
        self.draw_popup(frame, area, "Repository exists", lines);
    }

    pub(in crate::tui) fn draw_file_conflict(
        &self,
        frame: &mut ratatui::Frame,
        area: Rect,
        conflict: &FileConflict,
    ) {
        let lines = vec![
            Line::from(Span::styled(
                conflict.file.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("already exists in {}", conflict.target.display())),
            Line::from(""),
            Line::from("o: overwrite   s: skip   O: overwrite all   S: skip all"),
        ];
        self.draw_popup(frame, area, "File exists", lines);
    }

    pub(in crate::tui) fn draw_settings(&self, frame: &mut ratatui::Frame, area: Rect) {
        let Some(form) = &self.settings else {
            return;
        };
        let mut lines = Vec::new();
        for (index, ((label, hint), value)) in SETTINGS_FIELDS.iter().zip(&form.values).enumerate() {
            let focused = index == form.index;
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            lines.push(Line::from(Span::styled(label.to_string(), label_style)));
            let cursor = if focused { "_" } else { "" };
            lines.push(Line::from(format!("  {value}{cursor}")));
            lines.push(Line::from(Span::styled(
                format!("  {hint}"),
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(match &form.path {
            Some(path) => format!("Config file: {}", path.display()),
            None => "No config file; changes cannot be saved".to_string(),
        }));
        self.draw_popup(frame, area, "Settings", lines);
    }

    pub(in crate::tui) fn draw_help(&self, frame: &mut ratatui::Frame, area: Rect) {
        let lines: Vec<Line> = [
            "1-4          switch mode (Personal, Organization, Local, Template)",
            "Tab/S-Tab    next / previous mode",
            "o            pick owner (GitHub modes)",
            "Space        toggle selection",
            "a / n        select all / none",
            "Enter        sync selection, or next wizard step",
            "r            reload list",
            "/            search repositories",
            "s            cycle sort (name, stars, updated)",
            "c            settings",
            "Left/Right   collapse / expand folder",
            "e / c        expand / collapse all folders",
            "Esc          back / cancel",
            "q            quit",
        ]
        .into_iter()
        .map(Line::from)
        .collect();
        self.draw_popup(frame, area, "Keys (any key to close)", lines);
    }

    fn draw_popup(&self, frame: &mut ratatui::Frame, area: Rect, title: &str, lines: Vec<Line>) {
        let height = (lines.len() as u16).saturating_add(2);
        let popup = centered_rect(72, height, area);
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title.to_string())
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(Clear, popup);
        frame.render_widget(paragraph, popup);
    }
}
