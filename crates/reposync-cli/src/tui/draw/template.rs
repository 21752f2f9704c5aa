use super::*;
use reposync_core::template_wizard::summary_line;

impl TuiApp {
    pub(in crate::tui) fn draw_template(&self, frame: &mut ratatui::Frame, area: Rect) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        self.draw_wizard_steps(frame, layout[0]);
        match self.controller.wizard().step() {
            WizardStep::SelectTemplate => self.draw_template_input(frame, layout[1]),
            WizardStep::BrowseTree => self.draw_tree(frame, layout[1]),
            WizardStep::SelectTargets => self.draw_targets(frame, layout[1]),
            WizardStep::Syncing => self.draw_template_progress(frame, layout[1]),
            WizardStep::Complete => self.draw_template_summary(frame, layout[1]),
        }
    }

    fn draw_wizard_steps(&self, frame: &mut ratatui::Frame, area: Rect) {
        let current = self.controller.wizard().step();
        let mut spans = Vec::new();
        for (index, step) in WizardStep::ALL.iter().enumerate() {
            if index > 0 {
                spans.push(Span::raw(" > "));
            }
            let style = if *step == current {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(format!("{}. {}", index + 1, step.label()), style));
        }
        let title = match &self.controller.wizard().state().source {
            Some(origin) => format!("Template - {}", origin.display_name()),
            None => "Template".to_string(),
        };
        let paragraph =
            Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
    }

    fn draw_template_input(&self, frame: &mut ratatui::Frame, area: Rect) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Min(0),
            ])
            .split(area);
        let state = self.controller.wizard().state();

        let source = if self.template_local {
            "Local directory"
        } else {
            "GitHub owner/repo"
        };
        let input = Paragraph::new(format!("{}_", self.template_input))
            .block(Block::default().borders(Borders::ALL).title(source));
        frame.render_widget(input, layout[0]);

        let status = if state.is_resolving() {
            Line::from("Loading template... (Esc to cancel)")
        } else if let Some(err) = &state.error {
            Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red)))
        } else {
            Line::from("")
        };
        frame.render_widget(Paragraph::new(status), layout[1]);

        let suggestions = self.template_suggestions();
        let title = if self.template_local {
            "Recent and discovered directories"
        } else {
            "Recent templates"
        };
        let items: Vec<ListItem> = suggestions
            .iter()
            .map(|entry| ListItem::new(entry.clone()))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(highlight_style())
            .highlight_symbol("> ");
        let mut list_state = ListState::default().with_selected(self.suggestion_index);
        frame.render_stateful_widget(list, layout[2], &mut list_state);
    }

    fn draw_tree(&self, frame: &mut ratatui::Frame, area: Rect) {
        let Some(tree) = self.controller.wizard().state().tree.as_ref() else {
            return;
        };
        let items: Vec<ListItem> = tree
            .visible_rows()
            .into_iter()
            .map(|row| {
                let node = row.node;
                let indent = "  ".repeat(row.depth);
                let marker = selection_marker(node.selection());
                let text = if node.is_dir {
                    let arrow = if node.expanded { "v" } else { ">" };
                    format!("{indent}{marker} {arrow} {}/", node.name)
                } else {
                    match node.size {
                        Some(size) => format!("{indent}{marker}   {} ({})", node.name, format_size(size)),
                        None => format!("{indent}{marker}   {}", node.name),
                    }
                };
                let style = if node.is_dir {
                    Style::default().fg(Color::Blue)
                } else {
                    Style::default()
                };
                ListItem::new(Span::styled(text, style))
            })
            .collect();
        let title = format!(
            "Files ({} of {} selected)",
            tree.selected_files().len(),
            tree.file_count()
        );
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(highlight_style());
        let mut state = ListState::default().with_selected(Some(self.tree_cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_targets(&self, frame: &mut ratatui::Frame, area: Rect) {
        let wizard = self.controller.wizard();
        let block_title = format!(
            "Target repositories ({} selected, {} files)",
            wizard.state().selected_targets.len(),
            wizard.state().selected_files.len()
        );
        let block = Block::default().borders(Borders::ALL).title(block_title);
        if self.controller.targets_loading() {
            frame.render_widget(Paragraph::new("Scanning for repositories...").block(block), area);
            return;
        }
        if let Some(err) = self.controller.targets_error() {
            let text = Span::styled(
                format!("Failed to scan repositories: {err}"),
                Style::default().fg(Color::Red),
            );
            frame.render_widget(Paragraph::new(Line::from(text)).block(block), area);
            return;
        }
        let candidates = wizard.candidates();
        if candidates.is_empty() {
            frame.render_widget(
                Paragraph::new("No local repositories found in the source directories").block(block),
                area,
            );
            return;
        }
        let items: Vec<ListItem> = candidates
            .iter()
            .map(|path| {
                let selected = wizard.state().selected_targets.contains(*path);
                ListItem::new(format!("{} {}", check_marker(selected), path.display()))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(highlight_style())
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.target_cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_template_progress(&self, frame: &mut ratatui::Frame, area: Rect) {
        let state = self.controller.wizard().state();
        let lines = match &state.progress {
            Some(progress) => vec![
                Line::from(format!(
                    "{} {}/{}",
                    progress_bar(progress.current, progress.total, PROGRESS_WIDTH),
                    progress.current,
                    progress.total
                )),
                Line::from(format!("{} -> {}", progress.file, progress.target.display())),
            ],
            None => vec![Line::from("Starting template sync...")],
        };
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Syncing"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn draw_template_summary(&self, frame: &mut ratatui::Frame, area: Rect) {
        let state = self.controller.wizard().state();
        let headline_style = if state.counters.errors > 0 || state.error.is_some() {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        };
        let mut lines = vec![Line::from(Span::styled(
            summary_line(&state.counters),
            headline_style,
        ))];
        if let Some(err) = &state.error {
            lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
        }
        if !state.failures.is_empty() {
            lines.push(Line::from(""));
            lines.extend(state.failures.iter().map(|failure| {
                Line::from(Span::styled(
                    format!(
                        "  x {} -> {}: {}",
                        failure.file,
                        failure.target.display(),
                        failure.error
                    ),
                    Style::default().fg(Color::Red),
                ))
            }));
        }
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Done"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }
}
