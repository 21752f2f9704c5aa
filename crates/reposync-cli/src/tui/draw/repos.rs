use super::*;
use reposync_core::model::SyncResult;

impl TuiApp {
    pub(in crate::tui) fn draw_repos(&self, frame: &mut ratatui::Frame, area: Rect) {
        if let Some(results) = self.controller.last_results() {
            self.draw_sync_results(frame, area, results);
            return;
        }
        if self.controller.sync_running() {
            self.draw_sync_progress(frame, area);
            return;
        }

        let repos = self.controller.repos();
        let visible = repos.visible();
        let mut title = match self.controller.mode() {
            Mode::Local => format!(
                "Local repositories ({} found, {} selected)",
                repos.items().len(),
                repos.selected().len()
            ),
            mode => format!(
                "{} - {} ({} repos, {} selected)",
                mode.label(),
                self.controller.owner(),
                repos.items().len(),
                repos.selected().len()
            ),
        };
        title.push_str(&format!(" | sort: {}", repos.sort().label()));
        if self.searching {
            title.push_str(&format!(" | /{}_", repos.filter()));
        } else if !repos.filter().is_empty() {
            title.push_str(&format!(" | filter: {}", repos.filter()));
        }
        let block = Block::default().borders(Borders::ALL).title(title);

        let message = if repos.is_loading() {
            Some(Span::raw("Loading repositories..."))
        } else if let Some(err) = repos.error() {
            Some(Span::styled(
                format!("Failed to load repositories: {err}"),
                Style::default().fg(Color::Red),
            ))
        } else if repos.items().is_empty() {
            Some(Span::raw("No repositories found"))
        } else if visible.is_empty() {
            Some(Span::raw(format!("No repositories match '{}'", repos.filter())))
        } else {
            None
        };
        if let Some(message) = message {
            let paragraph = Paragraph::new(Line::from(message))
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = visible
            .iter()
            .map(|repo| {
                let mut spans = vec![
                    Span::raw(format!("{} ", check_marker(repos.is_selected(&repo.id)))),
                    Span::styled(
                        repo.title.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ];
                if repo.archived {
                    spans.push(Span::styled(
                        " (archived)",
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                if let Some(branch) = repo.metadata.get("branch") {
                    spans.push(Span::styled(
                        format!(" [{branch}]"),
                        Style::default().fg(Color::Green),
                    ));
                }
                if !repo.description.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}", repo.description),
                        Style::default().fg(Color::Gray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(highlight_style())
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.repo_cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_sync_progress(&self, frame: &mut ratatui::Frame, area: Rect) {
        let Some(queue) = self.controller.queue() else {
            return;
        };
        let done = queue.results().len();
        let mut lines = vec![
            Line::from(format!(
                "{} {done}/{}",
                progress_bar(done, queue.total(), PROGRESS_WIDTH),
                queue.total()
            )),
            Line::from(match queue.current_repo() {
                Some(repo) => format!("Syncing {repo}..."),
                None => "Syncing...".to_string(),
            }),
            Line::from(format!("Target: {}", self.controller.target_dir().display())),
            Line::from(""),
        ];
        lines.extend(queue.results().iter().map(result_line));
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Sync"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn draw_sync_results(&self, frame: &mut ratatui::Frame, area: Rect, results: &[SyncResult]) {
        let synced = results.iter().filter(|r| r.success && !r.skipped).count();
        let skipped = results.iter().filter(|r| r.skipped).count();
        let failed = results.iter().filter(|r| !r.success).count();
        let mut lines = vec![
            Line::from(Span::styled(
                format!("Synced {synced}, skipped {skipped}, failed {failed}"),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        lines.extend(results.iter().map(result_line));
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Sync results"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }
}

fn result_line(result: &SyncResult) -> Line<'static> {
    if result.skipped {
        Line::from(Span::styled(
            format!("  - {} (skipped)", result.repo),
            Style::default().fg(Color::Yellow),
        ))
    } else if result.success {
        Line::from(Span::styled(
            format!("  + {}", result.repo),
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::from(Span::styled(
            format!(
                "  x {}: {}",
                result.repo,
                result.error.as_deref().unwrap_or("unknown error")
            ),
            Style::default().fg(Color::Red),
        ))
    }
}
