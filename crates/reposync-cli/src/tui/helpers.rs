use super::*;
use reposync_core::tree::Selection;

pub(in crate::tui) fn progress_bar(step: usize, total: usize, width: usize) -> String {
    if total == 0 || width == 0 {
        return "[]".to_string();
    }
    let filled = ((step as f32 / total as f32) * width as f32).round() as usize;
    let filled = filled.min(width);
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(empty))
}

pub(in crate::tui) fn selection_marker(selection: Selection) -> &'static str {
    match selection {
        Selection::All => "[x]",
        Selection::Partial => "[-]",
        Selection::None => "[ ]",
    }
}

pub(in crate::tui) fn check_marker(selected: bool) -> &'static str {
    if selected { "[x]" } else { "[ ]" }
}

pub(in crate::tui) fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Recent-template entries are either `owner/repo` or a filesystem path.
pub(in crate::tui) fn looks_like_path(entry: &str) -> bool {
    entry.starts_with('/')
        || entry.starts_with('~')
        || entry.starts_with('.')
        || entry.contains('\\')
        || entry.matches('/').count() > 1
}

/// Index after moving `delta` rows through `len` items, wrapping around.
pub(in crate::tui) fn wrap_index(current: Option<usize>, delta: isize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = match current {
        None if delta < 0 => len - 1,
        None => 0,
        Some(index) => (index as isize + delta).rem_euclid(len as isize) as usize,
    };
    Some(next)
}

pub(in crate::tui) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub(in crate::tui) fn highlight_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}
