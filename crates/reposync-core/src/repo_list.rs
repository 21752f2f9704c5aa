use crate::model::{Mode, RepoSummary};
use std::cmp::Ordering;

/// Order of the visible list. Archived repositories always sort last.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortMode {
    #[default]
    Name,
    Stars,
    Updated,
}

impl SortMode {
    pub fn label(self) -> &'static str {
        match self {
            SortMode::Name => "Name",
            SortMode::Stars => "Stars",
            SortMode::Updated => "Updated",
        }
    }

    pub fn next(self) -> SortMode {
        match self {
            SortMode::Name => SortMode::Stars,
            SortMode::Stars => SortMode::Updated,
            SortMode::Updated => SortMode::Name,
        }
    }

    fn compare(self, a: &RepoSummary, b: &RepoSummary) -> Ordering {
        let by_name = || a.title.to_lowercase().cmp(&b.title.to_lowercase());
        match self {
            SortMode::Name => by_name(),
            SortMode::Stars => stars(b).cmp(&stars(a)).then_with(by_name),
            // Entries without a timestamp keep load order, after dated ones.
            SortMode::Updated => b.metadata.get("updated").cmp(&a.metadata.get("updated")),
        }
    }
}

fn stars(repo: &RepoSummary) -> u64 {
    repo.metadata
        .get("stars")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

/// Repositories loaded for the active mode plus the user's ordered selection.
#[derive(Clone, Debug, Default)]
pub struct RepoList {
    mode: Option<Mode>,
    load_id: u64,
    items: Vec<RepoSummary>,
    selected: Vec<String>,
    loading: bool,
    error: Option<String>,
    filter: String,
    sort: SortMode,
}

impl RepoList {
    /// Starts a fresh load and returns its id.
    pub fn begin_load(&mut self, mode: Mode) -> u64 {
        self.mode = Some(mode);
        self.load_id += 1;
        self.items.clear();
        self.selected.clear();
        self.filter.clear();
        self.loading = true;
        self.error = None;
        self.load_id
    }

    /// Accepts a load result; anything but the most recent load is stale
    /// and dropped. Returns whether it was applied.
    pub fn finish_load(&mut self, load_id: u64, result: Result<Vec<RepoSummary>, String>) -> bool {
        if load_id != self.load_id || !self.loading {
            return false;
        }
        self.loading = false;
        match result {
            Ok(items) => self.items = items,
            Err(err) => self.error = Some(err),
        }
        true
    }

    pub fn clear(&mut self) {
        self.mode = None;
        self.load_id += 1;
        self.items.clear();
        self.selected.clear();
        self.filter.clear();
        self.loading = false;
        self.error = None;
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn items(&self) -> &[RepoSummary] {
        &self.items
    }

    /// Items matching the filter, in sort order.
    pub fn visible(&self) -> Vec<&RepoSummary> {
        let query = self.filter.trim().to_lowercase();
        let mut visible: Vec<&RepoSummary> = self
            .items
            .iter()
            .filter(|item| {
                query.is_empty()
                    || item.title.to_lowercase().contains(&query)
                    || item.description.to_lowercase().contains(&query)
            })
            .collect();
        visible.sort_by(|a, b| {
            a.archived
                .cmp(&b.archived)
                .then_with(|| self.sort.compare(a, b))
        });
        visible
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, query: &str) {
        self.filter = query.to_string();
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn cycle_sort(&mut self) -> SortMode {
        self.sort = self.sort.next();
        self.sort
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn toggle(&mut self, id: &str) {
        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
        } else if self.items.iter().any(|item| item.id == id) {
            self.selected.push(id.to_string());
        }
    }

    /// Adds every visible item; selections hidden by the filter stay.
    pub fn select_all(&mut self) {
        let visible: Vec<String> = self.visible().iter().map(|item| item.id.clone()).collect();
        for id in visible {
            if !self.is_selected(&id) {
                self.selected.push(id);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Selected ids in the order the user picked them.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> RepoList {
        let mut list = RepoList::default();
        let load = list.begin_load(Mode::Personal);
        list.finish_load(
            load,
            Ok(vec![
                RepoSummary::new("o/a", "a"),
                RepoSummary::new("o/b", "b"),
                RepoSummary::new("o/c", "c"),
            ]),
        );
        list
    }

    #[test]
    fn selection_keeps_pick_order() {
        let mut list = loaded();
        list.toggle("o/c");
        list.toggle("o/a");
        list.toggle("o/missing");
        assert_eq!(list.selected(), ["o/c", "o/a"]);
        list.toggle("o/c");
        assert_eq!(list.selected(), ["o/a"]);
    }

    fn ranked(id: &str, title: &str, stars: &str, updated: &str) -> RepoSummary {
        RepoSummary::new(id, title)
            .with_meta("stars", stars)
            .with_meta("updated", updated)
    }

    #[test]
    fn filter_matches_title_or_description_and_keeps_selection() {
        let mut list = RepoList::default();
        let load = list.begin_load(Mode::Personal);
        let mut described = RepoSummary::new("o/b", "b");
        described.description = "Tooling for CI".to_string();
        list.finish_load(load, Ok(vec![RepoSummary::new("o/api", "api"), described]));

        list.toggle("o/api");
        list.set_filter("ci");
        let ids: Vec<&str> = list.visible().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, ["o/b"]);
        assert!(list.is_selected("o/api"));

        list.select_all();
        assert_eq!(list.selected(), ["o/api", "o/b"]);
    }

    #[test]
    fn sort_modes_cycle_and_archived_go_last() {
        let mut list = RepoList::default();
        let load = list.begin_load(Mode::Personal);
        let mut archived = ranked("o/zeta", "Zeta", "99", "2024-09-01");
        archived.archived = true;
        list.finish_load(
            load,
            Ok(vec![
                archived,
                ranked("o/beta", "beta", "1", "2024-03-01"),
                ranked("o/Alpha", "Alpha", "5", "2024-01-01"),
                ranked("o/gamma", "gamma", "3", "2024-06-01"),
            ]),
        );
        let order = |list: &RepoList| -> Vec<String> {
            list.visible().iter().map(|item| item.title.clone()).collect()
        };

        assert_eq!(list.sort(), SortMode::Name);
        assert_eq!(order(&list), ["Alpha", "beta", "gamma", "Zeta"]);
        assert_eq!(list.cycle_sort(), SortMode::Stars);
        assert_eq!(order(&list), ["Alpha", "gamma", "beta", "Zeta"]);
        assert_eq!(list.cycle_sort(), SortMode::Updated);
        assert_eq!(order(&list), ["gamma", "beta", "Alpha", "Zeta"]);
        assert_eq!(list.cycle_sort(), SortMode::Name);
    }

    #[test]
    fn new_load_clears_filter() {
        let mut list = loaded();
        list.set_filter("a");
        list.begin_load(Mode::Personal);
        assert_eq!(list.filter(), "");
    }

    #[test]
    fn stale_results_are_dropped() {
        let mut list = RepoList::default();
        let first = list.begin_load(Mode::Personal);
        let second = list.begin_load(Mode::Personal);
        assert!(!list.finish_load(first, Ok(vec![RepoSummary::new("o/a", "a")])));
        assert!(list.is_loading());
        assert!(list.finish_load(second, Err("boom".into())));
        assert!(!list.finish_load(second, Ok(Vec::new())));
        assert_eq!(list.error(), Some("boom"));
        assert!(list.items().is_empty());
    }
}
