use anyhow::Context;
use std::fs;
use std::path::Path;

/// One node of a template file tree. Paths are relative to the template
/// root and always use `/` separators; the root itself has an empty path.
///
/// Only files carry a selection flag. A directory's selection is derived
/// from its descendants, so it can never disagree with them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeNode {
    pub path: String,
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
    pub expanded: bool,
    selected: bool,
    pub children: Vec<TreeNode>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Selection {
    All,
    Partial,
    None,
}

/// Flat listing entry as reported by a tree source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeEntry {
    pub path: String,
    pub is_dir: bool,
    pub size: Option<u64>,
}

#[derive(Clone, Copy, Debug)]
pub struct TreeRow<'a> {
    pub depth: usize,
    pub node: &'a TreeNode,
}

impl TreeNode {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            name: name.into(),
            is_dir: true,
            size: None,
            expanded: true,
            selected: false,
            children: Vec::new(),
        }
    }

    fn dir(path: String, name: &str) -> Self {
        Self {
            path,
            name: name.to_string(),
            is_dir: true,
            size: None,
            expanded: false,
            selected: false,
            children: Vec::new(),
        }
    }

    fn file(path: String, name: &str, size: Option<u64>) -> Self {
        Self {
            path,
            name: name.to_string(),
            is_dir: false,
            size,
            expanded: false,
            selected: false,
            children: Vec::new(),
        }
    }

    /// Builds a tree from a flat listing. Missing parent directories are
    /// synthesized and every directory is sorted dirs-first, then by name.
    pub fn from_entries(root_name: &str, entries: impl IntoIterator<Item = TreeEntry>) -> Self {
        let mut root = TreeNode::root(root_name);
        for entry in entries {
            let components: Vec<&str> = entry
                .path
                .split('/')
                .filter(|part| !part.is_empty())
                .collect();
            root.insert(&components, &entry);
        }
        root.sort_children();
        root
    }

    fn child_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{name}", self.path)
        }
    }

    fn insert(&mut self, components: &[&str], entry: &TreeEntry) {
        let Some((first, rest)) = components.split_first() else {
            return;
        };
        if rest.is_empty() {
            if self.children.iter().any(|child| child.name == *first) {
                return;
            }
            let path = self.child_path(first);
            let node = if entry.is_dir {
                TreeNode::dir(path, first)
            } else {
                TreeNode::file(path, first, entry.size)
            };
            self.children.push(node);
            return;
        }
        let index = match self
            .children
            .iter()
            .position(|child| child.is_dir && child.name == *first)
        {
            Some(index) => index,
            None => {
                let path = self.child_path(first);
                self.children.push(TreeNode::dir(path, first));
                self.children.len() - 1
            }
        };
        self.children[index].insert(rest, entry);
    }

    fn sort_children(&mut self) {
        self.children
            .sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        for child in &mut self.children {
            child.sort_children();
        }
    }

    /// Sets the selection of this node and every descendant.
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
        for child in &mut self.children {
            child.set_selected(selected);
        }
    }

    pub fn selection(&self) -> Selection {
        if !self.is_dir {
            return if self.selected {
                Selection::All
            } else {
                Selection::None
            };
        }
        let (selected, total) = self.selected_counts();
        match (selected, total) {
            (0, _) | (_, 0) => Selection::None,
            (s, t) if s == t => Selection::All,
            _ => Selection::Partial,
        }
    }

    pub fn is_selected(&self) -> bool {
        self.selection() == Selection::All
    }

    fn selected_counts(&self) -> (usize, usize) {
        if !self.is_dir {
            return (usize::from(self.selected), 1);
        }
        self.children.iter().fold((0, 0), |(s, t), child| {
            let (cs, ct) = child.selected_counts();
            (s + cs, t + ct)
        })
    }

    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if self.path == path {
            return Some(self);
        }
        self.children
            .iter()
            .filter(|child| is_within(path, &child.path))
            .find_map(|child| child.find(path))
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut TreeNode> {
        if self.path == path {
            return Some(self);
        }
        self.children
            .iter_mut()
            .filter(|child| is_within(path, &child.path))
            .find_map(|child| child.find_mut(path))
    }

    /// Flips the selection of `path`: a fully selected node is cleared,
    /// anything else becomes fully selected.
    pub fn toggle(&mut self, path: &str) -> bool {
        match self.find_mut(path) {
            Some(node) => {
                let next = !node.is_selected();
                node.set_selected(next);
                true
            }
            None => false,
        }
    }

    pub fn toggle_expanded(&mut self, path: &str) -> bool {
        match self.find_mut(path) {
            Some(node) if node.is_dir => {
                node.expanded = !node.expanded;
                true
            }
            _ => false,
        }
    }

    pub fn set_expanded(&mut self, path: &str, expanded: bool) -> bool {
        match self.find_mut(path) {
            Some(node) if node.is_dir => {
                node.expanded = expanded;
                true
            }
            _ => false,
        }
    }

    pub fn expand_all(&mut self) {
        self.set_expanded_recursive(true);
    }

    /// Collapses every directory below the root; the root stays open so its
    /// children remain visible.
    pub fn collapse_all(&mut self) {
        for child in &mut self.children {
            child.set_expanded_recursive(false);
        }
    }

    fn set_expanded_recursive(&mut self, expanded: bool) {
        if self.is_dir {
            self.expanded = expanded;
        }
        for child in &mut self.children {
            child.set_expanded_recursive(expanded);
        }
    }

    /// Relative paths of all selected files, in display order.
    pub fn selected_files(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_selected(&mut out);
        out
    }

    fn collect_selected(&self, out: &mut Vec<String>) {
        if !self.is_dir {
            if self.selected {
                out.push(self.path.clone());
            }
            return;
        }
        for child in &self.children {
            child.collect_selected(out);
        }
    }

    pub fn file_count(&self) -> usize {
        self.selected_counts().1
    }

    /// Rows visible with the current expansion state, excluding the root.
    pub fn visible_rows(&self) -> Vec<TreeRow<'_>> {
        let mut rows = Vec::new();
        for child in &self.children {
            child.push_rows(0, &mut rows);
        }
        rows
    }

    fn push_rows<'a>(&'a self, depth: usize, rows: &mut Vec<TreeRow<'a>>) {
        rows.push(TreeRow { depth, node: self });
        if self.is_dir && self.expanded {
            for child in &self.children {
                child.push_rows(depth + 1, rows);
            }
        }
    }
}

fn is_within(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || (path.starts_with(ancestor) && path.as_bytes().get(ancestor.len()) == Some(&b'/'))
}

/// Walks a local directory into a tree, skipping `.git`.
pub fn walk_local_directory(root: &Path) -> anyhow::Result<TreeNode> {
    let metadata = fs::metadata(root)
        .with_context(|| format!("read template directory {}", root.display()))?;
    if !metadata.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }
    let mut entries = Vec::new();
    collect_entries(root, "", &mut entries)?;
    let root_name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    Ok(TreeNode::from_entries(&root_name, entries))
}

fn collect_entries(dir: &Path, prefix: &str, out: &mut Vec<TreeEntry>) -> anyhow::Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry.context("read dir entry")?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == ".git" {
            continue;
        }
        let rel = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        let file_type = entry.file_type().context("read file type")?;
        if file_type.is_dir() {
            out.push(TreeEntry {
                path: rel.clone(),
                is_dir: true,
                size: None,
            });
            collect_entries(&entry.path(), &rel, out)?;
        } else if file_type.is_file() {
            let size = entry.metadata().ok().map(|meta| meta.len());
            out.push(TreeEntry {
                path: rel,
                is_dir: false,
                size,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file(path: &str) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            is_dir: false,
            size: Some(1),
        }
    }

    fn dir(path: &str) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            is_dir: true,
            size: None,
        }
    }

    fn sample() -> TreeNode {
        let mut tree = TreeNode::from_entries(
            "tmpl",
            vec![
                file("README.md"),
                file(".github/workflows/ci.yml"),
                dir(".github"),
                file("src/lib.rs"),
                file("src/main.rs"),
                file("Cargo.toml"),
            ],
        );
        tree.set_selected(true);
        tree
    }

    #[test]
    fn synthesizes_parents_and_sorts_dirs_first() {
        let tree = sample();
        let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec![".github", "src", "Cargo.toml", "README.md"]);
        let workflows = tree.find(".github/workflows").unwrap();
        assert!(workflows.is_dir);
        assert_eq!(workflows.children[0].path, ".github/workflows/ci.yml");
        assert_eq!(tree.file_count(), 5);
    }

    #[test]
    fn toggling_directory_cascades_and_parents_follow() {
        let mut tree = sample();
        assert!(tree.toggle("src"));
        assert_eq!(tree.find("src/lib.rs").unwrap().selection(), Selection::None);
        assert_eq!(tree.find("src").unwrap().selection(), Selection::None);
        assert_eq!(tree.selection(), Selection::Partial);

        tree.toggle("src/main.rs");
        assert_eq!(tree.find("src").unwrap().selection(), Selection::Partial);
        tree.toggle("src/lib.rs");
        assert_eq!(tree.find("src").unwrap().selection(), Selection::All);
        assert_eq!(tree.selection(), Selection::All);
    }

    #[test]
    fn partial_directory_toggle_selects_everything() {
        let mut tree = sample();
        tree.toggle("src/lib.rs");
        tree.toggle("src");
        assert_eq!(tree.find("src").unwrap().selection(), Selection::All);
    }

    #[test]
    fn selected_files_lists_files_only() {
        let mut tree = sample();
        tree.toggle(".github");
        assert_eq!(
            tree.selected_files(),
            vec!["src/lib.rs", "src/main.rs", "Cargo.toml", "README.md"]
        );
        tree.set_selected(false);
        assert!(tree.selected_files().is_empty());
    }

    #[test]
    fn similar_prefixes_do_not_match() {
        let tree = TreeNode::from_entries("t", vec![file("src/a"), file("src2/b")]);
        assert_eq!(tree.find("src2/b").unwrap().name, "b");
        assert!(tree.find("src/b").is_none());
    }

    #[test]
    fn visible_rows_follow_expansion() {
        let mut tree = sample();
        assert_eq!(tree.visible_rows().len(), 4);
        tree.toggle_expanded("src");
        let rows = tree.visible_rows();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[2].depth, 1);
        tree.expand_all();
        assert_eq!(tree.visible_rows().len(), 8);
        tree.collapse_all();
        assert_eq!(tree.visible_rows().len(), 4);
    }

    #[test]
    fn empty_directory_reports_none() {
        let tree = TreeNode::from_entries("t", vec![dir("empty")]);
        assert_eq!(tree.find("empty").unwrap().selection(), Selection::None);
        assert_eq!(tree.file_count(), 0);
    }

    #[test]
    fn local_walk_skips_git_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".git/objects")).unwrap();
        fs::write(tmp.path().join(".git/HEAD"), "ref").unwrap();
        fs::create_dir_all(tmp.path().join("docs")).unwrap();
        fs::write(tmp.path().join("docs/guide.md"), "guide").unwrap();
        fs::write(tmp.path().join("LICENSE"), "mit").unwrap();

        let tree = walk_local_directory(tmp.path()).unwrap();
        assert!(tree.find(".git").is_none());
        assert_eq!(tree.file_count(), 2);
        assert_eq!(tree.find("docs/guide.md").unwrap().size, Some(5));
    }

    #[test]
    fn local_walk_rejects_missing_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(walk_local_directory(&tmp.path().join("nope")).is_err());
    }
}
