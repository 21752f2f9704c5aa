use reposync_core::model::RepoSummary;
use reposync_core::tree::{TreeEntry, TreeNode};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct RepoItem {
    pub(crate) name: String,
    pub(crate) full_name: String,
    pub(crate) description: Option<String>,
    pub(crate) default_branch: Option<String>,
    pub(crate) archived: Option<bool>,
    pub(crate) private: Option<bool>,
    pub(crate) language: Option<String>,
    pub(crate) stargazers_count: Option<u64>,
    pub(crate) updated_at: Option<String>,
    pub(crate) owner: Option<RepoOwner>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepoOwner {
    pub(crate) login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Account {
    pub(crate) login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepoDetails {
    pub(crate) default_branch: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TreeResponse {
    pub(crate) tree: Vec<TreeItem>,
    #[serde(default)]
    pub(crate) truncated: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TreeItem {
    pub(crate) path: String,
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) size: Option<u64>,
}

impl RepoItem {
    pub(crate) fn into_summary(self) -> RepoSummary {
        let mut summary = RepoSummary::new(self.full_name, self.name);
        summary.description = self.description.unwrap_or_default();
        summary.archived = self.archived.unwrap_or(false);
        let visibility = if self.private.unwrap_or(false) {
            "private"
        } else {
            "public"
        };
        summary = summary.with_meta("visibility", visibility);
        if let Some(language) = self.language.filter(|l| !l.is_empty()) {
            summary = summary.with_meta("language", language);
        }
        if let Some(stars) = self.stargazers_count {
            summary = summary.with_meta("stars", stars.to_string());
        }
        if let Some(updated) = self.updated_at {
            summary = summary.with_meta("updated", updated);
        }
        if let Some(branch) = self.default_branch {
            summary = summary.with_meta("default_branch", branch);
        }
        if let Some(owner) = self.owner {
            summary = summary.with_meta("owner", owner.login);
        }
        summary
    }
}

impl TreeResponse {
    /// Blobs become files and trees become directories; submodule entries
    /// are left out.
    pub(crate) fn into_tree(self, root_name: &str) -> TreeNode {
        let entries = self.tree.into_iter().filter_map(|item| {
            let is_dir = match item.kind.as_str() {
                "tree" => true,
                "blob" => false,
                _ => return None,
            };
            Some(TreeEntry {
                path: item.path,
                is_dir,
                size: if is_dir { None } else { item.size },
            })
        });
        TreeNode::from_entries(root_name, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repo_item_maps_to_summary() {
        let value = json!({
            "id": 1,
            "name": "repo",
            "full_name": "me/repo",
            "description": null,
            "clone_url": "https://example.com/repo.git",
            "default_branch": "main",
            "archived": true,
            "private": true,
            "language": "Rust",
            "stargazers_count": 7,
            "updated_at": "2024-05-01T10:00:00Z",
            "owner": { "login": "me" }
        });
        let repo: RepoItem = serde_json::from_value(value).unwrap();
        let summary = repo.into_summary();
        assert_eq!(summary.id, "me/repo");
        assert_eq!(summary.title, "repo");
        assert!(summary.archived);
        assert_eq!(summary.description, "");
        assert_eq!(summary.metadata["visibility"], "private");
        assert_eq!(summary.metadata["stars"], "7");
        assert_eq!(summary.metadata["owner"], "me");
        assert_eq!(summary.metadata["updated"], "2024-05-01T10:00:00Z");
    }

    #[test]
    fn tree_response_builds_sorted_tree() {
        let value = json!({
            "sha": "abc",
            "truncated": false,
            "tree": [
                { "path": "README.md", "type": "blob", "size": 12 },
                { "path": "src", "type": "tree" },
                { "path": "src/main.rs", "type": "blob", "size": 40 },
                { "path": "vendor/lib", "type": "commit" },
                { "path": "docs/guide/intro.md", "type": "blob", "size": 3 }
            ]
        });
        let response: TreeResponse = serde_json::from_value(value).unwrap();
        let tree = response.into_tree("repo");
        let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "src", "README.md"]);
        assert!(tree.find("docs/guide").unwrap().is_dir);
        assert_eq!(tree.find("src/main.rs").unwrap().size, Some(40));
        assert!(tree.find("vendor").is_none());
    }
}
