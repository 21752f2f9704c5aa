use crate::github_models::{Account, RepoDetails, RepoItem, TreeResponse};
use crate::http::send_with_retry;
use crate::provider_paging::next_page_from_link_header;
use anyhow::{Context, anyhow, bail};
use reposync_core::git_sync;
use reposync_core::model::{RepoAuth, RepoScope, RepoSummary, SourceKind, TemplateOrigin};
use reposync_core::paths::destination_for;
use reposync_core::provider::{RepoSource, TemplateSource};
use reposync_core::tree::TreeNode;
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_WEB_BASE: &str = "https://github.com";
const USER_AGENT: &str = "reposync";
const JSON_MEDIA: &str = "application/vnd.github+json";
const RAW_MEDIA: &str = "application/vnd.github.raw";
const PER_PAGE: &str = "100";

/// Authenticated access to the GitHub REST API.
pub struct GitHubClient {
    client: Client,
    api_base: String,
    web_base: String,
    token: String,
    login: OnceLock<String>,
}

impl GitHubClient {
    pub fn new(token: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            web_base: DEFAULT_WEB_BASE.to_string(),
            token,
            login: OnceLock::new(),
        })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn auth(&self) -> RepoAuth {
        RepoAuth {
            username: "x-access-token".to_string(),
            token: self.token.clone(),
        }
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.api_base).context("parse GitHub API base")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("GitHub API base cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn request(&self, url: Url, accept: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header(ACCEPT, accept)
            .bearer_auth(&self.token)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> anyhow::Result<T> {
        let builder = self.request(url, JSON_MEDIA);
        let response = send_with_retry(|| builder.try_clone().context("clone request"))?;
        response.json().context("decode GitHub response")
    }

    fn get_paged<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, &str)]) -> anyhow::Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let page_text = page.to_string();
            let mut pairs = query.to_vec();
            pairs.push(("per_page", PER_PAGE));
            pairs.push(("page", &page_text));
            let builder = self.request(self.endpoint(segments, &pairs)?, JSON_MEDIA);
            let response = send_with_retry(|| builder.try_clone().context("clone request"))?;
            let next_page = next_page_from_link_header(response.headers());
            let mut batch: Vec<T> = response.json().context("decode GitHub page")?;
            items.append(&mut batch);
            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }
        Ok(items)
    }

    /// Login of the token's owner; fetched once per client.
    pub fn current_user(&self) -> anyhow::Result<String> {
        if let Some(login) = self.login.get() {
            return Ok(login.clone());
        }
        let account: Account = self
            .get_json(self.endpoint(&["user"], &[])?)
            .context("failed to get current user")?;
        let _ = self.login.set(account.login.clone());
        Ok(account.login)
    }

    pub fn list_owner_repos(&self, owner: &str) -> anyhow::Result<Vec<RepoSummary>> {
        let own = self
            .current_user()
            .map(|login| login.eq_ignore_ascii_case(owner))
            .unwrap_or(false);
        let items: Vec<RepoItem> = if own {
            self.get_paged(&["user", "repos"], &[("affiliation", "owner"), ("sort", "updated")])?
        } else {
            self.get_paged(&["users", owner, "repos"], &[("sort", "updated")])?
        };
        Ok(items.into_iter().map(RepoItem::into_summary).collect())
    }

    pub fn list_org_repos(&self, org: &str) -> anyhow::Result<Vec<RepoSummary>> {
        let items: Vec<RepoItem> = self.get_paged(&["orgs", org, "repos"], &[("sort", "updated")])?;
        Ok(items.into_iter().map(RepoItem::into_summary).collect())
    }

    pub fn list_organizations(&self) -> anyhow::Result<Vec<String>> {
        let orgs: Vec<Account> = self.get_paged(&["user", "orgs"], &[])?;
        Ok(orgs.into_iter().map(|org| org.login).collect())
    }

    pub fn default_branch(&self, owner: &str, repo: &str) -> anyhow::Result<String> {
        let details: RepoDetails = self.get_json(self.endpoint(&["repos", owner, repo], &[])?)?;
        Ok(details.default_branch)
    }

    pub fn tree(&self, owner: &str, repo: &str, branch: &str) -> anyhow::Result<TreeNode> {
        let url = self.endpoint(
            &["repos", owner, repo, "git", "trees", branch],
            &[("recursive", "1")],
        )?;
        let response: TreeResponse = self.get_json(url)?;
        if response.truncated {
            warn!(owner, repo, "GitHub truncated the repository tree");
        }
        Ok(response.into_tree(repo))
    }

    pub fn raw_file(&self, owner: &str, repo: &str, branch: &str, path: &str) -> anyhow::Result<Vec<u8>> {
        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/').filter(|part| !part.is_empty()));
        let builder = self.request(self.endpoint(&segments, &[("ref", branch)])?, RAW_MEDIA);
        let response = send_with_retry(|| builder.try_clone().context("clone request"))?;
        let bytes = response.bytes().context("read file body")?;
        Ok(bytes.to_vec())
    }

    pub fn clone_url(&self, full_name: &str) -> String {
        format!("{}/{full_name}.git", self.web_base)
    }
}

const UNAVAILABLE: &str = "GitHub is not available; set GITHUB_TOKEN or run `reposync token set <TOKEN>`";

/// GitHub as a repository source for the personal and organization modes.
/// Without a client every call fails with a hint about the missing token.
pub struct GitHubSource {
    client: Option<Arc<GitHubClient>>,
}

impl GitHubSource {
    pub fn new(client: Option<Arc<GitHubClient>>) -> Self {
        Self { client }
    }

    fn client(&self) -> anyhow::Result<&GitHubClient> {
        self.client.as_deref().context(UNAVAILABLE)
    }
}

impl RepoSource for GitHubSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }

    fn list_repositories(&self, scope: &RepoScope) -> anyhow::Result<Vec<RepoSummary>> {
        let client = self.client()?;
        let repos = match scope {
            RepoScope::Personal(owner) => client.list_owner_repos(owner),
            RepoScope::Organization(org) => client.list_org_repos(org),
            RepoScope::LocalPaths(_) => bail!("GitHub cannot list local paths"),
        }
        .context("failed to list repositories")?;
        info!(count = repos.len(), scope = ?scope, "Listed GitHub repositories");
        Ok(repos)
    }

    fn list_organizations(&self) -> anyhow::Result<Vec<String>> {
        self.client()?.list_organizations()
    }

    fn clone_or_copy(&self, identifier: &str, target_dir: &Path) -> anyhow::Result<()> {
        let (_, destination) = destination_for(SourceKind::Remote, identifier, target_dir)?;
        let client = self.client()?;
        fs::create_dir_all(target_dir)
            .with_context(|| format!("create {}", target_dir.display()))?;
        git_sync::clone_repo(&destination, &client.clone_url(identifier), Some(&client.auth()))
    }

    fn refresh(&self, path: &Path) -> anyhow::Result<()> {
        git_sync::refresh_repo(path, Some(&self.client()?.auth()))?;
        Ok(())
    }
}

/// Template reads: GitHub for remote templates, the filesystem for local ones.
pub struct GitHubTemplates {
    client: Option<Arc<GitHubClient>>,
}

impl GitHubTemplates {
    pub fn new(client: Option<Arc<GitHubClient>>) -> Self {
        Self { client }
    }

    fn client(&self) -> anyhow::Result<&GitHubClient> {
        self.client.as_deref().context(UNAVAILABLE)
    }
}

impl TemplateSource for GitHubTemplates {
    fn resolve_default_branch(&self, owner: &str, repo: &str) -> anyhow::Result<String> {
        self.client()?.default_branch(owner, repo)
    }

    fn fetch_tree(&self, owner: &str, repo: &str, branch: &str) -> anyhow::Result<TreeNode> {
        self.client()?.tree(owner, repo, branch)
    }

    fn read_file(&self, origin: &TemplateOrigin, path: &str) -> anyhow::Result<Vec<u8>> {
        match origin {
            TemplateOrigin::GitHub {
                owner,
                repo,
                branch,
            } => self.client()?.raw_file(owner, repo, branch, path),
            TemplateOrigin::Local(root) => {
                let full = path
                    .split('/')
                    .filter(|part| !part.is_empty())
                    .fold(root.clone(), |acc, part| acc.join(part));
                fs::read(&full).with_context(|| format!("read {}", full.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn client() -> GitHubClient {
        GitHubClient::new("token".into()).unwrap()
    }

    #[test]
    fn endpoint_encodes_path_segments() {
        let url = client()
            .endpoint(
                &["repos", "acme", "starter", "contents", "docs", "my file#1.md"],
                &[("ref", "main")],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/starter/contents/docs/my%20file%231.md?ref=main"
        );
    }

    #[test]
    fn custom_api_base_keeps_prefix() {
        let url = client()
            .with_api_base("https://ghe.example.com/api/v3/")
            .endpoint(&["user", "orgs"], &[])
            .unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/user/orgs");
    }

    #[test]
    fn clone_url_uses_full_name() {
        assert_eq!(
            client().clone_url("acme/widgets"),
            "https://github.com/acme/widgets.git"
        );
    }

    #[test]
    fn missing_client_reports_token_hint() {
        let err = GitHubSource::new(None)
            .list_organizations()
            .unwrap_err()
            .to_string();
        assert!(err.contains("GITHUB_TOKEN"), "{err}");
    }

    #[test]
    fn local_template_reads_from_disk_without_client() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a")).unwrap();
        fs::write(tmp.path().join("a/b.txt"), "body").unwrap();
        let templates = GitHubTemplates::new(None);
        let bytes = templates
            .read_file(&TemplateOrigin::Local(tmp.path().to_path_buf()), "a/b.txt")
            .unwrap();
        assert_eq!(bytes, b"body");
        assert!(templates.resolve_default_branch("a", "b").is_err());
    }

    #[test]
    fn remote_source_rejects_bad_identifier_before_cloning() {
        let source = GitHubSource::new(Some(Arc::new(client())));
        let tmp = TempDir::new().unwrap();
        let err = source
            .clone_or_copy("no-owner", tmp.path())
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("invalid repository format"), "{err}");
    }
}
