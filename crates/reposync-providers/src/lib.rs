pub mod auth;
pub mod github;
mod github_models;
pub mod http;
pub mod local;
mod provider_paging;

pub use github::{GitHubClient, GitHubSource, GitHubTemplates};
pub use local::LocalSource;
