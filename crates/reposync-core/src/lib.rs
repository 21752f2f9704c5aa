pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod executor;
pub mod git_sync;
pub mod mode;
pub mod model;
pub mod paths;
pub mod progress;
pub mod provider;
pub mod repo_list;
pub mod sync_queue;
pub mod template_job;
pub mod template_wizard;
pub mod tree;

#[cfg(test)]
mod testing;
