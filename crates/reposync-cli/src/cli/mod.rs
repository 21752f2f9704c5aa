use crate::logging::{self, LOG_CAPACITY, LogBuffer};
use crate::tui::{self, Launch};
use anyhow::Context;
use clap::Parser;
use reposync_core::config::{AppConfig, ConfigStore};
use reposync_core::model::Mode;
use reposync_providers::auth;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod app;
mod args;
#[cfg(test)]
mod tests;
mod token_cmd;

use args::*;

pub use app::run;
