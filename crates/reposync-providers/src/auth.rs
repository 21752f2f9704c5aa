use anyhow::{Context, anyhow};
use keyring::Entry;
use tracing::debug;

const SERVICE: &str = "reposync";
const ACCOUNT: &str = "github";

pub const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// GitHub token from the environment, falling back to the OS keyring.
pub fn get_token() -> anyhow::Result<String> {
    if let Some(token) = token_from_lookup(|key| std::env::var(key).ok()) {
        return Ok(token);
    }
    let entry = Entry::new(SERVICE, ACCOUNT).context("open keyring entry")?;
    match entry.get_password() {
        Ok(token) => {
            debug!("Using GitHub token from keyring");
            Ok(token)
        }
        Err(keyring::Error::NoEntry) => Err(anyhow!(
            "no GitHub token found; set GITHUB_TOKEN or run `reposync token set <TOKEN>`"
        )),
        Err(err) => Err(err).context("read token from keyring"),
    }
}

pub fn token_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|key| lookup(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

pub fn set_token(token: &str) -> anyhow::Result<()> {
    let entry = Entry::new(SERVICE, ACCOUNT).context("open keyring entry")?;
    entry.set_password(token).context("write token to keyring")
}

pub fn clear_token() -> anyhow::Result<()> {
    let entry = Entry::new(SERVICE, ACCOUNT).context("open keyring entry")?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(err) => Err(err).context("delete token from keyring"),
    }
}
