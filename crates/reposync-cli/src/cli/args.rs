use super::*;

#[derive(Parser)]
#[command(author, version, about = "Clone, refresh and template-sync Git repositories")]
pub(super) struct Cli {
    #[arg(long, global = true, help = "Include debug-level logs (RUST_LOG takes precedence)")]
    pub(super) verbose: bool,
    #[command(subcommand)]
    pub(super) command: Option<Commands>,
}

#[derive(clap::Subcommand)]
pub(super) enum Commands {
    #[command(about = "Browse GitHub repositories (personal or organization)")]
    Github(GithubArgs),
    #[command(about = "Browse repositories under the local source directories")]
    Local,
    #[command(about = "Manage the stored GitHub token")]
    Token(TokenArgs),
}

#[derive(clap::Args)]
pub(super) struct GithubArgs {
    #[arg(long, help = "User or organization to list instead of yourself")]
    pub(super) owner: Option<String>,
}

#[derive(clap::Args)]
pub(super) struct TokenArgs {
    #[command(subcommand)]
    pub(super) command: TokenCommands,
}

#[derive(clap::Subcommand)]
pub(super) enum TokenCommands {
    #[command(about = "Store a GitHub token in the OS keyring")]
    Set(SetTokenArgs),
    #[command(about = "Remove the stored GitHub token")]
    Clear,
}

#[derive(clap::Args)]
pub(super) struct SetTokenArgs {
    pub(super) token: String,
}

pub(super) fn command_label(command: Option<&Commands>) -> &'static str {
    match command {
        None => "tui",
        Some(Commands::Github(_)) => "github",
        Some(Commands::Local) => "local",
        Some(Commands::Token(args)) => match args.command {
            TokenCommands::Set(_) => "token.set",
            TokenCommands::Clear => "token.clear",
        },
    }
}
