use super::app::{StartMode, log_directive, logs_to_stderr, start_mode};
use super::*;

#[test]
fn no_subcommand_launches_default_ui() {
    let cli = Cli::try_parse_from(["reposync"]).unwrap();
    assert!(cli.command.is_none());
    assert_eq!(command_label(cli.command.as_ref()), "tui");
}

#[test]
fn github_accepts_owner() {
    let cli = Cli::try_parse_from(["reposync", "github", "--owner", "acme"]).unwrap();
    match cli.command {
        Some(Commands::Github(args)) => assert_eq!(args.owner.as_deref(), Some("acme")),
        _ => panic!("expected github command"),
    }
}

#[test]
fn token_set_takes_positional_token() {
    let cli = Cli::try_parse_from(["reposync", "token", "set", "ghp_abc"]).unwrap();
    assert_eq!(command_label(cli.command.as_ref()), "token.set");
    match cli.command {
        Some(Commands::Token(TokenArgs {
            command: TokenCommands::Set(args),
        })) => assert_eq!(args.token, "ghp_abc"),
        _ => panic!("expected token set"),
    }
    assert!(Cli::try_parse_from(["reposync", "token", "set"]).is_err());
}

#[test]
fn start_mode_falls_back_to_local_without_github() {
    assert_eq!(start_mode(&StartMode::Default, false, false), Mode::Local);
    assert_eq!(start_mode(&StartMode::Default, true, false), Mode::Personal);
    assert_eq!(
        start_mode(&StartMode::GitHub(Some("acme".into())), true, true),
        Mode::Organization
    );
    assert_eq!(start_mode(&StartMode::Local, true, true), Mode::Local);
}

#[test]
fn verbose_raises_level_without_writing_over_the_ui() {
    let cli = Cli::try_parse_from(["reposync", "--verbose", "local"]).unwrap();
    assert!(cli.verbose);
    assert_eq!(log_directive(cli.verbose), "debug");
    assert!(!logs_to_stderr(cli.command.as_ref()));

    let cli = Cli::try_parse_from(["reposync", "token", "clear"]).unwrap();
    assert_eq!(log_directive(cli.verbose), "info");
    assert!(logs_to_stderr(cli.command.as_ref()));
}
