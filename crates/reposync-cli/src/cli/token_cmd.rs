use super::*;

pub(super) fn handle_token(args: TokenArgs) -> anyhow::Result<()> {
    match args.command {
        TokenCommands::Set(args) => handle_set_token(args),
        TokenCommands::Clear => handle_clear_token(),
    }
}

fn handle_set_token(args: SetTokenArgs) -> anyhow::Result<()> {
    let token = args.token.trim();
    if token.is_empty() {
        anyhow::bail!("token must not be empty");
    }
    auth::set_token(token)?;
    info!("Stored GitHub token");
    println!("GitHub token stored in the OS keyring");
    Ok(())
}

fn handle_clear_token() -> anyhow::Result<()> {
    auth::clear_token()?;
    info!("Cleared GitHub token");
    println!("GitHub token removed");
    Ok(())
}
