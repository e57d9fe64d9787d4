//! Account commands: register, login, logout, whoami

use crate::app::App;
use anyhow::{Context, Result};
use std::io::Write;

/// Password from the flag, or prompted on stdin
fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn register(app: &App, username: &str, password: Option<String>) -> Result<()> {
    let password = password_or_prompt(password)?;
    app.auth.register(username, &password).await?;
    println!("✓ Registered {}. Run `codexec login --username {}` to sign in.", username, username);
    Ok(())
}

pub async fn login(app: &App, username: &str, password: Option<String>) -> Result<()> {
    let password = password_or_prompt(password)?;
    let identity = app.auth.sign_in(username, &password).await?;
    println!("✓ Logged in as {}", identity.username);
    Ok(())
}

pub async fn logout(app: &App) -> Result<()> {
    app.auth.logout().await?;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(app: &App) -> Result<()> {
    match app.auth.restore().await {
        Ok(Some(identity)) => println!("{}", identity.username),
        Ok(None) => println!("Not logged in."),
        Err(e) => println!("Not logged in ({}).", e.user_message()),
    }
    Ok(())
}
