//! Authentication command handlers.

use crate::auth::{LoginForm, RegisterForm};
use crate::cli::AppContext;
use crate::error::Result;

/// Handle the `staybook auth login` command.
pub async fn handle_login(ctx: &AppContext, email: String, password: String) -> Result<()> {
    let form = LoginForm { email, password };
    ctx.client.login(&form).await?;

    println!("Successfully logged in as {}.", form.email);
    Ok(())
}

/// Handle the `staybook auth register` command.
pub async fn handle_register(ctx: &AppContext, form: RegisterForm) -> Result<()> {
    ctx.client.register(&form).await?;

    println!("Welcome, {}! Your account is ready.", form.first_name);
    Ok(())
}

/// Handle the `staybook auth logout` command.
pub async fn handle_logout(ctx: &AppContext) -> Result<()> {
    if !ctx.client.store().is_authenticated() {
        println!("Not currently logged in.");
        return Ok(());
    }

    ctx.client.logout().await;
    println!("Successfully logged out.");
    Ok(())
}

/// Handle the `staybook auth status` command.
///
/// Reads the stored session only; no request is made.
pub fn handle_status(ctx: &AppContext) -> Result<()> {
    if ctx.client.store().is_authenticated() {
        println!("Logged in");
        println!();
        println!("  API Server: {}", ctx.config.api.base_url);
        println!("  Storage:    {:?}", ctx.config.auth.storage);
    } else {
        println!("Not logged in");
        println!();
        println!("Run 'staybook auth login' to sign in.");
    }

    Ok(())
}
