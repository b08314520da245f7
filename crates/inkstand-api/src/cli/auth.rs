//! Session commands: login and logout.

use anyhow::{Result, bail};
use chrono::{TimeZone, Utc};
use console::style;
use dialoguer::Password;

use super::Output;
use crate::state::AppState;

/// Start a 24-hour admin session.
///
/// The password comes from `--password` / `INKSTAND_PASSWORD` or a hidden
/// prompt, and is checked against `ADMIN_PASSWORD`.
pub async fn login(state: &AppState, password: Option<String>, out: Output) -> Result<()> {
    let expected = state
        .config
        .auth
        .admin_password
        .as_ref()
        .filter(|p| !p.is_blank());
    let Some(expected) = expected else {
        bail!("no admin password configured; set ADMIN_PASSWORD or auth.admin_password");
    };

    let candidate = match password {
        Some(p) => p,
        None => Password::new().with_prompt("Admin password").interact()?,
    };

    if !state.session.login(&candidate, Some(expected.expose())).await {
        bail!("invalid password");
    }

    let expires = state
        .session
        .expires_at()
        .await
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

    if out.json {
        println!(
            "{}",
            serde_json::json!({
                "authenticated": true,
                "expires_at": expires.map(|t| t.to_rfc3339()),
            })
        );
    } else if !out.quiet {
        println!("  {} Logged in.", style("✓").green().bold());
        if let Some(expires) = expires {
            println!(
                "  {}",
                style(format!("Session valid until {}", expires.to_rfc3339())).dim()
            );
        }
    }
    Ok(())
}

/// End the admin session.
pub async fn logout(state: &AppState, out: Output) -> Result<()> {
    state.session.clear_auth().await;

    if out.json {
        println!("{}", serde_json::json!({"authenticated": false}));
    } else if !out.quiet {
        println!("  {} Logged out.", style("✓").green().bold());
    }
    Ok(())
}
