//! Studio status dashboard.

use anyhow::Result;
use chrono::{TimeZone, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use inkstand_types::post::PostStatus;
use inkstand_types::secret::SecretSource;

use crate::state::AppState;

/// Show session, quota, draft counts and credential provenance.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let authenticated = state.session.is_authenticated().await;
    let expires = state
        .session
        .expires_at()
        .await
        .filter(|_| authenticated)
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

    let quota = state.studio.rate_limit_status().await;
    let max = state.studio.max_requests();

    let posts = state.studio.drafts().list().await;
    let count = |status: PostStatus| posts.iter().filter(|p| p.status == status).count();
    let published = count(PostStatus::Published);
    let generated = count(PostStatus::Generated);
    let drafts = count(PostStatus::Draft);

    let space_id = state.config.cms.space_id.as_deref().unwrap_or("");

    if json {
        let credentials: Vec<_> = state
            .credentials
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name,
                    "source": c.source,
                    "value": c.masked,
                })
            })
            .collect();
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "session": {
                "authenticated": authenticated,
                "expires_at": expires.map(|t| t.to_rfc3339()),
            },
            "rate_limit": {
                "remaining": quota.remaining,
                "max": max,
                "is_limited": quota.is_limited,
                "reset_at": quota.reset_at().to_rfc3339(),
            },
            "posts": {
                "total": posts.len(),
                "published": published,
                "generated": generated,
                "draft": drafts,
            },
            "cms": { "space_id": space_id },
            "audio": {
                "strategy": state.config.audio.strategy.to_string(),
                "primary": state.studio.audio().primary_name(),
            },
            "credentials": credentials,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} Inkstand v{}", style("✎").bold(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Session ──").dim());
    match expires {
        Some(expires) => println!(
            "  {}  (until {})",
            style("● logged in").green(),
            style(expires.to_rfc3339()).dim()
        ),
        None => println!(
            "  {}  run {}",
            style("○ logged out").yellow(),
            style("inkstand login").yellow()
        ),
    }
    println!();

    println!("  {}", style("── Generation quota ──").dim());
    let remaining = if quota.is_limited {
        style(quota.remaining).red().bold()
    } else {
        style(quota.remaining).bold()
    };
    println!("  Remaining: {remaining} of {max} this hour");
    if quota.remaining < max {
        println!("  Resets:    {}", style(quota.reset_at().to_rfc3339()).dim());
    }
    println!();

    println!("  {}", style("── Posts ──").dim());
    println!("  Total:     {}", style(posts.len()).bold());
    println!("  Published: {}", style(published).green());
    println!("  Generated: {}", style(generated).yellow());
    if drafts > 0 {
        println!("  Draft:     {}", style(drafts).dim());
    }
    println!();

    println!("  {}", style("── Publishing ──").dim());
    if space_id.is_empty() {
        println!("  Space:     {}", style("not configured").red());
    } else {
        println!("  Space:     {}", style(space_id).cyan());
    }
    println!(
        "  Narration: {} ({})",
        style(state.config.audio.strategy.to_string()).cyan(),
        state.studio.audio().primary_name()
    );
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Credential").fg(Color::White),
        Cell::new("Source").fg(Color::White),
        Cell::new("Value").fg(Color::White),
    ]);
    for credential in state.credentials.iter() {
        let source = match credential.source {
            SecretSource::Environment => Cell::new("environment").fg(Color::Green),
            SecretSource::Config => Cell::new("config").fg(Color::Cyan),
            SecretSource::Missing => Cell::new("missing").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(credential.name).fg(Color::White),
            source,
            Cell::new(credential.masked.as_deref().unwrap_or("-")).fg(Color::DarkGrey),
        ]);
    }
    println!("{table}");
    println!();
    println!(
        "  {}",
        style(format!("Data: {}", state.data_dir.display())).dim()
    );
    println!();

    Ok(())
}
