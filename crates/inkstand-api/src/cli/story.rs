//! Published story listing.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use super::spinner;
use crate::state::AppState;

/// List stories published under the blog folder.
pub async fn list_stories(state: &AppState, json: bool) -> Result<()> {
    let spinner = spinner("Fetching published stories...", json);
    let stories = state.studio.cms().list_published().await;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&stories)?);
        return Ok(());
    }

    if stories.is_empty() {
        println!();
        println!(
            "  {} No published stories. Publish a post with: {}",
            style("i").blue().bold(),
            style("inkstand publish <id>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Slug").fg(Color::White),
        Cell::new("Audio").fg(Color::White),
        Cell::new("Published").fg(Color::White),
    ]);

    for story in &stories {
        let audio = if story.audio.is_some() {
            Cell::new("♪").fg(Color::Green)
        } else {
            Cell::new("-").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(story.id).fg(Color::DarkGrey),
            Cell::new(&story.title).fg(Color::Cyan),
            Cell::new(&story.full_slug),
            audio,
            Cell::new(story.published_at.as_deref().unwrap_or("-")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} stor{}",
        style(stories.len()).bold(),
        if stories.len() == 1 { "y" } else { "ies" }
    );
    println!();
    Ok(())
}
