//! Local post commands: generate, list, show, edit, regenerate, publish,
//! delete and narrate.

use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use inkstand_types::post::{
    AudioStatus, BlogPost, GenerationRequest, PostLength, PostPatch, PostStatus, Tone,
};

use super::{Output, short_id, spinner};
use crate::state::AppState;

/// Resolve a full id or a unique id prefix against `posts`.
pub fn resolve_post_id(posts: &[BlogPost], needle: &str) -> Result<String> {
    if let Some(post) = posts.iter().find(|p| p.id == needle) {
        return Ok(post.id.clone());
    }
    let matches: Vec<&BlogPost> = posts.iter().filter(|p| p.id.starts_with(needle)).collect();
    match matches.as_slice() {
        [] => bail!("post '{needle}' not found"),
        [post] => Ok(post.id.clone()),
        many => bail!(
            "id prefix '{needle}' is ambiguous ({} posts match); use more characters",
            many.len()
        ),
    }
}

async fn resolve(state: &AppState, needle: &str) -> Result<String> {
    let posts = state.studio.drafts().list().await;
    resolve_post_id(&posts, needle)
}

/// Generate a post from a theme.
///
/// ```bash
/// inkstand generate "Slow travel in Portugal" --tone casual --length short
/// ```
pub async fn generate_post(
    state: &AppState,
    theme: String,
    tone: Tone,
    length: PostLength,
    out: Output,
) -> Result<()> {
    if theme.trim().is_empty() {
        bail!("a theme is required");
    }

    let spinner = spinner(format!("Writing a {length} {tone} post..."), out.spinner_hidden());
    let result = state
        .studio
        .generate(GenerationRequest {
            theme,
            tone,
            length,
        })
        .await;
    spinner.finish_and_clear();
    let post = result?;

    if out.json {
        println!("{}", serde_json::to_string_pretty(&post)?);
        return Ok(());
    }
    if out.quiet {
        println!("{}", post.id);
        return Ok(());
    }

    let status = state.studio.rate_limit_status().await;
    println!();
    println!(
        "  {} Generated '{}'",
        style("✓").green().bold(),
        style(&post.title).cyan().bold()
    );
    println!("  {}  {}", style("ID:").dim(), post.id);
    println!("  {}  {}", style("Image:").dim(), post.image_url);
    println!(
        "  {}  {} of {} generations left this hour",
        style("Quota:").dim(),
        status.remaining,
        state.studio.max_requests()
    );
    println!();
    println!(
        "  Review with {} and publish with {}",
        style(format!("inkstand show {}", short_id(&post.id))).yellow(),
        style(format!("inkstand publish {}", short_id(&post.id))).yellow()
    );
    println!();
    Ok(())
}

/// List local posts, newest first.
pub async fn list_posts(state: &AppState, status: Option<PostStatus>, out: Output) -> Result<()> {
    let posts: Vec<BlogPost> = state
        .studio
        .drafts()
        .list()
        .await
        .into_iter()
        .filter(|p| status.is_none_or(|s| p.status == s))
        .collect();

    if out.json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
        return Ok(());
    }

    if posts.is_empty() {
        println!();
        println!(
            "  {} No posts found. Create one with: {}",
            style("i").blue().bold(),
            style("inkstand generate <theme>").yellow()
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
        Cell::new("Status").fg(Color::White),
        Cell::new("Tone").fg(Color::White),
        Cell::new("Audio").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for post in &posts {
        let title = if post.title.chars().count() > 50 {
            let head: String = post.title.chars().take(47).collect();
            format!("{head}...")
        } else {
            post.title.clone()
        };

        table.add_row(vec![
            Cell::new(short_id(&post.id)).fg(Color::DarkGrey),
            Cell::new(title).fg(Color::Cyan),
            status_cell(post.status),
            Cell::new(post.tone.to_string()),
            audio_cell(post.audio_status),
            Cell::new(format_relative_time(&post.created_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} post{}",
        style(posts.len()).bold(),
        if posts.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

fn status_cell(status: PostStatus) -> Cell {
    match status {
        PostStatus::Published => Cell::new("● published").fg(Color::Green),
        PostStatus::Generated => Cell::new("◐ generated").fg(Color::Yellow),
        PostStatus::Draft => Cell::new("○ draft").fg(Color::DarkGrey),
    }
}

fn audio_cell(status: Option<AudioStatus>) -> Cell {
    match status {
        Some(AudioStatus::Ready) => Cell::new("♪ ready").fg(Color::Green),
        Some(AudioStatus::Generating) => Cell::new("… generating").fg(Color::Yellow),
        Some(AudioStatus::Error) => Cell::new("✗ error").fg(Color::Red),
        Some(AudioStatus::None) | None => Cell::new("-").fg(Color::DarkGrey),
    }
}

/// Show one post with its full markdown body.
pub async fn show_post(state: &AppState, needle: &str, out: Output) -> Result<()> {
    let id = resolve(state, needle).await?;
    let Some(post) = state.studio.drafts().get(&id).await else {
        bail!("post '{needle}' not found");
    };

    if out.json {
        println!("{}", serde_json::to_string_pretty(&post)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&post.title).cyan().bold());
    println!();
    println!("  {}       {}", style("ID:").dim(), post.id);
    println!("  {}   {}", style("Status:").dim(), post.status);
    println!("  {}    {}", style("Theme:").dim(), post.theme);
    println!("  {}     {} / {}", style("Tone:").dim(), post.tone, post.length);
    println!("  {}  {}", style("Created:").dim(), post.created_at.to_rfc3339());
    if let Some(published_at) = &post.published_at {
        println!("  {} {}", style("Published:").dim(), published_at.to_rfc3339());
    }
    if let Some(story_id) = &post.storyblok_id {
        println!("  {}    {}", style("Story:").dim(), story_id);
    }
    if !post.image_url.is_empty() {
        println!("  {}    {}", style("Image:").dim(), post.image_url);
    }
    if let Some(audio) = post.audio_status {
        println!("  {}    {}", style("Audio:").dim(), audio);
    }
    println!();
    println!("  {}", style("── Excerpt ──").dim());
    println!("  {}", post.excerpt);
    println!();
    println!("  {}", style("── Content ──").dim());
    for line in post.content.lines() {
        println!("  {line}");
    }
    println!();
    Ok(())
}

/// Field overrides accepted by `inkstand edit`.
#[derive(Debug, Default)]
pub struct EditArgs {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub content_file: Option<PathBuf>,
    pub image_url: Option<String>,
    pub theme: Option<String>,
    pub tone: Option<Tone>,
    pub length: Option<PostLength>,
}

impl EditArgs {
    async fn into_patch(self) -> Result<PostPatch> {
        let content = match self.content_file {
            Some(path) => Some(tokio::fs::read_to_string(&path).await.map_err(|e| {
                anyhow::anyhow!("failed to read {}: {e}", path.display())
            })?),
            None => self.content,
        };
        Ok(PostPatch {
            title: self.title,
            content,
            excerpt: self.excerpt,
            image_url: self.image_url,
            theme: self.theme,
            tone: self.tone,
            length: self.length,
            ..Default::default()
        })
    }
}

/// Apply local edits to a post. Published posts need a new `publish` to
/// carry the edits to the CMS.
pub async fn edit_post(state: &AppState, needle: &str, args: EditArgs, out: Output) -> Result<()> {
    let patch = args.into_patch().await?;
    if patch.is_empty() {
        bail!("nothing to change; pass at least one field such as --title or --content");
    }

    let id = resolve(state, needle).await?;
    let post = state.studio.edit(&id, patch).await?;

    if out.json {
        println!("{}", serde_json::to_string_pretty(&post)?);
    } else if !out.quiet {
        println!("  {} Updated '{}'", style("✓").green().bold(), post.title);
        if post.status == PostStatus::Published {
            println!(
                "  {} Run {} to push the changes to the CMS.",
                style("i").blue().bold(),
                style(format!("inkstand publish {}", short_id(&post.id))).yellow()
            );
        }
    }
    Ok(())
}

/// Regenerate a post's text and image from its theme.
pub async fn regenerate_post(state: &AppState, needle: &str, out: Output) -> Result<()> {
    let id = resolve(state, needle).await?;

    let spinner = spinner("Regenerating...", out.spinner_hidden());
    let result = state.studio.regenerate(&id).await;
    spinner.finish_and_clear();
    let post = result?;

    if out.json {
        println!("{}", serde_json::to_string_pretty(&post)?);
    } else if !out.quiet {
        println!(
            "  {} Regenerated '{}'",
            style("✓").green().bold(),
            style(&post.title).cyan()
        );
    }
    Ok(())
}

/// Publish a post to the CMS.
pub async fn publish_post(state: &AppState, needle: &str, out: Output) -> Result<()> {
    let id = resolve(state, needle).await?;

    let spinner = spinner("Publishing to the CMS...", out.spinner_hidden());
    let result = state.studio.publish_post(&id).await;
    spinner.finish_and_clear();

    let post = match result {
        Ok(post) => post,
        Err(e) => {
            if let inkstand_types::error::StudioError::Cms(cms) = &e {
                if let Some(hint) = cms.hint() {
                    if !out.json {
                        eprintln!("  {} {}", style("hint:").yellow().bold(), hint);
                    }
                }
            }
            return Err(e.into());
        }
    };

    if out.json {
        println!("{}", serde_json::to_string_pretty(&post)?);
    } else if !out.quiet {
        println!(
            "  {} Published '{}' (story {})",
            style("✓").green().bold(),
            style(&post.title).cyan(),
            post.storyblok_id.as_deref().unwrap_or("?")
        );
    }
    Ok(())
}

/// Delete a local post after confirmation.
pub async fn delete_post(state: &AppState, needle: &str, force: bool, out: Output) -> Result<()> {
    let id = resolve(state, needle).await?;
    let Some(post) = state.studio.drafts().get(&id).await else {
        bail!("post '{needle}' not found");
    };

    if !force && !out.json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete post '{}' from local storage?",
                style(&post.title).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.studio.delete(&id).await?;

    if out.json {
        println!("{}", serde_json::json!({"deleted": true, "id": id}));
    } else if !out.quiet {
        println!("  {} Post '{}' deleted.", style("✓").red().bold(), post.title);
        if post.storyblok_id.is_some() {
            println!(
                "  {}",
                style("The published story is still live in the CMS.").dim()
            );
        }
    }
    Ok(())
}

/// Narrate a local post, or a published story by slug.
pub async fn narrate(
    state: &AppState,
    needle: Option<&str>,
    slug: Option<&str>,
    out: Output,
) -> Result<()> {
    let spinner_msg = format!("Generating narration ({})...", state.studio.audio().primary_name());

    if let Some(slug) = slug {
        let spinner = spinner(spinner_msg, out.spinner_hidden());
        let result = state.studio.narrate_story(slug).await;
        spinner.finish_and_clear();
        let story = result?;

        if out.json {
            println!(
                "{}",
                serde_json::json!({"narrated": true, "storyId": story.id, "slug": story.slug})
            );
        } else if !out.quiet {
            println!(
                "  {} Narration attached to '{}'",
                style("✓").green().bold(),
                style(&story.title).cyan()
            );
        }
        return Ok(());
    }

    let Some(needle) = needle else {
        bail!("pass a post id or --slug");
    };
    let id = resolve(state, needle).await?;

    let spinner = spinner(spinner_msg, out.spinner_hidden());
    let result = state.studio.narrate_post(&id).await;
    spinner.finish_and_clear();
    let post = result?;

    if out.json {
        println!("{}", serde_json::to_string_pretty(&post)?);
    } else if !out.quiet {
        println!(
            "  {} Narration attached to '{}'",
            style("✓").green().bold(),
            style(&post.title).cyan()
        );
    }
    Ok(())
}

/// Format a timestamp as relative time (e.g., "2 hours ago").
fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let secs = Utc::now().signed_duration_since(*dt).num_seconds().max(0);

    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        let mins = secs / 60;
        format!("{mins} min{} ago", if mins == 1 { "" } else { "s" })
    } else if secs < 86400 {
        let hours = secs / 3600;
        format!("{hours} hour{} ago", if hours == 1 { "" } else { "s" })
    } else {
        let days = secs / 86400;
        format!("{days} day{} ago", if days == 1 { "" } else { "s" })
    }
}
