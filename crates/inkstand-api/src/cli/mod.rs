//! CLI command definitions for the `inkstand` binary.
//!
//! Verb-style commands over local posts (`generate`, `list`, `publish`, ...)
//! plus the published-story view and the text-to-speech server.

pub mod auth;
pub mod post;
pub mod status;
pub mod story;

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use indicatif::{ProgressBar, ProgressStyle};

use inkstand_observe::tracing_setup::TracingOptions;
use inkstand_types::post::{PostLength, PostStatus, Tone};

/// Generate, publish and narrate blog posts.
#[derive(Parser)]
#[command(name = "inkstand", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format on stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Human, env = "INKSTAND_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, env = "INKSTAND_OTEL", global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Human,
    Json,
}

impl Cli {
    pub fn tracing_options(&self) -> TracingOptions {
        TracingOptions {
            verbosity: self.verbose,
            quiet: self.quiet,
            json: self.log_format == LogFormat::Json,
            otel: self.otel,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an admin session (valid for 24 hours).
    Login {
        /// Password; prompted for when omitted.
        #[arg(long, env = "INKSTAND_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// End the admin session.
    Logout,

    /// Session, rate limit and configuration overview.
    Status,

    /// Generate a new post from a theme.
    #[command(alias = "gen")]
    Generate {
        /// What the post is about.
        theme: String,

        #[arg(long, default_value_t = Tone::default())]
        tone: Tone,

        #[arg(long, default_value_t = PostLength::default())]
        length: PostLength,
    },

    /// List local posts, newest first.
    #[command(alias = "ls")]
    List {
        /// Only posts with this status.
        #[arg(long)]
        status: Option<PostStatus>,
    },

    /// Show one post in full.
    Show {
        /// Post id or unique id prefix.
        id: String,
    },

    /// Edit fields of a local post.
    Edit {
        /// Post id or unique id prefix.
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        excerpt: Option<String>,

        /// Markdown body.
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,

        /// Read the markdown body from a file.
        #[arg(long)]
        content_file: Option<std::path::PathBuf>,

        #[arg(long)]
        image_url: Option<String>,

        #[arg(long)]
        theme: Option<String>,

        #[arg(long)]
        tone: Option<Tone>,

        #[arg(long)]
        length: Option<PostLength>,
    },

    /// Regenerate the text and image of a post from its theme.
    Regenerate {
        /// Post id or unique id prefix.
        id: String,
    },

    /// Publish a post to the CMS (create or update).
    Publish {
        /// Post id or unique id prefix.
        id: String,
    },

    /// Delete a local post. The CMS story is kept.
    #[command(alias = "rm")]
    Delete {
        /// Post id or unique id prefix.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Generate narration and attach it to the published story.
    Narrate {
        /// Local post id or unique id prefix.
        #[arg(required_unless_present = "slug")]
        id: Option<String>,

        /// Narrate a published story by slug instead of a local post.
        #[arg(long, conflicts_with = "id")]
        slug: Option<String>,
    },

    /// List published stories from the CMS.
    Stories,

    /// Serve the text-to-speech function.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "8888")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Commands {
    /// Commands that manage posts need an unexpired session.
    pub fn requires_session(&self) -> bool {
        !matches!(
            self,
            Commands::Login { .. }
                | Commands::Logout
                | Commands::Status
                | Commands::Stories
                | Commands::Serve { .. }
                | Commands::Completions { .. }
        )
    }
}

/// Output flags shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn spinner_hidden(&self) -> bool {
        self.json || self.quiet
    }
}

/// Steady spinner for a network-bound step. Hidden when `hidden` is set.
pub fn spinner(message: impl Into<String>, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// First 8 characters of an id, for tables.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_generate_with_defaults() {
        let cli = Cli::try_parse_from(["inkstand", "generate", "Coffee rituals"]).unwrap();
        match cli.command {
            Commands::Generate { theme, tone, length } => {
                assert_eq!(theme, "Coffee rituals");
                assert_eq!(tone, Tone::Professional);
                assert_eq!(length, PostLength::Medium);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_parses_tone_and_length() {
        let cli = Cli::try_parse_from([
            "inkstand", "--json", "generate", "coffee", "--tone", "casual", "--length", "short",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Generate {
                tone: Tone::Casual,
                length: PostLength::Short,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_unknown_tone() {
        assert!(Cli::try_parse_from(["inkstand", "generate", "x", "--tone", "grumpy"]).is_err());
    }

    #[test]
    fn test_narrate_needs_id_or_slug() {
        assert!(Cli::try_parse_from(["inkstand", "narrate"]).is_err());
        assert!(Cli::try_parse_from(["inkstand", "narrate", "abc", "--slug", "x"]).is_err());
        assert!(Cli::try_parse_from(["inkstand", "narrate", "--slug", "coffee"]).is_ok());
    }

    #[test]
    fn test_session_gating() {
        let gated = |args: &[&str]| {
            Cli::try_parse_from(args).unwrap().command.requires_session()
        };
        assert!(!gated(&["inkstand", "login", "--password", "p"]));
        assert!(!gated(&["inkstand", "status"]));
        assert!(!gated(&["inkstand", "stories"]));
        assert!(!gated(&["inkstand", "serve"]));
        assert!(gated(&["inkstand", "list"]));
        assert!(gated(&["inkstand", "publish", "abc"]));
        assert!(gated(&["inkstand", "delete", "abc", "--force"]));
    }

    #[test]
    fn test_default_tracing_options_are_human() {
        let cli = Cli::try_parse_from(["inkstand", "-vv", "status"]).unwrap();
        let options = cli.tracing_options();
        assert_eq!(options.verbosity, 2);
        assert!(!options.json);
        assert!(!options.otel);
        assert!(!options.quiet);
    }

    #[test]
    fn test_log_format_and_otel_flags() {
        let cli = Cli::try_parse_from([
            "inkstand", "list", "--log-format", "json", "--otel", "--quiet",
        ])
        .unwrap();
        let options = cli.tracing_options();
        assert!(options.json);
        assert!(options.otel);
        assert!(options.quiet);
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["inkstand", "--log-format", "xml", "status"]).is_err());
    }

    #[test]
    fn test_short_id_truncates() {
        assert_eq!(short_id("0192f3a4-aaaa"), "0192f3a4");
        assert_eq!(short_id("abc"), "abc");
    }
}
