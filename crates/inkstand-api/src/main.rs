//! Inkstand CLI and text-to-speech function entry point.
//!
//! Binary name: `inkstand`
//!
//! Parses CLI arguments, initializes storage and services, then dispatches
//! to the matching command handler or starts the function server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use console::style;

use cli::post::EditArgs;
use cli::{Cli, Commands, Output};
use inkstand_observe::tracing_setup::{init_tracing, shutdown_tracing};
use inkstand_types::error::StudioError;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli.tracing_options()) {
        eprintln!("warning: tracing disabled: {e}");
    }

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "inkstand", &mut std::io::stdout());
        return Ok(());
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;
    let out = Output {
        json: cli.json,
        quiet: cli.quiet,
    };

    if cli.command.requires_session() && !state.session.is_authenticated().await {
        return Err(StudioError::Unauthenticated.into());
    }

    match cli.command {
        Commands::Login { password } => cli::auth::login(&state, password, out).await?,

        Commands::Logout => cli::auth::logout(&state, out).await?,

        Commands::Status => cli::status::status(&state, cli.json).await?,

        Commands::Generate {
            theme,
            tone,
            length,
        } => cli::post::generate_post(&state, theme, tone, length, out).await?,

        Commands::List { status } => cli::post::list_posts(&state, status, out).await?,

        Commands::Show { id } => cli::post::show_post(&state, &id, out).await?,

        Commands::Edit {
            id,
            title,
            excerpt,
            content,
            content_file,
            image_url,
            theme,
            tone,
            length,
        } => {
            let args = EditArgs {
                title,
                excerpt,
                content,
                content_file,
                image_url,
                theme,
                tone,
                length,
            };
            cli::post::edit_post(&state, &id, args, out).await?;
        }

        Commands::Regenerate { id } => cli::post::regenerate_post(&state, &id, out).await?,

        Commands::Publish { id } => cli::post::publish_post(&state, &id, out).await?,

        Commands::Delete { id, force } => cli::post::delete_post(&state, &id, force, out).await?,

        Commands::Narrate { id, slug } => {
            cli::post::narrate(&state, id.as_deref(), slug.as_deref(), out).await?;
        }

        Commands::Stories => cli::story::list_stories(&state, cli.json).await?,

        Commands::Serve { port, host } => {
            let function = http::function::FunctionState::from_config(&state.http_client, &state.config);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Text-to-speech function listening on {}",
                style("⚡").bold(),
                style(format!("http://{addr}{}", http::function::TTS_PATH)).cyan()
            );
            println!("  {}", style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(function);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled before state init"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
