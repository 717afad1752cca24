//! StudyMate command-line entry point
//!
//! Run with: cargo run -p studymate -- [COMMAND]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use studymate::cli::{format_report, Shell};
use studymate::config::WorkspaceConfig;
use studymate::{StudyMate, StudyMateConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "studymate", version, about = "Chat with your PDFs, one study session at a time")]
struct Cli {
    #[arg(long, short = 'c', global = true, help = "Path to a TOML config file")]
    config: Option<PathBuf>,

    #[arg(
        long,
        short = 'w',
        global = true,
        help = "Directory holding sessions.txt and the vector database"
    )]
    workspace: Option<PathBuf>,

    #[arg(long, short = 'v', global = true, help = "Log debug output to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Open the interactive menu (default)")]
    Menu,
    #[command(about = "Create a new session")]
    Create {
        #[arg(help = "Session name (no whitespace)")]
        name: String,
    },
    #[command(about = "Add PDF documents to a session")]
    Add {
        #[arg(help = "Session name")]
        session: String,
        #[arg(required = true, help = "PDF files to ingest")]
        paths: Vec<PathBuf>,
    },
    #[command(about = "List all sessions")]
    List,
    #[command(about = "Ask one question against a session")]
    Ask {
        #[arg(help = "Session name")]
        session: String,
        #[arg(required = true, num_args = 1.., help = "Question text")]
        question: Vec<String>,
    },
    #[command(about = "Delete a session and its documents")]
    Delete {
        #[arg(help = "Session name")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "studymate=debug" } else { "studymate=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = StudyMateConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.workspace {
        config.workspace = WorkspaceConfig::in_dir(dir);
    }

    tracing::debug!("Configuration loaded");
    tracing::debug!("  - Embedding model: {}", config.embeddings.model);
    tracing::debug!("  - LLM model: {}", config.llm.model);
    tracing::debug!(
        "  - Chunk size: {} (overlap {})",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::debug!("  - Top k: {}", config.retrieval.top_k);

    let app = StudyMate::from_config(config)?;

    let command = cli.command.unwrap_or(Commands::Menu);
    let needs_embeddings = matches!(
        command,
        Commands::Menu | Commands::Add { .. } | Commands::Ask { .. }
    );
    if needs_embeddings && !app.embedder_available().await {
        tracing::warn!(
            "Ollama not available at {}, adding documents and chatting will fail",
            app.config().embeddings.base_url
        );
        tracing::warn!(
            "Start it with `ollama serve` and pull the model: ollama pull {}",
            app.config().embeddings.model
        );
    }

    match command {
        Commands::Menu => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            Shell::new(&app, stdin.lock(), stdout.lock()).run().await?;
        }
        Commands::Create { name } => {
            app.create_session(&name).await?;
            println!("Session '{}' created successfully!", name);
        }
        Commands::Add { session, paths } => {
            let outcomes = app.add_documents(&session, &paths).await?;
            let failed = outcomes.iter().filter(|(_, o)| o.is_err()).count();

            for (path, outcome) in outcomes {
                match outcome {
                    Ok(report) => println!("{}", format_report(&report)),
                    Err(e) => eprintln!("{} {}: {}", style("failed").red(), path.display(), e),
                }
            }

            if failed > 0 {
                anyhow::bail!("{} of {} document(s) could not be added", failed, paths.len());
            }
        }
        Commands::List => {
            let sessions = app.list_sessions();
            if sessions.is_empty() {
                println!("Session list is empty. First add some sessions.");
            }
            for name in sessions {
                println!("{}", name);
            }
        }
        Commands::Ask { session, question } => {
            let answer = app.ask(&session, &question.join(" ")).await?;
            println!("Answer: {}", answer.answer);

            if app.config().retrieval.show_sources {
                for citation in &answer.citations {
                    println!("  - {}", citation.format_inline());
                }
            }
        }
        Commands::Delete { name } => {
            app.delete_session(&name).await?;
            println!("Session '{}' deleted successfully.", name);
        }
    }

    Ok(())
}
