//! quizforge CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizforge", version, about = "Adaptive quiz-session engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive quiz session
    Run {
        /// Student identifier
        #[arg(long, default_value = "demo-student")]
        student: String,

        /// Assigned quiz identifier
        #[arg(long, default_value = "demo-quiz")]
        quiz: String,

        /// Session data TOML (students, assignments, subtopics)
        #[arg(long)]
        session_file: Option<PathBuf>,

        /// Provider to use (defaults to the configured default)
        #[arg(long)]
        provider: Option<String>,

        /// Model to use (defaults to the configured default)
        #[arg(long)]
        model: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Run offline with built-in sample data and a canned question set
        #[arg(long)]
        demo: bool,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example session data
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizforge=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            student,
            quiz,
            session_file,
            provider,
            model,
            config,
            demo,
        } => commands::run::execute(student, quiz, session_file, provider, model, config, demo)
            .await,
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config)
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
