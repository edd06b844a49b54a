//! focuscoach CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focuscoach", version, about = "Adaptive test-prep practice coach")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start or resume an interactive practice session
    Session {
        /// Learner identity the profile belongs to
        #[arg(long)]
        learner: String,

        /// Display name used when creating a new profile
        #[arg(long)]
        name: Option<String>,

        /// Email stored on a new profile
        #[arg(long)]
        email: Option<String>,

        /// Provider to generate content with (defaults to the config's)
        #[arg(long)]
        provider: Option<String>,

        /// Curriculum TOML file (defaults to the config's, then the built-in one)
        #[arg(long)]
        curriculum: Option<PathBuf>,

        /// Also write the diagnostic report card here (.txt, .md or .json)
        #[arg(long)]
        report_out: Option<PathBuf>,
    },

    /// Show the counselor roster of students
    Roster {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Manage skill templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Validate a curriculum file
    Validate {
        /// Curriculum TOML file (defaults to the config's, then the built-in one)
        #[arg(long)]
        curriculum: Option<PathBuf>,
    },

    /// Create a starter config and curriculum
    Init,
}

#[derive(Subcommand)]
enum TemplateAction {
    /// List stored templates
    List,
    /// Import templates from a JSON file (one object or an array)
    Import {
        /// JSON file to import
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("focuscoach=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Session {
            learner,
            name,
            email,
            provider,
            curriculum,
            report_out,
        } => {
            commands::session::execute(commands::session::SessionArgs {
                config,
                learner,
                name,
                email,
                provider,
                curriculum,
                report_out,
            })
            .await
        }
        Commands::Roster { format } => commands::roster::execute(config, format).await,
        Commands::Templates { action } => match action {
            TemplateAction::List => commands::templates::list(config).await,
            TemplateAction::Import { file } => commands::templates::import(config, file).await,
        },
        Commands::Validate { curriculum } => commands::validate::execute(config, curriculum),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
