mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    artifact::ArtifactSubcommand, checklist::ChecklistSubcommand, config::ConfigSubcommand,
    session::SessionSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "trail",
    about = "Track sessions, their artifacts, and checklists across a multi-stage delivery workflow",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .trail/ or .git/)
    #[arg(long, global = true, env = "TRAIL_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize trail in the current project
    Init,

    /// Start, list, and inspect sessions
    Session {
        #[command(subcommand)]
        subcommand: SessionSubcommand,
    },

    /// Write, show, and list session artifacts
    Artifact {
        #[command(subcommand)]
        subcommand: ArtifactSubcommand,
    },

    /// Update a session checklist by hand
    Checklist {
        #[command(subcommand)]
        subcommand: ChecklistSubcommand,
    },

    /// Run a workflow command: load its inputs, write its artifact, check it off
    Run {
        /// Command name, e.g. research-plan or review:security
        command: String,
        /// Session slug (default: most recently started session)
        #[arg(long)]
        session: Option<String>,
        /// Topic, used in the filename of dated artifacts
        #[arg(long)]
        topic: Option<String>,
        /// Read the artifact body from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
        /// Path (relative to the session) of the artifact this one replaces
        #[arg(long)]
        supersedes: Option<String>,
    },

    /// Suggest the next workflow command for a session
    Next {
        /// Session slug (default: most recently started session)
        #[arg(long)]
        session: Option<String>,
    },

    /// List workflow commands and the artifacts they read and write
    Commands,

    /// Validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Session { subcommand } => cmd::session::run(&root, subcommand, cli.json),
        Commands::Artifact { subcommand } => cmd::artifact::run(&root, subcommand, cli.json),
        Commands::Checklist { subcommand } => cmd::checklist::run(&root, subcommand, cli.json),
        Commands::Run {
            command,
            session,
            topic,
            file,
            supersedes,
        } => cmd::run::run(
            &root,
            cmd::run::RunArgs {
                command,
                session,
                topic,
                file,
                supersedes,
            },
            cli.json,
        ),
        Commands::Next { session } => cmd::next::run(&root, session.as_deref(), cli.json),
        Commands::Commands => cmd::commands::run(cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
