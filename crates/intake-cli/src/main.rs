//! Intake CLI - offline-first structured data capture from the terminal
//!
//! Records are saved locally first and reconciled with the remote service
//! on `intake sync`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod auth;
mod commands;
mod error;

use commands::add::run_add;
use commands::auth_cmd::{run_login, run_logout};
use commands::common::resolve_db_path;
use commands::list::{run_delete, run_list, run_show};
use commands::schema_cmd::{run_schema_push, run_schema_show};
use commands::sync::run_sync;
use error::CliError;

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Capture structured records offline and sync them later")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional path to the local database file
    #[arg(long, value_name = "PATH", global = true)]
    db_path: Option<PathBuf>,

    /// API base URL (overrides INTAKE_API_URL)
    #[arg(long, value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Skip all network calls; resolve schemas from cache or the default
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a record: intake add firstName=Ama lastName=Mensah baptized=true
    #[command(alias = "new")]
    Add {
        /// Field values as name=value pairs
        fields: Vec<String>,
    },
    /// List records, newest first
    List {
        /// Only records awaiting sync
        #[arg(long)]
        pending: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one record as JSON
    Show {
        /// Record ID
        id: String,
    },
    /// Permanently delete a record
    Delete {
        /// Record ID
        id: String,
    },
    /// Submit pending records to the remote service
    Sync,
    /// Inspect or update the form schema
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Store a bearer token for authenticated calls
    Login {
        /// Token value
        token: String,
    },
    /// Forget the stored bearer token
    Logout,
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Print the active schema (remote, cached, or default)
    Show,
    /// Replace the remote schema from a JSON file of field definitions
    Push {
        /// Path to a JSON array of field definitions
        #[arg(short, long, value_name = "PATH")]
        file: PathBuf,
    },
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Add { fields } => run_add(&fields, cli.offline, cli.api_url, &db_path).await,
        Commands::List { pending, json } => run_list(pending, json, &db_path).await,
        Commands::Show { id } => run_show(&id, &db_path).await,
        Commands::Delete { id } => run_delete(&id, &db_path).await,
        Commands::Sync => run_sync(cli.offline, cli.api_url, &db_path).await,
        Commands::Schema { command } => match command {
            SchemaCommands::Show => run_schema_show(cli.offline, cli.api_url, &db_path).await,
            SchemaCommands::Push { file } => run_schema_push(&file, cli.api_url, &db_path).await,
        },
        Commands::Login { token } => run_login(&token, &db_path),
        Commands::Logout => run_logout(&db_path),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}
