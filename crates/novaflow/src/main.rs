mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "novaflow")]
#[command(
    about = "Converge an OpenStack project toward a declared server layout",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    credentials: utils::CredentialArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing servers and wait until they leave BUILD
    Apply {
        /// Resource file (YAML, top-level `resources` mapping)
        resources: PathBuf,
        /// User data file passed to every new server
        user_data: PathBuf,
        /// Keypair name injected into new servers
        key_name: String,
        /// Project tag appended to generated server names
        #[arg(short = 't', long)]
        project_tag: Option<String>,
        /// Mappings file translating image/flavor/network names to ids
        #[arg(short, long)]
        mappings: Option<PathBuf>,
        /// Seconds between status polls
        #[arg(long, default_value = "5")]
        poll_interval: u64,
    },
    /// Show which servers would be created
    Plan {
        /// Resource file (YAML, top-level `resources` mapping)
        resources: PathBuf,
        /// Project tag appended to generated server names
        #[arg(short = 't', long)]
        project_tag: Option<String>,
    },
    /// List existing servers
    List {
        /// Only servers whose name contains this tag
        #[arg(short = 't', long)]
        project_tag: Option<String>,
        /// Print server ids instead of names
        #[arg(long)]
        ids: bool,
    },
    /// Delete every server whose name contains the project tag
    Delete {
        /// Project tag
        project_tag: String,
        /// Actually delete (otherwise only show what would be deleted)
        #[arg(short, long)]
        yes: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries command output, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let credentials = cli.credentials;

    match cli.command {
        Commands::Apply {
            resources,
            user_data,
            key_name,
            project_tag,
            mappings,
            poll_interval,
        } => {
            let provider = credentials.into_provider()?;
            commands::apply::handle(
                &provider,
                &resources,
                &user_data,
                &key_name,
                project_tag.as_deref(),
                mappings.as_deref(),
                std::time::Duration::from_secs(poll_interval),
            )
            .await?;
        }
        Commands::Plan {
            resources,
            project_tag,
        } => {
            let provider = credentials.into_provider()?;
            commands::plan::handle(&provider, &resources, project_tag.as_deref()).await?;
        }
        Commands::List { project_tag, ids } => {
            let provider = credentials.into_provider()?;
            commands::list::handle(&provider, project_tag.as_deref(), ids).await?;
        }
        Commands::Delete { project_tag, yes } => {
            let provider = credentials.into_provider()?;
            commands::delete::handle(&provider, &project_tag, yes).await?;
        }
        Commands::Version => {
            println!("novaflow {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
