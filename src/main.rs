use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pixstore::config::RuntimeConfig;
use pixstore::{MediaService, Renditions};

#[derive(Debug, Parser)]
#[clap(name = "pixstore", about = "Media ingestion and storage operations tool.")]
struct Args {
    #[clap(short, long, env = "PIXSTORE_CONFIG", default_value = "config.yaml")]
    /// The path to the runtime config file (YAML or JSON).
    config: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Verifies the configured storage namespace is reachable.
    Check,

    /// Processes an image file and uploads its renditions.
    Upload {
        /// The source image file.
        file: PathBuf,

        #[clap(long)]
        owner: i64,

        #[clap(long)]
        resource: i64,
    },

    /// Deletes one asset by its three stored paths.
    Delete {
        #[clap(long)]
        thumb: String,

        #[clap(long)]
        medium: String,

        #[clap(long)]
        large: String,
    },

    /// Deletes every stored object belonging to a resource.
    Purge {
        #[clap(long)]
        owner: i64,

        #[clap(long)]
        resource: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pixstore=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let cfg = RuntimeConfig::from_file(&args.config)?;

    // The connect step runs the namespace probe for every command.
    let service = MediaService::connect(&cfg).await?;

    match args.command {
        Command::Check => {},
        Command::Upload {
            file,
            owner,
            resource,
        } => {
            let data = tokio::fs::read(&file).await?;
            let uploaded = service.upload_media(resource, owner, data.into()).await?;
            println!("{}", serde_json::to_string_pretty(&uploaded)?);
        },
        Command::Delete {
            thumb,
            medium,
            large,
        } => {
            let outcome = service
                .delete_media(&Renditions {
                    thumb,
                    medium,
                    large,
                })
                .await?;
            println!("{}", outcome);
        },
        Command::Purge { owner, resource } => {
            let outcome = service.delete_all_media_for_resource(owner, resource).await?;
            println!("{}", outcome);
        },
    }

    Ok(())
}
