mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use chunkvault_discord::DiscordStore;
use chunkvault_manifest::{Manifest, format_gib};
use chunkvault_orchestrator::Vault;
use chunkvault_protocol::{OperationId, TransferEvent};

use config::CliConfig;

#[derive(Parser)]
#[command(name = "chunkvault", version, about = "Store files as chunked Discord attachments")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Upload a file
    Upload { path: PathBuf },
    /// Download a previously uploaded file
    Download {
        name: String,
        /// Output directory (defaults to the configured download directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List uploaded files
    List,
    /// Show total stored size
    Usage,
    /// Write credentials and settings to the config file
    Configure {
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        guild_id: Option<String>,
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        download_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,chunkvault=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Configure {
            token,
            guild_id,
            chunk_size,
            download_dir,
        } => configure(token, guild_id, chunk_size, download_dir)?,
        Cmd::List => {
            let (_, manifest) = load().await?;
            for entry in manifest.load().await {
                println!(
                    "{}\t{}\t{} chunks",
                    entry.file_name,
                    entry.file_size,
                    entry.chunk_count()
                );
            }
        }
        Cmd::Usage => {
            let (_, manifest) = load().await?;
            println!("{} GB", format_gib(manifest.total_bytes().await));
        }
        Cmd::Upload { path } => {
            let (cfg, manifest) = load().await?;
            let vault = open_vault(&cfg, manifest)?;
            run_with_events(vault, |vault| async move {
                let entry = vault.upload(&path).await?;
                println!(
                    "uploaded {} ({} bytes, {} chunks)",
                    entry.file_name,
                    entry.file_size,
                    entry.chunk_count()
                );
                Ok(())
            })
            .await?;
        }
        Cmd::Download { name, out } => {
            let (cfg, manifest) = load().await?;
            let vault = open_vault(&cfg, manifest)?;
            let out = out.unwrap_or_else(|| vault.settings().download_dir.clone());
            run_with_events(vault, |vault| async move {
                let output = vault.download_to(&name, &out, &OperationId::new()).await?;
                println!("downloaded {}", output.display());
                Ok(())
            })
            .await?;
        }
    }

    Ok(())
}

async fn load() -> anyhow::Result<(CliConfig, Manifest)> {
    let cfg = CliConfig::load()?;
    let path = cfg.manifest_path()?;
    let manifest = Manifest::open(path.clone())
        .await
        .with_context(|| format!("opening manifest {}", path.display()))?;
    Ok((cfg, manifest))
}

fn configure(
    token: Option<String>,
    guild_id: Option<String>,
    chunk_size: Option<usize>,
    download_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let path = config::config_path()?;
    let mut cfg = CliConfig::load_from(&path)?;
    if let Some(token) = token {
        cfg.token = token;
    }
    if let Some(guild_id) = guild_id {
        cfg.guild_id = guild_id;
    }
    if let Some(chunk_size) = chunk_size {
        cfg.chunk_size = chunk_size;
    }
    if let Some(dir) = download_dir {
        cfg.download_dir = Some(dir);
    }
    cfg.save()?;
    println!("saved {}", path.display());
    Ok(())
}

fn open_vault(cfg: &CliConfig, manifest: Manifest) -> anyhow::Result<Vault> {
    cfg.require_credentials()?;

    let mut store = DiscordStore::new(&cfg.token, &cfg.guild_id)?;
    if let Some(base) = &cfg.api_base {
        store = store.with_base_url(base.as_str());
    }
    tracing::debug!(guild = %store.guild_id(), "discord store ready");

    Ok(Vault::new(Arc::new(store), manifest, cfg.vault_settings()))
}

/// Runs `op` while a background task prints the vault's events.
///
/// The vault is dropped once `op` finishes, which closes the event channel
/// and lets the printer drain and exit.
async fn run_with_events<F, Fut>(mut vault: Vault, op: F) -> anyhow::Result<()>
where
    F: FnOnce(Arc<Vault>) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<()>>,
{
    let printer = vault.take_events().map(|rx| tokio::spawn(print_events(rx)));

    let vault = Arc::new(vault);
    let result = op(vault.clone()).await;
    drop(vault);

    if let Some(printer) = printer {
        let _ = printer.await;
    }
    result
}

async fn print_events(mut rx: mpsc::Receiver<TransferEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            TransferEvent::Progress {
                direction, percent, ..
            } => eprintln!("{direction}: {percent:.1}%"),
            TransferEvent::UploadComplete { file_name, .. } => {
                eprintln!("upload complete: {file_name}")
            }
            TransferEvent::DownloadComplete { output_path, .. } => {
                eprintln!("download complete: {output_path}")
            }
            TransferEvent::Error {
                direction, message, ..
            } => eprintln!("{direction} error: {message}"),
        }
    }
}
