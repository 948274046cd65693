use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use threadsync::api::{ApiClient, HttpTransport};
use threadsync::config::Config;
use threadsync::rate_limit::{Endpoint, RateLimiter};
use threadsync::storage::ThreadStorage;
use threadsync::{sync, url};

#[derive(Parser)]
#[command(name = "threadsync", version, about = "Sync Twitter/X bookmarks and reconstruct full threads")]
struct Cli {
    /// Path to configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch new bookmarks and reconstruct their threads
    Sync,
    /// Reconstruct and save a single post by URL or id
    Add { url: String },
    /// List saved threads, newest first
    List,
    /// Show storage stats and check the API connection
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "threadsync=debug"
    } else {
        "threadsync=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let mut config = Config::load(&config_path)?;

    let mut storage = ThreadStorage::open(&config.data_dir(), &config.threads_dir())
        .context("opening thread storage")?;

    match cli.command {
        Commands::Sync => {
            let mut client = build_client(&config);
            let report = sync::sync_bookmarks(
                &mut client,
                &mut storage,
                config.api.max_results,
                config.sync.max_chain_depth,
            )
            .await?;
            persist_rotated_tokens(&client, &mut config, &config_path)?;

            println!(
                "Sync complete: {} bookmarks, {} already processed, {} saved, {} failed",
                report.fetched, report.already_processed, report.saved, report.failed
            );
        }
        Commands::Add { url: input } => {
            let Some(post_id) = url::extract_post_id(&input) else {
                bail!("could not extract a post id from '{input}'");
            };

            let mut client = build_client(&config);
            let post = client.post(&post_id, false).await?;
            let count =
                sync::process_post(&mut client, &mut storage, &post, config.sync.max_chain_depth)
                    .await?;
            persist_rotated_tokens(&client, &mut config, &config_path)?;

            println!("Saved thread with {count} post(s) for {post_id}");
        }
        Commands::List => {
            let threads = storage.list_threads();
            if threads.is_empty() {
                println!("No saved threads yet");
                return Ok(());
            }
            for thread in &threads {
                println!(
                    "{}  @{}  {} post(s)  saved {}  {}",
                    thread.tweet_id,
                    thread.author,
                    thread.tweet_count,
                    thread.saved_at.format("%Y-%m-%d %H:%M"),
                    thread.url
                );
            }
            println!("\nTotal: {} thread(s)", threads.len());
        }
        Commands::Status => {
            let stats = storage.stats();
            println!("Threads saved:     {}", stats.total_threads);
            println!("Posts processed:   {}", stats.total_processed);
            println!("Storage path:      {}", stats.storage_path.display());

            let mut client = build_client(&config);
            match client.user_id().await {
                Ok(user_id) => {
                    println!("API connection:    ok (user id {user_id})");
                    if let Some((remaining, reset)) = client.quota_snapshot(Endpoint::UserLookup) {
                        if let Some(remaining) = remaining {
                            println!("Quota remaining:   {remaining}");
                        }
                        if let Some(reset) = reset {
                            println!("Quota resets at:   {}", reset.format("%H:%M:%S"));
                        }
                    }
                }
                Err(err) => println!("API connection:    failed ({err})"),
            }
            persist_rotated_tokens(&client, &mut config, &config_path)?;
        }
    }

    Ok(())
}

fn build_client(config: &Config) -> ApiClient<HttpTransport> {
    ApiClient::new(
        HttpTransport::new(),
        config.credentials(),
        config.tokens(),
        RateLimiter::new(config.fallback_wait()),
    )
}

/// A refresh may rotate the token pair; write it back so the next run still
/// authenticates.
fn persist_rotated_tokens(
    client: &ApiClient<HttpTransport>,
    config: &mut Config,
    path: &std::path::Path,
) -> Result<()> {
    if client.tokens_rotated() {
        config.set_tokens(client.tokens());
        config.save(path).context("persisting rotated tokens")?;
    }
    Ok(())
}
