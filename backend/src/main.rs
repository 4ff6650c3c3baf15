//! Gigscope CLI - concert data aggregator
//!
//! # Main Commands
//!
//! ```bash
//! gigscope                          # Start HTTP server (port 8080)
//! gigscope serve --addr 0.0.0.0:3000
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! gigscope fetch                    # Fetch once, print joined artists
//! gigscope events -o events.json    # Fetch once, write chronological events
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use gigscope::client::{UpstreamClient, DEFAULT_API_BASE, DEFAULT_FETCH_TIMEOUT};
use gigscope::config::{normalize_api_base, Config};
use gigscope::{build_events, merge_artists, start_server, DataBundle};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gigscope")]
#[command(about = "Aggregate concert data and serve it as JSON and HTML", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server (default)
    Serve(ServeArgs),

    /// Fetch all upstream collections once and print the joined artists
    Fetch {
        /// Upstream API base URL
        #[arg(long, env = "API", default_value = DEFAULT_API_BASE)]
        api: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch all upstream collections once and print the concert list
    Events {
        /// Upstream API base URL
        #[arg(long, env = "API", default_value = DEFAULT_API_BASE)]
        api: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "ADDR", default_value = "0.0.0.0:8080")]
    addr: String,

    /// Upstream API base URL
    #[arg(long, env = "API", default_value = DEFAULT_API_BASE)]
    api: String,

    /// Directory with css/, js/ and image/ assets
    #[arg(long, env = "STATIC", default_value = "static")]
    static_dir: PathBuf,

    /// Spotify client id (enables artist search enrichment)
    #[arg(long, env = "SPOTIFY_CLIENT_ID", default_value = "", hide_env_values = true)]
    spotify_client_id: String,

    /// Spotify client secret
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", default_value = "", hide_env_values = true)]
    spotify_client_secret: String,

    /// Per-call upstream timeout, in seconds
    #[arg(long, env = "FETCH_TIMEOUT", default_value = "10")]
    fetch_timeout: u64,

    /// Startup prefetch bound, in seconds
    #[arg(long, env = "PREFETCH_TIMEOUT", default_value = "15")]
    prefetch_timeout: u64,

    /// Per-call Spotify timeout, in seconds
    #[arg(long, env = "SECONDARY_TIMEOUT", default_value = "8")]
    secondary_timeout: u64,
}

impl From<ServeArgs> for Config {
    fn from(args: ServeArgs) -> Self {
        Config {
            bind_addr: args.addr,
            api_base: args.api,
            static_dir: args.static_dir,
            spotify_client_id: args.spotify_client_id,
            spotify_client_secret: args.spotify_client_secret,
            fetch_timeout: Duration::from_secs(args.fetch_timeout),
            prefetch_timeout: Duration::from_secs(args.prefetch_timeout),
            secondary_timeout: Duration::from_secs(args.secondary_timeout),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    // Logs go to stderr so `fetch` / `events` output stays pipeable.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Serve(args)) => cmd_serve(args).await,
        None => cmd_serve(cli.serve).await,
        Some(Commands::Fetch { api, output }) => cmd_fetch(&api, output.as_deref()).await,
        Some(Commands::Events { api, output }) => cmd_events(&api, output.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    start_server(Config::from(args)).await?;
    Ok(())
}

async fn fetch_bundle(api: &str) -> Result<DataBundle, Box<dyn std::error::Error>> {
    let client = UpstreamClient::new(&normalize_api_base(api), DEFAULT_FETCH_TIMEOUT)?;
    eprintln!("📡 Fetching: {}", client.base_url());

    let bundle = client.fetch_all().await?;
    eprintln!(
        "   {} artists, {} locations, {} dates, {} relations",
        bundle.artists.len(),
        bundle.locations.len(),
        bundle.dates.len(),
        bundle.relations.len()
    );

    Ok(bundle)
}

async fn cmd_fetch(api: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let artists = merge_artists(fetch_bundle(api).await?);
    eprintln!("✅ Joined {} artists", artists.len());

    let json = serde_json::to_string_pretty(&artists)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_events(api: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let bundle = fetch_bundle(api).await?;
    let events = build_events(&bundle.artists, &bundle.relations);
    eprintln!("✅ Built {} events", events.len());

    let json = serde_json::to_string_pretty(&events)?;
    write_output(&json, output)?;

    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
