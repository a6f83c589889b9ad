mod config;
mod logging;
mod ports;
mod services;
mod spotify_rs;
mod youtube_music_rs;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, OptionExt},
};

use crate::{
    config::Config,
    logging::{init_tracing, shutdown_tracing},
    ports::youtube_music::SearchFilter,
    services::{
        migration::{
            MigrationReport, MigrationRequest, PlaylistMigrator, progress::ConsoleProgress,
            worker::SearchOptions,
        },
        spotify::client::SpotifyHttpAdapter,
        youtube_music::client::YoutubeMusicHttpAdapter,
    },
    spotify_rs::{SpotifyCredentials, parse_playlist_id},
    youtube_music_rs::BrowserAuth,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, subcommand_negates_reqs = true)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "PLAYLIST_MIGRATOR_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `playlist_migrator=debug`
    #[arg(long, default_value = "warn", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// Export traces to this OTLP (gRPC) endpoint
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", global = true)]
    otlp_endpoint: Option<String>,

    #[command(flatten)]
    migrate: MigrateArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(ClapArgs, Debug)]
struct MigrateArgs {
    /// Spotify app credentials as client_id:client_secret
    #[arg(long, env = "SPOTIFY_CREDENTIALS", hide_env_values = true, required = true)]
    source_credentials: Option<SpotifyCredentials>,

    /// Spotify playlist URI, URL or id
    #[arg(long, required = true)]
    playlist_uri: Option<String>,

    /// Raw request headers copied from a logged-in music.youtube.com session,
    /// or @path to read them from a file
    #[arg(long, env = "YTMUSIC_AUTH_HEADERS", hide_env_values = true, required = true)]
    destination_auth: Option<String>,

    /// Kind of YouTube Music items to search for (default: videos)
    #[arg(long, value_enum)]
    playlist_type: Option<SearchFilter>,

    /// Number of search workers (default: 20)
    #[arg(long)]
    threads: Option<usize>,

    /// Don't let YouTube Music correct the spelling of search queries
    #[arg(long)]
    disable_destination_autocorrect: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let tracer_provider = init_tracing(
        "playlist-migrator",
        args.otlp_endpoint.as_deref(),
        &args.log_level,
    )?;

    let result = run(args).await;
    shutdown_tracing(tracer_provider);
    result
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        Some(Commands::Config(config_commands)) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                println!("{}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
        None => {
            log::debug!("Loading configuration");
            let config = Config::load(args.config.as_deref())
                .wrap_err("Failed to load playlist-migrator config")?;
            migrate(args.migrate, config).await?;
        }
    }

    Ok(())
}

async fn migrate(args: MigrateArgs, config: Config) -> Result<()> {
    let credentials = args
        .source_credentials
        .ok_or_eyre("--source-credentials is required")?;
    let playlist_uri = args.playlist_uri.ok_or_eyre("--playlist-uri is required")?;
    let destination_auth = args
        .destination_auth
        .ok_or_eyre("--destination-auth is required")?;

    let playlist_id = parse_playlist_id(&playlist_uri)?;
    let auth = BrowserAuth::from_raw_headers(&read_destination_auth(&destination_auth)?)
        .wrap_err("Invalid YouTube Music headers")?;

    let spotify = Arc::new(SpotifyHttpAdapter::new(
        credentials,
        config.spotify_api_base()?,
        config.spotify_accounts_base()?,
    ));
    let youtube_music_base = config.youtube_music_base_url()?;
    let searcher = Arc::new(
        YoutubeMusicHttpAdapter::anonymous(youtube_music_base.clone())
            .with_search_rate_limit(config.search.requests_per_second),
    );
    let library = Arc::new(YoutubeMusicHttpAdapter::authenticated(
        youtube_music_base,
        auth,
    ));

    let request = MigrationRequest {
        playlist_id,
        workers: args.threads.unwrap_or(config.threads),
        search: SearchOptions {
            filter: args.playlist_type.unwrap_or(config.playlist_type),
            ignore_spelling: args.disable_destination_autocorrect,
            retry: config.search_retry_policy(),
        },
        description: config.playlist_description.clone(),
        add_retry: config.retry_policy(),
    };
    log::info!(
        "Migrating Spotify playlist {} with {} workers",
        request.playlist_id,
        request.workers
    );

    let migrator = PlaylistMigrator::new(spotify, searcher, library, Arc::new(ConsoleProgress));
    let report = migrator.migrate(&request).await?;
    print_summary(&report);

    Ok(())
}

/// `@path` reads the headers from a file; anything else is the headers themselves.
fn read_destination_auth(raw: &str) -> Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read YouTube Music headers from {}", path)),
        None => Ok(raw.to_string()),
    }
}

fn print_summary(report: &MigrationReport) {
    log::info!(
        "YouTube Music playlist {} populated={} after {} add attempts",
        report.destination_playlist_id,
        report.populated,
        report.add_attempts
    );

    if !report.unresolved_names.is_empty() {
        println!(
            "[!] {} songs were not found on YouTube Music and must be added manually:",
            report.unresolved_names.len()
        );
        for name in &report.unresolved_names {
            println!("    - {}", name);
        }
    }

    if report.populated {
        println!(
            "[*] Finished! Playlist '{}' created on YouTube Music with {} of {} songs",
            report.playlist_name, report.resolved, report.source_total
        );
    } else {
        println!(
            "[!] Playlist '{}' was created on YouTube Music but its songs could not be added",
            report.playlist_name
        );
    }
}
