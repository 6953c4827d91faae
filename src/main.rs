use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use regional_pool::build::{build_season_pool, score_event, PoolRequest, Progress};
use regional_pool::config::{Config, SourceKind};
use regional_pool::error::SeasonError;
use regional_pool::source::{DirectorySource, EventSource, RemoteSource, ResponseCache};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_SOURCE: i32 = 2;
const EXIT_CONFIG: i32 = 4;
const EXIT_SEASON: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score one event and print every team's point breakdown
    Score {
        /// Season the event belongs to
        season: u16,
        /// Event code
        event: String,
        /// Show only this team, with per-category detail
        #[arg(long)]
        team: Option<u32>,
        /// Score under another season's rules
        #[arg(long)]
        rules_season: Option<u16>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Build the regional pool standings for a season
    Pool {
        season: u16,
        /// Last week to include (defaults to the season's last week)
        #[arg(short, long)]
        week: Option<u32>,
        /// Number of entries to list; pads with at-large teams
        #[arg(short = 'n', long)]
        top: Option<usize>,
        /// Allocate under another season's rules
        #[arg(long)]
        rules_season: Option<u16>,
        /// Print JSON instead of a table
        #[arg(long, conflicts_with = "tsv")]
        json: bool,
        /// Print tab-separated values
        #[arg(long)]
        tsv: bool,
    },
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
        /// Season the default rules are written for
        #[arg(long, default_value_t = 2026)]
        season: u16,
    },
    /// Delete cached event data responses
    ClearCache,
}

#[derive(Parser, Debug)]
#[command(name = "regional-pool")]
#[command(about = "Regional points and season pool standings", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/regional-pool/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bypass the response cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "regional_pool=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_code(err: &SeasonError) -> i32 {
    match err {
        SeasonError::InvalidRuleConfig(_) => EXIT_CONFIG,
        SeasonError::Listing { .. } | SeasonError::EventUnavailable { .. } => EXIT_SOURCE,
        _ => EXIT_SEASON,
    }
}

fn make_source(config: &Config, no_cache: bool) -> Result<Box<dyn EventSource>> {
    match config.source.kind {
        SourceKind::Directory => {
            let path = config
                .source
                .path
                .clone()
                .context("source.path is required for a directory source")?;
            Ok(Box::new(DirectorySource::new(path)))
        }
        SourceKind::Remote => {
            let url = config
                .source
                .url
                .as_deref()
                .context("source.url is required for a remote source")?;
            let cache = ResponseCache::new(
                regional_pool::source::get_cache_path(),
                config.cache.ttl()?,
                config.cache.enabled && !no_cache,
            );
            Ok(Box::new(RemoteSource::new(url, cache)?))
        }
    }
}

fn load(cli: &Cli) -> (Config, Box<dyn EventSource>) {
    let config = match regional_pool::config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    let source = match make_source(&config, cli.no_cache) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    if cli.verbose {
        let cache_status = if config.source.kind == SourceKind::Remote
            && config.cache.enabled
            && !cli.no_cache
        {
            "enabled"
        } else {
            "disabled"
        };
        eprintln!("Source: {:?}, cache: {}", config.source.kind, cache_status);
    }
    (config, source)
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let start_time = Instant::now();
    let use_colors = regional_pool::output::should_use_colors();

    match &cli.command {
        Commands::Init { force, season } => {
            let path = match cli.config.clone() {
                Some(path) => path,
                None => match regional_pool::config::get_config_path() {
                    Ok(path) => path,
                    Err(e) => {
                        eprintln!("Config error: {:#}", e);
                        std::process::exit(EXIT_CONFIG);
                    }
                },
            };
            if let Err(e) = regional_pool::config::run_init(&path, *season, *force) {
                eprintln!("Config error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
            println!("Wrote default config to {}", path.display());
        }
        Commands::ClearCache => {
            if let Err(e) = regional_pool::source::clear_cache() {
                eprintln!("Failed to clear cache: {:#}", e);
                std::process::exit(EXIT_SOURCE);
            }
            println!("Cache cleared.");
        }
        Commands::Score {
            season,
            event,
            team,
            rules_season,
            json,
        } => {
            let (config, source) = load(&cli);
            let rules = config.rules_for(rules_season.unwrap_or(*season));

            let scored = match score_event(source.as_ref(), *season, event, &rules).await {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(exit_code(&e));
                }
            };

            if let Some(team) = team {
                let Some(breakdown) = scored.breakdowns.get(team) else {
                    eprintln!("Team {} has no breakdown at {}", team, event);
                    std::process::exit(EXIT_SEASON);
                };
                if *json {
                    print_json(breakdown);
                } else {
                    println!(
                        "{}",
                        regional_pool::output::format_breakdown_detail(breakdown, use_colors)
                    );
                }
            } else if *json {
                print_json(&scored);
            } else {
                println!("{}", regional_pool::output::format_event_table(&scored, use_colors));
                if cli.verbose {
                    for breakdown in scored.by_total() {
                        println!();
                        println!(
                            "{}",
                            regional_pool::output::format_breakdown_detail(breakdown, use_colors)
                        );
                    }
                }
            }
        }
        Commands::Pool {
            season,
            week,
            top,
            rules_season,
            json,
            tsv,
        } => {
            let (config, source) = load(&cli);
            let rules_season = rules_season.unwrap_or(*season);
            let rules = config.rules_for(rules_season);
            let request = PoolRequest {
                season: *season,
                rules_season,
                through_week: *week,
                top_n: *top,
                concurrency: config.source.concurrency,
            };

            let show_progress = std::io::stderr().is_terminal() && !cli.verbose;
            let mut progress = |p: &Progress| {
                if show_progress {
                    eprint!("\r\x1b[K[{}/{}] {}", p.processed, p.total, p.event);
                }
            };

            let result =
                build_season_pool(source.as_ref(), &request, &rules, Some(&mut progress)).await;
            if show_progress {
                eprint!("\r\x1b[K");
            }
            let pool = match result {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(exit_code(&e));
                }
            };

            if *json {
                print_json(&pool);
            } else if *tsv {
                println!("{}", regional_pool::output::format_pool_tsv(&pool));
            } else {
                println!("{}", regional_pool::output::format_pool_table(&pool, use_colors));
                eprintln!();
                eprintln!("{}", regional_pool::output::format_pool_summary(&pool, use_colors));
            }

            if cli.verbose {
                eprintln!("Built in {:?}", start_time.elapsed());
            }
        }
    }

    std::process::exit(EXIT_SUCCESS);
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value).context("Failed to serialize output") {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(EXIT_SEASON);
        }
    }
}
