use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use feedimage::cli::{Cli, Commands};
use feedimage::config::Config;
use feedimage::domain::{Resolution, ResolvedImage};
use feedimage::errors::{FeedImageError, FeedImageResult};
use feedimage::http::{HostMatch, ReqwestTransport};
use feedimage::services::{BatchResolver, WaterfallResolver};
use feedimage::sources::RssFeedSource;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}

fn run() -> FeedImageResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    init_logging(&config);

    match cli.command {
        Commands::Resolve {
            feed_url,
            default_image,
            limit,
            workers,
            output_dir,
        } => cmd_resolve(&config, &feed_url, default_image, limit, workers, output_dir),
        Commands::Hosts { lookup } => cmd_hosts(&config, lookup),
        Commands::CleanTitle { title } => cmd_clean_title(&config, &title),
    }
}

fn cmd_resolve(
    config: &Config,
    feed_url: &str,
    default_image: Option<PathBuf>,
    limit: Option<usize>,
    workers: Option<usize>,
    output_dir: Option<PathBuf>,
) -> FeedImageResult<()> {
    if workers == Some(0) {
        return Err(FeedImageError::InvalidInput(
            "--workers must be at least 1".to_string(),
        ));
    }

    let transport = Arc::new(ReqwestTransport::new(
        config.fetch.connect_timeout,
        config.fetch.max_redirects,
    )?);
    let resolver = WaterfallResolver::from_config(config, transport)?;

    let source = RssFeedSource::new(config.fetch.page_timeout);
    let mut items = source.fetch_items(feed_url, default_image)?;
    if let Some(limit) = limit {
        items.truncate(limit);
    }

    if items.is_empty() {
        println!("No items in feed.");
        return Ok(());
    }

    if let Some(dir) = &output_dir {
        fs::create_dir_all(dir)?;
    }

    info!(feed = feed_url, items = items.len(), stages = ?resolver.stage_kinds(), "resolving feed");

    let batch = BatchResolver::new(&resolver, workers.unwrap_or(config.workers));
    let reports = batch.resolve_all(&items);

    let mut found = 0;
    for (item, report) in items.iter().zip(&reports) {
        match &report.resolution {
            Resolution::Found(image) => {
                found += 1;
                let saved = match &output_dir {
                    Some(dir) => Some(save_image(dir, image)?),
                    None => None,
                };
                println!(
                    "[{}] {} -> {} ({}x{} {}){}",
                    image.source_stage,
                    item.title,
                    image.source_url,
                    image.width,
                    image.height,
                    image.content_type,
                    saved
                        .map(|p| format!(" saved {}", p.display()))
                        .unwrap_or_default()
                );
                if let Some(attribution) = &image.attribution {
                    println!("    {}", attribution);
                }
            }
            Resolution::NotFound => {
                println!("[none] {}", item.title);
            }
        }
    }

    println!();
    println!("Resolved {} of {} items.", found, items.len());

    Ok(())
}

/// Same source URL, same file name. Existing files are left alone.
fn save_image(dir: &Path, image: &ResolvedImage) -> FeedImageResult<PathBuf> {
    let path = dir.join(image.file_name());
    if path.exists() {
        warn!(path = %path.display(), "image already saved");
        return Ok(path);
    }
    fs::write(&path, &image.bytes)?;
    Ok(path)
}

fn cmd_hosts(config: &Config, lookup: Option<String>) -> FeedImageResult<()> {
    let registry = config.host_registry()?;

    if let Some(host) = lookup {
        let profile = registry.lookup(&host);
        println!("{} -> {}", host, profile.name);
        for (name, value) in &profile.headers {
            println!("  {}: {}", name, value);
        }
        if profile.send_referer {
            println!("  Referer: <origin>");
        }
        return Ok(());
    }

    println!("Host policies (version {}):\n", registry.version());
    if registry.policies().is_empty() {
        println!("  No hosts configured.");
    }
    for policy in registry.policies() {
        let kind = match policy.match_kind {
            HostMatch::Exact => "exact",
            HostMatch::Suffix => "suffix",
        };
        println!("  {} [{}] -> {}", policy.host, kind, policy.profile);
    }
    println!();
    println!("Default profile: {}", registry.default_profile().name);

    Ok(())
}

fn cmd_clean_title(config: &Config, title: &str) -> FeedImageResult<()> {
    let cleaner = config.title_cleaner()?;
    let cleaned = cleaner.clean(title);

    if cleaned.is_empty() {
        println!("{}", config.stock.fallback_query);
    } else {
        println!("{}", cleaned);
    }

    Ok(())
}
