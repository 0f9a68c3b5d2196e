//! ghactivity - GitHub activity CLI
//!
//! Shows a user's profile and recent public events, optionally exporting
//! the processed list to a file.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ghactivity::activity::{
    ActivityService, DEFAULT_PAGE_SIZE, ProcessOptions, SortKey, parse_from_date, parse_to_date,
};
use ghactivity::cache::{CacheStore, paths};
use ghactivity::config::Config;
use ghactivity::github::{GitHubClient, RetryPolicy};
use ghactivity::{ExportFormat, Result, display, export};

/// Events shown when neither a flag nor the config sets a limit.
const DEFAULT_LIMIT: usize = 30;

/// Show a GitHub user's recent public activity
#[derive(Parser, Debug)]
#[command(name = "ghactivity")]
#[command(version, about, long_about = None)]
struct Args {
    /// GitHub username (falls back to the saved config)
    username: Option<String>,

    /// Maximum number of events to show
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Only show events of this type (e.g. PushEvent)
    #[arg(short = 't', long = "type", value_name = "KIND")]
    kind: Option<String>,

    /// Sort by "date" (newest first) or "type"
    #[arg(short, long)]
    sort: Option<SortKey>,

    /// Export the result as json, csv, or md
    #[arg(short, long, value_name = "FORMAT")]
    export: Option<String>,

    /// Directory export files are written to
    #[arg(short = 'o', long, default_value = ".")]
    output_dir: PathBuf,

    /// Only include events on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    from: Option<String>,

    /// Only include events on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    to: Option<String>,

    /// Events requested per API page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// Retries after a rate-limited response
    #[arg(long, default_value_t = RetryPolicy::default().max_retries)]
    retries: u32,

    /// Milliseconds to wait between retries
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    retry_delay: u64,

    /// Ignore cached results for this run
    #[arg(long)]
    refresh: bool,

    /// Empty the cache before fetching
    #[arg(long)]
    clear_cache: bool,

    /// Drop this user's cached results before fetching
    #[arg(long)]
    forget: bool,

    /// Cache index file
    #[arg(long, env = "GHACTIVITY_CACHE", value_name = "PATH")]
    cache_file: Option<PathBuf>,

    /// Config file
    #[arg(long, env = "GHACTIVITY_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// GitHub API root
    #[arg(long, env = "GHACTIVITY_API_URL", value_name = "URL")]
    api_url: Option<String>,

    /// Skip the user profile section
    #[arg(long)]
    no_profile: bool,

    /// Save username, limit, export format, and dates as defaults
    #[arg(long)]
    save_config: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(short = 'd', long)]
    debug: bool,

    /// Enable verbose logging (equivalent to RUST_LOG=trace)
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Config {
            username: args.username.clone(),
            limit: args.limit,
            export_format: args.export.clone(),
            from_date: args.from.clone(),
            to_date: args.to.clone(),
        }
    }
}

fn init_tracing(args: &Args) {
    let default_filter = if args.verbose {
        "trace"
    } else if args.debug {
        "debug"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Treat blank saved values as unset.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn process_options(args: &Args, config: &Config) -> Result<ProcessOptions> {
    Ok(ProcessOptions {
        filter_kind: non_blank(args.kind.as_deref()).map(Into::into),
        from: non_blank(config.from_date.as_deref())
            .map(parse_from_date)
            .transpose()?,
        to: non_blank(config.to_date.as_deref())
            .map(parse_to_date)
            .transpose()?,
        sort: args.sort,
        limit: Some(config.limit.unwrap_or(DEFAULT_LIMIT)),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_tracing(&args);

    let config_path = args.config.clone().or_else(paths::config_path);
    let saved = config_path
        .as_deref()
        .map(Config::load)
        .unwrap_or_default();
    let config = saved.merge(Config::from(&args));

    let Some(username) = non_blank(config.username.as_deref()).map(str::to_string) else {
        display::print_error("Please provide a github username.");
        return Ok(ExitCode::from(1));
    };

    if args.save_config {
        if let Some(path) = &config_path {
            match config.save(path) {
                Ok(()) => display::print_success(&format!(
                    "Configuration saved to {}",
                    path.display()
                )),
                Err(e) => display::print_error(&format!("Could not save configuration: {}", e)),
            }
        }
    }

    let options = match process_options(&args, &config) {
        Ok(options) => options,
        Err(e) => {
            display::print_error(&e.to_string());
            return Ok(ExitCode::SUCCESS);
        }
    };

    // A bad format only disables the export; the activity is still shown.
    let export_format: Option<ExportFormat> = match non_blank(config.export_format.as_deref())
        .map(str::parse::<ExportFormat>)
    {
        Some(Ok(format)) => Some(format),
        Some(Err(e)) => {
            display::print_error(&format!("{}; skipping export", e));
            None
        }
        None => None,
    };

    let client = match GitHubClient::new() {
        Ok(client) => client,
        Err(e) => {
            display::print_error(&e.user_message(&username));
            return Ok(ExitCode::SUCCESS);
        }
    };
    let client = client.with_retry_policy(RetryPolicy::new(
        args.retries,
        std::time::Duration::from_millis(args.retry_delay),
    ));
    let client = match &args.api_url {
        Some(url) => client.with_base_url(url.as_str()),
        None => client,
    };

    let cache_path = args
        .cache_file
        .clone()
        .or_else(paths::cache_index_path)
        .unwrap_or_else(|| PathBuf::from("cache.json"));
    let service = ActivityService::new(CacheStore::open(cache_path), client)
        .with_page_size(args.page_size)
        .with_refresh(args.refresh);

    if args.clear_cache {
        if let Err(e) = service.clear_cache().await {
            display::print_error(&format!("Could not clear cache: {}", e));
        }
    } else if args.forget {
        match service.forget(&username).await {
            Ok(removed) => tracing::info!(removed, "dropped cached results"),
            Err(e) => display::print_error(&format!("Could not update cache: {}", e)),
        }
    }

    display::print_info(&format!("Fetching data for \"{}\"...", username));
    if let Err(e) = run(
        &service,
        &username,
        &options,
        export_format,
        &args.output_dir,
        !args.no_profile,
    )
    .await
    {
        tracing::debug!(error = %e, "lookup failed");
        display::print_error(&e.user_message(&username));
    }

    Ok(ExitCode::SUCCESS)
}

async fn run(
    service: &ActivityService,
    username: &str,
    options: &ProcessOptions,
    export_format: Option<ExportFormat>,
    output_dir: &Path,
    show_profile: bool,
) -> Result<()> {
    if show_profile {
        let user = service.user_profile(username).await?;
        display::print_profile(&user);
    }

    let events = service.activity(username, options).await?;
    display::print_activities(username, &events);

    if let Some(format) = export_format {
        match export::export_to_dir(&events, format, output_dir) {
            Ok(path) => {
                display::print_success(&format!("Activities exported to {}", path.display()))
            }
            Err(e) => display::print_error(&format!("Export failed: {}", e)),
        }
    }

    Ok(())
}
