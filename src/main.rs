mod render;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use insights_analytics::{Aggregator, AnalyticsSummary, ReportGenerator};
use insights_client::{fetch_all_sessions, fetch_page, HttpSessionSource};
use insights_core::config::AppConfig;
use insights_core::{Filters, Session, SessionPayload};
use render::SessionRenderer;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "session-insights",
    about = "Review AI-bot chat sessions and their engagement analytics",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ~/.config/session-insights/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the session-data service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Offset from UTC, in minutes, for day/hour buckets and timestamps
    #[arg(long, global = true, allow_negative_numbers = true)]
    utc_offset_minutes: Option<i32>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of sessions (default)
    Sessions(SessionsArgs),

    /// Fetch all matching sessions and report aggregate analytics
    Analytics {
        /// Page size for each request
        #[arg(long)]
        page_size: Option<u32>,
        /// Maximum number of pages to fetch
        #[arg(long)]
        max_pages: Option<u32>,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Report analytics for sessions saved in a local JSON file
    Analyze {
        /// Session array or saved session-data response
        file: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print config file path
    Path,
}

#[derive(Args, Default)]
struct SessionsArgs {
    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Sessions per page
    #[arg(long)]
    page_size: Option<u32>,
    /// Show every message instead of a preview
    #[arg(long)]
    all_messages: bool,
    /// Print the raw response as JSON
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    filters: FilterArgs,
}

#[derive(Args, Default)]
struct FilterArgs {
    /// User IDs (comma-separated)
    #[arg(long)]
    user_ids: Option<String>,
    /// Session IDs (comma-separated)
    #[arg(long)]
    session_ids: Option<String>,
    /// Email IDs (comma-separated)
    #[arg(long)]
    email_ids: Option<String>,
    /// Only sessions with likes
    #[arg(long)]
    liked: bool,
    /// Only sessions with dislikes
    #[arg(long)]
    disliked: bool,
    /// Only sessions with reviews
    #[arg(long)]
    reviewed: bool,
}

impl FilterArgs {
    fn to_filters(&self) -> Filters {
        Filters::from_search(
            self.user_ids.as_deref().unwrap_or_default(),
            self.session_ids.as_deref().unwrap_or_default(),
            self.email_ids.as_deref().unwrap_or_default(),
        )
        .with_flags(self.liked, self.disliked, self.reviewed)
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Print the analytics summary as JSON
    #[arg(long)]
    json: bool,
    /// Print a compact text summary instead of the full report
    #[arg(long, conflicts_with = "json")]
    brief: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    // Load config.
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Apply CLI overrides.
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    if let Some(minutes) = cli.utc_offset_minutes {
        config.display.utc_offset_minutes = minutes;
    }

    tracing::debug!("Session-data endpoint: {}", config.api.base_url);

    match cli.command {
        Some(Commands::Sessions(args)) => run_sessions(&config, args).await?,
        Some(Commands::Analytics {
            page_size,
            max_pages,
            output,
            filters,
        }) => {
            let page_size = page_size.unwrap_or(config.fetch.analytics_page_size);
            let max_pages = max_pages.unwrap_or(config.fetch.max_pages);
            run_analytics(&config, &filters.to_filters(), page_size, max_pages, &output).await?;
        }
        Some(Commands::Analyze { file, output }) => {
            let sessions = read_session_file(&file)?;
            print_summary(&config, &summarize(&config, &sessions), &output)?;
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, &config, cli.config.as_deref())?;
        }
        None => {
            let args = SessionsArgs {
                page: 1,
                ..SessionsArgs::default()
            };
            run_sessions(&config, args).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "session_insights=info,warn".into()),
        )
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_sessions(config: &AppConfig, args: SessionsArgs) -> Result<()> {
    let source = HttpSessionSource::new(&config.api)?;
    let page_size = args.page_size.unwrap_or(config.fetch.page_size);
    let filters = args.filters.to_filters();

    let response = fetch_page(&source, &filters, args.page.max(1), page_size)
        .await
        .context("Failed to fetch session data")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let renderer = SessionRenderer::new(&config.display).show_all_messages(args.all_messages);
    print!("{}", renderer.listing(&response));
    Ok(())
}

async fn run_analytics(
    config: &AppConfig,
    filters: &Filters,
    page_size: u32,
    max_pages: u32,
    output: &OutputArgs,
) -> Result<()> {
    let source = HttpSessionSource::new(&config.api)?;
    tracing::info!("Fetching sessions from {}", source.endpoint());

    let fetched = fetch_all_sessions(&source, filters, page_size, max_pages)
        .await
        .context("Failed to fetch analytics data")?;

    print_summary(config, &summarize(config, &fetched.sessions), output)
}

fn summarize(config: &AppConfig, sessions: &[Session]) -> AnalyticsSummary {
    Aggregator::new(config.display.offset()).aggregate(sessions)
}

fn print_summary(config: &AppConfig, summary: &AnalyticsSummary, output: &OutputArgs) -> Result<()> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else if output.brief {
        print!("{}", ReportGenerator::text_summary(summary));
    } else {
        print!(
            "{}",
            ReportGenerator::markdown_report(summary, config.display.top_queries)
        );
    }
    Ok(())
}

/// Read sessions from a JSON file holding either a session array or a full response.
fn read_session_file(path: &Path) -> Result<Vec<Session>> {
    let payload = SessionPayload::read_from(path)
        .with_context(|| format!("Failed to load session data from {}", path.display()))?;
    Ok(payload.into_sessions())
}

fn handle_config_command(
    action: Option<ConfigAction>,
    config: &AppConfig,
    explicit_path: Option<&Path>,
) -> Result<()> {
    let path = explicit_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_path);
    match action {
        Some(ConfigAction::Show) | None => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
        }
        Some(ConfigAction::Init) => {
            if path.exists() {
                println!("Config already exists at: {}", path.display());
            } else {
                config.save_to(&path)?;
                println!("Created default config at: {}", path.display());
            }
        }
        Some(ConfigAction::Path) => {
            println!("{}", path.display());
        }
    }
    Ok(())
}
