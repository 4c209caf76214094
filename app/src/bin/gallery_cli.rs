use api_client::ApiClient;
use clap::{Parser, Subcommand};
use resolver::{DateStyle, ResolvedMedia};
use std::error::Error;
use std::path::{Path, PathBuf};
use sync::{GallerySyncController, SyncProgress, SyncStatus};
use tokio::sync::mpsc;
use tokio::task::{spawn_local, JoinHandle, LocalSet};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

#[path = "../config.rs"]
mod config;

#[derive(Parser)]
#[command(
    name = "gallery_cli",
    author,
    version,
    about = "Browse a device's screenshot and video gallery"
)]
struct Cli {
    /// Override log level (e.g. info, debug)
    #[arg(long)]
    log_level: Option<String>,
    /// Override the gallery backend address
    #[arg(long)]
    base_url: Option<String>,
    /// Override the date style (en-us, en-gb, iso)
    #[arg(long)]
    date_style: Option<DateStyle>,
    /// Override the UTC offset used for dates, in minutes
    #[arg(long, allow_hyphen_values = true)]
    utc_offset_minutes: Option<i32>,
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Enable tokio console for debugging
    #[arg(long)]
    debug_console: bool,
    /// Print fetch progress
    #[arg(long, short)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the effective configuration to the config file
    InitConfig,
    #[command(flatten)]
    Gallery(GalleryCommand),
}

/// Commands that talk to the gallery backend.
#[derive(Subcommand)]
enum GalleryCommand {
    /// List the items of a gallery page
    Page {
        /// Page number, starting at 1
        #[arg(default_value_t = 1)]
        page: u32,
    },
    /// Show details for one item
    Show {
        /// ID of the item
        id: String,
        /// Page the item is on
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Print the resolved item as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download the full-size asset of an item
    Download {
        /// ID of the item
        id: String,
        /// Page the item is on
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Target directory, defaults to the configured download directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show indexing statistics and the device theme
    Stats,
}

fn init_tracing(cfg: &config::AppConfig, debug_console: bool) -> Result<Option<WorkerGuard>, Box<dyn Error>> {
    #[cfg(feature = "tokio-console")]
    if debug_console {
        console_subscriber::init();
        return Ok(None);
    }
    #[cfg(not(feature = "tokio-console"))]
    if debug_console {
        eprintln!("tokio console support not compiled in; enable the tokio-console feature");
    }

    std::fs::create_dir_all(&cfg.log_dir)?;
    let file_appender = rolling::daily(&cfg.log_dir, "gallery_cli.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cfg.log_level.clone()))
        .with_writer(std::io::stderr.and(file_writer))
        .init();
    Ok(Some(guard))
}

/// Formats seconds with three significant digits, switching to exponent
/// notation from 1000 on.
fn format_seconds(secs: f64) -> String {
    if secs <= 0.0 || !secs.is_finite() {
        return "0.00".to_string();
    }
    let scale = 10f64.powi(2 - secs.log10().floor() as i32);
    let rounded = (secs * scale).round() / scale;
    let magnitude = rounded.log10().floor() as i32;
    if magnitude >= 3 {
        return format!("{:.2e}", rounded).replace('e', "e+");
    }
    let decimals = (2 - magnitude).max(0) as usize;
    format!("{:.*}", decimals, rounded)
}

async fn settle_or_fail(controller: &mut GallerySyncController) -> Result<(), Box<dyn Error>> {
    match controller.settle().await {
        SyncStatus::Loaded => Ok(()),
        _ => Err(format!(
            "Failed to load gallery: {}",
            controller.last_error().unwrap_or("unknown error")
        )
        .into()),
    }
}

/// Load page 1, then navigate to `page`. Returns `false` when `page` is out of range.
async fn open_page(controller: &mut GallerySyncController, page: u32) -> Result<bool, Box<dyn Error>> {
    settle_or_fail(controller).await?;
    if page == controller.current_page() {
        return Ok(true);
    }
    if !controller.request_page(page) {
        println!(
            "Page {} is out of range (1-{})",
            page,
            controller.max_pages()
        );
        return Ok(false);
    }
    settle_or_fail(controller).await?;
    Ok(true)
}

fn print_stats_line(controller: &GallerySyncController) {
    let stats = controller.stats();
    println!(
        "Indexed {} photos and {} videos in {} seconds.",
        stats.screenshots,
        stats.videos,
        format_seconds(stats.index_time_secs)
    );
}

fn print_details(item: &ResolvedMedia) {
    println!("{:<12}{}", "Type", item.kind_label);
    println!("{:<12}{}", "Taken at", item.captured_at);
    println!("{:<12}{}", "Game", item.game);
    println!("{:<12}{}", "Stored at", item.stored_at);
    println!("{:<12}{}", "Size", item.size);
    println!("{:<12}{}", "Preview", item.preview_url);
    println!("{:<12}{}", "File", item.full_url);
    println!("{:<12}{}", "Download as", item.download_filename);
}

fn find_resolved(controller: &GallerySyncController, id: &str) -> Option<ResolvedMedia> {
    controller.find_item(id).map(|item| controller.open_item(item))
}

fn spawn_progress_printer() -> (mpsc::UnboundedSender<SyncProgress>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = spawn_local(async move {
        while let Some(p) = rx.recv().await {
            match p {
                SyncProgress::Requested(page) => println!("Requesting page {}", page),
                SyncProgress::Loaded { page, items, total_pages } => {
                    println!("Loaded page {} of {}: {} items", page, total_pages, items)
                }
                SyncProgress::Failed { page, error } => println!("Page {} failed: {}", page, error),
                SyncProgress::Discarded(page) => println!("Discarded stale page {}", page),
            }
        }
    });
    (tx, handle)
}

async fn execute(
    command: GalleryCommand,
    cfg: &config::AppConfig,
    client: &ApiClient,
    controller: &mut GallerySyncController,
) -> Result<(), Box<dyn Error>> {
    match command {
        GalleryCommand::Page { page } => {
            if !open_page(controller, page).await? {
                return Ok(());
            }
            println!(
                "Page {} of {} (theme: {})",
                controller.current_page(),
                controller.max_pages(),
                controller.theme()
            );
            if controller.items().is_empty() {
                println!("No items on this page");
            }
            for item in controller.items() {
                let resolved = controller.resolver().resolve(item);
                println!(
                    "{}  {}  {}  {}  {}  {}",
                    resolved.id,
                    resolved.kind_label,
                    resolved.game,
                    resolved.captured_at,
                    resolved.size,
                    resolved.download_filename
                );
            }
            print_stats_line(controller);
        }
        GalleryCommand::Show { id, page, json } => {
            if !open_page(controller, page).await? {
                return Ok(());
            }
            match find_resolved(controller, &id) {
                Some(resolved) if json => println!("{}", serde_json::to_string_pretty(&resolved)?),
                Some(resolved) => print_details(&resolved),
                None => println!("Item not found: {}", id),
            }
            controller.close_item();
        }
        GalleryCommand::Download { id, page, out } => {
            if !open_page(controller, page).await? {
                return Ok(());
            }
            let Some(resolved) = find_resolved(controller, &id) else {
                println!("Item not found: {}", id);
                return Ok(());
            };
            let file_name = Path::new(&resolved.download_filename)
                .file_name()
                .map(|n| n.to_os_string())
                .ok_or_else(|| format!("Invalid download filename: {}", resolved.download_filename))?;
            let dest = out.unwrap_or_else(|| cfg.download_dir.clone()).join(file_name);
            let written = client.download_to(&resolved.full_url, &dest).await?;
            tracing::info!("Saved item {} as {}", resolved.id, dest.display());
            println!(
                "Downloaded {} ({}) to {}",
                resolved.download_filename,
                resolver::format_file_size(written),
                dest.display()
            );
        }
        GalleryCommand::Stats => {
            settle_or_fail(controller).await?;
            println!("Theme: {}", controller.theme());
            println!("Pages: {}", controller.max_pages());
            print_stats_line(controller);
        }
    }
    Ok(())
}

#[cfg_attr(feature = "trace-spans", tracing::instrument)]
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let local = LocalSet::new();
    local.run_until(run()).await
}

async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let overrides = config::AppConfigOverrides {
        log_level: cli.log_level.clone(),
        base_url: cli.base_url.clone(),
        date_style: cli.date_style,
        utc_offset_minutes: cli.utc_offset_minutes,
    };
    let cfg = config::AppConfig::load_from(cli.config.clone()).apply_overrides(&overrides);
    let _guard = init_tracing(&cfg, cli.debug_console)?;

    let command = match cli.command {
        Commands::InitConfig => {
            let path = cfg.save_to(cli.config.clone())?;
            tracing::info!("Wrote configuration to {}", path.display());
            println!("Configuration written to {}", path.display());
            return Ok(());
        }
        Commands::Gallery(command) => command,
    };

    let ctx = cfg.client_context()?;
    tracing::debug!("Using gallery backend at {}", cfg.base_url);
    let client = ApiClient::new(cfg.base_url.clone());
    let (progress, printer) = if cli.verbose {
        let (tx, handle) = spawn_progress_printer();
        (Some(tx), Some(handle))
    } else {
        (None, None)
    };
    let mut controller = GallerySyncController::with_progress(client.clone(), ctx, progress);

    let result = execute(command, &cfg, &client, &mut controller).await;

    drop(controller);
    if let Some(printer) = printer {
        let _ = printer.await;
    }
    result
}
