//! AOI2List CLI - USGS LiDAR AOI tile finder and downloader
//!
//! Given a center latitude/longitude and an area in square miles, queries
//! USGS ScienceBase for LiDAR (LAZ) tiles that intersect the area of
//! interest and writes a download list with one LAZ URL per line. With
//! `--download`, the tiles are also fetched into a directory with a
//! progress bar; Ctrl-C cancels cleanly.

mod error;
mod output;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::Ordering;
use std::time::Duration;

use clap::Parser;
use console::style;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use aoi2list::aoi::AreaOfInterest;
use aoi2list::catalog::{ReqwestClient, ScienceBaseClient};
use aoi2list::downloader::{
    DownloadConfig, DownloadSession, DownloadTask, ProgressCallback,
};
use aoi2list::tile::{self, TileRecord};

use error::CliError;

/// Build a LAZ download list from ScienceBase for an AOI.
#[derive(Debug, Parser)]
#[command(name = "aoi2list", version, about)]
struct Cli {
    /// Center latitude in decimal degrees (positive north)
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Center longitude in decimal degrees (negative west)
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,

    /// Square area size in square miles (the AOI is a square of this area)
    #[arg(long)]
    sqmi: f64,

    /// Output file path for the list of LAZ URLs
    #[arg(long, default_value = "downloadlist.txt")]
    out: PathBuf,

    /// Also download the LAZ files into this directory
    #[arg(long, value_name = "DIR")]
    download: Option<PathBuf>,

    /// Maximum number of catalog items to request
    #[arg(long, default_value_t = 1000)]
    max_items: usize,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Attempts per file before giving up
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("{} {}", style("error:").red().bold(), err);
        process::exit(err.exit_code());
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    // Invalid parameters fail here, before any network call.
    let aoi = AreaOfInterest::new(cli.lat, cli.lon, cli.sqmi)?;
    let bbox = aoi.bounding_box();
    output::print_bbox(&bbox);

    let http = ReqwestClient::with_timeout(Duration::from_secs(cli.timeout_secs))?;
    let client = ScienceBaseClient::new(http).with_max_items(cli.max_items);
    let tiles = client.query_tiles(&bbox)?;

    output::print_tiles(&tiles);
    if tiles.is_empty() {
        println!("No LAZ URLs found for this AOI.");
        return Ok(());
    }

    write_list(&tiles, &cli.out)?;
    println!("Wrote LAZ URL list to: {}", cli.out.display());

    if let Some(dir) = &cli.download {
        download_tiles(&tiles, dir, &cli)?;
    }

    Ok(())
}

/// Writes the URL list to `path`, mapping I/O failures to [`CliError`].
fn write_list(tiles: &[TileRecord], path: &Path) -> Result<(), CliError> {
    tile::write_download_list(tiles, path).map_err(|e| CliError::ListWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Downloads all tiles into `dir` on a background session, rendering a
/// progress bar on this thread's behalf and cancelling on Ctrl-C.
fn download_tiles(tiles: &[TileRecord], dir: &std::path::Path, cli: &Cli) -> Result<(), CliError> {
    let tasks: Vec<DownloadTask> = tiles
        .iter()
        .map(|t| DownloadTask::new(t.laz_url.clone(), dir.join(t.file_name())))
        .collect();
    let total = tasks.len();

    let config = DownloadConfig::default()
        .with_timeout(Duration::from_secs(cli.timeout_secs))
        .with_max_attempts(cli.retries);

    let bar = output::download_bar();
    let bar_for_cb = bar.clone();
    let file_names: Vec<String> = tiles.iter().map(|t| t.file_name()).collect();
    let on_progress: ProgressCallback = Box::new(move |update| {
        output::render_progress(&bar_for_cb, &file_names, update);
    });

    let session = DownloadSession::start(tasks, config, Some(on_progress))?;

    // The handler can only be installed once per process and captures
    // this session's flag; a run performs at most one session. Running
    // several sessions would need a handler over a shared flag instead.
    let cancel = session.cancel_flag();
    if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst)) {
        warn!(error = %e, "could not install Ctrl-C handler; cancellation disabled");
    }

    let summary = session.wait();
    bar.finish_and_clear();
    output::print_summary(&summary);

    if summary.failed() > 0 {
        return Err(CliError::DownloadsFailed {
            failed: summary.failed(),
            total,
        });
    }
    Ok(())
}
