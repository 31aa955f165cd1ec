//! Terminal rendering: AOI summary, tile table, progress bar, and the
//! final download report.

use console::style;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

use aoi2list::aoi::BoundingBox;
use aoi2list::downloader::{ProgressUpdate, SessionOutcome, SessionSummary};
use aoi2list::tile::{self, TileRecord};

/// Prints the resolved AOI bounding box.
pub fn print_bbox(bbox: &BoundingBox) {
    println!("{}", style("AOI bounding box:").bold());
    println!("  min_lon: {:.6}, min_lat: {:.6}", bbox.min_lon, bbox.min_lat);
    println!("  max_lon: {:.6}, max_lat: {:.6}", bbox.max_lon, bbox.max_lat);
}

/// Prints the found tiles, one row per tile.
pub fn print_tiles(tiles: &[TileRecord]) {
    println!(
        "{} {}",
        style("Tiles found:").bold(),
        style(tiles.len()).cyan()
    );
    for tile in tiles {
        println!("  {}", tile::format_tile_row(tile));
    }
}

/// Creates the download progress bar.
pub fn download_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {msg}\n  [{bar:40.cyan/blue}] {bytes}/{total_bytes}",
        )
        .expect("progress template is valid")
        .progress_chars("=>-"),
    );
    bar
}

/// Applies a progress update to the bar.
///
/// `file_names` is indexed by the update's task index.
pub fn render_progress(bar: &ProgressBar, file_names: &[String], update: ProgressUpdate) {
    if let Some(total) = update.total_bytes {
        bar.set_length(total);
    }
    bar.set_position(update.bytes_downloaded);

    let name = file_names
        .get(update.task_index)
        .map(String::as_str)
        .unwrap_or("?");
    bar.set_message(format!(
        "[{}/{}] {} ({}/s)",
        update.task_index + 1,
        update.task_total,
        name,
        HumanBytes(update.bytes_per_sec as u64)
    ));
}

/// Prints the final session report.
pub fn print_summary(summary: &SessionSummary) {
    if summary.outcome == SessionOutcome::Cancelled {
        println!("{}", style("Download cancelled.").yellow().bold());
    }
    println!(
        "{} {} succeeded, {} failed, {} cancelled",
        style("Downloads:").bold(),
        style(summary.succeeded()).green(),
        style(summary.failed()).red(),
        style(summary.cancelled()).yellow(),
    );
}
