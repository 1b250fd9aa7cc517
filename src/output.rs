//! Terminal feedback for the CLI: spinners while connecting, a byte bar
//! while transferring.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::watch;

/// Spinners and bars are hidden when `NO_PROGRESS` is set.
fn progress_disabled() -> bool {
    std::env::var("NO_PROGRESS").is_ok()
}

pub fn spinner(msg: &str) -> ProgressBar {
    if progress_disabled() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn finish_spinner_success(spinner: &ProgressBar, msg: &str) {
    spinner.finish_with_message(format!("{} {}", style("✓").green().bold(), msg));
}

pub fn finish_spinner_error(spinner: &ProgressBar, msg: &str) {
    spinner.finish_with_message(format!("{} {}", style("✗").red().bold(), msg));
}

/// Byte progress bar for a transfer of `total` bytes.
pub fn transfer_bar(total: u64, name: &str) -> ProgressBar {
    if progress_disabled() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
    {
        pb.set_style(bar_style.progress_chars("=> "));
    }
    pb.set_message(name.to_string());
    pb
}

/// Spinner that also shows a running byte count, for transfers of unknown length.
pub fn byte_spinner(msg: &str) -> ProgressBar {
    if progress_disabled() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) =
        ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} {bytes} ({bytes_per_sec})")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Mirror a progress channel onto `bar` until the sender side is dropped.
pub fn follow_progress(
    bar: ProgressBar,
    mut progress: watch::Receiver<u64>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            bar.set_position(*progress.borrow());
        }
        bar.finish_and_clear();
    })
}

/// Wait for a [`follow_progress`] task. A panicked display is logged, not fatal.
pub async fn join_progress(bar: tokio::task::JoinHandle<()>) {
    if let Err(e) = bar.await {
        tracing::debug!(error = %e, "progress display task ended abnormally");
    }
}

pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("!").yellow().bold(), msg);
}
