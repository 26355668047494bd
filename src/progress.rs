//! Progress UI (spinner) while a batch runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Spawns the spinner when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `use_spinner` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    use_spinner: bool,
    total: usize,
    domain: Option<String>,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !use_spinner {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_spinner_inner(total, domain, Arc::clone(&stop));
    (Some(handle), stop)
}

fn spawn_spinner_inner(
    total: usize,
    domain: Option<String>,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        let domain = domain.unwrap_or_else(|| "pool".to_string());
        let start = Instant::now();
        while !stop.load(Ordering::SeqCst) {
            spinner.set_message(format!(
                "Fetching {total} requests from {domain}... {}s",
                start.elapsed().as_secs()
            ));
            tokio::time::sleep(Duration::from_millis(120)).await;
        }

        spinner.finish_and_clear();
    })
}

#[cfg(test)]
mod tests {
    use super::spawn_progress_ui;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn spawn_progress_ui_when_disabled_returns_none_handle_and_stop_already_true() {
        let (handle, stop) = spawn_progress_ui(false, 1, None);

        assert!(handle.is_none());
        assert!(stop.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn spawn_progress_ui_stops_when_signalled() {
        let (handle, stop) = spawn_progress_ui(true, 3, Some("a.test".to_string()));

        stop.store(true, Ordering::SeqCst);
        handle.unwrap().await.unwrap();
    }
}
