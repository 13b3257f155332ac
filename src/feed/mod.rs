pub mod types;

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::model::Instrument;

pub use types::{parse_snapshot, QuoteRecord};

/// Anything that can produce a full quote snapshot.
pub trait QuoteSource {
    fn fetch_quotes(&mut self) -> Result<Vec<Instrument>>;
}

/// Reads a JSON snapshot from disk on every fetch, so an external process
/// can republish the file in place.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QuoteSource for SnapshotFile {
    fn fetch_quotes(&mut self) -> Result<Vec<Instrument>> {
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading snapshot {}", self.path.display()))?;
        parse_snapshot(&json).with_context(|| format!("parsing snapshot {}", self.path.display()))
    }
}

/// Result of one fetch through a [`CachedFeed`].
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch {
    /// New data from the source
    Fresh(Vec<Instrument>),
    /// Source failed; the last good snapshot is returned instead
    Stale(Vec<Instrument>),
    /// Source failed and nothing was ever cached
    Unavailable,
}

impl Fetch {
    /// Banner text for a failed fetch.
    pub fn status_message(&self) -> Option<&'static str> {
        match self {
            Fetch::Fresh(_) => None,
            Fetch::Stale(_) => Some("Failed to load live data. Showing cached data."),
            Fetch::Unavailable => Some("Failed to load live data. Retrying..."),
        }
    }
}

/// Keeps the last good snapshot and serves it when the source fails.
pub struct CachedFeed<S> {
    source: S,
    cached: Option<Vec<Instrument>>,
}

impl<S: QuoteSource> CachedFeed<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cached: None,
        }
    }

    pub fn cached_snapshot(&self) -> Option<&[Instrument]> {
        self.cached.as_deref()
    }

    /// Fetch from the source. An empty snapshot counts as a failure.
    pub fn fetch(&mut self) -> Fetch {
        let result = self.source.fetch_quotes().and_then(|data| {
            if data.is_empty() {
                bail!("source returned an empty snapshot");
            }
            Ok(data)
        });

        match result {
            Ok(data) => {
                tracing::info!("Fetched {} quotes", data.len());
                self.cached = Some(data.clone());
                Fetch::Fresh(data)
            }
            Err(e) => {
                tracing::warn!("Quote fetch failed: {e:#}");
                match &self.cached {
                    Some(data) => Fetch::Stale(data.clone()),
                    None => Fetch::Unavailable,
                }
            }
        }
    }
}

/// Events published by the refresh thread.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// First successful snapshot
    Loaded(Vec<Instrument>),
    /// Later successful snapshot
    Refreshed(Vec<Instrument>),
    /// A fetch failed; carries the banner text
    Failed(String),
}

/// Stops the refresh thread when asked or dropped.
pub struct RefreshHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Signal the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender wakes the thread with `Disconnected`.
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Refresh thread panicked");
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Run the feed on a background thread.
///
/// Retries every `retry_delay` until the first snapshot loads, then fetches
/// again every `interval`. Events go to `notify` in order.
pub fn spawn_refresh<S, F>(
    source: S,
    interval: Duration,
    retry_delay: Duration,
    notify: F,
) -> RefreshHandle
where
    S: QuoteSource + Send + 'static,
    F: Fn(FeedEvent) + Send + 'static,
{
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let thread = std::thread::spawn(move || {
        let mut feed = CachedFeed::new(source);
        let stopped = |wait: Duration| !matches!(stop_rx.recv_timeout(wait), Err(RecvTimeoutError::Timeout));

        loop {
            match feed.fetch() {
                Fetch::Fresh(data) => {
                    notify(FeedEvent::Loaded(data));
                    break;
                }
                other => {
                    if let Some(message) = other.status_message() {
                        notify(FeedEvent::Failed(message.to_string()));
                    }
                }
            }
            if stopped(retry_delay) {
                return;
            }
        }

        while !stopped(interval) {
            match feed.fetch() {
                Fetch::Fresh(data) => notify(FeedEvent::Refreshed(data)),
                other => {
                    if let Some(message) = other.status_message() {
                        notify(FeedEvent::Failed(message.to_string()));
                    }
                }
            }
        }
        tracing::debug!("Refresh thread stopped");
    });

    RefreshHandle {
        stop_tx: Some(stop_tx),
        thread: Some(thread),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Write;

    use anyhow::anyhow;

    use super::*;

    /// Replays scripted results, then keeps failing.
    struct Scripted(VecDeque<Result<Vec<Instrument>>>);

    impl QuoteSource for Scripted {
        fn fetch_quotes(&mut self) -> Result<Vec<Instrument>> {
            self.0.pop_front().unwrap_or_else(|| Err(anyhow!("offline")))
        }
    }

    fn quote(id: &str) -> Instrument {
        Instrument::new(id, id, Some(1.0), 0.0, 100.0, 0.0)
    }

    #[test]
    fn cached_feed_serves_stale_data() {
        let mut feed = CachedFeed::new(Scripted(VecDeque::from([
            Err(anyhow!("boom")),
            Ok(vec![quote("AAA")]),
            Err(anyhow!("boom")),
            Ok(Vec::new()),
        ])));

        assert_eq!(feed.fetch(), Fetch::Unavailable);
        assert_eq!(feed.fetch(), Fetch::Fresh(vec![quote("AAA")]));
        let stale = feed.fetch();
        assert_eq!(stale, Fetch::Stale(vec![quote("AAA")]));
        assert_eq!(
            stale.status_message(),
            Some("Failed to load live data. Showing cached data.")
        );
        // Empty snapshots never replace the cache.
        assert_eq!(feed.fetch(), Fetch::Stale(vec![quote("AAA")]));
        assert_eq!(feed.cached_snapshot().map(<[_]>::len), Some(1));
    }

    #[test]
    fn snapshot_file_reads_and_reports_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"ticker":"SPY","price":500.0,"aum":1.0e9}}]"#).unwrap();
        let mut source = SnapshotFile::new(file.path());
        let data = source.fetch_quotes().unwrap();
        assert_eq!(data[0].id, "SPY");

        let mut missing = SnapshotFile::new(file.path().with_extension("gone"));
        let err = missing.fetch_quotes().unwrap_err();
        assert!(format!("{err:#}").contains("reading snapshot"));
    }

    #[test]
    fn refresh_thread_retries_then_refreshes() {
        let source = Scripted(VecDeque::from([
            Err(anyhow!("down")),
            Ok(vec![quote("AAA")]),
            Ok(vec![quote("BBB")]),
        ]));
        let (tx, rx) = mpsc::channel();
        let handle = spawn_refresh(
            source,
            Duration::from_millis(5),
            Duration::from_millis(5),
            move |event| {
                let _ = tx.send(event);
            },
        );

        let wait = Duration::from_secs(5);
        assert_eq!(
            rx.recv_timeout(wait).unwrap(),
            FeedEvent::Failed("Failed to load live data. Retrying...".to_string())
        );
        assert_eq!(rx.recv_timeout(wait).unwrap(), FeedEvent::Loaded(vec![quote("AAA")]));
        assert_eq!(rx.recv_timeout(wait).unwrap(), FeedEvent::Refreshed(vec![quote("BBB")]));
        assert_eq!(
            rx.recv_timeout(wait).unwrap(),
            FeedEvent::Failed("Failed to load live data. Showing cached data.".to_string())
        );
        handle.stop();
    }

    #[test]
    fn stop_interrupts_long_waits() {
        let handle = spawn_refresh(
            Scripted(VecDeque::new()),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            |_| {},
        );
        let started = std::time::Instant::now();
        handle.stop();
        assert!(started.elapsed() < Duration::from_secs(60));
    }
}
