//! Drop guards that log how long a snapshot or patch run took.
//!
//! ```rust,ignore
//! let mut timing = TimingGuard::snapshot(root.display().to_string());
//! let records = collect(root).await?;
//! timing.set_items(records.len());
//! // logged when `timing` goes out of scope
//! ```

use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The kind of run being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Snapshot,
    Patch,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Snapshot => "snapshot",
            Phase::Patch => "patch",
        }
    }

    /// Runs slower than this are logged at warn.
    fn slow_after(&self) -> Duration {
        match self {
            Phase::Snapshot => Duration::from_secs(30),
            Phase::Patch => Duration::from_secs(5),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logs the elapsed time of a run when dropped.
///
/// Under `info_after` the summary goes to debug, past the phase's slow limit
/// it goes to warn, and to info in between.
pub struct TimingGuard {
    phase: Phase,
    root: String,
    items: Option<usize>,
    start: Instant,
    info_after: Duration,
    slow_after: Duration,
}

impl TimingGuard {
    pub fn new(phase: Phase, root: impl Into<String>) -> Self {
        let root = root.into();
        debug!(phase = %phase, root = %root, "Run started");
        Self {
            phase,
            root,
            items: None,
            start: Instant::now(),
            info_after: Duration::from_millis(250),
            slow_after: phase.slow_after(),
        }
    }

    pub fn snapshot(root: impl Into<String>) -> Self {
        Self::new(Phase::Snapshot, root)
    }

    pub fn patch(root: impl Into<String>) -> Self {
        Self::new(Phase::Patch, root)
    }

    /// Override the limit past which the run is reported as slow.
    pub fn slow_after(mut self, limit: Duration) -> Self {
        self.slow_after = limit;
        self
    }

    /// Record how many files or operations the run handled.
    pub fn set_items(&mut self, items: usize) {
        self.items = Some(items);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

fn human(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    match ms {
        0..=999 => format!("{ms}ms"),
        1000..=59_999 => format!("{:.2}s", elapsed.as_secs_f64()),
        _ => format!("{}m {:.1}s", ms / 60_000, (ms % 60_000) as f64 / 1000.0),
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let took = human(elapsed);
        let items = self.items.unwrap_or(0);

        if elapsed >= self.slow_after {
            warn!(phase = %self.phase, root = %self.root, items, took = %took, "Slow run finished");
        } else if elapsed >= self.info_after {
            info!(phase = %self.phase, root = %self.root, items, took = %took, "Run finished");
        } else {
            debug!(phase = %self.phase, root = %self.root, items, took = %took, "Run finished");
        }
    }
}
