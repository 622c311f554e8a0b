//! Per-category counters, throughput-based ETA, and the in-place status line.
//!
//! Two groups are tracked: "text" (docket + documents + comments + derived)
//! and, when attachments are part of the run, "binary". The text clock starts
//! when the queue is populated; the binary clock starts at the first binary
//! completion, since attachments are queued after the text records.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::types::{Category, GroupTally};

/// Rendered in place of an ETA that cannot be estimated yet
pub const UNKNOWN_ETA: &str = "  N/A ";

/// Shared user-facing output.
///
/// Cloning is cheap; all clones write to the same sink under one lock so
/// lines from concurrent workers never interleave. Write errors are ignored:
/// the console is display-only and must never fail a transfer.
#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Console {
    /// Console writing to standard output
    pub fn stdout() -> Self {
        Self::from_writer(std::io::stdout())
    }

    /// Console writing to any sink
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Redraw the current line: `\r` followed by `text` padded to `width`
    pub fn overwrite(&self, text: &str, width: usize) {
        self.emit(format_args!("\r{text:<width$}"));
    }

    /// Write `text` and return the cursor to the start of the line
    pub fn carriage(&self, text: &str) {
        self.emit(format_args!("{text}\r"));
    }

    /// Write a full line
    pub fn line(&self, text: &str) {
        self.emit(format_args!("{text}\n"));
    }

    fn emit(&self, args: std::fmt::Arguments<'_>) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = out.write_fmt(args);
        let _ = out.flush();
    }
}

/// Estimated time to finish a group
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eta {
    /// No throughput observed yet
    Unknown,
    /// Estimated remaining time
    Remaining(Duration),
}

impl Eta {
    /// Estimate from items done, items total, and time spent so far.
    ///
    /// A finished group is always `0m00s`. Otherwise, with no elapsed time or
    /// no completions yet the rate is zero and the ETA is unknown.
    pub fn estimate(done: u64, total: u64, elapsed: Duration) -> Self {
        let remaining = total.saturating_sub(done);
        if remaining == 0 {
            return Eta::Remaining(Duration::ZERO);
        }
        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 { done as f64 / secs } else { 0.0 };
        if rate > 0.0 {
            Eta::Remaining(Duration::from_secs_f64(remaining as f64 / rate))
        } else {
            Eta::Unknown
        }
    }
}

impl std::fmt::Display for Eta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Eta::Unknown => UNKNOWN_ETA.to_string(),
            Eta::Remaining(d) => {
                let secs = d.as_secs();
                format!("{:2}m{:02}s", secs / 60, secs % 60)
            }
        };
        // Honor width/alignment so the status line columns stay fixed.
        f.pad(&text)
    }
}

/// Counts for one category
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CategoryCounter {
    /// Items listed for this category
    pub total: u64,
    /// Items transferred successfully
    pub completed: u64,
    /// Items not yet finished
    pub remaining: u64,
}

impl CategoryCounter {
    fn new(total: u64) -> Self {
        Self {
            total,
            completed: 0,
            remaining: total,
        }
    }

    fn complete_one(&mut self) {
        if self.completed < self.total {
            self.completed += 1;
            self.remaining -= 1;
        } else {
            tracing::warn!(
                total = self.total,
                "Completion recorded beyond category total, ignoring"
            );
        }
    }
}

/// Per-category counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    /// Docket records
    pub docket: CategoryCounter,
    /// Document records
    pub documents: CategoryCounter,
    /// Comment records
    pub comments: CategoryCounter,
    /// Derived data
    pub derived: CategoryCounter,
    /// Binary attachments, tracked only when part of the run
    pub binary: Option<CategoryCounter>,
}

impl Counters {
    /// Counter for a category, if it is tracked
    pub fn get(&self, category: Category) -> Option<&CategoryCounter> {
        match category {
            Category::Docket => Some(&self.docket),
            Category::Documents => Some(&self.documents),
            Category::Comments => Some(&self.comments),
            Category::Derived => Some(&self.derived),
            Category::Binary => self.binary.as_ref(),
        }
    }

    fn get_mut(&mut self, category: Category) -> Option<&mut CategoryCounter> {
        match category {
            Category::Docket => Some(&mut self.docket),
            Category::Documents => Some(&mut self.documents),
            Category::Comments => Some(&mut self.comments),
            Category::Derived => Some(&mut self.derived),
            Category::Binary => self.binary.as_mut(),
        }
    }

    /// Completed items of the text group
    pub fn text_done(&self) -> u64 {
        self.docket.completed
            + self.documents.completed
            + self.comments.completed
            + self.derived.completed
    }

    /// Whether every tracked category has nothing left
    pub fn is_drained(&self) -> bool {
        [self.docket, self.documents, self.comments, self.derived]
            .iter()
            .chain(self.binary.iter())
            .all(|c| c.remaining == 0)
    }
}

/// Group totals fixed when the queue is populated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    /// docket + documents + comments + derived
    pub text: u64,
    /// Binary attachments, when part of the run
    pub binary: Option<u64>,
}

/// Start times of the two throughput clocks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockAnchors {
    /// Set once, when the queue is populated
    pub text_start: Instant,
    /// Latched on the first binary completion
    pub binary_start: Option<Instant>,
}

/// Point-in-time view of both groups, ready to render
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Text group counts
    pub text: GroupTally,
    /// Text group estimate
    pub text_eta: Eta,
    /// Binary group counts and estimate, when tracked
    pub binary: Option<(GroupTally, Eta)>,
}

impl ProgressSnapshot {
    /// The status line, without padding
    pub fn render(&self) -> String {
        let mut line = format!(
            "Text: {:6}/{:6} ETA:{:7}",
            self.text.done, self.text.total, self.text_eta
        );
        if let Some((tally, eta)) = &self.binary {
            line.push_str(&format!(
                " | Bin: {:6}/{:6} ETA:{:7}",
                tally.done, tally.total, eta
            ));
        }
        line
    }
}

struct ProgressState {
    counters: Counters,
    totals: Totals,
    anchors: ClockAnchors,
}

impl ProgressState {
    fn snapshot(&self, now: Instant) -> ProgressSnapshot {
        let text = GroupTally {
            done: self.counters.text_done(),
            total: self.totals.text,
        };
        let text_eta = Eta::estimate(
            text.done,
            text.total,
            now.saturating_duration_since(self.anchors.text_start),
        );

        let binary = match (self.counters.binary, self.totals.binary) {
            (Some(counter), Some(total)) => {
                let tally = GroupTally {
                    done: counter.completed,
                    total,
                };
                let elapsed = self
                    .anchors
                    .binary_start
                    .map_or(Duration::ZERO, |start| now.saturating_duration_since(start));
                Some((tally, Eta::estimate(tally.done, tally.total, elapsed)))
            }
            _ => None,
        };

        ProgressSnapshot {
            text,
            text_eta,
            binary,
        }
    }
}

/// Shared progress state for one run.
///
/// Every completion is a single critical section: bump the category counter,
/// latch the binary clock if needed, take a snapshot, and redraw the status
/// line. Holding the lock while drawing keeps the displayed counts monotonic.
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
    console: Console,
    line_width: usize,
}

impl ProgressTracker {
    /// Start tracking; the text clock starts now.
    ///
    /// `category_totals` holds the number of listed items per category.
    /// Binary is tracked only if it appears there.
    pub fn new(
        category_totals: &[(Category, u64)],
        console: Console,
        line_width: usize,
    ) -> Self {
        Self::with_start(category_totals, console, line_width, Instant::now())
    }

    fn with_start(
        category_totals: &[(Category, u64)],
        console: Console,
        line_width: usize,
        text_start: Instant,
    ) -> Self {
        let mut counters = Counters::default();
        for &(category, total) in category_totals {
            match category {
                Category::Docket => counters.docket = CategoryCounter::new(total),
                Category::Documents => counters.documents = CategoryCounter::new(total),
                Category::Comments => counters.comments = CategoryCounter::new(total),
                Category::Derived => counters.derived = CategoryCounter::new(total),
                Category::Binary => counters.binary = Some(CategoryCounter::new(total)),
            }
        }
        let totals = Totals {
            text: counters.docket.total
                + counters.documents.total
                + counters.comments.total
                + counters.derived.total,
            binary: counters.binary.map(|c| c.total),
        };

        Self {
            state: Mutex::new(ProgressState {
                counters,
                totals,
                anchors: ClockAnchors {
                    text_start,
                    binary_start: None,
                },
            }),
            console,
            line_width,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one successful transfer and redraw the status line
    pub fn record_completion(&self, category: Category) -> ProgressSnapshot {
        self.record_completion_at(category, Instant::now())
    }

    fn record_completion_at(&self, category: Category, now: Instant) -> ProgressSnapshot {
        let mut state = self.lock();
        if let Some(counter) = state.counters.get_mut(category) {
            counter.complete_one();
        }
        if category == Category::Binary
            && state.counters.binary.is_some()
            && state.anchors.binary_start.is_none()
        {
            state.anchors.binary_start = Some(now);
        }
        let snapshot = state.snapshot(now);
        self.console.overwrite(&snapshot.render(), self.line_width);
        snapshot
    }

    /// Current counts without recording anything
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.lock().snapshot(Instant::now())
    }

    /// Copy of the per-category counters
    pub fn counters(&self) -> Counters {
        self.lock().counters.clone()
    }

    /// Group totals
    pub fn totals(&self) -> Totals {
        self.lock().totals
    }

    /// Clock anchors
    pub fn anchors(&self) -> ClockAnchors {
        self.lock().anchors
    }
}
