//! Logging utilities with colored output and progress display.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro for output only shown with `--verbose`
//! - `ProgressLine` for single-line per-stage progress counters
//!
//! # Example
//!
//! ```ignore
//! log!("publish"; "fingerprinting {} assets", count);
//!
//! let progress = ProgressLine::new("fingerprint", &[("renamed", 40), ("kept", 2)]);
//! progress.inc("renamed");
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Active progress bar count (for log coordination)
static BAR_COUNT: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
#[allow(clippy::cast_possible_truncation)] // Safe: bars count is always small
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();

    let bar_count = BAR_COUNT.load(Ordering::SeqCst);
    if bar_count > 0 {
        execute!(stdout, cursor::MoveToColumn(0)).ok();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
    } else {
        execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    }

    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "publish" => prefix.bright_blue().bold().to_string(),
        "verify" | "done" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Progress Line (single-line counters)
// ============================================================================

/// Single-line progress display with multiple counters
///
/// Displays: `[fingerprint] renamed(42/69) kept(2/2)`
///
/// All counters update in place on the same line. Uses `try_lock` to avoid
/// blocking worker threads - if display is busy, the update is skipped.
/// Nothing is drawn in quiet mode, the counters still count.
pub struct ProgressLine {
    stage: &'static str,
    counters: Vec<Counter>,
    lock: Mutex<()>,
    quiet: bool,
}

struct Counter {
    name: &'static str,
    total: usize,
    current: AtomicUsize,
}

impl ProgressLine {
    /// Create a new progress display for one stage.
    ///
    /// Only includes counters with total > 0.
    pub fn new(stage: &'static str, items: &[(&'static str, usize)]) -> Self {
        Self::build(stage, items, false)
    }

    /// Create a progress tracker that never draws.
    pub fn quiet(stage: &'static str, items: &[(&'static str, usize)]) -> Self {
        Self::build(stage, items, true)
    }

    fn build(stage: &'static str, items: &[(&'static str, usize)], quiet: bool) -> Self {
        let counters: Vec<_> = items
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|(name, total)| Counter {
                name,
                total: *total,
                current: AtomicUsize::new(0),
            })
            .collect();

        if !quiet {
            BAR_COUNT.store(1, Ordering::SeqCst);
        }

        let progress = Self {
            stage,
            counters,
            lock: Mutex::new(()),
            quiet,
        };
        progress.display(false);
        progress
    }

    /// Increment the counter with the given name.
    ///
    /// Non-blocking: if display lock is held, skips refresh.
    #[inline]
    pub fn inc(&self, name: &str) {
        for counter in &self.counters {
            if counter.name == name {
                counter.current.fetch_add(1, Ordering::Relaxed);
                if self.lock.try_lock().is_some() {
                    self.display(false);
                }
                return;
            }
        }
    }

    /// Current value of a counter (0 for unknown names).
    #[cfg(test)]
    pub fn get(&self, name: &str) -> usize {
        self.counters
            .iter()
            .find(|c| c.name == name)
            .map_or(0, |c| c.current.load(Ordering::Relaxed))
    }

    fn render(&self) -> String {
        self.counters
            .iter()
            .map(|c| {
                let current = c.current.load(Ordering::Relaxed);
                format!("{}({}/{})", c.name, current, c.total)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Display the current progress line (overwrites current line).
    fn display(&self, newline: bool) {
        if self.quiet || self.counters.is_empty() {
            return;
        }

        let line = self.render();
        let prefix = colorize_prefix(self.stage, self.stage);

        let mut stdout = stdout().lock();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine)
        )
        .ok();
        if newline {
            writeln!(stdout, "{prefix} {line}").ok();
        } else {
            write!(stdout, "{prefix} {line}").ok();
        }
        stdout.flush().ok();
    }

    /// Finish progress display, preserve line and move to next line.
    pub fn finish(self) {
        if !self.quiet {
            BAR_COUNT.store(0, Ordering::SeqCst);
        }

        {
            let _guard = self.lock.lock(); // Wait for any pending display
            self.display(true);
        }

        std::mem::forget(self); // Prevent Drop from clearing
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        if self.quiet {
            return;
        }
        BAR_COUNT.store(0, Ordering::SeqCst);

        // Clear the line on drop (if not finished properly, e.g. a stage error)
        let mut stdout = stdout().lock();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine)
        )
        .ok();
        stdout.flush().ok();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_skips_empty_counters() {
        let progress = ProgressLine::quiet("compress", &[("files", 0), ("bytes", 3)]);
        assert_eq!(progress.counters.len(), 1);
        assert_eq!(progress.render(), "bytes(0/3)");
    }

    #[test]
    fn test_progress_inc() {
        let progress = ProgressLine::quiet("fingerprint", &[("renamed", 2), ("kept", 1)]);
        progress.inc("renamed");
        progress.inc("renamed");
        progress.inc("unknown");
        assert_eq!(progress.get("renamed"), 2);
        assert_eq!(progress.get("kept"), 0);
        assert_eq!(progress.render(), "renamed(2/2) kept(0/1)");
    }

    #[test]
    fn test_prefix_contains_module() {
        let prefix = colorize_prefix("Publish", "publish");
        assert!(prefix.contains("[Publish]"));
    }
}
