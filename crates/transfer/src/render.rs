//! Single-line terminal progress rendering.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use console::Term;

use crate::MIB;

/// Bar width used when the output is not a terminal or has room to spare.
pub const DEFAULT_BAR_WIDTH: usize = 30;

/// The bar never shrinks below this many cells.
pub const MIN_BAR_WIDTH: usize = 5;

const FILLED: char = '█';
const EMPTY: char = '░';

const ERASE_LINE: &str = "\r\x1b[2K";
const DISABLE_LINE_WRAP: &str = "\x1b[?7l";
const ENABLE_LINE_WRAP: &str = "\x1b[?7h";

/// Everything needed to draw one status line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub done: u64,
    pub total: u64,
    /// Smoothed rate in bytes/sec.
    pub rate: f64,
    /// `None` when the remaining time is unknown.
    pub eta: Option<Duration>,
}

impl ProgressSnapshot {
    /// Completed fraction in `[0, 1]`. An empty transfer counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.done as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}

/// Formats seconds as zero-padded `HH:MM:SS`.
///
/// Fractions are floored; negative and non-finite input renders as zero.
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Formats a byte count in mebibytes with two decimals.
pub fn format_mib(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / MIB)
}

/// Formats a rate as megabits/sec and mebibytes/sec.
pub fn format_speed(rate: f64) -> String {
    let rate = if rate.is_finite() { rate.max(0.0) } else { 0.0 };
    format!(
        "{:.2} Mb/s ({:.2} MiB/s)",
        rate * 8.0 / 1_000_000.0,
        rate / MIB
    )
}

/// Draws a bar `width` cells wide with `round(fraction * width)` filled.
pub fn render_bar(fraction: f64, width: usize) -> String {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = ((fraction * width as f64).round() as usize).min(width);
    let mut bar = String::with_capacity(width * FILLED.len_utf8());
    bar.extend(std::iter::repeat_n(FILLED, filled));
    bar.extend(std::iter::repeat_n(EMPTY, width - filled));
    bar
}

/// Builds the status line.
///
/// With a non-zero `columns` the bar shrinks (down to [`MIN_BAR_WIDTH`])
/// so the whole line fits in that many columns.
pub fn format_line(snapshot: &ProgressSnapshot, columns: usize) -> String {
    let fraction = snapshot.fraction();
    let eta = match snapshot.eta {
        Some(eta) => format_hms(eta.as_secs_f64()),
        None => "--:--:--".to_string(),
    };
    let suffix = format!(
        " {:>5.1}% | {}/{} MiB | {} | ETA {}",
        fraction * 100.0,
        format_mib(snapshot.done),
        format_mib(snapshot.total),
        format_speed(snapshot.rate),
        eta
    );

    let bar_width = if columns == 0 {
        DEFAULT_BAR_WIDTH
    } else {
        // Two cells for the brackets.
        let room = columns.saturating_sub(suffix.chars().count() + 2);
        room.clamp(MIN_BAR_WIDTH, DEFAULT_BAR_WIDTH)
    };

    format!("[{}]{suffix}", render_bar(fraction, bar_width))
}

/// Renderer shared between the tick task and its owner.
pub type SharedRenderer<W> = Arc<Mutex<ProgressRenderer<W>>>;

/// Writes status lines to a terminal (redrawn in place) or to a plain
/// stream (one line per draw).
pub struct ProgressRenderer<W> {
    out: W,
    interactive: bool,
    columns: usize,
    probe: Option<Term>,
    last_len: usize,
    drawn: bool,
    released: bool,
}

impl ProgressRenderer<Term> {
    /// Renders to stderr, redrawing in place when stderr is a terminal.
    pub fn stderr() -> Self {
        let term = Term::stderr();
        if term.is_term() {
            let columns = usize::from(term.size().1);
            let mut renderer = Self::new(term.clone(), true, columns);
            renderer.probe = Some(term);
            renderer
        } else {
            Self::new(term, false, 0)
        }
    }
}

impl<W: Write> ProgressRenderer<W> {
    /// Creates a renderer over `out`.
    ///
    /// `columns` is the terminal width and is ignored when `interactive`
    /// is false.
    pub fn new(out: W, interactive: bool, columns: usize) -> Self {
        Self {
            out,
            interactive,
            columns: if interactive { columns } else { 0 },
            probe: None,
            last_len: 0,
            drawn: false,
            released: false,
        }
    }

    /// Renders to `out` as a non-interactive stream.
    pub fn plain(out: W) -> Self {
        Self::new(out, false, 0)
    }

    /// Wraps the renderer for sharing with a [`ProgressTicker`](crate::ProgressTicker).
    pub fn shared(self) -> SharedRenderer<W> {
        Arc::new(Mutex::new(self))
    }

    /// Draws one status line. Does nothing once [`release`](Self::release)d.
    pub fn draw(&mut self, snapshot: &ProgressSnapshot) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        if let Some(term) = &self.probe {
            self.columns = usize::from(term.size().1);
        }

        let line = format_line(snapshot, self.columns);
        if !self.interactive {
            writeln!(self.out, "{line}")?;
            self.drawn = true;
            return self.out.flush();
        }

        let len = line.chars().count();
        let mut pad = self.last_len.saturating_sub(len);
        if self.columns > 0 {
            pad = pad.min(self.columns.saturating_sub(len));
        }
        write!(self.out, "{ERASE_LINE}{line}{:pad$}", "")?;
        self.last_len = len;
        self.drawn = true;
        self.out.flush()
    }

    /// Ends the in-place line so later output starts on a fresh one.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.interactive && self.drawn {
            writeln!(self.out)?;
            self.drawn = false;
            self.last_len = 0;
        }
        self.out.flush()
    }

    /// Toggles terminal auto-wrap. No-op for non-interactive output.
    pub fn set_line_wrap(&mut self, enabled: bool) -> io::Result<()> {
        if !self.interactive {
            return Ok(());
        }
        let seq = if enabled {
            ENABLE_LINE_WRAP
        } else {
            DISABLE_LINE_WRAP
        };
        self.out.write_all(seq.as_bytes())?;
        self.out.flush()
    }

    /// Ends the current line, re-enables line wrap and ignores any later
    /// draws.
    pub fn release(&mut self) -> io::Result<()> {
        self.released = true;
        self.finish()?;
        self.set_line_wrap(true)
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

/// Keeps terminal line wrap disabled for its lifetime.
///
/// Dropping the guard releases the renderer: the line is ended, wrap is
/// re-enabled and stray ticks can no longer draw. Drop also runs while
/// unwinding from a panic or when an in-flight upload future is dropped.
pub struct TerminalGuard<W: Write> {
    renderer: SharedRenderer<W>,
}

impl<W: Write> TerminalGuard<W> {
    pub fn acquire(renderer: &SharedRenderer<W>) -> Self {
        {
            let mut r = renderer.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = r.set_line_wrap(false) {
                tracing::debug!("failed to disable line wrap: {e}");
            }
        }
        Self {
            renderer: Arc::clone(renderer),
        }
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        let mut r = self.renderer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = r.release() {
            tracing::debug!("failed to restore terminal: {e}");
        }
    }
}
