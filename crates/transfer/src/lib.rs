//! Streamed transfer plumbing with live progress.
//!
//! Counts bytes as they flow through an upload body, turns the counter
//! into a smoothed transfer rate and ETA, and renders a single status
//! line to the terminal at a fixed cadence.

mod counter;
mod progress;
mod rate;
mod render;
mod types;
mod validation;

pub use counter::{ByteCounter, CountingStream};
pub use progress::{DEFAULT_TICK_INTERVAL, ProgressTicker};
pub use rate::{DEFAULT_ALPHA, MIN_RATE, RateEstimator, RateSample, eta_for};
pub use render::{
    DEFAULT_BAR_WIDTH, MIN_BAR_WIDTH, ProgressRenderer, ProgressSnapshot, SharedRenderer,
    TerminalGuard, format_hms, format_line, format_mib, format_speed, render_bar,
};
pub use types::TransferSession;
pub use validation::sanitize_file_name;

/// Bytes in one mebibyte.
pub const MIB: f64 = 1_048_576.0;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid file name: {0}")]
    InvalidFileName(String),
}
