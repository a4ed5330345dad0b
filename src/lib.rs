//! # SizeRoller
//!
//! SizeRoller is a library for rolling over log files by size. The active
//! file lives at a fixed path; once a write would push it past the configured
//! limit, the file is retired into a numbered backup chain (`app.log.1` is the
//! most recent, `app.log.N` the oldest) and a fresh file is started. Only the
//! configured number of backups is kept. **A [`LogSink`] can be shared between
//! threads and plugged into `tracing-subscriber` as a writer**: every write and
//! the rotation it may trigger run as one critical section, so lines never
//! interleave and no writer ever sees a half-rotated chain.
//!
//! The current size is read from disk when the sink opens, so a restarted
//! process keeps counting from where the previous one stopped.
//!
//! The layout matches what log-rotation-aware tooling expects: plain renames,
//! no headers or markers.
//!
//! ## Example
//!
//! ```rust
//! use {
//!    sizeroller::{LogSinkBuilder, RotationSize},
//!    std::sync::Arc,
//!    tracing_subscriber::util::SubscriberInitExt,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!    let dir = tempfile::tempdir()?;
//!    let sink = LogSinkBuilder::new(dir.path().join("tracing.log"))
//!        .max_size(RotationSize::MB(10))
//!        .backup_count(3)
//!        .build()?;
//!    let sink = Arc::new(sink);
//!    tracing_subscriber::fmt()
//!        .with_writer(Arc::clone(&sink))
//!        .with_ansi(false)
//!        .with_target(false)
//!        .with_file(true)
//!        .with_line_number(true)
//!        .finish()
//!        .try_init()?;
//!
//!    tracing::info!("This is an info message");
//!    tracing::warn!("This is a warning message");
//!    tracing::error!("This is an error message");
//!
//!    sink.close()?;
//!    Ok(())
//! }
//! ```
//!
//! ## Limitations
//!
//! Rotation is a sequence of renames, not a transaction. A crash in the
//! middle can leave a gap in the chain or no active file at all; the next
//! [`LogSink::open`] creates the active file if it is missing and the next
//! rotation closes most gaps. Only one process may write a given path.

mod builder;
mod config;
mod error;
pub mod global;
mod output;
mod rotation;
mod sink;

pub use {
    builder::{LogSinkBuilder, RotationSize},
    config::LogConfig,
    error::SinkError,
    output::LogOutput,
    rotation::{backup_path, list_backups, LogSink, RotationPolicy, DEFAULT_BACKUP_COUNT, DEFAULT_MAX_BYTES},
    sink::SizeTrackingSink,
};
