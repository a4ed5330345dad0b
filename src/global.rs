//! Process-wide log output for services that prefer a single shared instance
//! over passing an `Arc<LogOutput>` around.
//!
//! Nothing is created implicitly: [`get`] returns `None` until [`init`] has
//! run. [`init`] is idempotent: the first call builds the output and later
//! calls return that same instance, ignoring their config. [`shutdown`]
//! closes the file and clears the slot so a following [`init`] starts over.

use {
    crate::{config::LogConfig, error::SinkError, output::LogOutput},
    std::sync::{Arc, Mutex, PoisonError},
};

static OUTPUT: Mutex<Option<Arc<LogOutput>>> = Mutex::new(None);

/// Install the process-wide output, or return the one already installed.
pub fn init(config: &LogConfig) -> Arc<LogOutput> {
    let mut slot = OUTPUT.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(output) = slot.as_ref() {
        tracing::debug!("log output already initialized, keeping existing instance");
        return Arc::clone(output);
    }
    let output = Arc::new(LogOutput::from_config(config));
    *slot = Some(Arc::clone(&output));
    output
}

pub fn get() -> Option<Arc<LogOutput>> {
    OUTPUT.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Close and remove the process-wide output. Clones handed out earlier keep
/// the (now closed) instance alive; writes through them fail with
/// [`SinkError::Closed`].
pub fn shutdown() -> Result<(), SinkError> {
    let output = OUTPUT.lock().unwrap_or_else(PoisonError::into_inner).take();
    match output {
        Some(output) => output.close(),
        None => Ok(()),
    }
}
