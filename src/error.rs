use std::{io, path::PathBuf};

/// Errors that can occur when opening, writing to, or rotating a log sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Invalid configuration: {field} is out of range (got {value})")]
    InvalidConfig { field: &'static str, value: i64 },
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to open log file '{path}': {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to rename file from '{from}' to '{to}': {source}")]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to remove file '{path}': {source}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("File IO error: {0}")]
    Io(#[from] io::Error),
    #[error("sink closed")]
    Closed,
}

impl SinkError {
    /// Returns true for errors the caller should treat as a configuration
    /// failure, i.e. fall back to console-only logging and keep running.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SinkError::InvalidConfig { .. } | SinkError::CreateDirectoryFailed { .. }
        )
    }

    /// Returns true if the sink was already closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, SinkError::Closed)
    }
}

impl From<SinkError> for io::Error {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Io(err) => err,
            SinkError::OpenFailed { source, .. }
            | SinkError::CreateDirectoryFailed { source, .. }
            | SinkError::RenameFailed { source, .. }
            | SinkError::RemoveFailed { source, .. } => source,
            invalid @ SinkError::InvalidConfig { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, invalid.to_string())
            }
            SinkError::Closed => io::Error::other("sink closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_maps_to_other_io_error() {
        let err: io::Error = SinkError::Closed.into();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(err.to_string(), "sink closed");
    }

    #[test]
    fn open_failure_keeps_underlying_kind() {
        let err = SinkError::OpenFailed {
            path: PathBuf::from("/nope/app.log"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(!err.is_configuration());
        let err: io::Error = err.into();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn configuration_errors() {
        assert!(SinkError::InvalidConfig {
            field: "max_bytes",
            value: -1
        }
        .is_configuration());
        assert!(SinkError::CreateDirectoryFailed {
            path: PathBuf::from("/root/logs"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        }
        .is_configuration());
        assert!(!SinkError::Closed.is_configuration());
    }
}
