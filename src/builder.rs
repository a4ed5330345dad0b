use {
    crate::{
        error::SinkError,
        rotation::{LogSink, RotationPolicy},
    },
    std::path::{Path, PathBuf},
};

/// Defines size thresholds for rotating log files in various units.
///
/// * `Bytes` - Direct byte count (e.g., 1048576 bytes)
/// * `KB` - Kilobytes (1 KB = 1024 bytes)
/// * `MB` - Megabytes (1 MB = 1024 KB)
/// * `GB` - Gigabytes (1 GB = 1024 MB)
///
/// # Examples
/// ```
/// use sizeroller::{LogSinkBuilder, RotationSize};
///
/// let dir = tempfile::tempdir().unwrap();
///
/// // Rotate when the file would grow past 100 MB
/// let sink = LogSinkBuilder::new(dir.path().join("large.log"))
///     .max_size(RotationSize::MB(100))
///     .build()
///     .unwrap();
/// assert_eq!(sink.max_bytes(), 100 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationSize {
    /// Raw byte count
    Bytes(u64),
    /// Kilobytes (1 KB = 1024 bytes)
    KB(u64),
    /// Megabytes (1 MB = 1024 KB = 1,048,576 bytes)
    MB(u64),
    /// Gigabytes (1 GB = 1024 MB = 1,073,741,824 bytes)
    GB(u64),
}

impl RotationSize {
    /// Get the threshold in bytes.
    pub fn bytes(&self) -> u64 {
        match self {
            RotationSize::Bytes(b) => *b,
            RotationSize::KB(kb) => kb * 1024,
            RotationSize::MB(mb) => mb * 1024 * 1024,
            RotationSize::GB(gb) => gb * 1024 * 1024 * 1024,
        }
    }
}

/// Provides a fluent interface for configuring [`LogSink`] instances.
///
/// # Default Configuration
///
/// * Rotate before the active file grows past 100 MiB
/// * Keep 5 numbered backups
/// * Standard file permissions
///
/// # Examples
///
/// ```rust
/// use sizeroller::{LogSinkBuilder, RotationSize};
///
/// let dir = tempfile::tempdir().unwrap();
/// let sink = LogSinkBuilder::new(dir.path().join("app.log"))
///     .max_size(RotationSize::KB(256))
///     .backup_count(3) // app.log.1 .. app.log.3
///     .build()
///     .unwrap();
/// sink.write(b"ready\n").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct LogSinkBuilder {
    path: PathBuf,
    policy: RotationPolicy,
    file_mode: Option<u32>,
}

impl LogSinkBuilder {
    /// Create a new builder for the active log file at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        LogSinkBuilder {
            path: path.as_ref().to_path_buf(),
            policy: RotationPolicy::default(),
            file_mode: None,
        }
    }

    /// Set the size threshold in bytes. `0` disables rotation.
    pub fn max_bytes(self, max_bytes: u64) -> Self {
        Self {
            policy: RotationPolicy {
                max_bytes,
                ..self.policy
            },
            ..self
        }
    }

    /// Set the size threshold using a [`RotationSize`] unit.
    pub fn max_size(self, size: RotationSize) -> Self {
        self.max_bytes(size.bytes())
    }

    /// Set the number of backups to keep. `0` truncates the active file on
    /// rotation instead of keeping history.
    pub fn backup_count(self, backup_count: usize) -> Self {
        Self {
            policy: RotationPolicy {
                backup_count,
                ..self.policy
            },
            ..self
        }
    }

    /// Set the file permissions for log files (Unix-like systems only).
    /// This sets the file mode bits in octal notation like when using chmod.
    /// For example, 0o644 for rw-r--r-- permissions.
    pub fn file_mode(self, mode: u32) -> Self {
        Self {
            file_mode: Some(mode),
            ..self
        }
    }

    /// Open the sink.
    pub fn build(self) -> Result<LogSink, SinkError> {
        LogSink::with_policy(self.path, self.policy, self.file_mode)
    }
}
