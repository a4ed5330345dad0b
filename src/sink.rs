use {
    crate::error::SinkError,
    std::{
        fs,
        io::Write as _,
        path::{Path, PathBuf},
    },
};

#[cfg(unix)]
use std::{fs::Permissions, os::unix::fs::PermissionsExt};

/// The leaf of the sink stack: one append-only file handle plus a running
/// byte count of what is on disk.
///
/// `SizeTrackingSink` is not synchronized. It is owned by a
/// [`LogSink`](crate::LogSink), which serializes access to it.
#[derive(Debug)]
pub struct SizeTrackingSink {
    /// The active log file.
    path: PathBuf,
    /// `None` once closed, or after a reopen failed.
    file: Option<fs::File>,
    /// Bytes currently in `path`, as far as this process knows.
    current_size: u64,
    /// Unix mode applied to every file this sink creates.
    file_mode: Option<u32>,
}

impl SizeTrackingSink {
    /// Open `path` for appending, creating it and any missing parent
    /// directories.
    ///
    /// The current size is read from the filesystem, so a sink reopened on a
    /// partially filled file after a restart continues counting from the
    /// existing length.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        Self::open_with_mode(path, None)
    }

    pub(crate) fn open_with_mode<P: AsRef<Path>>(path: P, file_mode: Option<u32>) -> Result<Self, SinkError> {
        let mut sink = SizeTrackingSink {
            path: path.as_ref().to_path_buf(),
            file: None,
            current_size: 0,
            file_mode,
        };
        #[cfg(not(unix))]
        if let Some(mode) = sink.file_mode {
            tracing::warn!(mode, "setting file permissions is not supported on this platform");
        }
        sink.open_file(false)?;
        Ok(sink)
    }

    /// Append `buf` with a single write call.
    ///
    /// The size counter grows by the number of bytes the OS accepted, which
    /// may be less than `buf.len()`.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize, SinkError> {
        let file = self.file.as_mut().ok_or(SinkError::Closed)?;
        let written = file.write(buf)?;
        self.current_size += written as u64;
        Ok(written)
    }

    pub fn flush(&mut self) -> Result<(), SinkError> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }

    /// Flush and release the handle. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<(), SinkError> {
        match self.file.take() {
            Some(mut file) => {
                file.flush()?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Open the active path again, replacing any current handle.
    ///
    /// With `truncate` the file is emptied first. The size counter is always
    /// re-derived from the file's metadata. A missing parent directory that
    /// cannot be recreated is reported as [`SinkError::OpenFailed`]: the sink
    /// was already running, so this is an I/O failure, not bad configuration.
    pub fn reopen(&mut self, truncate: bool) -> Result<(), SinkError> {
        self.open_file(truncate).map_err(|err| match err {
            SinkError::CreateDirectoryFailed { source, .. } => SinkError::OpenFailed {
                path: self.path.clone(),
                source,
            },
            err => err,
        })
    }

    fn open_file(&mut self, truncate: bool) -> Result<(), SinkError> {
        self.close()?;
        let file = create_log_file(&self.path, truncate)?;
        self.current_size = file
            .metadata()
            .map_err(|source| SinkError::OpenFailed {
                path: self.path.clone(),
                source,
            })?
            .len();
        self.set_permissions()?;
        self.file = Some(file);
        Ok(())
    }

    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Set the permissions of the active file based on the configured mode.
    ///
    /// Only has an effect on Unix-like systems. Runs with the sink lock held,
    /// so it must not log.
    fn set_permissions(&self) -> Result<(), SinkError> {
        #[cfg(unix)]
        if let Some(mode) = self.file_mode {
            fs::set_permissions(&self.path, Permissions::from_mode(mode)).map_err(|source| SinkError::OpenFailed {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Open (or create) the log file at `log_path` in append mode, creating its
/// parent directory on the first failure.
fn create_log_file(log_path: &Path, truncate: bool) -> Result<fs::File, SinkError> {
    let mut open_options = fs::OpenOptions::new();
    if truncate {
        open_options.write(true).truncate(true).create(true);
    } else {
        open_options.append(true).create(true);
    }

    let mut res = open_options.open(log_path);
    if res.is_err() {
        if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SinkError::CreateDirectoryFailed {
                path: parent.to_path_buf(),
                source,
            })?;
            res = open_options.open(log_path);
        }
    }

    res.map_err(|source| SinkError::OpenFailed {
        path: log_path.to_path_buf(),
        source,
    })
}

impl Drop for SizeTrackingSink {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to flush log file on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, tempfile::TempDir};

    #[test]
    fn open_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/app.log");

        let sink = SizeTrackingSink::open(&path).unwrap();

        assert!(path.exists());
        assert!(sink.is_open());
        assert_eq!(sink.current_size(), 0);
    }

    #[test]
    fn open_reads_existing_length() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, b"0123456789").unwrap();

        let sink = SizeTrackingSink::open(&path).unwrap();

        assert_eq!(sink.current_size(), 10);
    }

    #[test]
    fn size_tracks_disk_after_each_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut sink = SizeTrackingSink::open(&path).unwrap();

        for line in ["first line\n", "second\n", "", "third line here\n"] {
            let n = sink.write(line.as_bytes()).unwrap();
            assert_eq!(n, line.len());
            sink.flush().unwrap();
            assert_eq!(sink.current_size(), fs::metadata(&path).unwrap().len());
        }
    }

    #[test]
    fn writes_append_to_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, b"old\n").unwrap();

        let mut sink = SizeTrackingSink::open(&path).unwrap();
        sink.write(b"new\n").unwrap();
        sink.close().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"old\nnew\n");
    }

    #[test]
    fn close_is_idempotent_and_blocks_writes() {
        let dir = TempDir::new().unwrap();
        let mut sink = SizeTrackingSink::open(dir.path().join("app.log")).unwrap();

        sink.close().unwrap();
        sink.close().unwrap();

        assert!(!sink.is_open());
        assert!(matches!(sink.write(b"late"), Err(SinkError::Closed)));
    }

    #[test]
    fn reopen_truncate_empties_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut sink = SizeTrackingSink::open(&path).unwrap();
        sink.write(b"some content").unwrap();

        sink.reopen(true).unwrap();

        assert_eq!(sink.current_size(), 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn open_fails_when_parent_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();

        let err = SizeTrackingSink::open(blocker.join("app.log")).unwrap_err();

        assert!(matches!(err, SinkError::CreateDirectoryFailed { .. }));
        assert!(err.is_configuration());
    }

    #[cfg(unix)]
    #[test]
    fn reopen_after_directory_loss_is_an_io_failure() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        let path = logs.join("app.log");
        let mut sink = SizeTrackingSink::open(&path).unwrap();

        fs::remove_dir_all(&logs).unwrap();
        fs::write(&logs, b"").unwrap();
        let err = sink.reopen(false).unwrap_err();

        assert!(matches!(&err, SinkError::OpenFailed { path: failed, .. } if *failed == path));
        assert!(!err.is_configuration());
        assert!(!sink.is_open());
    }

    #[cfg(unix)]
    #[test]
    fn file_mode_is_applied() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");

        let _sink = SizeTrackingSink::open_with_mode(&path, Some(0o640)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }
}
