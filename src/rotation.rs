use {
    crate::{error::SinkError, sink::SizeTrackingSink},
    regex::Regex,
    std::{
        fs, io,
        path::{Path, PathBuf},
        sync::{Mutex, MutexGuard, PoisonError},
    },
};

/// Default size threshold: 100 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 100 * 1024 * 1024;

/// Default number of retained backups.
pub const DEFAULT_BACKUP_COUNT: usize = 5;

/// When to rotate and how many backups to keep.
///
/// `max_bytes == 0` disables size limiting entirely. `backup_count == 0`
/// keeps no history: the active file is truncated on rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    pub backup_count: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        RotationPolicy {
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
        }
    }
}

impl RotationPolicy {
    /// Whether appending `incoming` bytes to a file of `current_size` bytes
    /// would push it past the limit.
    pub fn should_rotate(&self, current_size: u64, incoming: usize) -> bool {
        self.max_bytes > 0 && current_size.saturating_add(incoming as u64) > self.max_bytes
    }

    /// Retire the active file into the backup chain and start a fresh one.
    ///
    /// Rename and delete failures on backup slots do not stop the rotation;
    /// they are collected and returned so the caller can report them once
    /// the sink lock is released. They are returned even when the final
    /// reopen of the active file fails, in which case the second element is
    /// that error and `sink` is left without a handle.
    pub fn rotate(&self, sink: &mut SizeTrackingSink) -> (Vec<SinkError>, Result<(), SinkError>) {
        let mut failures = Vec::new();
        if let Err(err) = sink.close() {
            failures.push(err);
        }
        let path = sink.path().to_path_buf();

        if self.backup_count == 0 {
            remove_if_exists(&path, &mut failures);
            let reopened = sink.reopen(true);
            return (failures, reopened);
        }

        // 1. Drop the oldest retained backup so the shift below never collides.
        remove_if_exists(&backup_path(&path, self.backup_count), &mut failures);

        // 2. Shift the chain from the top down; ascending order would
        //    overwrite lower slots before they are moved.
        for idx in (1..self.backup_count).rev() {
            let source = backup_path(&path, idx);
            if source.exists() {
                rename(&source, &backup_path(&path, idx + 1), &mut failures);
            }
        }

        // 3. Retire the active file.
        if path.exists() {
            rename(&path, &backup_path(&path, 1), &mut failures);
        }

        // 4. Backups left over from a larger retention window.
        self.prune_stale_backups(&path, &mut failures);

        // 5. A failed rename of the active file leaves its content in place;
        //    reopen re-derives the size from disk either way.
        let reopened = sink.reopen(false);
        (failures, reopened)
    }

    fn prune_stale_backups(&self, path: &Path, failures: &mut Vec<SinkError>) {
        let stale = match list_backups(path) {
            Ok(backups) => backups,
            Err(err) => {
                failures.push(err);
                return;
            }
        };
        for (idx, backup) in stale {
            if idx > self.backup_count {
                remove_if_exists(&backup, failures);
            }
        }
    }
}

/// `<path>.<idx>`
pub fn backup_path(path: &Path, idx: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{idx}"));
    PathBuf::from(name)
}

/// List the numbered backups of `path` that exist on disk, ordered from most
/// recent (`.1`) to oldest.
pub fn list_backups(path: &Path) -> Result<Vec<(usize, PathBuf)>, SinkError> {
    let filename = match path.file_name().and_then(|f| f.to_str()) {
        Some(filename) => filename,
        None => return Ok(Vec::new()),
    };
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let pattern = Regex::new(&format!(r"^{}\.(\d+)$", regex::escape(filename)))
        .map_err(|err| SinkError::Io(io::Error::other(err.to_string())))?;

    let mut backups = Vec::new();
    for entry in fs::read_dir(directory)?.flatten() {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let idx = entry
            .file_name()
            .to_str()
            .and_then(|name| pattern.captures(name))
            .and_then(|caps| caps[1].parse::<usize>().ok());
        if let Some(idx) = idx {
            backups.push((idx, backup_path(path, idx)));
        }
    }
    backups.sort_by_key(|(idx, _)| *idx);
    Ok(backups)
}

fn rename(from: &Path, to: &Path, failures: &mut Vec<SinkError>) {
    if let Err(source) = fs::rename(from, to) {
        failures.push(SinkError::RenameFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        });
    }
}

fn remove_if_exists(path: &Path, failures: &mut Vec<SinkError>) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => failures.push(SinkError::RemoveFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

struct SinkState {
    sink: SizeTrackingSink,
    closed: bool,
}

/// A size-bounded, rotating log file that can be shared between threads.
///
/// Every write runs the threshold check, the optional rotation and the write
/// itself as one critical section, so concurrent callers never interleave
/// bytes and never observe a half-rotated chain.
///
/// # Examples
///
/// ```
/// use sizeroller::LogSink;
///
/// let dir = tempfile::tempdir()?;
/// let sink = LogSink::open(dir.path().join("app.log"), 100, 3)?;
/// sink.write(b"hello\n")?;
/// assert_eq!(sink.current_size(), 6);
/// sink.close()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct LogSink {
    path: PathBuf,
    policy: RotationPolicy,
    state: Mutex<SinkState>,
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl LogSink {
    /// Open a rotating sink on `path`.
    ///
    /// An existing file is appended to and its size counts towards
    /// `max_bytes`.
    pub fn open<P: AsRef<Path>>(path: P, max_bytes: u64, backup_count: usize) -> Result<Self, SinkError> {
        Self::with_policy(
            path,
            RotationPolicy {
                max_bytes,
                backup_count,
            },
            None,
        )
    }

    pub(crate) fn with_policy<P: AsRef<Path>>(
        path: P,
        policy: RotationPolicy,
        file_mode: Option<u32>,
    ) -> Result<Self, SinkError> {
        let sink = SizeTrackingSink::open_with_mode(path.as_ref(), file_mode)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            size = sink.current_size(),
            max_bytes = policy.max_bytes,
            backup_count = policy.backup_count,
            "opened log sink"
        );
        Ok(LogSink {
            path: path.as_ref().to_path_buf(),
            policy,
            state: Mutex::new(SinkState { sink, closed: false }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write `buf` to the active file, rotating first if it would push the
    /// file past `max_bytes`.
    ///
    /// A single write larger than `max_bytes` is not split: it starts a fresh
    /// file and lands there whole.
    pub fn write(&self, buf: &[u8]) -> Result<usize, SinkError> {
        let mut state = self.lock();
        if state.closed {
            return Err(SinkError::Closed);
        }
        let mut rotated = None;
        let res = self.write_locked(&mut state, buf, &mut rotated);
        drop(state);

        if let Some((failures, reopened)) = rotated {
            self.report(&failures, reopened);
        }
        res
    }

    fn write_locked(
        &self,
        state: &mut SinkState,
        buf: &[u8],
        rotated: &mut Option<(Vec<SinkError>, bool)>,
    ) -> Result<usize, SinkError> {
        // A previous rotation could not reopen the file.
        if !state.sink.is_open() {
            state.sink.reopen(false)?;
        }
        if self.policy.should_rotate(state.sink.current_size(), buf.len()) {
            let (failures, reopened) = self.policy.rotate(&mut state.sink);
            *rotated = Some((failures, reopened.is_ok()));
            reopened?;
        }
        state.sink.write(buf)
    }

    /// Force a rotation regardless of the current size.
    pub fn rotate(&self) -> Result<(), SinkError> {
        let mut state = self.lock();
        if state.closed {
            return Err(SinkError::Closed);
        }
        let (failures, reopened) = self.policy.rotate(&mut state.sink);
        drop(state);

        self.report(&failures, reopened.is_ok());
        reopened
    }

    pub fn flush(&self) -> Result<(), SinkError> {
        let mut state = self.lock();
        if state.closed {
            return Err(SinkError::Closed);
        }
        state.sink.flush()
    }

    /// Flush and release the file. Later writes fail with
    /// [`SinkError::Closed`]; closing again is a no-op.
    pub fn close(&self) -> Result<(), SinkError> {
        let mut state = self.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        state.sink.close()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Size of the active file in bytes as tracked by the sink.
    pub fn current_size(&self) -> u64 {
        self.lock().sink.current_size()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    pub fn max_bytes(&self) -> u64 {
        self.policy.max_bytes
    }

    pub fn backup_count(&self) -> usize {
        self.policy.backup_count
    }

    /// The numbered backups currently on disk, most recent first.
    pub fn backups(&self) -> Result<Vec<PathBuf>, SinkError> {
        Ok(list_backups(&self.path)?.into_iter().map(|(_, path)| path).collect())
    }

    fn report(&self, failures: &[SinkError], reopened: bool) {
        for err in failures {
            tracing::warn!(path = %self.path.display(), error = %err, "log rotation step failed");
        }
        if reopened {
            tracing::debug!(path = %self.path.display(), failed_steps = failures.len(), "rotated log file");
        }
    }
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        LogSink::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        LogSink::flush(self).map_err(io::Error::from)
    }
}

impl io::Write for &LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        LogSink::write(*self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        LogSink::flush(*self).map_err(io::Error::from)
    }
}
