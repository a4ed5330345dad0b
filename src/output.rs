use {
    crate::{config::LogConfig, error::SinkError, rotation::LogSink},
    std::io::{self, Write as _},
};

/// The writer handed to a formatter: formatted lines go to the rotating file
/// (when one is configured) and are mirrored to stdout.
///
/// `&LogOutput` implements [`io::Write`], so `Arc<LogOutput>` can be passed
/// straight to `tracing_subscriber::fmt().with_writer(..)`.
#[derive(Debug)]
pub struct LogOutput {
    console: bool,
    file: Option<LogSink>,
    fallback: Option<SinkError>,
}

impl LogOutput {
    /// Console-only output.
    pub fn console() -> Self {
        LogOutput {
            console: true,
            file: None,
            fallback: None,
        }
    }

    /// File output, optionally mirrored to stdout.
    pub fn file(sink: LogSink, console: bool) -> Self {
        LogOutput {
            console,
            file: Some(sink),
            fallback: None,
        }
    }

    /// Build the output described by `config`.
    ///
    /// This never fails: if the file sink cannot be opened, the output falls
    /// back to the console and keeps the error for [`Self::fallback_error`].
    pub fn from_config(config: &LogConfig) -> Self {
        match config.build_sink() {
            Ok(Some(sink)) => {
                tracing::info!(
                    path = %sink.path().display(),
                    max_mib = sink.max_bytes() as f64 / (1024.0 * 1024.0),
                    backups = sink.backup_count(),
                    "file logging enabled"
                );
                Self::file(sink, config.console)
            }
            Ok(None) => Self::console(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to set up file logging, falling back to console");
                LogOutput {
                    fallback: Some(err),
                    ..Self::console()
                }
            }
        }
    }

    pub fn sink(&self) -> Option<&LogSink> {
        self.file.as_ref()
    }

    pub fn is_console_only(&self) -> bool {
        self.file.is_none()
    }

    /// The error that forced a console-only fallback, if any.
    pub fn fallback_error(&self) -> Option<&SinkError> {
        self.fallback.as_ref()
    }

    /// Write one formatted line.
    ///
    /// The console receives exactly the bytes the file accepted, so a partial
    /// write retried by the caller is never echoed twice. When the file write
    /// fails the whole line still reaches the console before the error is
    /// returned.
    pub fn write(&self, buf: &[u8]) -> Result<usize, SinkError> {
        self.write_to(&mut io::stdout().lock(), buf)
    }

    fn write_to<W: io::Write>(&self, console: &mut W, buf: &[u8]) -> Result<usize, SinkError> {
        let res = match &self.file {
            Some(sink) => sink.write(buf),
            None => Ok(buf.len()),
        };
        if self.console {
            let echoed = match &res {
                Ok(written) => &buf[..*written],
                Err(_) => buf,
            };
            console.write_all(echoed)?;
        }
        res
    }

    pub fn flush(&self) -> Result<(), SinkError> {
        if let Some(sink) = &self.file {
            sink.flush()?;
        }
        if self.console {
            io::stdout().lock().flush()?;
        }
        Ok(())
    }

    /// Close the file sink, if any. Console output keeps working.
    pub fn close(&self) -> Result<(), SinkError> {
        match &self.file {
            Some(sink) => sink.close(),
            None => Ok(()),
        }
    }
}

impl io::Write for &LogOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        LogOutput::write(*self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        LogOutput::flush(*self).map_err(io::Error::from)
    }
}

impl io::Write for LogOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        LogOutput::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        LogOutput::flush(self).map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::fs, tempfile::TempDir};

    #[test]
    fn no_path_is_console_only() {
        let output = LogOutput::from_config(&LogConfig::default());
        assert!(output.is_console_only());
        assert!(output.fallback_error().is_none());
    }

    #[test]
    fn file_output_writes_to_sink() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let config = LogConfig {
            console: false,
            ..LogConfig::with_file(&path)
        };

        let output = LogOutput::from_config(&config);
        output.write(b"line\n").unwrap();
        output.flush().unwrap();

        assert!(!output.is_console_only());
        assert_eq!(fs::read(&path).unwrap(), b"line\n");
    }

    #[test]
    fn invalid_config_falls_back_to_console() {
        let dir = TempDir::new().unwrap();
        let config = LogConfig {
            backup_count: Some(-3),
            ..LogConfig::with_file(dir.path().join("app.log"))
        };

        let output = LogOutput::from_config(&config);

        assert!(output.is_console_only());
        assert!(output.fallback_error().unwrap().is_configuration());
        assert_eq!(output.write(b"still logging\n").unwrap(), 14);
    }

    #[test]
    fn unwritable_directory_falls_back_to_console() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();

        let output = LogOutput::from_config(&LogConfig::with_file(blocker.join("app.log")));

        assert!(output.is_console_only());
        assert!(matches!(
            output.fallback_error(),
            Some(SinkError::CreateDirectoryFailed { .. })
        ));
    }

    #[test]
    fn close_rejects_later_file_writes() {
        let dir = TempDir::new().unwrap();
        let sink = LogSink::open(dir.path().join("app.log"), 0, 1).unwrap();
        let output = LogOutput::file(sink, false);

        output.close().unwrap();

        assert!(matches!(output.write(b"x"), Err(SinkError::Closed)));
    }

    #[test]
    fn console_keeps_lines_the_file_rejects() {
        let dir = TempDir::new().unwrap();
        let sink = LogSink::open(dir.path().join("app.log"), 0, 1).unwrap();
        let output = LogOutput::file(sink, true);
        let mut console = Vec::new();

        output.write_to(&mut console, b"before close\n").unwrap();
        output.sink().unwrap().close().unwrap();
        let res = output.write_to(&mut console, b"after close\n");

        assert!(matches!(res, Err(SinkError::Closed)));
        assert_eq!(console, b"before close\nafter close\n");
        assert_eq!(fs::read(dir.path().join("app.log")).unwrap(), b"before close\n");
    }
}
