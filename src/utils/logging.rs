//! Log sink shared by the console and the log file, plus conditional logging
//! macros that check a module-level `ENABLE_LOGS` flag.
//!
//! Usage:
//! ```rust,ignore
//! // In your module, define the flag first:
//! const ENABLE_LOGS: bool = true;
//!
//! // Then use the macros (they're exported at the crate root):
//! use crate::{log_info, log_warn, log_error};
//!
//! log_info!("This will log if ENABLE_LOGS is true");
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use env_logger::{Target, WriteStyle};
use log::{Level, LevelFilter, SetLoggerError};

use crate::settings::OutputFormat;

/// Macro for conditional info logging.
/// Checks the `ENABLE_LOGS` const in the calling module.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Macro for conditional warn logging.
/// Checks the `ENABLE_LOGS` const in the calling module.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Macro for conditional error logging.
/// Checks the `ENABLE_LOGS` const in the calling module.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

type FileSlot = Arc<Mutex<Option<File>>>;

fn lock(slot: &FileSlot) -> MutexGuard<'_, Option<File>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Render one log line (without the trailing newline).
pub fn format_line(
    format: OutputFormat,
    timestamp: DateTime<Local>,
    level: Level,
    message: &str,
) -> String {
    match format {
        OutputFormat::Console => format!(
            "{} - {} - {}",
            timestamp.format(TIMESTAMP_FORMAT),
            level_name(level),
            message
        ),
        OutputFormat::Json => serde_json::json!({
            "timestamp": timestamp.to_rfc3339(),
            "level": level_name(level),
            "message": message,
        })
        .to_string(),
    }
}

/// Handle to the process log destinations. The console is always written;
/// the file only while a [`FileSinkGuard`] is alive.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    file: FileSlot,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path` for appending and start copying every log line into it.
    pub fn attach_file(&self, path: impl AsRef<Path>) -> io::Result<FileSinkGuard> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        *lock(&self.file) = Some(file);
        Ok(FileSinkGuard {
            file: Arc::clone(&self.file),
            path,
        })
    }

    pub fn is_file_attached(&self) -> bool {
        lock(&self.file).is_some()
    }

    pub fn writer(&self) -> TeeWriter {
        TeeWriter {
            file: Arc::clone(&self.file),
        }
    }
}

/// Keeps the log file attached. Dropping it flushes and detaches the file.
#[derive(Debug)]
pub struct FileSinkGuard {
    file: FileSlot,
    path: PathBuf,
}

impl FileSinkGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn detach(self) {}
}

impl Drop for FileSinkGuard {
    fn drop(&mut self) {
        if let Some(mut file) = lock(&self.file).take() {
            let _ = file.flush();
        }
    }
}

/// Writes each buffer to stderr and, when attached, the log file.
#[derive(Debug)]
pub struct TeeWriter {
    file: FileSlot,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = lock(&self.file).as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = lock(&self.file).as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Install the process logger. Level defaults to info and can be changed
/// with `RUST_LOG`.
pub fn init(format: OutputFormat) -> Result<LogSink, SetLoggerError> {
    let sink = LogSink::new();

    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .format(move |buf, record| {
            let message = record.args().to_string();
            writeln!(buf, "{}", format_line(format, Local::now(), record.level(), &message))
        })
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(sink.writer())))
        .try_init()?;

    Ok(sink)
}
