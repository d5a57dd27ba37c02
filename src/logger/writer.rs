//! Log writer module
//!
//! Provides thread-safe log writing to the console and an append-only log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Console stream a line is echoed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Thread-safe log writer
pub struct LogWriter {
    /// When false every write is dropped
    enabled: bool,
    /// Log file, if one could be opened
    file: Option<Mutex<File>>,
}

impl LogWriter {
    /// Create a new log writer appending to `log_file`
    fn new(enabled: bool, log_file: Option<&str>) -> io::Result<Self> {
        let file = match (enabled, log_file) {
            (true, Some(path)) => Some(Mutex::new(open_log_file(path)?)),
            _ => None,
        };
        Ok(Self { enabled, file })
    }

    /// Write a line to the console stream and the log file
    pub fn write(&self, stream: Stream, line: &str) {
        if !self.enabled {
            return;
        }
        write_console(stream, line);
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(f, "{line}");
            }
        }
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

pub fn write_console(stream: Stream, line: &str) {
    match stream {
        Stream::Stdout => println!("{line}"),
        Stream::Stderr => eprintln!("{line}"),
    }
}

/// Initialize the global log writer
///
/// This should be called once at application startup.
/// Returns error if the log file cannot be opened.
pub fn init(enabled: bool, log_file: Option<&str>) -> io::Result<()> {
    let writer = LogWriter::new(enabled, log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if initialized
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_appends_to_file() {
        let dir = std::env::temp_dir().join(format!("zing-writer-{}", std::process::id()));
        let path = dir.join("nested").join("server.log");
        let path_str = path.to_str().unwrap();

        let writer = LogWriter::new(true, Some(path_str)).unwrap();
        writer.write(Stream::Stdout, "first");
        writer.write(Stream::Stderr, "second");

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_disabled_writer_creates_nothing() {
        let dir = std::env::temp_dir().join(format!("zing-writer-off-{}", std::process::id()));
        let path = dir.join("server.log");

        let writer = LogWriter::new(false, path.to_str()).unwrap();
        writer.write(Stream::Stdout, "ignored");

        assert!(!writer.is_enabled());
        assert!(!path.exists());
    }
}
