//! Rolling Logger
//!
//! Installs a global `tracing` subscriber that writes to a size-rotated file
//! and keeps the most recent lines in memory. Records emitted through the
//! `log` facade are bridged into the same subscriber.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

pub use tracing::level_filters::LevelFilter;

const DEFAULT_MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;
const DEFAULT_MAX_FILES: usize = 5;
const DEFAULT_BUFFER_LINES: usize = 500;

static RECENT: OnceLock<Arc<Mutex<LineBuffer>>> = OnceLock::new();

#[derive(Debug)]
pub enum LoggerError {
    Io(io::Error),
    AlreadyInitialized(String),
}

impl std::fmt::Display for LoggerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggerError::Io(e) => write!(f, "log file error: {}", e),
            LoggerError::AlreadyInitialized(msg) => write!(f, "logger already initialized: {}", msg),
        }
    }
}

impl std::error::Error for LoggerError {}

impl From<io::Error> for LoggerError {
    fn from(e: io::Error) -> Self {
        LoggerError::Io(e)
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub app_name: String,
    pub level: LevelFilter,
    /// Rotate once the active file would grow past this size
    pub max_file_bytes: u64,
    /// Active file plus rotated ones
    pub max_files: usize,
    /// Lines kept in memory for `recent_lines`
    pub buffer_lines: usize,
}

impl LoggerConfig {
    pub fn new(log_dir: PathBuf, app_name: &str) -> Self {
        Self {
            log_dir,
            app_name: app_name.to_string(),
            level: LevelFilter::INFO,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: DEFAULT_MAX_FILES,
            buffer_lines: DEFAULT_BUFFER_LINES,
        }
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }
}

/// Initialize with defaults: info level, 2 MiB files, 5 files kept.
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), LoggerError> {
    init_with(LoggerConfig::new(log_dir, app_name))
}

pub fn init_with(config: LoggerConfig) -> Result<(), LoggerError> {
    let buffer = Arc::new(Mutex::new(LineBuffer::new(config.buffer_lines)));
    let writer = RollingFile::open(&config.log_dir, &config.app_name, config.max_file_bytes, config.max_files)?
        .with_buffer(buffer.clone());

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(writer))
        .with_ansi(false)
        .with_max_level(config.level)
        .try_init()
        .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))?;

    let _ = RECENT.set(buffer);
    tracing::info!("{} logging to {}", config.app_name, config.log_dir.display());
    Ok(())
}

/// Most recent formatted lines, oldest first
pub fn recent_lines() -> Vec<String> {
    RECENT
        .get()
        .and_then(|b| b.lock().ok().map(|b| b.lines()))
        .unwrap_or_default()
}

/// Fixed-capacity ring of complete lines
#[derive(Debug)]
pub struct LineBuffer {
    capacity: usize,
    lines: VecDeque<String>,
    partial: String,
}

impl LineBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity),
            partial: String::new(),
        }
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        if self.capacity == 0 {
            return;
        }
        self.partial.push_str(&String::from_utf8_lossy(bytes));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            if self.lines.len() == self.capacity {
                self.lines.pop_front();
            }
            self.lines.push_back(line.trim_end().to_string());
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

/// Size-rotated log file: `<app>.log`, `<app>.1.log`, ... `<app>.{n-1}.log`
pub struct RollingFile {
    dir: PathBuf,
    app_name: String,
    max_bytes: u64,
    max_files: usize,
    file: File,
    written: u64,
    buffer: Option<Arc<Mutex<LineBuffer>>>,
}

impl RollingFile {
    pub fn open(dir: &Path, app_name: &str, max_bytes: u64, max_files: usize) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = file_path(dir, app_name, 0);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            max_bytes,
            max_files: max_files.max(1),
            file,
            written,
            buffer: None,
        })
    }

    pub fn with_buffer(mut self, buffer: Arc<Mutex<LineBuffer>>) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn active_path(&self) -> PathBuf {
        file_path(&self.dir, &self.app_name, 0)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let oldest = file_path(&self.dir, &self.app_name, self.max_files - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (0..self.max_files - 1).rev() {
            let from = file_path(&self.dir, &self.app_name, index);
            if from.exists() {
                fs::rename(&from, file_path(&self.dir, &self.app_name, index + 1))?;
            }
        }
        self.file = OpenOptions::new().create(true).append(true).open(self.active_path())?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        if let Some(buffer) = &self.buffer {
            if let Ok(mut b) = buffer.lock() {
                b.push_bytes(&buf[..n]);
            }
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn file_path(dir: &Path, app_name: &str, index: usize) -> PathBuf {
    if index == 0 {
        dir.join(format!("{}.log", app_name))
    } else {
        dir.join(format!("{}.{}.log", app_name, index))
    }
}

/// Timestamped line in the same layout the subscriber uses, for callers that
/// write outside of `tracing` (panic hooks, early startup).
pub fn stamp(msg: &str) -> String {
    format!("{} {}", chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"), msg)
}
