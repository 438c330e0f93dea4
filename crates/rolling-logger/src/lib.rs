//! Rolling Logger
//!
//! Size-rotated log file with an in-memory ring of recent lines,
//! installed as the global `tracing` subscriber. `log` records are
//! bridged into the same subscriber.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static LOGGER: OnceLock<RollingFile> = OnceLock::new();

/// Errors raised while setting up or using the logger
#[derive(Debug)]
pub enum LoggerError {
    Io(io::Error),
    AlreadyInitialized,
    NotInitialized,
}

impl std::fmt::Display for LoggerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggerError::Io(e) => write!(f, "Log file error: {}", e),
            LoggerError::AlreadyInitialized => write!(f, "Logger already initialized"),
            LoggerError::NotInitialized => write!(f, "Logger not initialized"),
        }
    }
}

impl std::error::Error for LoggerError {}

impl From<io::Error> for LoggerError {
    fn from(e: io::Error) -> Self {
        LoggerError::Io(e)
    }
}

/// Rotation and filtering options
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    /// Rotate once the active file would grow past this size
    pub max_file_bytes: u64,
    /// Number of rotated files kept next to the active one
    pub max_files: usize,
    /// Lines kept in memory for `recent_lines`
    pub ring_capacity: usize,
    /// Filter used when `RUST_LOG` is not set
    pub default_level: String,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            max_file_bytes: 5 * 1024 * 1024,
            max_files: 3,
            ring_capacity: 200,
            default_level: "info".to_string(),
        }
    }
}

struct RollingState {
    dir: PathBuf,
    app_name: String,
    options: LoggerOptions,
    file: Option<File>,
    written: u64,
    ring: VecDeque<String>,
    partial: String,
}

impl RollingState {
    fn current_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.app_name))
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.app_name, index))
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        if self.options.max_files == 0 {
            fs::remove_file(self.current_path())?;
        } else {
            let oldest = self.rotated_path(self.options.max_files);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..self.options.max_files).rev() {
                let from = self.rotated_path(index);
                if from.exists() {
                    fs::rename(&from, self.rotated_path(index + 1))?;
                }
            }
            fs::rename(self.current_path(), self.rotated_path(1))?;
        }

        self.file = Some(
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(self.current_path())?,
        );
        self.written = 0;
        Ok(())
    }

    fn remember(&mut self, buf: &[u8]) {
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            if self.options.ring_capacity == 0 {
                continue;
            }
            if self.ring.len() == self.options.ring_capacity {
                self.ring.pop_front();
            }
            self.ring.push_back(line.trim_end_matches(['\n', '\r']).to_string());
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let incoming = buf.len() as u64;
        if self.written > 0 && self.written + incoming > self.options.max_file_bytes {
            self.rotate()?;
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        self.written += incoming;
        self.remember(buf);
        Ok(())
    }
}

/// Shared handle to the rolling log file
#[derive(Clone)]
pub struct RollingFile {
    state: Arc<Mutex<RollingState>>,
}

impl RollingFile {
    /// Open (or append to) `<dir>/<app_name>.log`
    pub fn open(dir: impl AsRef<Path>, app_name: &str, options: LoggerOptions) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.log", app_name));
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let header = format!(
            "=== {} started {} ===\n",
            app_name,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
        );
        file.write_all(header.as_bytes())?;
        let written = file.metadata()?.len();

        Ok(Self {
            state: Arc::new(Mutex::new(RollingState {
                dir,
                app_name: app_name.to_string(),
                options,
                file: Some(file),
                written,
                ring: VecDeque::new(),
                partial: String::new(),
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, RollingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Most recent complete lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        self.lock().ring.iter().cloned().collect()
    }

    /// Path of the active log file
    pub fn path(&self) -> PathBuf {
        self.lock().current_path()
    }
}

/// Writer handed out to `tracing-subscriber` for each event
pub struct RollingWriter {
    state: Arc<Mutex<RollingState>>,
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RollingFile {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RollingWriter {
            state: self.state.clone(),
        }
    }
}

/// Install the global subscriber: stderr plus the rolling file
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str, options: LoggerOptions) -> Result<(), LoggerError> {
    if LOGGER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_level));
    let file = RollingFile::open(log_dir, app_name, options)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file.clone()))
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    LOGGER.set(file).map_err(|_| LoggerError::AlreadyInitialized)
}

/// Last lines written through the global logger
pub fn recent_lines() -> Vec<String> {
    LOGGER.get().map(RollingFile::recent_lines).unwrap_or_default()
}

pub fn info(msg: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    log::info!(target: "rolling_logger", "{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    log::error!(target: "rolling_logger", "{}", msg);
    Ok(())
}
