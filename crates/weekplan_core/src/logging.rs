//! Rolling file logs for the planner.
//!
//! # Invariants
//! - One logger per process. Asking again with the same [`LogSettings`] is a
//!   no-op, asking with different ones is a [`LoggingError::Conflict`].
//! - Events are `key=value` lines carrying ids, weeks and counts. Task text,
//!   goals and habit names stay out of the log.
//! - Panics are logged as one sanitized line before the previous hook runs.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

const LOG_BASENAME: &str = "weekplan";
const ROTATE_AT_BYTES: u64 = 5 * 1024 * 1024;
const KEEP_ROTATED: usize = 3;
const PANIC_PAYLOAD_LIMIT: usize = 160;

static RUNNING: OnceCell<RunningLogger> = OnceCell::new();
static PANIC_HOOK_SET: OnceCell<()> = OnceCell::new();

/// Validated level and directory of the file logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: &'static str,
    pub dir: PathBuf,
}

impl LogSettings {
    /// Accepts `trace|debug|info|warn|warning|error` in any case and an
    /// absolute, non-blank directory.
    pub fn parse(level: &str, dir: &str) -> Result<Self, LoggingError> {
        let level = match level.trim().to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" | "warning" => "warn",
            "error" => "error",
            other => return Err(LoggingError::UnsupportedLevel(other.to_string())),
        };

        let dir = dir.trim();
        if dir.is_empty() {
            return Err(LoggingError::EmptyDirectory);
        }
        if !Path::new(dir).is_absolute() {
            return Err(LoggingError::RelativeDirectory(dir.to_string()));
        }
        Ok(Self {
            level,
            dir: PathBuf::from(dir),
        })
    }
}

impl Display for LogSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.level, self.dir.display())
    }
}

struct RunningLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnsupportedLevel(String),
    EmptyDirectory,
    RelativeDirectory(String),
    CreateDirectory { path: PathBuf, message: String },
    Backend(String),
    Conflict { active: String, requested: String },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unknown log level `{level}` (use trace, debug, info, warn or error)"
            ),
            Self::EmptyDirectory => write!(f, "log directory is blank"),
            Self::RelativeDirectory(dir) => write!(f, "log directory `{dir}` is not absolute"),
            Self::CreateDirectory { path, message } => {
                write!(f, "cannot create log directory `{}`: {message}", path.display())
            }
            Self::Backend(message) => write!(f, "logger backend: {message}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logger already running as `{active}`, cannot restart as `{requested}`"
            ),
        }
    }
}

impl Error for LoggingError {}

/// Starts file logging; see [`LogSettings::parse`] for accepted input.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    let wanted = LogSettings::parse(level, log_dir)?;
    let running = RUNNING.get_or_try_init(|| start(wanted.clone()))?;
    if running.settings != wanted {
        return Err(LoggingError::Conflict {
            active: running.settings.to_string(),
            requested: wanted.to_string(),
        });
    }
    Ok(())
}

/// Settings of the running logger, `None` before [`init_logging`].
pub fn logging_status() -> Option<LogSettings> {
    RUNNING.get().map(|running| running.settings.clone())
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start(settings: LogSettings) -> Result<RunningLogger, LoggingError> {
    std::fs::create_dir_all(&settings.dir).map_err(|err| LoggingError::CreateDirectory {
        path: settings.dir.clone(),
        message: err.to_string(),
    })?;

    let backend = |err: flexi_logger::FlexiLoggerError| LoggingError::Backend(err.to_string());
    let handle = Logger::try_with_str(settings.level)
        .map_err(backend)?
        .log_to_file(FileSpec::default().directory(&settings.dir).basename(LOG_BASENAME))
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(backend)?;

    if PANIC_HOOK_SET.set(()).is_ok() {
        install_panic_hook();
    }

    info!(
        "event=logging_init module=core status=ok level={} os={} debug_build={} version={}",
        settings.level,
        std::env::consts::OS,
        cfg!(debug_assertions),
        env!("CARGO_PKG_VERSION")
    );

    Ok(RunningLogger {
        settings,
        _handle: handle,
    })
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let location = panic
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic module=core status=error location={location} payload={}",
            panic_payload(panic)
        );
        previous(panic);
    }));
}

fn panic_payload(panic: &PanicHookInfo<'_>) -> String {
    let payload = panic.payload();
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string payload>");
    single_line(text, PANIC_PAYLOAD_LIMIT)
}

/// Joins lines and cuts to `limit` characters, marking the cut with `...`.
fn single_line(value: &str, limit: usize) -> String {
    let mut line: String = value
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .take(limit)
        .collect();
    if value.chars().count() > limit {
        line.push_str("...");
    }
    line
}
