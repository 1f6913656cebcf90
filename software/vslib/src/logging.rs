//! Terminal and file logging for applications driving the calcs.
//!
//! The numerical core never logs; only the calc wrappers emit events.

use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

type FileLayer = fmt::Layer<
    Registry,
    fmt::format::DefaultFields,
    fmt::format::Format<fmt::format::Full, fmt::time::ChronoUtc>,
    NonBlocking,
>;

static WRITERS: OnceLock<LogWriters> = OnceLock::new();

/// Worker handles of the nonblocking writers, flushed when dropped.
struct LogWriters {
    _stdout: Mutex<WorkerGuard>,
    file: Mutex<WorkerGuard>,
    file_reload: reload::Handle<FileLayer, Registry>,
}

impl LogWriters {
    /// Swap the file layer for one writing to `logfile`.
    fn redirect(&self, logfile: File) -> Result<(), String> {
        let (file_writer, file_guard) = tracing_appender::non_blocking(logfile);

        let mut guard = self
            .file
            .lock()
            .map_err(|_| "Log file writer lock poisoned".to_string())?;
        self.file_reload
            .modify(|layer| *layer = file_layer(file_writer))
            .map_err(|e| format!("Failed to redirect log file: {e}"))?;

        // Dropping the old guard flushes the previous file
        *guard = file_guard;
        Ok(())
    }
}

fn file_layer(writer: NonBlocking) -> FileLayer {
    fmt::layer::<Registry>()
        .with_timer(fmt::time::ChronoUtc::rfc_3339())
        .with_writer(writer)
        .with_ansi(false)
}

fn open_log_file(op_dir: &Path, op_name: &str) -> Result<(PathBuf, File), String> {
    let log_dir = op_dir.join("logs");
    fs::create_dir_all(&log_dir).map_err(|e| format!("Failed to create log directory: {e}"))?;

    let log_path = log_dir.join(format!("{op_name}.log"));
    let logfile = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| format!("Failed to open log file {}: {e}", log_path.display()))?;

    Ok((log_path, logfile))
}

/// Log to the terminal and to `<op_dir>/logs/<op_name>.log`.
///
/// The level filter comes from `RUST_LOG` and defaults to `info`.
/// Later calls keep the terminal logger and move file logging to the new
/// path. Returns the path of the log file.
pub fn init_logging(op_dir: &Path, op_name: &str) -> Result<PathBuf, String> {
    let (log_path, logfile) = open_log_file(op_dir, op_name)?;

    if let Some(writers) = WRITERS.get() {
        writers.redirect(logfile)?;
        return Ok(log_path);
    }

    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let (file_writer, file_guard) = tracing_appender::non_blocking(logfile);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| format!("Failed to set up log level filter: {e}"))?;

    let stdout_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::rfc_3339())
        .with_writer(stdout_writer)
        .with_target(false);
    let (reloadable_file_layer, file_reload) =
        reload::Layer::<FileLayer, Registry>::new(file_layer(file_writer));

    tracing_subscriber::registry()
        .with(reloadable_file_layer)
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {e}"))?;

    WRITERS.get_or_init(|| LogWriters {
        _stdout: Mutex::new(stdout_guard),
        file: Mutex::new(file_guard),
        file_reload,
    });

    Ok(log_path)
}
