//! Session logging
//!
//! Every event goes to a time-stamped log file in the log directory. Stderr
//! only gets what `RUST_LOG` asks for (warnings by default), since the
//! console already echoes operator-facing output on stdout.

use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// Target for lines already shown to the operator on stdout
///
/// Events with this target go to the session log but not to stderr, so an
/// echoed error is not printed twice.
pub const ECHO_TARGET: &str = "echo";

/// Default stderr filter when `RUST_LOG` is not set
const DEFAULT_STDERR_FILTER: &str = "warn,echo=off";

fn stderr_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDERR_FILTER))
}

/// Session log file name for a given start time
pub fn log_file_name(now: chrono::DateTime<Local>) -> String {
    now.format("ITO_console_%Y%m%d%H%M%S.log").to_string()
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the whole process.
pub fn init(log_dir: &Path) -> Result<(WorkerGuard, PathBuf)> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;

    let file_name = log_file_name(Local::now());
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(&file_name)
        .build(log_dir)
        .with_context(|| format!("cannot open log file in {}", log_dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(LevelFilter::DEBUG),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(stderr_filter()),
        )
        .try_init()
        .context("logging already initialised")?;

    Ok((guard, log_dir.join(file_name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::{error, info, warn};
    use tracing_subscriber::prelude::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("capture poisoned").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_stderr_filter_drops_echo() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(move || writer.clone())
                .with_ansi(false)
                .with_filter(EnvFilter::new(DEFAULT_STDERR_FILTER)),
        );

        tracing::subscriber::with_default(subscriber, || {
            error!(target: ECHO_TARGET, "Instrument error busy");
            info!("connected");
            warn!("state machine out of step");
        });

        let output = String::from_utf8(captured.0.lock().expect("capture poisoned").clone())
            .expect("utf8 output");
        assert!(!output.contains("Instrument error busy"));
        assert!(!output.contains("connected"));
        assert!(output.contains("state machine out of step"));
    }

    #[test]
    fn test_log_file_name() {
        let now = Local
            .with_ymd_and_hms(2026, 10, 19, 8, 5, 3)
            .single()
            .expect("unambiguous time");
        assert_eq!(log_file_name(now), "ITO_console_20261019080503.log");
    }
}
