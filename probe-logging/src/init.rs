use crate::error::LoggingError;
use probe_config::{FileLogConfig, LogFormat, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the background file writer alive; drop it at the end of `main` to
/// flush buffered lines
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug, Default)]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Filter from, in order of precedence: the explicit override, the
/// configured level, `RUST_LOG`, then `info`
pub fn build_filter(config: &LoggingConfig, level_override: Option<&str>) -> Result<EnvFilter, LoggingError> {
    if let Some(directive) = level_override {
        return EnvFilter::try_new(directive).map_err(|e| LoggingError::InvalidFilter {
            filter: directive.to_string(),
            message: e.to_string(),
        });
    }

    let filter = match config.level {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    Ok(filter)
}

/// Install the global subscriber.
///
/// Returns a guard that must outlive all logging. A second call leaves the
/// existing subscriber in place.
pub fn init_logging(config: &LoggingConfig, level_override: Option<&str>) -> Result<LoggingGuard, LoggingError> {
    let filter = build_filter(config, level_override)?;

    let mut layers: Vec<BoxedLayer> = vec![console_layer(config)];
    let mut guard = LoggingGuard::default();

    if let Some(file) = &config.file {
        let (layer, worker) = file_layer(file, config.include_location)?;
        layers.push(layer);
        guard._file = Some(worker);
    }

    // Use try_init to avoid panic if global subscriber already set
    if tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(guard)
}

fn console_layer(config: &LoggingConfig) -> BoxedLayer {
    let location = config.include_location;
    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(location)
        .with_line_number(location);

    match config.format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Compact => base.compact().with_target(false).boxed(),
        LogFormat::Text => base.boxed(),
    }
}

fn file_layer(file: &FileLogConfig, location: bool) -> Result<(BoxedLayer, WorkerGuard), LoggingError> {
    let appender = rolling_appender(file)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_file(location)
        .with_line_number(location)
        .boxed();

    Ok((layer, guard))
}

fn rolling_appender(file: &FileLogConfig) -> Result<RollingFileAppender, LoggingError> {
    std::fs::create_dir_all(&file.directory).map_err(|source| LoggingError::Directory {
        path: file.directory.clone(),
        source,
    })?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&file.prefix)
        .build(&file.directory)
        .map_err(|e| LoggingError::File {
            path: file.directory.clone(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_config::LogLevel;
    use tempfile::TempDir;

    #[test]
    fn test_override_wins() {
        let config = LoggingConfig {
            level: Some(LogLevel::Warn),
            ..LoggingConfig::default()
        };
        let filter = build_filter(&config, Some("debug")).unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_config_level_used() {
        let config = LoggingConfig {
            level: Some(LogLevel::Trace),
            ..LoggingConfig::default()
        };
        assert_eq!(build_filter(&config, None).unwrap().to_string(), "trace");
    }

    #[test]
    fn test_rust_log_applies_without_configured_level() {
        temp_env::with_var("RUST_LOG", Some("debug"), || {
            let filter = build_filter(&LoggingConfig::default(), None).unwrap();
            assert_eq!(filter.to_string(), "debug");
        });
    }

    #[test]
    fn test_configured_level_beats_rust_log() {
        let config = LoggingConfig {
            level: Some(LogLevel::Error),
            ..LoggingConfig::default()
        };
        temp_env::with_var("RUST_LOG", Some("debug"), || {
            assert_eq!(build_filter(&config, None).unwrap().to_string(), "error");
        });
    }

    #[test]
    fn test_falls_back_to_info() {
        temp_env::with_var_unset("RUST_LOG", || {
            let filter = build_filter(&LoggingConfig::default(), None).unwrap();
            assert_eq!(filter.to_string(), "info");
        });
    }

    #[test]
    fn test_invalid_override_rejected() {
        let result = build_filter(&LoggingConfig::default(), Some("probe_http=notalevel"));
        assert!(matches!(result, Err(LoggingError::InvalidFilter { .. })));
    }

    #[test]
    fn test_rolling_appender_creates_directory() {
        let temp = TempDir::new().unwrap();
        let file = FileLogConfig {
            directory: temp.path().join("logs"),
            prefix: "probe.log".to_string(),
        };
        assert!(rolling_appender(&file).is_ok());
        assert!(file.directory.is_dir());
    }

    #[test]
    fn test_rolling_appender_on_a_file_fails() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("occupied");
        std::fs::write(&blocker, "x").unwrap();
        let file = FileLogConfig {
            directory: blocker,
            prefix: "probe.log".to_string(),
        };
        assert!(rolling_appender(&file).is_err());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LoggingConfig::default();
        let _first = init_logging(&config, Some("warn")).unwrap();
        let _second = init_logging(&config, Some("warn")).unwrap();
        tracing::warn!("still logging");
    }
}
