//! ---
//! tp_section: "01-core-functionality"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Shared configuration and tracing setup."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::daily;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

const LOG_ENV: &str = "TWINPROTO_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

static GUARDS: OnceCell<(WorkerGuard, WorkerGuard)> = OnceCell::new();

/// Console log formats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    #[default]
    StructuredJson,
    Pretty,
}

/// Install the global subscriber.
///
/// The filter comes from `TWINPROTO_LOG`, then `RUST_LOG`, then `info`.
/// Console records go to stderr so command output on stdout stays parseable;
/// a daily rolling JSON file `<prefix>.log` is written to the configured
/// directory. Calling this again after a subscriber is installed is a no-op.
pub fn init_tracing(service_name: &str, config: &LoggingConfig) -> Result<()> {
    std::fs::create_dir_all(&config.directory).with_context(|| {
        format!("unable to create log directory {}", config.directory.display())
    })?;
    let prefix = config.file_prefix.as_deref().unwrap_or(service_name);

    let (file_writer, file_guard) =
        tracing_appender::non_blocking(daily(&config.directory, format!("{prefix}.log")));
    let (console_writer, console_guard) = tracing_appender::non_blocking(std::io::stderr());
    let _ = GUARDS.set((file_guard, console_guard));

    let installed = tracing_subscriber::registry()
        .with(env_filter(std::env::var(LOG_ENV).ok().as_deref()))
        .with(console_layer(config.format, console_writer))
        .with(file_layer(file_writer))
        .try_init()
        .is_ok();

    if installed {
        debug!(
            service = %service_name,
            log_dir = %config.directory.display(),
            format = ?config.format,
            "tracing initialised"
        );
    }
    Ok(())
}

fn env_filter(directive: Option<&str>) -> EnvFilter {
    match directive {
        Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|err| {
            eprintln!("invalid {LOG_ENV} directive ({err}); using {DEFAULT_DIRECTIVE}");
            EnvFilter::new(DEFAULT_DIRECTIVE)
        }),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}

fn console_layer<S>(format: LogFormat, writer: NonBlocking) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let layer = fmt::layer()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(writer);
    match format {
        LogFormat::StructuredJson => layer.with_target(false).json().boxed(),
        LogFormat::Pretty => layer.with_target(true).boxed(),
    }
}

fn file_layer<S>(writer: NonBlocking) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fmt::layer()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .json()
        .with_writer(writer)
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialises_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            directory: dir.path().join("logs"),
            format: LogFormat::Pretty,
            file_prefix: Some("test".to_owned()),
        };
        init_tracing("twinproto-test", &config).unwrap();
        assert!(config.directory.is_dir());
        init_tracing("twinproto-test", &config).unwrap();
    }

    #[test]
    fn explicit_directive_wins() {
        let filter = env_filter(Some("warn,twinproto_adapter=trace")).to_string();
        assert!(filter.contains("twinproto_adapter=trace"), "{filter}");
    }

    #[test]
    fn log_format_names() {
        let format: LogFormat = serde_json::from_str("\"structured-json\"").unwrap();
        assert_eq!(format, LogFormat::StructuredJson);
    }
}
