//! ---
//! tp_section: "03-observability"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Structured logging context and macros."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
#![warn(missing_docs)]

pub mod macros;

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Correlation id of the translated signal.
    pub correlation_id: Option<&'a str>,
    /// Entity the signal addresses.
    pub entity_id: Option<&'a str>,
    /// Topic string of the adaptable.
    pub topic: Option<&'a str>,
    /// Signal kind.
    pub signal: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a correlation id.
    pub fn with_correlation_id(mut self, correlation_id: &'a str) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Attach an entity id.
    pub fn with_entity_id(mut self, entity_id: &'a str) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    /// Attach a topic.
    pub fn with_topic(mut self, topic: &'a str) -> Self {
        self.topic = Some(topic);
        self
    }

    /// Attach a signal kind.
    pub fn with_signal(mut self, signal: &'a str) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// Direction of a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationDirection {
    /// Signal to adaptable.
    ToAdaptable,
    /// Adaptable to signal.
    FromAdaptable,
}

impl TranslationDirection {
    fn as_str(&self) -> &'static str {
        match self {
            TranslationDirection::ToAdaptable => "to_adaptable",
            TranslationDirection::FromAdaptable => "from_adaptable",
        }
    }
}

/// Emit the standard record for a finished translation. Failures are logged
/// at debug level; the caller still returns the error.
pub fn log_translation(
    context: Option<&LogContext>,
    direction: TranslationDirection,
    failure: Option<&dyn std::fmt::Display>,
) {
    let ctx = context.cloned().unwrap_or_default();
    match failure {
        None => tracing::debug!(
            direction = direction.as_str(),
            outcome = "success",
            correlation_id = ctx.correlation_id.unwrap_or(""),
            entity_id = ctx.entity_id.unwrap_or(""),
            topic = ctx.topic.unwrap_or(""),
            signal = ctx.signal.unwrap_or(""),
            "translation complete"
        ),
        Some(error) => tracing::debug!(
            direction = direction.as_str(),
            outcome = "failed",
            correlation_id = ctx.correlation_id.unwrap_or(""),
            entity_id = ctx.entity_id.unwrap_or(""),
            topic = ctx.topic.unwrap_or(""),
            signal = ctx.signal.unwrap_or(""),
            error = %error,
            "translation failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::{prelude::*, EnvFilter, Registry};

    fn init() {
        let _ = Registry::default()
            .with(EnvFilter::new("debug"))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    }

    #[test]
    fn macros_emit_without_panic() {
        init();
        let ctx = LogContext::new()
            .with_correlation_id("c-1")
            .with_topic("org.acme/lamp/things/twin/commands/modify");
        tp_info!(context = ctx.clone(), "adapter registry ready");
        tp_debug!("debug message");
        tp_error!(context = ctx, "error code: {}", 42);
    }

    #[test]
    fn translation_helper_emits() {
        init();
        let ctx = LogContext::new().with_signal("modify");
        log_translation(Some(&ctx), TranslationDirection::ToAdaptable, None);
        let failure = "unknown path";
        log_translation(None, TranslationDirection::FromAdaptable, Some(&failure));
    }
}
