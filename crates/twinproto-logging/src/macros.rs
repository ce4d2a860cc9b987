//! ---
//! tp_section: "03-observability"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Structured logging context and macros."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
/// Emit an event at `$level` carrying the fields of a [`LogContext`](crate::LogContext).
#[doc(hidden)]
#[macro_export]
macro_rules! __tp_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            $level,
            correlation_id = ctx.correlation_id.unwrap_or(""),
            entity_id = ctx.entity_id.unwrap_or(""),
            topic = ctx.topic.unwrap_or(""),
            signal = ctx.signal.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with translation context.
#[macro_export]
macro_rules! tp_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__tp_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__tp_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with translation context.
#[macro_export]
macro_rules! tp_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__tp_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__tp_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with translation context.
#[macro_export]
macro_rules! tp_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__tp_event!(tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__tp_event!(tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
