//! ---
//! tp_section: "01-core-functionality"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Shared configuration and tracing setup."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Shared primitives for the twinproto workspace: configuration loading and
//! tracing initialisation consumed by the adapter stack and the CLI.

pub mod config;
pub mod logging;

pub use config::{
    AdapterConfig, ErrorsConfig, HeaderVisibility, HeadersConfig, LoadedAdapterConfig,
    LoggingConfig, ProtocolConfig,
};
pub use logging::{init_tracing, LogFormat};
