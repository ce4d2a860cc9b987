//! ---
//! tp_section: "01-core-functionality"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Shared configuration and tracing setup."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::logging::LogFormat;

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_true() -> bool {
    true
}

fn default_schema_version() -> u8 {
    2
}

fn default_error_codes() -> IndexMap<String, u16> {
    [
        ("things:thing.notfound", 404),
        ("things:attributes.notfound", 404),
        ("things:attribute.notfound", 404),
        ("things:features.notfound", 404),
        ("things:feature.notfound", 404),
        ("things:feature.property.notfound", 404),
        ("things:thing.notmodifiable", 403),
        ("things:thing.conflict", 409),
        ("things:thing.toomanymodifyingrequests", 429),
        ("things:thing.merge.invalid", 400),
        ("things:id.invalid", 400),
        ("things:policyId.notDeletable", 400),
        ("things:thingId.notDeletable", 400),
        ("things:thingId.notExplicitlySettable", 400),
        ("things:search.subscription.failed", 400),
        ("json.invalid", 400),
        ("json.fieldselector.invalid", 400),
        ("acknowledgements.failed", 424),
    ]
    .into_iter()
    .map(|(code, status)| (code.to_owned(), status))
    .collect()
}

/// Configuration of the protocol adapter stack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub headers: HeadersConfig,
    #[serde(default)]
    pub errors: ErrorsConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

/// Metadata describing where an [`AdapterConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAdapterConfig {
    pub config: AdapterConfig,
    pub source: Option<PathBuf>,
}

impl AdapterConfig {
    pub const ENV_CONFIG_PATH: &'static str = "TWINPROTO_CONFIG";

    /// First existing candidate, or the `TWINPROTO_CONFIG` override when set.
    /// Fails when neither yields a file.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        let loaded = Self::load_with_source(candidates)?;
        if loaded.source.is_none() {
            let inspected: Vec<String> = candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect();
            return Err(anyhow!(
                "no configuration file among [{}]",
                inspected.join(", ")
            ));
        }
        Ok(loaded.config)
    }

    /// Like [`AdapterConfig::load`] but falls back to the built-in defaults
    /// with no source when nothing is found.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAdapterConfig> {
        let from_env = std::env::var(Self::ENV_CONFIG_PATH)
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);
        let source = from_env.or_else(|| {
            candidates
                .iter()
                .map(|c| c.as_ref())
                .find(|c| c.exists())
                .map(Path::to_path_buf)
        });

        let config = match &source {
            Some(path) => Self::from_path(path)?,
            None => {
                debug!("no configuration file found, using defaults");
                Self::default()
            }
        };
        Ok(LoadedAdapterConfig { config, source })
    }

    /// Read and validate one TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AdapterConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.headers.validate()?;
        self.errors.validate()?;
        self.protocol.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AdapterConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AdapterConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

/// Declared headers and how undeclared ones are treated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadersConfig {
    /// Pass headers that are not declared through unchanged.
    #[serde(default = "default_true")]
    pub pass_unknown: bool,
    /// Declared headers keyed by name.
    #[serde(default)]
    pub declared: IndexMap<String, HeaderVisibility>,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            pass_unknown: true,
            declared: IndexMap::new(),
        }
    }
}

impl HeadersConfig {
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in self.declared.keys() {
            let legal = |c: char| c.is_ascii_graphic() && c != ':';
            if name.is_empty() || !name.chars().all(legal) {
                return Err(anyhow!("header name '{}' is malformed", name));
            }
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(anyhow!("header '{}' is declared more than once", name));
            }
        }
        Ok(())
    }
}

/// Visibility of one declared header towards external parties.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderVisibility {
    #[serde(default = "default_true")]
    pub read_from_external: bool,
    #[serde(default = "default_true")]
    pub write_to_external: bool,
}

impl Default for HeaderVisibility {
    fn default() -> Self {
        Self {
            read_from_external: true,
            write_to_external: true,
        }
    }
}

/// Error codes known to the default error registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorsConfig {
    /// Error code to default HTTP status.
    #[serde(default = "default_error_codes")]
    pub codes: IndexMap<String, u16>,
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            codes: default_error_codes(),
        }
    }
}

impl ErrorsConfig {
    pub fn validate(&self) -> Result<()> {
        for (code, status) in &self.codes {
            if code.trim().is_empty() {
                return Err(anyhow!("error codes must not be empty"));
            }
            if !(100..=599).contains(status) {
                return Err(anyhow!(
                    "error code '{}' maps to out-of-range status {}",
                    code,
                    status
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Schema version used when rendering acknowledgement entities.
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
        }
    }
}

impl ProtocolConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.schema_version) {
            return Err(anyhow!(
                "unsupported schema version {}",
                self.schema_version
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::str::FromStr;

    #[test]
    fn defaults_are_valid() {
        let config = AdapterConfig::default();
        config.validate().unwrap();
        assert!(config.headers.pass_unknown);
        assert_eq!(config.protocol.schema_version, 2);
        assert_eq!(config.errors.codes.get("things:thing.notfound"), Some(&404));
    }

    #[test]
    fn parses_inline_toml() {
        let config = AdapterConfig::from_str(
            r#"
            [headers]
            pass_unknown = false

            [headers.declared.correlation-id]

            [headers.declared.x-internal]
            write_to_external = false

            [errors.codes]
            "custom:thing.broken" = 503

            [protocol]
            schema_version = 1
            "#,
        )
        .unwrap();
        assert!(!config.headers.pass_unknown);
        assert_eq!(config.headers.declared.len(), 2);
        assert!(config.headers.declared["correlation-id"].read_from_external);
        assert!(!config.headers.declared["x-internal"].write_to_external);
        assert_eq!(config.errors.codes.len(), 1);
        assert_eq!(config.protocol.schema_version, 1);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(AdapterConfig::from_str("[protocol]\nschema_version = 7").is_err());
        assert!(AdapterConfig::from_str("[errors.codes]\n\"x\" = 42").is_err());
        assert!(AdapterConfig::from_str(
            "[headers.declared.Correlation-Id]\n[headers.declared.correlation-id]"
        )
        .is_err());
        assert!(AdapterConfig::from_str("[headers.declared.\"bad name\"]").is_err());
    }

    #[test]
    fn loads_first_existing_candidate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[protocol]\nschema_version = 1").unwrap();
        let missing = PathBuf::from("does/not/exist.toml");
        let loaded =
            AdapterConfig::load_with_source(&[missing.clone(), file.path().to_path_buf()])
                .unwrap();
        assert_eq!(loaded.source.as_deref(), Some(file.path()));
        assert_eq!(loaded.config.protocol.schema_version, 1);

        let fallback = AdapterConfig::load_with_source(&[missing.clone()]).unwrap();
        assert!(fallback.source.is_none());
        assert!(AdapterConfig::load(&[missing]).is_err());
    }
}
