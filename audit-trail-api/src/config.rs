use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker written in place of hidden property values.
pub const DEFAULT_REDACTION_MARKER: &str = "***";

/// Prefix of the environment variables read by [`AuditConfig::from_env`].
pub const ENV_PREFIX: &str = "AUDIT_";

/// What a save does when its audit half fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStrictness {
    /// Log the fault and report it in the save outcome.
    #[default]
    Lenient,
    /// Return the fault as `SaveError::Audit`.
    Strict,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Audit engine configuration
///
/// # Example
///
/// ```
/// use audit_trail_api::{AuditConfig, AuditStrictness};
///
/// let config = AuditConfig::default().strict();
/// assert!(config.enabled);
/// assert_eq!(config.strictness, AuditStrictness::Strict);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// When false, saves write business data only.
    pub enabled: bool,
    pub strictness: AuditStrictness,
    pub redaction_marker: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strictness: AuditStrictness::default(),
            redaction_marker: DEFAULT_REDACTION_MARKER.to_string(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from defaults overlaid with `AUDIT_*` variables
    /// (`AUDIT_ENABLED`, `AUDIT_STRICTNESS`, `AUDIT_REDACTION_MARKER`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Provider chain used by [`AuditConfig::from_env`].
    ///
    /// Public so embedders can merge their own providers on top.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(ENV_PREFIX).only(&["enabled", "strictness", "redaction_marker"]))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AuditConfig = figment.extract()?;
        if config.redaction_marker.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "redaction_marker".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(config)
    }

    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strictness = AuditStrictness::Strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_environment() {
        Jail::expect_with(|_jail| {
            let config = AuditConfig::from_env().expect("defaults should load");
            assert_eq!(config, AuditConfig::default());
            assert!(config.enabled);
            assert_eq!(config.strictness, AuditStrictness::Lenient);
            assert_eq!(config.redaction_marker, DEFAULT_REDACTION_MARKER);
            Ok(())
        });
    }

    #[test]
    fn test_reads_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("AUDIT_ENABLED", "false");
            jail.set_env("AUDIT_STRICTNESS", "strict");
            jail.set_env("AUDIT_REDACTION_MARKER", "[hidden]");

            let config = AuditConfig::from_env().expect("overrides should load");

            assert!(!config.enabled);
            assert_eq!(config.strictness, AuditStrictness::Strict);
            assert_eq!(config.redaction_marker, "[hidden]");
            Ok(())
        });
    }

    #[test]
    fn test_ignores_unrelated_prefixed_variables() {
        Jail::expect_with(|jail| {
            jail.set_env("AUDIT_LOG_PATH", "/var/log/audit");

            let config = AuditConfig::from_env().expect("unrelated variables are ignored");
            assert_eq!(config, AuditConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_rejects_unknown_strictness() {
        Jail::expect_with(|jail| {
            jail.set_env("AUDIT_STRICTNESS", "paranoid");

            let err = AuditConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::Figment(_)));
            assert!(err.to_string().contains("paranoid"));
            Ok(())
        });
    }

    #[test]
    fn test_rejects_empty_redaction_marker() {
        let figment = AuditConfig::figment()
            .merge(Serialized::default("redaction_marker", ""));

        let err = AuditConfig::from_figment(figment).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
