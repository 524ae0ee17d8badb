//! Configuration validation and error reporting

use std::time::Duration;

use super::ConfigError;
use super::keys;
use super::types::{BindMode, SyncConfig};
use crate::mapping::AttributeMapping;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(config: &SyncConfig) -> Result<(), ConfigError> {
        let directory = &config.directory;

        Self::not_blank(keys::LDAP_SERVER, &directory.host)?;
        Self::not_blank(keys::LDAP_BASE, &directory.base_dn)?;
        Self::not_blank(keys::LDAP_UID, &directory.uid_attribute)?;
        Self::not_blank(keys::DB_HOST, &config.store.host)?;
        Self::not_blank(keys::DB_NAME, &config.store.database)?;

        if let BindMode::Simple { bind_dn, .. } = &directory.auth {
            Self::not_blank(keys::LDAP_BIND_DN, bind_dn)?;
        }

        if directory.port == 0 {
            return Err(Self::invalid(keys::LDAP_PORT, "0", "port must be non-zero"));
        }

        if config.store.port == 0 {
            return Err(Self::invalid(keys::DB_PORT, "0", "port must be non-zero"));
        }

        if config.interval == Some(Duration::ZERO) {
            return Err(Self::invalid(keys::INTERVAL, "0s", "interval must be positive"));
        }

        Self::validate_filter(&directory.extra_filter)?;

        AttributeMapping::build(&directory.attribute_mapping)?;

        Ok(())
    }

    fn not_blank(key: &'static str, value: &str) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            Err(ConfigError::Missing { key })
        } else {
            Ok(())
        }
    }

    /// The extra filter is spliced into a conjunction, so it must be empty or
    /// a parenthesised clause with balanced parentheses
    fn validate_filter(filter: &str) -> Result<(), ConfigError> {
        if filter.is_empty() {
            return Ok(());
        }

        if !filter.starts_with('(') || !filter.ends_with(')') {
            return Err(Self::invalid(
                keys::LDAP_FILTER,
                filter,
                "filter must be enclosed in parentheses",
            ));
        }

        let mut depth: usize = 0;
        let mut escaped = false;
        for ch in filter.chars() {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '(' => depth += 1,
                ')' => {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        Self::invalid(keys::LDAP_FILTER, filter, "unbalanced parentheses")
                    })?;
                }
                _ => {}
            }
        }

        if depth != 0 {
            return Err(Self::invalid(
                keys::LDAP_FILTER,
                filter,
                "unbalanced parentheses",
            ));
        }

        Ok(())
    }

    fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvVars;

    fn valid_config() -> SyncConfig {
        SyncConfig::from_env(&EnvVars::from_pairs([
            ("LDAP_SERVER", "ldap.example.org"),
            ("LDAP_AUTH", "anonymous"),
            ("LDAP_BASE", "dc=example,dc=org"),
            ("LDAP_UID", "uid"),
            ("DB_HOST", "db"),
            ("DB_NAME", "greenlight"),
            ("DB_USERNAME", "postgres"),
        ]))
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(ConfigValidator::validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut config = valid_config();
        config.interval = Some(Duration::ZERO);

        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("interval must be positive"));
    }

    #[test]
    fn test_validate_blank_bind_dn() {
        let mut config = valid_config();
        config.directory.auth = BindMode::Simple {
            bind_dn: "  ".to_string(),
            password: String::new(),
        };

        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "LDAP_BIND_DN" }));
    }

    #[test]
    fn test_validate_malformed_mapping() {
        let mut config = valid_config();
        config.directory.attribute_mapping = "email=mail;nonsense".to_string();

        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Mapping(_)));
    }

    #[test]
    fn test_validate_filters() {
        assert!(ConfigValidator::validate_filter("").is_ok());
        assert!(ConfigValidator::validate_filter("(objectClass=person)").is_ok());
        assert!(ConfigValidator::validate_filter("(|(ou=staff)(ou=guests))").is_ok());
        assert!(ConfigValidator::validate_filter(r"(cn=a\29b)").is_ok());

        assert!(ConfigValidator::validate_filter("objectClass=person").is_err());
        assert!(ConfigValidator::validate_filter("(objectClass=person))(").is_err());
        assert!(ConfigValidator::validate_filter("((objectClass=person)").is_err());
    }
}
