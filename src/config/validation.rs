//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges (the metrics address must be an IP
//!   literal, the listener may name a host)
//! - Reject CORS policies browsers refuse
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: MuxConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::MuxConfig;
use crate::observability::logging::LOG_FORMATS;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field}: {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("limits.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("unknown observability.log_format {0:?}")]
    UnknownLogFormat(String),

    #[error("cors.allow_credentials cannot be combined with a wildcard allow_origin")]
    CredentialsWithWildcard,
}

/// `ip:port` or `host:port`, the forms `TcpListener::bind` resolves.
fn is_bind_address(value: &str) -> bool {
    if value.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match value.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty()
                && port.parse::<u16>().is_ok()
                && host
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        }
        None => false,
    }
}

/// Check a parsed configuration, collecting every error.
pub fn validate_config(config: &MuxConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_bind_address(&config.listener.bind_address) {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let observability = &config.observability;
    if !LOG_FORMATS.contains(&observability.log_format.as_str()) {
        errors.push(ValidationError::UnknownLogFormat(observability.log_format.clone()));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if config.cors.allow_credentials && config.cors.allow_origin == "*" {
        errors.push(ValidationError::CredentialsWithWildcard);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(validate_config(&MuxConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = MuxConfig::default();
        config.listener.bind_address = "localhost".into();
        config.timeouts.request_secs = 0;
        config.limits.max_body_size = 0;
        config.observability.log_format = "json".into();
        config.cors.allow_credentials = true;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidAddress {
                    field: "listener.bind_address",
                    value: "localhost".into(),
                },
                ValidationError::ZeroTimeout,
                ValidationError::ZeroBodyLimit,
                ValidationError::UnknownLogFormat("json".into()),
                ValidationError::CredentialsWithWildcard,
            ]
        );
    }

    #[test]
    fn test_bind_address_forms() {
        for ok in ["0.0.0.0:8080", "[::1]:80", "localhost:8080", "api.internal:443"] {
            let mut config = MuxConfig::default();
            config.listener.bind_address = ok.into();
            assert_eq!(validate_config(&config), Ok(()), "{ok}");
        }
        for bad in ["localhost", ":8080", "localhost:http", "local host:80", "host:70000"] {
            let mut config = MuxConfig::default();
            config.listener.bind_address = bad.into();
            assert!(validate_config(&config).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = MuxConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
