//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All problems are
//! collected and returned together rather than stopping at the first one.

use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::config::schema::FetchConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("endpoint #{index} has an empty name")]
    EmptyEndpointName { index: usize },

    #[error("endpoint name '{0}' is used more than once")]
    DuplicateEndpoint(String),

    #[error("endpoint '{name}' has an invalid url '{url}': {reason}")]
    InvalidUrl {
        name: String,
        url: String,
        reason: String,
    },

    #[error("retries.max_attempts must be greater than 0")]
    ZeroMaxAttempts,

    #[error("retries.base_delay_ms must be greater than 0")]
    ZeroBaseDelay,

    #[error("http.timeout_secs must be greater than 0")]
    ZeroTimeout,
}

/// Check a parsed configuration.
pub fn validate_config(config: &FetchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::ZeroMaxAttempts);
    }
    if config.retries.base_delay_ms == 0 {
        errors.push(ValidationError::ZeroBaseDelay);
    }
    if config.http.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let mut seen = HashSet::new();
    for (index, endpoint) in config.endpoints.iter().enumerate() {
        if endpoint.name.trim().is_empty() {
            errors.push(ValidationError::EmptyEndpointName { index });
        } else if !seen.insert(endpoint.name.as_str()) {
            errors.push(ValidationError::DuplicateEndpoint(endpoint.name.clone()));
        }

        if let Err(e) = Url::parse(&endpoint.url) {
            errors.push(ValidationError::InvalidUrl {
                name: endpoint.name.clone(),
                url: endpoint.url.clone(),
                reason: e.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
