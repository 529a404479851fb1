use crate::config::types::{Config, IngestConfig, SourceConfig, StorageConfig};
use crate::ConfigError;
use std::time::Duration;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_ingest_config(&config.ingest)?;
    validate_source_config(&config.source)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates batch and pacing options
fn validate_ingest_config(config: &IngestConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be > 0, got {}",
            config.batch_size
        )));
    }

    if config.max_fetch_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_fetch_attempts must be >= 1, got {}",
            config.max_fetch_attempts
        )));
    }

    validate_seconds("inter_fetch_delay_seconds", config.inter_fetch_delay_seconds)?;
    validate_seconds("inter_batch_delay_seconds", config.inter_batch_delay_seconds)?;
    validate_seconds("retry_base_delay_seconds", config.retry_base_delay_seconds)?;
    validate_seconds("retry_max_delay_seconds", config.retry_max_delay_seconds)?;

    if config.retry_max_delay_seconds < config.retry_base_delay_seconds {
        return Err(ConfigError::Validation(format!(
            "retry_max_delay_seconds ({}) must be >= retry_base_delay_seconds ({})",
            config.retry_max_delay_seconds, config.retry_base_delay_seconds
        )));
    }

    if let Some(range) = config.id_range {
        if range.is_empty() {
            return Err(ConfigError::Validation(format!(
                "id_range must satisfy start < end, got [{}, {})",
                range.start, range.end
            )));
        }
    }

    Ok(())
}

/// Validates source endpoints
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_http_url("details_url", &config.details_url)?;
    validate_http_url("store_page_url", &config.store_page_url)?;
    validate_http_url("app_list_url", &config.app_list_url)?;

    if config.country_code.len() != 2 || !config.country_code.chars().all(|c| c.is_ascii_alphabetic())
    {
        return Err(ConfigError::Validation(format!(
            "country_code must be a two-letter code, got '{}'",
            config.country_code
        )));
    }

    if let Some(language) = &config.language {
        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::Validation(format!(
                "language must be a non-empty identifier, got '{}'",
                language
            )));
        }
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_seconds must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates store configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Delays must be non-negative and representable as a `Duration`
fn validate_seconds(name: &str, value: f64) -> Result<(), ConfigError> {
    if let Err(e) = Duration::try_from_secs_f64(value) {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {} ({})",
            name, value, e
        )));
    }
    Ok(())
}

fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}
