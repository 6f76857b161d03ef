use crate::config::types::{Config, HttpConfig, OutputConfig, SourceConfig};
use crate::ConfigError;

/// Upper bound accepted for `max-redirects`
const MAX_REDIRECT_LIMIT: usize = 20;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_output_config(&config.output)?;
    validate_http_config(&config.http)?;
    Ok(())
}

/// Validates source configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "source directory cannot be empty".to_string(),
        ));
    }

    if config.extension.is_empty() {
        return Err(ConfigError::Validation(
            "source extension cannot be empty".to_string(),
        ));
    }

    if config.extension.starts_with('.') {
        return Err(ConfigError::Validation(format!(
            "source extension must not start with '.', got '{}'",
            config.extension
        )));
    }

    if config.column.trim().is_empty() {
        return Err(ConfigError::Validation(
            "source column cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    if config.log_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "log-file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.max_redirects < 1 || config.max_redirects > MAX_REDIRECT_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-redirects must be between 1 and {}, got {}",
            MAX_REDIRECT_LIMIT, config.max_redirects
        )));
    }

    Ok(())
}
