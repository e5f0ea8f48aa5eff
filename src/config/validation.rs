use crate::config::types::{Config, CrawlerConfig, LabelConfig, SelectorConfig, UserAgentConfig};
use crate::ConfigError;
use crate::extract::SelectorSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_selectors(&config.selectors)?;
    validate_labels(&config.labels)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            config.base_url
        )));
    }

    validate_category(&config.category)?;

    if config.total_pages < 1 {
        return Err(ConfigError::Validation(
            "total_pages must be >= 1".to_string(),
        ));
    }

    if config.workers < 1 || config.workers > 256 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 256, got {}",
            config.workers
        )));
    }

    if config.page_size < 1 || config.page_size > 500 {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and 500, got {}",
            config.page_size
        )));
    }

    if config.resolve_attempts < 1 {
        return Err(ConfigError::Validation(
            "resolve_attempts must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the listing category segment
fn validate_category(category: &str) -> Result<(), ConfigError> {
    if category.is_empty() {
        return Err(ConfigError::Validation(
            "category cannot be empty".to_string(),
        ));
    }

    if category.starts_with('/') || category.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "category '{}' cannot start or end with '/'",
            category
        )));
    }

    if category.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "category '{}' cannot contain whitespace",
            category
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that every selector compiles
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    SelectorSet::compile(config).map(|_| ())
}

fn validate_labels(config: &LabelConfig) -> Result<(), ConfigError> {
    if config.all().iter().any(|label| label.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "labels cannot be empty".to_string(),
        ));
    }
    Ok(())
}
