use crate::config::types::{
    CategoryConfig, Config, CrawlerConfig, OutputConfig, OutputFormat, SelectorConfig, SiteConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_site_config(&config.site)?;
    validate_selector_config(&config.selectors)?;
    validate_output_config(&config.output)?;
    validate_categories(&config.categories)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_details < 1 || config.max_concurrent_details > 32 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_details must be between 1 and 32, got {}",
            config.max_concurrent_details
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.checkpoint_every < 1 {
        return Err(ConfigError::Validation(
            "checkpoint_every must be >= 1".to_string(),
        ));
    }

    if config.max_images < 1 || config.max_images > 50 {
        return Err(ConfigError::Validation(format!(
            "max_images must be between 1 and 50, got {}",
            config.max_images
        )));
    }

    Ok(())
}

/// Validates the site description
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if config.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "site name cannot be empty".to_string(),
        ));
    }

    validate_http_url("root-url", &config.root_url)?;

    for pattern in &config.allowed_domains {
        validate_domain_pattern(pattern)?;
    }

    if config.country_code.is_empty() || !config.country_code.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ConfigError::Validation(format!(
            "country_code must be a non-empty digit string, got '{}'",
            config.country_code
        )));
    }

    Ok(())
}

/// The container and item lists drive every listing page; they cannot be emptied
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    if config.listing_container.is_empty() || config.listing_item.is_empty() {
        return Err(ConfigError::Validation(
            "listing-container and listing-item selector lists cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.formats.is_empty() {
        return Err(ConfigError::Validation(
            "at least one output format is required".to_string(),
        ));
    }

    let wants_files = config
        .formats
        .iter()
        .any(|f| matches!(f, OutputFormat::Csv | OutputFormat::Json));
    if wants_files && config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.formats.contains(&OutputFormat::Sqlite) && config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates category entries
fn validate_categories(categories: &[CategoryConfig]) -> Result<(), ConfigError> {
    if categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[category]] is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for category in categories {
        let label = &category.listing_type;
        if label.is_empty()
            || !label
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::Validation(format!(
                "listing-type must contain only alphanumeric characters, '-' or '_', got '{}'",
                label
            )));
        }

        if !seen.insert(label.as_str()) {
            return Err(ConfigError::Validation(format!(
                "listing-type '{}' is configured twice",
                label
            )));
        }

        validate_http_url("category url", &category.url)?;

        if category.target < 1 {
            return Err(ConfigError::Validation(format!(
                "target for '{}' must be >= 1",
                label
            )));
        }

        if category.max_pages == Some(0) {
            return Err(ConfigError::Validation(format!(
                "max-pages for '{}' must be >= 1 when set",
                label
            )));
        }
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            field, value
        )));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' is malformed",
            domain
        )));
    }

    Ok(())
}
