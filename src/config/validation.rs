use crate::config::types::{
    AssetsConfig, AttrRule, Config, DetailConfig, FieldRule, HttpConfig, ListingConfig,
    PipelineConfig, SourceConfig,
};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Upper bound on workers per pool stage
pub const MAX_CONCURRENCY: usize = 256;

/// Record keys that listing fields and reference lists may not shadow
const RESERVED_KEYS: [&str; 4] = ["id", "link", "name", "asset"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_http_config(&config.http)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_listing_config(&config.listing)?;
    validate_detail_config(config)?;
    validate_assets_config(config)?;

    if config.output.data_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "data_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the listing source
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid source url '{}': {}", config.url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Source url '{}' must use http or https",
            config.url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Source url '{}' has no host",
            config.url
        )));
    }

    if config.page_param.trim().is_empty() {
        return Err(ConfigError::Validation(
            "page_param cannot be empty".to_string(),
        ));
    }

    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "page_size must be >= 1, got {}",
            config.page_size
        )));
    }

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 0 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }
    Ok(())
}

/// Validates listing selectors and field rules
fn validate_listing_config(config: &ListingConfig) -> Result<(), ConfigError> {
    validate_selector(&config.item)?;
    validate_attr_rule(&config.link)?;

    if let Some(name) = &config.name {
        validate_selector(name)?;
    }

    if let Some(asset) = &config.asset {
        validate_attr_rule(asset)?;
    }

    let mut seen = HashSet::new();
    for field in &config.fields {
        validate_key(&field.name, &mut seen)?;
        validate_field_rule(field)?;
    }

    Ok(())
}

fn validate_field_rule(field: &FieldRule) -> Result<(), ConfigError> {
    match (&field.text, &field.score) {
        (Some(text), None) => validate_selector(text),
        (None, Some(terms)) => {
            if terms.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Score field '{}' needs at least one term",
                    field.name
                )));
            }
            for term in terms {
                validate_selector(&term.selector)?;
                if !term.weight.is_finite() {
                    return Err(ConfigError::Validation(format!(
                        "Score field '{}' has a non-finite weight",
                        field.name
                    )));
                }
            }
            Ok(())
        }
        _ => Err(ConfigError::Validation(format!(
            "Field '{}' must set exactly one of 'text' or 'score'",
            field.name
        ))),
    }
}

/// Validates detail rules and the sub-resource rules they depend on
fn validate_detail_config(config: &Config) -> Result<(), ConfigError> {
    let Some(detail) = &config.detail else {
        return Ok(());
    };

    validate_selector(&detail.name)?;

    let mut seen: HashSet<String> = config.listing.fields.iter().map(|f| f.name.clone()).collect();
    for reference in &detail.references {
        validate_key(&reference.name, &mut seen)?;
        validate_selector(&reference.selector)?;
        if reference.attr.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Reference list '{}' has an empty attr",
                reference.name
            )));
        }
    }

    if has_references(detail) {
        let sub_resource = config.sub_resource.as_ref().ok_or_else(|| {
            ConfigError::Validation(
                "[sub-resource] is required when detail references are configured".to_string(),
            )
        })?;
        validate_selector(&sub_resource.name)?;
    }

    Ok(())
}

fn has_references(detail: &DetailConfig) -> bool {
    !detail.references.is_empty()
}

fn validate_assets_config(config: &Config) -> Result<(), ConfigError> {
    let Some(assets) = &config.assets else {
        return Ok(());
    };

    if config.listing.asset.is_none() {
        return Err(ConfigError::Validation(
            "[assets] requires listing.asset to locate each record's asset".to_string(),
        ));
    }

    validate_assets_paths(assets)
}

fn validate_assets_paths(assets: &AssetsConfig) -> Result<(), ConfigError> {
    if assets.dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "assets dir cannot be empty".to_string(),
        ));
    }

    if assets.placeholder.trim().is_empty() || assets.placeholder.contains('/') {
        return Err(ConfigError::Validation(format!(
            "assets placeholder must be a bare file name, got '{}'",
            assets.placeholder
        )));
    }

    Ok(())
}

fn validate_attr_rule(rule: &AttrRule) -> Result<(), ConfigError> {
    if let Some(selector) = &rule.selector {
        validate_selector(selector)?;
    }
    if rule.attr.trim().is_empty() {
        return Err(ConfigError::Validation(
            "attribute name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates a record key: non-empty, unique, not reserved
fn validate_key(name: &str, seen: &mut HashSet<String>) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "field name cannot be empty".to_string(),
        ));
    }

    if RESERVED_KEYS.contains(&name) {
        return Err(ConfigError::Validation(format!(
            "'{}' is a reserved record key",
            name
        )));
    }

    if !seen.insert(name.to_string()) {
        return Err(ConfigError::Validation(format!(
            "Duplicate record key '{}'",
            name
        )));
    }

    Ok(())
}

/// Validates that a CSS selector parses
pub fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            message: format!("{:?}", e),
        })
}
