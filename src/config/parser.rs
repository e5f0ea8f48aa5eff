use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parses and validates harvester settings from TOML text
///
/// Missing `[selectors]` and `[labels]` entries fall back to the catalogue
/// defaults, so a minimal file only names the site, the page count and the
/// database.
///
/// # Returns
///
/// * `Ok(Config)` - Parsed configuration that passed validation
/// * `Err(ConfigError)` - Malformed TOML or a setting the harvester cannot run with
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads the harvester configuration file from the given path
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use reel_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Listing pages: {}", config.crawler.total_pages);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Hex-encoded SHA-256 of configuration text
///
/// This is the value stored in each run's `config_hash` column, so two runs
/// with the same hash were driven by byte-identical settings.
pub fn hash_config_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Computes the run hash of the configuration file at `path`
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(hash_config_content(&std::fs::read_to_string(path)?))
}

/// Loads a configuration together with the hash recorded for the run
///
/// The file is read once, and the hash covers exactly the text that was
/// parsed, even if the file changes on disk while the harvester starts.
///
/// # Returns
///
/// * `Ok((Config, String))` - Validated configuration and its run hash
/// * `Err(ConfigError)` - Failed to read, parse, or validate the configuration
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_config_content(&content)))
}
