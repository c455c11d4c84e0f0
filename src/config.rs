// App configuration, the canonical field table and the credential store.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::ConfigError;
use crate::normalizer::FieldTransform;
use crate::output::OutputFormat;

pub const DEFAULT_CONFIG_PATH: &str = "config/ria-scout.json";
pub const DEFAULT_KEY_PATH: &str = "config/ria.key";

/// Source path in the flattened detail record -> canonical output field,
/// with the transform each field needs. The order here is the default
/// output column order.
pub const FIELD_TABLE: &[(&str, &str, FieldTransform)] = &[
    ("autoData_autoId", "id", FieldTransform::Verbatim),
    ("title", "title", FieldTransform::Verbatim),
    ("autoData_year", "year", FieldTransform::Verbatim),
    ("autoData_raceInt", "mileage", FieldTransform::Mileage),
    ("UAH", "price(uah)", FieldTransform::Verbatim),
    ("USD", "price(usd)", FieldTransform::Verbatim),
    ("EUR", "price(eur)", FieldTransform::Verbatim),
    ("autoData_fuelName", "fuel", FieldTransform::Fuel),
    ("autoData_gearboxName", "gearbox", FieldTransform::Verbatim),
    ("locationCityName", "city", FieldTransform::Verbatim),
    ("stateData_regionName", "region", FieldTransform::Verbatim),
    ("autoData_bodyId", "type", FieldTransform::BodyStyle),
    ("linkToView", "url", FieldTransform::Url),
    ("userPhoneData_phone", "phone", FieldTransform::Verbatim),
    ("addDate", "created", FieldTransform::Verbatim),
    ("updateDate", "updated", FieldTransform::Verbatim),
    ("soldDate", "sold", FieldTransform::Verbatim),
    ("exchangeType", "exchange", FieldTransform::Verbatim),
    ("autoData_description", "description", FieldTransform::Description),
];

pub fn default_fields() -> Vec<String> {
    FIELD_TABLE
        .iter()
        .map(|(_, canonical, _)| canonical.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where reference-data cache entries live.
    pub cache_dir: String,
    /// Maximum age of a cache entry before it is refreshed.
    pub cache_ttl_seconds: u64,
    /// Where result files are written.
    pub results_dir: String,
    pub output_format: OutputFormat,
    /// Canonical output fields, in export order.
    pub fields: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: "tmp".into(),
            cache_ttl_seconds: 86_400,
            results_dir: "results".into(),
            output_format: OutputFormat::Csv,
            fields: default_fields(),
        }
    }
}

/// Load the configuration file, writing the defaults on first run.
pub fn load_or_init(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        let config = AppConfig::default();
        store(path, &config)?;
        info!("Default config is stored into '{}'", path.display());
        return Ok(config);
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn store(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}

pub fn load_api_key(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(key) => {
            let key = key.trim().to_string();
            Ok(if key.is_empty() { None } else { Some(key) })
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

pub fn store_api_key(path: &Path, key: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, key.trim())?;
    info!("Stored api key '{}' successfully", path.display());
    Ok(())
}

/// Return the stored key, prompting the operator on first use.
pub fn obtain_api_key(path: &Path) -> Result<String, ConfigError> {
    if let Some(key) = load_api_key(path)? {
        return Ok(key);
    }

    let key: String = dialoguer::Input::new()
        .with_prompt(
            "MORE INFO ABOUT GETTING A KEY IS HERE https://developers.ria.com\nPASTE KEY HERE",
        )
        .interact_text()
        .map_err(|err| ConfigError::Io(std::io::Error::other(err.to_string())))?;
    store_api_key(path, &key)?;
    Ok(key.trim().to_string())
}
