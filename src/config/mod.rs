//! Persistent calendar preferences.

use std::{
    env,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{AnniversaryCalculator, FixedAnniversary};
use crate::currency::{CurrencyCode, CurrencyRegistry};

const DEFAULT_DIR_NAME: &str = ".household_calendar";
const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serde(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CalendarConfig {
    pub local_currency: CurrencyCode,
    /// Display precedence of currencies; the local currency is added when missing.
    pub currencies: Vec<CurrencyCode>,
    pub show_lunar_anniversaries: bool,
    pub extra_anniversaries: Vec<FixedAnniversary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_path: Option<PathBuf>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            local_currency: CurrencyCode::new("KRW"),
            currencies: ["KRW", "USD", "JPY", "EUR", "CNY"]
                .into_iter()
                .map(CurrencyCode::new)
                .collect(),
            show_lunar_anniversaries: true,
            extra_anniversaries: Vec::new(),
            ledger_path: None,
        }
    }
}

impl CalendarConfig {
    pub fn currency_registry(&self) -> CurrencyRegistry {
        CurrencyRegistry::new(self.local_currency.clone(), self.currencies.iter().cloned())
    }

    pub fn anniversary_calculator(&self) -> AnniversaryCalculator {
        let calculator =
            AnniversaryCalculator::korean().with_fixed(self.extra_anniversaries.iter().cloned());
        if self.show_lunar_anniversaries {
            calculator
        } else {
            calculator.without_lunar()
        }
    }
}

/// Application data directory, defaulting to `~/.household_calendar`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("HOUSEHOLD_CALENDAR_HOME") {
        return PathBuf::from(custom);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Loads and saves [`CalendarConfig`] as JSON.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base)?;
        Ok(Self::new(base.join(CONFIG_FILE)))
    }

    /// `config.json` under [`app_data_dir`]. Nothing is created until [`save`](Self::save).
    pub fn default_location() -> Self {
        Self::new(app_data_dir().join(CONFIG_FILE))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<CalendarConfig, ConfigError> {
        if self.config_path.exists() {
            let data = fs::read_to_string(&self.config_path)?;
            serde_json::from_str(&data).map_err(|err| ConfigError::Serde(err.to_string()))
        } else {
            tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
            Ok(CalendarConfig::default())
        }
    }

    pub fn save(&self, config: &CalendarConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| ConfigError::Serde(err.to_string()))?;
        let tmp = tmp_path(&self.config_path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.config_path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), ConfigError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config, CalendarConfig::default());
        assert_eq!(config.currency_registry().local().as_str(), "KRW");
    }

    #[test]
    fn save_then_load_keeps_changes() {
        let temp = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().join("nested")).unwrap();
        let mut config = CalendarConfig::default();
        config.local_currency = CurrencyCode::new("usd");
        config.currencies = vec![CurrencyCode::new("EUR")];
        config.extra_anniversaries.push(FixedAnniversary::new(4, 2, "Wedding", false));
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded, config);
        assert!(!tmp_path(manager.config_path()).exists());

        let registry = loaded.currency_registry();
        assert_eq!(registry.precedence(&CurrencyCode::new("USD")), Some(0));
        assert_eq!(registry.precedence(&CurrencyCode::new("EUR")), Some(1));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        fs::write(manager.config_path(), r#"{ "show_lunar_anniversaries": false }"#).unwrap();
        let config = manager.load().unwrap();
        assert!(!config.show_lunar_anniversaries);
        assert_eq!(config.currencies.len(), 5);

        let entries = config.anniversary_calculator().for_year(2024);
        assert!(entries.iter().all(|entry| entry.name != "Seollal"));
    }
}
