//! Configuration management for beanbills
//!
//! Loads and validates the YAML configuration. Every value is passed
//! explicitly to the components that need it.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigErrorSeverity, ConfigResult};

// ==================== Configuration Types ====================

/// Bill storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillsConfig {
    /// Root of the YYYY/MM/<slug> tree
    #[serde(default = "default_bills_folder")]
    pub folder: PathBuf,
    /// Root ledger file (accounts and operating currencies)
    #[serde(default = "default_main_file")]
    pub main_file: PathBuf,
    /// Staging folder for uploaded documents
    #[serde(default = "default_uploads_folder")]
    pub uploads_folder: PathBuf,
    /// Currency of a bill without postings
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// How the amount is written in folder names
    #[serde(default)]
    pub slug_amount_style: SlugAmountStyle,
    /// How copied documents are named
    #[serde(default)]
    pub document_naming: DocumentNaming,
}

impl Default for BillsConfig {
    fn default() -> Self {
        Self {
            folder: default_bills_folder(),
            main_file: default_main_file(),
            uploads_folder: default_uploads_folder(),
            default_currency: default_currency(),
            slug_amount_style: SlugAmountStyle::default(),
            document_naming: DocumentNaming::default(),
        }
    }
}

fn default_bills_folder() -> PathBuf {
    PathBuf::from("./bills")
}

fn default_main_file() -> PathBuf {
    PathBuf::from("./bills.beancount")
}

fn default_uploads_folder() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_currency() -> String {
    "EUR".to_string()
}

/// Amount spelling in folder names
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugAmountStyle {
    /// `-5.50 EUR`
    Code,
    /// `€5.50`
    Symbol,
}

impl Default for SlugAmountStyle {
    fn default() -> Self {
        SlugAmountStyle::Code
    }
}

impl std::str::FromStr for SlugAmountStyle {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "code" => Ok(SlugAmountStyle::Code),
            "symbol" => Ok(SlugAmountStyle::Symbol),
            _ => Err(format!("Invalid amount style: {}", s)),
        }
    }
}

impl std::fmt::Display for SlugAmountStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlugAmountStyle::Code => write!(f, "code"),
            SlugAmountStyle::Symbol => write!(f, "symbol"),
        }
    }
}

/// File names given to copied documents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentNaming {
    /// Keep the uploaded file name
    Original,
    /// doc1.pdf, doc2.jpg, ...
    Numbered,
}

impl Default for DocumentNaming {
    fn default() -> Self {
        DocumentNaming::Original
    }
}

impl std::str::FromStr for DocumentNaming {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "original" => Ok(DocumentNaming::Original),
            "numbered" => Ok(DocumentNaming::Numbered),
            _ => Err(format!("Invalid document naming: {}", s)),
        }
    }
}

impl std::fmt::Display for DocumentNaming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentNaming::Original => write!(f, "original"),
            DocumentNaming::Numbered => write!(f, "numbered"),
        }
    }
}

/// Where the generated includes go
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludesTarget {
    /// Overwrite a dedicated includes file
    File,
    /// Replace the marked region of the main file
    Region,
}

impl Default for IncludesTarget {
    fn default() -> Self {
        IncludesTarget::File
    }
}

impl std::fmt::Display for IncludesTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncludesTarget::File => write!(f, "file"),
            IncludesTarget::Region => write!(f, "region"),
        }
    }
}

/// Includes aggregation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncludesConfig {
    #[serde(default)]
    pub target: IncludesTarget,
    /// Dedicated includes file (target = file)
    #[serde(default = "default_includes_file")]
    pub file: PathBuf,
    /// Copy each ledger's text instead of writing `include` lines
    #[serde(default)]
    pub inline: bool,
    #[serde(default = "default_begin_marker")]
    pub begin_marker: String,
    #[serde(default = "default_end_marker")]
    pub end_marker: String,
}

impl Default for IncludesConfig {
    fn default() -> Self {
        Self {
            target: IncludesTarget::default(),
            file: default_includes_file(),
            inline: false,
            begin_marker: default_begin_marker(),
            end_marker: default_end_marker(),
        }
    }
}

fn default_includes_file() -> PathBuf {
    PathBuf::from("./includes.beancount")
}

fn default_begin_marker() -> String {
    "; beanbills:begin".to_string()
}

fn default_end_marker() -> String {
    "; beanbills:end".to_string()
}

/// Treatment of malformed dates and amounts in incoming payloads
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Reject the payload
    Strict,
    /// Fall back to today / zero and log a warning
    Lenient,
}

impl Default for DecodePolicy {
    fn default() -> Self {
        DecodePolicy::Strict
    }
}

impl std::str::FromStr for DecodePolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(DecodePolicy::Strict),
            "lenient" => Ok(DecodePolicy::Lenient),
            _ => Err(format!("Invalid decode policy: {}", s)),
        }
    }
}

/// Payload decoding settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayloadConfig {
    #[serde(default)]
    pub policy: DecodePolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bills: BillsConfig,
    #[serde(default)]
    pub includes: IncludesConfig,
    #[serde(default)]
    pub payload: PayloadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::IoError {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        Self::from_yaml(&content)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Self> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound { .. }) => Ok(Config::default()),
            other => other,
        }
    }

    /// Parse and validate YAML text
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.bills.folder.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "bills.folder".to_string(),
                reason: "Bills folder must not be empty".to_string(),
            });
        }

        if self.bills.default_currency.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "bills.default_currency".to_string(),
                reason: "Default currency must not be empty".to_string(),
            });
        }

        let begin = self.includes.begin_marker.trim();
        let end = self.includes.end_marker.trim();
        if begin.is_empty() || end.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "includes.begin_marker".to_string(),
                reason: "Include markers must not be empty".to_string(),
            });
        }
        if begin == end {
            return Err(ConfigError::InvalidValue {
                field: "includes.end_marker".to_string(),
                reason: "Begin and end markers must differ".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Log level must be one of: {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bills.folder, PathBuf::from("./bills"));
        assert_eq!(config.bills.main_file, PathBuf::from("./bills.beancount"));
        assert_eq!(config.includes.file, PathBuf::from("./includes.beancount"));
        assert_eq!(config.includes.target, IncludesTarget::File);
        assert!(!config.includes.inline);
        assert_eq!(config.payload.policy, DecodePolicy::Strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bundled_template_matches_defaults() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.bills.folder, defaults.bills.folder);
        assert_eq!(config.bills.default_currency, defaults.bills.default_currency);
        assert_eq!(config.bills.slug_amount_style, defaults.bills.slug_amount_style);
        assert_eq!(config.includes.begin_marker, defaults.includes.begin_marker);
        assert_eq!(config.includes.end_marker, defaults.includes.end_marker);
        assert_eq!(config.logging.level, defaults.logging.level);
    }

    #[test]
    fn test_partial_yaml() {
        let config = Config::from_yaml(
            "bills:\n  folder: /srv/bills\n  document_naming: numbered\nincludes:\n  target: region\n  inline: true\n",
        )
        .unwrap();
        assert_eq!(config.bills.folder, PathBuf::from("/srv/bills"));
        assert_eq!(config.bills.document_naming, DocumentNaming::Numbered);
        assert_eq!(config.bills.default_currency, "EUR");
        assert_eq!(config.includes.target, IncludesTarget::Region);
        assert!(config.includes.inline);
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml("bills: [").unwrap_err();
        assert_eq!(err.code(), error::ConfigErrorCode::InvalidYaml);
    }

    #[test]
    fn test_identical_markers_rejected() {
        let err = Config::from_yaml("includes:\n  begin_marker: \";x\"\n  end_marker: \";x\"\n")
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { field, .. } => assert_eq!(field, "includes.end_marker"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_log_level() {
        let err = Config::from_yaml("logging:\n  level: loud\n").unwrap_err();
        assert_eq!(err.code(), error::ConfigErrorCode::InvalidValue);
        assert!(!err.to_details().suggestions.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yml");
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::FileNotFound { .. })
        ));
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.bills.folder, PathBuf::from("./bills"));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "payload:\n  policy: lenient\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.payload.policy, DecodePolicy::Lenient);
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("Symbol".parse::<SlugAmountStyle>(), Ok(SlugAmountStyle::Symbol));
        assert_eq!("numbered".parse::<DocumentNaming>(), Ok(DocumentNaming::Numbered));
        assert!("maybe".parse::<DecodePolicy>().is_err());
        assert_eq!(SlugAmountStyle::Code.to_string(), "code");
    }
}
