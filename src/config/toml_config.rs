use crate::core::availability::{
    AvailabilitySettings, DEFAULT_DEBOUNCE, DEFAULT_MIN_DIGITS, DEFAULT_TIMEOUT,
};
use crate::core::prefix_table::PrefixTable;
use crate::domain::ports::CheckerSettings;
use crate::utils::error::{PhoneIntelError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneIntelConfig {
    pub verification: VerificationConfig,
    pub availability: Option<AvailabilityConfig>,
    pub prefix_table: Option<PrefixTableConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    pub endpoint: String,
    pub api_token: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityConfig {
    pub debounce_ms: Option<u64>,
    pub min_digits: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixTableConfig {
    pub path: Option<String>,
}

impl PhoneIntelConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PhoneIntelError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PhoneIntelError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${VERIFY_TOKEN})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PhoneIntelError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("verification.endpoint", &self.verification.endpoint)?;

        if let Some(token) = &self.verification.api_token {
            validation::validate_non_empty_string("verification.api_token", token)?;
        }
        if let Some(timeout) = self.verification.timeout_ms {
            validation::validate_range("verification.timeout_ms", timeout, 1, 60_000)?;
        }

        if let Some(availability) = &self.availability {
            if let Some(debounce) = availability.debounce_ms {
                validation::validate_range("availability.debounce_ms", debounce, 0, 10_000)?;
            }
            if let Some(min_digits) = availability.min_digits {
                validation::validate_range("availability.min_digits", min_digits, 1, 15)?;
            }
        }

        if let Some(path) = self.prefix_table_path() {
            validation::validate_path("prefix_table.path", path)?;
        }

        Ok(())
    }

    pub fn endpoint(&self) -> &str {
        &self.verification.endpoint
    }

    pub fn api_token(&self) -> Option<&str> {
        self.verification.api_token.as_deref()
    }

    pub fn prefix_table_path(&self) -> Option<&str> {
        self.prefix_table.as_ref().and_then(|p| p.path.as_deref())
    }

    /// 有設定路徑時從檔案載入，否則使用內建表
    pub fn load_prefix_table(&self) -> Result<PrefixTable> {
        match self.prefix_table_path() {
            Some(path) => PrefixTable::from_file(path),
            None => Ok(PrefixTable::builtin()),
        }
    }

    pub fn availability_settings(&self) -> AvailabilitySettings {
        AvailabilitySettings::from_provider(self)
    }
}

impl CheckerSettings for PhoneIntelConfig {
    fn debounce(&self) -> Duration {
        self.availability
            .as_ref()
            .and_then(|a| a.debounce_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DEBOUNCE)
    }

    fn min_digits(&self) -> usize {
        self.availability
            .as_ref()
            .and_then(|a| a.min_digits)
            .unwrap_or(DEFAULT_MIN_DIGITS)
    }

    fn timeout(&self) -> Duration {
        self.verification
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

impl Validate for PhoneIntelConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[verification]
endpoint = "https://verify.example.com/channel"
timeout_ms = 3000

[availability]
debounce_ms = 500
min_digits = 8
"#;

        let config = PhoneIntelConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.endpoint(), "https://verify.example.com/channel");
        assert_eq!(config.timeout(), Duration::from_millis(3000));
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.min_digits(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = PhoneIntelConfig::from_toml_str(
            r#"
[verification]
endpoint = "https://verify.example.com"
"#,
        )
        .unwrap();

        let settings = config.availability_settings();
        assert_eq!(settings, AvailabilitySettings::default());
        assert!(config.prefix_table_path().is_none());
        assert_eq!(config.load_prefix_table().unwrap().entries()[0].iso_code, "SA");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PHONE_INTEL_TEST_TOKEN", "secret-token");

        let toml_content = r#"
[verification]
endpoint = "https://verify.example.com"
api_token = "${PHONE_INTEL_TEST_TOKEN}"
"#;

        let config = PhoneIntelConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_token(), Some("secret-token"));

        std::env::remove_var("PHONE_INTEL_TEST_TOKEN");
    }

    #[test]
    fn test_config_validation() {
        let invalid_endpoint = PhoneIntelConfig::from_toml_str(
            r#"
[verification]
endpoint = "invalid-url"
"#,
        )
        .unwrap();
        assert!(invalid_endpoint.validate().is_err());

        let zero_digits = PhoneIntelConfig::from_toml_str(
            r#"
[verification]
endpoint = "https://verify.example.com"

[availability]
min_digits = 0
"#,
        )
        .unwrap();
        assert!(matches!(
            zero_digits.validate(),
            Err(PhoneIntelError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_config_from_file_with_prefix_table() {
        let mut table_file = NamedTempFile::new().unwrap();
        table_file
            .write_all(
                br#"
[[countries]]
iso_code = "XA"
name = "Exampleland"
calling_code = "20"
national_lengths = [9]
operator_prefixes = ["50"]
"#,
            )
            .unwrap();

        let mut config_file = NamedTempFile::new().unwrap();
        let table_path = table_file.path().to_str().unwrap().replace('\\', "/");
        let toml_content = format!(
            r#"
[verification]
endpoint = "https://verify.example.com"

[prefix_table]
path = "{}"
"#,
            table_path
        );
        config_file.write_all(toml_content.as_bytes()).unwrap();

        let config = PhoneIntelConfig::from_file(config_file.path()).unwrap();
        assert!(config.validate().is_ok());

        let table = config.load_prefix_table().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries()[0].iso_code, "XA");
    }
}
