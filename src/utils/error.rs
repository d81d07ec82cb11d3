use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhoneIntelError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Prefix table error: {message}")]
    PrefixTableError { message: String },

    #[error("Channel verification failed: {message}")]
    VerificationError { message: String },

    #[error("Channel verification timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
}

impl PhoneIntelError {
    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(_) | Self::VerificationError { .. } => {
                "Could not reach the channel verification service".to_string()
            }
            Self::Timeout { .. } => "The channel verification service did not answer in time".to_string(),
            Self::IoError(e) => format!("File access failed: {}", e),
            Self::SerializationError(_) => "Unexpected response format".to_string(),
            Self::TomlError(_) | Self::ConfigValidationError { .. } => {
                "The configuration file could not be read".to_string()
            }
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::MissingConfigError { field } => format!("Missing setting: {}", field),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting {}: {}", field, reason)
            }
            Self::PrefixTableError { message } => format!("Country table problem: {}", message),
        }
    }

    /// 建議的修復方式
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(_) | Self::VerificationError { .. } | Self::Timeout { .. } => {
                "Check the verification endpoint and network connectivity, then retry"
            }
            Self::IoError(_) => "Check that the file exists and is readable",
            Self::SerializationError(_) => "Check that the endpoint speaks the expected JSON contract",
            Self::TomlError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => "Fix the configuration file or CLI flags",
            Self::PrefixTableError { .. } => "Fix the [[countries]] records in the country table file",
        }
    }
}

pub type Result<T> = std::result::Result<T, PhoneIntelError>;
