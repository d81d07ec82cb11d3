use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One row of the prefix table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryEntry {
    pub iso_code: String,
    pub name: String,
    pub calling_code: String,
    pub national_lengths: BTreeSet<usize>,
    pub operator_prefixes: Vec<String>,
}

impl CountryEntry {
    pub fn accepts_length(&self, len: usize) -> bool {
        self.national_lengths.contains(&len)
    }

    pub fn min_length(&self) -> usize {
        self.national_lengths.first().copied().unwrap_or(0)
    }

    pub fn max_length(&self) -> usize {
        self.national_lengths.last().copied().unwrap_or(0)
    }

    /// 回傳與 `national` 相符的最長業者前綴長度
    pub fn longest_prefix_match(&self, national: &str) -> Option<usize> {
        self.operator_prefixes
            .iter()
            .filter(|prefix| national.starts_with(prefix.as_str()))
            .map(|prefix| prefix.len())
            .max()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub iso_code: Option<String>,
    pub calling_code: Option<String>,
    pub national_number: String,
    pub formatted_number: Option<String>,
    pub is_valid: bool,
}

impl DetectionResult {
    pub fn unresolved(raw_digits: &str) -> Self {
        Self {
            iso_code: None,
            calling_code: None,
            national_number: raw_digits.to_string(),
            formatted_number: None,
            is_valid: false,
        }
    }

    pub fn resolved(entry: &CountryEntry, national_number: &str) -> Self {
        Self {
            iso_code: Some(entry.iso_code.clone()),
            calling_code: Some(entry.calling_code.clone()),
            national_number: national_number.to_string(),
            formatted_number: Some(format!("+{}{}", entry.calling_code, national_number)),
            is_valid: entry.accepts_length(national_number.len()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.iso_code.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    TooShort,
    TooLong,
    UnknownCountry,
    InvalidCharacters,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::UnknownCountry => "unknown_country",
            Self::InvalidCharacters => "invalid_characters",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::TooShort => "Phone number is too short",
            Self::TooLong => "Phone number is too long",
            Self::UnknownCountry => "Country calling code is not recognized",
            Self::InvalidCharacters => "Phone number contains invalid characters",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub formatted: Option<String>,
    pub iso_code: Option<String>,
    pub error: Option<ValidationErrorKind>,
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn valid(formatted: String, iso_code: &str) -> Self {
        Self {
            is_valid: true,
            formatted: Some(formatted),
            iso_code: Some(iso_code.to_string()),
            error: None,
            message: None,
        }
    }

    pub fn invalid(kind: ValidationErrorKind, iso_code: Option<&str>) -> Self {
        Self {
            is_valid: false,
            formatted: None,
            iso_code: iso_code.map(str::to_string),
            error: Some(kind),
            message: Some(kind.message().to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityState {
    Reachable,
    /// Only produced when the collaborator asserts non-existence. The HTTP
    /// contract in use has no such signal, so callers should not expect it.
    NotReachable,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub state: AvailabilityState,
    pub error: Option<String>,
}

impl AvailabilityResult {
    pub fn reachable() -> Self {
        Self {
            state: AvailabilityState::Reachable,
            error: None,
        }
    }

    pub fn unknown() -> Self {
        Self {
            state: AvailabilityState::Unknown,
            error: None,
        }
    }

    pub fn unknown_with_error(error: impl Into<String>) -> Self {
        Self {
            state: AvailabilityState::Unknown,
            error: Some(error.into()),
        }
    }
}

/// Reply from the channel verification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatus {
    pub has_channel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a phone field currently shows for channel availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStatus {
    Idle,
    Checking {
        value: String,
    },
    Settled {
        value: String,
        result: AvailabilityResult,
        checked_at: DateTime<Utc>,
    },
}

impl FieldStatus {
    pub fn settled_result(&self) -> Option<&AvailabilityResult> {
        match self {
            Self::Settled { result, .. } => Some(result),
            _ => None,
        }
    }
}
