pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::PhoneIntelConfig;

pub use adapters::http::HttpChannelVerifier;
pub use crate::core::availability::{AvailabilityChecker, AvailabilityField, AvailabilitySettings, CheckTicket};
pub use crate::core::detector::{detect, sanitize_digits, CountryDetector};
pub use crate::core::normalizer::{validate, CallingCodeSelection, PhoneValidator};
pub use crate::core::prefix_table::PrefixTable;
pub use domain::model::{
    AvailabilityResult, AvailabilityState, ChannelStatus, CountryEntry, DetectionResult,
    FieldStatus, ValidationErrorKind, ValidationResult,
};
pub use utils::error::{PhoneIntelError, Result};
