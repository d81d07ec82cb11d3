pub mod availability;
pub mod detector;
pub mod normalizer;
pub mod prefix_table;

pub use crate::domain::model::{
    AvailabilityResult, AvailabilityState, ChannelStatus, CountryEntry, DetectionResult,
    FieldStatus, ValidationErrorKind, ValidationResult,
};
pub use crate::domain::ports::{ChannelVerifier, CheckerSettings};
pub use crate::utils::error::Result;
