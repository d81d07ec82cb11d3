use crate::core::detector::{sanitize_digits, MIN_DETECTION_DIGITS};
use crate::core::prefix_table::PrefixTable;
use crate::domain::model::{DetectionResult, ValidationErrorKind, ValidationResult};

/// Validates against the process-wide table.
pub fn validate(full_phone_candidate: &str) -> ValidationResult {
    PhoneValidator::global().validate(full_phone_candidate)
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '.' | '(' | ')' | '/')
}

/// Turns `+<calling code><national>` (or the same digits without `+`) into
/// canonical E.164.
#[derive(Debug, Clone, Copy)]
pub struct PhoneValidator<'t> {
    table: &'t PrefixTable,
}

impl<'t> PhoneValidator<'t> {
    pub fn new(table: &'t PrefixTable) -> Self {
        Self { table }
    }

    pub fn global() -> PhoneValidator<'static> {
        PhoneValidator::new(PrefixTable::global())
    }

    pub fn validate(&self, full_phone_candidate: &str) -> ValidationResult {
        let Some((has_plus, digits)) = split_digits(full_phone_candidate) else {
            return ValidationResult::invalid(ValidationErrorKind::InvalidCharacters, None);
        };

        // 00 是國際冠碼，等同 +
        let digits = if has_plus {
            digits.as_str()
        } else {
            digits.strip_prefix("00").unwrap_or(&digits)
        };

        if digits.len() < MIN_DETECTION_DIGITS {
            return ValidationResult::invalid(ValidationErrorKind::TooShort, None);
        }

        match self.table.resolve_calling_code(digits) {
            Some((code, rest)) => self.classify(code, rest),
            None => ValidationResult::invalid(ValidationErrorKind::UnknownCountry, None),
        }
    }

    /// Validates a dropdown calling code plus the typed national digits.
    pub fn validate_parts(&self, calling_code: &str, national_number: &str) -> ValidationResult {
        let code = calling_code.trim().trim_start_matches('+');
        if self.table.by_calling_code(code).next().is_none() {
            return ValidationResult::invalid(ValidationErrorKind::UnknownCountry, None);
        }

        // 國碼已由下拉選單決定，本地號碼不可再帶 +
        let Some((false, national)) = split_digits(national_number) else {
            return ValidationResult::invalid(ValidationErrorKind::InvalidCharacters, None);
        };

        self.classify(code, &national)
    }

    fn classify(&self, calling_code: &str, rest: &str) -> ValidationResult {
        let national = rest.trim_start_matches('0');
        let Some(entry) = self.table.entry_for_national(calling_code, national) else {
            return ValidationResult::invalid(ValidationErrorKind::UnknownCountry, None);
        };

        let len = national.len();
        if entry.accepts_length(len) {
            return ValidationResult::valid(
                format!("+{}{}", entry.calling_code, national),
                &entry.iso_code,
            );
        }

        let kind = if len > entry.max_length() {
            ValidationErrorKind::TooLong
        } else {
            ValidationErrorKind::TooShort
        };
        tracing::debug!(
            "Rejected national number for {}: {} digits ({})",
            entry.iso_code,
            len,
            kind
        );
        ValidationResult::invalid(kind, Some(entry.iso_code.as_str()))
    }
}

/// Returns `(has_leading_plus, digits)` or `None` when a character other
/// than a digit, a separator or a single leading `+` is present.
fn split_digits(input: &str) -> Option<(bool, String)> {
    let trimmed = input.trim();
    let (has_plus, body) = match trimmed.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    if body.chars().any(|c| !c.is_ascii_digit() && !is_separator(c)) {
        return None;
    }

    Some((has_plus, sanitize_digits(body)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Manual,
    Detected,
}

/// Calling code chosen for a phone field. The dropdown and the detector can
/// disagree; whichever spoke last wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallingCodeSelection {
    calling_code: Option<String>,
    source: Option<SelectionSource>,
}

impl CallingCodeSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm(&mut self, calling_code: impl Into<String>) {
        let code: String = calling_code.into();
        self.calling_code = Some(code.trim_start_matches('+').to_string());
        self.source = Some(SelectionSource::Manual);
    }

    /// Returns true when the detection replaced the current code.
    pub fn apply_detection(&mut self, detection: &DetectionResult) -> bool {
        match &detection.calling_code {
            Some(code) => {
                self.calling_code = Some(code.clone());
                self.source = Some(SelectionSource::Detected);
                true
            }
            None => false,
        }
    }

    pub fn calling_code(&self) -> Option<&str> {
        self.calling_code.as_deref()
    }

    pub fn source(&self) -> Option<SelectionSource> {
        self.source
    }

    pub fn validate_national(
        &self,
        validator: &PhoneValidator<'_>,
        national_number: &str,
    ) -> ValidationResult {
        match self.calling_code() {
            Some(code) => validator.validate_parts(code, national_number),
            None => ValidationResult::invalid(ValidationErrorKind::UnknownCountry, None),
        }
    }
}
