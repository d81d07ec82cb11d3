use crate::core::prefix_table::PrefixTable;
use crate::domain::model::{CountryEntry, DetectionResult};

/// Below this many digits no detection is attempted.
pub const MIN_DETECTION_DIGITS: usize = 3;

/// Keeps ASCII digits only, for callers holding raw keystrokes.
pub fn sanitize_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Detects against the process-wide table.
pub fn detect(raw_digits: &str) -> DetectionResult {
    CountryDetector::global().detect(raw_digits)
}

struct OperatorMatch<'t> {
    entry: &'t CountryEntry,
    prefix_len: usize,
    length_ok: bool,
}

/// Guesses the country of a number typed without `+`.
///
/// Operator prefixes are matched against the national digits (one trunk `0`
/// removed). The longest prefix wins; equal prefixes prefer an entry whose
/// length range accepts the number, then the earlier table row. When that
/// yields no length-valid number, digits that start with a calling code
/// (`9665...`) are tried as well.
#[derive(Debug, Clone, Copy)]
pub struct CountryDetector<'t> {
    table: &'t PrefixTable,
}

impl<'t> CountryDetector<'t> {
    pub fn new(table: &'t PrefixTable) -> Self {
        Self { table }
    }

    pub fn global() -> CountryDetector<'static> {
        CountryDetector::new(PrefixTable::global())
    }

    pub fn detect(&self, raw_digits: &str) -> DetectionResult {
        if raw_digits.len() < MIN_DETECTION_DIGITS {
            return DetectionResult::unresolved(raw_digits);
        }

        let local = raw_digits.strip_prefix('0').unwrap_or(raw_digits);
        let by_operator = self.best_operator_match(local);

        if let Some(m) = &by_operator {
            if m.length_ok {
                tracing::debug!(
                    "Detected {} via operator prefix ({} digits)",
                    m.entry.iso_code,
                    m.prefix_len
                );
                return DetectionResult::resolved(m.entry, local);
            }
        }

        let by_calling_code = self.calling_code_match(raw_digits);

        match (by_operator, by_calling_code) {
            (_, Some((entry, national))) if entry.accepts_length(national.len()) => {
                tracing::debug!("Detected {} via calling code {}", entry.iso_code, entry.calling_code);
                DetectionResult::resolved(entry, national)
            }
            (Some(m), _) => DetectionResult::resolved(m.entry, local),
            (None, Some((entry, national))) => DetectionResult::resolved(entry, national),
            (None, None) => DetectionResult::unresolved(raw_digits),
        }
    }

    fn best_operator_match(&self, local: &str) -> Option<OperatorMatch<'t>> {
        let mut best: Option<OperatorMatch<'t>> = None;

        for entry in self.table.entries() {
            let Some(prefix_len) = entry.longest_prefix_match(local) else {
                continue;
            };
            let length_ok = entry.accepts_length(local.len());

            // 只有嚴格更好才取代，相同時保留表中較前面的國家
            let better = match &best {
                None => true,
                Some(b) => (prefix_len, length_ok) > (b.prefix_len, b.length_ok),
            };
            if better {
                best = Some(OperatorMatch {
                    entry,
                    prefix_len,
                    length_ok,
                });
            }
        }

        best
    }

    fn calling_code_match<'d>(&self, raw_digits: &'d str) -> Option<(&'t CountryEntry, &'d str)> {
        let digits = raw_digits.strip_prefix("00").unwrap_or(raw_digits);
        let (code, rest) = self.table.resolve_calling_code(digits)?;
        let national = rest.strip_prefix('0').unwrap_or(rest);
        let entry = self.table.entry_for_national(code, national)?;
        Some((entry, national))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_country_table() -> PrefixTable {
        PrefixTable::from_toml_str(
            r#"
[[countries]]
iso_code = "XA"
name = "Exampleland"
calling_code = "20"
national_lengths = [9]
operator_prefixes = ["50"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_short_input_is_unresolved() {
        let table = PrefixTable::builtin();
        let detector = CountryDetector::new(&table);
        for raw in ["", "0", "05", "50"] {
            let result = detector.detect(raw);
            assert!(!result.is_valid);
            assert!(result.iso_code.is_none());
            assert_eq!(result.national_number, raw);
        }
    }

    #[test]
    fn test_operator_prefix_with_trunk_zero() {
        let table = single_country_table();
        let result = CountryDetector::new(&table).detect("0501234567");

        assert_eq!(result.iso_code.as_deref(), Some("XA"));
        assert_eq!(result.calling_code.as_deref(), Some("20"));
        assert_eq!(result.national_number, "501234567");
        assert_eq!(result.formatted_number.as_deref(), Some("+20501234567"));
        assert!(result.is_valid);
    }

    #[test]
    fn test_zero_kept_when_unresolved() {
        let table = PrefixTable::from_toml_str(
            r#"
[[countries]]
iso_code = "XA"
name = "Exampleland"
calling_code = "20"
national_lengths = [9]
operator_prefixes = ["77"]
"#,
        )
        .unwrap();
        let result = CountryDetector::new(&table).detect("0501234567");

        assert!(result.iso_code.is_none());
        assert_eq!(result.national_number, "0501234567");
        assert!(!result.is_valid);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let table = PrefixTable::builtin();
        // KZ has "747", IN only "7"
        let result = CountryDetector::new(&table).detect("7471234567");
        assert_eq!(result.iso_code.as_deref(), Some("KZ"));
    }

    #[test]
    fn test_equal_prefix_prefers_valid_length() {
        let table = PrefixTable::builtin();
        // SA and TR both list "53"; only TR accepts ten digits
        let result = CountryDetector::new(&table).detect("05321234567");
        assert_eq!(result.iso_code.as_deref(), Some("TR"));
        assert!(result.is_valid);
    }

    #[test]
    fn test_equal_prefix_and_length_uses_table_order() {
        let table = PrefixTable::builtin();
        // SA and AE both list "50" with nine digits; SA is first
        let result = CountryDetector::new(&table).detect("0501234567");
        assert_eq!(result.iso_code.as_deref(), Some("SA"));
        assert_eq!(result.formatted_number.as_deref(), Some("+966501234567"));
    }

    #[test]
    fn test_calling_code_fallback() {
        let table = PrefixTable::builtin();
        let detector = CountryDetector::new(&table);

        let result = detector.detect("966501234567");
        assert_eq!(result.iso_code.as_deref(), Some("SA"));
        assert_eq!(result.national_number, "501234567");
        assert!(result.is_valid);

        let result = detector.detect("00971501234567");
        assert_eq!(result.iso_code.as_deref(), Some("AE"));
        assert_eq!(result.formatted_number.as_deref(), Some("+971501234567"));
    }

    #[test]
    fn test_partial_number_resolves_but_invalid() {
        let table = PrefixTable::builtin();
        let result = CountryDetector::new(&table).detect("0501");
        assert_eq!(result.iso_code.as_deref(), Some("SA"));
        assert_eq!(result.national_number, "501");
        assert!(!result.is_valid);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let table = PrefixTable::builtin();
        let detector = CountryDetector::new(&table);
        assert_eq!(detector.detect("0771234567"), detector.detect("0771234567"));
    }

    #[test]
    fn test_sanitize_digits() {
        assert_eq!(sanitize_digits("+966 (50) 123-4567"), "966501234567");
        assert_eq!(sanitize_digits("abc"), "");
    }
}
