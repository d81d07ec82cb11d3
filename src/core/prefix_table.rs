use crate::domain::model::CountryEntry;
use crate::utils::error::{PhoneIntelError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

/// Calling codes are searched longest first so `+971...` never resolves to a
/// one-digit code.
pub const CALLING_CODE_LENGTHS: [usize; 3] = [3, 2, 1];

static GLOBAL_TABLE: OnceLock<PrefixTable> = OnceLock::new();

struct BuiltinCountry {
    iso: &'static str,
    name: &'static str,
    calling_code: &'static str,
    lengths: &'static [usize],
    prefixes: &'static [&'static str],
}

// Row order is the tie-break priority for prefixes that match with equal
// specificity and equal length validity: earlier rows win.
const BUILTIN_COUNTRIES: &[BuiltinCountry] = &[
    BuiltinCountry { iso: "SA", name: "Saudi Arabia", calling_code: "966", lengths: &[9], prefixes: &["50", "51", "53", "54", "55", "56", "57", "58", "59"] },
    BuiltinCountry { iso: "AE", name: "United Arab Emirates", calling_code: "971", lengths: &[9], prefixes: &["50", "52", "54", "55", "56", "58"] },
    BuiltinCountry { iso: "KW", name: "Kuwait", calling_code: "965", lengths: &[8], prefixes: &["50", "51", "55", "60", "65", "66", "67", "69", "90", "94", "96", "97", "98", "99"] },
    BuiltinCountry { iso: "QA", name: "Qatar", calling_code: "974", lengths: &[8], prefixes: &["33", "50", "55", "66", "70", "71", "77"] },
    BuiltinCountry { iso: "BH", name: "Bahrain", calling_code: "973", lengths: &[8], prefixes: &["32", "33", "34", "35", "36", "37", "38", "39", "66"] },
    BuiltinCountry { iso: "OM", name: "Oman", calling_code: "968", lengths: &[8], prefixes: &["71", "72", "78", "79", "90", "91", "92", "93", "94", "95", "96", "97", "98", "99"] },
    BuiltinCountry { iso: "EG", name: "Egypt", calling_code: "20", lengths: &[10], prefixes: &["10", "11", "12", "15"] },
    BuiltinCountry { iso: "JO", name: "Jordan", calling_code: "962", lengths: &[9], prefixes: &["77", "78", "79"] },
    BuiltinCountry { iso: "IQ", name: "Iraq", calling_code: "964", lengths: &[10], prefixes: &["75", "77", "78", "79"] },
    BuiltinCountry { iso: "LB", name: "Lebanon", calling_code: "961", lengths: &[7, 8], prefixes: &["3", "70", "71", "76", "78", "79", "81"] },
    BuiltinCountry { iso: "SY", name: "Syria", calling_code: "963", lengths: &[9], prefixes: &["93", "94", "95", "96", "98", "99"] },
    BuiltinCountry { iso: "YE", name: "Yemen", calling_code: "967", lengths: &[9], prefixes: &["70", "71", "73", "77", "78"] },
    BuiltinCountry { iso: "SD", name: "Sudan", calling_code: "249", lengths: &[9], prefixes: &["90", "91", "92", "96", "99"] },
    BuiltinCountry { iso: "MA", name: "Morocco", calling_code: "212", lengths: &[9], prefixes: &["6", "7"] },
    BuiltinCountry { iso: "DZ", name: "Algeria", calling_code: "213", lengths: &[9], prefixes: &["5", "6", "7"] },
    BuiltinCountry { iso: "TN", name: "Tunisia", calling_code: "216", lengths: &[8], prefixes: &["2", "4", "5", "9"] },
    BuiltinCountry { iso: "TR", name: "Turkey", calling_code: "90", lengths: &[10], prefixes: &["50", "53", "54", "55"] },
    BuiltinCountry { iso: "GB", name: "United Kingdom", calling_code: "44", lengths: &[10], prefixes: &["7"] },
    BuiltinCountry { iso: "US", name: "United States", calling_code: "1", lengths: &[10], prefixes: &[] },
    BuiltinCountry { iso: "CA", name: "Canada", calling_code: "1", lengths: &[10], prefixes: &[] },
    BuiltinCountry { iso: "IN", name: "India", calling_code: "91", lengths: &[10], prefixes: &["6", "7", "8", "9"] },
    BuiltinCountry { iso: "PK", name: "Pakistan", calling_code: "92", lengths: &[10], prefixes: &["30", "31", "32", "33", "34", "35"] },
    BuiltinCountry { iso: "DE", name: "Germany", calling_code: "49", lengths: &[10, 11], prefixes: &["15", "16", "17"] },
    BuiltinCountry { iso: "FR", name: "France", calling_code: "33", lengths: &[9], prefixes: &["6", "7"] },
    BuiltinCountry { iso: "RU", name: "Russia", calling_code: "7", lengths: &[10], prefixes: &[] },
    BuiltinCountry { iso: "KZ", name: "Kazakhstan", calling_code: "7", lengths: &[10], prefixes: &["70", "747", "75", "76", "77"] },
];

#[derive(Debug, Deserialize)]
struct TableFile {
    countries: Vec<CountryRecord>,
}

#[derive(Debug, Deserialize)]
struct CountryRecord {
    iso_code: String,
    name: String,
    calling_code: String,
    national_lengths: Vec<usize>,
    #[serde(default)]
    operator_prefixes: Vec<String>,
}

/// Read-only country table. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct PrefixTable {
    entries: Vec<CountryEntry>,
}

impl PrefixTable {
    pub fn new(entries: Vec<CountryEntry>) -> Result<Self> {
        let mut seen = HashSet::new();

        for entry in &entries {
            let iso = &entry.iso_code;
            if iso.len() != 2 || !iso.bytes().all(|b| b.is_ascii_uppercase()) {
                return Err(table_error(format!(
                    "ISO code '{}' must be two uppercase letters",
                    iso
                )));
            }
            if !seen.insert(iso.clone()) {
                return Err(table_error(format!("duplicate ISO code '{}'", iso)));
            }
            let code = &entry.calling_code;
            if code.is_empty() || code.len() > 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
                return Err(table_error(format!(
                    "{}: calling code '{}' must be 1-3 digits",
                    iso, code
                )));
            }
            if entry.national_lengths.is_empty() || entry.national_lengths.contains(&0) {
                return Err(table_error(format!(
                    "{}: national lengths must be non-empty and positive",
                    iso
                )));
            }
            if let Some(bad) = entry
                .operator_prefixes
                .iter()
                .find(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
            {
                return Err(table_error(format!(
                    "{}: operator prefix '{}' must be digits",
                    iso, bad
                )));
            }
        }

        Ok(Self { entries })
    }

    pub fn builtin() -> Self {
        let entries = BUILTIN_COUNTRIES
            .iter()
            .map(|c| CountryEntry {
                iso_code: c.iso.to_string(),
                name: c.name.to_string(),
                calling_code: c.calling_code.to_string(),
                national_lengths: c.lengths.iter().copied().collect(),
                operator_prefixes: c.prefixes.iter().map(|p| p.to_string()).collect(),
            })
            .collect();
        Self { entries }
    }

    /// 從 TOML 字串載入國家表 (`[[countries]]` 陣列)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TableFile = toml::from_str(content)?;
        let entries = file
            .countries
            .into_iter()
            .map(|r| CountryEntry {
                iso_code: r.iso_code,
                name: r.name,
                calling_code: r.calling_code,
                national_lengths: r.national_lengths.into_iter().collect(),
                operator_prefixes: r.operator_prefixes,
            })
            .collect();
        Self::new(entries)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Installs the process-wide table. Fails if a table is already in place,
    /// including the built-in one that `global()` falls back to.
    pub fn install(table: PrefixTable) -> Result<&'static PrefixTable> {
        let count = table.entries.len();
        GLOBAL_TABLE
            .set(table)
            .map_err(|_| table_error("prefix table is already loaded".to_string()))?;
        tracing::info!("📇 Prefix table loaded with {} countries", count);
        Ok(GLOBAL_TABLE.get_or_init(PrefixTable::builtin))
    }

    pub fn global() -> &'static PrefixTable {
        GLOBAL_TABLE.get_or_init(PrefixTable::builtin)
    }

    pub fn entries(&self) -> &[CountryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_iso(&self, iso_code: &str) -> Option<&CountryEntry> {
        self.entries
            .iter()
            .find(|e| e.iso_code.eq_ignore_ascii_case(iso_code))
    }

    /// All entries sharing `calling_code`, in table order.
    pub fn by_calling_code<'a>(
        &'a self,
        calling_code: &'a str,
    ) -> impl Iterator<Item = &'a CountryEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.calling_code == calling_code)
    }

    /// Splits `digits` into a known calling code and the remainder, trying
    /// 3-digit codes first, then 2, then 1.
    pub fn resolve_calling_code<'d>(&self, digits: &'d str) -> Option<(&'d str, &'d str)> {
        CALLING_CODE_LENGTHS.iter().find_map(|&len| {
            if digits.len() < len || !digits.is_char_boundary(len) {
                return None;
            }
            let (code, rest) = digits.split_at(len);
            self.entries
                .iter()
                .any(|e| e.calling_code == code)
                .then_some((code, rest))
        })
    }

    /// Picks the entry for `calling_code` whose operator prefixes best match
    /// `national`, falling back to the first entry in table order.
    pub fn entry_for_national(&self, calling_code: &str, national: &str) -> Option<&CountryEntry> {
        let mut best: Option<(&CountryEntry, usize)> = None;
        for entry in self.entries.iter().filter(|e| e.calling_code == calling_code) {
            let score = entry.longest_prefix_match(national).unwrap_or(0);
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((entry, score)),
            }
        }
        best.map(|(entry, _)| entry)
    }
}

impl Default for PrefixTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn table_error(message: String) -> PhoneIntelError {
    PhoneIntelError::PrefixTableError { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_well_formed() {
        let builtin = PrefixTable::builtin();
        let checked = PrefixTable::new(builtin.entries().to_vec());
        assert!(checked.is_ok());
        assert_eq!(builtin.entries()[0].iso_code, "SA");
    }

    #[test]
    fn test_resolve_calling_code_prefers_longest() {
        let table = PrefixTable::builtin();
        assert_eq!(table.resolve_calling_code("971501234567"), Some(("971", "501234567")));
        assert_eq!(table.resolve_calling_code("201012345678"), Some(("20", "1012345678")));
        assert_eq!(table.resolve_calling_code("12025550123"), Some(("1", "2025550123")));
        assert_eq!(table.resolve_calling_code("0501234567"), None);
    }

    #[test]
    fn test_shared_calling_code_lookup() {
        let table = PrefixTable::builtin();
        let isos: Vec<&str> = table
            .by_calling_code("7")
            .map(|e| e.iso_code.as_str())
            .collect();
        assert_eq!(isos, vec!["RU", "KZ"]);

        assert_eq!(table.entry_for_national("7", "7771234567").unwrap().iso_code, "KZ");
        assert_eq!(table.entry_for_national("7", "9161234567").unwrap().iso_code, "RU");
        assert_eq!(table.entry_for_national("1", "2025550123").unwrap().iso_code, "US");
    }

    #[test]
    fn test_by_iso_is_case_insensitive() {
        let table = PrefixTable::builtin();
        assert_eq!(table.by_iso("ae").unwrap().calling_code, "971");
        assert!(table.by_iso("ZZ").is_none());
    }

    #[test]
    fn test_load_from_toml() {
        let content = r#"
[[countries]]
iso_code = "XA"
name = "Exampleland"
calling_code = "20"
national_lengths = [9]
operator_prefixes = ["50"]

[[countries]]
iso_code = "XB"
name = "Otherland"
calling_code = "999"
national_lengths = [7, 8]
"#;

        let table = PrefixTable::from_toml_str(content).unwrap();
        assert_eq!(table.len(), 2);
        let xb = table.by_iso("XB").unwrap();
        assert!(xb.operator_prefixes.is_empty());
        assert_eq!(xb.min_length(), 7);
        assert_eq!(xb.max_length(), 8);
    }

    #[test]
    fn test_rejects_duplicate_iso_codes() {
        let content = r#"
[[countries]]
iso_code = "XA"
name = "A"
calling_code = "20"
national_lengths = [9]

[[countries]]
iso_code = "XA"
name = "B"
calling_code = "21"
national_lengths = [9]
"#;

        let result = PrefixTable::from_toml_str(content);
        assert!(matches!(result, Err(PhoneIntelError::PrefixTableError { .. })));
    }

    #[test]
    fn test_rejects_bad_calling_code_and_prefix() {
        let bad_code = r#"
[[countries]]
iso_code = "XA"
name = "A"
calling_code = "+20"
national_lengths = [9]
"#;
        assert!(PrefixTable::from_toml_str(bad_code).is_err());

        let bad_prefix = r#"
[[countries]]
iso_code = "XA"
name = "A"
calling_code = "20"
national_lengths = [9]
operator_prefixes = ["5x"]
"#;
        assert!(PrefixTable::from_toml_str(bad_prefix).is_err());
    }
}
