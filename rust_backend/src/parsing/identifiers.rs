//! Catalog identifier parsing.
//!
//! Gaia DR3 source ids are 64-bit integers with at least ten digits. Rows
//! in the wild also carry them embedded in text (`"Gaia DR3 4472832130942575872"`),
//! rendered as floats by spreadsheet tools, or replaced by small placeholder
//! integers. Only the first form may be used for matching.

/// Smallest Gaia source id accepted for matching.
pub const MIN_GAIA_SOURCE_ID: u64 = 1_000_000_000;

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Result of reading a numeric catalog identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceId {
    /// A well-formed id inside the plausible range.
    Valid(u64),
    /// Present but unusable: too small, or mangled by float formatting.
    Degenerate,
    /// No identifier in the field.
    Absent,
}

impl SourceId {
    pub fn valid(self) -> Option<u64> {
        match self {
            SourceId::Valid(id) => Some(id),
            _ => None,
        }
    }
}

/// Reads a source id from a raw field.
///
/// # Examples
///
/// ```
/// use cosmic_atlas::parsing::identifiers::{parse_source_id, SourceId, MIN_GAIA_SOURCE_ID};
///
/// assert_eq!(
///     parse_source_id(Some("Gaia DR3 2305944521456675456"), MIN_GAIA_SOURCE_ID),
///     SourceId::Valid(2305944521456675456)
/// );
/// assert_eq!(parse_source_id(Some("17"), MIN_GAIA_SOURCE_ID), SourceId::Degenerate);
/// assert_eq!(parse_source_id(Some("  "), MIN_GAIA_SOURCE_ID), SourceId::Absent);
/// ```
pub fn parse_source_id(raw: Option<&str>, min_plausible: u64) -> SourceId {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return SourceId::Absent;
    };

    // A float rendering like "2.305944521456675e18" has already lost digits
    if text.contains(['.', 'e', 'E']) {
        if let Ok(value) = text.parse::<f64>() {
            let exact = value.is_finite()
                && value >= 0.0
                && value.fract() == 0.0
                && value < MAX_EXACT_FLOAT_INT;
            return if exact && value as u64 >= min_plausible {
                SourceId::Valid(value as u64)
            } else {
                SourceId::Degenerate
            };
        }
    }

    let runs: Vec<&str> = text
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect();

    // Prefer the first run that looks like a full-length id; otherwise the
    // trailing number (e.g. the "42" in "Gaia DR3 42") decides.
    let candidate = runs
        .iter()
        .find(|run| run.len() >= 10)
        .or_else(|| runs.last());

    match candidate.map(|run| run.parse::<u64>()) {
        None => SourceId::Absent,
        Some(Ok(id)) if id >= min_plausible => SourceId::Valid(id),
        Some(_) => SourceId::Degenerate,
    }
}

/// Picks a human-readable star name from a SIMBAD `ids` list.
///
/// Prefers an alias tagged `NAME `, then the first alias that is neither a
/// Gaia designation nor purely numeric.
pub fn common_name_from_aliases(ids: &str) -> Option<String> {
    let parts: Vec<&str> = ids.split('|').map(str::trim).filter(|p| !p.is_empty()).collect();

    if let Some(name) = parts.iter().find_map(|p| p.strip_prefix("NAME ")) {
        let name = name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }

    parts
        .iter()
        .find(|p| !p.to_lowercase().starts_with("gaia") && !p.chars().all(|c| c.is_ascii_digit()))
        .map(|p| p.to_string())
}

/// Normalizes a Messier designation: `"M 31"`, `"m31"` and `"31"` all become `"M31"`.
pub fn messier_designation(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let number: u32 = digits.parse().ok()?;
    (1..=110).contains(&number).then(|| format!("M{}", number))
}
