use std::ops::RangeInclusive;

/// Why a per-row override cell was rejected in favor of the global default.
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideIssue {
    /// Row is shorter than the override column index.
    MissingCell,
    /// Cell content did not parse as a float.
    Unparseable(String),
    /// Parsed value (NaN included) falls outside the valid range.
    OutOfRange(f64),
}

/// Resolve one per-row numeric override. The same rules apply to duration
/// and influence, only the range and fallback differ:
/// missing cell or bad value -> fallback plus an issue for the caller to log,
/// empty cell -> fallback silently, in-range value -> adopted.
pub fn resolve_override(
    cell: Option<&str>,
    range: &RangeInclusive<f64>,
    fallback: f64,
) -> (f64, Option<OverrideIssue>) {
    let Some(raw) = cell else {
        return (fallback, Some(OverrideIssue::MissingCell));
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return (fallback, None);
    }

    match trimmed.parse::<f64>() {
        Ok(value) if range.contains(&value) => (value, None),
        Ok(value) => (fallback, Some(OverrideIssue::OutOfRange(value))),
        Err(_) => (fallback, Some(OverrideIssue::Unparseable(trimmed.to_string()))),
    }
}
