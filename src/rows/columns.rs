use anyhow::{bail, Result};
use csv::StringRecord;
use tracing::{info, warn};

/// A column reference from the CLI, either a 0-based index or an exact
/// header-name match. An all-digit reference is always an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    ByIndex(usize),
    ByName(String),
}

impl ColumnRef {
    pub fn parse(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            // digit strings too large for usize are out of range for any header
            ColumnRef::ByIndex(raw.parse().unwrap_or(usize::MAX))
        } else {
            ColumnRef::ByName(raw.to_string())
        }
    }

    /// Resolve against the header once, before row iteration.
    pub fn resolve(&self, header: &StringRecord) -> Option<usize> {
        match self {
            ColumnRef::ByIndex(idx) => (*idx < header.len()).then_some(*idx),
            ColumnRef::ByName(name) => header.iter().position(|field| field == name.as_str()),
        }
    }
}

/// Resolve the mandatory prompt column; failure here aborts the run.
pub fn resolve_required(raw: &str, header: &StringRecord, role: &str) -> Result<usize> {
    let column = ColumnRef::parse(raw);
    match column.resolve(header) {
        Some(idx) => Ok(idx),
        None => match column {
            ColumnRef::ByIndex(_) => bail!(
                "{role} column index {raw} is out of range for a CSV with {} columns",
                header.len()
            ),
            ColumnRef::ByName(_) => {
                bail!("{role} column name `{raw}` not found in CSV header: {header:?}")
            }
        },
    }
}

/// Resolve an optional override column. Failure degrades to "column absent":
/// a warning is logged and every row falls back to the global flag value.
pub fn resolve_optional(
    raw: &str,
    header: &StringRecord,
    role: &str,
    global_flag: &str,
) -> Option<usize> {
    let column = ColumnRef::parse(raw);
    match column.resolve(header) {
        Some(idx) => {
            info!(
                "extracting per-prompt {role} from column `{}` (index {idx})",
                &header[idx]
            );
            Some(idx)
        }
        None => {
            match column {
                ColumnRef::ByIndex(_) => {
                    warn!("{role} column index {raw} out of range; will use global {global_flag}")
                }
                ColumnRef::ByName(_) => warn!(
                    "{role} column name `{raw}` not found in CSV header; will use global {global_flag}"
                ),
            }
            None
        }
    }
}
