pub mod columns;
pub mod overrides;

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::fs;
use std::io::Read;
use std::ops::RangeInclusive;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use self::columns::{resolve_optional, resolve_required};
use self::overrides::{resolve_override, OverrideIssue};

pub const DURATION_RANGE: RangeInclusive<f64> = 0.5..=22.0;
pub const INFLUENCE_RANGE: RangeInclusive<f64> = 0.0..=1.0;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// One fully-resolved unit of work: non-empty prompt text plus the effective
/// generation parameters for that row. Built here, consumed once by the batch
/// loop, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub text: String,
    /// 1-based row number in the input file, counting the header as row 1.
    pub source_row: usize,
    pub duration: f64,
    pub influence: f64,
}

/// Read the input file and resolve every data row into zero or one `WorkItem`.
/// A UTF-8 BOM is stripped transparently. Structural problems (unreadable
/// file, missing header, invalid mandatory column) are fatal; anything
/// row-level only warns and skips.
pub fn load_work_items(cfg: &RunConfig) -> Result<Vec<WorkItem>> {
    let raw = fs::read(&cfg.csv_file)
        .with_context(|| format!("reading input CSV {}", cfg.csv_file.display()))?;
    let body = raw.strip_prefix(UTF8_BOM).unwrap_or(&raw);

    let first_line = body.split(|&b| b == b'\n').next().unwrap_or_default();
    if first_line.is_empty() || first_line == b"\r".as_slice() {
        bail!(
            "input CSV {} is empty or has no header",
            cfg.csv_file.display()
        );
    }

    collect_work_items(body, cfg)
}

/// Reader-generic core of `load_work_items`, so tests can feed byte slices.
pub fn collect_work_items<R: Read>(input: R, cfg: &RunConfig) -> Result<Vec<WorkItem>> {
    let reader = ReaderBuilder::new()
        .delimiter(cfg.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut records = reader.into_records();
    let header = match records.next() {
        Some(record) => record.context("reading CSV header")?,
        None => bail!("input CSV is empty or has no header"),
    };
    debug!("CSV header: {header:?}");

    let prompt_idx = resolve_required(&cfg.prompt_column, &header, "prompt")?;
    info!(
        "extracting prompts from column `{}` (index {prompt_idx})",
        &header[prompt_idx]
    );

    let duration_idx = cfg
        .duration_column
        .as_deref()
        .and_then(|raw| resolve_optional(raw, &header, "duration", "--duration"));
    let influence_idx = cfg
        .influence_column
        .as_deref()
        .and_then(|raw| resolve_optional(raw, &header, "influence", "--prompt-influence"));

    let mut items = Vec::new();
    for (i, record) in records.enumerate() {
        let row = i + 2; // 1-based, header counted as row 1
        let record = record.with_context(|| format!("reading CSV row {row}"))?;

        if record.is_empty() {
            warn!("skipping empty row {row}");
            continue;
        }
        if record.len() <= prompt_idx {
            warn!(
                "skipping malformed row {row} (expected at least {} columns, found {})",
                prompt_idx + 1,
                record.len()
            );
            continue;
        }

        let text = strip_quote_pair(&record[prompt_idx]);
        if text.is_empty() {
            warn!(
                "skipping row {row} due to empty prompt in column `{}`",
                &header[prompt_idx]
            );
            continue;
        }

        let duration = row_value(
            &record,
            duration_idx,
            &header,
            row,
            "duration",
            &DURATION_RANGE,
            cfg.duration,
        );
        let influence = row_value(
            &record,
            influence_idx,
            &header,
            row,
            "influence",
            &INFLUENCE_RANGE,
            cfg.influence,
        );

        items.push(WorkItem {
            text: text.to_string(),
            source_row: row,
            duration,
            influence,
        });
    }

    Ok(items)
}

/// Apply `resolve_override` for one row and column, logging any issue with
/// its row context. Absent column means the global default for every row.
fn row_value(
    record: &StringRecord,
    idx: Option<usize>,
    header: &StringRecord,
    row: usize,
    role: &str,
    range: &RangeInclusive<f64>,
    fallback: f64,
) -> f64 {
    let Some(idx) = idx else {
        return fallback;
    };

    let column = &header[idx];
    let cell = record.get(idx);
    let (value, issue) = resolve_override(cell, range, fallback);
    match issue {
        None => {
            if cell.is_some_and(|raw| !raw.trim().is_empty()) {
                debug!("row {row}: using {role} from CSV: {value}");
            }
        }
        Some(OverrideIssue::MissingCell) => {
            warn!("row {row}: {role} column `{column}` missing; using global {role}: {fallback}")
        }
        Some(OverrideIssue::Unparseable(raw)) => warn!(
            "row {row}: invalid {role} value `{raw}` in CSV column `{column}`; \
             using global {role}: {fallback}"
        ),
        Some(OverrideIssue::OutOfRange(bad)) => warn!(
            "row {row}: {role} `{bad}` from CSV column `{column}` is out of range \
             ({}-{}); using global {role}: {fallback}",
            range.start(),
            range.end()
        ),
    }
    value
}

/// Strip one surrounding pair of double quotes, if present.
fn strip_quote_pair(raw: &str) -> &str {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}
