use once_cell::sync::Lazy;
use regex::Regex;

/// Default cap on the sanitized stem, before the extension and any collision
/// suffix are appended.
pub const DEFAULT_MAX_LENGTH: usize = 150;

static ILLEGAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("valid regex"));
static NON_FILENAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w.]").expect("valid regex"));
static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").expect("valid regex"));

/// Turn a free-form prompt into a filesystem-safe, lowercase filename stem.
///
/// Spaces and shell-hostile characters become underscores, anything else that
/// is not alphanumeric, `_`, or `.` is dropped, and runs of underscores are
/// collapsed. Prompts that sanitize down to nothing get a fixed fallback stem.
pub fn sanitize_filename(prompt: &str) -> String {
    sanitize_filename_with_limit(prompt, DEFAULT_MAX_LENGTH)
}

pub fn sanitize_filename_with_limit(prompt: &str, max_length: usize) -> String {
    if prompt.is_empty() {
        return "unnamed_sfx".to_string();
    }

    let no_spaces = prompt.replace(' ', "_");
    let replaced = ILLEGAL.replace_all(&no_spaces, "_");
    let kept = NON_FILENAME.replace_all(&replaced, "");
    let lowered = kept.to_lowercase();
    let trimmed = lowered.trim_matches(|c: char| matches!(c, '_' | '.' | '-'));
    let collapsed = UNDERSCORE_RUNS.replace_all(trimmed, "_").into_owned();

    let mut stem = if collapsed.is_empty() {
        "generated_sfx".to_string()
    } else {
        collapsed
    };

    if stem.chars().count() > max_length {
        stem = truncate_stem(&stem, max_length);
        if stem.is_empty() {
            stem = "generated_sfx_truncated".to_string();
        }
    }

    stem
}

/// Truncate to `max_length` chars, cutting back to the last underscore
/// boundary only when one falls within the final 10 chars of the truncated
/// string, then re-trim stray separators from both ends.
fn truncate_stem(stem: &str, max_length: usize) -> String {
    let truncated: String = stem.chars().take(max_length).collect();

    let tail: String = truncated
        .chars()
        .skip(truncated.chars().count().saturating_sub(10))
        .collect();
    let cut = if tail.contains('_') {
        match truncated.rfind('_') {
            Some(pos) => &truncated[..pos],
            None => truncated.as_str(),
        }
    } else {
        truncated.as_str()
    };

    cut.trim_matches(|c: char| matches!(c, '_' | '.' | '-'))
        .to_string()
}
