use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::client::SoundGenerator;
use crate::config::RunConfig;
use crate::naming::{sanitize_filename, unique_output_path};
use crate::rows::{load_work_items, WorkItem};

pub const OUTPUT_EXTENSION: &str = ".mp3";

/// Success/failure counters for one run, owned by the batch loop and
/// reported at the end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunTally {
    pub generated: u64,
    pub failed: u64,
}

/// Drive one whole run: validate the output directory, load the work queue,
/// process it strictly in input order, and report the tally. Setup problems
/// surface as errors; per-item failures only move the tally.
pub fn run(cfg: &RunConfig, generator: &dyn SoundGenerator) -> Result<RunTally> {
    fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("creating output directory {}", cfg.output_dir.display()))?;
    info!("output directory: {}", cfg.output_dir.display());

    log_run_parameters(cfg);

    let items = load_work_items(cfg)?;
    if items.is_empty() {
        info!("no valid prompts found in the CSV file");
        return Ok(RunTally::default());
    }
    info!("found {} prompts to process", items.len());

    let tally = process_items(&items, generator, &cfg.output_dir);
    report(&tally);
    Ok(tally)
}

fn log_run_parameters(cfg: &RunConfig) {
    info!("prompt column specified: {}", cfg.prompt_column);
    info!("CSV delimiter: `{}`", cfg.delimiter as char);
    match &cfg.duration_column {
        Some(column) => info!(
            "duration column specified: {column} (global --duration {}s is the fallback)",
            cfg.duration
        ),
        None => info!(
            "global sound effect duration: {}s (no per-prompt duration column)",
            cfg.duration
        ),
    }
    match &cfg.influence_column {
        Some(column) => info!(
            "influence column specified: {column} (global --prompt-influence {} is the fallback)",
            cfg.influence
        ),
        None => info!(
            "global prompt influence: {} (no per-prompt influence column)",
            cfg.influence
        ),
    }
    info!("max retries for API calls: {}", cfg.max_retries);
}

/// Process resolved work items in input order, one blocking generation call
/// each. A single failure never aborts the batch.
pub fn process_items(
    items: &[WorkItem],
    generator: &dyn SoundGenerator,
    output_dir: &Path,
) -> RunTally {
    let mut tally = RunTally::default();

    for item in items {
        info!(
            "processing prompt from CSV row {}: '{}' (duration: {}s, influence: {})",
            item.source_row,
            snippet(&item.text),
            item.duration,
            item.influence
        );

        match generator.generate(&item.text, item.duration, item.influence) {
            Ok(bytes) => {
                let stem = sanitize_filename(&item.text);
                let path = unique_output_path(output_dir, &stem, OUTPUT_EXTENSION);
                match fs::write(&path, &bytes) {
                    Ok(()) => {
                        info!("saved: {}", path.display());
                        tally.generated += 1;
                    }
                    Err(err) => {
                        error!(
                            "failed to write {} for prompt from row {} ('{}'): {err}",
                            path.display(),
                            item.source_row,
                            item.text
                        );
                        tally.failed += 1;
                    }
                }
            }
            Err(err) => {
                error!(
                    "{} error for prompt from row {} ('{}'): {err}",
                    err.category(),
                    item.source_row,
                    item.text
                );
                tally.failed += 1;
            }
        }
    }

    tally
}

fn report(tally: &RunTally) {
    info!("--- batch processing summary ---");
    info!("successfully generated {} sound effects", tally.generated);
    info!("failed to generate {} sound effects", tally.failed);
}

/// First 50 chars of the prompt for progress lines; full text stays in the
/// per-item error context.
fn snippet(text: &str) -> String {
    const MAX_CHARS: usize = 50;
    if text.chars().count() > MAX_CHARS {
        let head: String = text.chars().take(MAX_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SfxError;
    use std::path::PathBuf;

    /// Scripted collaborator: fixed bytes for every prompt, except prompts
    /// containing a configured needle, which fail with a scripted category.
    struct ScriptedGenerator {
        bytes: &'static [u8],
        fail_needle: Option<&'static str>,
        fail_with: fn() -> SfxError,
    }

    impl ScriptedGenerator {
        fn ok() -> Self {
            Self {
                bytes: b"mock_audio",
                fail_needle: None,
                fail_with: || SfxError::Generation("unused".to_string()),
            }
        }

        fn failing_on(needle: &'static str, fail_with: fn() -> SfxError) -> Self {
            Self {
                bytes: b"mock_audio",
                fail_needle: Some(needle),
                fail_with,
            }
        }
    }

    impl SoundGenerator for ScriptedGenerator {
        fn generate(
            &self,
            text: &str,
            _duration_seconds: f64,
            _prompt_influence: f64,
        ) -> Result<Vec<u8>, SfxError> {
            match self.fail_needle {
                Some(needle) if text.contains(needle) => Err((self.fail_with)()),
                _ => Ok(self.bytes.to_vec()),
            }
        }
    }

    fn item(text: &str, row: usize) -> WorkItem {
        WorkItem {
            text: text.to_string(),
            source_row: row,
            duration: 5.0,
            influence: 0.3,
        }
    }

    fn cfg(csv_file: PathBuf, output_dir: PathBuf) -> RunConfig {
        RunConfig {
            csv_file,
            prompt_column: "text".to_string(),
            duration_column: None,
            influence_column: None,
            delimiter: b';',
            output_dir,
            duration: 5.0,
            influence: 0.3,
            max_retries: 3,
            api_key: "test_key".to_string(),
        }
    }

    #[test]
    fn every_item_lands_in_its_own_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let items = vec![item("A", 2), item("B", 3)];

        let tally = process_items(&items, &ScriptedGenerator::ok(), dir.path());

        assert_eq!(tally, RunTally { generated: 2, failed: 0 });
        assert_eq!(fs::read(dir.path().join("a.mp3"))?, b"mock_audio");
        assert_eq!(fs::read(dir.path().join("b.mp3"))?, b"mock_audio");
        Ok(())
    }

    #[test]
    fn duplicate_prompts_get_collision_suffixes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let items = vec![item("same prompt", 2), item("same prompt", 3)];

        let tally = process_items(&items, &ScriptedGenerator::ok(), dir.path());

        assert_eq!(tally.generated, 2);
        assert!(dir.path().join("same_prompt.mp3").exists());
        assert!(dir.path().join("same_prompt_1.mp3").exists());
        Ok(())
    }

    #[test]
    fn one_failure_never_aborts_the_batch() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let items = vec![item("A", 2), item("rate limited prompt", 3), item("C", 4)];
        let generator = ScriptedGenerator::failing_on("rate limited", || {
            SfxError::RateLimit("quota exhausted".to_string())
        });

        let tally = process_items(&items, &generator, dir.path());

        assert_eq!(tally, RunTally { generated: 2, failed: 1 });
        assert!(dir.path().join("a.mp3").exists());
        assert!(dir.path().join("c.mp3").exists());
        assert!(!dir.path().join("rate_limited_prompt.mp3").exists());
        Ok(())
    }

    #[test]
    fn every_failure_category_is_survivable() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let failures: Vec<fn() -> SfxError> = vec![
            || SfxError::ApiKey("bad key".to_string()),
            || SfxError::RateLimit("slow down".to_string()),
            || SfxError::Parameter("bad duration".to_string()),
            || SfxError::Generation("model error".to_string()),
        ];

        for fail_with in failures {
            let generator = ScriptedGenerator::failing_on("boom", fail_with);
            let tally = process_items(&[item("boom", 2)], &generator, dir.path());
            assert_eq!(tally, RunTally { generated: 0, failed: 1 });
        }
        Ok(())
    }

    #[test]
    fn end_to_end_run_from_a_csv() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let csv_file = dir.path().join("prompts.csv");
        fs::write(&csv_file, "text;notes\nA;x\nB;y\n")?;
        let output_dir = dir.path().join("sfx_output");

        let tally = run(
            &cfg(csv_file, output_dir.clone()),
            &ScriptedGenerator::ok(),
        )?;

        assert_eq!(tally, RunTally { generated: 2, failed: 0 });
        assert!(output_dir.join("a.mp3").exists());
        assert!(output_dir.join("b.mp3").exists());
        Ok(())
    }

    #[test]
    fn rate_limited_row_counts_as_failed_but_run_succeeds() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let csv_file = dir.path().join("prompts.csv");
        fs::write(&csv_file, "text\nA\nB\n")?;
        let output_dir = dir.path().join("sfx_output");
        let generator = ScriptedGenerator::failing_on("B", || {
            SfxError::RateLimit("quota exhausted".to_string())
        });

        let tally = run(&cfg(csv_file, output_dir.clone()), &generator)?;

        assert_eq!(tally, RunTally { generated: 1, failed: 1 });
        assert!(output_dir.join("a.mp3").exists());
        Ok(())
    }

    #[test]
    fn header_only_input_is_a_successful_empty_run() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let csv_file = dir.path().join("prompts.csv");
        fs::write(&csv_file, "text;notes\n")?;
        let output_dir = dir.path().join("sfx_output");

        let tally = run(&cfg(csv_file, output_dir.clone()), &ScriptedGenerator::ok())?;

        assert_eq!(tally, RunTally::default());
        // the output directory is still validated and created
        assert!(output_dir.is_dir());
        Ok(())
    }

    #[test]
    fn snippet_truncates_long_prompts() {
        assert_eq!(snippet("short"), "short");
        let long = "x".repeat(60);
        let shown = snippet(&long);
        assert_eq!(shown, format!("{}...", "x".repeat(50)));
    }
}
