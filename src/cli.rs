use clap::Parser;
use std::path::PathBuf;

/// Batch sound-effect generation from a delimited file of prompts, one
/// ElevenLabs API call per row.
#[derive(Parser, Debug)]
#[command(name = "sfx-batch", version, about, max_term_width = 100)]
pub struct CliArgs {
    /// Path to the input CSV file (semicolon-delimited, UTF-8).
    pub csv_file: PathBuf,

    /// Name or 0-based index of the CSV column containing text prompts.
    #[arg(short = 'p', long)]
    pub prompt_column: String,

    /// Delimiter character used in the CSV file.
    #[arg(long, default_value = ";", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Name or 0-based index of a CSV column with per-prompt duration in
    /// seconds; overrides the global --duration per row.
    #[arg(long)]
    pub duration_column: Option<String>,

    /// Name or 0-based index of a CSV column with per-prompt influence;
    /// overrides the global --prompt-influence per row.
    #[arg(long)]
    pub influence_column: Option<String>,

    /// ElevenLabs API key; overrides the ELEVENLABS_API_KEY environment
    /// variable.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Directory to save the generated MP3 files into.
    #[arg(short = 'o', long, default_value = "./sfx_output/")]
    pub output_dir: PathBuf,

    /// Duration of each sound effect in seconds (0.5-22.0).
    #[arg(short = 'd', long, default_value_t = 5.0, value_parser = parse_duration)]
    pub duration: f64,

    /// Influence of the prompt on the generation (0.0-1.0).
    #[arg(short = 'i', long, default_value_t = 0.3, value_parser = parse_influence)]
    pub prompt_influence: f64,

    /// Maximum number of retry attempts for API calls (0-10).
    #[arg(short = 'r', long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(0..=10))]
    pub max_retries: u32,

    /// Verbose progress logging.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Debug-level logging for troubleshooting.
    #[arg(long)]
    pub debug: bool,
}

fn parse_delimiter(raw: &str) -> Result<u8, String> {
    match raw.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(format!("delimiter must be a single character, got `{raw}`")),
    }
}

fn parse_duration(raw: &str) -> Result<f64, String> {
    parse_bounded(raw, 0.5, 22.0)
}

fn parse_influence(raw: &str) -> Result<f64, String> {
    parse_bounded(raw, 0.0, 1.0)
}

fn parse_bounded(raw: &str, min: f64, max: f64) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in range {min}-{max}"))
    }
}
