use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::CliArgs;

pub const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Immutable snapshot of everything a run needs. Built once at startup,
/// read-only thereafter.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub csv_file: PathBuf,
    pub prompt_column: String,
    pub duration_column: Option<String>,
    pub influence_column: Option<String>,
    pub delimiter: u8,
    pub output_dir: PathBuf,
    pub duration: f64,
    pub influence: f64,
    pub max_retries: u32,
    pub api_key: String,
}

impl RunConfig {
    /// Snapshot the CLI arguments, resolving the API key from the argument,
    /// the environment, or a `.env` file loaded earlier (in that order).
    /// A missing key is a fatal setup error.
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let api_key = resolve_api_key(args.api_key.as_deref()).ok_or_else(|| {
            anyhow!(
                "ElevenLabs API key not found; set the {API_KEY_ENV} environment variable \
                 or pass --api-key"
            )
        })?;

        Ok(Self {
            csv_file: args.csv_file,
            prompt_column: args.prompt_column,
            duration_column: args.duration_column,
            influence_column: args.influence_column,
            delimiter: args.delimiter,
            output_dir: args.output_dir,
            duration: args.duration,
            influence: args.prompt_influence,
            max_retries: args.max_retries,
            api_key,
        })
    }
}

fn resolve_api_key(explicit: Option<&str>) -> Option<String> {
    if let Some(key) = explicit {
        debug!("using API key from --api-key argument");
        return Some(key.to_string());
    }

    match env::var(API_KEY_ENV) {
        Ok(key) if !key.is_empty() => {
            debug!("using API key from {API_KEY_ENV} environment variable");
            Some(key)
        }
        _ => None,
    }
}
