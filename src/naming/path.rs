use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::warn;

const MAX_SEQUENTIAL_ATTEMPTS: u32 = 1000;

/// Find a non-colliding output path for `stem` under `dir` by appending a
/// sequential counter: `stem.ext`, `stem_1.ext`, `stem_2.ext`, ...
///
/// After 1000 collisions the sequential scheme is abandoned for an 8-hex
/// random suffix, returned without an existence re-check. This only computes
/// a path and never creates the file, so there is no race-free guarantee;
/// acceptable for a single-process batch tool.
pub fn unique_output_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let mut path = dir.join(format!("{stem}{extension}"));
    let mut counter: u32 = 1;

    while path.exists() {
        path = dir.join(format!("{stem}_{counter}{extension}"));
        counter += 1;
        if counter > MAX_SEQUENTIAL_ATTEMPTS {
            warn!(
                "more than {MAX_SEQUENTIAL_ATTEMPTS} filename collisions for `{stem}` in {}; \
                 falling back to a random suffix",
                dir.display()
            );
            let suffix: u32 = rand::thread_rng().gen();
            path = dir.join(format!("{stem}_{suffix:08x}{extension}"));
            break;
        }
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn first_candidate_when_nothing_exists() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = unique_output_path(dir.path(), "unique_sound", ".mp3");
        assert_eq!(path, dir.path().join("unique_sound.mp3"));
        Ok(())
    }

    #[test]
    fn sequential_counter_on_collisions() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        for expected in ["test_sound.mp3", "test_sound_1.mp3", "test_sound_2.mp3"] {
            let path = unique_output_path(dir.path(), "test_sound", ".mp3");
            assert_eq!(path, dir.path().join(expected));
            File::create(&path)?;
        }
        Ok(())
    }

    #[test]
    fn respects_the_extension() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = unique_output_path(dir.path(), "sound", ".wav");
        assert_eq!(path, dir.path().join("sound.wav"));
        File::create(&path)?;
        let collided = unique_output_path(dir.path(), "sound", ".wav");
        assert_eq!(collided, dir.path().join("sound_1.wav"));
        Ok(())
    }

    #[test]
    fn random_suffix_after_collision_threshold() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        File::create(dir.path().join("jam.mp3"))?;
        for i in 1..=1000 {
            File::create(dir.path().join(format!("jam_{i}.mp3")))?;
        }

        let path = unique_output_path(dir.path(), "jam", ".mp3");
        let name = path.file_name().unwrap().to_str().unwrap();
        let suffix = name
            .strip_prefix("jam_")
            .and_then(|rest| rest.strip_suffix(".mp3"))
            .unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.bytes().all(|b| b.is_ascii_hexdigit()));
        // best-effort: the fallback path is not existence-checked or created
        assert!(!path.exists());
        Ok(())
    }
}
