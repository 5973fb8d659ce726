use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "tascar.toml";

/// User defaults for the command-line renderer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Fragment size in samples.
    pub fragsize: usize,
    /// Sample rate for renders without an input file.
    pub sample_rate: f64,
    /// Relative output paths are placed in this directory.
    pub output_dir: Option<PathBuf>,
    /// Write a `<output>.metrics.json` report next to every rendered file.
    pub write_metrics: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fragsize: 1024,
            sample_rate: 44100.0,
            output_dir: None,
            write_metrics: false,
        }
    }
}

impl RenderConfig {
    /// Load from the default path in the working directory.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<RenderConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    RenderConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                RenderConfig::default()
            }
        }
    }

    /// Save to an explicit path.
    #[cfg(test)]
    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    /// Resolve an output file name against `output_dir`.
    pub fn output_path(&self, path: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = RenderConfig::load_from_path(&dir.path().join("none.toml"));
        assert_eq!(cfg, RenderConfig::default());
    }

    #[test]
    fn malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tascar.toml");
        fs::write(&path, "fragsize = \"many\"").expect("writable");
        assert_eq!(RenderConfig::load_from_path(&path), RenderConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tascar.toml");
        let cfg = RenderConfig {
            fragsize: 256,
            output_dir: Some(dir.path().join("out")),
            ..RenderConfig::default()
        };
        cfg.save_to_path(&path).expect("save");
        let loaded = RenderConfig::load_from_path(&path);
        assert_eq!(loaded, cfg);
        assert_eq!(
            loaded.output_path(Path::new("a.wav")),
            dir.path().join("out").join("a.wav")
        );
        fs::write(&path, "write_metrics = true").expect("writable");
        let loaded = RenderConfig::load_from_path(&path);
        assert!(loaded.write_metrics);
        assert_eq!(loaded.fragsize, 1024);
    }
}
