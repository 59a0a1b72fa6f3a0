//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{IaiError, Result};

/// Full inventory configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub scan: ScanConfig,
    pub report: ReportConfig,
}

/// Scan root and progress reporting knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScanConfig {
    /// Root of the archive subtree to inventory.
    pub root_path: PathBuf,
    /// Progress report cadence in visited folders; 0 disables.
    pub progress_every: u64,
}

/// Report output location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory under which the timestamped report directory is created.
    pub output_dir: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("."),
            progress_every: 100,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[IAI-CONFIG] WARNING: HOME not set, falling back to /tmp for config path"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        home_dir.join(".config").join("iai").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| IaiError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(IaiError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides();
        cfg.normalize_paths();
        cfg.validate()?;
        Ok(cfg)
    }

    /// The only environment-driven inputs are the two paths.
    fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|name| env::var(name).ok());
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("IAI_ROOT").filter(|raw| !raw.trim().is_empty()) {
            self.scan.root_path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("IAI_OUTPUT_DIR").filter(|raw| !raw.trim().is_empty()) {
            self.report.output_dir = PathBuf::from(raw);
        }
    }

    /// Normalize paths for consistent comparison.
    fn normalize_paths(&mut self) {
        for path in [&mut self.scan.root_path, &mut self.report.output_dir] {
            let s = path.to_string_lossy();
            if s.len() > 1
                && let Some(stripped) = s.strip_suffix('/')
            {
                *path = PathBuf::from(stripped);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.scan.root_path.as_os_str().is_empty() {
            return Err(IaiError::InvalidConfig {
                details: "scan.root_path must not be empty".to_string(),
            });
        }
        if self.report.output_dir.as_os_str().is_empty() {
            return Err(IaiError::InvalidConfig {
                details: "report.output_dir must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, IaiError};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn default_paths_are_current_dir() {
        let cfg = Config::default();
        assert_eq!(cfg.scan.root_path, PathBuf::from("."));
        assert_eq!(cfg.report.output_dir, PathBuf::from("."));
        assert_eq!(cfg.scan.progress_every, 100);
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let result = Config::load(Some(Path::new("/nonexistent/iai/config.toml")));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, IaiError::MissingConfig { .. }));
    }

    #[test]
    fn load_parses_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(
            &cfg_path,
            r#"
[scan]
root_path = "/data/archive"
progress_every = 250

[report]
output_dir = "/data/reports"
"#,
        )
        .unwrap();

        let cfg = Config::load(Some(&cfg_path)).expect("config should load");
        assert_eq!(cfg.scan.root_path, PathBuf::from("/data/archive"));
        assert_eq!(cfg.scan.progress_every, 250);
        assert_eq!(cfg.report.output_dir, PathBuf::from("/data/reports"));
    }

    #[test]
    fn load_applies_section_defaults_for_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(&cfg_path, "[scan]\nroot_path = \"/data/archive\"\n").unwrap();

        let cfg = Config::load(Some(&cfg_path)).expect("config should load");
        assert_eq!(cfg.scan.root_path, PathBuf::from("/data/archive"));
        assert_eq!(cfg.scan.progress_every, 100);
        assert_eq!(cfg.report.output_dir, PathBuf::from("."));
    }

    #[test]
    fn load_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(&cfg_path, "= not toml").unwrap();

        let err = Config::load(Some(&cfg_path)).unwrap_err();
        assert!(matches!(err, IaiError::ConfigParse { .. }));
    }

    #[test]
    fn env_overrides_set_both_paths() {
        let mut cfg = Config::default();
        let overrides = vars(&[
            ("IAI_ROOT", "/mnt/storage/Human"),
            ("IAI_OUTPUT_DIR", "/mnt/storage/reports"),
        ]);

        cfg.apply_env_overrides_from(|name| overrides.get(name).cloned());

        assert_eq!(cfg.scan.root_path, PathBuf::from("/mnt/storage/Human"));
        assert_eq!(cfg.report.output_dir, PathBuf::from("/mnt/storage/reports"));
    }

    #[test]
    fn env_overrides_ignore_blank_values() {
        let mut cfg = Config::default();
        let overrides = vars(&[("IAI_ROOT", "   "), ("IAI_OUTPUT_DIR", "")]);

        cfg.apply_env_overrides_from(|name| overrides.get(name).cloned());

        assert_eq!(cfg.scan.root_path, PathBuf::from("."));
        assert_eq!(cfg.report.output_dir, PathBuf::from("."));
    }

    #[test]
    fn env_overrides_ignore_unrelated_names() {
        let mut cfg = Config::default();
        let overrides = vars(&[("IAI_PROGRESS_EVERY", "5")]);

        cfg.apply_env_overrides_from(|name| overrides.get(name).cloned());

        assert_eq!(cfg.scan.progress_every, 100);
    }

    #[test]
    fn normalize_paths_trims_trailing_slashes_and_keeps_root() {
        let mut cfg = Config::default();
        cfg.scan.root_path = PathBuf::from("/data/archive/");
        cfg.report.output_dir = PathBuf::from("/");

        cfg.normalize_paths();

        assert_eq!(cfg.scan.root_path, PathBuf::from("/data/archive"));
        assert_eq!(cfg.report.output_dir, PathBuf::from("/"));
    }

    #[test]
    fn validate_rejects_empty_root() {
        let mut cfg = Config::default();
        cfg.scan.root_path = PathBuf::new();
        let err = cfg.validate().expect_err("expected invalid config");
        match err {
            IaiError::InvalidConfig { details } => {
                assert!(details.contains("root_path"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn config_round_trips_through_toml() {
        let cfg = Config::default();
        let raw = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&raw).expect("parse");
        assert_eq!(cfg, parsed);
    }
}
