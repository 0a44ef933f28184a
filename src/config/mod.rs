//! Configuration for Codesight
//!
//! Settings come from, lowest priority first:
//! - built-in defaults
//! - the user file (`~/.config/codesight/config.toml`)
//! - the project file (`<root>/codesight.toml`)
//! - environment variables (`CODESIGHT_AI_BACKEND`, `CODESIGHT_AI_MODEL`)
//!
//! Files are merged table by table, so a project file only needs the keys it
//! changes. A file that fails to load is logged and skipped.
//!
//! ```toml
//! [detectors]
//! profile = "review"
//! long_function_medium = 30
//! disabled = ["todo-scanner"]
//!
//! [scoring]
//! security_multiplier = 2.0
//!
//! [ai]
//! enabled = true
//! backend = "ollama"
//! ```

use crate::ai::{AiConfig, AiError, LlmBackend};
use crate::detectors::{DetectorConfig, ScanProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Project config file name
pub const PROJECT_CONFIG_FILE: &str = "codesight.toml";

/// Errors from reading a config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodesightConfig {
    pub detectors: DetectorSettings,
    pub scoring: ScoringConfig,
    pub ai: AiSettings,
    pub watch: WatchConfig,
}

/// Detector thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub profile: ScanProfile,
    pub long_function_medium: usize,
    pub long_function_high: usize,
    pub complexity_medium: usize,
    pub complexity_high: usize,
    pub max_params: usize,
    pub duplicate_window: usize,
    pub duplicate_min_length: usize,
    pub review_min_length: usize,
    pub review_min_occurrences: usize,
    pub magic_number_allow: Vec<u64>,
    /// Detector names to skip
    pub disabled: Vec<String>,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            profile: ScanProfile::Standard,
            long_function_medium: 20,
            long_function_high: 50,
            complexity_medium: 5,
            complexity_high: 10,
            max_params: 5,
            duplicate_window: 20,
            duplicate_min_length: 10,
            review_min_length: 20,
            review_min_occurrences: 3,
            magic_number_allow: vec![0, 1, 2, 10, 100, 1000],
            disabled: Vec::new(),
        }
    }
}

/// Scoring customization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Multiplier applied to security findings in the security score only
    pub security_multiplier: f64,
    pub thresholds: RecommendationThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            security_multiplier: 1.5,
            thresholds: RecommendationThresholds::default(),
        }
    }
}

/// Scores below these produce recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    /// Applies to every category
    pub quality: u32,
    pub security: u32,
    pub testing: u32,
    pub documentation: u32,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            quality: 80,
            security: 90,
            testing: 70,
            documentation: 60,
        }
    }
}

/// AI augmentation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub enabled: bool,
    pub backend: String,
    pub model: Option<String>,
    pub sample_chars: usize,
    pub timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: "anthropic".to_string(),
            model: None,
            sample_chars: 2000,
            timeout_secs: 30,
        }
    }
}

impl AiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Client configuration for the configured backend
    pub fn client_config(&self) -> Result<AiConfig, AiError> {
        let backend: LlmBackend = self.backend.parse()?;
        Ok(AiConfig {
            backend,
            model: self.model.clone(),
            timeout: self.timeout(),
            ..Default::default()
        })
    }
}

/// Watch mode settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period before a changed file is re-analysed
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 2000 }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl CodesightConfig {
    /// Load the full layered configuration for a project root
    pub fn load(root: &Path) -> Self {
        let user = user_config_path();
        let mut config = Self::load_files(user.as_deref(), &root.join(PROJECT_CONFIG_FILE));
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Merge the given files over the defaults, skipping missing or broken ones
    pub fn load_files(user: Option<&Path>, project: &Path) -> Self {
        let mut merged = toml::Value::Table(toml::value::Table::new());
        for path in user.into_iter().chain(std::iter::once(project)) {
            if !path.exists() {
                continue;
            }
            match read_table(path) {
                Ok(layer) => {
                    debug!("Loaded config from {}", path.display());
                    merge_tables(&mut merged, layer);
                }
                Err(e) => warn!("{}", e),
            }
        }

        match merged.try_into::<CodesightConfig>() {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config with invalid values: {}", e);
                Self::default()
            }
        }
    }

    /// Parse a single TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("CODESIGHT_AI_BACKEND").filter(|v| !v.trim().is_empty()) {
            self.ai.backend = backend.trim().to_string();
        }
        if let Some(model) = lookup("CODESIGHT_AI_MODEL").filter(|v| !v.trim().is_empty()) {
            self.ai.model = Some(model.trim().to_string());
        }
    }

    /// Detector options in the shape the detectors read them
    pub fn to_detector_config(&self) -> DetectorConfig {
        let d = &self.detectors;
        DetectorConfig::new()
            .with_profile(d.profile)
            .with_option("long_function_medium", d.long_function_medium.into())
            .with_option("long_function_high", d.long_function_high.into())
            .with_option("complexity_medium", d.complexity_medium.into())
            .with_option("complexity_high", d.complexity_high.into())
            .with_option("max_params", d.max_params.into())
            .with_option("duplicate_window", d.duplicate_window.into())
            .with_option("duplicate_min_length", d.duplicate_min_length.into())
            .with_option("review_min_length", d.review_min_length.into())
            .with_option("review_min_occurrences", d.review_min_occurrences.into())
            .with_option("magic_number_allow", d.magic_number_allow.clone().into())
    }
}

/// User config file location
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("codesight").join("config.toml"))
}

fn read_table(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    content.parse::<toml::Table>()
        .map(toml::Value::Table)
        .map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
}

/// Deep-merge `overlay` into `base`; tables merge, everything else replaces
fn merge_tables(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_tables(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Commented default project file written by `codesight init`
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Codesight configuration

[detectors]
# "standard": duplicates within 20 lines; "review": file-wide, 3+ copies
profile = "standard"
long_function_medium = 20
long_function_high = 50
complexity_medium = 5
complexity_high = 10
max_params = 5
duplicate_window = 20
duplicate_min_length = 10
review_min_length = 20
review_min_occurrences = 3
magic_number_allow = [0, 1, 2, 10, 100, 1000]
# Detector names to skip, e.g. ["todo-scanner", "magic-numbers"]
disabled = []

[scoring]
# Applied to the security score only
security_multiplier = 1.5

[scoring.thresholds]
quality = 80
security = 90
testing = 70
documentation = 60

[ai]
# Requires the backend's API key in the environment (not needed for ollama)
enabled = false
backend = "anthropic"
# model = "claude-sonnet-4-20250514"
sample_chars = 2000
timeout_secs = 30

[watch]
debounce_ms = 2000
"#;

/// Write the default project file; refuses to overwrite unless `force`
pub fn init_project_config(root: &Path, force: bool) -> anyhow::Result<PathBuf> {
    let path = root.join(PROJECT_CONFIG_FILE);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = CodesightConfig::default();
        assert_eq!(config.detectors.long_function_medium, 20);
        assert_eq!(config.scoring.security_multiplier, 1.5);
        assert_eq!(config.scoring.thresholds.documentation, 60);
        assert!(!config.ai.enabled);
        assert_eq!(config.watch.debounce(), Duration::from_millis(2000));
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config = CodesightConfig::from_toml_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, CodesightConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let config = CodesightConfig::from_toml_str(
            "[detectors]\nprofile = \"review\"\ndisabled = [\"todo-scanner\"]\n",
        )
        .unwrap();
        assert_eq!(config.detectors.profile, ScanProfile::Review);
        assert_eq!(config.detectors.disabled, vec!["todo-scanner"]);
        assert_eq!(config.detectors.max_params, 5);
    }

    #[test]
    fn test_project_overrides_user_per_key() {
        let dir = tempdir().unwrap();
        let user = dir.path().join("user.toml");
        let project = dir.path().join(PROJECT_CONFIG_FILE);
        std::fs::write(&user, "[detectors]\nmax_params = 7\ncomplexity_high = 12\n").unwrap();
        std::fs::write(&project, "[detectors]\nmax_params = 4\n").unwrap();

        let config = CodesightConfig::load_files(Some(&user), &project);
        assert_eq!(config.detectors.max_params, 4);
        assert_eq!(config.detectors.complexity_high, 12);
    }

    #[test]
    fn test_broken_file_is_skipped() {
        let dir = tempdir().unwrap();
        let project = dir.path().join(PROJECT_CONFIG_FILE);
        std::fs::write(&project, "[detectors\nmax_params = ").unwrap();
        let config = CodesightConfig::load_files(None, &project);
        assert_eq!(config, CodesightConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = CodesightConfig::default();
        config.apply_env(|key| match key {
            "CODESIGHT_AI_BACKEND" => Some("ollama".to_string()),
            "CODESIGHT_AI_MODEL" => Some("llama3".to_string()),
            _ => None,
        });
        assert_eq!(config.ai.backend, "ollama");
        let client = config.ai.client_config().unwrap();
        assert_eq!(client.backend, LlmBackend::Ollama);
        assert_eq!(client.model(), "llama3");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let settings = AiSettings {
            backend: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        assert!(settings.client_config().is_err());
    }

    #[test]
    fn test_detector_config_options() {
        let mut config = CodesightConfig::default();
        config.detectors.long_function_high = 80;
        let detector_config = config.to_detector_config();
        assert_eq!(detector_config.get_option_or("long_function_high", 0usize), 80);
        assert_eq!(
            detector_config.get_option_or::<Vec<u64>>("magic_number_allow", vec![]),
            vec![0, 1, 2, 10, 100, 1000]
        );
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = init_project_config(dir.path(), false).unwrap();
        assert!(path.exists());
        assert!(init_project_config(dir.path(), false).is_err());
        assert!(init_project_config(dir.path(), true).is_ok());
    }
}
