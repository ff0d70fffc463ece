//! Configuration loading

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use stepwise_core::{NamingConfig, PulseSettings};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub guide: GuideConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Scene manifest (.json or .toml)
    #[serde(default = "default_manifest")]
    pub manifest: String,
    /// Name of the model root node below the scene root
    #[serde(default = "default_root")]
    pub root: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            root: default_root(),
        }
    }
}

fn default_manifest() -> String {
    "./scene.json".to_string()
}

fn default_root() -> String {
    "Model".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Pulse update period in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(flatten)]
    pub pulse: PulseSettings,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            pulse: PulseSettings::default(),
        }
    }
}

fn default_tick_ms() -> u64 {
    16 // ~60 Hz
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuideConfig {
    /// Per-step instruction text; index 0 is the exploded view
    #[serde(default)]
    pub step_texts: Vec<String>,
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let config = Config {
        guide: GuideConfig {
            step_texts: vec![
                "Step 0:\nReview the parts grouped by type before you start assembling.".to_string(),
                "Step 1:\nStand the side panels upright.".to_string(),
            ],
        },
        ..Config::default()
    };

    let content = toml::to_string_pretty(&config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[model]
manifest = "cabinet.toml"

[naming]
step_prefix = "Paso"
anchors_path = "Anclajes"

[highlight]
gain = 2.0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.model.manifest, "cabinet.toml");
        assert_eq!(config.model.root, "Model");
        assert_eq!(config.naming.step_prefix, "Paso");
        assert_eq!(config.naming.anchors_path, "Anclajes");
        assert_eq!(config.naming.anchor_prefix, "Anchor_");
        assert_eq!(config.highlight.tick_ms, 16);
        assert_eq!(config.highlight.pulse.gain, 2.0);
        assert_eq!(config.highlight.pulse.speed, 4.0);
        assert!(config.guide.step_texts.is_empty());
    }

    #[test]
    fn test_default_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stepwise.toml");

        save_default_config(&path).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.guide.step_texts.len(), 2);
        assert_eq!(config.naming, NamingConfig::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.model.root, "Model");
    }
}
