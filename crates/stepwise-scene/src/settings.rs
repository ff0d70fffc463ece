//! Assembly settings resource
//!
//! Reads the same `stepwise.toml` as the terminal binary; sections the
//! scene does not use are ignored.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use stepwise_core::{NamingConfig, PulseSettings};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// What to look for in the scene and how to present it
#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
pub struct AssemblySettings {
    /// Name of the model root entity
    pub root: String,
    pub naming: NamingConfig,
    pub pulse: PulseSettings,
    /// Per-step instruction text; index 0 is the exploded view
    pub step_texts: Vec<String>,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            root: default_root(),
            naming: NamingConfig::default(),
            pulse: PulseSettings::default(),
            step_texts: Vec::new(),
        }
    }
}

fn default_root() -> String {
    "Model".to_string()
}

#[derive(Deserialize, Default)]
struct SettingsFile {
    #[serde(default)]
    model: ModelSection,
    #[serde(default)]
    naming: NamingConfig,
    #[serde(default)]
    highlight: PulseSettings,
    #[serde(default)]
    guide: GuideSection,
}

#[derive(Deserialize)]
struct ModelSection {
    #[serde(default = "default_root")]
    root: String,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self { root: default_root() }
    }
}

#[derive(Deserialize, Default)]
struct GuideSection {
    #[serde(default)]
    step_texts: Vec<String>,
}

impl AssemblySettings {
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let file: SettingsFile = toml::from_str(content)?;
        Ok(Self {
            root: file.model.root,
            naming: file.naming,
            pulse: file.highlight,
            step_texts: file.guide.step_texts,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_shared_config_file() {
        let toml = r#"
[model]
manifest = "scene.json"
root = "Wardrobe"

[naming]
step_prefix = "Paso"

[highlight]
tick_ms = 20
gain = 1.5

[guide]
step_texts = ["Sort the parts"]
"#;
        let settings = AssemblySettings::from_toml(toml).unwrap();
        assert_eq!(settings.root, "Wardrobe");
        assert_eq!(settings.naming.step_prefix, "Paso");
        assert_eq!(settings.naming.anchors_path, "Anchors");
        assert_eq!(settings.pulse.gain, 1.5);
        assert_eq!(settings.pulse.speed, 4.0);
        assert_eq!(settings.step_texts, vec!["Sort the parts".to_string()]);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = AssemblySettings::from_toml("").unwrap();
        assert_eq!(settings.root, "Model");
        assert_eq!(settings.pulse, PulseSettings::default());
    }
}
