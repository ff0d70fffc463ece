//! Node naming conventions
//!
//! Parts are tagged in the asset by name: `Step<N>_<Label>`, where `N` is
//! the assembly step and `Label` the material. Numbered duplicates
//! (`Leg1`, `Leg2`) collapse into the same material. Anchors and count
//! labels are found by conventional paths built from the material name.

use serde::{Deserialize, Serialize};

/// Naming conventions for parts, anchors, labels and step indicators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Prefix in front of the step number (e.g. "Step" in `Step3_Shelf`)
    #[serde(default = "default_step_prefix")]
    pub step_prefix: String,
    /// Container holding one anchor per material, relative to the scene root
    #[serde(default = "default_anchors_path")]
    pub anchors_path: String,
    /// Anchor node name prefix, followed by the material
    #[serde(default = "default_anchor_prefix")]
    pub anchor_prefix: String,
    /// Count-label node name prefix, child of the anchor
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,
    /// Container holding the per-step indicator nodes
    #[serde(default = "default_indicators_path")]
    pub indicators_path: String,
}

fn default_step_prefix() -> String {
    "Step".to_string()
}

fn default_anchors_path() -> String {
    "Anchors".to_string()
}

fn default_anchor_prefix() -> String {
    "Anchor_".to_string()
}

fn default_label_prefix() -> String {
    "Label_".to_string()
}

fn default_indicators_path() -> String {
    "Indicators".to_string()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            step_prefix: default_step_prefix(),
            anchors_path: default_anchors_path(),
            anchor_prefix: default_anchor_prefix(),
            label_prefix: default_label_prefix(),
            indicators_path: default_indicators_path(),
        }
    }
}

impl NamingConfig {
    /// Path of the anchor for a material, e.g. `Anchors/Anchor_Leg`
    pub fn anchor_path(&self, material: &str) -> String {
        format!("{}/{}{}", self.anchors_path, self.anchor_prefix, material)
    }

    /// Name of the count-label child under a material's anchor
    pub fn label_name(&self, material: &str) -> String {
        format!("{}{}", self.label_prefix, material)
    }

    /// Classify a node name with this configuration's step prefix
    pub fn classify(&self, name: &str) -> Option<(u32, String)> {
        classify(name, &self.step_prefix)
    }
}

/// Classify a node name as `<prefix><N>_<Label>`
///
/// Returns the step and the material (label with its trailing digit run
/// removed). The pattern may appear anywhere in the name; the first
/// occurrence that parses wins.
pub fn classify(name: &str, prefix: &str) -> Option<(u32, String)> {
    find_tagged(name, prefix, |rest| {
        let (step, after) = split_step(rest)?;
        let label_src = after.strip_prefix('_')?;
        let label_len: usize = label_src
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .map(char::len_utf8)
            .sum();
        if label_len == 0 {
            return None;
        }
        let label = &label_src[..label_len];
        Some((step, strip_trailing_digits(label).to_string()))
    })
}

/// Step number of an indicator node named `<prefix><N>` (e.g. `Step4`)
pub fn indicator_step(name: &str, prefix: &str) -> Option<u32> {
    find_tagged(name, prefix, |rest| split_step(rest).map(|(step, _)| step))
}

/// Remove a trailing run of ASCII digits (`Leg12` -> `Leg`)
pub fn strip_trailing_digits(label: &str) -> &str {
    label.trim_end_matches(|c: char| c.is_ascii_digit())
}

fn find_tagged<T>(name: &str, prefix: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    if prefix.is_empty() {
        return None;
    }

    let mut from = 0;
    while let Some(offset) = name[from..].find(prefix) {
        let start = from + offset + prefix.len();
        if let Some(found) = parse(&name[start..]) {
            return Some(found);
        }
        from = start;
    }
    None
}

/// Split a leading run of digits off `rest`; steps must fit in an `i32`
fn split_step(rest: &str) -> Option<(u32, &str)> {
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let step: u32 = rest[..digits].parse().ok()?;
    if step > i32::MAX as u32 {
        return None;
    }
    Some((step, &rest[digits..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_basic() {
        assert_eq!(classify("Step3_Shelf", "Step"), Some((3, "Shelf".to_string())));
        assert_eq!(classify("Step12_Door", "Step"), Some((12, "Door".to_string())));
    }

    #[test]
    fn test_classify_strips_trailing_digits() {
        assert_eq!(classify("Step1_Leg2", "Step"), Some((1, "Leg".to_string())));
        assert_eq!(classify("Step1_Leg", "Step"), Some((1, "Leg".to_string())));
        assert_eq!(classify("Step4_Screw10", "Step"), Some((4, "Screw".to_string())));
    }

    #[test]
    fn test_classify_inside_longer_name() {
        assert_eq!(
            classify("Mesh.Step3_Shelf.001", "Step"),
            Some((3, "Shelf".to_string()))
        );
        assert_eq!(classify("StepX_Step2_Top", "Step"), Some((2, "Top".to_string())));
    }

    #[test]
    fn test_classify_rejects_non_matching() {
        assert_eq!(classify("Shelf", "Step"), None);
        assert_eq!(classify("Step_Shelf", "Step"), None);
        assert_eq!(classify("Step3Shelf", "Step"), None);
        assert_eq!(classify("Step3_", "Step"), None);
        assert_eq!(classify("Step3_Shelf", ""), None);
        assert_eq!(classify("Step99999999999_Shelf", "Step"), None);
    }

    #[test]
    fn test_classify_custom_prefix() {
        assert_eq!(classify("Paso2_Tabla1", "Paso"), Some((2, "Tabla".to_string())));
        assert_eq!(classify("Step2_Tabla1", "Paso"), None);
    }

    #[test]
    fn test_indicator_step() {
        assert_eq!(indicator_step("Step4", "Step"), Some(4));
        assert_eq!(indicator_step("Indicator_Step10", "Step"), Some(10));
        assert_eq!(indicator_step("Step", "Step"), None);
        assert_eq!(indicator_step("Spheres", "Step"), None);
    }

    #[test]
    fn test_paths() {
        let naming = NamingConfig::default();
        assert_eq!(naming.anchor_path("Leg"), "Anchors/Anchor_Leg");
        assert_eq!(naming.label_name("Leg"), "Label_Leg");
    }
}
