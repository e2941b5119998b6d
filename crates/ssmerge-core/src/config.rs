use serde::{Deserialize, Serialize};
use std::path::Path;

/// Persisted defaults for the merge tools, loaded from
/// `<data-dir>/settings.json`. Command-line flags override these per run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub merge: MergeSettings,
    #[serde(default)]
    pub handlers: HandlerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSettings {
    #[serde(default)]
    pub show_base: bool,
    #[serde(default = "default_true")]
    pub ignore_whitespace: bool,
    /// "diff3" or "csdiff-diff3".
    #[serde(default = "default_strategy")]
    pub strategy: String,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            show_base: false,
            ignore_whitespace: default_true(),
            strategy: default_strategy(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerSettings {
    #[serde(default = "default_true")]
    pub type_ambiguity: bool,
    #[serde(default = "default_true")]
    pub new_element_referencing_edited_one: bool,
    #[serde(default = "default_true")]
    pub renaming_and_deletion: bool,
    #[serde(default = "default_true")]
    pub initialization_blocks: bool,
    #[serde(default)]
    pub initialization_blocks_multiple: bool,
    #[serde(default = "default_true")]
    pub duplicated_declaration: bool,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            type_ambiguity: true,
            new_element_referencing_edited_one: true,
            renaming_and_deletion: true,
            initialization_blocks: true,
            initialization_blocks_multiple: false,
            duplicated_declaration: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_strategy() -> String {
    "diff3".into()
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Loads settings, falling back to defaults when the file is missing.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
