use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

pub const DEFAULT_FUZZY_THRESHOLD: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// directories searched for `*.windowblueprint.json`, relative to the cwd
    #[serde(default = "default_blueprint_dirs")]
    pub blueprint_dirs: Vec<String>,
    #[serde(default)]
    pub dry_run: bool,
    /// max edit distance for monitor name suggestions
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: usize,
    /// tracing filter used when no flag or RUST_LOG is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn default_blueprint_dirs() -> Vec<String> {
    vec![".".to_string()]
}

fn default_fuzzy_threshold() -> usize {
    DEFAULT_FUZZY_THRESHOLD
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blueprint_dirs: default_blueprint_dirs(),
            dry_run: false,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            log_level: None,
        }
    }
}
