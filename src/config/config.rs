use crate::placement::{BatchOptions, PlacementOptions, UnknownTargetPolicy};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub on_unknown_target: UnknownTargetPolicy,
    #[serde(default = "default_ladderize")]
    pub ladderize: bool,
    #[serde(default = "default_internal_suffix")]
    pub internal_suffix: String,
    #[serde(default = "default_new_suffix")]
    pub new_suffix: String,
    #[serde(default = "default_split_prefix")]
    pub split_prefix: String,
}

fn default_ladderize() -> bool {
    true
}

fn default_internal_suffix() -> String {
    PlacementOptions::default().internal_suffix
}

fn default_new_suffix() -> String {
    PlacementOptions::default().new_suffix
}

fn default_split_prefix() -> String {
    PlacementOptions::default().split_prefix
}

impl Default for Config {
    fn default() -> Self {
        Self {
            on_unknown_target: UnknownTargetPolicy::default(),
            ladderize: default_ladderize(),
            internal_suffix: default_internal_suffix(),
            new_suffix: default_new_suffix(),
            split_prefix: default_split_prefix(),
        }
    }
}

impl Config {
    /// Loads `config.toml` from the user's config directory, falling back to
    /// defaults when it is missing or unreadable.
    pub fn load() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("org", "treebuilder", "treebuilder") {
            let config_path = proj_dirs.config_dir().join("config.toml");
            if config_path.exists() {
                match Self::load_from(&config_path) {
                    Ok(config) => return config,
                    Err(e) => warn!("Ignoring config {}: {}", config_path.display(), e),
                }
            }
        }
        Config::default()
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            placement: PlacementOptions {
                internal_suffix: self.internal_suffix.clone(),
                new_suffix: self.new_suffix.clone(),
                split_prefix: self.split_prefix.clone(),
            },
            on_unknown_target: self.on_unknown_target,
            ladderize: self.ladderize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "on_unknown_target = \"abort\"\nnew_suffix = \"_added\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.on_unknown_target, UnknownTargetPolicy::Abort);
        assert_eq!(config.new_suffix, "_added");
        assert_eq!(config.internal_suffix, "_internal");
        assert!(config.ladderize);

        let options = config.batch_options();
        assert_eq!(options.placement.new_suffix, "_added");
        assert_eq!(options.on_unknown_target, UnknownTargetPolicy::Abort);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ladderize = \"sometimes\"").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }
}
