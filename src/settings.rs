//! Persistent build settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::bvh::{BuildOptions, Capacity, LEAF_THRESHOLD};
use crate::bvh::gpu_data::DEFAULT_BUFFER_CAPACITY;
use crate::loader::LoadOptions;
use crate::util::Result;

/// Environment variable that overrides the settings file location.
pub const CONFIG_ENV: &str = "BVH_ACCEL_CONFIG";

/// Settings read from `settings.json`. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Build
    pub leaf_threshold: usize,

    // Upload buffers
    pub max_triangles: usize,
    pub max_nodes: usize,

    // Loader
    pub normalize_mesh: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            leaf_threshold: LEAF_THRESHOLD,
            max_triangles: DEFAULT_BUFFER_CAPACITY,
            max_nodes: DEFAULT_BUFFER_CAPACITY,
            normalize_mesh: false,
        }
    }
}

impl Settings {
    /// Get settings file path
    pub fn path() -> Option<PathBuf> {
        if let Some(p) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(p));
        }
        dirs::config_dir().map(|mut p| {
            p.push("bvh-accel");
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        match Self::from_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                if path.exists() {
                    tracing::warn!("Ignoring {}: {}", path.display(), e);
                }
                Self::default()
            }
        }
    }

    /// Load settings from an explicit file, reporting any error
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let mut settings: Self = serde_json::from_str(&text)?;
        settings.validate();
        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(dir) = path.as_ref().parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn validate(&mut self) {
        if self.leaf_threshold == 0 {
            self.leaf_threshold = 1;
        }
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            leaf_threshold: self.leaf_threshold.max(1),
        }
    }

    pub fn capacity(&self) -> Capacity {
        Capacity {
            max_triangles: self.max_triangles,
            max_nodes: self.max_nodes,
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            normalize: self.normalize_mesh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Error;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.leaf_threshold, 4);
        assert_eq!(s.capacity(), Capacity::default());
        assert_eq!(s.build_options(), BuildOptions::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "max_nodes": 4096, "leaf_threshold": 0 }"#).unwrap();

        let s = Settings::from_file(&path).unwrap();
        assert_eq!(s.max_nodes, 4096);
        assert_eq!(s.max_triangles, 1024);
        assert_eq!(s.leaf_threshold, 1);
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let s = Settings {
            normalize_mesh: true,
            max_triangles: 99,
            ..Default::default()
        };
        s.save(&path).unwrap();
        assert_eq!(Settings::from_file(&path).unwrap(), s);
    }

    #[test]
    fn test_bad_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::from_file(&path), Err(Error::Json(_))));
        assert!(matches!(Settings::from_file(dir.path().join("missing.json")), Err(Error::Io(_))));
    }
}
