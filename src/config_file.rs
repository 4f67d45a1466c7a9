//! Configuration file handling for the dropins step.
//!
//! The configuration is a JSON document. The `dropins` mapping and the
//! `unknown-dropins` policy are kept as raw JSON values: a malformed mapping
//! is not a load error, it simply means there is nothing to install.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DropinError;
use crate::types::UnknownDropinPolicy;

/// One requested dropin: target file name and where to get it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropinRequest {
    /// File name the host application matches on
    pub name: String,
    /// Local path or URL
    pub source: String,
}

impl DropinRequest {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Last path component of the name, which is what gets classified.
    pub fn basename(&self) -> &str {
        basename(&self.name)
    }
}

/// Last `/`- or `\`-separated component of `name`.
pub fn basename(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Dropins step configuration that can be saved/loaded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StepConfig {
    /// name -> source mapping; anything but an object means "no dropins"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropins: Option<Value>,

    /// `true`, `"ask"`, or anything else for reject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_dropins: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wp_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_dir: Option<PathBuf>,

    #[serde(default)]
    pub prevent_overwrite: bool,
}

impl StepConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// The configured dropins in configuration order.
    ///
    /// Returns an empty list when the mapping is missing or not an object.
    /// Entries whose source is not a string are skipped; `validate` reports them.
    pub fn dropins(&self) -> Vec<DropinRequest> {
        let Some(Value::Object(map)) = &self.dropins else {
            return Vec::new();
        };

        map.iter()
            .filter_map(|(name, source)| {
                source
                    .as_str()
                    .map(|source| DropinRequest::new(name.as_str(), source))
            })
            .collect()
    }

    pub fn has_dropins(&self) -> bool {
        !self.dropins().is_empty()
    }

    pub fn unknown_dropins_policy(&self) -> UnknownDropinPolicy {
        UnknownDropinPolicy::from_config_value(self.unknown_dropins.as_ref())
    }

    /// Host application version, empty when unknown.
    pub fn wp_version(&self) -> String {
        self.wp_version
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }

    /// Use `fallback` as the version when the file doesn't set one.
    pub fn with_wp_version_fallback(mut self, fallback: Option<String>) -> Self {
        if self.wp_version().is_empty() {
            self.wp_version = fallback.filter(|v| !v.trim().is_empty());
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::error::Result<()> {
        let map = match &self.dropins {
            None | Some(Value::Null) => return Ok(()),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(DropinError::config("\"dropins\" must be an object"));
            }
        };

        for (name, source) in map {
            if name.trim().is_empty() {
                return Err(DropinError::config("Dropin names must not be empty"));
            }
            if name.split(['/', '\\']).any(|part| part == "..") {
                return Err(DropinError::config(format!(
                    "Dropin name \"{}\" must not contain \"..\"",
                    name
                )));
            }
            match source.as_str() {
                Some(s) if !s.trim().is_empty() => {}
                Some(_) => {
                    return Err(DropinError::config(format!(
                        "Source for dropin \"{}\" must not be empty",
                        name
                    )));
                }
                None => {
                    return Err(DropinError::config(format!(
                        "Source for dropin \"{}\" must be a string",
                        name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Resolved filesystem locations the step works with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paths {
    /// Project root; relative local sources resolve against it
    pub root: PathBuf,
    wp_content: Option<PathBuf>,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>, wp_content: Option<PathBuf>) -> Self {
        Self {
            root: root.into(),
            wp_content,
        }
    }

    /// Resolve paths from a config; `content_dir` overrides the config value.
    /// Relative content directories are taken relative to `root`.
    pub fn resolve(root: &Path, config: &StepConfig, content_dir: Option<&Path>) -> Self {
        let wp_content = content_dir
            .or(config.content_dir.as_deref())
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| {
                if dir.is_absolute() {
                    dir.to_path_buf()
                } else {
                    root.join(dir)
                }
            });

        Self::new(root, wp_content)
    }

    /// Content directory, `None` when it can't be determined.
    pub fn wp_content(&self) -> Option<&Path> {
        self.wp_content.as_deref()
    }

    /// Resolve a local dropin source against the project root.
    pub fn resolve_source(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
