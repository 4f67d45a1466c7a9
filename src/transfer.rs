//! Installing a single dropin
//!
//! The dropins step only decides *whether* a dropin may be installed. The
//! install itself is a [`TransferStep`], built per entry by a
//! [`TransferStepFactory`]. [`FileDropinStep`] is the default: local sources
//! are copied, `http(s)://` sources are downloaded with curl.

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::command_runner::run_command_safe;
use crate::command_traits::CurlDownloadArgs;
use crate::config_file::{basename, Paths, StepConfig};
use crate::error::DropinError;
use crate::types::StepOutcome;

/// Installs one dropin.
///
/// `run` returns `Err` only for failures that should abort the whole step;
/// an ordinary failed install is `Ok(StepOutcome::Error)` with the reason in
/// `error()`.
pub trait TransferStep {
    fn allowed(&self, config: &StepConfig, paths: &Paths) -> bool;

    fn run(&mut self, config: &StepConfig, paths: &Paths) -> Result<StepOutcome>;

    fn success(&self) -> String;

    fn error(&self) -> String;
}

/// Builds the transfer step for a `(name, source)` pair.
pub trait TransferStepFactory {
    fn create(&self, name: &str, source: &str) -> Box<dyn TransferStep>;
}

/// Mode for downloaded dropins; copies keep the source's mode.
const DROPIN_MODE: u32 = 0o644;

pub fn is_url(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Copies or downloads a dropin into the content directory.
#[derive(Debug, Clone)]
pub struct FileDropinStep {
    name: String,
    source: String,
    success: String,
    error: String,
}

impl FileDropinStep {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            success: String::new(),
            error: String::new(),
        }
    }

    /// Where the dropin ends up, `None` when the content dir is unknown.
    pub fn target(&self, paths: &Paths) -> Option<PathBuf> {
        paths.wp_content().map(|dir| dir.join(basename(&self.name)))
    }

    /// Fetches the dropin into a temporary file next to `target`, then
    /// renames it into place. A failed transfer leaves `target` untouched.
    fn install(&self, target: &Path, paths: &Paths) -> Result<&'static str> {
        let parent = target
            .parent()
            .ok_or_else(|| DropinError::transfer(format!("{} has no parent", target.display())))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        let staged = NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create a temporary file in {}", parent.display()))?;

        let verb = if is_url(&self.source) {
            let output = run_command_safe(&CurlDownloadArgs::new(self.source.trim(), staged.path()))?;
            output.ensure_success("Download")?;
            fs::set_permissions(staged.path(), fs::Permissions::from_mode(DROPIN_MODE))
                .context("Failed to set dropin permissions")?;
            "downloaded"
        } else {
            let source = paths.resolve_source(&self.source);
            if !source.is_file() {
                return Err(
                    DropinError::transfer(format!("{} is not a file", source.display())).into(),
                );
            }
            fs::copy(&source, staged.path()).with_context(|| {
                format!("Failed to copy {} to {}", source.display(), target.display())
            })?;
            "copied"
        };

        staged
            .persist(target)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to move dropin into {}", target.display()))?;

        Ok(verb)
    }
}

impl TransferStep for FileDropinStep {
    /// Refuses when the content directory is unknown, or when overwriting is
    /// prevented and the target already exists.
    fn allowed(&self, config: &StepConfig, paths: &Paths) -> bool {
        let Some(target) = self.target(paths) else {
            return false;
        };

        if config.prevent_overwrite && target.exists() {
            info!(
                "{} exists and overwriting is prevented, skipping",
                target.display()
            );
            return false;
        }

        true
    }

    fn run(&mut self, _config: &StepConfig, paths: &Paths) -> Result<StepOutcome> {
        let Some(target) = self.target(paths) else {
            self.error = format!(
                "  - Failed to install \"{}\": content directory is unknown",
                self.name
            );
            return Ok(StepOutcome::Error);
        };

        debug!("Installing dropin {} from {}", self.name, self.source);

        match self.install(&target, paths) {
            Ok(verb) => {
                self.success = format!(
                    "  - \"{}\" {} to {}",
                    self.name,
                    verb,
                    target.display()
                );
                Ok(StepOutcome::Success)
            }
            Err(e) => {
                self.error = format!(
                    "  - Failed to install \"{}\" from {}: {:#}",
                    self.name, self.source, e
                );
                Ok(StepOutcome::Error)
            }
        }
    }

    fn success(&self) -> String {
        self.success.clone()
    }

    fn error(&self) -> String {
        self.error.clone()
    }
}

/// Factory for [`FileDropinStep`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDropinStepFactory;

impl TransferStepFactory for FileDropinStepFactory {
    fn create(&self, name: &str, source: &str) -> Box<dyn TransferStep> {
        Box::new(FileDropinStep::new(name, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/db.php"));
        assert!(is_url("HTTP://example.com/db.php"));
        assert!(!is_url("vendor/acme/db.php"));
        assert!(!is_url("/abs/https://db.php"));
    }

    #[test]
    fn test_target_uses_basename() {
        let paths = Paths::new("/project", Some(PathBuf::from("/project/wp-content")));
        let step = FileDropinStep::new("nested/object-cache.php", "x");
        assert_eq!(
            step.target(&paths),
            Some(PathBuf::from("/project/wp-content/object-cache.php"))
        );
    }

    #[test]
    fn test_not_allowed_without_content_dir() {
        let step = FileDropinStep::new("db.php", "x/db.php");
        assert!(!step.allowed(&StepConfig::new(), &Paths::new("/project", None)));
    }

    #[test]
    fn test_prevent_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("db.php"), "<?php // old").unwrap();
        let paths = Paths::new(dir.path(), Some(dir.path().to_path_buf()));
        let step = FileDropinStep::new("db.php", "x/db.php");

        let mut config = StepConfig::new();
        assert!(step.allowed(&config, &paths));

        config.prevent_overwrite = true;
        assert!(!step.allowed(&config, &paths));
    }

    #[test]
    fn test_copy_local_source() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("vendor")).unwrap();
        fs::write(root.path().join("vendor/db.php"), "<?php // db").unwrap();
        let content = root.path().join("wp-content");
        let paths = Paths::new(root.path(), Some(content.clone()));

        let mut step = FileDropinStep::new("db.php", "vendor/db.php");
        let outcome = step.run(&StepConfig::new(), &paths).unwrap();

        assert_eq!(outcome, StepOutcome::Success);
        assert_eq!(
            fs::read_to_string(content.join("db.php")).unwrap(),
            "<?php // db"
        );
        assert!(step.success().contains("\"db.php\" copied to"));
        assert!(step.error().is_empty());
    }

    #[test]
    fn test_missing_local_source_is_error_outcome() {
        let root = tempfile::tempdir().unwrap();
        let paths = Paths::new(root.path(), Some(root.path().join("wp-content")));

        let mut step = FileDropinStep::new("db.php", "vendor/missing.php");
        let outcome = step.run(&StepConfig::new(), &paths).unwrap();

        assert_eq!(outcome, StepOutcome::Error);
        assert!(step.error().starts_with("  - Failed to install \"db.php\" from vendor/missing.php"));
        assert!(step.success().is_empty());
    }

    #[test]
    fn test_failed_download_keeps_existing_dropin() {
        let root = tempfile::tempdir().unwrap();
        let content = root.path().join("wp-content");
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("db.php"), "<?php // old").unwrap();
        let paths = Paths::new(root.path(), Some(content.clone()));

        // Nothing listens on port 1
        let mut step = FileDropinStep::new("db.php", "http://127.0.0.1:1/db.php");
        let outcome = step.run(&StepConfig::new(), &paths).unwrap();

        assert_eq!(outcome, StepOutcome::Error);
        assert!(step.error().starts_with("  - Failed to install \"db.php\""));
        assert_eq!(
            fs::read_to_string(content.join("db.php")).unwrap(),
            "<?php // old"
        );
        assert_eq!(fs::read_dir(&content).unwrap().count(), 1, "no staging file left behind");
    }

    #[test]
    fn test_copy_onto_itself_keeps_content() {
        let root = tempfile::tempdir().unwrap();
        let content = root.path().join("wp-content");
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("db.php"), "<?php // real").unwrap();
        let paths = Paths::new(root.path(), Some(content.clone()));

        let mut step = FileDropinStep::new("db.php", "wp-content/db.php");
        let outcome = step.run(&StepConfig::new(), &paths).unwrap();

        assert_eq!(outcome, StepOutcome::Success);
        assert_eq!(
            fs::read_to_string(content.join("db.php")).unwrap(),
            "<?php // real"
        );
    }

    #[test]
    fn test_copy_replaces_existing_dropin() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("vendor")).unwrap();
        fs::write(root.path().join("vendor/db.php"), "<?php // new").unwrap();
        let content = root.path().join("wp-content");
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("db.php"), "<?php // old").unwrap();
        let paths = Paths::new(root.path(), Some(content.clone()));

        let mut step = FileDropinStep::new("db.php", "vendor/db.php");
        assert_eq!(step.run(&StepConfig::new(), &paths).unwrap(), StepOutcome::Success);
        assert_eq!(
            fs::read_to_string(content.join("db.php")).unwrap(),
            "<?php // new"
        );
    }
}
