//! The dropins step
//!
//! Walks the configured `name -> source` mapping in order. Every name is
//! classified first; names that are rejected (directly, or because the
//! operator declined) are reported and never transferred. Accepted names are
//! handed to a per-entry [`TransferStep`].
//!
//! # Failure Policy
//!
//! One bad entry never stops the others. Invalid names and failed transfers
//! end up as lines in the error narrative and the run continues. Only an
//! `Err` from a collaborator (prompt I/O, a transfer giving up) aborts.
//!
//! # Outcome
//!
//! Derived once at the end from the two narratives: `Success` with no
//! errors, `Error` with errors only, `Partial` with both. An empty or
//! malformed mapping returns `None` without touching either narrative.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::classifier::{Classification, DropinClassifier};
use crate::config_file::{DropinRequest, Paths, StepConfig};
use crate::confirmation::{ConfirmPrompt, ConfirmationGate, NonInteractivePrompt, TerminalPrompt};
use crate::locale_catalog::LocaleCatalog;
use crate::step::Step;
use crate::transfer::{FileDropinStepFactory, TransferStepFactory};
use crate::types::{StepOutcome, UnknownDropinPolicy};

pub const STEP_NAME: &str = "dropins";

/// Installs every configured dropin that passes classification.
pub struct DropinsStep {
    catalog: Arc<LocaleCatalog>,
    prompt: Box<dyn ConfirmPrompt>,
    transfers: Box<dyn TransferStepFactory>,
    error_log: String,
    success_log: String,
}

impl DropinsStep {
    pub fn new(
        catalog: Arc<LocaleCatalog>,
        prompt: Box<dyn ConfirmPrompt>,
        transfers: Box<dyn TransferStepFactory>,
    ) -> Self {
        Self {
            catalog,
            prompt,
            transfers,
            error_log: String::new(),
            success_log: String::new(),
        }
    }

    /// Step wired to the process-wide catalog and file transfers, asking on
    /// the terminal when `interactive` is set.
    pub fn with_defaults(interactive: bool) -> Self {
        let prompt: Box<dyn ConfirmPrompt> = if interactive {
            Box::new(TerminalPrompt::stdio())
        } else {
            Box::new(NonInteractivePrompt)
        };

        Self::new(LocaleCatalog::global(), prompt, Box::new(FileDropinStepFactory))
    }

    /// Classify one dropin and resolve any question with the operator.
    fn accepts(
        &mut self,
        request: &DropinRequest,
        policy: UnknownDropinPolicy,
        wp_version: &str,
    ) -> Result<bool> {
        let filename = request.basename();
        let classification = DropinClassifier::new(&self.catalog).classify(filename, policy, wp_version);
        debug!("{} classified as {:?}", request.name, classification);

        match classification {
            Classification::Accept => Ok(true),
            Classification::Reject => Ok(false),
            Classification::Ask(kind) => {
                ConfirmationGate::new(self.prompt.as_mut()).confirm(filename, kind, wp_version)
            }
        }
    }

    /// Process one entry, appending to the narratives.
    fn install(
        &mut self,
        request: &DropinRequest,
        config: &StepConfig,
        paths: &Paths,
        policy: UnknownDropinPolicy,
        wp_version: &str,
    ) -> Result<()> {
        if !self.accepts(request, policy, wp_version)? {
            info!("Skipping invalid dropin name {}", request.name);
            self.error_log
                .push_str(&format!("{} is not a valid dropin name. Skipped.\n", request.name));
            return Ok(());
        }

        let mut transfer = self.transfers.create(&request.name, &request.source);
        if !transfer.allowed(config, paths) {
            debug!("Transfer of {} not allowed, nothing to do", request.name);
            return Ok(());
        }

        match transfer.run(config, paths)? {
            StepOutcome::Success => {
                self.success_log.push_str(&transfer.success());
                self.success_log.push('\n');
            }
            StepOutcome::Error => {
                self.error_log.push_str(&transfer.error());
                self.error_log.push('\n');
            }
            other => {
                warn!(
                    "Transfer of {} reported \"{}\", not recorded in the step result",
                    request.name, other
                );
            }
        }

        Ok(())
    }
}

impl Step for DropinsStep {
    fn name(&self) -> &'static str {
        STEP_NAME
    }

    fn allowed(&self, config: &StepConfig, paths: &Paths) -> bool {
        config.has_dropins() && paths.wp_content().is_some()
    }

    fn run(&mut self, config: &StepConfig, paths: &Paths) -> Result<StepOutcome> {
        let dropins = config.dropins();
        if dropins.is_empty() {
            return Ok(StepOutcome::None);
        }

        self.error_log.clear();
        self.success_log.clear();

        let policy = config.unknown_dropins_policy();
        let wp_version = config.wp_version();
        info!(
            "Installing {} dropin(s), unknown dropins policy: {}",
            dropins.len(),
            policy
        );

        for request in &dropins {
            self.install(request, config, paths, policy, &wp_version)?;
        }

        let outcome = if self.error_log.is_empty() {
            StepOutcome::Success
        } else {
            StepOutcome::combine(!self.success_log.is_empty(), true)
        };
        info!("Dropins step finished: {}", outcome);

        Ok(outcome)
    }

    fn error(&self) -> String {
        self.error_log.trim().to_string()
    }

    fn success(&self) -> String {
        self.success_log.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale_catalog::LanguageListFetcher;
    use crate::transfer::TransferStep;
    use serde_json::{json, Value};

    struct NoFetch;

    impl LanguageListFetcher for NoFetch {
        fn fetch(&self, _version: &str) -> Result<Value> {
            anyhow::bail!("offline")
        }
    }

    struct AlwaysSucceeds;

    impl TransferStep for AlwaysSucceeds {
        fn allowed(&self, _: &StepConfig, _: &Paths) -> bool {
            true
        }

        fn run(&mut self, _: &StepConfig, _: &Paths) -> Result<StepOutcome> {
            Ok(StepOutcome::Success)
        }

        fn success(&self) -> String {
            "installed".to_string()
        }

        fn error(&self) -> String {
            String::new()
        }
    }

    struct AlwaysSucceedsFactory;

    impl TransferStepFactory for AlwaysSucceedsFactory {
        fn create(&self, _name: &str, _source: &str) -> Box<dyn TransferStep> {
            Box::new(AlwaysSucceeds)
        }
    }

    fn step() -> DropinsStep {
        DropinsStep::new(
            Arc::new(LocaleCatalog::new(NoFetch)),
            Box::new(NonInteractivePrompt),
            Box::new(AlwaysSucceedsFactory),
        )
    }

    fn paths() -> Paths {
        Paths::new("/project", Some("/project/wp-content".into()))
    }

    #[test]
    fn test_name() {
        assert_eq!(step().name(), "dropins");
    }

    #[test]
    fn test_allowed_needs_dropins_and_content_dir() {
        let config: StepConfig =
            serde_json::from_value(json!({ "dropins": { "db.php": "x/db.php" } })).unwrap();

        assert!(step().allowed(&config, &paths()));
        assert!(!step().allowed(&config, &Paths::new("/project", None)));
        assert!(!step().allowed(&StepConfig::new(), &paths()));
    }

    #[test]
    fn test_success_log_gets_newline_per_entry() {
        let config: StepConfig = serde_json::from_value(json!({
            "dropins": { "db.php": "x/db.php", "sunrise.php": "x/sunrise.php" }
        }))
        .unwrap();

        let mut step = step();
        let outcome = step.run(&config, &paths()).unwrap();

        assert_eq!(outcome, StepOutcome::Success);
        assert_eq!(step.success(), "installed\ninstalled");
        assert_eq!(step.error(), "");
    }
}
