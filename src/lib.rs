//! Dropins step library
//!
//! Decides which configured dropins are safe to install into a WordPress
//! content directory, installs them, and folds the per-file results into one
//! step outcome for the scaffolding pipeline.

pub mod classifier;
pub mod cli;
pub mod command_runner;
pub mod command_traits;
pub mod config_file;
pub mod confirmation;
pub mod dropins_step;
pub mod error;
pub mod locale_catalog;
pub mod process_guard;
pub mod step;
pub mod transfer;
pub mod types;

// Re-export main types for convenience
pub use classifier::{Classification, DropinClassifier, KNOWN_DROPINS};
pub use config_file::{DropinRequest, Paths, StepConfig};
pub use confirmation::{ConfirmPrompt, ConfirmationGate, NonInteractivePrompt, TerminalPrompt};
pub use dropins_step::DropinsStep;
pub use error::DropinError;
pub use locale_catalog::{CatalogState, LanguageListFetcher, LocaleCatalog, WordPressLanguageFetcher};
pub use process_guard::{ChildRegistry, CommandProcessGroup, ProcessGuard};
pub use step::Step;
pub use transfer::{FileDropinStep, FileDropinStepFactory, TransferStep, TransferStepFactory};
pub use types::{QuestionKind, StepOutcome, UnknownDropinPolicy};
