//! Step contract consumed by the scaffolding pipeline.

use anyhow::Result;

use crate::config_file::{Paths, StepConfig};
use crate::types::StepOutcome;

/// A unit of work in the scaffolding pipeline.
///
/// The pipeline only calls `run` when `allowed` returns true, then reads the
/// narratives through `success` and `error`.
pub trait Step {
    fn name(&self) -> &'static str;

    fn allowed(&self, config: &StepConfig, paths: &Paths) -> bool;

    /// `Err` means a collaborator failed in a way that aborts the pipeline.
    fn run(&mut self, config: &StepConfig, paths: &Paths) -> Result<StepOutcome>;

    fn error(&self) -> String;

    fn success(&self) -> String;
}
