//! Type-safe value types shared by the dropins step
//!
//! Policy, question and outcome values are closed enums instead of raw
//! booleans, strings or bit flags.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

/// Operator stance towards dropin names that can't be verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum UnknownDropinPolicy {
    #[strum(serialize = "allow")]
    AlwaysAllow,
    #[strum(serialize = "ask")]
    Ask,
    #[default]
    #[strum(serialize = "reject")]
    Reject,
}

impl UnknownDropinPolicy {
    /// Read the policy from the raw `unknown-dropins` configuration value.
    ///
    /// `true` allows everything, `"ask"` asks, anything else (including a
    /// missing value) rejects.
    pub fn from_config_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(true)) => Self::AlwaysAllow,
            Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("ask") => Self::Ask,
            _ => Self::Reject,
        }
    }

    pub fn asks(&self) -> bool {
        *self == Self::Ask
    }
}

/// Which confirmation question to put to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, EnumIter)]
pub enum QuestionKind {
    /// Not a known dropin and not a `.php` translation file
    #[strum(serialize = "no-dropin")]
    NoDropin,
    /// Looks like a translation file but the locale list is unavailable
    #[strum(serialize = "locales-error")]
    LocalesError,
    /// Looks like a translation file for a locale that doesn't exist
    #[strum(serialize = "no-locale")]
    NoLocale,
}

/// Result of a step run.
///
/// Maps onto the pipeline's bitmask codes through [`StepOutcome::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(Display, EnumIter)]
pub enum StepOutcome {
    /// Nothing to do
    #[default]
    #[strum(serialize = "none")]
    None,
    #[strum(serialize = "success")]
    Success,
    #[strum(serialize = "error")]
    Error,
    /// Some entries succeeded, some failed
    #[strum(serialize = "partial")]
    Partial,
}

impl StepOutcome {
    pub const NONE_CODE: u8 = 0;
    pub const SUCCESS_CODE: u8 = 1;
    pub const ERROR_CODE: u8 = 2;

    /// Derive an outcome from whether anything succeeded and anything failed.
    pub fn combine(has_success: bool, has_error: bool) -> Self {
        match (has_success, has_error) {
            (false, false) => Self::None,
            (true, false) => Self::Success,
            (false, true) => Self::Error,
            (true, true) => Self::Partial,
        }
    }

    /// Bitmask code: NONE=0, SUCCESS=1, ERROR=2, SUCCESS|ERROR=3
    pub fn code(&self) -> u8 {
        match self {
            Self::None => Self::NONE_CODE,
            Self::Success => Self::SUCCESS_CODE,
            Self::Error => Self::ERROR_CODE,
            Self::Partial => Self::SUCCESS_CODE | Self::ERROR_CODE,
        }
    }

    /// Inverse of [`StepOutcome::code`]. Unknown bits are ignored.
    pub fn from_code(code: u8) -> Self {
        Self::combine(
            code & Self::SUCCESS_CODE != 0,
            code & Self::ERROR_CODE != 0,
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::Partial)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error | Self::Partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_policy_from_config_value() {
        let allow = json!(true);
        let ask = json!("ask");
        let ask_upper = json!(" ASK ");
        let no = json!(false);
        let other = json!("yes");

        assert_eq!(
            UnknownDropinPolicy::from_config_value(Some(&allow)),
            UnknownDropinPolicy::AlwaysAllow
        );
        assert_eq!(
            UnknownDropinPolicy::from_config_value(Some(&ask)),
            UnknownDropinPolicy::Ask
        );
        assert_eq!(
            UnknownDropinPolicy::from_config_value(Some(&ask_upper)),
            UnknownDropinPolicy::Ask
        );
        assert_eq!(
            UnknownDropinPolicy::from_config_value(Some(&no)),
            UnknownDropinPolicy::Reject
        );
        assert_eq!(
            UnknownDropinPolicy::from_config_value(Some(&other)),
            UnknownDropinPolicy::Reject
        );
        assert_eq!(
            UnknownDropinPolicy::from_config_value(None),
            UnknownDropinPolicy::Reject
        );
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "allow".parse::<UnknownDropinPolicy>().unwrap(),
            UnknownDropinPolicy::AlwaysAllow
        );
        assert_eq!(
            "Ask".parse::<UnknownDropinPolicy>().unwrap(),
            UnknownDropinPolicy::Ask
        );
        assert!("maybe".parse::<UnknownDropinPolicy>().is_err());
        assert_eq!(UnknownDropinPolicy::default(), UnknownDropinPolicy::Reject);
    }

    #[test]
    fn test_outcome_combine() {
        assert_eq!(StepOutcome::combine(false, false), StepOutcome::None);
        assert_eq!(StepOutcome::combine(true, false), StepOutcome::Success);
        assert_eq!(StepOutcome::combine(false, true), StepOutcome::Error);
        assert_eq!(StepOutcome::combine(true, true), StepOutcome::Partial);
    }

    #[test]
    fn test_outcome_codes() {
        assert_eq!(StepOutcome::None.code(), 0);
        assert_eq!(StepOutcome::Success.code(), 1);
        assert_eq!(StepOutcome::Error.code(), 2);
        assert_eq!(StepOutcome::Partial.code(), 3);
        assert_eq!(StepOutcome::from_code(3), StepOutcome::Partial);
        assert_eq!(StepOutcome::from_code(0), StepOutcome::None);
    }

    #[test]
    fn test_outcome_predicates() {
        assert!(StepOutcome::Partial.is_success());
        assert!(StepOutcome::Partial.is_error());
        assert!(!StepOutcome::None.is_success());
        assert!(!StepOutcome::Success.is_error());
    }
}
