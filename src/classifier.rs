//! Dropin name classification
//!
//! Decides whether a requested file name is a dropin WordPress recognizes:
//! either one of the fixed core dropins, or a translation dropin named after
//! a supported locale (`<locale>.php`). Anything else depends on the
//! configured [`UnknownDropinPolicy`].
//!
//! The decision order is:
//!
//! 1. `AlwaysAllow` policy or a known core dropin: accept
//! 2. extension other than `php`: ask (`NoDropin`) or reject
//! 3. otherwise look the base name up in the [`LocaleCatalog`]:
//!    unknown list asks (`LocalesError`) or rejects, a listed locale is
//!    accepted, an unlisted one asks (`NoLocale`) or rejects

use tracing::debug;

use crate::locale_catalog::LocaleCatalog;
use crate::types::{QuestionKind, UnknownDropinPolicy};

/// File names WordPress loads as core dropins
pub const KNOWN_DROPINS: [&str; 10] = [
    "advanced-cache.php",
    "db.php",
    "db-error.php",
    "install.php",
    "maintenance.php",
    "object-cache.php",
    "sunrise.php",
    "blog-deleted.php",
    "blog-inactive.php",
    "blog-suspended.php",
];

/// Verdict for a single dropin name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Accept,
    /// Needs operator confirmation before it can be accepted
    Ask(QuestionKind),
    Reject,
}

pub fn is_known_dropin(filename: &str) -> bool {
    KNOWN_DROPINS.contains(&filename)
}

/// Lowercased text after the last dot, empty when there is no dot.
///
/// A leading dot counts, so `.php` has the extension `php`.
pub fn extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// File name without its last extension (`it_IT.php` -> `it_IT`).
pub fn locale_name(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map_or(filename, |(stem, _)| stem)
}

/// Classifies dropin names against the known set and a locale catalog.
#[derive(Debug, Clone, Copy)]
pub struct DropinClassifier<'a> {
    catalog: &'a LocaleCatalog,
}

impl<'a> DropinClassifier<'a> {
    pub fn new(catalog: &'a LocaleCatalog) -> Self {
        Self { catalog }
    }

    /// Classify `filename` (a base name, not a path).
    ///
    /// The catalog is only consulted for unknown `.php` names under a policy
    /// other than `AlwaysAllow`.
    pub fn classify(
        &self,
        filename: &str,
        policy: UnknownDropinPolicy,
        wp_version: &str,
    ) -> Classification {
        let or_reject = |kind: QuestionKind| {
            if policy.asks() {
                Classification::Ask(kind)
            } else {
                Classification::Reject
            }
        };

        if policy == UnknownDropinPolicy::AlwaysAllow || is_known_dropin(filename) {
            return Classification::Accept;
        }

        if extension(filename) != "php" {
            debug!("{} is not a PHP file", filename);
            return or_reject(QuestionKind::NoDropin);
        }

        let Some(locales) = self.catalog.get(wp_version) else {
            debug!("Locale list unavailable, can't verify {}", filename);
            return or_reject(QuestionKind::LocalesError);
        };

        if locales.contains(locale_name(filename)) {
            Classification::Accept
        } else {
            debug!("{} is not an available locale", locale_name(filename));
            or_reject(QuestionKind::NoLocale)
        }
    }
}
