//! Supported locale codes for a WordPress version
//!
//! Translation dropins are named after a locale (`it_IT.php`), so checking
//! one needs the list of locales WordPress ships translations for. The list
//! comes from the WordPress translations API and is fetched at most once per
//! catalog.
//!
//! # Caching
//!
//! The catalog remembers the first fetch attempt, successful or not, and
//! never fetches again. The cache is not keyed by version: later calls with a
//! different version get whatever the first attempt produced.
//!
//! # Degraded mode
//!
//! A failed fetch leaves the catalog `Unavailable`. That is different from a
//! successful fetch returning zero locales.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, info, warn};

use crate::command_runner::run_command_safe;
use crate::command_traits::CurlFetchArgs;
use crate::error::DropinError;

/// WordPress core translations endpoint
pub const TRANSLATIONS_API_URL: &str = "https://api.wordpress.org/translations/core/1.0/";

/// Source of the raw locale list.
///
/// A successful fetch is expected to produce a JSON array of locale codes.
/// Anything else is treated as a failed fetch by the catalog.
pub trait LanguageListFetcher: Send + Sync {
    fn fetch(&self, version: &str) -> Result<Value>;
}

/// Fetches locale codes from the WordPress translations API through curl.
#[derive(Debug, Clone)]
pub struct WordPressLanguageFetcher {
    pub base_url: String,
    pub timeout: u32,
}

impl Default for WordPressLanguageFetcher {
    fn default() -> Self {
        Self {
            base_url: TRANSLATIONS_API_URL.to_string(),
            timeout: crate::command_traits::DEFAULT_CURL_TIMEOUT,
        }
    }
}

/// WordPress versions look like `6.4.2` or `6.5-RC1`; nothing else may reach
/// the query string.
pub fn is_valid_version(version: &str) -> bool {
    !version.is_empty()
        && version.len() <= 32
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

impl WordPressLanguageFetcher {
    pub fn url_for(&self, version: &str) -> Result<String> {
        if !is_valid_version(version) {
            return Err(DropinError::fetch(format!("Invalid WordPress version: {:?}", version)).into());
        }
        Ok(format!("{}?version={}", self.base_url, version))
    }
}

impl LanguageListFetcher for WordPressLanguageFetcher {
    fn fetch(&self, version: &str) -> Result<Value> {
        let args = CurlFetchArgs {
            url: self.url_for(version)?,
            timeout: self.timeout,
        };

        let output = run_command_safe(&args)?;
        output.ensure_success("Fetching available locales")?;

        let body: Value = serde_json::from_str(&output.stdout)
            .context("Failed to parse translations API response")?;

        languages_from_api_response(&body)
    }
}

/// Extract `translations[].language` from a translations API response.
pub fn languages_from_api_response(body: &Value) -> Result<Value> {
    let translations = body
        .get("translations")
        .and_then(Value::as_array)
        .ok_or_else(|| DropinError::fetch("response has no \"translations\" list"))?;

    let languages = translations
        .iter()
        .filter_map(|t| t.get("language").and_then(Value::as_str))
        .map(|lang| Value::String(lang.to_string()))
        .collect();

    Ok(Value::Array(languages))
}

/// What the catalog knows about the locale list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CatalogState {
    /// No fetch attempted yet
    #[default]
    NotFetched,
    /// Fetch succeeded; the set may be empty
    Fetched {
        version: String,
        locales: Arc<BTreeSet<String>>,
    },
    /// The one fetch attempt failed
    Unavailable { version: String },
}

static GLOBAL_CATALOG: OnceLock<Arc<LocaleCatalog>> = OnceLock::new();

/// Lazily fetched, fetch-once cache of supported locale codes.
pub struct LocaleCatalog {
    fetcher: Box<dyn LanguageListFetcher>,
    state: Mutex<CatalogState>,
}

impl std::fmt::Debug for LocaleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleCatalog")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl LocaleCatalog {
    pub fn new(fetcher: impl LanguageListFetcher + 'static) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            state: Mutex::new(CatalogState::NotFetched),
        }
    }

    /// Process-wide catalog backed by the WordPress translations API
    pub fn global() -> Arc<LocaleCatalog> {
        GLOBAL_CATALOG
            .get_or_init(|| Arc::new(LocaleCatalog::new(WordPressLanguageFetcher::default())))
            .clone()
    }

    pub fn state(&self) -> CatalogState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Supported locales, `None` when unknown.
    ///
    /// An empty `version` returns `None` without fetching and without using
    /// up the single fetch attempt.
    pub fn get(&self, version: &str) -> Option<Arc<BTreeSet<String>>> {
        let version = version.trim();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        match &*state {
            CatalogState::Fetched { locales, .. } => return Some(Arc::clone(locales)),
            CatalogState::Unavailable { .. } => return None,
            CatalogState::NotFetched if version.is_empty() => {
                debug!("No WordPress version known, locale list unavailable");
                return None;
            }
            CatalogState::NotFetched => {}
        }

        info!("Fetching available locales for WordPress {}", version);

        *state = match self.fetcher.fetch(version).and_then(|v| locales_from_payload(&v)) {
            Ok(locales) => {
                info!("Fetched {} locales for WordPress {}", locales.len(), version);
                CatalogState::Fetched {
                    version: version.to_string(),
                    locales: Arc::new(locales),
                }
            }
            Err(e) => {
                warn!("Could not fetch locales for WordPress {}: {:#}", version, e);
                CatalogState::Unavailable {
                    version: version.to_string(),
                }
            }
        };

        match &*state {
            CatalogState::Fetched { locales, .. } => Some(Arc::clone(locales)),
            _ => None,
        }
    }
}

/// A payload is valid only as a JSON array made entirely of strings.
fn locales_from_payload(payload: &Value) -> Result<BTreeSet<String>> {
    let items = payload
        .as_array()
        .ok_or_else(|| DropinError::fetch("locale list is not an array"))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| {
                    anyhow::Error::from(DropinError::fetch(format!("invalid locale entry {}", item)))
                })
        })
        .collect()
}
