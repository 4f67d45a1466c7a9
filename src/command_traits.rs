//! Type-safe external command argument contracts.
//!
//! The step talks to the network through curl. Instead of building raw
//! argument vectors at every call site, argument structs implement
//! [`CommandArgs`] so flag spelling lives in exactly one place.

use std::path::PathBuf;

/// Trait for typed external command arguments.
///
/// # Contract
///
/// - `program()`: binary to execute, resolved through `PATH`.
/// - `to_cli_args()`: arguments exactly as the program expects them.
/// - `get_env_vars()`: extra environment for the child.
pub trait CommandArgs {
    fn program(&self) -> &'static str;

    fn to_cli_args(&self) -> Vec<String>;

    fn get_env_vars(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Default upper bound for a single curl transfer, in seconds.
pub const DEFAULT_CURL_TIMEOUT: u32 = 30;

/// Flags shared by every curl invocation: fail on HTTP errors, no progress
/// meter but keep error messages, follow redirects.
fn curl_common_args(timeout: u32) -> Vec<String> {
    vec![
        "--fail".to_string(),
        "--silent".to_string(),
        "--show-error".to_string(),
        "--location".to_string(),
        "--max-time".to_string(),
        timeout.to_string(),
    ]
}

/// GET a URL and write the body to stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurlFetchArgs {
    pub url: String,
    pub timeout: u32,
}

impl CurlFetchArgs {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_CURL_TIMEOUT,
        }
    }
}

impl CommandArgs for CurlFetchArgs {
    fn program(&self) -> &'static str {
        "curl"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = curl_common_args(self.timeout);
        args.push(self.url.clone());
        args
    }
}

/// Download a URL into a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurlDownloadArgs {
    pub url: String,
    pub output: PathBuf,
    pub timeout: u32,
}

impl CurlDownloadArgs {
    pub fn new(url: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output: output.into(),
            timeout: DEFAULT_CURL_TIMEOUT,
        }
    }
}

impl CommandArgs for CurlDownloadArgs {
    fn program(&self) -> &'static str {
        "curl"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = curl_common_args(self.timeout);
        args.push("--output".to_string());
        args.push(self.output.to_string_lossy().into_owned());
        args.push(self.url.clone());
        args
    }
}
