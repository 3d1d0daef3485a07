//! Configuration Management
//!
//! Run settings, credentials and the default label skip-list

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Public GitHub REST API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// HTTP timeout applied to every request unless overridden
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Number of repository pairs synchronized at the same time
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Labels GitHub seeds into every new repository
pub const BUILTIN_DEFAULT_LABELS: &[&str] = &[
    "bug",
    "documentation",
    "duplicate",
    "enhancement",
    "good first issue",
    "help wanted",
    "invalid",
    "question",
    "wontfix",
];

/// Set of label names excluded from synchronization
///
/// Names are stored lowercased and looked up case-insensitively, so
/// `Bug`, `BUG` and `bug` all match the built-in `bug` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultLabelSet {
    names: BTreeSet<String>,
}

impl DefaultLabelSet {
    /// GitHub's built-in default labels
    pub fn builtin() -> Self {
        BUILTIN_DEFAULT_LABELS.iter().copied().collect()
    }

    /// An empty set (nothing is skipped)
    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    /// Add a name to the set
    pub fn insert(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.names.insert(name.to_lowercase());
        }
    }

    /// Case-insensitive membership test
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for DefaultLabelSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<S: AsRef<str>> FromIterator<S> for DefaultLabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::empty();
        for name in iter {
            set.insert(name.as_ref());
        }
        set
    }
}

impl<S: AsRef<str>> Extend<S> for DefaultLabelSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for name in iter {
            self.insert(name.as_ref());
        }
    }
}

/// Access tokens for both sides of a sync
///
/// The source token is used for reading labels, the destination token for
/// the existence check and the write. A missing token means the request is
/// sent without an `Authorization` header.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub source: Option<String>,
    pub destination: Option<String>,
}

impl Credentials {
    pub fn new(source: Option<String>, destination: Option<String>) -> Self {
        Self {
            source: source.filter(|t| !t.trim().is_empty()),
            destination: destination.filter(|t| !t.trim().is_empty()),
        }
    }
}

// Tokens must never end up in logs through `{:?}`.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |t: &Option<String>| if t.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("source", &mask(&self.source))
            .field("destination", &mask(&self.destination))
            .finish()
    }
}

/// Sync Configuration
///
/// Built once at startup and shared by every pair worker
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// REST API base URL (e.g. `https://api.github.com` or a GHES `/api/v3` root)
    pub api_url: Url,

    /// Source and destination tokens
    pub credentials: Credentials,

    /// Per-request HTTP timeout
    pub timeout: Duration,

    /// Maximum number of pairs processed concurrently
    pub concurrency: usize,

    /// Labels never copied to the destination
    pub default_labels: DefaultLabelSet,

    /// Dry-run mode (check existence but don't write)
    pub dry_run: bool,
}

impl SyncConfig {
    /// Create a configuration with default settings for the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            credentials,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            default_labels: DefaultLabelSet::builtin(),
            dry_run: false,
        }
    }

    /// Set the API base URL from a string
    ///
    /// # Errors
    /// Returns an error if the string is not an absolute http(s) URL
    pub fn set_api_url(&mut self, api_url: &str) -> Result<()> {
        self.api_url = parse_api_url(api_url)?;
        Ok(())
    }

    /// Overlay values from a configuration file
    ///
    /// Excluded labels are added to the current skip-list rather than
    /// replacing it.
    ///
    /// # Errors
    /// Returns an error if the file's API URL is invalid
    pub fn apply_file(&mut self, file: &FileConfig) -> Result<()> {
        if let Some(api_url) = &file.api_url {
            self.set_api_url(api_url)?;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(concurrency) = file.concurrency {
            self.concurrency = concurrency;
        }
        self.default_labels.extend(&file.excluded_labels);
        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    /// - If concurrency is zero
    /// - If the timeout is zero
    /// - If the API URL cannot have path segments appended
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::config_validation("Concurrency must be at least 1"));
        }

        if self.timeout.is_zero() {
            return Err(Error::config_validation("Timeout must be greater than zero"));
        }

        if self.api_url.cannot_be_a_base() {
            return Err(Error::InvalidApiUrl(self.api_url.to_string()));
        }

        Ok(())
    }
}

/// Optional settings file (JSON or YAML)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// REST API base URL
    pub api_url: Option<String>,

    /// HTTP timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Maximum number of pairs processed concurrently
    pub concurrency: Option<usize>,

    /// Extra label names to skip, on top of the built-in defaults
    pub excluded_labels: Vec<String>,
}

/// Load a settings file, detecting format by extension
///
/// # Errors
/// If file reading or parsing fails, or if the extension is unsupported
pub fn load_file_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Configuration file not found: {}", path.display()),
        )
        .into());
    }

    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(serde_json::from_str(&content)?),
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        _ => Err(Error::config_validation(
            "Configuration file must be .json, .yaml, or .yml",
        )),
    }
}

/// Parse an API base URL
///
/// # Errors
/// Returns an error if the URL is malformed or not http(s)
pub fn parse_api_url(api_url: &str) -> Result<Url> {
    let url = Url::parse(api_url.trim())?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(Error::InvalidApiUrl(api_url.to_string()));
    }
    Ok(url)
}

/// Parse repository string into owner and name
///
/// `.` and `..` are rejected as either part since they would collapse into
/// a different URL path.
///
/// # Arguments
/// - `repo`: Repository string in "owner/repo" format
///
/// # Errors
/// Returns an error if the format is invalid
pub fn parse_repository(repo: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = repo.split('/').collect();
    let invalid_part = |part: &str| matches!(part, "" | "." | "..");
    if parts.len() != 2 || parts.iter().any(|part| invalid_part(part)) {
        return Err(Error::InvalidRepositoryFormat(repo.to_string()));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_default_labels_case_insensitive() {
        let set = DefaultLabelSet::builtin();
        assert_eq!(set.len(), BUILTIN_DEFAULT_LABELS.len());

        assert!(set.contains("bug"));
        assert!(set.contains("Bug"));
        assert!(set.contains("BUG"));
        assert!(set.contains("Good First Issue"));

        assert!(!set.contains("feature-x"));
        assert!(!set.contains("bugs"));
    }

    #[test]
    fn test_default_label_set_extend() {
        let mut set = DefaultLabelSet::builtin();
        set.extend(["Needs Triage", "  ", ""]);
        assert_eq!(set.len(), BUILTIN_DEFAULT_LABELS.len() + 1);
        assert!(set.contains("needs triage"));
    }

    #[test]
    fn test_credentials_debug_hides_tokens() {
        let creds = Credentials::new(Some("secret-src".to_string()), None);
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("secret-src"));
        assert!(debug.contains("<set>"));
        assert!(debug.contains("<unset>"));
    }

    #[test]
    fn test_credentials_blank_token_is_unset() {
        let creds = Credentials::new(Some("  ".to_string()), Some("dst".to_string()));
        assert_eq!(creds.source, None);
        assert_eq!(creds.destination.as_deref(), Some("dst"));
    }

    #[test]
    fn test_parse_repository() {
        assert!(parse_repository("owner/repo").is_ok());
        assert!(parse_repository("org/project").is_ok());

        assert!(parse_repository("repo").is_err()); // No slash
        assert!(parse_repository("/repo").is_err()); // No owner
        assert!(parse_repository("owner/").is_err()); // No repo name
        assert!(parse_repository("owner/repo/sub").is_err()); // Too many parts
        assert!(parse_repository("owner/..").is_err()); // Dot segments
        assert!(parse_repository("./repo").is_err());
        assert!(parse_repository("owner/.github").is_ok());
    }

    #[test]
    fn test_parse_api_url() {
        assert!(parse_api_url("https://api.github.com").is_ok());
        assert!(parse_api_url("https://ghe.example.com/api/v3").is_ok());

        assert!(parse_api_url("not a url").is_err());
        assert!(parse_api_url("ftp://example.com").is_err());
        assert!(parse_api_url("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_sync_config_defaults_valid() {
        let config = SyncConfig::new(Credentials::default());
        assert_eq!(config.api_url.as_str(), "https://api.github.com/");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.concurrency, 1);
        assert!(!config.dry_run);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sync_config_zero_concurrency_error() {
        let mut config = SyncConfig::new(Credentials::default());
        config.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sync_config_zero_timeout_error() {
        let mut config = SyncConfig::new(Credentials::default());
        config.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_file_overrides_and_extends() {
        let mut config = SyncConfig::new(Credentials::default());
        let file = FileConfig {
            api_url: Some("https://ghe.example.com/api/v3".to_string()),
            timeout_secs: Some(5),
            concurrency: Some(4),
            excluded_labels: vec!["wip".to_string()],
        };
        config.apply_file(&file).unwrap();

        assert_eq!(config.api_url.as_str(), "https://ghe.example.com/api/v3");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.concurrency, 4);
        assert!(config.default_labels.contains("WIP"));
        assert!(config.default_labels.contains("bug"));
    }

    #[test]
    fn test_load_file_config_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.json");
        std::fs::write(
            &path,
            r#"{"timeout_secs": 10, "excluded_labels": ["wip"]}"#,
        )
        .unwrap();
        let file = load_file_config(&path).unwrap();
        assert_eq!(file.timeout_secs, Some(10));
        assert_eq!(file.excluded_labels, vec!["wip".to_string()]);
        assert_eq!(file.api_url, None);
    }

    #[test]
    fn test_load_file_config_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.yml");
        std::fs::write(&path, "concurrency: 3\nexcluded_labels:\n  - stale\n").unwrap();
        let file = load_file_config(&path).unwrap();
        assert_eq!(file.concurrency, Some(3));
        assert_eq!(file.excluded_labels, vec!["stale".to_string()]);
    }

    #[test]
    fn test_load_file_config_unknown_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.json");
        std::fs::write(&path, r#"{"token": "oops"}"#).unwrap();
        assert!(load_file_config(&path).is_err());
    }

    #[test]
    fn test_load_file_config_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        std::fs::write(&path, "").unwrap();
        assert!(load_file_config(&path).is_err());
    }

    #[test]
    fn test_load_file_config_not_found() {
        assert!(load_file_config("/nonexistent/sync.json").is_err());
    }
}
