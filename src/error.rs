//! Error Handling
//!
//! Error type definitions used in gh-label-sync

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error types for gh-label-sync
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API returned {status} for {url}: {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration validation error: {0}")]
    ConfigValidation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid API base URL: {0}")]
    InvalidApiUrl(String),

    #[error("Invalid repository format: {0} (expected 'owner/repo')")]
    InvalidRepositoryFormat(String),

    #[error("Invalid label name: {0:?} cannot be used as a URL path segment")]
    InvalidLabelName(String),
}

impl Error {
    /// Create a new configuration validation error
    pub fn config_validation<S: Into<String>>(message: S) -> Self {
        Error::ConfigValidation(message.into())
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Error::Api {
            status: 422,
            url: "https://api.github.com/repos/o/r/labels".to_string(),
            message: "Validation Failed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "GitHub API returned 422 for https://api.github.com/repos/o/r/labels: Validation Failed"
        );
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn test_config_validation_has_no_status() {
        let err = Error::config_validation("bad");
        assert_eq!(err.to_string(), "Configuration validation error: bad");
        assert_eq!(err.status(), None);
    }
}
