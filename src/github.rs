//! GitHub Label API Client
//!
//! Module for reading labels from a source repository and writing them to a
//! destination repository over the GitHub REST API

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{parse_repository, Credentials, SyncConfig};
use crate::error::{Error, Result};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Page size requested when listing labels (only the first page is read)
pub const LABELS_PER_PAGE: u32 = 100;

/// GitHub Label Information
///
/// Represents label information retrieved from the GitHub API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitHubLabel {
    /// Label name
    pub name: String,

    /// Label color (6-digit hexadecimal, without #)
    pub color: String,

    /// Label description
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for creating or updating a label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelPayload {
    pub name: String,
    pub color: String,
    pub description: String,
}

impl From<&GitHubLabel> for LabelPayload {
    fn from(label: &GitHubLabel) -> Self {
        LabelPayload {
            name: label.name.clone(),
            color: label.color.clone(),
            description: label.description.clone().unwrap_or_default(),
        }
    }
}

/// What an upsert did (or would do, in dry-run mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Source,
    Destination,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// GitHub Label API Client
///
/// Holds one connection pool and both sets of credentials. Reads go out with
/// the source token, existence checks and writes with the destination token.
#[derive(Debug, Clone)]
pub struct LabelClient {
    http: reqwest::Client,
    api_url: Url,
    credentials: Credentials,
}

impl LabelClient {
    /// Create a new client from the run configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            credentials: config.credentials.clone(),
        })
    }

    /// Collection URL listing a repository's labels
    ///
    /// # Errors
    /// Returns an error if `repository` is not in `owner/name` form
    pub fn labels_url(&self, repository: &str) -> Result<Url> {
        let (owner, name) = parse_repository(repository)?;
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidApiUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(["repos", owner.as_str(), name.as_str(), "labels"]);
        Ok(url)
    }

    /// Get the labels defined on a repository
    ///
    /// # Arguments
    /// - `labels_url`: Collection URL from [`LabelClient::labels_url`]
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-2xx status
    pub async fn fetch_labels(&self, labels_url: &Url) -> Result<Vec<GitHubLabel>> {
        tracing::info!("Fetching labels from {}", labels_url);

        let response = self
            .request(Method::GET, labels_url.clone(), Side::Source)
            .query(&[("per_page", LABELS_PER_PAGE)])
            .send()
            .await?;

        let labels: Vec<GitHubLabel> = check_status(response).await?.json().await?;
        tracing::debug!(count = labels.len(), "Fetched labels from {}", labels_url);
        Ok(labels)
    }

    /// Look up a single label on the destination
    ///
    /// # Returns
    /// `None` if the label does not exist
    ///
    /// # Errors
    /// Returns an error on transport failure or any status other than 2xx/404
    pub async fn get_label(&self, label_url: &Url) -> Result<Option<GitHubLabel>> {
        let response = self
            .request(Method::GET, label_url.clone(), Side::Destination)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let label = check_status(response).await?.json().await?;
        Ok(Some(label))
    }

    /// Create a new label
    ///
    /// # Errors
    /// Returns an error if GitHub API fails or label creation fails
    pub async fn create_label(&self, labels_url: &Url, label: &LabelPayload) -> Result<GitHubLabel> {
        let response = self
            .request(Method::POST, labels_url.clone(), Side::Destination)
            .json(label)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Update an existing label in place
    ///
    /// # Errors
    /// Returns an error if GitHub API fails or label update fails
    pub async fn update_label(&self, label_url: &Url, label: &LabelPayload) -> Result<GitHubLabel> {
        let response = self
            .request(Method::PATCH, label_url.clone(), Side::Destination)
            .json(label)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Create the label on the destination, or update it if it already exists
    ///
    /// Issues exactly one existence check and, unless `dry_run` is set,
    /// exactly one write.
    ///
    /// # Arguments
    /// - `labels_url`: Destination collection URL
    /// - `label`: Label to write
    /// - `dry_run`: Skip the write and only report what would happen
    ///
    /// # Errors
    /// Returns an error if either request fails
    pub async fn upsert_label(
        &self,
        labels_url: &Url,
        label: &LabelPayload,
        dry_run: bool,
    ) -> Result<UpsertAction> {
        let label_url = label_url(labels_url, &label.name)?;

        match self.get_label(&label_url).await? {
            Some(_) => {
                tracing::info!("Updating label '{}' in {}", label.name, labels_url);
                if !dry_run {
                    self.update_label(&label_url, label).await?;
                }
                Ok(UpsertAction::Updated)
            }
            None => {
                tracing::info!("Creating label '{}' in {}", label.name, labels_url);
                if !dry_run {
                    self.create_label(labels_url, label).await?;
                }
                Ok(UpsertAction::Created)
            }
        }
    }

    fn request(&self, method: Method, url: Url, side: Side) -> RequestBuilder {
        let token = match side {
            Side::Source => self.credentials.source.as_deref(),
            Side::Destination => self.credentials.destination.as_deref(),
        };

        let builder = self.http.request(method, url);
        match token {
            Some(token) => builder.header(AUTHORIZATION, format!("token {}", token)),
            None => builder,
        }
    }
}

/// Per-label URL under a collection URL
///
/// The name is pushed as one path segment, so spaces, slashes and non-ASCII
/// characters are percent-encoded. Empty, `.` and `..` names cannot be
/// addressed as a path segment (URL normalization removes them, even when
/// percent-encoded) and are rejected.
///
/// # Errors
/// Returns an error if the name cannot form a path segment or `labels_url`
/// cannot have path segments
pub fn label_url(labels_url: &Url, name: &str) -> Result<Url> {
    if matches!(name, "" | "." | "..") {
        return Err(Error::InvalidLabelName(name.to_string()));
    }

    let mut url = labels_url.clone();
    url.path_segments_mut()
        .map_err(|_| Error::InvalidApiUrl(labels_url.to_string()))?
        .pop_if_empty()
        .push(name);
    Ok(url)
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        url,
        message: api_error_message(&body, status),
    })
}

fn api_error_message(body: &str, status: StatusCode) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_url: &str) -> LabelClient {
        let mut config = SyncConfig::new(Credentials::default());
        config.set_api_url(api_url).unwrap();
        LabelClient::new(&config).unwrap()
    }

    #[test]
    fn test_labels_url() {
        let client = client("https://api.github.com");
        let url = client.labels_url("orgA/repo1").unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/repos/orgA/repo1/labels");
    }

    #[test]
    fn test_labels_url_enterprise_base() {
        let client = client("https://ghe.example.com/api/v3/");
        let url = client.labels_url("team/app").unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/team/app/labels"
        );
    }

    #[test]
    fn test_labels_url_invalid_repository() {
        let client = client("https://api.github.com");
        assert!(client.labels_url("no-owner").is_err());
        assert!(client.labels_url("a/b/c").is_err());
        assert!(client.labels_url("owner/..").is_err());
        assert!(client.labels_url("./repo").is_err());
    }

    #[test]
    fn test_label_url_encoding() {
        let base = Url::parse("https://api.github.com/repos/o/r/labels").unwrap();

        // Basic ASCII characters
        assert_eq!(
            label_url(&base, "feature-request").unwrap().as_str(),
            "https://api.github.com/repos/o/r/labels/feature-request"
        );

        // Spaces
        assert_eq!(
            label_url(&base, "good first issue").unwrap().path(),
            "/repos/o/r/labels/good%20first%20issue"
        );

        // Slashes stay inside one segment
        assert_eq!(
            label_url(&base, "area/api").unwrap().path(),
            "/repos/o/r/labels/area%2Fapi"
        );

        // Japanese characters (UTF-8)
        assert_eq!(
            label_url(&base, "バグ").unwrap().path(),
            "/repos/o/r/labels/%E3%83%90%E3%82%B0"
        );
    }

    #[test]
    fn test_label_url_rejects_dot_segments() {
        let base = Url::parse("https://api.github.com/repos/o/r/labels").unwrap();

        for name in ["", ".", ".."] {
            match label_url(&base, name) {
                Err(Error::InvalidLabelName(n)) => assert_eq!(n, name),
                other => panic!("expected invalid label name for {:?}, got {:?}", name, other),
            }
        }

        // Dots inside a longer name are fine
        assert_eq!(
            label_url(&base, ".hidden").unwrap().path(),
            "/repos/o/r/labels/.hidden"
        );
        assert_eq!(
            label_url(&base, "...").unwrap().path(),
            "/repos/o/r/labels/..."
        );
    }

    #[test]
    fn test_payload_from_label_defaults_description() {
        let label = GitHubLabel {
            name: "feature-x".to_string(),
            color: "00ff00".to_string(),
            description: None,
        };
        let payload = LabelPayload::from(&label);
        assert_eq!(payload.name, "feature-x");
        assert_eq!(payload.color, "00ff00");
        assert_eq!(payload.description, "");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "feature-x", "color": "00ff00", "description": ""})
        );
    }

    #[test]
    fn test_label_deserialize_null_description() {
        let label: GitHubLabel = serde_json::from_str(
            r#"{"id": 1, "name": "bug", "color": "d73a4a", "description": null, "default": true}"#,
        )
        .unwrap();
        assert_eq!(label.name, "bug");
        assert_eq!(label.description, None);
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(
            api_error_message(r#"{"message": "Not Found"}"#, StatusCode::NOT_FOUND),
            "Not Found"
        );
        assert_eq!(
            api_error_message("", StatusCode::BAD_GATEWAY),
            "Bad Gateway"
        );
        assert_eq!(
            api_error_message("upstream down\n", StatusCode::BAD_GATEWAY),
            "upstream down"
        );
    }
}
