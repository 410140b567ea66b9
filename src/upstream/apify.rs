//! Apify actor client.
//!
//! # Responsibilities
//! - Build the public profile URL for a username
//! - Start an actor run and wait for it to finish
//! - List the run's dataset and hand back the first item
//! - Turn transport and API errors into [`UpstreamFailure`]s
//!
//! Every HTTP call carries its own timeout; a run that does not finish
//! within `max_run_wait_secs` is reported as a timeout.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use url::{form_urlencoded, Url};

use crate::config::UpstreamConfig;
use crate::lookup::profile::RawItem;
use crate::lookup::username::Username;
use crate::upstream::{FailureKind, ProfileSource, UpstreamFailure};

/// Errors raised while constructing the client.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("'{0}' cannot be used as a base URL")]
    NotABase(String),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Wrapper returned by the Apify API around single objects.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// The subset of an actor run object the client needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorRun {
    id: String,
    status: String,
    default_dataset_id: String,
}

impl ActorRun {
    fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_str(),
            "SUCCEEDED" | "FAILED" | "TIMED-OUT" | "ABORTED"
        )
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

/// Client for the configured scraping actor.
#[derive(Clone)]
pub struct ApifyClient {
    http: reqwest::Client,
    api_base: Url,
    profile_base: String,
    actor_id: String,
    token: Option<String>,
    run_wait_secs: u64,
    max_run_wait: Duration,
}

impl ApifyClient {
    /// Create a new client from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, ClientBuildError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("snap-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_base: parse_base(&config.api_base)?,
            profile_base: profile_prefix(&config.profile_base)?,
            actor_id: config.actor_id.clone(),
            token: config.token.clone(),
            run_wait_secs: config.run_wait_secs,
            max_run_wait: Duration::from_secs(config.max_run_wait_secs),
        })
    }

    /// Public profile URL for `username`, percent-encoded as a path segment.
    ///
    /// Kept as text: a `Url` would resolve `.` and `..` segments away and
    /// drop the username.
    pub fn profile_url(&self, username: &Username) -> String {
        let segment: String = form_urlencoded::byte_serialize(username.as_str().as_bytes()).collect();
        format!("{}{}", self.profile_base, segment)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn start_run(&self, profile_url: &str) -> Result<ActorRun, UpstreamFailure> {
        let url = self.endpoint(&["v2", "acts", &self.actor_id, "runs"]);
        let request = self
            .http
            .post(url)
            .query(&[("waitForFinish", self.run_wait_secs)])
            .json(&json!({ "profilesInput": [profile_url] }));

        let run: Envelope<ActorRun> = self.send(request).await?;
        tracing::debug!(run_id = %run.data.id, status = %run.data.status, "Actor run started");
        Ok(run.data)
    }

    async fn wait_for_run(&self, run_id: &str) -> Result<ActorRun, UpstreamFailure> {
        let url = self.endpoint(&["v2", "actor-runs", run_id]);
        let request = self
            .http
            .get(url)
            .query(&[("waitForFinish", self.run_wait_secs)]);

        let run: Envelope<ActorRun> = self.send(request).await?;
        Ok(run.data)
    }

    async fn list_items(&self, dataset_id: &str) -> Result<Vec<Value>, UpstreamFailure> {
        let url = self.endpoint(&["v2", "datasets", dataset_id, "items"]);
        let request = self
            .http
            .get(url)
            .query(&[("format", "json"), ("clean", "true")]);

        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, UpstreamFailure> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(transport_failure)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_failure(status, &body));
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                transport_failure(e)
            } else {
                UpstreamFailure::new(
                    FailureKind::Unknown,
                    format!("unexpected response from actor API: {}", e),
                )
            }
        })
    }

    async fn run_lookup(&self, username: &Username) -> Result<RawItem, UpstreamFailure> {
        let profile_url = self.profile_url(username);
        tracing::info!(username = %username, "Fetching profile from actor");

        let mut run = self.start_run(&profile_url).await?;
        let started = Instant::now();
        while !run.is_terminal() {
            if started.elapsed() >= self.max_run_wait {
                return Err(UpstreamFailure::new(
                    FailureKind::Timeout,
                    format!("actor run {} did not finish in time (status {})", run.id, run.status),
                )
                .with_name("TimeoutError"));
            }
            run = self.wait_for_run(&run.id).await?;
        }

        match run.status.as_str() {
            "SUCCEEDED" => {}
            "TIMED-OUT" => {
                return Err(UpstreamFailure::new(
                    FailureKind::Timeout,
                    format!("actor run {} timed out", run.id),
                ))
            }
            other => {
                return Err(UpstreamFailure::new(
                    FailureKind::Unknown,
                    format!("actor run {} finished with status {}", run.id, other),
                ))
            }
        }

        let items = self.list_items(&run.default_dataset_id).await?;
        items
            .into_iter()
            .next()
            .map(RawItem::from_value)
            .ok_or_else(UpstreamFailure::not_found)
    }
}

#[async_trait]
impl ProfileSource for ApifyClient {
    async fn fetch(&self, username: &Username) -> Result<RawItem, UpstreamFailure> {
        self.run_lookup(username)
            .await
            .map_err(|failure| failure.redact(self.token.as_deref()))
    }
}

fn parse_base(raw: &str) -> Result<Url, ClientBuildError> {
    let url = Url::parse(raw).map_err(|source| ClientBuildError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientBuildError::NotABase(raw.to_string()));
    }
    Ok(url)
}

/// Validated profile base, with exactly one trailing slash.
fn profile_prefix(raw: &str) -> Result<String, ClientBuildError> {
    let url = parse_base(raw)?;
    Ok(format!("{}/", url.as_str().trim_end_matches('/')))
}

fn transport_failure(err: reqwest::Error) -> UpstreamFailure {
    if err.is_timeout() {
        UpstreamFailure::new(FailureKind::Timeout, format!("request timed out: {}", err))
            .with_name("TimeoutError")
    } else if err.is_connect() {
        UpstreamFailure::new(FailureKind::Network, format!("connection failed: {}", err))
    } else {
        UpstreamFailure::new(FailureKind::Network, err.to_string())
    }
}

fn status_failure(status: StatusCode, body: &str) -> UpstreamFailure {
    let detail = serde_json::from_str::<ApiErrorBody>(body).ok().map(|b| b.error);
    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .unwrap_or_else(|| format!("actor API returned {}", status));

    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FailureKind::Auth,
        _ => FailureKind::Unknown,
    };

    let failure = UpstreamFailure::new(kind, message).with_status(status.as_u16());
    match detail.and_then(|d| d.kind) {
        Some(name) => failure.with_name(name),
        None => failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_base: &str) -> ApifyClient {
        let config = UpstreamConfig {
            api_base: api_base.to_string(),
            ..UpstreamConfig::default()
        };
        ApifyClient::new(&config).unwrap()
    }

    #[test]
    fn test_profile_url() {
        let client = client("https://api.apify.com");
        let url = client.profile_url(&Username::parse("@john.doe").unwrap());
        assert_eq!(url, "https://www.snapchat.com/add/john.doe");
    }

    #[test]
    fn test_profile_url_keeps_dot_usernames() {
        let client = client("https://api.apify.com");
        for name in [".", "..", "..."] {
            let url = client.profile_url(&Username::parse(name).unwrap());
            assert_eq!(url, format!("https://www.snapchat.com/add/{}", name));
        }
    }

    #[test]
    fn test_profile_base_without_trailing_slash() {
        let config = UpstreamConfig {
            profile_base: "https://www.snapchat.com/add".to_string(),
            ..UpstreamConfig::default()
        };
        let client = ApifyClient::new(&config).unwrap();
        let url = client.profile_url(&Username::parse("john_doe").unwrap());
        assert_eq!(url, "https://www.snapchat.com/add/john_doe");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("http://127.0.0.1:9999/apify/");
        let url = client.endpoint(&["v2", "acts", "abc", "runs"]);
        assert_eq!(url.as_str(), "http://127.0.0.1:9999/apify/v2/acts/abc/runs");

        let client = self::client("https://api.apify.com");
        let url = client.endpoint(&["v2", "datasets", "ds1", "items"]);
        assert_eq!(url.as_str(), "https://api.apify.com/v2/datasets/ds1/items");
    }

    #[test]
    fn test_rejects_bad_base() {
        let config = UpstreamConfig {
            api_base: "mailto:someone@example.com".to_string(),
            ..UpstreamConfig::default()
        };
        assert!(matches!(ApifyClient::new(&config), Err(ClientBuildError::NotABase(_))));
    }

    #[test]
    fn test_status_failure_auth() {
        let body = r#"{"error":{"type":"token-not-valid","message":"Authentication token is not valid"}}"#;
        let failure = status_failure(StatusCode::UNAUTHORIZED, body);
        assert_eq!(failure.kind, FailureKind::Auth);
        assert_eq!(failure.status, Some(401));
        assert_eq!(failure.name.as_deref(), Some("token-not-valid"));
        assert_eq!(failure.message, "Authentication token is not valid");
    }

    #[test]
    fn test_status_failure_without_body() {
        let failure = status_failure(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(failure.kind, FailureKind::Unknown);
        assert_eq!(failure.status, Some(502));
        assert_eq!(failure.name, None);
        assert!(failure.message.contains("502"));
    }

    #[test]
    fn test_run_terminal_states() {
        let run = |status: &str| ActorRun {
            id: "r".into(),
            status: status.into(),
            default_dataset_id: "d".into(),
        };
        assert!(run("SUCCEEDED").is_terminal());
        assert!(run("ABORTED").is_terminal());
        assert!(!run("RUNNING").is_terminal());
        assert!(!run("TIMING-OUT").is_terminal());
    }
}
