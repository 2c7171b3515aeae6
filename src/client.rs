use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::RjnError;
use crate::timefmt::{self, TimestampInput};

const AUTH_PATH: &str = "/auth";
const UPLOAD_INTERVAL_SECONDS: u32 = 300;
const IMPORT_MODE: &str = "OverwriteExistingData";
// DST is the only incoming-time convention the server accepts without
// shifting the data by whole hours.
const INCOMING_TIME: &str = "DST";
const UPLOAD_COMMENT: &str = "Imported from EDS.";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const BODY_LOG_LIMIT: usize = 100;

/// Bearer credential issued by the auth endpoint. Immutable; pass it into
/// every upload call. Concurrent client instances each hold their own.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    client_id: &'a str,
    password: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct UploadBody {
    comments: &'static str,
    data: BTreeMap<String, f64>,
}

/// Client for the RJN Clarity time-series ingestion API.
pub struct RjnClient {
    http: Client,
    base_url: String,
}

impl RjnClient {
    pub fn new(base_url: &str) -> Result<Self, RjnError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, RjnError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RjnError::Request)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Authenticates against `{base}/auth` and returns the session token.
    ///
    /// Never panics for any network or remote-server condition; every outcome
    /// is a classified `RjnError` plus a log line at the severity matching
    /// its expected recurrence.
    pub async fn authenticate(
        &self,
        client_id: &str,
        password: &str,
    ) -> Result<Session, RjnError> {
        let url = format!("{}{AUTH_PATH}", self.base_url);
        let body = AuthRequest {
            client_id,
            password,
            kind: "script",
        };

        let response = match self.http.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(err) => {
                let classified = RjnError::from_transport(err);
                log_transport(&classified, "authentication");
                return Err(classified);
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            error!("authentication failed: incorrect credentials provided to RJN Clarity");
            return Err(RjnError::AuthFailed);
        }
        if !status.is_success() {
            error!(status = status.as_u16(), %url, "RJN auth endpoint returned an HTTP error");
            return Err(RjnError::Http {
                status: status.as_u16(),
            });
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                let classified = RjnError::from_transport(err);
                log_transport(&classified, "authentication");
                return Err(classified);
            }
        };
        if text.is_empty() {
            error!(%url, "empty response from RJN auth endpoint");
            return Err(RjnError::EmptyResponse);
        }

        let payload: AuthResponse = match serde_json::from_str(&text) {
            Ok(payload) => payload,
            Err(_) => {
                let body_prefix = truncate(&text, BODY_LOG_LIMIT);
                error!(body = %body_prefix, "expected JSON from RJN auth endpoint");
                return Err(RjnError::MalformedResponse { body_prefix });
            }
        };

        match payload.token {
            Some(token) if !token.trim().is_empty() => {
                info!(status = status.as_u16(), "RJN session established");
                Ok(Session {
                    token: token.trim().to_string(),
                })
            }
            _ => {
                error!("login succeeded but no token found in response");
                Err(RjnError::MissingToken)
            }
        }
    }

    /// Uploads one batch of (timestamp, value) pairs for an entity.
    ///
    /// Argument validation failures are `InvalidArgument` and happen before
    /// any network traffic. The batch is all-or-nothing: on failure nothing
    /// is tracked and the caller replays the whole batch next cycle, which
    /// the overwrite import mode makes safe.
    pub async fn upload(
        &self,
        session: &Session,
        project_id: &str,
        entity_id: u32,
        timestamps: &[TimestampInput],
        values: &[f64],
    ) -> Result<(), RjnError> {
        let body = build_upload_body(timestamps, values)?;

        let url = format!(
            "{}/projects/{project_id}/entities/{entity_id}/data",
            self.base_url
        );
        let query = [
            ("interval", UPLOAD_INTERVAL_SECONDS.to_string()),
            ("import_mode", IMPORT_MODE.to_string()),
            ("incoming_time", INCOMING_TIME.to_string()),
        ];

        let response = match self
            .http
            .post(&url)
            .header(AUTHORIZATION, session.bearer())
            .query(&query)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let classified = RjnError::from_transport(err);
                log_transport(&classified, "data upload");
                return Err(classified);
            }
        };

        let status = response.status();
        if status.is_success() {
            info!(
                entity_id,
                status = status.as_u16(),
                points = body.data.len(),
                "sent timestamps and values to RJN entity"
            );
            return Ok(());
        }

        error!(
            entity_id,
            status = status.as_u16(),
            "error sending data to RJN"
        );
        let text = response.text().await.unwrap_or_default();
        if !text.is_empty() {
            debug!(body = %text, "RJN error response body");
        }
        Err(RjnError::Http {
            status: status.as_u16(),
        })
    }
}

fn build_upload_body(
    timestamps: &[TimestampInput],
    values: &[f64],
) -> Result<UploadBody, RjnError> {
    if timestamps.len() != values.len() {
        return Err(RjnError::InvalidArgument(format!(
            "timestamps and values must have the same length: {} vs {}",
            timestamps.len(),
            values.len()
        )));
    }

    let mut data = BTreeMap::new();
    for (timestamp, value) in timestamps.iter().zip(values) {
        let key = timefmt::normalize(timestamp)?;
        if data.insert(key.clone(), *value).is_some() {
            return Err(RjnError::InvalidArgument(format!(
                "duplicate timestamp after normalization: {key}"
            )));
        }
    }

    Ok(UploadBody {
        comments: UPLOAD_COMMENT,
        data,
    })
}

fn log_transport(err: &RjnError, operation: &str) {
    match err {
        RjnError::Network(source) => {
            warn!(
                operation,
                "connection problem talking to RJN Clarity; will retry on the next scheduled cycle"
            );
            debug!(error = %source, "transport error details");
        }
        other => {
            error!(operation, error = %other, "unexpected error talking to RJN Clarity");
        }
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
