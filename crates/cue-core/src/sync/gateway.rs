//! Remote data gateway.
//!
//! The engine only depends on [`RemoteGateway`]; [`HttpRemoteGateway`] is the
//! JSON-over-HTTP implementation used by the CLI.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::RemoteConfig;
use crate::models::{ExpandedTimeline, VideoId};
use crate::util::compact_text;

use super::error::GatewayError;

/// Fetch and upload of expanded annotation sets
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Remote annotations for the video; empty when the remote has none
    async fn fetch(&self, video_id: &VideoId) -> Result<Vec<ExpandedTimeline>, GatewayError>;

    /// Replace the remote annotations for the video
    async fn upload(
        &self,
        video_id: &VideoId,
        timelines: &[ExpandedTimeline],
    ) -> Result<(), GatewayError>;
}

/// `GET`/`PUT {base}/v1/videos/{id}/annotations`
#[derive(Clone)]
pub struct HttpRemoteGateway {
    base_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl HttpRemoteGateway {
    pub fn new(config: &RemoteConfig) -> Result<Self, GatewayError> {
        let base_url = config.api_base_url().map_err(GatewayError::Other)?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|error| GatewayError::Other(error.to_string()))?;
        Ok(Self {
            base_url,
            access_token: config.access_token.clone(),
            client,
        })
    }

    fn annotations_url(&self, video_id: &VideoId) -> String {
        format!(
            "{}/v1/videos/{}/annotations",
            self.base_url,
            urlencoding::encode(video_id.as_str())
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl RemoteGateway for HttpRemoteGateway {
    async fn fetch(&self, video_id: &VideoId) -> Result<Vec<ExpandedTimeline>, GatewayError> {
        let response = self
            .authorize(self.client.get(self.annotations_url(video_id)))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        // No annotations uploaded yet for this video
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        decode_timelines(&body)
    }

    async fn upload(
        &self,
        video_id: &VideoId,
        timelines: &[ExpandedTimeline],
    ) -> Result<(), GatewayError> {
        let response = self
            .authorize(self.client.put(self.annotations_url(video_id)))
            .json(timelines)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

fn decode_timelines(body: &str) -> Result<Vec<ExpandedTimeline>, GatewayError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(body).map_err(|error| GatewayError::Decoding(error.to_string()))
}

fn transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_decode() {
        GatewayError::Decoding(error.to_string())
    } else {
        GatewayError::Network(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn status_error(status: StatusCode, body: &str) -> GatewayError {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return GatewayError::Unauthorized;
    }
    GatewayError::Server {
        code: status.as_u16(),
        message: parse_api_error(status, body),
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return message.trim().to_string();
        }
    }

    let compacted = compact_text(body);
    if compacted.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        compacted
    }
}
