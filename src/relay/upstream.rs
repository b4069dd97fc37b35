use crate::config::{ApiConfig, ImageConfig};
use crate::relay::error::{RelayError, RelayResult};
use crate::types::{ChatCompletionRequest, ImageQuery};
use reqwest::{Client, Url};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Deadline for a chat completion round trip.
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(50);
/// Deadline for an image generation round trip.
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of a successful image fetch. The body itself is not relayed;
/// clients load the image from the final URL.
#[derive(Debug, Clone)]
pub struct ImageFetch {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    chat_timeout: Duration,
    image_timeout: Duration,
}

impl UpstreamClient {
    pub fn new() -> RelayResult<Self> {
        Self::with_timeouts(CHAT_TIMEOUT, IMAGE_TIMEOUT)
    }

    /// Same client with injectable deadlines, so tests can exercise the
    /// timeout paths without waiting out the production values.
    pub fn with_timeouts(chat_timeout: Duration, image_timeout: Duration) -> RelayResult<Self> {
        // No client-wide timeout. The model listing call is unbounded;
        // the chat and image calls carry their own deadlines.
        let client = Client::builder()
            .build()
            .map_err(|e| RelayError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            chat_timeout,
            image_timeout,
        })
    }

    /// Forward a chat completion and return the upstream JSON untouched.
    /// The whole round trip runs under the chat deadline; expiry drops
    /// the in-flight request.
    pub async fn chat_completion(
        &self,
        config: &ApiConfig,
        payload: &ChatCompletionRequest,
    ) -> RelayResult<serde_json::Value> {
        let url = format!("{}/chat/completions", config.base_url.trim());
        let token = config.bearer_token()?;

        debug!("Forwarding chat completion for model '{}' to {}", payload.model, url);

        let send = async {
            let response = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", token))
                .json(payload)
                .send()
                .await
                .map_err(|source| RelayError::ChatRequestFailed { source })?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .map_err(|source| RelayError::ChatRequestFailed { source })?;
                return Err(RelayError::ChatUpstream {
                    status: status.as_u16(),
                    body,
                });
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|source| RelayError::ChatRequestFailed { source })
        };

        match timeout(self.chat_timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::ChatTimeout),
        }
    }

    /// Fetch the upstream model listing. No deadline on this call; the
    /// chat and image endpoints are the only bounded ones.
    pub async fn list_models(&self, config: &ApiConfig) -> RelayResult<serde_json::Value> {
        let url = format!("{}/models", config.base_url.trim());
        let token = config.bearer_token()?;

        debug!("Fetching model listing from {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|source| RelayError::ModelsRequestFailed { source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::ModelsUpstream {
                status: status.as_u16(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|source| RelayError::ModelsRequestFailed { source })
    }

    /// Request an image render and return the final URL it is served
    /// from. The response body must be an image; anything else is an
    /// upstream error page leaking through.
    pub async fn fetch_image(
        &self,
        config: &ImageConfig,
        prompt: &str,
        query: &ImageQuery,
    ) -> RelayResult<ImageFetch> {
        let mut url = Url::parse(config.base_url.trim())
            .map_err(|e| RelayError::internal(format!("Invalid image API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| RelayError::internal("Invalid image API URL"))?
            .push("prompt")
            .push(prompt);

        debug!("Requesting image render from {}", url);

        let mut request = self.client.get(url).query(query);
        if let Some(key) = &config.api_key {
            request = request.header("Authorization", format!("Bearer {}", key.expose_secret()));
        }
        if let Some(referrer) = &config.referrer {
            request = request.header("Referer", referrer);
        }

        let send = async {
            let response = request
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(|source| RelayError::ImageRequestFailed { source })?;

            let is_image = response
                .headers()
                .get("content-type")
                .and_then(|value| value.to_str().ok())
                .map(|value| value.starts_with("image/"))
                .unwrap_or(false);
            if !is_image {
                return Err(RelayError::NotAnImage);
            }

            Ok(ImageFetch {
                url: response.url().to_string(),
            })
        };

        match timeout(self.image_timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::ImageTimeout),
        }
    }
}
