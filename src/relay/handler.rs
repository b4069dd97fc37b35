use crate::config::{AppConfig, ConfigResolver};
use crate::relay::error::{RelayError, RelayResult};
use crate::relay::upstream::UpstreamClient;
use crate::types::{
    ChatCompletionRequest, ChatRequest, ConfigInfo, ImageParameters, ImageQuery, ImageRequest,
    ImageResult, DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH,
};
use axum::{
    extract::State,
    http::{Method, StatusCode},
    Json,
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// The handler set behind every route. Holds the shared upstream client
/// and the configuration capability; no state survives a request.
#[derive(Clone)]
pub struct RelayHandler {
    upstream: UpstreamClient,
    config: ConfigResolver,
}

impl RelayHandler {
    /// Production wiring: configuration is re-read from the process
    /// environment on every request.
    pub fn new(upstream: UpstreamClient) -> Self {
        Self {
            upstream,
            config: Arc::new(AppConfig::from_env),
        }
    }

    /// Fixed-configuration wiring for tests.
    pub fn with_config(upstream: UpstreamClient, config: AppConfig) -> Self {
        Self {
            upstream,
            config: Arc::new(move || config.clone()),
        }
    }

    /// `POST /api/chat`: forward a prompt to the chat completion API
    /// and relay the upstream JSON verbatim.
    pub async fn handle_chat(
        State(handler): State<Arc<RelayHandler>>,
        method: Method,
        body: Bytes,
    ) -> RelayResult<Json<serde_json::Value>> {
        if method != Method::POST {
            return Err(RelayError::MethodNotAllowed);
        }

        let request: ChatRequest = serde_json::from_slice(&body)?;
        let prompt = request.prompt.unwrap_or_default();
        if prompt.trim().is_empty() {
            return Err(RelayError::PromptRequired);
        }

        let config = (handler.config)();
        if !config.api.has_api_key() {
            return Err(RelayError::ApiKeyMissing);
        }

        let model = effective_model(request.model.as_deref(), &config.api.default_model);
        debug!("Chat request using model '{}'", model);

        let payload = ChatCompletionRequest::single_user_message(model, prompt);
        let data = handler.upstream.chat_completion(&config.api, &payload).await?;

        Ok(Json(data))
    }

    /// `GET /api/models`: relay the upstream model listing verbatim.
    pub async fn handle_models(
        State(handler): State<Arc<RelayHandler>>,
        method: Method,
    ) -> RelayResult<Json<serde_json::Value>> {
        if method != Method::GET {
            return Err(RelayError::MethodNotAllowed);
        }

        let config = (handler.config)();
        if !config.api.has_api_key() {
            return Err(RelayError::ApiKeyMissing);
        }

        let data = handler.upstream.list_models(&config.api).await?;

        Ok(Json(data))
    }

    /// `GET /api/config`: report the effective configuration without
    /// exposing the key itself.
    pub async fn handle_config(
        State(handler): State<Arc<RelayHandler>>,
        method: Method,
    ) -> RelayResult<Json<ConfigInfo>> {
        if method != Method::GET {
            return Err(RelayError::MethodNotAllowed);
        }

        let config = (handler.config)();

        Ok(Json(ConfigInfo {
            has_api_key: config.api.has_api_key(),
            default_model: config.api.default_model,
            api_url: config.api.base_url,
        }))
    }

    /// `POST /api/image`: request an image render and hand back the URL
    /// it is served from. Works without an API key.
    pub async fn handle_image(
        State(handler): State<Arc<RelayHandler>>,
        method: Method,
        body: Bytes,
    ) -> RelayResult<Json<ImageResult>> {
        if method != Method::POST {
            return Err(RelayError::MethodNotAllowed);
        }

        let request: ImageRequest = serde_json::from_slice(&body)?;
        let prompt = request.prompt.unwrap_or_default();
        if prompt.trim().is_empty() {
            return Err(RelayError::PromptRequired);
        }

        let config = (handler.config)();
        let model = effective_model(request.model.as_deref(), &config.image.default_model);
        let width = request.width.unwrap_or(DEFAULT_IMAGE_WIDTH);
        let height = request.height.unwrap_or(DEFAULT_IMAGE_HEIGHT);

        let query = ImageQuery {
            model: model.clone(),
            width,
            height,
            seed: request.seed,
            nologo: request.nologo.filter(|&set| set),
            enhance: request.enhance.filter(|&set| set),
            safe: request.safe.filter(|&set| set),
            referrer: config.image.referrer.clone(),
        };

        let fetch = handler
            .upstream
            .fetch_image(&config.image, &prompt, &query)
            .await?;

        Ok(Json(ImageResult {
            success: true,
            image_url: fetch.url,
            model,
            prompt,
            parameters: ImageParameters {
                width,
                height,
                seed: request.seed,
                nologo: request.nologo.unwrap_or(false),
                enhance: request.enhance.unwrap_or(false),
                safe: request.safe.unwrap_or(false),
            },
        }))
    }

    /// Health check endpoint
    pub async fn health_check() -> Result<&'static str, StatusCode> {
        Ok("OK")
    }
}

/// The model a request actually runs against: the caller's choice when
/// it is non-blank after trimming, the configured default otherwise.
fn effective_model(requested: Option<&str>, default_model: &str) -> String {
    match requested.map(str::trim) {
        Some(model) if !model.is_empty() => model.to_string(),
        _ => default_model.to_string(),
    }
}
