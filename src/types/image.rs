use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_WIDTH: u32 = 800;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 600;

/// Query string for the upstream image API. Flags serialize only when
/// set, so `nologo=true` appears or the parameter is absent entirely.
#[derive(Debug, Clone, Serialize)]
pub struct ImageQuery {
    pub model: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nologo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

/// Successful image response: the upstream URL that serves the rendered
/// image plus an echo of the parameters that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub success: bool,
    pub image_url: String,
    pub model: String,
    pub prompt: String,
    pub parameters: ImageParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageParameters {
    pub width: u32,
    pub height: u32,
    pub seed: Option<u64>,
    pub nologo: bool,
    pub enhance: bool,
    pub safe: bool,
}
