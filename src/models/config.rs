use serde::{Deserialize, Serialize};

/// Body for POST /api/config. `pairAddress` is required; a missing
/// `communityId` triggers auto-discovery from the pair's social URL.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigRequest {
    #[serde(rename = "pairAddress")]
    pub pair_address: Option<String>,
    #[serde(rename = "communityId")]
    pub community_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigView {
    #[serde(rename = "pairAddress")]
    pub pair_address: String,
    #[serde(rename = "communityId")]
    pub community_id: String,
    #[serde(rename = "twitterUrl")]
    pub twitter_url: Option<String>,
    #[serde(rename = "autoDiscovered")]
    pub auto_discovered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigResponse {
    pub status: String,
    pub message: String,
    pub config: ConfigView,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentConfigResponse {
    #[serde(rename = "pairAddress")]
    pub pair_address: Option<String>,
    #[serde(rename = "communityId")]
    pub community_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "twitterUrl")]
    pub twitter_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            twitter_url: None,
            suggestion: None,
        }
    }
}
