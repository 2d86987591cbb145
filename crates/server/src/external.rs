use std::time::Duration;

use catalog::ExtractedFeatures;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Client for the audio feature extraction service.
#[derive(Clone, Debug)]
pub struct FeatureClient {
    client: Client,
    endpoint: Option<String>,
    timeout: Duration,
}

#[derive(Serialize)]
struct FeatureRequest<'a> {
    media_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct FeatureResponse {
    #[serde(alias = "tempo")]
    bpm: f64,
    key: Option<String>,
    duration: Option<String>,
    duration_secs: Option<f64>,
}

impl FeatureClient {
    pub fn new(client: Client, endpoint: &str, timeout: Duration) -> Self {
        let endpoint = endpoint.trim();
        Self {
            client,
            endpoint: (!endpoint.is_empty()).then(|| endpoint.to_string()),
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    pub async fn extract(&self, media_url: &str) -> Result<ExtractedFeatures, String> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| "feature extractor not configured".to_string())?;
        let media_url = media_url.trim();
        if media_url.is_empty() {
            return Err("media url is required".to_string());
        }
        let response = self
            .client
            .post(endpoint)
            .timeout(self.timeout)
            .json(&FeatureRequest { media_url })
            .send()
            .await
            .map_err(|err| err.to_string())?;
        if !response.status().is_success() {
            return Err(format!("http {}", response.status()));
        }
        let payload = response
            .json::<FeatureResponse>()
            .await
            .map_err(|err| err.to_string())?;
        features_from_response(payload)
    }
}

fn features_from_response(payload: FeatureResponse) -> Result<ExtractedFeatures, String> {
    if !payload.bpm.is_finite() || payload.bpm <= 0.0 {
        return Err(format!("invalid tempo: {}", payload.bpm));
    }
    let duration = match (clean_text(payload.duration), payload.duration_secs) {
        (Some(label), _) => label,
        (None, Some(secs)) if secs.is_finite() && secs >= 0.0 => duration_label(secs),
        _ => return Err("missing duration".to_string()),
    };
    Ok(ExtractedFeatures {
        bpm: payload.bpm.round() as i64,
        key: clean_text(payload.key).unwrap_or_default(),
        duration,
    })
}

/// Formats seconds as `M:SS`.
fn duration_label(secs: f64) -> String {
    let total = secs.round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn clean_text(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
