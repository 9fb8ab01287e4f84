use serde_json::Value;

use crate::errors::OpsError;

/// Status and raw body of one smoke-test request.
#[derive(Debug, Clone)]
pub struct SmokeResponse {
    pub status: u16,
    pub body: String,
}

impl SmokeResponse {
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Body for log lines, cut to a readable length.
    pub fn excerpt(&self) -> String {
        const MAX: usize = 300;
        match self.body.char_indices().nth(MAX) {
            Some((idx, _)) => format!("{}...", &self.body[..idx]),
            None => self.body.clone(),
        }
    }
}

/// HTTP client for the backend under test.
#[derive(Clone)]
pub struct SmokeClient {
    client: reqwest::Client,
    base_url: String,
}

impl SmokeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, OpsError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| OpsError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<SmokeResponse, OpsError> {
        let url = self.url(path);
        tracing::debug!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| OpsError::Http(format!("GET {} failed: {}", url, e)))?;
        Self::read(response).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<SmokeResponse, OpsError> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| OpsError::Http(format!("POST {} failed: {}", url, e)))?;
        Self::read(response).await
    }

    async fn read(response: reqwest::Response) -> Result<SmokeResponse, OpsError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(SmokeResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_truncates_long_bodies() {
        let response = SmokeResponse {
            status: 200,
            body: "é".repeat(400),
        };
        assert_eq!(response.excerpt().chars().count(), 303);

        let short = SmokeResponse {
            status: 200,
            body: "{\"ok\":true}".to_string(),
        };
        assert_eq!(short.excerpt(), short.body);
        assert_eq!(short.json().unwrap()["ok"], true);
    }
}
