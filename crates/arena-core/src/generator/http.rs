//! Generator backed by a remote HTTP endpoint.
//!
//! POSTs a [`GenerationRequest`] as JSON and expects `{"pattern": "..."}`.

use async_trait::async_trait;

use super::{CandidateGenerator, GenerationRequest, GenerationResponse};
use crate::domain::error::{ArenaError, ArenaResult};

pub struct HttpGenerator {
    name: String,
    endpoint: String,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl HttpGenerator {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> ArenaResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("regex-arena/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ArenaError::InvalidConfig(format!("http client: {}", e)))?;
        Ok(Self {
            name: name.into(),
            endpoint: endpoint.into(),
            token: None,
            http_client,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn failure(&self, reason: impl Into<String>) -> ArenaError {
        ArenaError::Generation {
            generator: self.name.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl CandidateGenerator for HttpGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerationRequest) -> ArenaResult<GenerationResponse> {
        tracing::debug!(generator = %self.name, endpoint = %self.endpoint, "requesting candidate");

        let mut req = self.http_client.post(&self.endpoint).json(request);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| self.failure(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.failure(format!("endpoint returned {}", status)));
        }

        response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| self.failure(format!("malformed response: {}", e)))
    }
}
