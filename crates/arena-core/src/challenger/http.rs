//! Challenger backed by a remote HTTP endpoint.
//!
//! POSTs a [`ChallengeRequest`] as JSON and expects
//! `{"valid": [...], "invalid": [...]}`.

use async_trait::async_trait;

use super::{ChallengeRequest, CorpusChallenger};
use crate::domain::corpus::Corpus;
use crate::domain::error::{ArenaError, ArenaResult};

pub struct HttpChallenger {
    endpoint: String,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl HttpChallenger {
    pub fn new(endpoint: impl Into<String>) -> ArenaResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("regex-arena/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ArenaError::InvalidConfig(format!("http client: {}", e)))?;
        Ok(Self {
            endpoint: endpoint.into(),
            token: None,
            http_client,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[async_trait]
impl CorpusChallenger for HttpChallenger {
    async fn challenge(&self, request: &ChallengeRequest) -> ArenaResult<Corpus> {
        tracing::debug!(
            endpoint = %self.endpoint,
            results = request.round_results.len(),
            "requesting corpus"
        );

        let mut req = self.http_client.post(&self.endpoint).json(request);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ArenaError::Corpus(format!("challenger request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArenaError::Corpus(format!(
                "challenger endpoint returned {}",
                status
            )));
        }

        response
            .json::<Corpus>()
            .await
            .map_err(|e| ArenaError::Corpus(format!("malformed challenger response: {}", e)))
    }
}
