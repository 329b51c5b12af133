use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use courier_core::{SessionTurn, Transcript};
use courier_logging::{courier_debug, courier_info, courier_warn};
use tokio_util::sync::CancellationToken;

use crate::client::{build_http, get_bytes, read_success, HEALTH_PATH};
use crate::types::map_reqwest_error;
use crate::wire::{QueryAnswer, QueryRequest};
use crate::{ClientSettings, TransportError};

const QUERY_PATH: &str = "/v1/query";

/// Domain selector value meaning "search everything".
pub const ALL_DOMAINS: &str = "All Domains";

#[async_trait::async_trait]
pub trait QueryService: Send + Sync {
    async fn query(&self, request: &QueryRequest) -> Result<QueryAnswer, TransportError>;
}

/// reqwest-backed client for the orchestrator's query endpoint.
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    http: reqwest::Client,
    settings: ClientSettings,
}

impl OrchestratorClient {
    pub fn new(settings: ClientSettings) -> Result<Self, TransportError> {
        let http = build_http(&settings)?;
        Ok(Self { http, settings })
    }

    pub async fn health(&self) -> Result<(), TransportError> {
        let url = self.settings.orchestrator_endpoint(HEALTH_PATH);
        get_bytes(&self.http, &url, self.settings.status_timeout)
            .await
            .map(|_| ())
    }
}

#[async_trait::async_trait]
impl QueryService for OrchestratorClient {
    async fn query(&self, request: &QueryRequest) -> Result<QueryAnswer, TransportError> {
        let url = self.settings.orchestrator_endpoint(QUERY_PATH);
        let response = self
            .http
            .post(&url)
            .timeout(self.settings.query_timeout)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body = read_success(response).await?;
        serde_json::from_slice(&body)
            .map_err(|err| TransportError::MalformedResponse(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    Answered(SessionTurn),
    /// A newer `ask` (or an explicit cancel) replaced this one. Nothing was
    /// recorded and there is nothing to report.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Default)]
struct SessionInner {
    generation: u64,
    in_flight: Option<CancellationToken>,
    transcript: Transcript,
    conversation_id: Option<String>,
}

/// Single-flight conversational session.
///
/// Clones share the same session. Starting an `ask` cancels whichever one is
/// still outstanding; the superseded call resolves to
/// [`AskOutcome::Superseded`] and never touches the transcript.
#[derive(Clone)]
pub struct QuerySession {
    service: Arc<dyn QueryService>,
    inner: Arc<Mutex<SessionInner>>,
}

impl QuerySession {
    pub fn new(service: Arc<dyn QueryService>) -> Self {
        Self {
            service,
            inner: Arc::new(Mutex::new(SessionInner::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn ask(
        &self,
        query: impl Into<String>,
        domain: Option<&str>,
    ) -> Result<AskOutcome, QueryError> {
        let query = query.into();
        let (generation, token, request) = {
            let mut inner = self.lock();
            if let Some(previous) = inner.in_flight.take() {
                courier_debug!("Superseding in-flight query");
                previous.cancel();
            }
            inner.generation += 1;
            let token = CancellationToken::new();
            inner.in_flight = Some(token.clone());
            let request = QueryRequest {
                query: query.clone(),
                domain: normalize_domain(domain),
                conversation_id: inner.conversation_id.clone(),
            };
            (inner.generation, token, request)
        };
        let _release = InFlightRelease {
            session: self,
            generation,
        };

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(AskOutcome::Superseded),
            result = self.service.query(&request) => result,
        };

        let mut inner = self.lock();
        if inner.generation != generation || token.is_cancelled() {
            courier_debug!("Discarding late answer for superseded query");
            return Ok(AskOutcome::Superseded);
        }
        inner.in_flight = None;

        let answer = result.inspect_err(|err| courier_warn!("Query failed: {}", err))?;
        if answer.conversation_id.is_some() {
            inner.conversation_id = answer.conversation_id;
        }
        let turn = SessionTurn {
            query,
            response: answer.response,
            sources: answer.sources,
            timestamp: Utc::now(),
        };
        inner.transcript.push(turn.clone());
        courier_info!(
            "Query answered with {} sources ({} turns)",
            turn.sources.len(),
            inner.transcript.len()
        );
        Ok(AskOutcome::Answered(turn))
    }

    /// Cancel the outstanding request, if any.
    pub fn cancel(&self) {
        if let Some(token) = self.lock().in_flight.take() {
            token.cancel();
        }
    }

    /// Empty the transcript. An outstanding request keeps running and its
    /// turn is still recorded when it lands; use [`QuerySession::reset`] to
    /// drop it as well.
    pub fn clear(&self) {
        self.lock().transcript.clear();
    }

    /// Cancel the outstanding request, empty the transcript and forget the
    /// conversation id.
    pub fn reset(&self) {
        let mut inner = self.lock();
        if let Some(token) = inner.in_flight.take() {
            token.cancel();
        }
        inner.transcript.clear();
        inner.conversation_id = None;
    }

    pub fn is_busy(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    pub fn transcript(&self) -> Vec<SessionTurn> {
        self.lock().transcript.turns().to_vec()
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.lock().conversation_id.clone()
    }
}

/// Clears the in-flight marker when an `ask` ends without being superseded,
/// including when its future is dropped mid-request.
struct InFlightRelease<'a> {
    session: &'a QuerySession,
    generation: u64,
}

impl Drop for InFlightRelease<'_> {
    fn drop(&mut self) {
        let mut inner = self.session.lock();
        if inner.generation == self.generation {
            inner.in_flight = None;
        }
    }
}

/// Blank and "All Domains" both mean no domain filter.
pub fn normalize_domain(domain: Option<&str>) -> Option<String> {
    domain
        .map(str::trim)
        .filter(|domain| !domain.is_empty() && *domain != ALL_DOMAINS)
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_domains_means_no_filter() {
        assert_eq!(normalize_domain(None), None);
        assert_eq!(normalize_domain(Some("  ")), None);
        assert_eq!(normalize_domain(Some(ALL_DOMAINS)), None);
        assert_eq!(normalize_domain(Some(" ai ")), Some("ai".to_string()));
    }
}
