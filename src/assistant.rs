//! Assistant Session
//!
//! Multi-turn chat with the insights assistant. The server issues a session
//! id on the first answer; it is persisted and attached to every later
//! question until the chat is reset.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::dto::{AssistantOverview, ContextEvent, EvaluateRequest, EvaluateResponse};
use crate::api::{ApiClient, ClientError, ClientResult};
use crate::storage::{LocalStore, ASSISTANT_SESSION_KEY};
use crate::view::format::{time_or_placeholder, PLACEHOLDER};

pub const ASSISTANT_SOURCE: &str = "dashboard";
pub const ASSISTANT_ERROR_MESSAGE: &str = "The assistant could not answer right now.";

// ============================================
// Backend
// ============================================

/// Assistant endpoints used by the session
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn evaluate(&self, request: &EvaluateRequest) -> ClientResult<EvaluateResponse>;

    async fn submit_context(&self, event: &ContextEvent) -> ClientResult<()>;

    async fn overview(&self) -> ClientResult<AssistantOverview>;
}

#[async_trait]
impl AssistantBackend for ApiClient {
    async fn evaluate(&self, request: &EvaluateRequest) -> ClientResult<EvaluateResponse> {
        self.insights_evaluate(request).await
    }

    async fn submit_context(&self, event: &ContextEvent) -> ClientResult<()> {
        self.insights_context(event).await
    }

    async fn overview(&self) -> ClientResult<AssistantOverview> {
        self.assistant_overview().await
    }
}

/// Send a context event, ignoring any failure
pub async fn submit_best_effort<B>(backend: &B, event: ContextEvent)
where
    B: AssistantBackend + ?Sized,
{
    if let Err(e) = backend.submit_context(&event).await {
        tracing::debug!(event_type = %event.event_type, error = %e, "Context event dropped");
    }
}

// ============================================
// Transcript
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Extras some answers carry besides the text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerExtras {
    pub today: Option<String>,
    pub trend: Option<String>,
    pub predicted_5k: Option<String>,
    pub predicted_10k: Option<String>,
}

impl AnswerExtras {
    fn from_response(response: &EvaluateResponse) -> Option<Self> {
        let extras = Self {
            today: response.today_recommendation.clone(),
            trend: response.trend_insight.clone(),
            predicted_5k: response.predicted_5k_time_s.map(|s| time_or_placeholder(Some(s))),
            predicted_10k: response.predicted_10k_time_s.map(|s| time_or_placeholder(Some(s))),
        };
        (extras != Self::default()).then_some(extras)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follow_ups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<AnswerExtras>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            recommendations: Vec::new(),
            follow_ups: Vec::new(),
            extras: None,
        }
    }

    fn answer(response: &EvaluateResponse) -> Self {
        Self {
            role: Role::Assistant,
            text: response
                .answer
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            recommendations: response.recommendations.clone(),
            follow_ups: response.follow_ups.clone(),
            extras: AnswerExtras::from_response(response),
        }
    }
}

// ============================================
// Session
// ============================================

#[derive(Debug, Clone, Default)]
pub struct AssistantSession {
    transcript: Vec<Message>,
    session_id: Option<String>,
    pending: bool,
    error: Option<String>,
}

impl AssistantSession {
    /// Restore the persisted session id, if any
    pub fn restore(store: &LocalStore) -> Self {
        let session_id = match store.get(ASSISTANT_SESSION_KEY) {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read assistant session id");
                None
            }
        };
        Self {
            session_id,
            ..Default::default()
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Follow-up suggestions of the latest answer
    pub fn follow_ups(&self) -> &[String] {
        self.transcript
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.follow_ups.as_slice())
            .unwrap_or(&[])
    }

    /// Ask a question. The user turn is appended before the request and kept
    /// if it fails. Blank questions and questions asked while another is
    /// pending are ignored.
    pub async fn ask<B>(
        &mut self,
        backend: &B,
        store: &LocalStore,
        question: &str,
        context: Value,
    ) -> ClientResult<()>
    where
        B: AssistantBackend + ?Sized,
    {
        let question = question.trim();
        if question.is_empty() || self.pending {
            return Ok(());
        }

        self.transcript.push(Message::user(question));
        self.pending = true;
        self.error = None;

        let request = EvaluateRequest {
            question: question.to_string(),
            context,
            session_id: self.session_id.clone(),
        };
        let result = backend.evaluate(&request).await;
        self.pending = false;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Assistant request failed");
                self.error = Some(ASSISTANT_ERROR_MESSAGE.to_string());
                return Err(e);
            }
        };

        if let Some(id) = response.session_id.as_deref().filter(|id| !id.is_empty()) {
            if self.session_id.as_deref() != Some(id) {
                tracing::info!(session_id = %id, "Assistant session started");
                if let Err(e) = store.set(ASSISTANT_SESSION_KEY, id) {
                    tracing::warn!(error = %e, "Could not persist assistant session id");
                }
                self.session_id = Some(id.to_string());
            }
        }

        self.transcript.push(Message::answer(&response));
        Ok(())
    }

    /// Ask the `index`th suggestion of the latest answer. Out-of-range
    /// indices do nothing.
    pub async fn select_follow_up<B>(
        &mut self,
        backend: &B,
        store: &LocalStore,
        index: usize,
        context: Value,
    ) -> ClientResult<()>
    where
        B: AssistantBackend + ?Sized,
    {
        let Some(question) = self.follow_ups().get(index).cloned() else {
            return Ok(());
        };
        self.ask(backend, store, &question, context).await
    }

    /// Clear the transcript and forget the session id
    pub fn new_chat(&mut self, store: &LocalStore) {
        self.transcript.clear();
        self.session_id = None;
        self.pending = false;
        self.error = None;
        if let Err(e) = store.remove(ASSISTANT_SESSION_KEY) {
            tracing::warn!(error = %e, "Could not clear assistant session id");
        }
    }

    /// Feedback on the answer at `index`, as a context event
    pub fn feedback_event(&self, index: usize, helpful: bool) -> Option<ContextEvent> {
        let message = self.transcript.get(index)?;
        if message.role != Role::Assistant {
            return None;
        }
        Some(ContextEvent {
            event_type: "assistant_feedback".to_string(),
            payload: json!({
                "session_id": self.session_id,
                "answer": message.text,
                "helpful": helpful,
            }),
            source: ASSISTANT_SOURCE.to_string(),
        })
    }
}

// ============================================
// Assistant overview
// ============================================

/// Display form of `GET /assistant/overview`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssistantOverviewView {
    pub today: String,
    pub trend: String,
    /// (distance label, formatted time)
    pub predictions: Vec<(String, String)>,
}

pub fn build_assistant_overview(overview: &AssistantOverview) -> AssistantOverviewView {
    let text = |v: &Option<String>| {
        v.as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(PLACEHOLDER)
            .to_string()
    };
    AssistantOverviewView {
        today: text(&overview.today),
        trend: text(&overview.trend),
        predictions: overview
            .predictions
            .iter()
            .map(|(label, secs)| (label.clone(), time_or_placeholder(*secs)))
            .collect(),
    }
}

/// Background fetch of the assistant overview, bounded by a timeout and
/// aborted when the owning view closes.
pub struct OverviewLoader {
    handle: JoinHandle<ClientResult<AssistantOverview>>,
}

impl OverviewLoader {
    pub fn spawn(backend: Arc<dyn AssistantBackend>, timeout: Duration) -> Self {
        let handle = tokio::spawn(async move {
            match tokio::time::timeout(timeout, backend.overview()).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Assistant overview timed out");
                    Err(ClientError::Timeout)
                }
            }
        });
        Self { handle }
    }

    /// Abort the request; a pending `wait` resolves to `Cancelled`
    pub fn close(&self) {
        self.handle.abort();
    }

    pub async fn wait(self) -> ClientResult<AssistantOverview> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => {
                if !e.is_cancelled() {
                    tracing::error!(error = %e, "Assistant overview task failed");
                }
                Err(ClientError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeAssistant {
        requests: Mutex<Vec<EvaluateRequest>>,
        events: Mutex<Vec<String>>,
        fail: bool,
        overview_delay: Option<Duration>,
    }

    #[async_trait]
    impl AssistantBackend for FakeAssistant {
        async fn evaluate(&self, request: &EvaluateRequest) -> ClientResult<EvaluateResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(ClientError::Status {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(EvaluateResponse {
                answer: Some(format!("About: {}", request.question)),
                recommendations: vec!["Easy run".into()],
                follow_ups: vec!["How did you sleep?".into(), "Any soreness?".into()],
                session_id: Some("sess-1".into()),
                today_recommendation: Some("Rest".into()),
                predicted_5k_time_s: Some(1225.0),
                ..Default::default()
            })
        }

        async fn submit_context(&self, event: &ContextEvent) -> ClientResult<()> {
            self.events.lock().unwrap().push(event.event_type.clone());
            if self.fail {
                return Err(ClientError::Unavailable);
            }
            Ok(())
        }

        async fn overview(&self) -> ClientResult<AssistantOverview> {
            if let Some(delay) = self.overview_delay {
                tokio::time::sleep(delay).await;
            }
            let mut predictions = BTreeMap::new();
            predictions.insert("10k".to_string(), Some(2700.0));
            predictions.insert("5k".to_string(), None);
            Ok(AssistantOverview {
                today: Some("Easy 30 min".into()),
                trend: None,
                predictions,
            })
        }
    }

    #[tokio::test]
    async fn test_session_id_is_persisted_and_reused() {
        let backend = FakeAssistant::default();
        let store = LocalStore::in_memory().unwrap();
        let mut session = AssistantSession::restore(&store);
        assert_eq!(session.session_id(), None);

        session.ask(&backend, &store, "How am I doing?", json!({})).await.unwrap();
        assert_eq!(session.session_id(), Some("sess-1"));
        assert_eq!(store.get(ASSISTANT_SESSION_KEY).unwrap().as_deref(), Some("sess-1"));

        session.ask(&backend, &store, "And this week?", json!({})).await.unwrap();
        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[0].session_id, None);
        assert_eq!(requests[1].session_id.as_deref(), Some("sess-1"));

        let restored = AssistantSession::restore(&store);
        assert_eq!(restored.session_id(), Some("sess-1"));
    }

    #[tokio::test]
    async fn test_transcript_order_and_extras() {
        let backend = FakeAssistant::default();
        let store = LocalStore::in_memory().unwrap();
        let mut session = AssistantSession::default();

        session.ask(&backend, &store, "  Plan?  ", json!({})).await.unwrap();
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0], Message::user("Plan?"));
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].text, "About: Plan?");
        assert_eq!(transcript[1].recommendations, vec!["Easy run".to_string()]);

        let extras = transcript[1].extras.as_ref().unwrap();
        assert_eq!(extras.today.as_deref(), Some("Rest"));
        assert_eq!(extras.predicted_5k.as_deref(), Some("20:25"));
        assert_eq!(extras.predicted_10k, None);
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_follow_up_reuses_send_path() {
        let backend = FakeAssistant::default();
        let store = LocalStore::in_memory().unwrap();
        let mut session = AssistantSession::default();

        session.ask(&backend, &store, "Plan?", json!({})).await.unwrap();
        session
            .select_follow_up(&backend, &store, 1, json!({}))
            .await
            .unwrap();
        assert_eq!(session.transcript()[2], Message::user("Any soreness?"));
        assert_eq!(session.transcript().len(), 4);

        // Out of range is a no-op
        session
            .select_follow_up(&backend, &store, 9, json!({}))
            .await
            .unwrap();
        assert_eq!(session.transcript().len(), 4);
    }

    #[tokio::test]
    async fn test_failure_keeps_user_turn() {
        let backend = FakeAssistant {
            fail: true,
            ..Default::default()
        };
        let store = LocalStore::in_memory().unwrap();
        let mut session = AssistantSession::default();

        let err = session.ask(&backend, &store, "Plan?", json!({})).await;
        assert!(err.is_err());
        assert_eq!(session.transcript(), &[Message::user("Plan?")]);
        assert_eq!(session.error(), Some(ASSISTANT_ERROR_MESSAGE));
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_blank_question_ignored() {
        let backend = FakeAssistant::default();
        let store = LocalStore::in_memory().unwrap();
        let mut session = AssistantSession::default();

        session.ask(&backend, &store, "   ", json!({})).await.unwrap();
        assert!(session.transcript().is_empty());
        assert!(backend.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_chat_forgets_session() {
        let backend = FakeAssistant::default();
        let store = LocalStore::in_memory().unwrap();
        let mut session = AssistantSession::default();
        session.ask(&backend, &store, "Plan?", json!({})).await.unwrap();

        session.new_chat(&store);
        assert!(session.transcript().is_empty());
        assert_eq!(session.session_id(), None);
        assert_eq!(store.get(ASSISTANT_SESSION_KEY).unwrap(), None);

        session.ask(&backend, &store, "Again", json!({})).await.unwrap();
        assert_eq!(backend.requests.lock().unwrap()[1].session_id, None);
    }

    #[tokio::test]
    async fn test_feedback_is_best_effort() {
        let backend = FakeAssistant::default();
        let store = LocalStore::in_memory().unwrap();
        let mut session = AssistantSession::default();
        session.ask(&backend, &store, "Plan?", json!({})).await.unwrap();

        assert!(session.feedback_event(0, true).is_none());
        let event = session.feedback_event(1, true).unwrap();
        assert_eq!(event.payload["helpful"], json!(true));
        assert_eq!(event.payload["session_id"], json!("sess-1"));

        let failing = FakeAssistant {
            fail: true,
            ..Default::default()
        };
        submit_best_effort(&failing, event).await;
        assert_eq!(failing.events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_build_assistant_overview() {
        let mut predictions = BTreeMap::new();
        predictions.insert("10k".to_string(), Some(2700.0));
        predictions.insert("5k".to_string(), None);
        let view = build_assistant_overview(&AssistantOverview {
            today: Some("Easy 30 min".into()),
            trend: Some("  ".into()),
            predictions,
        });
        assert_eq!(view.today, "Easy 30 min");
        assert_eq!(view.trend, PLACEHOLDER);
        assert_eq!(
            view.predictions,
            vec![
                ("10k".to_string(), "45:00".to_string()),
                ("5k".to_string(), PLACEHOLDER.to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overview_loader_times_out() {
        let backend = Arc::new(FakeAssistant {
            overview_delay: Some(Duration::from_secs(30)),
            ..Default::default()
        });
        let loader = OverviewLoader::spawn(backend, Duration::from_secs(8));
        assert!(matches!(loader.wait().await, Err(ClientError::Timeout)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overview_loader_close_cancels() {
        let backend = Arc::new(FakeAssistant {
            overview_delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let loader = OverviewLoader::spawn(backend, Duration::from_secs(8));
        loader.close();
        assert!(matches!(loader.wait().await, Err(ClientError::Cancelled)));
    }

    #[tokio::test]
    async fn test_overview_loader_success() {
        let backend = Arc::new(FakeAssistant::default());
        let loader = OverviewLoader::spawn(backend, Duration::from_secs(8));
        let overview = loader.wait().await.unwrap();
        assert_eq!(overview.today.as_deref(), Some("Easy 30 min"));
    }
}
