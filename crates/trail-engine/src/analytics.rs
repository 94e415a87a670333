//! Analytics delivery.
//!
//! Playback reports every transition through [`AnalyticsSink::send_event`],
//! which returns immediately. Delivery happens on a spawned task and its
//! outcome never reaches the engine.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};
use trail_common::AnalyticsEvent;
use trail_core::config::AnalyticsConfig;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Analytics request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Analytics collector returned status {0}")]
    Status(u16),
}

/// Fire-and-forget receiver of playback events.
pub trait AnalyticsSink {
    fn send_event(&self, event: AnalyticsEvent);
}

pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn send_event(&self, _event: AnalyticsEvent) {}
}

/// Keeps every event in memory; cloned handles share the same log.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<AnalyticsEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AnalyticsSink for RecordingSink {
    fn send_event(&self, event: AnalyticsEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[async_trait]
pub trait AnalyticsTransport: Send + Sync {
    async fn deliver(&self, session_id: &str, event: &AnalyticsEvent) -> Result<(), AnalyticsError>;
}

#[derive(Serialize)]
struct EventPayload<'a> {
    session_id: &'a str,
    #[serde(flatten)]
    event: &'a AnalyticsEvent,
}

/// POSTs each event as JSON to the collector endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AnalyticsTransport for HttpTransport {
    async fn deliver(&self, session_id: &str, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EventPayload { session_id, event })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AnalyticsError::Status(response.status().as_u16()))
        }
    }
}

/// Bridges the synchronous sink onto an async transport.
///
/// The session id is generated once per dispatcher, i.e. per page load.
pub struct AnalyticsDispatcher {
    transport: Arc<dyn AnalyticsTransport>,
    session_id: String,
    debug: bool,
}

impl AnalyticsDispatcher {
    pub fn new(transport: Arc<dyn AnalyticsTransport>, debug: bool) -> Self {
        Self {
            transport,
            session_id: Uuid::new_v4().to_string(),
            debug,
        }
    }

    /// HTTP dispatcher for the configured endpoint, if there is one.
    pub fn from_config(config: &AnalyticsConfig) -> Option<Self> {
        let endpoint = config.endpoint.as_deref()?.trim();
        if endpoint.is_empty() {
            return None;
        }
        Some(Self::new(Arc::new(HttpTransport::new(endpoint)), config.debug))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl AnalyticsSink for AnalyticsDispatcher {
    fn send_event(&self, event: AnalyticsEvent) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No async runtime, dropping analytics event {}", event.event_type);
            return;
        };

        let transport = Arc::clone(&self.transport);
        let session_id = self.session_id.clone();
        let debug = self.debug;
        handle.spawn(async move {
            if let Err(e) = transport.deliver(&session_id, &event).await {
                if debug {
                    warn!("Failed to deliver {} event: {}", event.event_type, e);
                }
            }
        });
    }
}
