use serde::{Deserialize, Serialize};
use std::fmt;

/// Transition kinds reported to the analytics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEventType {
    TrailStarted,
    StepViewed,
    StepCompleted,
    TrailCompleted,
    TrailSkipped,
    TrailAbandoned,
}

impl AnalyticsEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsEventType::TrailStarted => "trail_started",
            AnalyticsEventType::StepViewed => "step_viewed",
            AnalyticsEventType::StepCompleted => "step_completed",
            AnalyticsEventType::TrailCompleted => "trail_completed",
            AnalyticsEventType::TrailSkipped => "trail_skipped",
            AnalyticsEventType::TrailAbandoned => "trail_abandoned",
        }
    }
}

impl fmt::Display for AnalyticsEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analytics record. Step fields are only present for step-scoped events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event_type: AnalyticsEventType,
    pub trail_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
}

impl AnalyticsEvent {
    pub fn trail(event_type: AnalyticsEventType, trail_id: impl Into<String>) -> Self {
        Self {
            event_type,
            trail_id: trail_id.into(),
            step_id: None,
            step_index: None,
        }
    }

    pub fn step(
        event_type: AnalyticsEventType,
        trail_id: impl Into<String>,
        step_id: impl Into<String>,
        step_index: usize,
    ) -> Self {
        Self {
            event_type,
            trail_id: trail_id.into(),
            step_id: Some(step_id.into()),
            step_index: Some(step_index),
        }
    }
}

/// Why a required step could not be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepErrorKind {
    ElementNotFound,
    ElementNotVisible,
}

impl StepErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepErrorKind::ElementNotFound => "element_not_found",
            StepErrorKind::ElementNotVisible => "element_not_visible",
        }
    }

    /// Short human readable explanation shown in the diagnostic tooltip.
    pub fn describe(&self) -> &'static str {
        match self {
            StepErrorKind::ElementNotFound => "target element was not found",
            StepErrorKind::ElementNotVisible => "target element is not visible",
        }
    }
}

impl fmt::Display for StepErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable playback state of one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    /// Target resolved and scrolled to, waiting for the settle delay.
    Transitioning { step_index: usize },
    Active { step_index: usize },
    Error {
        step_index: usize,
        kind: StepErrorKind,
    },
    Completed,
    Skipped,
    Abandoned,
}

impl PlaybackState {
    /// True while a session is running (including error presentation).
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            PlaybackState::Transitioning { .. }
                | PlaybackState::Active { .. }
                | PlaybackState::Error { .. }
        )
    }

    pub fn step_index(&self) -> Option<usize> {
        match self {
            PlaybackState::Transitioning { step_index }
            | PlaybackState::Active { step_index }
            | PlaybackState::Error { step_index, .. } => Some(*step_index),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlaybackState::Completed | PlaybackState::Skipped | PlaybackState::Abandoned
        )
    }
}
