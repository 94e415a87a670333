use std::time::Duration;
use trail_common::Trail;
use trail_core::dom::{ListenerId, ListenerKind, NodeId};

/// State owned by one running playback. Dropped on stop, skip or completion.
pub struct PlaybackSession {
    pub trail: Trail,
    pub index: usize,
    /// Target resolved for the current step; re-checked before every use.
    pub target: Option<NodeId>,
    /// At most one settle timer per session.
    pub pending: Option<SettleTimer>,
    /// Listeners registered for the displayed step only.
    pub step_listeners: Vec<(ListenerId, ListenerKind)>,
}

impl PlaybackSession {
    pub fn new(trail: Trail, index: usize) -> Self {
        Self {
            trail,
            index,
            target: None,
            pending: None,
            step_listeners: Vec::new(),
        }
    }
}

/// Post-scroll delay before a step is shown.
#[derive(Debug, Clone, Copy)]
pub struct SettleTimer {
    /// Engine generation at the time the timer was armed.
    pub token: u64,
    pub remaining: Duration,
    pub index: usize,
    pub target: NodeId,
}

/// Anchored-layout computation waiting to be applied.
#[derive(Debug, Clone, Copy)]
pub struct LayoutJob {
    pub token: u64,
    pub target: NodeId,
}
