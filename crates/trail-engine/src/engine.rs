//! Trail playback state machine.
//!
//! The engine is driven by its host: control calls (`start`, `next`, ...),
//! page events through [`TourEngine::handle_event`] and elapsed time through
//! [`TourEngine::advance`]. Nothing runs on its own, which keeps playback
//! deterministic and single-threaded.
//!
//! Deferred work (the settle timer and layout results) carries the engine
//! generation it was created under. The generation is bumped whenever a step
//! is (re)shown and when a session ends, and deferred work whose token no
//! longer matches is dropped instead of applied.

use crate::analytics::{AnalyticsSink, NoopSink};
use crate::keyboard::{Key, KeyCommand, command_for};
use crate::observer::{NoopObserver, TourObserver};
use crate::render::OverlayRenderer;
use crate::session::{LayoutJob, PlaybackSession, SettleTimer};
use std::time::Duration;
use tracing::{debug, warn};
use trail_common::{
    AdvanceTrigger, AnalyticsEvent, AnalyticsEventType, PlaybackState, Step, Trail,
};
use trail_core::config::{LayoutConfig, PlaybackConfig, TrailConfig};
use trail_core::dom::{Dom, ListenerId, ListenerKind, NodeId, PageSurface};
use trail_core::query::{resolve_target, scroll_to_element};

/// Input the host forwards from the page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Key(Key),
    Scroll,
    Resize,
    /// Click on this node.
    Click(NodeId),
    /// Input event on this node.
    Input(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

pub struct TourEngine<S: PageSurface> {
    surface: S,
    playback: PlaybackConfig,
    renderer: OverlayRenderer,
    observer: Box<dyn TourObserver>,
    analytics: Box<dyn AnalyticsSink>,
    state: PlaybackState,
    session: Option<PlaybackSession>,
    generation: u64,
    keyboard_listener: Option<ListenerId>,
    layout_queue: Vec<LayoutJob>,
}

impl<S: PageSurface> TourEngine<S> {
    pub fn new(surface: S) -> Self {
        Self::with_config(surface, &TrailConfig::default())
    }

    pub fn with_config(surface: S, config: &TrailConfig) -> Self {
        Self::from_parts(surface, config.playback.clone(), config.layout.clone())
    }

    pub fn from_parts(surface: S, playback: PlaybackConfig, layout: LayoutConfig) -> Self {
        Self {
            surface,
            playback,
            renderer: OverlayRenderer::new(layout),
            observer: Box::new(NoopObserver),
            analytics: Box::new(NoopSink),
            state: PlaybackState::Idle,
            session: None,
            generation: 0,
            keyboard_listener: None,
            layout_queue: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn TourObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_analytics(mut self, analytics: Box<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// A session exists, whether it is settling, showing or in error.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn trail(&self) -> Option<&Trail> {
        self.session.as_ref().map(|s| &s.trail)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.index)
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.session.as_ref().and_then(|s| s.trail.step(s.index))
    }

    /// A settle timer or layout result is still outstanding.
    pub fn has_pending_work(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.pending.is_some()) || !self.layout_queue.is_empty()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn start(&mut self, trail: Trail) {
        self.start_at(trail, 0);
    }

    /// Start at `index`, clamped to the last step. Used to resume.
    pub fn start_at(&mut self, trail: Trail, index: usize) {
        if trail.is_empty() {
            warn!("Trail '{}' has no steps, not starting", trail.id);
            return;
        }
        if self.session.is_some() {
            self.stop();
        }

        let index = index.min(trail.len() - 1);
        debug!("Starting trail '{}' at step {}", trail.id, index);
        self.analytics.send_event(AnalyticsEvent::trail(
            AnalyticsEventType::TrailStarted,
            trail.id.clone(),
        ));
        self.session = Some(PlaybackSession::new(trail, index));

        if self.playback.keyboard {
            self.keyboard_listener = Some(self.surface.add_listener(ListenerKind::Keydown));
        }
        self.show_step(index, Direction::Forward);
    }

    pub fn next(&mut self) {
        let Some(index) = self.state.step_index() else {
            return;
        };
        if let PlaybackState::Active { .. } = self.state {
            self.emit_step_event(AnalyticsEventType::StepCompleted, index);
        }
        // From an error or an unsettled step, Next skips without completing.
        if self.is_last(index) {
            self.complete();
        } else {
            self.show_step(index + 1, Direction::Forward);
        }
    }

    pub fn prev(&mut self) {
        match self.state.step_index() {
            Some(index) if index > 0 => self.show_step(index - 1, Direction::Backward),
            _ => {}
        }
    }

    /// Out-of-range indices are ignored.
    pub fn go_to_step(&mut self, index: usize) {
        let in_range = self.session.as_ref().is_some_and(|s| index < s.trail.len());
        if in_range && self.state.is_running() {
            self.show_step(index, Direction::Forward);
        }
    }

    pub fn skip(&mut self) {
        if self.session.is_none() {
            return;
        }
        self.emit_trail_event(AnalyticsEventType::TrailSkipped);
        self.finish(PlaybackState::Skipped);
        self.observer.on_skip();
    }

    /// Abandon the running session. No-op when nothing is running.
    pub fn stop(&mut self) {
        if self.session.is_none() {
            return;
        }
        self.emit_trail_event(AnalyticsEventType::TrailAbandoned);
        self.finish(PlaybackState::Abandoned);
        self.observer.on_abandoned();
    }

    fn complete(&mut self) {
        self.emit_trail_event(AnalyticsEventType::TrailCompleted);
        self.finish(PlaybackState::Completed);
        self.observer.on_complete();
    }

    /// Move the clock forward. Applies layout results queued before this
    /// call, then runs the settle timer.
    pub fn advance(&mut self, elapsed: Duration) {
        for job in std::mem::take(&mut self.layout_queue) {
            self.apply_layout(job);
        }

        let due = match self.session.as_mut().and_then(|s| s.pending.as_mut()) {
            Some(timer) => {
                timer.remaining = timer.remaining.saturating_sub(elapsed);
                timer.remaining.is_zero()
            }
            None => false,
        };
        if due {
            if let Some(timer) = self.session.as_mut().and_then(|s| s.pending.take()) {
                self.settle(timer);
            }
        }
    }

    pub fn handle_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Key(key) => {
                if self.keyboard_listener.is_none() {
                    return;
                }
                match command_for(&key) {
                    Some(KeyCommand::Next) => self.next(),
                    Some(KeyCommand::Prev) => self.prev(),
                    Some(KeyCommand::Skip) => self.skip(),
                    None => {}
                }
            }
            PageEvent::Scroll => {
                if self.has_step_listener(|k| k == ListenerKind::Scroll) {
                    self.reposition();
                }
            }
            PageEvent::Resize => {
                if self.has_step_listener(|k| k == ListenerKind::Resize) {
                    self.reposition();
                }
            }
            PageEvent::Click(node) => {
                if self.has_step_listener(|k| {
                    matches!(k, ListenerKind::Click(target) if self.is_within(node, target))
                }) {
                    self.next();
                }
            }
            PageEvent::Input(node) => {
                if self.has_step_listener(|k| {
                    matches!(k, ListenerKind::Input(target) if self.is_within(node, target))
                }) {
                    self.next();
                }
            }
        }
    }

    /// Resolve and scroll to `index`, skipping over optional steps whose
    /// target is unusable, then arm the settle timer.
    fn show_step(&mut self, index: usize, direction: Direction) {
        self.clear_step_listeners();
        self.generation += 1;

        let mut index = index;
        let mut direction = direction;
        loop {
            let Some(step) = self.session.as_ref().and_then(|s| s.trail.step(index)).cloned()
            else {
                return;
            };
            if let Some(session) = self.session.as_mut() {
                session.index = index;
                session.target = None;
                session.pending = None;
            }

            match resolve_target(&self.surface, &step.target) {
                Ok(target) => {
                    scroll_to_element(&mut self.surface, target);
                    self.state = PlaybackState::Transitioning { step_index: index };
                    if let Some(session) = self.session.as_mut() {
                        session.target = Some(target);
                        session.pending = Some(SettleTimer {
                            token: self.generation,
                            remaining: Duration::from_millis(self.playback.settle_delay_ms),
                            index,
                            target,
                        });
                    }
                    return;
                }
                Err(e) if step.optional => {
                    debug!("Skipping optional step '{}': {}", step.id, e);
                    match direction {
                        Direction::Forward if self.is_last(index) => {
                            self.complete();
                            return;
                        }
                        Direction::Forward => index += 1,
                        Direction::Backward if index == 0 => {
                            direction = Direction::Forward;
                            index += 1;
                        }
                        Direction::Backward => index -= 1,
                    }
                }
                Err(e) => {
                    debug!("Step '{}' failed: {}", step.id, e);
                    let kind = e.kind();
                    self.state = PlaybackState::Error {
                        step_index: index,
                        kind,
                    };
                    let total = self.step_count();
                    self.renderer
                        .present_error(&mut self.surface, &step, index, total, kind);
                    self.observer.on_error(&step, kind);
                    return;
                }
            }
        }
    }

    /// Settle timer fired: display the step.
    fn settle(&mut self, timer: SettleTimer) {
        if timer.token != self.generation || self.session.is_none() {
            warn!("Dropping stale settle timer for step {}", timer.index);
            return;
        }
        if !self.surface.is_attached(timer.target) {
            debug!("Target of step {} was replaced while settling", timer.index);
            self.show_step(timer.index, Direction::Forward);
            return;
        }
        let Some(step) = self.current_step().cloned() else {
            return;
        };

        let index = timer.index;
        let total = self.step_count();
        self.state = PlaybackState::Active { step_index: index };
        self.renderer
            .present_step(&mut self.surface, timer.target, &step, index, total);
        self.layout_queue.push(LayoutJob {
            token: self.generation,
            target: timer.target,
        });
        self.register_step_listeners(&step, timer.target);

        self.emit_step_event(AnalyticsEventType::StepViewed, index);
        self.observer.on_step_change(&step, index);
    }

    fn apply_layout(&mut self, job: LayoutJob) {
        if job.token != self.generation || !matches!(self.state, PlaybackState::Active { .. }) {
            debug!("Discarding layout computed for a step that is no longer shown");
            return;
        }
        let Some(placement) = self.current_step().map(|s| s.placement) else {
            return;
        };
        self.renderer
            .apply_layout(&mut self.surface, job.target, placement);
    }

    /// Scroll or resize while a step is shown.
    fn reposition(&mut self) {
        let Some(target) = self.session.as_ref().and_then(|s| s.target) else {
            return;
        };
        if !self.surface.is_attached(target) {
            return;
        }
        self.renderer.update_cutout(&mut self.surface, target);
        self.layout_queue.push(LayoutJob {
            token: self.generation,
            target,
        });
    }

    fn register_step_listeners(&mut self, step: &Step, target: NodeId) {
        let mut kinds = vec![ListenerKind::Scroll, ListenerKind::Resize];
        match step.next_on {
            Some(AdvanceTrigger::Click) => kinds.push(ListenerKind::Click(target)),
            Some(AdvanceTrigger::Input) => kinds.push(ListenerKind::Input(target)),
            None => {}
        }
        let registered: Vec<(ListenerId, ListenerKind)> = kinds
            .into_iter()
            .map(|kind| (self.surface.add_listener(kind), kind))
            .collect();
        if let Some(session) = self.session.as_mut() {
            session.step_listeners = registered;
        }
    }

    fn clear_step_listeners(&mut self) {
        let listeners = self
            .session
            .as_mut()
            .map(|s| std::mem::take(&mut s.step_listeners))
            .unwrap_or_default();
        for (id, _) in listeners {
            self.surface.remove_listener(id);
        }
    }

    fn has_step_listener(&self, pred: impl Fn(ListenerKind) -> bool) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.step_listeners.iter().any(|(_, kind)| pred(*kind)))
    }

    /// `node` is `ancestor` or one of its descendants.
    fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        if !self.surface.is_attached(ancestor) {
            return false;
        }
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.surface.parent(id);
        }
        false
    }

    /// Tear the session down and land in `state`.
    fn finish(&mut self, state: PlaybackState) {
        self.clear_step_listeners();
        if let Some(id) = self.keyboard_listener.take() {
            self.surface.remove_listener(id);
        }
        self.renderer.unmount(&mut self.surface);
        self.layout_queue.clear();
        self.generation += 1;
        self.session = None;
        self.state = state;
        debug!("Playback finished: {:?}", state);
    }

    fn is_last(&self, index: usize) -> bool {
        self.session
            .as_ref()
            .is_none_or(|s| s.trail.is_last(index))
    }

    fn step_count(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.trail.len())
    }

    fn emit_trail_event(&self, event_type: AnalyticsEventType) {
        if let Some(session) = &self.session {
            self.analytics
                .send_event(AnalyticsEvent::trail(event_type, session.trail.id.clone()));
        }
    }

    fn emit_step_event(&self, event_type: AnalyticsEventType, index: usize) {
        let Some(session) = &self.session else {
            return;
        };
        if let Some(step) = session.trail.step(index) {
            self.analytics.send_event(AnalyticsEvent::step(
                event_type,
                session.trail.id.clone(),
                step.id.clone(),
                index,
            ));
        }
    }
}
