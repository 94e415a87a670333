use trail_common::{Step, StepErrorKind};

/// Lifecycle callbacks of a playback session.
///
/// Calls arrive in the order the user sees the transitions. `on_step_change`
/// fires once the step is actually displayed, after the settle delay.
pub trait TourObserver {
    fn on_step_change(&mut self, _step: &Step, _index: usize) {}

    fn on_complete(&mut self) {}

    fn on_skip(&mut self) {}

    fn on_abandoned(&mut self) {}

    fn on_error(&mut self, _step: &Step, _kind: StepErrorKind) {}
}

pub struct NoopObserver;

impl TourObserver for NoopObserver {}
