//! Async clock for a [`TourEngine`].

use crate::engine::{PageEvent, TourEngine};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;
use trail_common::PlaybackState;
use trail_core::dom::PageSurface;

/// Pump `advance` every `tick` and feed page events until the session ends.
///
/// Events are only taken while no settle timer or layout result is
/// outstanding, so each one acts on a fully displayed step. Returns early,
/// with the session still running, once the event channel is closed and
/// nothing is pending.
pub async fn run_playback<S: PageSurface>(
    engine: &mut TourEngine<S>,
    mut events: UnboundedReceiver<PageEvent>,
    tick: Duration,
) -> PlaybackState {
    let mut interval = tokio::time::interval(tick.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();
    let mut events_open = true;

    while engine.is_active() {
        if !events_open && !engine.has_pending_work() {
            debug!("Event source closed with the trail still running");
            break;
        }

        let accepting = events_open && !engine.has_pending_work();
        tokio::select! {
            _ = interval.tick() => {
                let now = Instant::now();
                engine.advance(now - last);
                last = now;
            }
            event = events.recv(), if accepting => match event {
                Some(event) => engine.handle_event(event),
                None => events_open = false,
            },
        }
    }

    engine.state()
}
