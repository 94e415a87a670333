use crate::engine::TourEngine;
use trail_common::Trail;
use trail_core::dom::PageSurface;

/// Owns at most one engine. Launching a new trail stops the previous one.
pub struct TourManager<S: PageSurface> {
    current: Option<TourEngine<S>>,
}

impl<S: PageSurface> Default for TourManager<S> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<S: PageSurface> TourManager<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `trail` on `engine`. The previously held engine is stopped
    /// (its observer sees `on_abandoned` if it was running) and returned.
    pub fn launch(&mut self, mut engine: TourEngine<S>, trail: Trail) -> Option<TourEngine<S>> {
        let previous = self.stop();
        engine.start(trail);
        self.current = Some(engine);
        previous
    }

    /// Stop and release the held engine.
    pub fn stop(&mut self) -> Option<TourEngine<S>> {
        let mut engine = self.current.take()?;
        engine.stop();
        Some(engine)
    }

    pub fn current(&self) -> Option<&TourEngine<S>> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut TourEngine<S>> {
        self.current.as_mut()
    }

    /// Release the held engine without stopping it.
    pub fn take(&mut self) -> Option<TourEngine<S>> {
        self.current.take()
    }

    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(|e| e.is_active())
    }
}
