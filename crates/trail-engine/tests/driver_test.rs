use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use trail_common::{AnalyticsEvent, AnalyticsEventType, PlaybackState, Step, Trail};
use trail_core::config::AnalyticsConfig;
use trail_core::dom::{Document, ElementSpec};
use trail_engine::{
    AnalyticsDispatcher, AnalyticsError, AnalyticsSink, AnalyticsTransport, Key, PageEvent,
    TourEngine, TourObserver, run_playback,
};

#[derive(Clone, Default)]
struct Shown(Rc<RefCell<Vec<usize>>>);

impl TourObserver for Shown {
    fn on_step_change(&mut self, _step: &Step, index: usize) {
        self.0.borrow_mut().push(index);
    }
}

fn page() -> Document {
    Document::new([
        ElementSpec::new("button").id("a"),
        ElementSpec::new("button").id("b"),
    ])
}

fn trail() -> Trail {
    Trail::new(
        "demo",
        "Demo",
        vec![Step::new("first", "#a"), Step::new("second", "#b")],
    )
}

#[tokio::test(start_paused = true)]
async fn test_driver_plays_to_completion() {
    let shown = Shown::default();
    let mut engine = TourEngine::new(page()).with_observer(Box::new(shown.clone()));
    engine.start(trail());

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(PageEvent::Key(Key::ArrowRight)).unwrap();
    tx.send(PageEvent::Key(Key::Enter)).unwrap();
    drop(tx);

    let state = run_playback(&mut engine, rx, Duration::from_millis(16)).await;
    assert_eq!(state, PlaybackState::Completed);
    assert_eq!(*shown.0.borrow(), vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_driver_returns_when_input_ends() {
    let mut engine = TourEngine::new(page());
    engine.start(trail());

    let (tx, rx) = mpsc::unbounded_channel::<PageEvent>();
    drop(tx);

    let state = run_playback(&mut engine, rx, Duration::from_millis(16)).await;
    assert_eq!(state, PlaybackState::Active { step_index: 0 });
    assert!(engine.is_active());
    assert!(!engine.has_pending_work());
}

#[tokio::test(start_paused = true)]
async fn test_driver_escape_skips() {
    let mut engine = TourEngine::new(page());
    engine.start(trail());

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(PageEvent::Key(Key::Escape)).unwrap();

    let state = run_playback(&mut engine, rx, Duration::from_millis(16)).await;
    assert_eq!(state, PlaybackState::Skipped);
}

struct ChannelTransport(mpsc::UnboundedSender<(String, AnalyticsEvent)>);

#[async_trait]
impl AnalyticsTransport for ChannelTransport {
    async fn deliver(&self, session_id: &str, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        let _ = self.0.send((session_id.to_string(), event.clone()));
        Ok(())
    }
}

struct FailingTransport;

#[async_trait]
impl AnalyticsTransport for FailingTransport {
    async fn deliver(&self, _session_id: &str, _event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        Err(AnalyticsError::Status(503))
    }
}

#[tokio::test]
async fn test_dispatcher_delivers_with_session_id() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher = AnalyticsDispatcher::new(Arc::new(ChannelTransport(tx)), false);

    dispatcher.send_event(AnalyticsEvent::trail(AnalyticsEventType::TrailStarted, "demo"));
    dispatcher.send_event(AnalyticsEvent::step(
        AnalyticsEventType::StepViewed,
        "demo",
        "first",
        0,
    ));

    let (first_session, first) = rx.recv().await.unwrap();
    let (second_session, second) = rx.recv().await.unwrap();

    assert_eq!(first.event_type, AnalyticsEventType::TrailStarted);
    assert_eq!(second.step_index, Some(0));
    assert_eq!(first_session, second_session);
    assert_eq!(first_session, dispatcher.session_id());
    assert!(uuid::Uuid::parse_str(&first_session).is_ok());
}

#[tokio::test]
async fn test_failed_delivery_does_not_affect_playback() {
    let dispatcher = AnalyticsDispatcher::new(Arc::new(FailingTransport), true);
    let mut engine = TourEngine::new(page()).with_analytics(Box::new(dispatcher));

    engine.start(trail());
    engine.advance(Duration::from_millis(300));
    engine.next();
    tokio::task::yield_now().await;

    assert_eq!(engine.state(), PlaybackState::Transitioning { step_index: 1 });
}

#[test]
fn test_dispatch_without_runtime_is_dropped() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher = AnalyticsDispatcher::new(Arc::new(ChannelTransport(tx)), false);
    dispatcher.send_event(AnalyticsEvent::trail(AnalyticsEventType::TrailSkipped, "demo"));
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_dispatcher_from_config() {
    assert!(AnalyticsDispatcher::from_config(&AnalyticsConfig::default()).is_none());
    assert!(
        AnalyticsDispatcher::from_config(&AnalyticsConfig {
            endpoint: Some("  ".into()),
            debug: false,
        })
        .is_none()
    );
    assert!(
        AnalyticsDispatcher::from_config(&AnalyticsConfig {
            endpoint: Some("http://localhost:9000/events".into()),
            debug: true,
        })
        .is_some()
    );
}
