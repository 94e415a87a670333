use pretty_assertions::assert_eq;
use trail_common::{
    AdvanceTrigger, AnalyticsEvent, AnalyticsEventType, Placement, PlaybackState, Step,
    StepAction, StepErrorKind, Trail,
};

fn sample_trail() -> Trail {
    Trail::new(
        "onboarding",
        "Welcome tour",
        vec![
            Step::new("intro", "#dashboard").with_title("Dashboard", "Your home base."),
            Step::new("create", "[data-testid=\"new-project\"]")
                .with_title("Create", "Start a project here.")
                .with_placement(Placement::Right)
                .with_action(StepAction::Click)
                .advance_on(AdvanceTrigger::Click),
            Step::new("help", "button[aria-label=\"Help\"]")
                .with_title("Help", "Find docs.")
                .optional(),
        ],
    )
}

#[test]
fn test_trail_round_trip() {
    let trail = sample_trail();
    let json = trail.to_json().unwrap();
    let imported = Trail::from_json(&json).unwrap();

    assert_eq!(imported.len(), 3);
    assert_eq!(imported, trail);
    let titles: Vec<_> = imported.steps.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Dashboard", "Create", "Help"]);
}

#[test]
fn test_trail_import_ignores_editor_fields() {
    let json = r##"{
        "id": "t1",
        "title": "Tour",
        "version": "2.1.0",
        "editorState": {"selected": 1},
        "steps": [
            {"id": "s1", "target": "#a", "placement": "left", "title": "A", "content": "a",
             "nextOn": "input", "draft": true}
        ]
    }"##;

    let trail = Trail::from_json(json).unwrap();
    assert_eq!(trail.version, "2.1.0");
    assert_eq!(trail.steps[0].placement, Placement::Left);
    assert_eq!(trail.steps[0].next_on, Some(AdvanceTrigger::Input));
    assert!(!trail.steps[0].optional);

    let exported = trail.to_json().unwrap();
    assert!(!exported.contains("editorState"));
    assert!(!exported.contains("draft"));
    assert!(exported.contains("\"nextOn\": \"input\""));
}

#[test]
fn test_trail_defaults_for_missing_fields() {
    let trail = Trail::from_json(r##"{"steps": [{"target": "#x"}]}"##).unwrap();
    assert_eq!(trail.id, "");
    assert_eq!(trail.version, "1.0.0");
    assert_eq!(trail.steps[0].placement, Placement::Bottom);
    assert_eq!(trail.steps[0].id, "");
}

#[test]
fn test_trail_rejects_malformed_json() {
    assert!(Trail::from_json("{\"steps\": [").is_err());
}

#[test]
fn test_analytics_event_serialization() {
    let event = AnalyticsEvent::step(AnalyticsEventType::StepViewed, "t1", "s2", 1);
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["event_type"], "step_viewed");
    assert_eq!(value["step_index"], 1);

    let trail_event = AnalyticsEvent::trail(AnalyticsEventType::TrailAbandoned, "t1");
    let value = serde_json::to_value(&trail_event).unwrap();
    assert!(value.get("step_id").is_none());
    assert_eq!(AnalyticsEventType::TrailAbandoned.to_string(), "trail_abandoned");
}

#[test]
fn test_playback_state_helpers() {
    let err = PlaybackState::Error {
        step_index: 2,
        kind: StepErrorKind::ElementNotVisible,
    };
    assert!(err.is_running());
    assert_eq!(err.step_index(), Some(2));
    assert!(PlaybackState::Skipped.is_terminal());
    assert!(!PlaybackState::Idle.is_running());
    assert_eq!(StepErrorKind::ElementNotFound.to_string(), "element_not_found");
}
