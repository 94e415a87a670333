use pretty_assertions::assert_eq;
use trail_common::{Step, Trail};
use trail_core::dom::{Document, ElementSpec};
use trail_core::validator::{
    ValidationErrorKind, ValidationWarningKind, selector_fragility, validate_trail,
};

fn page() -> Document {
    Document::new([
        ElementSpec::new("button").id("save").text("Save"),
        ElementSpec::new("div").class("Panel-root").child(ElementSpec::new("span")),
        ElementSpec::new("aside").id("hidden-help").hidden(),
        ElementSpec::new("ul").children([ElementSpec::new("li"), ElementSpec::new("li")]),
    ])
}

fn trail(steps: Vec<Step>) -> Trail {
    Trail::new("onboarding", "Onboarding", steps)
}

#[test]
fn test_valid_trail() {
    let result = validate_trail(&page(), &trail(vec![Step::new("s1", "#save")]));
    assert!(result.valid);
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_no_steps_stops_checking() {
    let mut t = trail(Vec::new());
    t.id = String::new();
    let result = validate_trail(&page(), &t);

    let kinds: Vec<_> = result.errors.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![ValidationErrorKind::MissingTrailId, ValidationErrorKind::NoSteps]
    );
    assert!(!result.valid);
}

#[test]
fn test_step_errors() {
    let result = validate_trail(
        &page(),
        &trail(vec![
            Step::new("", "#save"),
            Step::new("s2", "  "),
            Step::new("s3", "#nope"),
        ]),
    );

    let errors: Vec<_> = result
        .errors
        .iter()
        .map(|e| (e.kind, e.step_index))
        .collect();
    assert_eq!(
        errors,
        vec![
            (ValidationErrorKind::MissingStepId, Some(0)),
            (ValidationErrorKind::MissingTarget, Some(1)),
            (ValidationErrorKind::TargetNotFound, Some(2)),
        ]
    );
    assert!(!result.valid);
}

#[test]
fn test_warnings_do_not_invalidate() {
    let result = validate_trail(
        &page(),
        &trail(vec![
            Step::new("help", "#hidden-help"),
            Step::new("panel", ".Panel-root"),
            Step::new("item", "ul > li:nth-child(2)"),
            Step::new("help", "#save"),
            Step::new("later", "#lazy-widget").optional(),
        ]),
    );

    assert!(result.valid, "{:?}", result.errors);
    let warnings: Vec<_> = result
        .warnings
        .iter()
        .map(|w| (w.kind, w.step_index))
        .collect();
    assert_eq!(
        warnings,
        vec![
            (ValidationWarningKind::HiddenTarget, 0),
            (ValidationWarningKind::UnstableSelector, 1),
            (ValidationWarningKind::UnstableSelector, 2),
            (ValidationWarningKind::DuplicateStepId, 3),
            (ValidationWarningKind::OptionalTargetNotFound, 4),
        ]
    );
}

#[test]
fn test_invalid_selector_is_not_found() {
    let result = validate_trail(&page(), &trail(vec![Step::new("s1", "button[[")]));
    assert_eq!(result.errors[0].kind, ValidationErrorKind::TargetNotFound);
}

#[test]
fn test_fragility_rules() {
    assert!(selector_fragility(".Button-root").is_some());
    assert!(selector_fragility("li:nth-of-type(3)").is_some());
    assert!(selector_fragility("#list li:nth-child(2)").is_none());
    assert!(selector_fragility(r#"[data-testid="x"]:nth-child(2)"#).is_none());
    assert!(selector_fragility(".button-root").is_none());
    assert!(selector_fragility(".Button-root.active").is_none());
    assert!(selector_fragility("nav a").is_none());
}

#[test]
fn test_result_serializes() {
    let result = validate_trail(&page(), &trail(vec![Step::new("s1", "#nope")]));
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["valid"], false);
    assert_eq!(json["errors"][0]["kind"], "target_not_found");
    assert_eq!(json["errors"][0]["step_id"], "s1");
}
