use trail_common::StepErrorKind;
use trail_core::dom::{ComputedStyle, Document, Dom, ElementSpec};
use trail_core::query::{
    TargetError, find_all, find_element, is_element_visible, resolve_target, scroll_to_element,
};

fn page() -> Document {
    Document::new([
        ElementSpec::new("button").id("ok"),
        ElementSpec::new("button").id("zero").rect(0.0, 0.0, 0.0, 10.0),
        ElementSpec::new("button").id("invisible").style(ComputedStyle {
            visibility: "hidden".to_string(),
            ..Default::default()
        }),
        ElementSpec::new("button").id("transparent").style(ComputedStyle {
            opacity: 0.0,
            ..Default::default()
        }),
        ElementSpec::new("div")
            .hidden()
            .child(ElementSpec::new("button").id("nested")),
        ElementSpec::new("div").id("below").rect(0.0, 3000.0, 100.0, 50.0),
    ])
}

#[test]
fn test_visibility_rules() {
    let doc = page();
    let visible = |sel: &str| is_element_visible(&doc, doc.first(sel).unwrap());

    assert!(visible("#ok"));
    assert!(!visible("#zero"));
    assert!(!visible("#invisible"));
    assert!(!visible("#transparent"));
    assert!(!visible("#nested"));
}

#[test]
fn test_invalid_selector_matches_nothing() {
    let doc = page();
    assert!(find_all(&doc, "button:::").is_empty());
    assert_eq!(find_element(&doc, "]]"), None);
    assert_eq!(find_all(&doc, "button").len(), 5);
}

#[test]
fn test_resolve_target() {
    let doc = page();
    assert_eq!(resolve_target(&doc, "#ok"), Ok(doc.first("#ok").unwrap()));
    assert_eq!(resolve_target(&doc, "#missing"), Err(TargetError::NotFound));

    let err = resolve_target(&doc, "#zero").unwrap_err();
    assert_eq!(err.kind(), StepErrorKind::ElementNotVisible);
    assert_eq!(
        TargetError::NotFound.kind(),
        StepErrorKind::ElementNotFound
    );
}

#[test]
fn test_scroll_to_element() {
    let mut doc = page();
    let below = doc.first("#below").unwrap();
    scroll_to_element(&mut doc, below);
    let rect = doc.bounding_rect(below).unwrap();
    assert!(doc.viewport().contains(&rect));
}
