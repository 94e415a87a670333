use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use trail_core::config::SimilarityWeights;
use trail_core::dom::{Document, ElementSpec};
use trail_core::repair::{RepairEngine, SelectorContext, suggest_repairs};

#[test]
fn test_context_from_selector() {
    let context = SelectorContext::from_selector(
        r#"#main > form.login button.btn.primary[type="submit"][data-cy="send"][aria-label='Send']"#,
    );
    assert_eq!(context.tag.as_deref(), Some("button"));
    assert_eq!(context.id, None);
    assert_eq!(context.classes, vec!["btn", "primary"]);
    assert_eq!(context.aria_label.as_deref(), Some("Send"));
    assert_eq!(
        context.attributes,
        BTreeMap::from([("data-cy".to_string(), "send".to_string())])
    );
}

#[test]
fn test_context_reads_escaped_identifiers() {
    let context = SelectorContext::from_selector(r"main #\31 23.\31 0x");
    assert_eq!(context.id.as_deref(), Some("123"));
    assert_eq!(context.classes, vec!["10x"]);
}

#[test]
fn test_generic_attributes_do_not_score() {
    let doc = Document::new([
        ElementSpec::new("input").attr("type", "text"),
        ElementSpec::new("input").attr("type", "text"),
    ]);
    let broken = r#"input[type="text"][data-x="gone"]"#;
    let context = SelectorContext::from_selector(broken);
    assert!(RepairEngine::rank(&doc, &context, &SimilarityWeights::default()).is_empty());
    assert!(suggest_repairs(&doc, broken).is_empty());
}

#[test]
fn test_id_counts_for_ranking_not_confidence() {
    let doc = Document::new([ElementSpec::new("button").id("save")]);
    let suggestions = suggest_repairs(&doc, "button#save.gone");
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].selector, "#save");
    assert!((suggestions[0].confidence - 0.4).abs() < 1e-6);
    assert!(suggestions[0].reason.contains("matching id"));
}

#[test]
fn test_context_id_forms() {
    assert_eq!(
        SelectorContext::from_selector("#save-btn").id.as_deref(),
        Some("save-btn")
    );
    assert_eq!(
        SelectorContext::from_selector(r#"[id="save"]"#).id.as_deref(),
        Some("save")
    );
    assert_eq!(
        SelectorContext::from_selector("nav a, footer").tag.as_deref(),
        Some("a")
    );
    assert!(SelectorContext::from_selector("*").is_empty());
}

#[test]
fn test_matching_attribute_ranks_higher() {
    let doc = Document::new([
        ElementSpec::new("button").text("Other"),
        ElementSpec::new("button").attr("data-testid", "save").text("Save"),
    ]);
    let broken = r#"div.toolbar > button[data-testid="save"]"#;

    let suggestions = suggest_repairs(&doc, broken);
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].selector, r#"[data-testid="save"]"#);
    assert_eq!(suggestions[0].element, doc.first("[data-testid=save]").unwrap());
    assert!(suggestions[0].confidence > 0.5);
    assert!(suggestions[0].reason.contains("matching data-testid"));

    let context = SelectorContext::from_selector(broken);
    let ranked = RepairEngine::rank(&doc, &context, &SimilarityWeights::default());
    assert_eq!(ranked.len(), 1);
    assert!(ranked[0].score > 0.1);
}

#[test]
fn test_classes_and_text() {
    let doc = Document::new([
        ElementSpec::new("button").class("btn").text("Cancel"),
        ElementSpec::new("button").class("btn btn-primary").text("Save"),
    ]);
    let suggestions = RepairEngine::suggest(
        &doc,
        ".btn.btn-primary.save-button",
        Some("Save"),
        &SimilarityWeights::default(),
    );
    assert_eq!(suggestions[0].element, doc.first(".btn-primary").unwrap());
    assert_eq!(suggestions[0].selector, ".btn-primary");
}

#[test]
fn test_ties_prefer_closer_text() {
    let doc = Document::new([
        ElementSpec::new("button").class("btn").text("Save all drafts"),
        ElementSpec::new("button").class("btn").text("Save draft"),
    ]);
    let suggestions = RepairEngine::suggest(
        &doc,
        "button.btn.removed",
        Some("Save"),
        &SimilarityWeights::default(),
    );
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].element, doc.first("button:nth-of-type(2)").unwrap());
}

#[test]
fn test_at_most_five() {
    let doc = Document::new((0..8).map(|_| ElementSpec::new("li").class("item")));
    let suggestions = suggest_repairs(&doc, "li.item.old");
    assert_eq!(suggestions.len(), 5);
}

#[test]
fn test_dropped_identical_selector_leaves_room_for_others() {
    let mut children = vec![ElementSpec::new("div").class("a b")];
    children.extend((0..5).map(|_| ElementSpec::new("div").class("a")));
    children.push(ElementSpec::new("span").class("b"));
    let doc = Document::new(children);

    let suggestions = suggest_repairs(&doc, ".a.b");
    assert_eq!(suggestions.len(), 5);
    assert!(suggestions.iter().all(|s| s.selector != ".a.b"));
}

#[test]
fn test_identical_selector_is_dropped() {
    let doc = Document::new([ElementSpec::new("button").id("save")]);
    assert!(suggest_repairs(&doc, "#save").is_empty());
}

#[test]
fn test_confidence_is_capped() {
    let doc = Document::new([ElementSpec::new("button")
        .id("go")
        .attr("data-a", "1")
        .attr("data-b", "2")
        .attr("aria-label", "Go")
        .class("x")]);
    let suggestions = suggest_repairs(
        &doc,
        r#"main button#go[data-a="1"][data-b="2"][aria-label="Go"].x"#,
    );
    assert_eq!(suggestions[0].confidence, 1.0);
}

#[test]
fn test_no_fingerprint_no_suggestions() {
    let doc = Document::new([ElementSpec::new("div")]);
    assert!(suggest_repairs(&doc, "*").is_empty());
    assert!(suggest_repairs(&doc, "").is_empty());
}

#[test]
fn test_custom_weights() {
    let doc = Document::new([ElementSpec::new("button").attr("data-testid", "save")]);
    let weights = SimilarityWeights {
        min_score: 0.9,
        ..Default::default()
    };
    assert!(RepairEngine::suggest(&doc, r#"[data-testid="save"].gone"#, None, &weights).is_empty());
}
