//! Durable selector synthesis.
//!
//! Turns a concrete element into the most stable CSS selector available,
//! walking a fixed priority ladder (first match wins):
//!
//! 1. `#id`
//! 2. semantic data attribute (`[data-testid="..."]` and friends)
//! 3. `tag[aria-label="..."]`
//! 4. `[name="..."]`
//! 5. `ancestor tag` for short-text buttons, links and labels
//! 6. one class, or the first two or three classes combined
//! 7. a `tag:nth-of-type(n)` path, at most five segments deep
//!
//! Every candidate is re-queried against the live document and only accepted
//! when it matches exactly the element it was generated for.

use crate::dom::selector::{escape_ident, quote_attr_value, sibling_position};
use crate::dom::{Dom, NodeId};
use crate::query::{is_unique_match, normalized_text};

/// Data attributes that exist to address elements, in priority order.
pub const SEMANTIC_ATTRIBUTES: &[&str] = &[
    "data-trail-id",
    "data-tour-id",
    "data-testid",
    "data-test-id",
    "data-cy",
];

const INTERACTIVE_TAGS: &[&str] = &["button", "a", "label"];
const MAX_TEXT_LEN: usize = 50;
const MAX_ANCESTOR_DEPTH: usize = 5;
const MAX_PATH_DEPTH: usize = 5;
const MAX_CLASS_COMBINATION: usize = 3;
/// Classes the overlay renderer adds to the page.
const OWN_CLASS_PREFIX: &str = "trail-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorStrategy {
    Id,
    DataAttribute,
    AriaLabel,
    Name,
    AncestorText,
    ClassName,
    StructuralPath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSelector {
    pub selector: String,
    pub strategy: SelectorStrategy,
}

pub struct SelectorGenerator;

impl SelectorGenerator {
    /// Walk the ladder for `node`. `None` only for detached nodes.
    pub fn generate<D: Dom + ?Sized>(dom: &D, node: NodeId) -> Option<GeneratedSelector> {
        if !dom.is_attached(node) {
            return None;
        }
        let tag = dom.tag_name(node)?;

        let found = |selector: String, strategy| Some(GeneratedSelector { selector, strategy });

        if let Some(selector) = Self::by_id(dom, node) {
            return found(selector, SelectorStrategy::Id);
        }
        if let Some(selector) = Self::by_data_attribute(dom, node) {
            return found(selector, SelectorStrategy::DataAttribute);
        }
        if let Some(selector) = Self::by_attribute(dom, node, "aria-label", Some(&tag)) {
            return found(selector, SelectorStrategy::AriaLabel);
        }
        if let Some(selector) = Self::by_attribute(dom, node, "name", None) {
            return found(selector, SelectorStrategy::Name);
        }
        if let Some(selector) = Self::by_ancestor_text(dom, node, &tag) {
            return found(selector, SelectorStrategy::AncestorText);
        }
        if let Some(selector) = Self::by_classes(dom, node) {
            return found(selector, SelectorStrategy::ClassName);
        }
        found(Self::structural_path(dom, node)?, SelectorStrategy::StructuralPath)
    }

    fn by_id<D: Dom + ?Sized>(dom: &D, node: NodeId) -> Option<String> {
        let id = non_empty_attr(dom, node, "id")?;
        let selector = format!("#{}", escape_ident(&id));
        is_unique_match(dom, &selector, node).then_some(selector)
    }

    fn by_data_attribute<D: Dom + ?Sized>(dom: &D, node: NodeId) -> Option<String> {
        SEMANTIC_ATTRIBUTES.iter().find_map(|attr| {
            let value = non_empty_attr(dom, node, attr)?;
            let selector = format!("[{}={}]", attr, quote_attr_value(&value));
            is_unique_match(dom, &selector, node).then_some(selector)
        })
    }

    fn by_attribute<D: Dom + ?Sized>(
        dom: &D,
        node: NodeId,
        attr: &str,
        tag: Option<&str>,
    ) -> Option<String> {
        let value = non_empty_attr(dom, node, attr)?;
        let selector = format!(
            "{}[{}={}]",
            tag.unwrap_or_default(),
            attr,
            quote_attr_value(&value)
        );
        is_unique_match(dom, &selector, node).then_some(selector)
    }

    /// `ancestor tag` where the ancestor has a stable address and the element
    /// is the only one of its tag with this text inside it.
    fn by_ancestor_text<D: Dom + ?Sized>(dom: &D, node: NodeId, tag: &str) -> Option<String> {
        if !INTERACTIVE_TAGS.contains(&tag) {
            return None;
        }
        let text = normalized_text(dom, node);
        if text.is_empty() || text.chars().count() > MAX_TEXT_LEN {
            return None;
        }

        let mut current = dom.parent(node);
        for _ in 0..MAX_ANCESTOR_DEPTH {
            let ancestor = current?;
            if let Some(anchor) = Self::stable_address(dom, ancestor) {
                let same_text: Vec<NodeId> = dom
                    .query_selector_all_within(ancestor, tag)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|candidate| normalized_text(dom, *candidate) == text)
                    .collect();
                if same_text != [node] {
                    return None;
                }
                let selector = format!("{} {}", anchor, tag);
                return is_unique_match(dom, &selector, node).then_some(selector);
            }
            current = dom.parent(ancestor);
        }
        None
    }

    fn stable_address<D: Dom + ?Sized>(dom: &D, node: NodeId) -> Option<String> {
        Self::by_id(dom, node).or_else(|| Self::by_data_attribute(dom, node))
    }

    fn by_classes<D: Dom + ?Sized>(dom: &D, node: NodeId) -> Option<String> {
        let classes: Vec<String> = dom
            .class_list(node)
            .into_iter()
            .filter(|c| !c.starts_with(OWN_CLASS_PREFIX))
            .map(|c| escape_ident(&c))
            .collect();

        for class in &classes {
            let selector = format!(".{}", class);
            if is_unique_match(dom, &selector, node) {
                return Some(selector);
            }
        }

        (2..=MAX_CLASS_COMBINATION.min(classes.len())).find_map(|n| {
            let selector = classes[..n]
                .iter()
                .map(|c| format!(".{}", c))
                .collect::<String>();
            is_unique_match(dom, &selector, node).then_some(selector)
        })
    }

    /// `body > div:nth-of-type(2) > button` style path; stops early at an
    /// ancestor with a unique id.
    ///
    /// The walk is capped at a few segments. A capped path that matches more
    /// than one element is rebuilt all the way to an anchor.
    fn structural_path<D: Dom + ?Sized>(dom: &D, node: NodeId) -> Option<String> {
        let capped = Self::walk_to_anchor(dom, node, Some(MAX_PATH_DEPTH))?;
        if capped.anchored || is_unique_match(dom, &capped.selector, node) {
            return Some(capped.selector);
        }
        Self::walk_to_anchor(dom, node, None).map(|path| path.selector)
    }

    fn walk_to_anchor<D: Dom + ?Sized>(
        dom: &D,
        node: NodeId,
        max_depth: Option<usize>,
    ) -> Option<StructuralPath> {
        let body = dom.body();
        let mut segments = Vec::new();
        let mut anchored = false;
        let mut current = Some(node);

        while let Some(id) = current {
            if Some(id) == body {
                segments.push("body".to_string());
                anchored = true;
                break;
            }
            if id != node {
                if let Some(anchor) = Self::by_id(dom, id) {
                    segments.push(anchor);
                    anchored = true;
                    break;
                }
            }
            if max_depth.is_some_and(|max| segments.len() >= max) {
                break;
            }

            let tag = dom.tag_name(id)?;
            let same_type = dom
                .parent(id)
                .map(|p| {
                    dom.children(p)
                        .into_iter()
                        .filter(|s| dom.tag_name(*s).as_deref() == Some(tag.as_str()))
                        .count()
                })
                .unwrap_or(1);
            if same_type > 1 {
                let position = sibling_position(dom, id, true, false)?;
                segments.push(format!("{}:nth-of-type({})", tag, position));
            } else {
                segments.push(tag);
            }
            current = dom.parent(id);
        }

        segments.reverse();
        Some(StructuralPath {
            selector: segments.join(" > "),
            anchored,
        })
    }
}

struct StructuralPath {
    selector: String,
    /// Starts at `body` or a unique id, so every segment picks one child.
    anchored: bool,
}

/// Convenience wrapper returning just the selector string.
pub fn generate_selector<D: Dom + ?Sized>(dom: &D, node: NodeId) -> Option<String> {
    SelectorGenerator::generate(dom, node).map(|generated| generated.selector)
}

fn non_empty_attr<D: Dom + ?Sized>(dom: &D, node: NodeId, name: &str) -> Option<String> {
    dom.attribute(node, name).filter(|v| !v.trim().is_empty())
}
