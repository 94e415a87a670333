//! Safe element lookup and visibility testing.
//!
//! A malformed selector never escapes this layer: it is logged and treated as
//! "nothing matched".

use crate::dom::{Dom, NodeId, PageSurface, ScrollBehavior};
use thiserror::Error;
use tracing::warn;
use trail_common::StepErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("target element was not found")]
    NotFound,
    #[error("target element {0} is not visible")]
    NotVisible(NodeId),
}

impl TargetError {
    pub fn kind(&self) -> StepErrorKind {
        match self {
            TargetError::NotFound => StepErrorKind::ElementNotFound,
            TargetError::NotVisible(_) => StepErrorKind::ElementNotVisible,
        }
    }
}

/// All matches for `selector`; empty on bad syntax.
pub fn find_all<D: Dom + ?Sized>(dom: &D, selector: &str) -> Vec<NodeId> {
    match dom.query_selector_all(selector) {
        Ok(nodes) => nodes,
        Err(e) => {
            warn!("Ignoring invalid selector '{}': {}", selector, e);
            Vec::new()
        }
    }
}

pub fn find_element<D: Dom + ?Sized>(dom: &D, selector: &str) -> Option<NodeId> {
    find_all(dom, selector).into_iter().next()
}

/// Positive render box, not `visibility: hidden`, not `display: none` and
/// not fully transparent.
pub fn is_element_visible<D: Dom + ?Sized>(dom: &D, node: NodeId) -> bool {
    let (Some(rect), Some(style)) = (dom.bounding_rect(node), dom.computed_style(node)) else {
        return false;
    };
    rect.width > 0.0
        && rect.height > 0.0
        && style.visibility != "hidden"
        && style.display != "none"
        && style.opacity > 0.0
}

/// Smooth-scroll `node` to the center of the viewport.
pub fn scroll_to_element<S: PageSurface + ?Sized>(surface: &mut S, node: NodeId) {
    if surface.is_attached(node) {
        surface.scroll_into_view(node, ScrollBehavior::Smooth);
    }
}

/// Resolve a step target to a visible element.
pub fn resolve_target<D: Dom + ?Sized>(dom: &D, selector: &str) -> Result<NodeId, TargetError> {
    let node = find_element(dom, selector).ok_or(TargetError::NotFound)?;
    if is_element_visible(dom, node) {
        Ok(node)
    } else {
        Err(TargetError::NotVisible(node))
    }
}

/// True when `selector` matches exactly one element and it is `node`.
pub fn is_unique_match<D: Dom + ?Sized>(dom: &D, selector: &str, node: NodeId) -> bool {
    matches!(dom.query_selector_all(selector).as_deref(), Ok([only]) if *only == node)
}

/// Text content with runs of whitespace collapsed and the ends trimmed.
pub fn normalized_text<D: Dom + ?Sized>(dom: &D, node: NodeId) -> String {
    collapse_whitespace(&dom.text_content(node))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
