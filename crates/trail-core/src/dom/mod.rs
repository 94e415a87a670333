//! DOM abstraction.
//!
//! The page is an external resource the engine does not own: elements can be
//! recreated or unmounted by the surrounding application at any time. All
//! access goes through [`Dom`] (read side, used by the pure algorithms) and
//! [`PageSurface`] (scrolling, listeners and overlay nodes, used by playback).
//! `NodeId` handles are weak; callers re-check [`Dom::is_attached`] before
//! trusting a handle they stored earlier.
//!
//! Implementations:
//! - [`Document`]: in-memory page built from a JSON snapshot (CLI, tests)
//! - `Rc<RefCell<T>>`: shared handle so a host and an engine see one page

pub mod document;
pub mod selector;

use crate::layout::ArrowOffset;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use trail_common::{Placement, Rect};

pub use document::{Document, DocumentError, ElementSpec, PageSnapshot};
pub use selector::{SelectorError, SelectorList, parse_selector};

pub type NodeId = u32;
pub type ListenerId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: f32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Keydown,
    Scroll,
    Resize,
    /// Clicks on the node or any of its descendants.
    Click(NodeId),
    /// Input events on the node or any of its descendants.
    Input(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    #[default]
    Smooth,
    Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayLayer {
    /// Full-viewport dimming layer with a vector cut-out.
    Mask,
    /// Floating tooltip box with its arrow.
    Tooltip,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TooltipContent {
    pub title: String,
    pub body: String,
    pub hint: Option<String>,
    /// e.g. "2 / 5"
    pub progress: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayPatch {
    /// Cut-out rectangle of the mask, `None` hides the spotlight.
    Cutout(Option<Rect>),
    Position {
        x: f32,
        y: f32,
        placement: Placement,
        arrow: ArrowOffset,
    },
    Content(TooltipContent),
    Visible(bool),
}

/// Read-only view of the page.
pub trait Dom {
    /// All elements matching `selector`, in document order.
    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError>;

    /// Matching elements that are descendants of `scope`.
    fn query_selector_all_within(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError>;

    fn body(&self) -> Option<NodeId>;

    /// Every attached element with the given tag (all elements for `None`).
    fn elements_by_tag(&self, tag: Option<&str>) -> Vec<NodeId>;

    /// Lower-case tag name.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn attributes(&self, node: NodeId) -> Vec<(String, String)>;

    fn class_list(&self, node: NodeId) -> Vec<String> {
        self.attribute(node, "class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn text_content(&self, node: NodeId) -> String;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn is_attached(&self, node: NodeId) -> bool;

    /// Viewport-relative bounding box.
    fn bounding_rect(&self, node: NodeId) -> Option<Rect>;

    fn computed_style(&self, node: NodeId) -> Option<ComputedStyle>;

    fn viewport(&self) -> Rect;
}

/// Mutating side of the page used by playback.
pub trait PageSurface: Dom {
    fn scroll_into_view(&mut self, node: NodeId, behavior: ScrollBehavior);

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;

    fn remove_listener(&mut self, id: ListenerId);

    fn mount_overlay(&mut self, layer: OverlayLayer) -> NodeId;

    fn update_overlay(&mut self, node: NodeId, patch: OverlayPatch);

    fn unmount(&mut self, node: NodeId);
}

impl<T: Dom> Dom for Rc<RefCell<T>> {
    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        self.borrow().query_selector_all(selector)
    }

    fn query_selector_all_within(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        self.borrow().query_selector_all_within(scope, selector)
    }

    fn body(&self) -> Option<NodeId> {
        self.borrow().body()
    }

    fn elements_by_tag(&self, tag: Option<&str>) -> Vec<NodeId> {
        self.borrow().elements_by_tag(tag)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.borrow().tag_name(node)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.borrow().attribute(node, name)
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.borrow().attributes(node)
    }

    fn class_list(&self, node: NodeId) -> Vec<String> {
        self.borrow().class_list(node)
    }

    fn text_content(&self, node: NodeId) -> String {
        self.borrow().text_content(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.borrow().parent(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.borrow().children(node)
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.borrow().is_attached(node)
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        self.borrow().bounding_rect(node)
    }

    fn computed_style(&self, node: NodeId) -> Option<ComputedStyle> {
        self.borrow().computed_style(node)
    }

    fn viewport(&self) -> Rect {
        self.borrow().viewport()
    }
}

impl<T: PageSurface> PageSurface for Rc<RefCell<T>> {
    fn scroll_into_view(&mut self, node: NodeId, behavior: ScrollBehavior) {
        self.borrow_mut().scroll_into_view(node, behavior)
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        self.borrow_mut().add_listener(kind)
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.borrow_mut().remove_listener(id)
    }

    fn mount_overlay(&mut self, layer: OverlayLayer) -> NodeId {
        self.borrow_mut().mount_overlay(layer)
    }

    fn update_overlay(&mut self, node: NodeId, patch: OverlayPatch) {
        self.borrow_mut().update_overlay(node, patch)
    }

    fn unmount(&mut self, node: NodeId) {
        self.borrow_mut().unmount(node)
    }
}
