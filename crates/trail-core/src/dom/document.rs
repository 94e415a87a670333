//! In-memory page document.
//!
//! Built from a JSON page snapshot (the same shape a scanner would dump) or
//! programmatically through [`ElementSpec`]. Overlay nodes live outside the
//! element tree so selectors can never match the engine's own UI.

use super::selector::parse_selector;
use super::{
    ComputedStyle, Dom, ListenerId, ListenerKind, NodeId, OverlayLayer, OverlayPatch,
    PageSurface, ScrollBehavior, SelectorError, TooltipContent,
};
use crate::layout::ArrowOffset;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;
use trail_common::{Placement, Point, Rect, Size};

const DEFAULT_VIEWPORT: Size = Size::new(1280.0, 800.0);
const DEFAULT_ELEMENT_RECT: Rect = Rect::new(0.0, 0.0, 100.0, 24.0);

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to read page snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid page snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default = "default_viewport")]
    pub viewport: Size,
    #[serde(default)]
    pub scroll: Point,
    pub body: ElementSpec,
}

fn default_viewport() -> Size {
    DEFAULT_VIEWPORT
}

/// Declarative element description; rects are in document coordinates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, classes: impl Into<String>) -> Self {
        self.attr("class", classes)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn rect(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.rect = Some(Rect::new(x, y, width, height));
        self
    }

    pub fn style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    /// Shorthand for `display: none`.
    pub fn hidden(mut self) -> Self {
        self.style.display = "none".to_string();
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.children.extend(children);
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: HashMap<String, String>,
    text: String,
    rect: Rect,
    style: ComputedStyle,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Rendered state of an overlay node, inspectable by hosts and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayNode {
    pub layer: OverlayLayer,
    pub visible: bool,
    pub cutout: Option<Rect>,
    pub position: Option<(f32, f32, Placement)>,
    pub arrow: Option<ArrowOffset>,
    pub content: TooltipContent,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: BTreeMap<NodeId, Node>,
    root: NodeId,
    viewport: Size,
    scroll: Point,
    next_id: NodeId,
    listeners: BTreeMap<ListenerId, ListenerKind>,
    next_listener: ListenerId,
    overlays: BTreeMap<NodeId, OverlayNode>,
}

impl Document {
    /// Document whose `<body>` holds `children`.
    pub fn new(children: impl IntoIterator<Item = ElementSpec>) -> Self {
        Self::from_snapshot(PageSnapshot {
            viewport: DEFAULT_VIEWPORT,
            scroll: Point::default(),
            body: ElementSpec::new("body").children(children),
        })
    }

    pub fn from_snapshot(snapshot: PageSnapshot) -> Self {
        let mut doc = Self {
            nodes: BTreeMap::new(),
            root: 0,
            viewport: snapshot.viewport,
            scroll: snapshot.scroll,
            next_id: 1,
            listeners: BTreeMap::new(),
            next_listener: 1,
            overlays: BTreeMap::new(),
        };
        let mut body = snapshot.body;
        if body.rect.is_none() {
            body.rect = Some(Rect::new(0.0, 0.0, doc.viewport.width, doc.viewport.height));
        }
        doc.root = doc.insert(None, body);
        doc
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let snapshot: PageSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    fn insert(&mut self, parent: Option<NodeId>, spec: ElementSpec) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;

        self.nodes.insert(
            id,
            Node {
                tag: spec.tag.to_ascii_lowercase(),
                attributes: spec
                    .attributes
                    .into_iter()
                    .map(|(k, v)| (k.to_ascii_lowercase(), v))
                    .collect(),
                text: spec.text.unwrap_or_default(),
                rect: spec.rect.unwrap_or(DEFAULT_ELEMENT_RECT),
                style: spec.style,
                parent,
                children: Vec::new(),
            },
        );

        let children: Vec<NodeId> = spec
            .children
            .into_iter()
            .map(|child| self.insert(Some(id), child))
            .collect();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = children;
        }
        id
    }

    /// Append a new subtree under `parent`.
    pub fn append(&mut self, parent: NodeId, spec: ElementSpec) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = self.insert(Some(parent), spec);
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        Some(id)
    }

    /// Remove `node` and its subtree. Handles to removed nodes stay invalid.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if node == self.root || !self.nodes.contains_key(&node) {
            return false;
        }
        if let Some(parent) = self.nodes.get(&node).and_then(|n| n.parent) {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != node);
            }
        }
        for id in self.subtree(node) {
            self.nodes.remove(&id);
        }
        true
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.attributes.insert(name.to_ascii_lowercase(), value.into());
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.attributes.remove(&name.to_ascii_lowercase());
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.text = text.into();
        }
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.rect = rect;
        }
    }

    pub fn set_style(&mut self, node: NodeId, style: ComputedStyle) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.style = style;
        }
    }

    pub fn scroll_to(&mut self, x: f32, y: f32) {
        self.scroll = Point {
            x: x.max(0.0),
            y: y.max(0.0),
        };
    }

    pub fn scroll_position(&self) -> Point {
        self.scroll
    }

    pub fn set_viewport(&mut self, size: Size) {
        self.viewport = size;
    }

    /// First element matching `selector`, `None` on no match or bad syntax.
    pub fn first(&self, selector: &str) -> Option<NodeId> {
        self.query_selector_all(selector)
            .ok()
            .and_then(|nodes| nodes.into_iter().next())
    }

    pub fn overlay(&self, node: NodeId) -> Option<&OverlayNode> {
        self.overlays.get(&node)
    }

    pub fn overlays(&self) -> impl Iterator<Item = (NodeId, &OverlayNode)> {
        self.overlays.iter().map(|(id, node)| (*id, node))
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// The mounted overlay node for `layer`, if any.
    pub fn overlay_of(&self, layer: OverlayLayer) -> Option<&OverlayNode> {
        self.overlays.values().find(|o| o.layer == layer)
    }

    pub fn listeners(&self) -> Vec<ListenerKind> {
        self.listeners.values().copied().collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Pre-order walk of the subtree rooted at `from`, `from` included.
    fn subtree(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn hidden_by_ancestor(&self, node: NodeId) -> bool {
        let mut current = self.nodes.get(&node).and_then(|n| n.parent);
        while let Some(id) = current {
            match self.nodes.get(&id) {
                Some(n) if n.style.display == "none" => return true,
                Some(n) => current = n.parent,
                None => return false,
            }
        }
        false
    }
}

impl Dom for Document {
    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = parse_selector(selector)?;
        Ok(self
            .subtree(self.root)
            .into_iter()
            .filter(|id| list.matches(self, *id))
            .collect())
    }

    fn query_selector_all_within(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        let list = parse_selector(selector)?;
        Ok(self
            .subtree(scope)
            .into_iter()
            .filter(|id| *id != scope && list.matches(self, *id))
            .collect())
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn elements_by_tag(&self, tag: Option<&str>) -> Vec<NodeId> {
        let tag = tag.map(str::to_ascii_lowercase);
        self.subtree(self.root)
            .into_iter()
            .filter(|id| match &tag {
                Some(t) => self.nodes.get(id).is_some_and(|n| n.tag == *t),
                None => true,
            })
            .collect()
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).map(|n| n.tag.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes
            .get(&node)
            .and_then(|n| n.attributes.get(&name.to_ascii_lowercase()).cloned())
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        let mut attrs: Vec<(String, String)> = self
            .nodes
            .get(&node)
            .map(|n| {
                n.attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        attrs.sort();
        attrs
    }

    fn text_content(&self, node: NodeId) -> String {
        self.subtree(node)
            .into_iter()
            .filter_map(|id| self.nodes.get(&id).map(|n| n.text.as_str()))
            .collect()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node) || self.overlays.contains_key(&node)
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        let n = self.nodes.get(&node)?;
        if n.style.display == "none" || self.hidden_by_ancestor(node) {
            return Some(Rect::default());
        }
        Some(n.rect.translate(-self.scroll.x, -self.scroll.y))
    }

    fn computed_style(&self, node: NodeId) -> Option<ComputedStyle> {
        self.nodes.get(&node).map(|n| n.style.clone())
    }

    fn viewport(&self) -> Rect {
        Rect::new(0.0, 0.0, self.viewport.width, self.viewport.height)
    }
}

impl PageSurface for Document {
    fn scroll_into_view(&mut self, node: NodeId, _behavior: ScrollBehavior) {
        let Some(rect) = self.nodes.get(&node).map(|n| n.rect) else {
            return;
        };
        let center = rect.center();
        self.scroll_to(
            center.x - self.viewport.width / 2.0,
            center.y - self.viewport.height / 2.0,
        );
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.insert(id, kind);
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn mount_overlay(&mut self, layer: OverlayLayer) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.overlays.insert(
            id,
            OverlayNode {
                layer,
                visible: true,
                cutout: None,
                position: None,
                arrow: None,
                content: TooltipContent::default(),
            },
        );
        id
    }

    fn update_overlay(&mut self, node: NodeId, patch: OverlayPatch) {
        let Some(overlay) = self.overlays.get_mut(&node) else {
            return;
        };
        match patch {
            OverlayPatch::Cutout(rect) => overlay.cutout = rect,
            OverlayPatch::Position {
                x,
                y,
                placement,
                arrow,
            } => {
                overlay.position = Some((x, y, placement));
                overlay.arrow = Some(arrow);
            }
            OverlayPatch::Content(content) => overlay.content = content,
            OverlayPatch::Visible(visible) => overlay.visible = visible,
        }
    }

    fn unmount(&mut self, node: NodeId) {
        self.overlays.remove(&node);
    }
}
