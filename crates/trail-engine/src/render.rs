//! Spotlight mask and anchored tooltip.
//!
//! The renderer owns two overlay nodes on the page surface. It never caches
//! target geometry: every call re-reads the target's bounding box.

use tracing::debug;
use trail_common::{Placement, Step, StepErrorKind};
use trail_core::config::LayoutConfig;
use trail_core::dom::{NodeId, OverlayLayer, OverlayPatch, PageSurface, TooltipContent};
use trail_core::layout::{ArrowOffset, compute_position};

pub struct OverlayRenderer {
    layout: LayoutConfig,
    mask: Option<NodeId>,
    tooltip: Option<NodeId>,
}

impl OverlayRenderer {
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            layout,
            mask: None,
            tooltip: None,
        }
    }

    pub fn tooltip(&self) -> Option<NodeId> {
        self.tooltip
    }

    pub fn mask(&self) -> Option<NodeId> {
        self.mask
    }

    /// Both layers present and still attached to the page.
    pub fn is_mounted<S: PageSurface + ?Sized>(&self, surface: &S) -> bool {
        matches!((self.mask, self.tooltip), (Some(m), Some(t)) if surface.is_attached(m) && surface.is_attached(t))
    }

    fn mount<S: PageSurface + ?Sized>(&mut self, surface: &mut S) {
        if !self.mask.is_some_and(|m| surface.is_attached(m)) {
            self.mask = Some(surface.mount_overlay(OverlayLayer::Mask));
        }
        if !self.tooltip.is_some_and(|t| surface.is_attached(t)) {
            self.tooltip = Some(surface.mount_overlay(OverlayLayer::Tooltip));
        }
    }

    /// Spotlight `target` and fill the tooltip. Positioning happens later in
    /// [`OverlayRenderer::apply_layout`].
    pub fn present_step<S: PageSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        target: NodeId,
        step: &Step,
        index: usize,
        total: usize,
    ) {
        self.mount(surface);
        self.update_cutout(surface, target);
        if let Some(tooltip) = self.tooltip {
            surface.update_overlay(tooltip, OverlayPatch::Content(step_content(step, index, total)));
            surface.update_overlay(tooltip, OverlayPatch::Visible(true));
        }
    }

    /// Diagnostic presentation for a required step whose target is unusable.
    pub fn present_error<S: PageSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        step: &Step,
        index: usize,
        total: usize,
        kind: StepErrorKind,
    ) {
        self.mount(surface);
        let (Some(mask), Some(tooltip)) = (self.mask, self.tooltip) else {
            return;
        };
        surface.update_overlay(mask, OverlayPatch::Cutout(None));

        let viewport = surface.viewport();
        let size = self.layout.tooltip_size();
        surface.update_overlay(
            tooltip,
            OverlayPatch::Position {
                x: viewport.x + (viewport.width - size.width) / 2.0,
                y: viewport.y + (viewport.height - size.height) / 2.0,
                placement: step.placement,
                arrow: ArrowOffset::default(),
            },
        );
        surface.update_overlay(
            tooltip,
            OverlayPatch::Content(TooltipContent {
                title: step.title.clone(),
                body: format!("Step {}: {}", index + 1, kind.describe()),
                hint: Some("Press Next to skip this step".to_string()),
                progress: progress(index, total),
                is_error: true,
            }),
        );
        surface.update_overlay(tooltip, OverlayPatch::Visible(true));
    }

    /// Cut-out follows the target's current box, inflated by the spotlight padding.
    pub fn update_cutout<S: PageSurface + ?Sized>(&self, surface: &mut S, target: NodeId) {
        let Some(mask) = self.mask else {
            return;
        };
        let cutout = surface
            .bounding_rect(target)
            .map(|rect| rect.inflate(self.layout.spotlight_padding));
        surface.update_overlay(mask, OverlayPatch::Cutout(cutout));
    }

    /// Anchor the tooltip to `target`. Returns false without touching the page
    /// when the tooltip or the target has gone away in the meantime.
    pub fn apply_layout<S: PageSurface + ?Sized>(
        &self,
        surface: &mut S,
        target: NodeId,
        placement: Placement,
    ) -> bool {
        let Some(tooltip) = self.tooltip.filter(|t| surface.is_attached(*t)) else {
            debug!("Tooltip node is gone, dropping layout result");
            return false;
        };
        let Some(reference) = surface.bounding_rect(target).filter(|_| surface.is_attached(target))
        else {
            debug!("Target {} detached before layout", target);
            return false;
        };

        let position = compute_position(
            reference,
            self.layout.tooltip_size(),
            placement,
            surface.viewport(),
            &self.layout.options(),
        );
        surface.update_overlay(
            tooltip,
            OverlayPatch::Position {
                x: position.x,
                y: position.y,
                placement: position.placement,
                arrow: position.arrow,
            },
        );
        true
    }

    /// Remove both layers from the page.
    pub fn unmount<S: PageSurface + ?Sized>(&mut self, surface: &mut S) {
        for node in [self.mask.take(), self.tooltip.take()].into_iter().flatten() {
            surface.unmount(node);
        }
    }
}

pub fn step_content(step: &Step, index: usize, total: usize) -> TooltipContent {
    TooltipContent {
        title: step.title.clone(),
        body: step.content.clone(),
        hint: step.action.map(|action| action.hint().to_string()),
        progress: progress(index, total),
        is_error: false,
    }
}

fn progress(index: usize, total: usize) -> String {
    format!("{} / {}", index + 1, total)
}
