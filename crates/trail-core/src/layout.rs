//! Anchored tooltip positioning.
//!
//! Places a floating box next to a reference rectangle on the requested side,
//! then applies two fallbacks: `flip` to the opposite side when the requested
//! one overflows the viewport, and `shift` along the cross axis to keep the
//! box on-screen with a fixed padding.

use trail_common::{Placement, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Gap between the reference and the floating box.
    pub offset: f32,
    /// Minimum distance from the viewport edges.
    pub padding: f32,
    /// Minimum distance of the arrow from the box corners.
    pub arrow_padding: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            offset: 12.0,
            padding: 8.0,
            arrow_padding: 8.0,
        }
    }
}

/// Arrow position relative to the floating box; only the cross axis is set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArrowOffset {
    pub x: Option<f32>,
    pub y: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedPosition {
    pub x: f32,
    pub y: f32,
    /// Side actually used after flipping.
    pub placement: Placement,
    pub arrow: ArrowOffset,
}

pub fn compute_position(
    reference: Rect,
    floating: Size,
    placement: Placement,
    viewport: Rect,
    options: &LayoutOptions,
) -> ComputedPosition {
    let mut side = placement;
    let (mut x, mut y) = place(reference, floating, side, options.offset);

    let overflow = main_axis_overflow(x, y, floating, side, viewport, options.padding);
    if overflow > 0.0 {
        let alt = side.opposite();
        let (ax, ay) = place(reference, floating, alt, options.offset);
        let alt_overflow = main_axis_overflow(ax, ay, floating, alt, viewport, options.padding);
        if alt_overflow < overflow {
            side = alt;
            x = ax;
            y = ay;
        }
    }

    if side.is_vertical() {
        x = shift(x, floating.width, viewport.x, viewport.right(), options.padding);
    } else {
        y = shift(y, floating.height, viewport.y, viewport.bottom(), options.padding);
    }

    let center = reference.center();
    let arrow = if side.is_vertical() {
        ArrowOffset {
            x: Some(clamp_arrow(center.x - x, floating.width, options.arrow_padding)),
            y: None,
        }
    } else {
        ArrowOffset {
            x: None,
            y: Some(clamp_arrow(center.y - y, floating.height, options.arrow_padding)),
        }
    };

    ComputedPosition {
        x,
        y,
        placement: side,
        arrow,
    }
}

fn place(reference: Rect, floating: Size, side: Placement, offset: f32) -> (f32, f32) {
    let center = reference.center();
    match side {
        Placement::Top => (
            center.x - floating.width / 2.0,
            reference.y - floating.height - offset,
        ),
        Placement::Bottom => (center.x - floating.width / 2.0, reference.bottom() + offset),
        Placement::Left => (
            reference.x - floating.width - offset,
            center.y - floating.height / 2.0,
        ),
        Placement::Right => (reference.right() + offset, center.y - floating.height / 2.0),
    }
}

/// How far the box spills past the padded viewport on its main axis.
fn main_axis_overflow(
    x: f32,
    y: f32,
    floating: Size,
    side: Placement,
    viewport: Rect,
    padding: f32,
) -> f32 {
    match side {
        Placement::Top => (viewport.y + padding) - y,
        Placement::Bottom => (y + floating.height) - (viewport.bottom() - padding),
        Placement::Left => (viewport.x + padding) - x,
        Placement::Right => (x + floating.width) - (viewport.right() - padding),
    }
}

fn shift(pos: f32, extent: f32, start: f32, end: f32, padding: f32) -> f32 {
    let min = start + padding;
    let max = end - padding - extent;
    // min wins when the box is larger than the available space
    pos.min(max).max(min)
}

fn clamp_arrow(offset: f32, extent: f32, padding: f32) -> f32 {
    offset.min(extent - padding).max(padding)
}
