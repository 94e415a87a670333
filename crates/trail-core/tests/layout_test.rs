use pretty_assertions::assert_eq;
use trail_common::{Placement, Rect, Size};
use trail_core::layout::{ArrowOffset, LayoutOptions, compute_position};

const VIEWPORT: Rect = Rect::new(0.0, 0.0, 1280.0, 800.0);
const TOOLTIP: Size = Size::new(320.0, 160.0);

fn position(reference: Rect, placement: Placement) -> (f32, f32, Placement, ArrowOffset) {
    let p = compute_position(reference, TOOLTIP, placement, VIEWPORT, &LayoutOptions::default());
    (p.x, p.y, p.placement, p.arrow)
}

#[test]
fn test_bottom_when_it_fits() {
    assert_eq!(
        position(Rect::new(100.0, 100.0, 200.0, 40.0), Placement::Bottom),
        (
            40.0,
            152.0,
            Placement::Bottom,
            ArrowOffset {
                x: Some(160.0),
                y: None
            }
        )
    );
}

#[test]
fn test_flips_to_top_near_viewport_bottom() {
    let (_, y, placement, _) = position(Rect::new(100.0, 700.0, 200.0, 40.0), Placement::Bottom);
    assert_eq!(placement, Placement::Top);
    assert_eq!(y, 528.0);
}

#[test]
fn test_flips_right_to_left() {
    assert_eq!(
        position(Rect::new(1200.0, 300.0, 60.0, 40.0), Placement::Right),
        (
            868.0,
            240.0,
            Placement::Left,
            ArrowOffset {
                x: None,
                y: Some(80.0)
            }
        )
    );
}

#[test]
fn test_shift_keeps_box_inside_viewport() {
    let (x, _, _, arrow) = position(Rect::new(0.0, 100.0, 40.0, 40.0), Placement::Bottom);
    assert_eq!(x, 8.0);
    assert_eq!(arrow.x, Some(12.0));
}

#[test]
fn test_arrow_stays_off_the_corner() {
    let (_, _, _, arrow) = position(Rect::new(0.0, 100.0, 4.0, 40.0), Placement::Bottom);
    assert_eq!(arrow.x, Some(8.0));
}

#[test]
fn test_no_flip_when_both_sides_overflow_more() {
    let tall = Rect::new(100.0, 20.0, 200.0, 760.0);
    let (_, _, placement, _) = position(tall, Placement::Bottom);
    assert_eq!(placement, Placement::Bottom);
}
