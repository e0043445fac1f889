//! Which structural anchors are visible at the current scroll position.

use crate::frames::TOP_ANCHOR;
use crate::geometry::{Point, Rect};
use crate::pagination::ReadingDirection;

/// Distance from the viewport's leading edge that an anchor must cross.
pub const DETECTION_THRESHOLD_PX: f64 = 50.0;

/// Anchors straddling the detection threshold, in list order.
///
/// `bounding_rect` resolves an anchor id to its bounding rect in viewport
/// coordinates; unknown ids are skipped. When nothing straddles the threshold
/// the last anchor already scrolled past it is reported, or `"top"` when none
/// has. An empty anchor list reports nothing.
pub fn detect_active_anchors<F>(
    anchors: &[String],
    direction: ReadingDirection,
    scroll: Point,
    mut bounding_rect: F,
) -> Vec<String>
where
    F: FnMut(&str) -> Option<Rect>,
{
    if anchors.is_empty() {
        return Vec::new();
    }

    let mut active = Vec::new();
    let mut last_passed: &str = TOP_ANCHOR;

    for anchor in anchors {
        if anchor == TOP_ANCHOR {
            if direction.axis(scroll) < DETECTION_THRESHOLD_PX {
                active.push(anchor.clone());
            }
            continue;
        }

        let Some(rect) = bounding_rect(anchor) else {
            continue;
        };
        let (leading, trailing) = match direction {
            ReadingDirection::Horizontal => (rect.x, rect.right()),
            ReadingDirection::Vertical => (rect.y, rect.bottom()),
        };
        if leading < DETECTION_THRESHOLD_PX && trailing > DETECTION_THRESHOLD_PX {
            active.push(anchor.clone());
        }
        if leading < DETECTION_THRESHOLD_PX {
            last_passed = anchor.as_str();
        }
    }

    if active.is_empty() {
        active.push(last_passed.to_string());
    }
    active
}
