//! Render-time re-resolution of comment pins.
//!
//! Stored anchors are percentages; on every scroll or resize tick each
//! mounted pin is turned back into a pixel position against the current
//! layout. Pins recorded on a sticky element follow that element while it is
//! stuck, everything else follows the proposal container.
//!
//! The host (browser shim, test double) implements [`Surface`]. Pins are
//! registered through [`Overlay::mount`], which returns a [`PinSubscription`]
//! guard; dropping the guard removes the pin from every later tick.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::anchor::{find_sticky, to_pixels, Anchor, CommentAnchor, ElementInfo, Point, Rect};
use crate::types::DbId;

/// Pixel movement below which a pin is considered unchanged.
pub const PLACEMENT_EPSILON_PX: f64 = 0.5;

// ---------------------------------------------------------------------------
// Host interface
// ---------------------------------------------------------------------------

/// The layout queries the overlay needs from its host.
pub trait Surface {
    /// Current bounding box of the proposal container.
    fn container_rect(&self) -> Rect;

    /// Elements under `point`, innermost first. Empty when nothing is there.
    fn hit_test(&self, point: Point) -> Vec<ElementInfo>;
}

/// Layout event that triggers re-resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    Scroll,
    Resize,
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// Which box a pin is currently positioned against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Tracking {
    Container,
    Sticky { selector: String },
}

impl Tracking {
    pub fn is_sticky(&self) -> bool {
        matches!(self, Self::Sticky { .. })
    }
}

/// Where to draw a pin right now, in client pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PinPlacement {
    pub position: Point,
    /// Pixel `(width, height)` of a highlighted region.
    pub size: Option<(f64, f64)>,
    pub tracking: Tracking,
}

impl PinPlacement {
    fn differs_from(&self, other: &PinPlacement) -> bool {
        if self.tracking != other.tracking {
            return true;
        }
        let moved = (self.position.x - other.position.x).abs() >= PLACEMENT_EPSILON_PX
            || (self.position.y - other.position.y).abs() >= PLACEMENT_EPSILON_PX;
        let resized = match (self.size, other.size) {
            (Some((w1, h1)), Some((w2, h2))) => {
                (w1 - w2).abs() >= PLACEMENT_EPSILON_PX || (h1 - h2).abs() >= PLACEMENT_EPSILON_PX
            }
            (None, None) => false,
            _ => true,
        };
        moved || resized
    }
}

fn place(anchor: &Anchor, reference: &Rect, tracking: Tracking) -> PinPlacement {
    let position = to_pixels(anchor.origin(), reference);
    let size = anchor
        .extent()
        .map(|(w, h)| (w / 100.0 * reference.width, h / 100.0 * reference.height));
    PinPlacement {
        position,
        size,
        tracking,
    }
}

/// Compute the current on-screen placement of a stored anchor.
///
/// 1. Map the container-relative origin to pixels against the current
///    container box.
/// 2. Hit-test that pixel. If it lies inside the sticky element the anchor
///    was recorded on, place the pin against that element's current box.
/// 3. Otherwise fall back to container-relative placement.
///
/// The hit-test alone decides, so a pin near a header's edge moves in and
/// out of sticky tracking as the content scrolls under it.
pub fn resolve_pin(anchor: &CommentAnchor, surface: &dyn Surface) -> PinPlacement {
    let container = surface.container_rect();
    let probe = to_pixels(anchor.container.origin(), &container);

    if let Some(sticky) = &anchor.sticky {
        let chain = surface.hit_test(probe);
        if let Some(el) = find_sticky(&chain).filter(|el| sticky.anchor_ref.matches(el)) {
            return place(
                &sticky.anchor,
                &el.rect,
                Tracking::Sticky {
                    selector: sticky.anchor_ref.selector(),
                },
            );
        }
    }

    place(&anchor.container, &container, Tracking::Container)
}

// ---------------------------------------------------------------------------
// Per-pin tracking
// ---------------------------------------------------------------------------

/// Movement between container and sticky tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingTransition {
    EnteredSticky,
    LeftSticky,
}

/// A placement change produced by a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PinUpdate {
    pub comment_id: DbId,
    pub placement: PinPlacement,
    pub transition: Option<TrackingTransition>,
}

/// Remembers the last placement of one pin so unchanged ticks stay silent.
#[derive(Debug, Clone)]
pub struct PinTracker {
    comment_id: DbId,
    anchor: CommentAnchor,
    last: Option<PinPlacement>,
}

impl PinTracker {
    pub fn new(comment_id: DbId, anchor: CommentAnchor) -> Self {
        Self {
            comment_id,
            anchor,
            last: None,
        }
    }

    pub fn last_placement(&self) -> Option<&PinPlacement> {
        self.last.as_ref()
    }

    /// Re-resolve and return an update only if the placement changed.
    ///
    /// The first call always reports the initial placement.
    pub fn refresh(&mut self, surface: &dyn Surface) -> Option<PinUpdate> {
        let next = resolve_pin(&self.anchor, surface);

        let transition = match &self.last {
            Some(prev) if !prev.differs_from(&next) => return None,
            Some(prev) => match (prev.tracking.is_sticky(), next.tracking.is_sticky()) {
                (false, true) => Some(TrackingTransition::EnteredSticky),
                (true, false) => Some(TrackingTransition::LeftSticky),
                _ => None,
            },
            None => None,
        };

        self.last = Some(next.clone());
        Some(PinUpdate {
            comment_id: self.comment_id,
            placement: next,
            transition,
        })
    }
}

// ---------------------------------------------------------------------------
// Overlay registry
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Registry {
    next_key: u64,
    pins: BTreeMap<u64, PinTracker>,
}

/// The set of pins currently mounted over one proposal view.
///
/// Single-threaded, like the view it serves. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct Overlay {
    inner: Rc<RefCell<Registry>>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pin for scroll/resize ticks.
    ///
    /// The pin stays registered until the returned guard is dropped.
    pub fn mount(&self, comment_id: DbId, anchor: CommentAnchor) -> PinSubscription {
        let mut registry = self.inner.borrow_mut();
        let key = registry.next_key;
        registry.next_key += 1;
        registry.pins.insert(key, PinTracker::new(comment_id, anchor));
        PinSubscription {
            key,
            registry: Rc::downgrade(&self.inner),
        }
    }

    /// Number of pins currently listening.
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().pins.len()
    }

    /// Re-resolve every mounted pin and return the ones that moved.
    ///
    /// Resolution only reads from `surface`; it never scrolls or resizes,
    /// so dispatching cannot feed back into further events.
    pub fn dispatch(&self, _event: ViewportEvent, surface: &dyn Surface) -> Vec<PinUpdate> {
        let mut registry = self.inner.borrow_mut();
        registry
            .pins
            .values_mut()
            .filter_map(|tracker| tracker.refresh(surface))
            .collect()
    }
}

/// Keeps a pin mounted; dropping it deregisters the pin.
#[derive(Debug)]
pub struct PinSubscription {
    key: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for PinSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().pins.remove(&self.key);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{AnchorRef, AnchorRefKind, PositionMode, StickyAnchor};

    const HEADER_HEIGHT: f64 = 80.0;

    /// A page whose proposal container scrolls under a sticky header that
    /// sits at the top of the document until it sticks to the viewport.
    struct Page {
        scroll_y: f64,
        width: f64,
        header_present: bool,
    }

    impl Page {
        fn new() -> Self {
            Self {
                scroll_y: 0.0,
                width: 1000.0,
                header_present: true,
            }
        }

        fn header(&self) -> ElementInfo {
            ElementInfo {
                tag: "header".into(),
                id: None,
                anchor_id: Some("day-nav".into()),
                classes: vec![],
                sibling_index: 1,
                position: PositionMode::Sticky,
                // Stuck at the viewport top regardless of scroll.
                rect: Rect::new(0.0, 0.0, self.width, HEADER_HEIGHT),
            }
        }
    }

    impl Surface for Page {
        fn container_rect(&self) -> Rect {
            Rect::new(0.0, -self.scroll_y, self.width, 4000.0)
        }

        fn hit_test(&self, point: Point) -> Vec<ElementInfo> {
            let header = self.header();
            if self.header_present && header.rect.contains(point) {
                vec![header]
            } else {
                vec![]
            }
        }
    }

    fn header_anchor() -> CommentAnchor {
        CommentAnchor {
            container: Anchor::Point { x: 50.0, y: 1.0 },
            sticky: Some(StickyAnchor {
                anchor_ref: AnchorRef {
                    kind: AnchorRefKind::AnchorAttribute,
                    value: "day-nav".into(),
                },
                anchor: Anchor::Point { x: 50.0, y: 50.0 },
            }),
        }
    }

    #[test]
    fn plain_pin_follows_container_scroll() {
        let mut page = Page::new();
        let anchor = CommentAnchor::point(10.0, 50.0);

        let p0 = resolve_pin(&anchor, &page);
        assert_eq!(p0.tracking, Tracking::Container);
        assert_eq!(p0.position, Point::new(100.0, 2000.0));

        page.scroll_y = 500.0;
        let p1 = resolve_pin(&anchor, &page);
        assert_eq!(p1.position, Point::new(100.0, 1500.0));
    }

    #[test]
    fn sticky_pin_tracks_header_only_while_hit_test_finds_it() {
        let mut page = Page::new();
        let anchor = header_anchor();

        let p0 = resolve_pin(&anchor, &page);
        assert!(p0.tracking.is_sticky());
        assert_eq!(p0.position, Point::new(500.0, 40.0));

        // Origin pixel is still under the header.
        page.scroll_y = 30.0;
        let p1 = resolve_pin(&anchor, &page);
        assert!(p1.tracking.is_sticky());
        assert_eq!(p1.position, Point::new(500.0, 40.0));

        // Content scrolled far past the header: container placement.
        page.scroll_y = 2500.0;
        let p2 = resolve_pin(&anchor, &page);
        assert_eq!(p2.tracking, Tracking::Container);
        assert_eq!(p2.position, Point::new(500.0, -2460.0));
    }

    #[test]
    fn tracker_crosses_header_edge_while_scrolling() {
        let mut page = Page::new();
        let mut tracker = PinTracker::new(3, header_anchor());
        tracker.refresh(&page);

        page.scroll_y = 50.0;
        let left = tracker.refresh(&page).unwrap();
        assert_eq!(left.transition, Some(TrackingTransition::LeftSticky));
        assert_eq!(left.placement.position, Point::new(500.0, -10.0));

        page.scroll_y = 10.0;
        let entered = tracker.refresh(&page).unwrap();
        assert_eq!(entered.transition, Some(TrackingTransition::EnteredSticky));
        assert_eq!(entered.placement.position, Point::new(500.0, 40.0));
    }

    #[test]
    fn sticky_pin_falls_back_when_anchor_disappears() {
        let mut page = Page::new();
        page.header_present = false;
        let p = resolve_pin(&header_anchor(), &page);
        assert_eq!(p.tracking, Tracking::Container);
        assert_eq!(p.position, Point::new(500.0, 40.0));
    }

    #[test]
    fn region_size_scales_with_reference_box() {
        let page = Page::new();
        let anchor = CommentAnchor {
            container: Anchor::Region {
                x: 10.0,
                y: 10.0,
                width: 20.0,
                height: 5.0,
            },
            sticky: None,
        };
        let p = resolve_pin(&anchor, &page);
        assert_eq!(p.size, Some((200.0, 200.0)));
    }

    #[test]
    fn tracker_reports_only_changes() {
        let mut page = Page::new();
        let mut tracker = PinTracker::new(7, CommentAnchor::point(10.0, 50.0));

        let first = tracker.refresh(&page).expect("initial placement");
        assert_eq!(first.comment_id, 7);
        assert!(first.transition.is_none());

        assert!(tracker.refresh(&page).is_none());

        page.scroll_y = 0.2;
        assert!(tracker.refresh(&page).is_none(), "sub-pixel move is ignored");

        page.scroll_y = 100.0;
        assert!(tracker.refresh(&page).is_some());
    }

    #[test]
    fn tracker_reports_sticky_transitions() {
        let mut page = Page::new();
        let mut tracker = PinTracker::new(1, header_anchor());
        tracker.refresh(&page);

        page.header_present = false;
        let left = tracker.refresh(&page).unwrap();
        assert_eq!(left.transition, Some(TrackingTransition::LeftSticky));

        page.header_present = true;
        let entered = tracker.refresh(&page).unwrap();
        assert_eq!(entered.transition, Some(TrackingTransition::EnteredSticky));
    }

    #[test]
    fn dropping_subscription_deregisters_pin() {
        let page = Page::new();
        let overlay = Overlay::new();

        let a = overlay.mount(1, CommentAnchor::point(10.0, 10.0));
        let b = overlay.mount(2, CommentAnchor::point(20.0, 20.0));
        assert_eq!(overlay.listener_count(), 2);
        assert_eq!(overlay.dispatch(ViewportEvent::Resize, &page).len(), 2);

        drop(a);
        assert_eq!(overlay.listener_count(), 1);

        drop(b);
        assert_eq!(overlay.listener_count(), 0);
        assert!(overlay.dispatch(ViewportEvent::Scroll, &page).is_empty());
    }

    #[test]
    fn subscription_outliving_overlay_is_harmless() {
        let overlay = Overlay::new();
        let sub = overlay.mount(1, CommentAnchor::point(1.0, 1.0));
        drop(overlay);
        drop(sub);
    }
}
