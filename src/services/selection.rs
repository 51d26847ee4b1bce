//! SelectionModel: click, context and marquee (rubber-band) selection.
//!
//! Hit testing runs against a bounding-box snapshot supplied by the host on
//! every layout pass, never against live rendering state. All points and
//! boxes are in content coordinates.

use std::collections::HashSet;

use crate::models::file::FileEntry;
use crate::models::geometry::{EntryBounds, Point, Rect};

/// Rectangle being dragged out. Exists only between marquee start and end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarqueeRegion {
    pub anchor: Point,
    pub live: Point,
    /// Set on the first update that moves away from the anchor.
    pub moved: bool,
}

impl MarqueeRegion {
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.anchor, self.live)
    }
}

#[derive(Debug, Default)]
pub struct SelectionModel {
    selected: HashSet<String>,
    layout: Vec<EntryBounds>,
    marquee: Option<MarqueeRegion>,
    /// Modifier state captured at pointer-down for the current gesture.
    gesture_additive: bool,
    /// A drag just ended; the click event the host delivers right after
    /// pointer-up must not clear the marquee result.
    swallow_background_click: bool,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    // --- queries ---

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected ids, sorted for deterministic output.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.selected.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Catalog entries that are selected, in catalog order. Stale ids that
    /// no longer resolve are skipped.
    pub fn resolve<'a>(&self, catalog: &'a [FileEntry]) -> Vec<&'a FileEntry> {
        catalog
            .iter()
            .filter(|e| self.selected.contains(&e.id))
            .collect()
    }

    pub fn marquee(&self) -> Option<&MarqueeRegion> {
        self.marquee.as_ref()
    }

    pub fn layout(&self) -> &[EntryBounds] {
        &self.layout
    }

    // --- transitions ---

    /// Replace the bounding-box snapshot. An in-progress drag is re-evaluated
    /// against the new boxes.
    pub fn set_layout(&mut self, layout: Vec<EntryBounds>) {
        self.layout = layout;
        if let Some(region) = self.marquee {
            if region.moved {
                self.selected = self.hits(&region.rect());
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// With `additive` the id is toggled; otherwise the selection becomes `{id}`.
    pub fn click(&mut self, id: &str, additive: bool) {
        if additive {
            if !self.selected.remove(id) {
                self.selected.insert(id.to_string());
            }
        } else {
            self.selected.clear();
            self.selected.insert(id.to_string());
        }
    }

    /// Secondary action on an entry: an unselected entry becomes the sole
    /// selection, a selected one leaves the selection untouched.
    pub fn context_select(&mut self, id: &str) {
        if !self.selected.contains(id) {
            self.selected.clear();
            self.selected.insert(id.to_string());
        }
    }

    /// Begin a drag at `point`. Without a modifier the selection is cleared
    /// immediately.
    pub fn marquee_start(&mut self, point: Point, additive: bool) {
        self.swallow_background_click = false;
        self.marquee = Some(MarqueeRegion {
            anchor: point,
            live: point,
            moved: false,
        });
        if !additive {
            self.selected.clear();
        }
    }

    /// Move the live corner. Once the pointer has left the anchor the
    /// selection is replaced by exactly the entries whose boxes intersect
    /// the rectangle. Updates before any movement change nothing.
    pub fn marquee_update(&mut self, point: Point) {
        let Some(region) = self.marquee.as_mut() else {
            return;
        };
        region.live = point;
        if point != region.anchor {
            region.moved = true;
        }
        if !region.moved {
            return;
        }
        let rect = region.rect();
        self.selected = self.hits(&rect);
    }

    /// Discard the region, keeping the last computed selection. Returns
    /// whether the pointer moved (a drag rather than a plain click).
    pub fn marquee_end(&mut self) -> bool {
        let moved = self.marquee.take().is_some_and(|r| r.moved);
        self.swallow_background_click = moved;
        moved
    }

    /// Click on empty space. Clears without a modifier unless a drag is
    /// active or just finished.
    pub fn background_click(&mut self, additive: bool) {
        if std::mem::take(&mut self.swallow_background_click) {
            return;
        }
        if self.marquee.is_some() || additive {
            return;
        }
        self.selected.clear();
    }

    // --- pointer gesture driver ---

    /// Primary pointer pressed. `hit` is the entry under the pointer, if any.
    pub fn pointer_down(&mut self, point: Point, hit: Option<&str>, additive: bool) {
        self.gesture_additive = additive;
        match hit {
            Some(id) => {
                self.swallow_background_click = false;
                self.click(id, additive);
            }
            None => self.marquee_start(point, additive),
        }
    }

    pub fn pointer_move(&mut self, point: Point) {
        self.marquee_update(point);
    }

    /// Primary pointer released. A background press with no movement is a
    /// plain background click; a drag keeps its marquee result, and the
    /// click event the host delivers after the release is swallowed.
    pub fn pointer_up(&mut self) {
        if self.marquee.is_none() {
            return;
        }
        if !self.marquee_end() {
            self.background_click(self.gesture_additive);
        }
    }

    /// Secondary pointer (context menu) on an entry.
    pub fn secondary_click(&mut self, id: &str) {
        self.context_select(id);
    }

    fn hits(&self, rect: &Rect) -> HashSet<String> {
        self.layout
            .iter()
            .filter(|b| b.rect.intersects(rect))
            .map(|b| b.id.clone())
            .collect()
    }
}
