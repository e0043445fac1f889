//! Region quadtree over rectangles.
//!
//! Items live in a flat arena owned by the tree; nodes hold arena ids. A node
//! that reaches capacity splits into four equal quadrants and every item it held
//! is re-inserted into each child it intersects, so an item straddling a
//! quadrant edge is reachable from both sides.

use smallvec::SmallVec;

use crate::geometry::Rect;

/// Default per-node capacity before subdivision.
pub const DEFAULT_CAPACITY: usize = 4;

/// Quadrants narrower or shorter than this are not split further.
const MIN_CELL_EXTENT: f64 = 0.5;

/// Values with a rectangular footprint that can be stored in a [`QuadTree`].
pub trait Bounded {
    fn bounds(&self) -> Rect;
}

impl Bounded for Rect {
    fn bounds(&self) -> Rect {
        *self
    }
}

/// Insertion-ordered handle of an item stored in a [`QuadTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u32);

impl ItemId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Node {
    boundary: Rect,
    entries: SmallVec<[ItemId; DEFAULT_CAPACITY]>,
    // NW, NE, SW, SE
    children: Option<Box<[Node; 4]>>,
}

impl Node {
    fn new(boundary: Rect) -> Self {
        Self {
            boundary,
            entries: SmallVec::new(),
            children: None,
        }
    }

    fn can_subdivide(&self) -> bool {
        self.boundary.width / 2.0 >= MIN_CELL_EXTENT
            && self.boundary.height / 2.0 >= MIN_CELL_EXTENT
    }

    fn subdivide(&mut self) {
        let Rect { x, y, .. } = self.boundary;
        let w = self.boundary.width / 2.0;
        let h = self.boundary.height / 2.0;
        self.children = Some(Box::new([
            Node::new(Rect::new(x, y, w, h)),
            Node::new(Rect::new(x + w, y, w, h)),
            Node::new(Rect::new(x, y + h, w, h)),
            Node::new(Rect::new(x + w, y + h, w, h)),
        ]));
    }

    fn insert<T: Bounded>(
        &mut self,
        id: ItemId,
        rect: &Rect,
        items: &[T],
        capacity: usize,
    ) -> bool {
        if !self.boundary.intersects(rect) {
            return false;
        }

        if self.children.is_none() {
            if self.entries.len() < capacity || !self.can_subdivide() {
                self.entries.push(id);
                return true;
            }
            self.subdivide();
            let existing = core::mem::take(&mut self.entries);
            for existing_id in existing {
                let existing_rect = items[existing_id.index()].bounds();
                self.insert_into_children(existing_id, &existing_rect, items, capacity);
            }
        }

        self.insert_into_children(id, rect, items, capacity)
    }

    fn insert_into_children<T: Bounded>(
        &mut self,
        id: ItemId,
        rect: &Rect,
        items: &[T],
        capacity: usize,
    ) -> bool {
        let Some(children) = self.children.as_deref_mut() else {
            return false;
        };
        let mut inserted = false;
        for child in children.iter_mut() {
            if child.insert(id, rect, items, capacity) {
                inserted = true;
            }
        }
        inserted
    }

    fn query<T: Bounded>(&self, range: &Rect, items: &[T], found: &mut Vec<ItemId>) {
        if !self.boundary.intersects(range) {
            return;
        }
        for id in &self.entries {
            if range.intersects(&items[id.index()].bounds()) {
                found.push(*id);
            }
        }
        if let Some(children) = self.children.as_deref() {
            for child in children {
                child.query(range, items, found);
            }
        }
    }

    fn depth(&self) -> usize {
        match self.children.as_deref() {
            Some(children) => 1 + children.iter().map(Node::depth).max().unwrap_or(0),
            None => 1,
        }
    }
}

/// Region quadtree mapping rectangles to arbitrary records.
#[derive(Debug)]
pub struct QuadTree<T> {
    capacity: usize,
    items: Vec<T>,
    root: Node,
}

impl<T: Bounded> QuadTree<T> {
    /// Create an empty tree over `boundary`. A capacity of `0` is raised to `1`.
    pub fn new(boundary: Rect, capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: Vec::new(),
            root: Node::new(boundary),
        }
    }

    pub fn with_default_capacity(boundary: Rect) -> Self {
        Self::new(boundary, DEFAULT_CAPACITY)
    }

    pub fn boundary(&self) -> Rect {
        self.root.boundary
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of accepted items (an item stored in several quadrants counts once).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Depth of the deepest node; an undivided tree has depth 1.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Store `item` if its bounds intersect the tree boundary, even partially.
    ///
    /// Returns `false` (and drops the item) when it lies wholly outside.
    pub fn insert(&mut self, item: T) -> bool {
        let rect = item.bounds();
        if !self.root.boundary.intersects(&rect) {
            return false;
        }
        let Ok(raw) = u32::try_from(self.items.len()) else {
            log::warn!("quadtree item limit reached; dropping region");
            return false;
        };
        let id = ItemId(raw);
        self.items.push(item);
        self.root.insert(id, &rect, &self.items, self.capacity)
    }

    /// Items whose bounds intersect `range`, in node order: a node's own items
    /// first, then its NW, NE, SW and SE children.
    ///
    /// An item stored in several quadrants that `range` overlaps is returned once
    /// per quadrant. Callers ranking by proximity must not rely on this order.
    pub fn query(&self, range: &Rect) -> Vec<&T> {
        self.query_ids(range)
            .into_iter()
            .map(|id| &self.items[id.index()])
            .collect()
    }

    /// Like [`QuadTree::query`] but yields insertion handles alongside items.
    pub fn query_with_ids(&self, range: &Rect) -> Vec<(ItemId, &T)> {
        self.query_ids(range)
            .into_iter()
            .map(|id| (id, &self.items[id.index()]))
            .collect()
    }

    pub fn get(&self, id: ItemId) -> Option<&T> {
        self.items.get(id.index())
    }

    /// All items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    fn query_ids(&self, range: &Rect) -> Vec<ItemId> {
        let mut found = Vec::new();
        self.root.query(range, &self.items, &mut found);
        found
    }
}
