//! Signed integer rectangles in output (stack) coordinates.
//!
//! Windows may hang off any edge of the output, so origins are signed. A
//! rectangle with a non-positive width or height is empty and never contains
//! or intersects anything.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin with the given size.
    pub const fn sized(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        !self.is_empty() && x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// True when `other` lies completely inside `self`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        if other.is_empty() {
            return true;
        }
        !self.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Bounding box of both rectangles. Empty operands are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// `self` minus `other`, as up to four disjoint pieces.
    ///
    /// Pieces are emitted as full-width top and bottom bands followed by the
    /// left and right slivers of the middle band.
    pub fn subtract(&self, other: &Rect) -> Vec<Rect> {
        let Some(hole) = self.intersection(other) else {
            if self.is_empty() {
                return Vec::new();
            }
            return vec![*self];
        };
        let mut pieces = Vec::with_capacity(4);
        if hole.y > self.y {
            pieces.push(Rect::new(self.x, self.y, self.width, hole.y - self.y));
        }
        if hole.bottom() < self.bottom() {
            pieces.push(Rect::new(
                self.x,
                hole.bottom(),
                self.width,
                self.bottom() - hole.bottom(),
            ));
        }
        if hole.x > self.x {
            pieces.push(Rect::new(self.x, hole.y, hole.x - self.x, hole.height));
        }
        if hole.right() < self.right() {
            pieces.push(Rect::new(
                hole.right(),
                hole.y,
                self.right() - hole.right(),
                hole.height,
            ));
        }
        pieces
    }
}

/// Subtract `hole` from every rectangle in `pieces`, in place.
pub fn subtract_all(pieces: &mut Vec<Rect>, hole: &Rect) {
    if !pieces.iter().any(|piece| piece.intersects(hole)) {
        return;
    }
    let mut next = Vec::with_capacity(pieces.len() + 3);
    for piece in pieces.drain(..) {
        next.extend(piece.subtract(hole));
    }
    *pieces = next;
}

/// Bounding box of a set of rectangles, `None` when all are empty.
pub fn bounding_box(rects: &[Rect]) -> Option<Rect> {
    let bounds = rects
        .iter()
        .fold(Rect::default(), |acc, rect| acc.union(rect));
    (!bounds.is_empty()).then_some(bounds)
}
