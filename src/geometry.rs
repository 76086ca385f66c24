//! Integer geometry in logical coordinates.
//!
//! These are the crate's own types. They mirror the logical `Point`, `Size` and `Rectangle`
//! of a compositor toolkit without its coordinate-space parameter.

use std::fmt;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rectangle {
    pub loc: Point,
    pub size: Size,
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Size {
    fn from((w, h): (i32, i32)) -> Self {
        Self { w, h }
    }
}

impl Rectangle {
    pub fn new(loc: Point, size: Size) -> Self {
        Self { loc, size }
    }

    pub fn from_size(size: Size) -> Self {
        Self {
            loc: Point::default(),
            size,
        }
    }

    /// Right edge, exclusive. Saturates at `i32::MAX`.
    pub fn right(&self) -> i32 {
        self.loc.x.saturating_add(self.size.w)
    }

    /// Bottom edge, exclusive. Saturates at `i32::MAX`.
    pub fn bottom(&self) -> i32 {
        self.loc.y.saturating_add(self.size.h)
    }

    pub fn contains(&self, point: impl Into<Point>) -> bool {
        let point = point.into();
        point.x >= self.loc.x
            && point.y >= self.loc.y
            && point.x < self.right()
            && point.y < self.bottom()
    }

    /// Smallest rectangle containing both.
    pub fn merge(self, other: Self) -> Self {
        let x = self.loc.x.min(other.loc.x);
        let y = self.loc.y.min(other.loc.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(Point { x, y }, Size::from((right - x, bottom - y)))
    }

    /// Shrinks the rectangle by the given amount on the left/right and top/bottom edges.
    pub fn inset(self, x: i32, y: i32) -> Self {
        Self::new(
            Point::from((self.loc.x + x, self.loc.y + y)),
            Size::from((self.size.w - 2 * x, self.size.h - 2 * y)),
        )
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {}x{}",
            self.loc.x, self.loc.y, self.size.w, self.size.h
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let rect = Rectangle::new(Point::from((10, 10)), Size::from((100, 50)));
        assert!(rect.contains((10, 10)));
        assert!(rect.contains((109, 59)));
        assert!(!rect.contains((110, 20)));
        assert!(!rect.contains((20, 60)));
        assert!(!rect.contains((9, 20)));
    }

    #[test]
    fn merge_covers_both() {
        let a = Rectangle::new(Point::from((0, 0)), Size::from((100, 100)));
        let b = Rectangle::new(Point::from((150, 50)), Size::from((50, 100)));
        assert_eq!(
            a.merge(b),
            Rectangle::new(Point::from((0, 0)), Size::from((200, 150)))
        );
    }

    #[test]
    fn inset_shrinks_every_edge() {
        let rect = Rectangle::from_size(Size::from((1280, 720)));
        assert_eq!(
            rect.inset(10, 5),
            Rectangle::new(Point::from((10, 5)), Size::from((1260, 710)))
        );
    }
}
