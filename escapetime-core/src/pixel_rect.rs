use serde::{Deserialize, Serialize};

/// Rectangle in pixel space (always u32 coordinates)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole screen.
    pub fn screen(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Last column inside the rectangle. Meaningless for empty rectangles.
    pub fn right(&self) -> u32 {
        self.x + self.width - 1
    }

    /// Last row inside the rectangle. Meaningless for empty rectangles.
    pub fn bottom(&self) -> u32 {
        self.y + self.height - 1
    }

    /// Uses half-open interval: [x, x+width) × [y, y+height)
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    /// True when `other` lies entirely inside `self`.
    pub fn encloses(&self, other: &PixelRect) -> bool {
        other.is_empty()
            || (self.contains(other.x, other.y) && self.contains(other.right(), other.bottom()))
    }
}
