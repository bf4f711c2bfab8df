/// Rectangle given by two corners, inclusive on every edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneBounds {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl ZoneBounds {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn is_degenerate(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    /// Points on the boundary count as inside.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.x1 <= x && x <= self.x2 && self.y1 <= y && y <= self.y2
    }

    /// Horizontal extent. Widened so any pair of `i32` corners fits.
    pub fn width(&self) -> i64 {
        i64::from(self.x2) - i64::from(self.x1)
    }

    pub fn height(&self) -> i64 {
        i64::from(self.y2) - i64::from(self.y1)
    }

    /// True when the rectangle extends past a `width`x`height` frame.
    pub fn exceeds(&self, width: u32, height: u32) -> bool {
        self.x1 < 0 || self.y1 < 0 || self.x2 > width as i32 || self.y2 > height as i32
    }
}

/// A named region of interest, optionally with the number of people it is
/// meant to hold. Only constructed through
/// [`ZoneRegistry::register`](super::zone_registry::ZoneRegistry::register),
/// which enforces non-degenerate bounds and a non-zero capacity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Zone {
    name: String,
    bounds: ZoneBounds,
    capacity: Option<u32>,
}

impl Zone {
    pub(super) fn new(name: String, bounds: ZoneBounds, capacity: Option<u32>) -> Self {
        Self {
            name,
            bounds,
            capacity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> ZoneBounds {
        self.bounds
    }

    pub fn capacity(&self) -> Option<u32> {
        self.capacity
    }
}
