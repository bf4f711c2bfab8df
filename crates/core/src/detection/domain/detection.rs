/// Axis-aligned face bounding box reported by a detector, in working
/// resolution pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Detection {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Detection {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box center using integer division (truncates toward zero). Saturates
    /// at the `i32` range.
    pub fn center(&self) -> (i32, i32) {
        (
            self.x.saturating_add(self.width / 2),
            self.y.saturating_add(self.height / 2),
        )
    }
}
