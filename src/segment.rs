use crate::SweepError;
use bincode::{Decode, Encode};
use std::cmp::Ordering;

/// Encoded size of one segment record (4 x f64, bincode standard config).
pub const SEGMENT_BYTES: u64 = 32;

/// Encoded size of one intersection record (2 x f64).
pub const INTERSECTION_BYTES: u64 = 16;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// An axis-aligned segment stored as the tuple (x1, y1, x2, y2).
///
/// Exactly one of `x1 == x2` (vertical) or `y1 == y2` (horizontal) must hold.
/// Records violating that, including degenerate points where both hold, are
/// rejected as malformed and abort the run.
#[derive(PartialEq, Debug, Clone, Copy, Encode, Decode)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Segment { x1, y1, x2, y2 }
    }

    pub fn vertical(x: f64, y1: f64, y2: f64) -> Self {
        Segment::new(x, y1, x, y2)
    }

    pub fn horizontal(x1: f64, x2: f64, y: f64) -> Self {
        Segment::new(x1, y, x2, y)
    }

    pub fn classify(&self) -> Result<Orientation, SweepError> {
        let x_aligned = self.x1 == self.x2;
        let y_aligned = self.y1 == self.y2;
        match (x_aligned, y_aligned) {
            (true, false) => Ok(Orientation::Vertical),
            (false, true) => Ok(Orientation::Horizontal),
            (true, true) => Err(SweepError::MalformedRecord(format!(
                "degenerate point segment ({}, {})",
                self.x1, self.y1
            ))),
            (false, false) => Err(SweepError::MalformedRecord(format!(
                "segment ({}, {})-({}, {}) is neither vertical nor horizontal",
                self.x1, self.y1, self.x2, self.y2
            ))),
        }
    }

    /// X coordinate of a vertical segment.
    pub fn x(&self) -> f64 {
        self.x1
    }

    /// Y coordinate of a horizontal segment.
    pub fn y(&self) -> f64 {
        self.y1
    }

    pub fn min_x(&self) -> f64 {
        self.x1.min(self.x2)
    }

    pub fn max_x(&self) -> f64 {
        self.x1.max(self.x2)
    }

    pub fn low_y(&self) -> f64 {
        self.y1.min(self.y2)
    }

    pub fn high_y(&self) -> f64 {
        self.y1.max(self.y2)
    }

    /// The y position at which the sweep encounters this segment: a vertical
    /// at its lower endpoint, a horizontal at its y.
    pub fn sweep_position(&self) -> f64 {
        self.low_y()
    }

    /// Total order for the y-ascending stream. At equal sweep position a
    /// vertical sorts before a horizontal, so a horizontal touching a
    /// vertical's endpoint still sees it active.
    pub fn sweep_cmp(&self, other: &Segment) -> Ordering {
        self.sweep_position()
            .total_cmp(&other.sweep_position())
            .then_with(|| self.sweep_rank().cmp(&other.sweep_rank()))
            .then_with(|| self.x1.total_cmp(&other.x1))
            .then_with(|| self.x2.total_cmp(&other.x2))
            .then_with(|| self.y2.total_cmp(&other.y2))
    }

    fn sweep_rank(&self) -> u8 {
        if self.x1 == self.x2 { 0 } else { 1 }
    }
}

/// A reported crossing point, written once to the permanent answer store.
#[derive(PartialEq, Debug, Clone, Copy, Encode, Decode)]
pub struct Intersection {
    pub x: f64,
    pub y: f64,
}
