/// A position in the raster image's own pixel/unit system, independent of
/// the rendering surface's current pan/zoom.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Minimum vertex count for a valid region (open ring, not explicitly closed).
pub const REGION_MIN_VERTICES: usize = 3;

/// Minimum vertex count for a valid line.
pub const LINE_MIN_VERTICES: usize = 2;
