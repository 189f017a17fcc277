//! Geographic coordinate type shared by the geometry model.

/// One position decoded from a coordinate row.
///
/// `x` is longitude and `y` latitude, both already divided by the dataset's
/// coordinate multiplication factor. Sounding rows additionally carry a
/// depth, divided by the 3-D multiplication factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub depth: Option<f64>,
}

impl Coordinate {
    /// Create a 2-D coordinate.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, depth: None }
    }

    /// Create a 3-D (sounding) coordinate.
    pub const fn with_depth(x: f64, y: f64, depth: f64) -> Self {
        Self {
            x,
            y,
            depth: Some(depth),
        }
    }

    /// Whether this coordinate carries a depth component.
    pub fn is_3d(&self) -> bool {
        self.depth.is_some()
    }

    /// The WKT coordinate pair, e.g. `0.2 0.8`.
    ///
    /// Depth is not part of the pair; WKT output is always 2-D.
    pub fn wkt_pair(&self) -> String {
        format!("{} {}", self.x, self.y)
    }
}
