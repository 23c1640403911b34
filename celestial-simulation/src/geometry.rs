use crate::error::TreeError;
use nalgebra::Point2;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

/// represents one quadrant of a bounding box.
/// The corresponding u8 value is the index of the quadrant in a node's child list.
/// The bits of this value represent its coordinates with the constants
/// `Quadrant::X` and `Quadrant::Y` as bitmasks. The y axis grows downwards,
/// so "upper" is the half with the smaller y values.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, TryFromPrimitive)]
pub enum Quadrant {
    UpperLeft = 0b00,
    UpperRight = 0b01,
    LowerLeft = 0b10,
    LowerRight = 0b11,
}

impl Quadrant {
    pub const X: u8 = 0b01;
    pub const Y: u8 = 0b10;

    /// All quadrants in child-list order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::UpperLeft,
        Quadrant::UpperRight,
        Quadrant::LowerLeft,
        Quadrant::LowerRight,
    ];

    /// Returns the quadrant of `bounds` the given point falls into.
    ///
    /// Points on the center lines belong to the right / lower half, so the
    /// center itself always resolves to `LowerRight`. Points outside of
    /// `bounds` are classified by the same comparisons, which puts them in
    /// the quadrant nearest to them.
    pub fn of(point: &Point2<f64>, bounds: &BoundingBox) -> Result<Self, TreeError> {
        let center = bounds.center();
        let bits_x = (point.x >= center.x) as u8 * Self::X;
        let bits_y = (point.y >= center.y) as u8 * Self::Y;

        Self::try_from(bits_x | bits_y).map_err(|err| TreeError::InvalidQuadrant(err.number))
    }

    pub fn is_right(&self) -> bool {
        *self as u8 & Self::X > 0
    }

    pub fn is_lower(&self) -> bool {
        *self as u8 & Self::Y > 0
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// An axis-aligned rectangle, used as the frame of the whole universe
/// and, halved on every level, as the frame of each subtree.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self, TreeError> {
        let bounds = Self {
            min_x,
            min_y,
            max_x,
            max_y,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// A square of side `2 * half_extent` centered on the origin.
    pub fn centered(half_extent: f64) -> Result<Self, TreeError> {
        Self::new(-half_extent, -half_extent, half_extent, half_extent)
    }

    /// Checks that all coordinates are finite and that the box has a
    /// positive extent on both axes.
    pub fn validate(&self) -> Result<(), TreeError> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|c| c.is_finite());

        if finite && self.min_x < self.max_x && self.min_y < self.max_y {
            Ok(())
        } else {
            Err(TreeError::InvalidBounds {
                min_x: self.min_x,
                min_y: self.min_y,
                max_x: self.max_x,
                max_y: self.max_y,
            })
        }
    }

    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            0.5 * (self.min_x + self.max_x),
            0.5 * (self.min_y + self.max_y),
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Edges are part of the box.
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    pub fn quadrant_of(&self, point: &Point2<f64>) -> Result<Quadrant, TreeError> {
        Quadrant::of(point, self)
    }

    /// Returns the quarter of this box covered by `quadrant`.
    pub fn sub_box(&self, quadrant: Quadrant) -> Self {
        let center = self.center();
        let (min_x, max_x) = if quadrant.is_right() {
            (center.x, self.max_x)
        } else {
            (self.min_x, center.x)
        };
        let (min_y, max_y) = if quadrant.is_lower() {
            (center.y, self.max_y)
        } else {
            (self.min_y, center.y)
        };

        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Doubles the box around its center until it contains `point`.
    ///
    /// Fails with `InvalidBounds` if the box overflows before reaching the
    /// point.
    pub fn grown_to(&self, point: &Point2<f64>) -> Result<Self, TreeError> {
        let center = self.center();
        let mut half_width = 0.5 * self.width();
        let mut half_height = 0.5 * self.height();
        let mut grown = *self;

        while !grown.contains(point) {
            half_width *= 2.0;
            half_height *= 2.0;
            grown = Self {
                min_x: center.x - half_width,
                min_y: center.y - half_height,
                max_x: center.x + half_width,
                max_y: center.y + half_height,
            };
            grown.validate()?;
        }
        Ok(grown)
    }

    /// Whether halving the box still produces smaller boxes on both axes.
    /// Fails once the box is down to floating point resolution.
    pub fn can_subdivide(&self) -> bool {
        let center = self.center();
        center.x > self.min_x
            && center.x < self.max_x
            && center.y > self.min_y
            && center.y < self.max_y
    }
}
