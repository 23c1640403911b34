use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Mass-weighted average position of a set of bodies.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Centroid {
    pub position: Point2<f64>,
    pub mass: f64,
}

impl Centroid {
    /// Tolerance used by the approximate equality of centroids and tree nodes.
    pub const EPSILON: f64 = 1e-5;

    pub fn new(mass: f64, position: Point2<f64>) -> Self {
        Self { position, mass }
    }

    /// The empty accumulator. Combining with it is the identity.
    pub fn zero() -> Self {
        Self::new(0.0, Point2::origin())
    }

    /// Merges two centroids into the centroid of their union.
    pub fn combine(&self, other: &Centroid) -> Centroid {
        if other.mass == 0.0 {
            return *self;
        } else if self.mass == 0.0 {
            return *other;
        }

        let mass = self.mass + other.mass;
        let position = Point2::from(
            (self.position.coords * self.mass + other.position.coords * other.mass) / mass,
        );
        Centroid { position, mass }
    }

    pub fn approx_eq(&self, other: &Centroid) -> bool {
        (self.mass - other.mass).abs() < Self::EPSILON
            && nalgebra::distance(&self.position, &other.position) < Self::EPSILON
    }
}

impl Default for Centroid {
    fn default() -> Self {
        Self::zero()
    }
}
