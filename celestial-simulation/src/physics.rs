use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Newtonian gravity between a point and a point mass.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForceLaw {
    pub gravity: f64,
}

impl ForceLaw {
    /// Gravitational constant in m³ kg⁻¹ s⁻².
    pub const NEWTON: f64 = 6.674e-11;

    pub fn new(gravity: f64) -> Self {
        Self { gravity }
    }

    /// Acceleration at `point` caused by `mass` located at `source`.
    ///
    /// Points toward `source` with magnitude `G * mass / distance²`.
    /// A zero separation yields the zero vector: a body exerts no force
    /// on itself, nor on a body sharing its exact position.
    pub fn acceleration_on(
        &self,
        point: &Point2<f64>,
        mass: f64,
        source: &Point2<f64>,
    ) -> Vector2<f64> {
        let diff = source - point;
        let dist_sq = diff.norm_squared();
        if dist_sq == 0.0 {
            return Vector2::zeros();
        }

        diff * (self.gravity * mass / (dist_sq * dist_sq.sqrt()))
    }
}

impl Default for ForceLaw {
    fn default() -> Self {
        Self::new(Self::NEWTON)
    }
}
