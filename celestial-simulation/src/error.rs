use thiserror::Error;

/// Failures raised while building or querying a quadtree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("point ({x}, {y}) is not finite")]
    NonFinitePoint { x: f64, y: f64 },

    #[error("mass {0} must be finite and non-negative")]
    InvalidMass(f64),

    #[error("invalid bounding box ({min_x}, {min_y}) - ({max_x}, {max_y})")]
    InvalidBounds {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    /// The quadrant classification produced bits that name no quadrant.
    #[error("quadrant bits {0:#04b} do not name a quadrant")]
    InvalidQuadrant(u8),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("body {index} has invalid mass {mass}")]
    InvalidMass { index: usize, mass: f64 },

    #[error("body {index} has a non-finite position or velocity")]
    NonFiniteState { index: usize },

    #[error("gravitational constant {0} must be finite")]
    InvalidGravity(f64),

    #[error("threshold {0} must be a non-negative distance")]
    InvalidThreshold(f64),

    #[error("time step {0} must be finite and positive")]
    InvalidTimeStep(f64),

    #[error("unknown step mode `{0}`, expected `exact` or `approximate`")]
    UnknownStepMode(String),

    #[error(transparent)]
    Tree(#[from] TreeError),
}
