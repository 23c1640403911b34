use log::{debug, trace, warn};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod centroid;
pub mod error;
pub mod geometry;
pub mod physics;
pub mod tree;

pub use centroid::Centroid;
pub use error::{SimulationError, TreeError};
pub use geometry::{BoundingBox, Quadrant};
pub use physics::ForceLaw;
pub use tree::{DistanceThreshold, Node, OpeningCriterion, Quadtree, Theta};

/// A point mass moving through the universe: a star, planet, asteroid...
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    mass: f64,
    position: Point2<f64>,
    velocity: Vector2<f64>,
}

impl Body {
    pub fn new(mass: f64, position: Point2<f64>, velocity: Vector2<f64>) -> Self {
        Self {
            mass,
            position,
            velocity,
        }
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn position(&self) -> &Point2<f64> {
        &self.position
    }

    pub fn velocity(&self) -> &Vector2<f64> {
        &self.velocity
    }

    pub fn centroid(&self) -> Centroid {
        Centroid::new(self.mass, self.position)
    }

    pub fn momentum(&self) -> Vector2<f64> {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }

    /// Advances the body by `dt` under a constant `acceleration`.
    ///
    /// The position is moved with the velocity from before the step, then
    /// the velocity picks up `acceleration * dt`.
    pub fn update(&mut self, dt: f64, acceleration: &Vector2<f64>) {
        self.position += self.velocity * dt + acceleration * (0.5 * dt * dt);
        self.velocity += acceleration * dt;
    }

    pub fn displace(&mut self, offset: &Vector2<f64>) {
        self.position += *offset;
    }

    pub fn add_velocity(&mut self, delta: &Vector2<f64>) {
        self.velocity += *delta;
    }

    fn validate(&self, index: usize) -> Result<(), SimulationError> {
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(SimulationError::InvalidMass {
                index,
                mass: self.mass,
            });
        }

        let finite = self
            .position
            .iter()
            .chain(self.velocity.iter())
            .all(|c| c.is_finite());
        if !finite {
            return Err(SimulationError::NonFiniteState { index });
        }
        Ok(())
    }
}

/// Tunables of a simulation, all supplied by the caller.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Gravitational constant.
    pub gravity: f64,
    /// Distance below which tree nodes are refined rather than approximated.
    pub threshold: f64,
    /// Frame of the whole universe.
    pub bounds: BoundingBox,
}

impl Parameters {
    /// Half the side length of the default universe box, in metres.
    pub const WORLD_EXTENT: f64 = 2.0e13;
    pub const THRESHOLD: f64 = 1.0e6;

    /// Rejects a non-finite gravitational constant, a NaN or negative
    /// threshold and a malformed universe box. An infinite threshold is
    /// fine: it refines every node.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.gravity.is_finite() {
            return Err(SimulationError::InvalidGravity(self.gravity));
        }
        if self.threshold.is_nan() || self.threshold < 0.0 {
            return Err(SimulationError::InvalidThreshold(self.threshold));
        }
        self.bounds.validate()?;
        Ok(())
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            gravity: ForceLaw::NEWTON,
            threshold: Self::THRESHOLD,
            bounds: BoundingBox {
                min_x: -Self::WORLD_EXTENT,
                min_y: -Self::WORLD_EXTENT,
                max_x: Self::WORLD_EXTENT,
                max_y: Self::WORLD_EXTENT,
            },
        }
    }
}

/// How the accelerations of a step are computed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    /// Direct pairwise sum over all bodies.
    Exact,
    /// Barnes-Hut estimate from a quadtree built for the step.
    Approximate,
}

impl FromStr for StepMode {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(StepMode::Exact),
            "approximate" => Ok(StepMode::Approximate),
            other => Err(SimulationError::UnknownStepMode(other.to_string())),
        }
    }
}

impl fmt::Display for StepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepMode::Exact => write!(f, "exact"),
            StepMode::Approximate => write!(f, "approximate"),
        }
    }
}

pub struct Simulation {
    bodies: Vec<Body>,
    parameters: Parameters,
}

impl Simulation {
    pub fn new<I>(bodies: I, parameters: Parameters) -> Result<Self, SimulationError>
    where
        I: IntoIterator<Item = Body>,
    {
        parameters.validate()?;

        let bodies: Vec<Body> = bodies.into_iter().collect();
        for (index, body) in bodies.iter().enumerate() {
            body.validate(index)?;
        }

        Ok(Self { bodies, parameters })
    }

    pub fn add(&mut self, body: Body) -> Result<&mut Self, SimulationError> {
        body.validate(self.bodies.len())?;
        self.bodies.push(body);
        Ok(self)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn force_law(&self) -> ForceLaw {
        ForceLaw::new(self.parameters.gravity)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(Body::mass).sum()
    }

    pub fn total_momentum(&self) -> Vector2<f64> {
        self.bodies.iter().map(Body::momentum).sum()
    }

    /// Builds a fresh quadtree over the current positions.
    pub fn build_tree(&self) -> Result<Quadtree, TreeError> {
        let mut tree = Quadtree::new(self.parameters.bounds, self.force_law())?;

        let mut outside = 0;
        for body in &self.bodies {
            if !self.parameters.bounds.contains(body.position()) {
                outside += 1;
            }
            tree.insert(body.mass, body.position)?;
        }

        if outside > 0 {
            warn!(
                "{} of {} bodies lie outside the universe box, tree box grown to {:?}",
                outside,
                self.bodies.len(),
                tree.bounds()
            );
        }
        debug!(
            "built quadtree over {} bodies, depth {}",
            self.bodies.len(),
            tree.root().depth()
        );
        Ok(tree)
    }

    /// Pairwise accelerations. A body never contributes to its own.
    pub fn exact_accelerations(&self) -> Vec<Vector2<f64>> {
        let law = self.force_law();

        self.bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                self.bodies
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, other)| {
                        law.acceleration_on(&body.position, other.mass, &other.position)
                    })
                    .sum::<Vector2<f64>>()
            })
            .collect()
    }

    /// Tree accelerations, refined within `Parameters::threshold`.
    pub fn approximate_accelerations(&self) -> Result<Vec<Vector2<f64>>, TreeError> {
        let tree = self.build_tree()?;

        self.bodies
            .iter()
            .map(|body| tree.evaluate_force(&body.position, self.parameters.threshold))
            .collect()
    }

    pub fn step(&mut self, dt: f64, mode: StepMode) -> Result<(), SimulationError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimulationError::InvalidTimeStep(dt));
        }
        debug!("{} step of {} bodies, dt = {}", mode, self.bodies.len(), dt);

        // every acceleration is taken from the same snapshot of positions
        // before any body moves
        let accelerations = match mode {
            StepMode::Exact => self.exact_accelerations(),
            StepMode::Approximate => self.approximate_accelerations()?,
        };

        for (body, acceleration) in self.bodies.iter_mut().zip(&accelerations) {
            trace!("acceleration {:?} on body at {:?}", acceleration, body.position);
            body.update(dt, acceleration);
        }
        Ok(())
    }

    pub fn step_exact(&mut self, dt: f64) -> Result<(), SimulationError> {
        self.step(dt, StepMode::Exact)
    }

    pub fn step_approximate(&mut self, dt: f64) -> Result<(), SimulationError> {
        self.step(dt, StepMode::Approximate)
    }
}
