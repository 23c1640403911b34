//! Scenario files.
//!
//! A scenario is a YAML document holding the initial bodies and, optionally,
//! the parameters to run them with:
//!
//! ```yaml
//! mode: approximate        # or "exact"
//! dt: 3600.0
//! steps: 500
//! parameters:
//!   gravity: 6.674e-11
//!   threshold: 1.0e6
//!   bounds: { min_x: -2.0e13, min_y: -2.0e13, max_x: 2.0e13, max_y: 2.0e13 }
//! bodies:
//!   - mass: 2.0e30
//!     position: [0.0, 0.0]
//!     velocity: [0.0, 0.0]
//!   - mass: 5.98e24
//!     position: [-1.496e8, 0.0]
//!     velocity: [0.0, -9000.0]
//! ```
//!
//! Everything but `bodies` falls back to a default.

use anyhow::{Context, Result};
use celestial_simulation::{Body, Parameters, StepMode};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default = "ScenarioConfig::default_mode")]
    pub mode: StepMode,
    #[serde(default = "ScenarioConfig::default_dt")]
    pub dt: f64,
    #[serde(default = "ScenarioConfig::default_steps")]
    pub steps: usize,
    pub bodies: Vec<Body>,
}

impl ScenarioConfig {
    /// One hour, in seconds.
    pub const DT: f64 = 3600.0;
    pub const STEPS: usize = 1000;

    pub fn new(bodies: Vec<Body>) -> Self {
        Self {
            parameters: Parameters::default(),
            mode: Self::default_mode(),
            dt: Self::DT,
            steps: Self::STEPS,
            bodies,
        }
    }

    fn default_mode() -> StepMode {
        StepMode::Approximate
    }

    fn default_dt() -> f64 {
        Self::DT
    }

    fn default_steps() -> usize {
        Self::STEPS
    }
}

pub fn parse(yaml: &str) -> Result<ScenarioConfig> {
    serde_yaml::from_str(yaml).context("malformed scenario")
}

pub fn load(path: &Path) -> Result<ScenarioConfig> {
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse(&yaml).with_context(|| format!("in {}", path.display()))
}
