use crate::config::ScenarioConfig;
use celestial_simulation::{Body, ForceLaw};
use clap::ValueEnum;
use nalgebra::{Point2, Vector2};
use rand::Rng;

/// Length scale of the presets, in metres.
pub const DISTANCE: f64 = 4.0e9;
pub const SUN_MASS: f64 = 2.0e30;

const GAUSSIAN_ITERS: usize = 10;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Preset {
    /// The sun and seven planets.
    Solar,
    /// The sun and the four outer planets.
    Planets,
    /// Two randomly populated star systems falling into each other.
    Collision,
    /// A black hole inside a ring of suns, with more suns spelling "waltz".
    Waltz,
}

impl Preset {
    pub fn build<R: Rng>(self, rng: &mut R) -> ScenarioConfig {
        let bodies = match self {
            Preset::Solar => solar_system(),
            Preset::Planets => planets(),
            Preset::Collision => collision(rng, 1000, 300),
            Preset::Waltz => waltz(),
        };
        ScenarioConfig::new(bodies)
    }
}

fn sun() -> Body {
    Body::new(SUN_MASS, Point2::origin(), Vector2::zeros())
}

fn mars() -> Body {
    Body::new(6.42e23, Point2::new(0.0, -227_940_000.0), Vector2::new(600_000.0, 0.0))
}

fn jupiter() -> Body {
    Body::new(1.90e27, Point2::new(778_330_000.0, 0.0), Vector2::new(0.0, 450_000.0))
}

fn saturn() -> Body {
    Body::new(5.69e26, Point2::new(0.0, 1_426_940_000.0), Vector2::new(-300_000.0, 0.0))
}

fn uranus() -> Body {
    Body::new(8.69e26, Point2::new(-2_870_990_000.0, 0.0), Vector2::new(0.0, -200_000.0))
}

pub fn solar_system() -> Vec<Body> {
    vec![
        sun(),
        Body::new(3.30e23, Point2::new(57_910_000.0, 0.0), Vector2::new(9000.0, 9000.0)),
        Body::new(4.87e24, Point2::new(0.0, 108_200_000.0), Vector2::new(-9000.0, 0.0)),
        Body::new(5.98e24, Point2::new(-149_600_000.0, 0.0), Vector2::new(0.0, -9000.0)),
        mars(),
        jupiter(),
        saturn(),
        uranus(),
    ]
}

pub fn planets() -> Vec<Body> {
    vec![sun(), mars(), jupiter(), saturn(), uranus()]
}

// letter grid of the waltz preset
const COLUMN: f64 = 78_200_000.0;
const ROW: f64 = 108_200_000.0;
const BASELINE: f64 = 1_926_940_000.0;
const RING_RADIUS: f64 = 1_483_300_000.0;

/// Resting suns at `(column, row)` cells of the letter grid, starting at
/// `left`.
fn letter(left: f64, cells: &[(f64, f64)]) -> impl Iterator<Item = Body> + '_ {
    cells.iter().map(move |&(column, row)| {
        let position = Point2::new(left + column * COLUMN, row * ROW - BASELINE);
        Body::new(SUN_MASS, position, Vector2::zeros())
    })
}

/// Three quarters of a ring of suns around the black hole, running from
/// the left over the top and round to the bottom, and a tail hanging below.
fn ring() -> impl Iterator<Item = Body> {
    let arc = (0u32..19).map(|k| {
        let angle = std::f64::consts::PI + f64::from(k) * 15f64.to_radians();
        Point2::new(RING_RADIUS * angle.cos(), RING_RADIUS * angle.sin())
    });

    let tip = RING_RADIUS + 1_200_000_000.0;
    let spread = 57_910_000.0;
    let tail = [
        Point2::new(0.0, RING_RADIUS + 300_000_000.0),
        Point2::new(0.0, RING_RADIUS + 600_000_000.0),
        Point2::new(0.0, RING_RADIUS + 900_000_000.0),
        Point2::new(ROW, tip),
        Point2::new(-ROW, tip),
        Point2::new(spread, tip + spread),
        Point2::new(-spread, tip + spread),
        Point2::new(spread, tip - spread),
        Point2::new(-spread, tip - spread),
    ];

    arc.chain(tail)
        .map(|position| Body::new(SUN_MASS, position, Vector2::zeros()))
}

/// A resting black hole of ten solar masses among resting suns.
pub fn waltz() -> Vec<Body> {
    let w = [
        (0.0, 0.0),
        (1.0, 1.0),
        (-1.0, 1.0),
        (2.0, 2.0),
        (-2.0, 2.0),
        (3.0, 1.0),
        (-3.0, 1.0),
        (4.0, 0.0),
        (-4.0, 0.0),
        (5.0, -1.0),
        (-5.0, -1.0),
        (6.0, -2.0),
        (-6.0, -2.0),
        (7.0, -3.0),
        (-7.0, -3.0),
    ];
    let a = [
        (0.0, -3.0),
        (1.0, -2.0),
        (-1.0, -2.0),
        (2.0, -1.0),
        (-2.0, -1.0),
        (3.0, 0.0),
        (-3.0, 0.0),
        (4.0, 1.0),
        (-4.0, 1.0),
        (5.0, 2.0),
        (-5.0, 2.0),
        (-1.5, 0.0),
        (1.5, 0.0),
        (0.0, 0.0),
    ];
    let l = [
        (0.0, -3.0),
        (0.0, -2.0),
        (0.0, -1.0),
        (0.0, 0.0),
        (0.0, 1.0),
        (0.0, 2.0),
        (1.5, 2.0),
        (3.5, 2.0),
        (5.5, 2.0),
    ];
    let t = [
        (0.0, -3.0),
        (2.0, -3.0),
        (4.0, -3.0),
        (6.0, -3.0),
        (8.0, -3.0),
        (4.0, -2.0),
        (4.0, -1.0),
        (4.0, 0.0),
        (4.0, 1.0),
        (4.0, 2.0),
    ];
    let z = [
        (0.0, -3.0),
        (2.0, -3.0),
        (4.0, -3.0),
        (6.0, -3.0),
        (8.0, -3.0),
        (7.0, -2.0),
        (5.0, -1.0),
        (3.0, 0.0),
        (1.0, 1.0),
        (0.0, 2.0),
        (2.0, 2.0),
        (4.0, 2.0),
        (6.0, 2.0),
        (8.0, 2.0),
    ];

    std::iter::once(Body::new(10.0 * SUN_MASS, Point2::origin(), Vector2::zeros()))
        .chain(letter(-2_026_940_000.0, &w))
        .chain(letter(-826_940_000.0, &a))
        .chain(letter(0.0, &l))
        .chain(letter(726_940_000.0, &t))
        .chain(letter(1_726_940_000.0, &z))
        .chain(ring())
        .collect()
}

/// Roughly normal sample of width `d` centered on zero: the mean of a few
/// uniform draws.
fn sample_gaussian<R: Rng>(rng: &mut R, d: f64) -> f64 {
    let k = d / GAUSSIAN_ITERS as f64;
    let sum: f64 = (0..GAUSSIAN_ITERS).map(|_| rng.gen::<f64>() * k).sum();
    sum - d / 2.0
}

/// Speed that puts `m2` on a circular orbit of radius `r` around `m1`.
fn orbital_speed(m1: f64, m2: f64, r: f64) -> f64 {
    (m2 * m2 * ForceLaw::NEWTON / ((m1 + m2) * r)).sqrt()
}

/// Unit tangent of the circle around the origin through `(x, y)`.
fn tangent(x: f64, y: f64) -> Vector2<f64> {
    let theta = x.atan2(y);
    Vector2::new(-theta.cos(), theta.sin())
}

/// A star at the origin surrounded by `n` bodies on circular orbits.
fn star_system<R: Rng>(rng: &mut R, star_mass: f64, n: usize) -> Vec<Body> {
    std::iter::once(Body::new(star_mass, Point2::origin(), Vector2::zeros()))
        .chain((0..n).map(|_| {
            // (0, 1000] so no body ends up massless
            let mass = (1.0 - rng.gen::<f64>()) * 1000.0 * 1e13;
            let x = sample_gaussian(rng, 2.0 * DISTANCE);
            let y = sample_gaussian(rng, 2.0 * DISTANCE);
            let r = Vector2::new(x, y).norm();

            Body::new(mass, Point2::new(x, y), tangent(x, y) * orbital_speed(mass, star_mass, r))
        }))
        .collect()
}

pub fn collision<R: Rng>(rng: &mut R, sun_bodies: usize, star_bodies: usize) -> Vec<Body> {
    let star_mass = SUN_MASS * 0.1;
    let mut first = star_system(rng, SUN_MASS, sun_bodies);
    let mut second = star_system(rng, star_mass, star_bodies);

    let offset_first = Vector2::new(DISTANCE / 4.0, 0.0);
    let offset_second = Vector2::new(-DISTANCE / 4.0, -DISTANCE / 4.0);
    let diff = offset_first - offset_second;
    let drift = tangent(diff.x, diff.y) * orbital_speed(star_mass, SUN_MASS, diff.norm()) * 0.9;

    first.iter_mut().for_each(|body| body.displace(&offset_first));
    second.iter_mut().for_each(|body| {
        body.displace(&offset_second);
        body.add_velocity(&drift);
    });

    first.into_iter().chain(second).collect()
}
