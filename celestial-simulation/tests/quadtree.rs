use celestial_simulation::{
    Body, BoundingBox, Centroid, ForceLaw, Node, Parameters, Quadtree, Simulation, StepMode, Theta,
};
use nalgebra::{Point2, Vector2};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

fn bounds() -> BoundingBox {
    BoundingBox::new(0.0, 0.0, 4.0, 4.0).unwrap()
}

fn build(points: &[(f64, Point2<f64>)]) -> Quadtree {
    let mut tree = Quadtree::new(bounds(), ForceLaw::new(1.0)).unwrap();
    for &(mass, position) in points {
        tree.insert(mass, position).unwrap();
    }
    tree
}

const A: (f64, [f64; 2]) = (1.0, [1.5, 2.5]);
const B: (f64, [f64; 2]) = (1.0, [2.1, 2.1]);
const C: (f64, [f64; 2]) = (2.0, [1.0, 1.0]);
const D: (f64, [f64; 2]) = (1.0, [2.6, 2.8]);

fn body((mass, [x, y]): (f64, [f64; 2])) -> (f64, Point2<f64>) {
    (mass, Point2::new(x, y))
}

fn leaf(b: (f64, [f64; 2])) -> Node {
    let (mass, position) = body(b);
    Node::leaf(mass, position)
}

fn centroid(bodies: &[(f64, [f64; 2])]) -> Centroid {
    bodies
        .iter()
        .map(|&b| {
            let (mass, position) = body(b);
            Centroid::new(mass, position)
        })
        .fold(Centroid::zero(), |acc, c| acc.combine(&c))
}

#[test]
fn empty_tree() {
    let tree = build(&[]);
    assert!(tree.root().is_empty());
    assert_eq!(tree.mass(), 0.0);
}

#[test]
fn single_leaf() {
    let tree = build(&[body(A)]);
    assert_eq!(*tree.root(), leaf(A));
}

#[test]
fn two_bodies_split_into_lower_quadrants() {
    let tree = build(&[body(A), body(B)]);
    let expected = Node::internal(centroid(&[A, B]), [Node::Empty, Node::Empty, leaf(A), leaf(B)]);
    assert_eq!(*tree.root(), expected);
}

#[test]
fn third_body_fills_upper_left() {
    let tree = build(&[body(A), body(B), body(C)]);
    let expected = Node::internal(centroid(&[A, B, C]), [leaf(C), Node::Empty, leaf(A), leaf(B)]);
    assert_eq!(*tree.root(), expected);
}

#[test]
fn close_bodies_descend_two_levels() {
    let tree = build(&[body(A), body(B), body(C), body(D)]);

    let bd = centroid(&[B, D]);
    let expected = Node::internal(
        centroid(&[A, B, C, D]),
        [
            leaf(C),
            Node::Empty,
            leaf(A),
            Node::internal(
                bd,
                [
                    Node::internal(bd, [leaf(B), Node::Empty, Node::Empty, leaf(D)]),
                    Node::Empty,
                    Node::Empty,
                    Node::Empty,
                ],
            ),
        ],
    );
    assert_eq!(*tree.root(), expected);
    assert_eq!(tree.root().depth(), 3);
}

#[test]
fn trees_with_different_shapes_differ() {
    let three = build(&[body(A), body(B), body(C)]);
    let four = build(&[body(A), body(B), body(C), body(D)]);
    assert!(three != four);

    // same total mass and centroid, but one is a single leaf
    let merged = build(&[body(A), body(A)]);
    let split = build(&[(1.0, Point2::new(1.4, 2.5)), (1.0, Point2::new(1.6, 2.5))]);
    assert!(merged.root().is_leaf());
    assert!(merged.centroid().approx_eq(&split.centroid()));
    assert!(merged != split);
}

#[test]
fn insertion_order_only_changes_intermediate_values() {
    let orders = [[A, B, C, D], [D, C, B, A], [C, A, D, B], [B, D, A, C]];
    let reference = build(&orders[0].map(body));

    for order in &orders[1..] {
        let tree = build(&(*order).map(body));
        assert_eq!(tree, reference);
        assert_eq!(tree.mass(), 5.0);
        assert!(tree.centroid().approx_eq(&Centroid::new(5.0, Point2::new(1.64, 1.88))));
    }
}

#[test]
fn lookup_round_trip() {
    let tree = build(&[body(A), body(B), body(C), body(D)]);
    for b in [A, B, C, D] {
        assert!(tree.lookup(&body(b).1).unwrap());
    }
    assert!(!tree.lookup(&Point2::new(2.6, 2.1)).unwrap());
    assert!(!tree.lookup(&Point2::new(0.5, 3.5)).unwrap());
}

#[test]
fn large_threshold_matches_analytic_force() {
    let mut tree = Quadtree::new(BoundingBox::centered(10.0).unwrap(), ForceLaw::new(1.0)).unwrap();
    tree.insert(1.0, Point2::new(0.0, 0.0)).unwrap();
    tree.insert(2.0, Point2::new(3.0, 0.0)).unwrap();
    tree.insert(3.0, Point2::new(0.0, 4.0)).unwrap();

    let force = tree.evaluate_force(&Point2::origin(), f64::MAX).unwrap();
    let expected = Vector2::new(2.0 / 9.0, 3.0 / 16.0);
    assert!((force - expected).norm() < 1e-12, "{:?}", force);
}

fn random_bodies(n: usize, seed: u64) -> Vec<Body> {
    let mut rng = XorShiftRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Body::new(
                rng.gen_range(0.5..5.0),
                Point2::new(rng.gen_range(-90.0..90.0), rng.gen_range(-90.0..90.0)),
                Vector2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)),
            )
        })
        .collect()
}

fn random_simulation(threshold: f64) -> Simulation {
    let parameters = Parameters {
        gravity: 1.0,
        threshold,
        bounds: BoundingBox::centered(100.0).unwrap(),
    };
    Simulation::new(random_bodies(300, 7), parameters).unwrap()
}

#[test]
fn tree_converges_to_exact_sum() {
    let sim = random_simulation(f64::MAX);
    let exact = sim.exact_accelerations();
    let approx = sim.approximate_accelerations().unwrap();

    for (e, a) in exact.iter().zip(&approx) {
        assert!((e - a).norm() <= 1e-9 * e.norm().max(1e-12), "{:?} vs {:?}", e, a);
    }

    let tree = sim.build_tree().unwrap();
    for (body, e) in sim.bodies().iter().zip(&exact) {
        let a = tree.evaluate_force_with(body.position(), &Theta(0.0)).unwrap();
        assert!((e - a).norm() <= 1e-9 * e.norm().max(1e-12));
    }
}

#[test]
fn theta_criterion_stays_close() {
    let sim = random_simulation(f64::MAX);
    let tree = sim.build_tree().unwrap();
    let exact = sim.exact_accelerations();

    let (error, total) = sim
        .bodies()
        .iter()
        .zip(&exact)
        .map(|(body, e)| {
            let a = tree.evaluate_force_with(body.position(), &Theta(0.5)).unwrap();
            ((e - a).norm(), e.norm())
        })
        .fold((0.0, 0.0), |(err, tot), (e, t)| (err + e, tot + t));

    assert!(error / total < 0.05, "relative error {}", error / total);
}

#[test]
fn tree_mass_is_total_mass() {
    let sim = random_simulation(1.0);
    let tree = sim.build_tree().unwrap();
    assert!((tree.mass() - sim.total_mass()).abs() < 1e-9);
    assert_eq!(tree.root().leaf_count(), sim.len());
    for body in sim.bodies() {
        assert!(tree.lookup(body.position()).unwrap());
    }
}

#[test]
fn exact_and_tree_steps_agree() {
    let mut exact = random_simulation(f64::MAX);
    let mut approx = random_simulation(f64::MAX);

    exact.step(0.01, StepMode::Exact).unwrap();
    approx.step(0.01, StepMode::Approximate).unwrap();

    for (e, a) in exact.bodies().iter().zip(approx.bodies()) {
        assert!((e.position() - a.position()).norm() < 1e-9);
        assert!((e.velocity() - a.velocity()).norm() < 1e-9);
        assert_eq!(e.mass(), a.mass());
    }
}

#[test]
fn coincident_bodies_stay_finite() {
    let parameters = Parameters {
        gravity: 1.0,
        threshold: 0.5,
        bounds: BoundingBox::centered(10.0).unwrap(),
    };
    let mut sim = Simulation::new(
        [
            Body::new(1.0, Point2::new(1.0, 1.0), Vector2::zeros()),
            Body::new(2.0, Point2::new(1.0, 1.0), Vector2::zeros()),
            Body::new(1.0, Point2::new(-3.0, 2.0), Vector2::zeros()),
        ],
        parameters,
    )
    .unwrap();

    let exact = sim.exact_accelerations();
    let approx = sim.approximate_accelerations().unwrap();
    assert_eq!(exact[0], exact[1]);
    for (e, a) in exact.iter().zip(&approx) {
        assert!((e - a).norm() < 1e-12);
    }

    sim.step_approximate(0.1).unwrap();
    assert!(sim
        .bodies()
        .iter()
        .all(|b| b.position().iter().chain(b.velocity().iter()).all(|c| c.is_finite())));
}

#[test]
fn bodies_outside_the_universe_keep_exact_forces() {
    let parameters = Parameters {
        gravity: 1.0,
        threshold: f64::MAX,
        bounds: BoundingBox::centered(1.0).unwrap(),
    };
    let mut sim = Simulation::new(
        [
            Body::new(1.0, Point2::new(0.5, 0.5), Vector2::zeros()),
            Body::new(1.0, Point2::new(5.0, 5.0), Vector2::zeros()),
            Body::new(2.0, Point2::new(50.0, 50.0), Vector2::zeros()),
            Body::new(1.0, Point2::new(-30.0, 40.0), Vector2::zeros()),
        ],
        parameters,
    )
    .unwrap();

    let tree = sim.build_tree().unwrap();
    assert_eq!(tree.root().leaf_count(), sim.len());
    for body in sim.bodies() {
        assert!(tree.bounds().contains(body.position()));
        assert!(tree.lookup(body.position()).unwrap());
    }

    let exact = sim.exact_accelerations();
    let approx = sim.approximate_accelerations().unwrap();
    for (e, a) in exact.iter().zip(&approx) {
        assert!((e - a).norm() <= 1e-12 * e.norm(), "{:?} vs {:?}", e, a);
    }

    sim.step_approximate(1.0).unwrap();
    assert!(sim.bodies().iter().all(|b| b.velocity().norm() > 0.0));
}
