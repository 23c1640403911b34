use crate::centroid::Centroid;
use crate::error::TreeError;
use crate::geometry::{BoundingBox, Quadrant};
use crate::physics::ForceLaw;
use log::{debug, warn};
use nalgebra::{Point2, Vector2};

/// Decides whether an internal node has to be refined into its children
/// or may be approximated by its centroid.
pub trait OpeningCriterion {
    fn should_refine(
        &self,
        centroid: &Centroid,
        query: &Point2<f64>,
        bounds: &BoundingBox,
    ) -> bool;
}

/// Refines every node whose centroid is closer to the query point than a
/// fixed distance, and every node whose box contains the query point.
///
/// This is an absolute distance, not the usual size / distance ratio, so a
/// value tuned for one universe size does not carry over to another.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DistanceThreshold(pub f64);

impl OpeningCriterion for DistanceThreshold {
    fn should_refine(
        &self,
        centroid: &Centroid,
        query: &Point2<f64>,
        bounds: &BoundingBox,
    ) -> bool {
        nalgebra::distance(&centroid.position, query) < self.0 || bounds.contains(query)
    }
}

/// The classic Barnes-Hut criterion: refine while `size / distance >= theta`.
/// A node whose box contains the query point is always refined.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Theta(pub f64);

impl OpeningCriterion for Theta {
    fn should_refine(
        &self,
        centroid: &Centroid,
        query: &Point2<f64>,
        bounds: &BoundingBox,
    ) -> bool {
        if bounds.contains(query) {
            return true;
        }
        let dist = nalgebra::distance(&centroid.position, query);
        bounds.width().max(bounds.height()) >= self.0 * dist
    }
}

/// One node of the quadtree.
///
/// Nodes do not store their own bounding box; every operation is handed the
/// box of the node it is called on and derives the child boxes from it.
#[derive(Clone, Debug, Default)]
pub enum Node {
    #[default]
    Empty,
    Leaf {
        mass: f64,
        position: Point2<f64>,
    },
    /// Children are ordered upper left, upper right, lower left, lower right.
    Internal {
        centroid: Centroid,
        children: Box<[Node; 4]>,
    },
}

impl Node {
    /// Below this depth two distinct points are merged into one leaf instead
    /// of splitting further. Only reached by points closer together than the
    /// box can resolve. `Quadtree` grows its box to fit every point, so
    /// points outside the box only get here through `Node::insert`.
    pub const MAX_DEPTH: usize = 128;

    pub fn leaf(mass: f64, position: Point2<f64>) -> Self {
        Node::Leaf { mass, position }
    }

    pub fn internal(centroid: Centroid, children: [Node; 4]) -> Self {
        Node::Internal {
            centroid,
            children: Box::new(children),
        }
    }

    /// Inserts a mass point into the subtree framed by `bounds` and returns
    /// the resulting subtree.
    pub fn insert(
        self,
        mass: f64,
        position: Point2<f64>,
        bounds: &BoundingBox,
    ) -> Result<Node, TreeError> {
        self.insert_at(mass, position, bounds, 0)
    }

    fn insert_at(
        self,
        mass: f64,
        position: Point2<f64>,
        bounds: &BoundingBox,
        depth: usize,
    ) -> Result<Node, TreeError> {
        match self {
            Node::Empty => Ok(Node::leaf(mass, position)),
            Node::Leaf {
                mass: leaf_mass,
                position: leaf_position,
            } if leaf_position == position => Ok(Node::leaf(leaf_mass + mass, position)),
            Node::Leaf {
                mass: leaf_mass,
                position: leaf_position,
            } => {
                if depth >= Self::MAX_DEPTH || !bounds.can_subdivide() {
                    let merged = Centroid::new(leaf_mass, leaf_position)
                        .combine(&Centroid::new(mass, position));
                    warn!(
                        "merging bodies at {:?} and {:?}: box {:?} at depth {} is unsplittable",
                        leaf_position, position, bounds, depth
                    );
                    return Ok(Node::leaf(merged.mass, merged.position));
                }

                Node::internal(Centroid::zero(), Default::default())
                    .insert_at(leaf_mass, leaf_position, bounds, depth)?
                    .insert_at(mass, position, bounds, depth)
            }
            Node::Internal {
                centroid,
                mut children,
            } => {
                let quadrant = bounds.quadrant_of(&position)?;
                let child = &mut children[quadrant.index()];
                *child = std::mem::take(child).insert_at(
                    mass,
                    position,
                    &bounds.sub_box(quadrant),
                    depth + 1,
                )?;

                Ok(Node::Internal {
                    centroid: centroid.combine(&Centroid::new(mass, position)),
                    children,
                })
            }
        }
    }

    /// Whether a mass point was inserted at exactly `point`.
    pub fn lookup(&self, point: &Point2<f64>, bounds: &BoundingBox) -> Result<bool, TreeError> {
        match self {
            Node::Empty => Ok(false),
            Node::Leaf { position, .. } => Ok(position == point),
            Node::Internal { children, .. } => {
                let quadrant = bounds.quadrant_of(point)?;
                children[quadrant.index()].lookup(point, &bounds.sub_box(quadrant))
            }
        }
    }

    /// Acceleration at `point` caused by this subtree, refining nodes closer
    /// than `threshold`.
    pub fn evaluate_force(
        &self,
        point: &Point2<f64>,
        bounds: &BoundingBox,
        threshold: f64,
        law: &ForceLaw,
    ) -> Vector2<f64> {
        self.evaluate_force_with(point, bounds, &DistanceThreshold(threshold), law)
    }

    pub fn evaluate_force_with<C>(
        &self,
        point: &Point2<f64>,
        bounds: &BoundingBox,
        criterion: &C,
        law: &ForceLaw,
    ) -> Vector2<f64>
    where
        C: OpeningCriterion + ?Sized,
    {
        match self {
            Node::Empty => Vector2::zeros(),
            Node::Leaf { mass, position } => law.acceleration_on(point, *mass, position),
            Node::Internal { centroid, children } => {
                if criterion.should_refine(centroid, point, bounds) {
                    Quadrant::ALL
                        .iter()
                        .zip(children.iter())
                        .map(|(&quadrant, child)| {
                            child.evaluate_force_with(
                                point,
                                &bounds.sub_box(quadrant),
                                criterion,
                                law,
                            )
                        })
                        .sum()
                } else {
                    law.acceleration_on(point, centroid.mass, &centroid.position)
                }
            }
        }
    }

    /// The aggregate of everything inserted below this node.
    pub fn centroid(&self) -> Centroid {
        match self {
            Node::Empty => Centroid::zero(),
            Node::Leaf { mass, position } => Centroid::new(*mass, *position),
            Node::Internal { centroid, .. } => *centroid,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Empty => 0,
            Node::Leaf { .. } => 1,
            Node::Internal { children, .. } => children.iter().map(Node::leaf_count).sum(),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Node::Empty | Node::Leaf { .. } => 0,
            Node::Internal { children, .. } => {
                1 + children.iter().map(Node::depth).max().unwrap_or(0)
            }
        }
    }

    fn collect_leaves(&self, leaves: &mut Vec<Centroid>) {
        match self {
            Node::Empty => {}
            Node::Leaf { mass, position } => leaves.push(Centroid::new(*mass, *position)),
            Node::Internal { children, .. } => {
                children.iter().for_each(|child| child.collect_leaves(leaves))
            }
        }
    }

    /// Structural equality up to `Centroid::EPSILON` on masses and positions.
    /// Meant for checking tree shapes, never for steering insertion or force
    /// evaluation.
    pub fn approx_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Empty, Node::Empty) => true,
            (
                Node::Leaf { mass, position },
                Node::Leaf {
                    mass: other_mass,
                    position: other_position,
                },
            ) => Centroid::new(*mass, *position)
                .approx_eq(&Centroid::new(*other_mass, *other_position)),
            (
                Node::Internal { centroid, children },
                Node::Internal {
                    centroid: other_centroid,
                    children: other_children,
                },
            ) => {
                centroid.approx_eq(other_centroid)
                    && children
                        .iter()
                        .zip(other_children.iter())
                        .all(|(a, b)| a.approx_eq(b))
            }
            _ => false,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq(other)
    }
}

/// Owns the root node and the bounding box of the whole universe.
///
/// The box starts out as the one given to `new` and is grown whenever a
/// point outside of it is inserted, so every node's box contains every
/// point below it.
#[derive(Clone, Debug)]
pub struct Quadtree {
    root: Node,
    bounds: BoundingBox,
    law: ForceLaw,
}

impl Quadtree {
    pub fn new(bounds: BoundingBox, law: ForceLaw) -> Result<Self, TreeError> {
        bounds.validate()?;
        Ok(Self {
            root: Node::Empty,
            bounds,
            law,
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The current frame of the root, which may have grown past the box
    /// given to `new`.
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn force_law(&self) -> &ForceLaw {
        &self.law
    }

    /// Inserts a mass point, replacing the root with the grown tree.
    ///
    /// A point outside the current box first doubles the box around its
    /// center until the point fits, and the tree is rebuilt in the new box.
    ///
    /// The point, the mass and the grown box are all checked before the
    /// tree is touched, so rejected input leaves the tree as it was. Past
    /// those checks the insertion can only fail on an invalid quadrant, and
    /// that leaves the tree empty.
    pub fn insert(&mut self, mass: f64, position: Point2<f64>) -> Result<(), TreeError> {
        check_point(&position)?;
        if !mass.is_finite() || mass < 0.0 {
            return Err(TreeError::InvalidMass(mass));
        }
        if !self.bounds.contains(&position) {
            self.grow_to(&position)?;
        }

        self.root = std::mem::take(&mut self.root).insert(mass, position, &self.bounds)?;
        Ok(())
    }

    fn grow_to(&mut self, point: &Point2<f64>) -> Result<(), TreeError> {
        let bounds = self.bounds.grown_to(point)?;
        debug!(
            "growing quadtree box from {:?} to {:?} to fit {:?}",
            self.bounds, bounds, point
        );

        let mut leaves = Vec::new();
        self.root.collect_leaves(&mut leaves);
        let root = leaves.into_iter().try_fold(Node::Empty, |root, leaf| {
            root.insert(leaf.mass, leaf.position, &bounds)
        })?;

        self.root = root;
        self.bounds = bounds;
        Ok(())
    }

    pub fn lookup(&self, point: &Point2<f64>) -> Result<bool, TreeError> {
        check_point(point)?;
        self.root.lookup(point, &self.bounds)
    }

    /// Acceleration at `point` using the fixed distance refinement rule.
    pub fn evaluate_force(
        &self,
        point: &Point2<f64>,
        threshold: f64,
    ) -> Result<Vector2<f64>, TreeError> {
        self.evaluate_force_with(point, &DistanceThreshold(threshold))
    }

    pub fn evaluate_force_with<C>(
        &self,
        point: &Point2<f64>,
        criterion: &C,
    ) -> Result<Vector2<f64>, TreeError>
    where
        C: OpeningCriterion + ?Sized,
    {
        check_point(point)?;
        Ok(self
            .root
            .evaluate_force_with(point, &self.bounds, criterion, &self.law))
    }

    pub fn centroid(&self) -> Centroid {
        self.root.centroid()
    }

    pub fn mass(&self) -> f64 {
        self.root.centroid().mass
    }
}

impl PartialEq for Quadtree {
    fn eq(&self, other: &Self) -> bool {
        self.root.approx_eq(&other.root)
    }
}

fn check_point(point: &Point2<f64>) -> Result<(), TreeError> {
    if point.x.is_finite() && point.y.is_finite() {
        Ok(())
    } else {
        Err(TreeError::NonFinitePoint {
            x: point.x,
            y: point.y,
        })
    }
}
