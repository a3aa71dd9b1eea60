use std::ops::{Sub, Mul, Add};
use std::fmt;
use ordered_float::OrderedFloat;

/// A point in two dimensions
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point(euclid::default::Vector2D<ordered_float::OrderedFloat<f64>>);

impl Point {
    /// Constructs a new `Point`.
    pub fn new(x: f64, y: f64) -> Self {
        Point(euclid::Vector2D::new(OrderedFloat::<f64>(x), OrderedFloat::<f64>(y)))
    }

    /// Getter for the x coordinate.
    pub fn x(&self) -> f64 {
        self.0.x.into_inner()
    }

    /// Getter for the y coordinate.
    pub fn y(&self) -> f64 {
        self.0.y.into_inner()
    }

    pub fn norm(&self) -> f64 {
        (self.x() * self.x() + self.y() * self.y()).sqrt()
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (*self - other).norm()
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({0:.3}, {1:.3})", self.x(), self.y())
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x() * rhs, self.y() * rhs)
    }
}

impl Sub<Point> for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x() - rhs.x(), self.y() - rhs.y())
    }
}

impl Add<Point> for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x() + rhs.x(), self.y() + rhs.y())
    }
}

impl Point {
    /// Computes the cross product of two points, viewed as vectors from the origin.
    pub fn cross(self, rhs: Point) -> f64 {
        self.x() * rhs.y() - self.y() * rhs.x()
    }

    /// Computes the dot product of two points, viewed as vectors from the origin.
    pub fn dot(self, rhs: Point) -> f64 {
        self.x() * rhs.x() + self.y() * rhs.y()
    }
}

/// An input site: a point plus its dense, 1-based label.
///
/// The label survives into the Voronoi cell label and the Delaunay vertex
/// label, so labels must be unique and positive.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Site {
    pub pos: Point,
    pub id: i64,
}

impl Site {
    pub fn new(x: f64, y: f64, id: i64) -> Self {
        Site { pos: Point::new(x, y), id }
    }

    pub fn x(&self) -> f64 {
        self.pos.x()
    }

    pub fn y(&self) -> f64 {
        self.pos.y()
    }
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "p{} = {:?}", self.id, self.pos)
    }
}
