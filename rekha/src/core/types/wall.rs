//! Wall polygon produced at the end of a mapping session.

use serde::{Deserialize, Serialize};

use super::Point;
use crate::error::{Error, Result};

/// Minimum vertices for a wall.
pub const MIN_WALL_POINTS: usize = 3;

/// Ordered outline of a traced room.
///
/// Always holds at least three points. When the walk was loop-closed the
/// first and last points are identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WallPoints", into = "WallPoints")]
pub struct Wall {
    points: Vec<Point>,
}

/// Serialized form; validated on the way back in.
#[derive(Serialize, Deserialize)]
struct WallPoints {
    points: Vec<Point>,
}

impl TryFrom<WallPoints> for Wall {
    type Error = Error;

    fn try_from(value: WallPoints) -> Result<Self> {
        Wall::new(value.points)
    }
}

impl From<Wall> for WallPoints {
    fn from(wall: Wall) -> Self {
        WallPoints {
            points: wall.points,
        }
    }
}

impl Wall {
    /// Build a wall; fails with `InsufficientPoints` below three points.
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() < MIN_WALL_POINTS {
            return Err(Error::InsufficientPoints {
                count: points.len(),
            });
        }
        Ok(Self { points })
    }

    /// Vertices in walk order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of vertices (including the repeated start of a closed wall).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; a wall has at least three points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the outline ends where it started.
    pub fn is_closed(&self) -> bool {
        self.points.first() == self.points.last()
    }

    /// Length of the polyline in meters.
    pub fn perimeter(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }

    /// Enclosed area in m² (shoelace formula).
    ///
    /// An open outline is treated as if closed by a straight segment.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        let twice_area: f64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice_area.abs() / 2.0
    }
}
