//! Axis-aligned bounds and point access.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{GridError, GridResult};

/// One of the three spatial axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        })
    }
}

/// Anything with three coordinates readable as `f64`.
///
/// The geometric kernel's point type only needs to implement this to be
/// locked by position.
pub trait Point3 {
    fn x(&self) -> f64;
    fn y(&self) -> f64;
    fn z(&self) -> f64;

    /// Coordinate along `axis`.
    #[inline]
    fn coord(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x(),
            Axis::Y => self.y(),
            Axis::Z => self.z(),
        }
    }
}

impl Point3 for [f64; 3] {
    #[inline]
    fn x(&self) -> f64 {
        self[0]
    }
    #[inline]
    fn y(&self) -> f64 {
        self[1]
    }
    #[inline]
    fn z(&self) -> f64 {
        self[2]
    }
}

impl Point3 for [f32; 3] {
    #[inline]
    fn x(&self) -> f64 {
        f64::from(self[0])
    }
    #[inline]
    fn y(&self) -> f64 {
        f64::from(self[1])
    }
    #[inline]
    fn z(&self) -> f64 {
        f64::from(self[2])
    }
}

impl Point3 for (f64, f64, f64) {
    #[inline]
    fn x(&self) -> f64 {
        self.0
    }
    #[inline]
    fn y(&self) -> f64 {
        self.1
    }
    #[inline]
    fn z(&self) -> f64 {
        self.2
    }
}

impl<P: Point3 + ?Sized> Point3 for &P {
    #[inline]
    fn x(&self) -> f64 {
        (**self).x()
    }
    #[inline]
    fn y(&self) -> f64 {
        (**self).y()
    }
    #[inline]
    fn z(&self) -> f64 {
        (**self).z()
    }
}

/// Axis-aligned bounding box given by its six bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bbox3 {
    pub xmin: f64,
    pub ymin: f64,
    pub zmin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub zmax: f64,
}

impl Bbox3 {
    /// Create a box from its six bounds.
    #[must_use]
    pub const fn new(xmin: f64, ymin: f64, zmin: f64, xmax: f64, ymax: f64, zmax: f64) -> Self {
        Self {
            xmin,
            ymin,
            zmin,
            xmax,
            ymax,
            zmax,
        }
    }

    /// Create a box spanning `[min, max]` on every axis.
    #[must_use]
    pub const fn cube(min: f64, max: f64) -> Self {
        Self::new(min, min, min, max, max, max)
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points<P: Point3>(points: impl IntoIterator<Item = P>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bbox = Self::new(
            first.x(),
            first.y(),
            first.z(),
            first.x(),
            first.y(),
            first.z(),
        );
        for p in points {
            bbox.xmin = bbox.xmin.min(p.x());
            bbox.ymin = bbox.ymin.min(p.y());
            bbox.zmin = bbox.zmin.min(p.z());
            bbox.xmax = bbox.xmax.max(p.x());
            bbox.ymax = bbox.ymax.max(p.y());
            bbox.zmax = bbox.zmax.max(p.z());
        }
        Some(bbox)
    }

    /// Lower bound along `axis`.
    #[must_use]
    pub const fn min(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.xmin,
            Axis::Y => self.ymin,
            Axis::Z => self.zmin,
        }
    }

    /// Upper bound along `axis`.
    #[must_use]
    pub const fn max(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.xmax,
            Axis::Y => self.ymax,
            Axis::Z => self.zmax,
        }
    }

    /// Length of the box along `axis`.
    #[must_use]
    pub fn extent(&self, axis: Axis) -> f64 {
        self.max(axis) - self.min(axis)
    }

    /// Whether the point lies inside the closed box.
    pub fn contains<P: Point3>(&self, p: &P) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| (self.min(axis)..=self.max(axis)).contains(&p.coord(axis)))
    }

    /// Check every axis has a finite, strictly positive extent.
    pub fn validate(&self) -> GridResult<()> {
        for axis in Axis::ALL {
            let extent = self.extent(axis);
            if !extent.is_finite() || extent <= 0.0 {
                return Err(GridError::DegenerateBounds {
                    axis,
                    min: self.min(axis),
                    max: self.max(axis),
                });
            }
        }
        Ok(())
    }
}
