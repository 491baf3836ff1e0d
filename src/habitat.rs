//! Habitat: the terrain query service.
//!
//! The simulation never computes terrain geometry itself; it only asks
//! whether a point is habitable, for a random habitable point, or for the
//! nearest habitable point to an arbitrary one.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// A 2-D world position
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Move up to `step` units toward `target`, without overshooting
    pub fn towards(&self, target: Point, step: f64) -> Point {
        let dist = self.distance(target);
        if dist <= step || dist <= f64::EPSILON {
            return target;
        }
        let t = step / dist;
        Point::new(
            self.x + (target.x - self.x) * t,
            self.y + (target.y - self.y) * t,
        )
    }

    /// Move `step` units directly away from `threat`
    pub fn away_from(&self, threat: Point, step: f64) -> Point {
        let dist = self.distance(threat);
        if dist <= f64::EPSILON {
            return self.offset(step, 0.0);
        }
        let t = step / dist;
        Point::new(
            self.x + (self.x - threat.x) * t,
            self.y + (self.y - threat.y) * t,
        )
    }
}

/// Terrain query interface
pub trait Habitat {
    /// Is this point valid for life
    fn is_habitable(&self, point: Point) -> bool;
    /// A uniformly drawn habitable point
    fn random_habitable_point(&self, rng: &mut dyn RngCore) -> Point;
    /// The habitable point closest to `point` (identity for habitable points)
    fn clamp_to_habitable(&self, point: Point) -> Point;
}

/// A circular body of water
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Lake {
    pub center: Point,
    pub radius: f64,
}

impl Lake {
    fn contains(&self, point: Point) -> bool {
        self.center.distance(point) < self.radius
    }

    /// Push a point inside the lake out to its shore
    fn push_to_shore(&self, point: Point) -> Point {
        let dist = self.center.distance(point);
        let shore = self.radius + 1e-6;
        if dist <= f64::EPSILON {
            return self.center.offset(shore, 0.0);
        }
        let t = shore / dist;
        Point::new(
            self.center.x + (point.x - self.center.x) * t,
            self.center.y + (point.y - self.center.y) * t,
        )
    }
}

/// Habitat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HabitatConfig {
    pub width: f64,
    pub height: f64,
    pub lakes: Vec<Lake>,
}

impl Default for HabitatConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 200.0,
            lakes: vec![Lake {
                center: Point::new(140.0, 60.0),
                radius: 25.0,
            }],
        }
    }
}

/// Rectangular land `[0, width] x [0, height]` with lakes cut out
#[derive(Clone, Debug)]
pub struct IslandHabitat {
    width: f64,
    height: f64,
    lakes: Vec<Lake>,
}

impl IslandHabitat {
    /// Rejection-sampling attempts before falling back to clamping
    const MAX_SAMPLES: usize = 64;

    pub fn new(config: &HabitatConfig) -> Self {
        let width = if config.width.is_finite() && config.width > 0.0 {
            config.width
        } else {
            log::warn!("habitat.width = {} invalid; using 1.0", config.width);
            1.0
        };
        let height = if config.height.is_finite() && config.height > 0.0 {
            config.height
        } else {
            log::warn!("habitat.height = {} invalid; using 1.0", config.height);
            1.0
        };
        let lakes = config
            .lakes
            .iter()
            .filter(|l| l.radius > 0.0 && l.radius.is_finite())
            .copied()
            .collect();

        Self {
            width,
            height,
            lakes,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    fn clamp_to_bounds(&self, point: Point) -> Point {
        let x = if point.x.is_finite() { point.x } else { self.width * 0.5 };
        let y = if point.y.is_finite() { point.y } else { self.height * 0.5 };
        Point::new(x.clamp(0.0, self.width), y.clamp(0.0, self.height))
    }
}

impl Habitat for IslandHabitat {
    fn is_habitable(&self, point: Point) -> bool {
        point.x >= 0.0
            && point.x <= self.width
            && point.y >= 0.0
            && point.y <= self.height
            && !self.lakes.iter().any(|l| l.contains(point))
    }

    fn random_habitable_point(&self, rng: &mut dyn RngCore) -> Point {
        let mut candidate = Point::default();
        for _ in 0..Self::MAX_SAMPLES {
            candidate = Point::new(
                rng.gen_range(0.0..=self.width),
                rng.gen_range(0.0..=self.height),
            );
            if self.is_habitable(candidate) {
                return candidate;
            }
        }
        self.clamp_to_habitable(candidate)
    }

    fn clamp_to_habitable(&self, point: Point) -> Point {
        let mut p = self.clamp_to_bounds(point);
        // Overlapping lakes can push a point into a neighbour; a few passes settle it
        for _ in 0..4 {
            match self.lakes.iter().find(|l| l.contains(p)) {
                Some(lake) => p = self.clamp_to_bounds(lake.push_to_shore(p)),
                None => return p,
            }
        }
        p
    }
}
