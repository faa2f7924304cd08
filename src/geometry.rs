//! Node positions, placement domains and the distance metric.

use crate::error::{Result, SpatialError};
use crate::stats::integrate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Spatial dimensionality of a population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dimensions {
    Two,
    Three,
}

impl Dimensions {
    pub fn count(&self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl TryFrom<u8> for Dimensions {
    type Error = SpatialError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(SpatialError::InvalidConfig(format!(
                "dimensions must be 2 or 3, got {}",
                other
            ))),
        }
    }
}

impl From<Dimensions> for u8 {
    fn from(d: Dimensions) -> u8 {
        d.count() as u8
    }
}

/// Node coordinates; `z` is zero for 2D populations
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn planar(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    #[inline]
    fn axes(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Coordinates truncated to the given dimensionality
    pub fn coords(&self, dims: Dimensions) -> Vec<f64> {
        self.axes()[..dims.count()].to_vec()
    }
}

/// Square or cube of side `side_length` in which nodes are placed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub side_length: f64,
    pub dims: Dimensions,
    /// Lower corner coordinate on every axis
    pub lower: f64,
    /// Periodic boundary conditions (minimum image distances)
    pub wrap: bool,
}

impl Domain {
    /// Domain `[lower, lower + side_length]^d`
    pub fn new(side_length: f64, dims: Dimensions, lower: f64, wrap: bool) -> Result<Self> {
        if !(side_length.is_finite() && side_length > 0.0) {
            return Err(SpatialError::InvalidConfig(format!(
                "side length must be positive, got {}",
                side_length
            )));
        }
        Ok(Self {
            side_length,
            dims,
            lower,
            wrap,
        })
    }

    /// Domain centred on the origin
    pub fn centered(side_length: f64, dims: Dimensions, wrap: bool) -> Result<Self> {
        Self::new(side_length, dims, -side_length / 2.0, wrap)
    }

    pub fn upper(&self) -> f64 {
        self.lower + self.side_length
    }

    pub fn center(&self) -> Position {
        let c = self.lower + self.side_length / 2.0;
        match self.dims {
            Dimensions::Two => Position::planar(c, c),
            Dimensions::Three => Position::new(c, c, c),
        }
    }

    /// Largest distance from the centre to any point of the domain
    pub fn max_dist(&self) -> f64 {
        match self.dims {
            Dimensions::Two => self.side_length / std::f64::consts::SQRT_2,
            Dimensions::Three => 3f64.sqrt() * self.side_length / 2.0,
        }
    }

    /// Uniform random position inside the domain
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        let (lo, hi) = (self.lower, self.upper());
        let x = rng.gen_range(lo..hi);
        let y = rng.gen_range(lo..hi);
        match self.dims {
            Dimensions::Two => Position::planar(x, y),
            Dimensions::Three => Position::new(x, y, rng.gen_range(lo..hi)),
        }
    }

    /// Euclidean distance, using the minimum image when the domain wraps
    pub fn distance(&self, a: &Position, b: &Position) -> f64 {
        let l = self.side_length;
        a.axes()
            .iter()
            .zip(b.axes().iter())
            .take(self.dims.count())
            .map(|(p, q)| {
                let mut delta = (p - q).abs();
                if self.wrap {
                    delta %= l;
                    delta = delta.min(l - delta);
                }
                delta * delta
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Measure of the circle (2D) or sphere (3D) of radius `d` around the
    /// centre that lies inside the domain.
    ///
    /// Proportional to the density of uniformly placed nodes at distance
    /// `d` from a centrally placed source; with wrapping the minimum image
    /// region around any source is the same centred square or cube.
    pub fn shell_measure(&self, d: f64) -> f64 {
        let h = self.side_length / 2.0;
        if d <= 0.0 || d > self.max_dist() {
            return 0.0;
        }
        match self.dims {
            Dimensions::Two => {
                if d <= h {
                    2.0 * PI * d
                } else {
                    2.0 * d * (PI - 4.0 * (h / d).acos())
                }
            }
            Dimensions::Three => {
                if d <= h {
                    4.0 * PI * d * d
                } else if d <= h * std::f64::consts::SQRT_2 {
                    // sphere minus six face caps
                    4.0 * PI * d * (3.0 * h - 2.0 * d)
                } else {
                    // caps now overlap along the twelve edges
                    let z0 = (d * d - 2.0 * h * h).sqrt();
                    let edge = 2.0
                        * d
                        * integrate(
                            |z| {
                                let r = (d * d - z * z).sqrt();
                                FRAC_PI_2 - 2.0 * (h / r).min(1.0).asin()
                            },
                            0.0,
                            z0,
                            1e-10,
                        );
                    let area = 4.0 * PI * d * d - 12.0 * PI * d * (d - h) + 12.0 * edge;
                    area.max(0.0)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_open_distance() {
        let domain = Domain::new(1.0, Dimensions::Two, 0.0, false).unwrap();
        let d = domain.distance(&Position::planar(0.1, 0.1), &Position::planar(0.9, 0.7));
        assert_relative_eq!(d, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wrapped_distance_uses_minimum_image() {
        let domain = Domain::centered(1.0, Dimensions::Three, true).unwrap();
        let a = Position::new(-0.45, 0.0, 0.4);
        let b = Position::new(0.45, 0.0, -0.4);
        assert_relative_eq!(domain.distance(&a, &b), (0.01f64 + 0.04).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_wrapped_distance_bounded_by_max_dist() {
        let domain = Domain::centered(2.0, Dimensions::Two, true).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let a = domain.sample(&mut rng);
            let b = domain.sample(&mut rng);
            assert!(domain.distance(&a, &b) <= domain.max_dist() + 1e-12);
        }
    }

    #[test]
    fn test_samples_stay_inside() {
        let domain = Domain::new(3.0, Dimensions::Three, 1.0, false).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            let p = domain.sample(&mut rng);
            for c in p.coords(Dimensions::Three) {
                assert!((1.0..4.0).contains(&c));
            }
        }
    }

    #[test]
    fn test_shell_measure_2d_integrates_to_area() {
        let domain = Domain::centered(1.0, Dimensions::Two, false).unwrap();
        let area = integrate(|d| domain.shell_measure(d), 0.0, domain.max_dist(), 1e-10);
        assert_relative_eq!(area, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_shell_measure_3d_integrates_to_volume() {
        let domain = Domain::centered(1.0, Dimensions::Three, false).unwrap();
        let volume = integrate(|d| domain.shell_measure(d), 0.0, domain.max_dist(), 1e-9);
        assert_relative_eq!(volume, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_shell_measure_is_continuous() {
        let domain = Domain::centered(1.0, Dimensions::Three, false).unwrap();
        let h = 0.5;
        let joint = h * std::f64::consts::SQRT_2;
        assert_relative_eq!(
            domain.shell_measure(h - 1e-9),
            domain.shell_measure(h + 1e-9),
            epsilon = 1e-6
        );
        assert_relative_eq!(
            domain.shell_measure(joint - 1e-9),
            domain.shell_measure(joint + 1e-9),
            epsilon = 1e-4
        );
        assert_eq!(domain.shell_measure(domain.max_dist() + 1e-6), 0.0);
    }

    #[test]
    fn test_invalid_side_length() {
        assert!(Domain::centered(0.0, Dimensions::Two, true).is_err());
        assert!(Domain::centered(f64::INFINITY, Dimensions::Two, true).is_err());
        assert!(Dimensions::try_from(4).is_err());
    }
}
