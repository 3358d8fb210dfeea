//! Height-field terrain queried by grid construction and by every tick of
//! the locomotion controller.
//!
//! Terrain generation itself is not modelled in detail; the rest of the
//! crate only relies on the [`HeightField`] contract: a pure, side-effect
//! free mapping from `(x, z)` to an elevation and an upward unit normal.

use glam::Vec3;
use serde::Deserialize;

/// Deterministic elevation source.
///
/// Implementations must be callable at arbitrary, possibly fractional,
/// coordinates and return the same answer for the same input.
pub trait HeightField: Send + Sync {
    /// Elevation of the surface at `(x, z)`.
    fn height(&self, x: f32, z: f32) -> f32;

    /// Upward-facing unit normal of the surface at `(x, z)`.
    ///
    /// The default derives the normal from forward differences one unit
    /// along each axis.
    fn normal(&self, x: f32, z: f32) -> Vec3 {
        let origin = Vec3::new(x, self.height(x, z), z);
        let along_x = Vec3::new(x + 1.0, self.height(x + 1.0, z), z);
        let along_z = Vec3::new(x, self.height(x, z + 1.0), z + 1.0);
        (along_z - origin)
            .cross(along_x - origin)
            .try_normalize()
            .unwrap_or(Vec3::Y)
    }

    /// The surface point directly below or above `(x, z)`.
    fn ground_point(&self, x: f32, z: f32) -> Vec3 {
        Vec3::new(x, self.height(x, z), z)
    }
}

/// A level plane at a fixed elevation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlatGround {
    /// Elevation of the plane.
    pub height: f32,
}

impl FlatGround {
    /// Creates a plane at `height`.
    #[must_use]
    pub const fn new(height: f32) -> Self {
        Self { height }
    }
}

impl HeightField for FlatGround {
    fn height(&self, _x: f32, _z: f32) -> f32 {
        self.height
    }

    fn normal(&self, _x: f32, _z: f32) -> Vec3 {
        Vec3::Y
    }
}

/// Smooth analytic hills built from two sums of sinusoids.
///
/// The surface is the product of an x-profile and a z-profile, which gives
/// long ridges broken up by gentler cross-waves. `amplitude` scales the
/// whole surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingHills {
    /// Vertical scale applied to the product of both profiles.
    pub amplitude: f32,
}

impl Default for RollingHills {
    fn default() -> Self {
        Self { amplitude: 0.05 }
    }
}

impl RollingHills {
    fn x_profile(x: f32) -> f32 {
        (x / 213.142).sin()
            + (x / 124.421 + 321.213).cos() * 22.312
            + (x / 2114.14).sin() * 141.12
    }

    fn z_profile(z: f32) -> f32 {
        (z / 163.142).sin()
            + (z / 4115.1515 + 1243.142).cos() * 1.314
            + (z / 1241.12).sin() * 1.1
            + (z / 142.125).cos() * 0.142
    }
}

impl HeightField for RollingHills {
    fn height(&self, x: f32, z: f32) -> f32 {
        Self::x_profile(x) * Self::z_profile(z) * self.amplitude
    }
}

/// Terrain selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerrainKind {
    /// A level plane.
    Flat {
        /// Elevation of the plane.
        #[serde(default)]
        height: f32,
    },
    /// [`RollingHills`] with the given amplitude.
    Hills {
        /// Vertical scale of the hills.
        amplitude: f32,
    },
}

impl Default for TerrainKind {
    fn default() -> Self {
        Self::Hills {
            amplitude: RollingHills::default().amplitude,
        }
    }
}

impl TerrainKind {
    /// Builds the terrain described by this selection.
    #[must_use]
    pub fn build(self) -> Box<dyn HeightField> {
        match self {
            Self::Flat { height } => Box::new(FlatGround::new(height)),
            Self::Hills { amplitude } => Box::new(RollingHills { amplitude }),
        }
    }
}

const RAY_MARCH_STEP: f32 = 0.5;
const RAY_REFINE_ITERATIONS: usize = 24;

/// Intersects a ray with the terrain surface.
///
/// The ray is marched in fixed steps until it first passes below the
/// surface, then the crossing is refined by bisection. Returns `None` when
/// the direction is degenerate, the origin already lies below the ground, or
/// nothing is hit within `max_distance`.
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use mechwalk::terrain::{raycast_ground, FlatGround};
/// let hit = raycast_ground(&FlatGround::new(0.0), Vec3::new(0.0, 10.0, 0.0), Vec3::new(1.0, -1.0, 0.0), 100.0)
///     .unwrap();
/// assert!((hit.x - 10.0).abs() < 1e-2);
/// assert!(hit.y.abs() < 1e-2);
/// ```
pub fn raycast_ground<H: HeightField + ?Sized>(
    terrain: &H,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
) -> Option<Vec3> {
    let direction = crate::vector_math::finite_direction(direction)?;
    let above = |distance: f32| {
        let p = origin + direction * distance;
        p.y - terrain.height(p.x, p.z)
    };

    if !origin.is_finite() || above(0.0) < 0.0 {
        return None;
    }

    let mut near = 0.0_f32;
    let mut far = RAY_MARCH_STEP;
    loop {
        if far > max_distance {
            far = max_distance;
        }
        if above(far) <= 0.0 {
            break;
        }
        if far >= max_distance {
            return None;
        }
        near = far;
        far += RAY_MARCH_STEP;
    }

    for _ in 0..RAY_REFINE_ITERATIONS {
        let mid = 0.5 * (near + far);
        if above(mid) > 0.0 {
            near = mid;
        } else {
            far = mid;
        }
    }

    let hit = origin + direction * far;
    Some(terrain.ground_point(hit.x, hit.z))
}
