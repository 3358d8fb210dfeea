//! Vector and rotation helpers shared by the path follower and the IK solver.
//!
//! Every helper here is total: degenerate input yields `None` or an
//! unchanged orientation instead of NaN, so callers can skip an update and
//! keep the previous pose.
use std::f32::consts::PI;

use glam::{Quat, Vec3};

use crate::ROTATION_EPSILON;

/// Returns the unit vector in the direction of `vector`.
///
/// Returns `None` when the input has a non-finite component or is too short
/// to normalise.
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use mechwalk::vector_math::finite_direction;
/// let dir = finite_direction(Vec3::new(3.0, 0.0, 4.0)).unwrap();
/// assert!((dir.x - 0.6).abs() < 1e-6);
/// assert!((dir.z - 0.8).abs() < 1e-6);
/// assert!(finite_direction(Vec3::ZERO).is_none());
/// assert!(finite_direction(Vec3::new(f32::NAN, 0.0, 1.0)).is_none());
/// ```
#[must_use]
pub fn finite_direction(vector: Vec3) -> Option<Vec3> {
    if !vector.is_finite() {
        return None;
    }
    vector.try_normalize()
}

/// Drops the vertical component of `vector`.
#[must_use]
pub const fn flatten(vector: Vec3) -> Vec3 {
    Vec3::new(vector.x, 0.0, vector.z)
}

/// Horizontal distance between two points.
#[must_use]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    flatten(a - b).length()
}

/// Returns the shortest-arc rotation mapping direction `from` onto `to`.
///
/// Near-opposite directions have no unique shortest arc, so a half turn is
/// made about an axis perpendicular to `from`: `Z × from`, or `X × from`
/// when `from` is parallel to `Z`. Zero-length input yields the identity.
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use mechwalk::vector_math::rotation_between_vectors;
/// let q = rotation_between_vectors(Vec3::X, Vec3::Z);
/// assert!((q * Vec3::X - Vec3::Z).length() < 1e-5);
/// ```
#[must_use]
pub fn rotation_between_vectors(from: Vec3, to: Vec3) -> Quat {
    let (Some(start), Some(dest)) = (finite_direction(from), finite_direction(to)) else {
        return Quat::IDENTITY;
    };

    let cos_theta = start.dot(dest);
    if cos_theta < -1.0 + 0.001 {
        let mut axis = Vec3::Z.cross(start);
        if axis.length_squared() < 0.01 {
            axis = Vec3::X.cross(start);
        }
        return Quat::from_axis_angle(axis.normalize(), PI);
    }

    let axis = start.cross(dest);
    let s = ((1.0 + cos_theta) * 2.0).sqrt();
    let inv_s = 1.0 / s;
    Quat::from_xyzw(axis.x * inv_s, axis.y * inv_s, axis.z * inv_s, s * 0.5).normalize()
}

/// Turns `current` towards `desired` by at most `max_angle` radians.
///
/// `desired` is returned unchanged when the remaining angle is already below
/// `max_angle` or below [`ROTATION_EPSILON`]. Otherwise the result is the
/// spherical interpolation advanced by exactly `max_angle`, always along the
/// shorter arc.
///
/// # Examples
///
/// ```
/// use glam::Quat;
/// use mechwalk::vector_math::rotate_lookat;
/// let turned = rotate_lookat(Quat::IDENTITY, Quat::from_rotation_y(1.0), 0.25);
/// assert!((Quat::IDENTITY.angle_between(turned) - 0.25).abs() < 1e-4);
/// ```
#[must_use]
pub fn rotate_lookat(current: Quat, desired: Quat, max_angle: f32) -> Quat {
    let mut target = desired;
    if current.dot(target) < 0.0 {
        target = -target;
    }

    let angle = current.angle_between(target);
    if !angle.is_finite() || angle < ROTATION_EPSILON || angle <= max_angle {
        return target;
    }
    if max_angle <= 0.0 {
        return current;
    }

    current.slerp(target, max_angle / angle).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::quarter_turn(Vec3::X, Vec3::Z)]
    #[case::oblique(Vec3::new(1.0, 2.0, 3.0), Vec3::new(-2.0, 0.5, 1.0))]
    #[case::identical(Vec3::Y, Vec3::Y)]
    #[case::opposite_x(Vec3::X, Vec3::NEG_X)]
    #[case::opposite_z(Vec3::Z, Vec3::NEG_Z)]
    fn rotation_maps_from_onto_to(#[case] from: Vec3, #[case] to: Vec3) {
        let q = rotation_between_vectors(from, to);
        let mapped = q * from.normalize();
        assert_relative_eq!(mapped.x, to.normalize().x, epsilon = 1e-4);
        assert_relative_eq!(mapped.y, to.normalize().y, epsilon = 1e-4);
        assert_relative_eq!(mapped.z, to.normalize().z, epsilon = 1e-4);
    }

    #[test]
    fn opposite_x_turns_about_vertical_axis() {
        let q = rotation_between_vectors(Vec3::X, Vec3::NEG_X);
        let (axis, angle) = q.to_axis_angle();
        assert_relative_eq!(angle, PI, epsilon = 1e-4);
        assert_relative_eq!(axis.y.abs(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn degenerate_vectors_give_identity() {
        assert_eq!(rotation_between_vectors(Vec3::ZERO, Vec3::X), Quat::IDENTITY);
        assert_eq!(
            rotation_between_vectors(Vec3::X, Vec3::splat(f32::NAN)),
            Quat::IDENTITY
        );
    }

    #[test]
    fn small_remaining_angle_snaps_to_desired() {
        let desired = Quat::from_rotation_y(0.1);
        let result = rotate_lookat(Quat::IDENTITY, desired, 0.5);
        assert_relative_eq!(result.dot(desired).abs(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn takes_shorter_arc_through_double_cover() {
        let current = Quat::from_rotation_y(0.2);
        let desired = -Quat::from_rotation_y(0.6);
        let result = rotate_lookat(current, desired, 0.1);
        let expected = Quat::from_rotation_y(0.3);
        assert_relative_eq!(result.dot(expected).abs(), 1.0, epsilon = 1e-5);
    }

    #[rstest]
    #[case(0.05)]
    #[case(0.3)]
    #[case(1.2)]
    fn step_never_exceeds_cap(#[case] max_angle: f32) {
        let current = Quat::from_rotation_x(0.4) * Quat::from_rotation_y(-1.0);
        let desired = Quat::from_rotation_z(2.5);
        let result = rotate_lookat(current, desired, max_angle);
        assert!(current.angle_between(result) <= max_angle + 1e-4);
    }

    #[test]
    fn horizontal_helpers_ignore_height() {
        let a = Vec3::new(0.0, 10.0, 0.0);
        let b = Vec3::new(3.0, -5.0, 4.0);
        assert_relative_eq!(horizontal_distance(a, b), 5.0);
        assert_eq!(flatten(b), Vec3::new(3.0, 0.0, 4.0));
    }
}
