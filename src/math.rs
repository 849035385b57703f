use bevy::math::{DQuat, DVec3, EulerRot, Quat, Vec3};
use bevy::time::Time;

/// Types that can be blended between two values.
///
/// `t` is not clamped, values past `1.0` extrapolate.
pub trait Interpolate {
    fn interpolate(&self, other: Self, t: f64) -> Self;
}

impl Interpolate for DVec3 {
    fn interpolate(&self, other: Self, t: f64) -> Self {
        self.lerp(other, t)
    }
}

impl Interpolate for DQuat {
    /// Spherical interpolation along the shortest arc.
    fn interpolate(&self, other: Self, t: f64) -> Self {
        self.slerp(other, t)
    }
}

/// Converts Euler angles in degrees (x, y, z) to a rotation applied in
/// Y-X-Z order.
pub fn euler_degrees_to_quat(degrees: DVec3) -> DQuat {
    DQuat::from_euler(
        EulerRot::YXZ,
        degrees.y.to_radians(),
        degrees.x.to_radians(),
        degrees.z.to_radians(),
    )
}

/// Inverse of [`euler_degrees_to_quat`] for a rendered rotation.
pub fn quat_to_euler_degrees(rotation: Quat) -> Vec3 {
    let (y, x, z) = rotation.to_euler(EulerRot::YXZ);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

pub fn narrow_quat(rotation: DQuat) -> Quat {
    Quat::from_xyzw(
        rotation.x as f32,
        rotation.y as f32,
        rotation.z as f32,
        rotation.w as f32,
    )
}

/// Component-wise absolute comparison.
pub fn approx_eq(a: DVec3, b: DVec3, tolerance: f64) -> bool {
    a.abs_diff_eq(b, tolerance)
}

/// Progress of a leg that started `elapsed` ms ago.
///
/// A zero, negative or non-finite duration completes immediately.
pub fn fraction(elapsed: f64, duration: f64) -> f64 {
    if duration <= 0.0 || !duration.is_finite() {
        return 1.0;
    }
    elapsed / duration
}

/// Elapsed host time in milliseconds.
pub fn now_ms(time: &Time) -> f64 {
    time.elapsed_seconds_f64() * 1000.0
}
