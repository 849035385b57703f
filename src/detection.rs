use bevy::{
    ecs::{
        component::Component,
        entity::Entity,
        query::Changed,
        system::{Query, Res},
    },
    log::trace,
    math::{DVec3, Vec3},
    reflect::Reflect,
    time::Time,
    transform::components::Transform,
};
use serde::{Deserialize, Serialize};

use crate::interpolation::{LerpState, LerpTiming};
use crate::math::{self, approx_eq, euler_degrees_to_quat, narrow_quat, quat_to_euler_degrees};
use crate::property::{LerpProperties, LerpProperty};
use crate::LerpConfig;

/// The most recently assigned transform values.
///
/// Application logic, network sync or AI write here instead of the
/// [`Transform`], which is then moved toward these values over time.
#[derive(Component, Clone, Copy, Debug, PartialEq, Deserialize, Serialize, Reflect)]
pub struct LerpTarget {
    pub translation: Vec3,
    /// Euler angles in degrees, applied in Y-X-Z order.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for LerpTarget {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl LerpTarget {
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            translation: transform.translation,
            rotation: quat_to_euler_degrees(transform.rotation),
            scale: transform.scale,
        }
    }

    /// Writes the given properties into `transform` without interpolating.
    pub fn snap(&self, properties: LerpProperties, transform: &mut Transform) {
        for property in properties.iter() {
            match property {
                LerpProperty::Position => transform.translation = self.translation,
                LerpProperty::Rotation => {
                    let rotation = euler_degrees_to_quat(self.rotation.as_dvec3());
                    transform.rotation = narrow_quat(rotation);
                }
                LerpProperty::Scale => transform.scale = self.scale,
            }
        }
    }

    pub fn value(&self, property: LerpProperty) -> Vec3 {
        match property {
            LerpProperty::Position => self.translation,
            LerpProperty::Rotation => self.rotation,
            LerpProperty::Scale => self.scale,
        }
    }
}

impl LerpState {
    fn last_mut(&mut self, property: LerpProperty) -> &mut DVec3 {
        match property {
            LerpProperty::Position => &mut self.last_position,
            LerpProperty::Rotation => &mut self.last_rotation,
            LerpProperty::Scale => &mut self.last_scale,
        }
    }

    /// Compares `target` with the last observed values and starts a leg for
    /// every enabled property that moved by more than `tolerance`.
    ///
    /// When anything changed the inferred duration becomes the time since the
    /// previous change.
    pub fn check_for_changes(
        &mut self,
        target: &LerpTarget,
        now: f64,
        tolerance: f64,
    ) -> LerpProperties {
        let mut changed = LerpProperties::none();
        let properties = self.properties;
        for property in properties.iter() {
            let current = target.value(property).as_dvec3();
            let last = self.last_mut(property);
            if approx_eq(*last, current, tolerance) {
                continue;
            }
            let from = std::mem::replace(last, current);
            self.start_leg(property, from, current, now);
            changed.insert(property);
        }

        if !changed.is_empty() {
            if self.timing == LerpTiming::Inferred {
                self.duration = now - self.time_of_last_update;
            }
            self.time_of_last_update = now;
        }
        changed
    }

    /// Returns the properties this entity does not interpolate whose target
    /// moved by more than `tolerance`, recording the new values.
    pub fn check_for_snaps(&mut self, target: &LerpTarget, tolerance: f64) -> LerpProperties {
        let mut moved = LerpProperties::none();
        for property in LerpProperty::ALL {
            if self.properties.contains(property) {
                continue;
            }
            let current = target.value(property).as_dvec3();
            let last = self.last_mut(property);
            if approx_eq(*last, current, tolerance) {
                continue;
            }
            *last = current;
            moved.insert(property);
        }
        moved
    }
}

/// Starts legs for targets that moved since the last tick.
pub fn lerp_detect_system(
    mut q: Query<(Entity, &LerpTarget, &mut LerpState)>,
    time: Res<Time>,
    config: Res<LerpConfig>,
) {
    let now = math::now_ms(&time);
    for (e, target, mut state) in q.iter_mut() {
        let changed = state.check_for_changes(target, now, config.tolerance);
        if changed.is_empty() {
            continue;
        }
        trace!("{e:?} lerp targets changed: {changed:?}, duration {}ms", state.duration);
    }
}

/// Applies target changes for properties an entity does not interpolate.
///
/// Only the properties whose target actually moved are written.
pub fn lerp_snap_system(
    mut q: Query<(&LerpTarget, &mut LerpState, &mut Transform), Changed<LerpTarget>>,
    config: Res<LerpConfig>,
) {
    for (target, mut state, mut transform) in q.iter_mut() {
        let moved = state.check_for_snaps(target, config.tolerance);
        if moved.is_empty() {
            continue;
        }
        target.snap(moved, &mut transform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::Lerp;

    const TOLERANCE: f64 = 1e-6;

    fn attach(lerp: Lerp, now: f64) -> (LerpTarget, LerpState) {
        let target = LerpTarget::default();
        let state = LerpState::new(&lerp, &target, now);
        (target, state)
    }

    #[test]
    fn test_no_change_has_no_side_effects() {
        let (target, mut state) = attach(Lerp::default(), 0.0);
        let before = state.clone();

        let changed = state.check_for_changes(&target, 50.0, TOLERANCE);

        assert!(changed.is_empty());
        assert!(!state.is_lerping());
        assert_eq!(state.time_of_last_update, before.time_of_last_update);
        assert_eq!(state.duration, before.duration);
    }

    #[test]
    fn test_noise_below_tolerance_is_ignored() {
        let (mut target, mut state) = attach(Lerp::default(), 0.0);
        target.translation.x += 1e-7;

        let changed = state.check_for_changes(&target, 50.0, TOLERANCE);

        assert!(changed.is_empty());
    }

    #[test]
    fn test_change_starts_leg_and_infers_duration() {
        let (mut target, mut state) = attach(Lerp::default(), 100.0);
        target.translation = Vec3::splat(2.0);

        let changed = state.check_for_changes(&target, 250.0, TOLERANCE);

        assert_eq!(changed, LerpProperties::only(LerpProperty::Position));
        assert_eq!(state.last_position, DVec3::splat(2.0));
        assert!(state.position.active);
        assert_eq!(state.position.start, DVec3::ZERO);
        assert_eq!(state.position.target, DVec3::splat(2.0));
        assert_eq!(state.position.start_time, 250.0);
        assert_eq!(state.duration, 150.0);
        assert_eq!(state.time_of_last_update, 250.0);
    }

    #[test]
    fn test_duration_follows_update_spacing() {
        let (mut target, mut state) = attach(Lerp::default(), 0.0);

        target.translation.x = 1.0;
        state.check_for_changes(&target, 200.0, TOLERANCE);
        assert_eq!(state.duration, 200.0);

        target.scale = Vec3::splat(2.0);
        state.check_for_changes(&target, 280.0, TOLERANCE);
        assert_eq!(state.duration, 80.0);

        // unchanged frames leave the estimate alone
        state.check_for_changes(&target, 900.0, TOLERANCE);
        assert_eq!(state.duration, 80.0);
        assert_eq!(state.time_of_last_update, 280.0);
    }

    #[test]
    fn test_same_frame_changes_share_duration() {
        let (mut target, mut state) = attach(Lerp::default(), 0.0);
        target.translation = Vec3::X;
        target.rotation = Vec3::new(0.0, 90.0, 0.0);
        target.scale = Vec3::splat(3.0);

        let changed = state.check_for_changes(&target, 120.0, TOLERANCE);

        assert_eq!(changed, LerpProperties::all());
        assert!(state.is_lerping_property(LerpProperty::Position));
        assert!(state.is_lerping_property(LerpProperty::Rotation));
        assert!(state.is_lerping_property(LerpProperty::Scale));
        assert_eq!(state.duration, 120.0);
    }

    #[test]
    fn test_disabled_property_is_not_tracked() {
        let lerp = Lerp::new(LerpProperties::only(LerpProperty::Scale));
        let (mut target, mut state) = attach(lerp, 0.0);
        target.translation = Vec3::splat(9.0);

        let changed = state.check_for_changes(&target, 100.0, TOLERANCE);

        assert!(changed.is_empty());
        assert!(!state.is_lerping());
        assert_eq!(state.last_position, DVec3::ZERO);
        assert_eq!(state.time_of_last_update, 0.0);
    }

    #[test]
    fn test_rotation_change_uses_euler_degrees() {
        let (mut target, mut state) = attach(Lerp::default(), 0.0);
        target.rotation = Vec3::new(0.0, 90.0, 0.0);

        state.check_for_changes(&target, 100.0, TOLERANCE);

        assert_eq!(state.last_rotation, DVec3::new(0.0, 90.0, 0.0));
        assert!(state.rotation.target.abs_diff_eq(
            bevy::math::DQuat::from_xyzw(0.0, 0.7071067811865475, 0.0, 0.7071067811865476),
            1e-12
        ));
    }

    #[test]
    fn test_retarget_starts_from_last_assigned_value() {
        let (mut target, mut state) = attach(Lerp::default(), 0.0);
        target.translation = Vec3::splat(2.0);
        state.check_for_changes(&target, 100.0, TOLERANCE);
        state.advance(150.0);

        target.translation = Vec3::splat(4.0);
        state.check_for_changes(&target, 150.0, TOLERANCE);

        assert_eq!(state.position.start, DVec3::splat(2.0));
        assert_eq!(state.position.target, DVec3::splat(4.0));
        assert_eq!(state.position.start_time, 150.0);
        assert_eq!(state.duration, 50.0);
    }

    #[test]
    fn test_fixed_timing_keeps_duration() {
        let (mut target, mut state) = attach(Lerp::default().with_fixed_duration(100.0), 0.0);
        target.translation = Vec3::ONE;

        state.check_for_changes(&target, 400.0, TOLERANCE);

        assert_eq!(state.duration, 100.0);
        assert_eq!(state.time_of_last_update, 400.0);
    }

    #[test]
    fn test_target_from_transform() {
        let transform = Transform::from_xyz(1.0, 2.0, 3.0)
            .with_rotation(bevy::math::Quat::from_rotation_y(std::f32::consts::FRAC_PI_2))
            .with_scale(Vec3::splat(2.0));

        let target = LerpTarget::from_transform(&transform);

        assert_eq!(target.translation, Vec3::new(1.0, 2.0, 3.0));
        assert!(target.rotation.abs_diff_eq(Vec3::new(0.0, 90.0, 0.0), 1e-3));
        assert_eq!(target.scale, Vec3::splat(2.0));
    }

    #[test]
    fn test_snap_writes_only_given_properties() {
        let target = LerpTarget {
            translation: Vec3::splat(3.0),
            rotation: Vec3::new(0.0, 90.0, 0.0),
            scale: Vec3::splat(2.0),
        };
        let mut transform = Transform::default();

        let properties = LerpProperties::from_iter([LerpProperty::Rotation, LerpProperty::Scale]);
        target.snap(properties, &mut transform);

        let yaw = bevy::math::Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        assert_eq!(transform.translation, Vec3::ZERO);
        assert!(transform.rotation.abs_diff_eq(yaw, 1e-6));
        assert_eq!(transform.scale, Vec3::splat(2.0));
    }

    #[test]
    fn test_snaps_only_moved_disabled_properties() {
        let lerp = Lerp::new(LerpProperties::only(LerpProperty::Position));
        let (mut target, mut state) = attach(lerp, 0.0);

        target.translation.x = 1.0;
        assert!(state.check_for_snaps(&target, TOLERANCE).is_empty());

        target.scale = Vec3::splat(2.0);
        assert_eq!(
            state.check_for_snaps(&target, TOLERANCE),
            LerpProperties::only(LerpProperty::Scale)
        );
        assert_eq!(state.last_scale, DVec3::splat(2.0));
        assert_eq!(state.last_position, DVec3::ZERO);

        // recorded values are not reported twice
        assert!(state.check_for_snaps(&target, TOLERANCE).is_empty());
    }

    #[test]
    fn test_target_is_serializable() {
        fn assert_serde<T: Serialize + for<'de> Deserialize<'de>>() {}
        assert_serde::<LerpTarget>();
    }
}
