use bevy::{
    ecs::{component::Component, system::{Query, Res}},
    log::{debug, trace},
    math::{DQuat, DVec3},
    reflect::Reflect,
    time::Time,
    transform::components::Transform,
};
use serde::{Deserialize, Serialize};

use crate::detection::LerpTarget;
use crate::math::{self, euler_degrees_to_quat, narrow_quat, Interpolate};
use crate::property::{LerpProperties, LerpProperty};

/// How long a leg takes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize, Reflect)]
pub enum LerpTiming {
    /// Re-derived from the spacing between detected target changes.
    #[default]
    Inferred,
    /// A constant duration in milliseconds.
    Fixed { duration_ms: f64 },
}

/// Marks an entity whose [`Transform`] follows its [`LerpTarget`] smoothly.
#[derive(Component, Clone, Debug, Default, Deserialize, Serialize, Reflect)]
pub struct Lerp {
    pub properties: LerpProperties,
    pub timing: LerpTiming,
}

impl Lerp {
    pub fn new(properties: LerpProperties) -> Self {
        Self {
            properties,
            timing: LerpTiming::Inferred,
        }
    }

    pub fn with_fixed_duration(mut self, duration_ms: f64) -> Self {
        self.timing = LerpTiming::Fixed { duration_ms };
        self
    }
}

/// One in-flight interpolation for a single property.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Leg<T> {
    pub start: T,
    pub target: T,
    /// Milliseconds.
    pub start_time: f64,
    pub active: bool,
}

impl<T: Interpolate + Copy> Leg<T> {
    fn idle(value: T) -> Self {
        Self {
            start: value,
            target: value,
            start_time: 0.0,
            active: false,
        }
    }

    /// Replaces whatever was in flight.
    fn restart(&mut self, start: T, target: T, now: f64) {
        self.start = start;
        self.target = target;
        self.start_time = now;
        self.active = true;
    }

    /// Samples the leg at `now` and retires it once the fraction reaches 1.
    ///
    /// The returned value is not clamped, so a coarse final frame may land
    /// slightly past the target.
    fn advance(&mut self, now: f64, duration: f64) -> Option<T> {
        if !self.active {
            return None;
        }
        let fraction = math::fraction(now - self.start_time, duration);
        let value = self.start.interpolate(self.target, fraction);
        if fraction >= 1.0 {
            self.active = false;
        }
        Some(value)
    }
}

/// Values to write into a [`Transform`] after one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransformUpdate {
    pub translation: Option<DVec3>,
    pub rotation: Option<DQuat>,
    pub scale: Option<DVec3>,
}

impl TransformUpdate {
    pub fn is_empty(&self) -> bool {
        self.translation.is_none() && self.rotation.is_none() && self.scale.is_none()
    }

    pub fn apply(&self, transform: &mut Transform) {
        if let Some(translation) = self.translation {
            transform.translation = translation.as_vec3();
        }
        if let Some(rotation) = self.rotation {
            transform.rotation = narrow_quat(rotation);
        }
        if let Some(scale) = self.scale {
            transform.scale = scale.as_vec3();
        }
    }
}

/// Interpolation state for an entity with [`Lerp`].
///
/// Inserted when `Lerp` is added and removed with it.
#[derive(Component, Clone, Debug)]
pub struct LerpState {
    pub properties: LerpProperties,
    pub timing: LerpTiming,
    pub last_position: DVec3,
    /// Euler degrees.
    pub last_rotation: DVec3,
    pub last_scale: DVec3,
    pub position: Leg<DVec3>,
    pub rotation: Leg<DQuat>,
    pub scale: Leg<DVec3>,
    /// Milliseconds, shared by every leg.
    pub duration: f64,
    pub time_of_last_update: f64,
}

impl LerpState {
    /// Captures `target` as the baseline for change detection.
    pub fn new(lerp: &Lerp, target: &LerpTarget, now: f64) -> Self {
        let last_position = target.translation.as_dvec3();
        let last_rotation = target.rotation.as_dvec3();
        let last_scale = target.scale.as_dvec3();
        let duration = match lerp.timing {
            LerpTiming::Inferred => 0.0,
            LerpTiming::Fixed { duration_ms } => duration_ms,
        };
        Self {
            properties: lerp.properties,
            timing: lerp.timing,
            last_position,
            last_rotation,
            last_scale,
            position: Leg::idle(last_position),
            rotation: Leg::idle(euler_degrees_to_quat(last_rotation)),
            scale: Leg::idle(last_scale),
            duration,
            time_of_last_update: now,
        }
    }

    pub fn start_position(&mut self, from: DVec3, to: DVec3, now: f64) {
        self.position.restart(from, to, now);
    }

    /// `from` and `to` are Euler angles in degrees.
    pub fn start_rotation(&mut self, from: DVec3, to: DVec3, now: f64) {
        self.rotation.restart(euler_degrees_to_quat(from), euler_degrees_to_quat(to), now);
    }

    pub fn start_scale(&mut self, from: DVec3, to: DVec3, now: f64) {
        self.scale.restart(from, to, now);
    }

    pub fn start_leg(&mut self, property: LerpProperty, from: DVec3, to: DVec3, now: f64) {
        debug!("lerp {property} leg {from} -> {to} at {now}ms");
        match property {
            LerpProperty::Position => self.start_position(from, to, now),
            LerpProperty::Rotation => self.start_rotation(from, to, now),
            LerpProperty::Scale => self.start_scale(from, to, now),
        }
    }

    pub fn is_lerping(&self) -> bool {
        self.position.active || self.rotation.active || self.scale.active
    }

    pub fn is_lerping_property(&self, property: LerpProperty) -> bool {
        match property {
            LerpProperty::Position => self.position.active,
            LerpProperty::Rotation => self.rotation.active,
            LerpProperty::Scale => self.scale.active,
        }
    }

    /// Advances every active leg to `now`.
    pub fn advance(&mut self, now: f64) -> TransformUpdate {
        let duration = self.duration;
        TransformUpdate {
            translation: self.position.advance(now, duration),
            rotation: self.rotation.advance(now, duration),
            scale: self.scale.advance(now, duration),
        }
    }
}

/// Writes interpolated values into transforms.
pub fn lerp_advance_system(mut q: Query<(&mut LerpState, &mut Transform)>, time: Res<Time>) {
    let now = math::now_ms(&time);
    for (mut state, mut transform) in q.iter_mut() {
        if !state.is_lerping() {
            continue;
        }
        let update = state.advance(now);
        trace!("lerp update {update:?}");
        update.apply(&mut transform);
    }
}
