use bevy::prelude::*;
use bevy::transform::TransformSystem;
use serde::{Deserialize, Serialize};

pub mod detection;
pub mod error;
pub mod interpolation;
pub mod math;
pub mod property;

pub use detection::LerpTarget;
pub use error::LerpError;
pub use interpolation::{Lerp, LerpState, LerpTiming, TransformUpdate};
pub use property::{LerpProperties, LerpProperty};

pub mod prelude {
    pub use crate::{
        Lerp, LerpConfig, LerpPlugin, LerpProperties, LerpProperty, LerpSet, LerpTarget,
        LerpTiming,
    };
}

pub struct LerpPlugin {
    /// Absolute per-component difference below which a reassigned target
    /// counts as unchanged.
    pub tolerance: f64,
}

impl Default for LerpPlugin {
    fn default() -> Self {
        Self { tolerance: 1e-6 }
    }
}

/// Sets for transform interpolation systems.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum LerpSet {
    /// Systems that capture the baseline for newly attached entities and
    /// drop state for detached ones.
    ///
    /// Runs in `PreUpdate`.
    Init,
    /// Systems that compare targets against the last observed values.
    ///
    /// Runs in `PostUpdate`.
    Detect,
    /// Systems that write interpolated values into transforms.
    ///
    /// Runs in `PostUpdate`, before transform propagation.
    Advance,
}

impl Plugin for LerpPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Lerp>()
            .register_type::<LerpTarget>()
            .register_type::<LerpProperties>()
            .register_type::<LerpProperty>()
            .register_type::<LerpTiming>()
            .configure_sets(
                PostUpdate,
                (LerpSet::Detect, LerpSet::Advance)
                    .chain()
                    .before(TransformSystem::TransformPropagate),
            )
            .add_systems(
                PreUpdate,
                (lerp_init_system, lerp_cleanup_system).in_set(LerpSet::Init),
            )
            .add_systems(
                PostUpdate,
                (detection::lerp_snap_system, detection::lerp_detect_system)
                    .in_set(LerpSet::Detect),
            )
            .add_systems(
                PostUpdate,
                interpolation::lerp_advance_system.in_set(LerpSet::Advance),
            )
            .insert_resource(LerpConfig {
                tolerance: self.tolerance,
            });
    }

    fn finish(&self, app: &mut App) {
        if !app.world().contains_resource::<Time>() {
            panic!("{}", LerpError::MissingTime);
        }
    }
}

#[derive(Resource, Serialize, Deserialize, Debug)]
pub struct LerpConfig {
    pub tolerance: f64,
}

/// Initialize interpolation state for newly attached entities.
///
/// An entity spawned without a [`LerpTarget`] gets one mirroring its
/// transform, otherwise the transform is snapped to the existing target.
fn lerp_init_system(
    mut q_new: Query<(Entity, &Lerp, &mut Transform, Option<&LerpTarget>), Added<Lerp>>,
    mut commands: Commands,
    time: Res<Time>,
) {
    let now = math::now_ms(&time);
    for (e, lerp, mut transform, target) in q_new.iter_mut() {
        if lerp.properties.is_empty() {
            warn!("{e:?} has a Lerp component with no properties to interpolate");
        }
        let target = match target {
            Some(target) => {
                target.snap(LerpProperties::all(), &mut transform);
                *target
            }
            None => {
                let target = LerpTarget::from_transform(&transform);
                commands.entity(e).insert(target);
                target
            }
        };
        debug!("{e:?} lerp attached at {now}ms with {:?}", lerp.properties);
        commands.entity(e).insert(LerpState::new(lerp, &target, now));
    }
}

fn lerp_cleanup_system(mut removed: RemovedComponents<Lerp>, mut commands: Commands) {
    for e in removed.read() {
        if let Some(mut entity) = commands.get_entity(e) {
            entity.remove::<LerpState>();
        }
    }
}
