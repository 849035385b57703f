//! Two entities stepped by the same low-rate position updates: one snaps,
//! the other follows through `LerpPlugin`.
//!
//! `cargo run --example headless -- --update-rate 5 --seconds 3`

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_transform_lerp::prelude::*;
use clap::Parser;

#[derive(Parser, Debug)]
struct Cli {
    /// Position updates per second
    #[arg(long, default_value_t = 5.0)]
    update_rate: f32,
    /// Units moved per update
    #[arg(long, default_value_t = 1.0)]
    speed: f32,
    /// Seconds between direction changes
    #[arg(long, default_value_t = 1.0)]
    turn_every: f32,
    /// Seconds to run before exiting
    #[arg(long, default_value_t = 3.0)]
    seconds: f32,
}

#[derive(Component)]
struct Snapping;

#[derive(Resource)]
struct Mover {
    direction: f32,
    speed: f32,
    step: Timer,
    turn: Timer,
    stop: Timer,
}

fn main() {
    let cli = Cli::parse();

    App::new()
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
            LogPlugin::default(),
            LerpPlugin::default(),
        ))
        .insert_resource(Mover {
            direction: 1.0,
            speed: cli.speed,
            step: Timer::from_seconds(1.0 / cli.update_rate, TimerMode::Repeating),
            turn: Timer::from_seconds(cli.turn_every, TimerMode::Repeating),
            stop: Timer::from_seconds(cli.seconds, TimerMode::Once),
        })
        .add_systems(Startup, setup)
        .add_systems(Update, (move_system, report_system).chain())
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn((Transform::default(), Snapping));
    commands.spawn((
        Transform::default(),
        Lerp::new(LerpProperties::only(LerpProperty::Position)),
    ));
}

fn move_system(
    time: Res<Time>,
    mut mover: ResMut<Mover>,
    mut q_snapping: Query<&mut Transform, With<Snapping>>,
    mut q_targets: Query<&mut LerpTarget>,
    mut exit: EventWriter<AppExit>,
) {
    if mover.turn.tick(time.delta()).just_finished() {
        mover.direction = -mover.direction;
    }
    if mover.stop.tick(time.delta()).just_finished() {
        exit.send(AppExit::Success);
    }
    if !mover.step.tick(time.delta()).just_finished() {
        return;
    }
    let step = mover.direction * mover.speed;
    for mut transform in q_snapping.iter_mut() {
        transform.translation.x += step;
    }
    for mut target in q_targets.iter_mut() {
        target.translation.x += step;
    }
}

fn report_system(
    q_snapping: Query<&Transform, With<Snapping>>,
    q_lerped: Query<&Transform, With<Lerp>>,
) {
    for (snapping, lerped) in q_snapping.iter().zip(q_lerped.iter()) {
        info!(
            "snapping x = {:6.3}  lerped x = {:6.3}",
            snapping.translation.x, lerped.translation.x
        );
    }
}
