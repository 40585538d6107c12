//! Binary entry: startup configuration and the fixed-timestep control loop.
//!
//! These flags only configure the process at startup; runtime control is
//! exclusively the UDP protocol.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use glam::Vec3;

use crate::control::ControlChannel;
use crate::headless::{HeadlessRig, HUMANOID_MUSCLE_COUNT};
use crate::probe::TargetObject;
use crate::replay::{ReplayConfig, ReplayEngine};
use crate::session::{LogDisplay, SessionController};

#[derive(Parser)]
#[command(author, version, about = "Replay recorded gestures and score them against a target", long_about = None)]
struct Cli {
    /// Local address receiving command datagrams
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Remote address receiving accuracy results
    #[arg(long, default_value = "127.0.0.1:8001")]
    remote: SocketAddr,

    /// Nominal trial length in frames (the accuracy denominator)
    #[arg(long, default_value_t = 100)]
    sequence_length: usize,

    /// Replay ticks per second
    #[arg(long, default_value_t = 50.0)]
    tick_rate: f32,

    /// Uniform scale of the target's collider
    #[arg(long, default_value_t = 1.0)]
    target_scale: f32,

    /// Muscle parameter count of the headless rig
    #[arg(long, default_value_t = HUMANOID_MUSCLE_COUNT)]
    muscle_count: usize,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    anyhow::ensure!(cli.tick_rate > 0.0, "tick rate must be positive");
    anyhow::ensure!(cli.sequence_length > 0, "sequence length must be positive");

    let mut rig = HeadlessRig::new(cli.muscle_count);
    let engine = ReplayEngine::new(
        &rig,
        ReplayConfig {
            sequence_length: cli.sequence_length,
        },
    );
    let target = TargetObject::new(Vec3::ZERO, cli.target_scale);

    let channel = ControlChannel::bind(cli.bind, cli.remote)?;
    // The listener handle must stay alive for the life of the loop; its
    // drop would stop the receive thread.
    let (_listener, inbox) = channel.spawn_listener()?;
    let mut controller = SessionController::new(engine, channel, inbox, LogDisplay, target);

    log::info!(
        "replaying at {} ticks/s, sequence length {}",
        cli.tick_rate,
        cli.sequence_length
    );

    let tick = Duration::from_secs_f32(1.0 / cli.tick_rate);
    let mut next = Instant::now();
    loop {
        controller.update(&mut rig);

        next += tick;
        let now = Instant::now();
        if next > now {
            std::thread::sleep(next - now);
        } else {
            // Fell behind (e.g. a synchronous file load); don't burst to
            // catch up.
            next = now;
        }
    }
}
