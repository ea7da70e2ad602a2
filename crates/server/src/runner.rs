use std::net::SocketAddr;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use hopper::{Actions, FixedDevice, NullDevice, Session};

use crate::config::RunnerConfig;

pub fn run_server(bind: SocketAddr, config: &RunnerConfig) -> Result<()> {
    let mut session = Session::with_tick_rate(config.tick_rate);
    session
        .go_server(bind)
        .with_context(|| format!("failed to listen on {bind}"))?;
    drive(&mut session, config)
}

/// Headless bot: connects, sends empty input every tick, applies snapshots.
pub fn run_client(server: SocketAddr, config: &RunnerConfig) -> Result<()> {
    let mut session = Session::with_tick_rate(config.tick_rate);
    session.go_client();
    session.add_local_player(Box::new(NullDevice));
    session
        .connect(server)
        .with_context(|| format!("failed to connect to {server}"))?;
    drive(&mut session, config)
}

/// Soak run with one scripted walker, no network at all.
pub fn run_offline(config: &RunnerConfig) -> Result<()> {
    let mut session = Session::with_tick_rate(config.tick_rate);
    session.add_local_player(Box::new(FixedDevice(Actions::MOVE_RIGHT)));
    drive(&mut session, config)
}

fn drive(session: &mut Session, config: &RunnerConfig) -> Result<()> {
    let status_interval = Duration::from_secs(config.status_interval_secs);
    let mut last_frame = Instant::now();
    let mut last_status = Instant::now();

    while session.is_running() {
        let now = Instant::now();
        let delta = (now - last_frame).as_secs_f32();
        last_frame = now;

        session.advance(delta);

        if last_status.elapsed() >= status_interval {
            log::info!(
                "{:?}: {} player(s), {} avatar(s)",
                session.mode(),
                session.players().len(),
                session.world().avatar_count()
            );
            last_status = Instant::now();
        }

        thread::sleep(Duration::from_millis(1));
    }

    session.go_offline();
    Ok(())
}
