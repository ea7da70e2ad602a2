//! Top-level session: network mode state machine plus the fixed-step drive.
//!
//! One `Session` is constructed at startup and threaded explicitly through
//! the loop that owns it; there are no globals. Exactly one mode is active
//! at a time, and switching modes fully tears down the previous mode's
//! network resources before the new mode exists.

mod client;
mod server;

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;

use crate::input::{Actions, InputDevice};
use crate::net::framing::{FramedConnection, Listener};
use crate::net::protocol::DEFAULT_TICK_RATE;
use crate::player::{PlayerId, PlayerTable};
use crate::simulation::FixedTimestep;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMode {
    Offline,
    Client,
    Server,
}

// The mode tag and the mode's resources live in one enum, so the public
// `NetworkMode` can never disagree with which resources exist.
enum ModeState {
    Offline,
    Client {
        server: Option<FramedConnection>,
    },
    Server {
        listener: Listener,
        remotes: Vec<PlayerId>,
    },
}

pub struct Session {
    running: bool,
    timestep: FixedTimestep,
    mode: ModeState,
    players: PlayerTable,
    world: World,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_tick_rate(DEFAULT_TICK_RATE)
    }

    pub fn with_tick_rate(tick_rate: u32) -> Self {
        Self {
            running: true,
            timestep: FixedTimestep::new(tick_rate),
            mode: ModeState::Offline,
            players: PlayerTable::new(),
            world: World::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn mode(&self) -> NetworkMode {
        match self.mode {
            ModeState::Offline => NetworkMode::Offline,
            ModeState::Client { .. } => NetworkMode::Client,
            ModeState::Server { .. } => NetworkMode::Server,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn players(&self) -> &PlayerTable {
        &self.players
    }

    pub fn tick_dt(&self) -> f32 {
        self.timestep.dt()
    }

    /// Address the server mode is listening on, if any.
    pub fn listen_addr(&self) -> Option<SocketAddr> {
        match &self.mode {
            ModeState::Server { listener, .. } => Some(listener.local_addr()),
            _ => None,
        }
    }

    /// Whether the client mode currently holds a live server connection.
    pub fn is_connected(&self) -> bool {
        matches!(&self.mode, ModeState::Client { server: Some(_) })
    }

    pub fn add_local_player(&mut self, device: Box<dyn InputDevice>) -> PlayerId {
        let id = self.players.add_local(device);
        log::info!("local player {id} added");
        id
    }

    pub fn remove_player(&mut self, id: PlayerId) {
        if self.players.remove(id) {
            if let ModeState::Server { remotes, .. } = &mut self.mode {
                remotes.retain(|&r| r != id);
            }
            log::info!("player {id} removed");
        }
    }

    /// Switches to OFFLINE, tearing down whatever the current mode owns.
    /// Always safe, idempotent.
    pub fn go_offline(&mut self) {
        self.teardown_mode();
    }

    /// Switches to CLIENT with no server connection yet; `connect`
    /// establishes one separately.
    pub fn go_client(&mut self) {
        self.teardown_mode();
        self.mode = ModeState::Client { server: None };
        log::info!("entered client mode");
    }

    /// Switches to SERVER and starts listening on `bind`.
    ///
    /// On bind failure the previous mode has already been torn down and the
    /// session is left OFFLINE: the caller observes the failure through the
    /// returned error, never through half-built server state.
    pub fn go_server(&mut self, bind: SocketAddr) -> io::Result<()> {
        self.teardown_mode();
        let listener = Listener::bind(bind).inspect_err(|err| {
            log::error!("failed to listen on {bind}: {err}");
        })?;
        log::info!("entered server mode, listening on {}", listener.local_addr());
        self.mode = ModeState::Server {
            listener,
            remotes: Vec::new(),
        };
        Ok(())
    }

    /// Establishes the client's server connection (blocking handshake).
    /// Only valid in client mode; replaces any previous connection.
    pub fn connect(&mut self, addr: SocketAddr) -> io::Result<()> {
        let ModeState::Client { server } = &mut self.mode else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "connect is only valid in client mode",
            ));
        };
        if let Some(mut old) = server.take() {
            old.disconnect();
        }
        let conn = FramedConnection::connect(addr).inspect_err(|err| {
            log::error!("failed to connect to {addr}: {err}");
        })?;
        *server = Some(conn);
        Ok(())
    }

    fn teardown_mode(&mut self) {
        match std::mem::replace(&mut self.mode, ModeState::Offline) {
            ModeState::Offline => {}
            ModeState::Client { server } => {
                if let Some(mut conn) = server {
                    conn.disconnect();
                }
                log::info!("left client mode");
            }
            ModeState::Server { listener, remotes } => {
                for id in remotes {
                    self.players.remove(id);
                }
                log::info!(
                    "left server mode, stopped listening on {}",
                    listener.local_addr()
                );
            }
        }
    }

    /// Feeds elapsed real time to the scheduler and runs the simulation
    /// steps that fall due. Returns how many steps ran.
    pub fn advance(&mut self, delta: f32) -> u32 {
        self.timestep.accumulate(delta);
        let steps = self.timestep.drain_steps();
        let dt = self.timestep.dt();
        for _ in 0..steps {
            self.step_once(dt);
        }
        steps
    }

    // Within one tick: input collection, then physics, then snapshot
    // traffic. Later stages read state written by earlier ones.
    fn step_once(&mut self, dt: f32) {
        match self.mode() {
            NetworkMode::Offline => self.step_offline(dt),
            NetworkMode::Client => self.step_client(dt),
            NetworkMode::Server => self.step_server(dt),
        }
    }

    fn step_offline(&mut self, dt: f32) {
        let actions = sample_local_actions(&mut self.players);
        self.world.reconcile(actions.keys().copied());
        self.world.step(&actions, dt);
    }
}

fn sample_local_actions(players: &mut PlayerTable) -> HashMap<PlayerId, Actions> {
    let mut actions = HashMap::new();
    for player in players.iter_mut() {
        if !player.is_remote() {
            player.sample();
            actions.insert(player.id(), player.actions());
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FixedDevice;

    #[test]
    fn starts_offline_and_running() {
        let session = Session::new();
        assert_eq!(session.mode(), NetworkMode::Offline);
        assert!(session.is_running());
        assert!(!session.is_connected());
    }

    #[test]
    fn offline_transition_is_idempotent() {
        let mut session = Session::new();
        session.go_offline();
        session.go_offline();
        assert_eq!(session.mode(), NetworkMode::Offline);
    }

    #[test]
    fn connect_outside_client_mode_is_rejected() {
        let mut session = Session::new();
        let err = session.connect("127.0.0.1:4242".parse().unwrap());
        assert!(err.is_err());
    }

    #[test]
    fn advance_runs_the_steps_due() {
        let mut session = Session::with_tick_rate(4);
        session.add_local_player(Box::new(FixedDevice(Actions::empty())));

        assert_eq!(session.advance(0.1), 0);
        assert_eq!(session.advance(0.15), 1);
        assert_eq!(session.advance(0.5), 2);
    }
}
