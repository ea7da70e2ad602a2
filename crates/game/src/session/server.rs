//! Server-mode tick: poll remote input, step the authoritative world,
//! accept joiners, broadcast one snapshot to every remote connection.

use std::collections::HashMap;

use crate::input::Actions;
use crate::net::protocol::{self, MAX_REMOTE_PLAYERS};
use crate::net::stream::ByteStream;
use crate::player::PlayerId;

use super::{ModeState, Session};

impl Session {
    pub(super) fn step_server(&mut self, dt: f32) {
        // Input collection, remote and local. A dead connection removes its
        // player here, before reconciliation, so the leaver gets no extra
        // physics step.
        let mut dead: Vec<PlayerId> = Vec::new();
        for player in self.players.iter_mut() {
            if !player.sample() {
                dead.push(player.id());
            }
        }
        for id in dead {
            log::info!("player {id} disconnected");
            self.remove_player(id);
        }

        let actions: HashMap<PlayerId, Actions> = self
            .players
            .iter()
            .map(|p| (p.id(), p.actions()))
            .collect();

        self.world.reconcile(actions.keys().copied());
        self.world.step(&actions, dt);

        let ModeState::Server { listener, remotes } = &mut self.mode else {
            return;
        };

        // Newly completed inbound connections become remote players; their
        // avatars spawn in the next tick's reconciliation.
        loop {
            match listener.poll_accept() {
                Ok(Some(conn)) => {
                    if remotes.len() >= MAX_REMOTE_PLAYERS {
                        // Dropping closes the socket immediately; a graceful
                        // drain would stall the tick on a peer we never
                        // accepted.
                        log::warn!("rejecting {}: player pool full", conn.peer());
                        continue;
                    }
                    let peer = conn.peer();
                    let id = self.players.add_remote(conn);
                    remotes.push(id);
                    log::info!("player {id} joined from {peer}");
                }
                Ok(None) => break,
                Err(err) => {
                    log::warn!("accept failed: {err}");
                    break;
                }
            }
        }

        // One serialization, identical bytes to every remote. With zero
        // remotes the snapshot is simply discarded.
        let records = self.world.snapshot_records();
        let mut snapshot = ByteStream::new();
        protocol::encode_snapshot(&records, &mut snapshot);

        let mut dead: Vec<PlayerId> = Vec::new();
        for &id in remotes.iter() {
            let Some(conn) = self.players.get_mut(id).and_then(|p| p.connection_mut())
            else {
                continue;
            };
            if let Err(err) = conn.send(&snapshot) {
                log::warn!("dropping player {id}: snapshot send failed: {err}");
                dead.push(id);
            }
        }
        for id in dead {
            self.remove_player(id);
        }
    }
}
