use std::collections::HashMap;

use crate::input::{Actions, InputDevice};
use crate::net::framing::{FrameRead, FramedConnection};
use crate::net::protocol;
use crate::net::stream::ByteStream;

pub type PlayerId = u32;

/// Where a player's per-tick actions come from.
pub enum PlayerSource {
    /// A local input device, sampled directly.
    Local(Box<dyn InputDevice>),
    /// A remote peer whose connection delivers input frames.
    Remote(FramedConnection),
}

/// One participant, local or remote, with its current action bitset.
pub struct Player {
    id: PlayerId,
    actions: Actions,
    source: PlayerSource,
}

impl Player {
    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn actions(&self) -> Actions {
        self.actions
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.source, PlayerSource::Remote(_))
    }

    pub fn connection_mut(&mut self) -> Option<&mut FramedConnection> {
        match &mut self.source {
            PlayerSource::Remote(conn) => Some(conn),
            PlayerSource::Local(_) => None,
        }
    }

    /// Samples this player's input source for the current tick.
    ///
    /// Local players read their device. Remote players poll their connection
    /// and keep the previous bitset when no new frame arrived. Returns
    /// `false` when a remote player's connection is gone and the player
    /// should be removed.
    pub fn sample(&mut self) -> bool {
        match &mut self.source {
            PlayerSource::Local(device) => {
                self.actions = device.poll();
                true
            }
            PlayerSource::Remote(conn) => {
                let mut frame = ByteStream::new();
                match conn.read_into_stream(&mut frame) {
                    FrameRead::Ready => {
                        frame.rewind();
                        match protocol::decode_input(&mut frame) {
                            Ok(actions) => {
                                self.actions = actions;
                                true
                            }
                            Err(err) => {
                                log::warn!(
                                    "bad input frame from {}: {err}",
                                    conn.peer()
                                );
                                conn.disconnect();
                                false
                            }
                        }
                    }
                    FrameRead::NotReady => true,
                    FrameRead::Closed => false,
                }
            }
        }
    }
}

/// ID-indexed player table. IDs increase monotonically and are never
/// reused for the lifetime of the process.
pub struct PlayerTable {
    players: HashMap<PlayerId, Player>,
    next_id: PlayerId,
}

impl Default for PlayerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerTable {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn add_local(&mut self, device: Box<dyn InputDevice>) -> PlayerId {
        self.add(PlayerSource::Local(device))
    }

    pub fn add_remote(&mut self, connection: FramedConnection) -> PlayerId {
        self.add(PlayerSource::Remote(connection))
    }

    fn add(&mut self, source: PlayerSource) -> PlayerId {
        let id = self.next_id;
        self.next_id += 1;
        self.players.insert(
            id,
            Player {
                id,
                actions: Actions::empty(),
                source,
            },
        );
        id
    }

    /// Removes a player, disconnecting its connection if it was remote.
    /// Returns `false` if the ID was not present.
    pub fn remove(&mut self, id: PlayerId) -> bool {
        let Some(mut player) = self.players.remove(&id) else {
            return false;
        };
        if let PlayerSource::Remote(conn) = &mut player.source {
            conn.disconnect();
        }
        true
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    pub fn local_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| !p.is_remote())
            .map(Player::id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn remote_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| p.is_remote())
            .map(Player::id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FixedDevice;

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut table = PlayerTable::new();
        let a = table.add_local(Box::new(FixedDevice(Actions::empty())));
        let b = table.add_local(Box::new(FixedDevice(Actions::empty())));
        assert!(b > a);

        assert!(table.remove(a));
        let c = table.add_local(Box::new(FixedDevice(Actions::empty())));
        assert!(c > b);
        assert!(!table.contains(a));
    }

    #[test]
    fn local_sample_reads_the_device() {
        let mut table = PlayerTable::new();
        let id = table.add_local(Box::new(FixedDevice(Actions::MOVE_LEFT)));

        let player = table.get_mut(id).unwrap();
        assert_eq!(player.actions(), Actions::empty());
        assert!(player.sample());
        assert_eq!(player.actions(), Actions::MOVE_LEFT);
    }

    #[test]
    fn remove_missing_is_a_no_op() {
        let mut table = PlayerTable::new();
        assert!(!table.remove(99));
    }
}
