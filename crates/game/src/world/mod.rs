pub mod physics;

use std::collections::{HashMap, HashSet};

use glam::Vec2;

use crate::input::Actions;
use crate::net::protocol::AvatarRecord;
use crate::player::PlayerId;

// Spawn colors cycle through a fixed palette keyed by player ID, so server
// and client agree without extra wire traffic. Snapshots still carry color
// and remain authoritative.
const PALETTE: [[f32; 4]; 8] = [
    [0.90, 0.25, 0.25, 1.0],
    [0.25, 0.60, 0.90, 1.0],
    [0.30, 0.80, 0.40, 1.0],
    [0.95, 0.80, 0.25, 1.0],
    [0.75, 0.40, 0.90, 1.0],
    [0.95, 0.55, 0.20, 1.0],
    [0.35, 0.85, 0.80, 1.0],
    [0.90, 0.45, 0.70, 1.0],
];

/// The simulated physical representation of one player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Avatar {
    pub position: Vec2,
    pub velocity: Vec2,
    pub grounded: bool,
    pub color: [f32; 4],
}

impl Avatar {
    pub fn spawn(id: PlayerId) -> Self {
        Self {
            position: Vec2::new(
                physics::WORLD_WIDTH / 2.0,
                physics::FLOOR_Y - physics::AVATAR_SIZE,
            ),
            velocity: Vec2::ZERO,
            grounded: true,
            color: PALETTE[id as usize % PALETTE.len()],
        }
    }
}

/// Avatar set keyed by player ID, the same ID used by the player table and
/// connection ownership, so the maps stay logically joined.
#[derive(Debug, Default)]
pub struct World {
    avatars: HashMap<PlayerId, Avatar>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn avatar(&self, id: PlayerId) -> Option<&Avatar> {
        self.avatars.get(&id)
    }

    pub fn avatar_count(&self) -> usize {
        self.avatars.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &Avatar)> {
        self.avatars.iter().map(|(&id, avatar)| (id, avatar))
    }

    /// Syncs the avatar set to the active player set: spawn-on-join,
    /// despawn-on-leave. Runs before physics each tick so a joining player
    /// is simulated the tick it appears and a leaving one gets no extra
    /// step.
    pub fn reconcile<I>(&mut self, active: I)
    where
        I: IntoIterator<Item = PlayerId>,
    {
        let active: HashSet<PlayerId> = active.into_iter().collect();
        self.avatars.retain(|id, _| active.contains(id));
        for id in active {
            self.avatars.entry(id).or_insert_with(|| Avatar::spawn(id));
        }
    }

    /// Steps every avatar with its player's actions. Avatars with no entry
    /// in `actions` step with an empty bitset.
    pub fn step(&mut self, actions: &HashMap<PlayerId, Actions>, dt: f32) {
        for (id, avatar) in &mut self.avatars {
            let act = actions.get(id).copied().unwrap_or_default();
            physics::step_avatar(avatar, act, dt);
        }
    }

    /// Wire records for the current state, ordered by ID so identical worlds
    /// serialize to identical bytes.
    pub fn snapshot_records(&self) -> Vec<AvatarRecord> {
        let mut records: Vec<AvatarRecord> = self
            .avatars
            .iter()
            .map(|(&id, avatar)| AvatarRecord {
                id,
                position: avatar.position,
                color: avatar.color,
            })
            .collect();
        records.sort_unstable_by_key(|record| record.id);
        records
    }

    /// Replaces local state with an authoritative snapshot: unseen IDs are
    /// added, absent IDs removed, present ones overwritten.
    pub fn apply_snapshot(&mut self, records: &[AvatarRecord]) {
        self.avatars
            .retain(|id, _| records.iter().any(|r| r.id == *id));
        for record in records {
            let avatar = self
                .avatars
                .entry(record.id)
                .or_insert_with(|| Avatar::spawn(record.id));
            avatar.position = record.position;
            avatar.color = record.color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(world: &World) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = world.iter().map(|(id, _)| id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn reconcile_matches_active_set_exactly() {
        let mut world = World::new();
        world.reconcile([1, 2, 3]);
        assert_eq!(ids(&world), vec![1, 2, 3]);

        // 2 left, 4 joined.
        world.reconcile([1, 3, 4]);
        assert_eq!(ids(&world), vec![1, 3, 4]);

        world.reconcile([]);
        assert_eq!(world.avatar_count(), 0);
    }

    #[test]
    fn reconcile_preserves_surviving_avatars() {
        let mut world = World::new();
        world.reconcile([1]);

        let actions = HashMap::from([(1, Actions::MOVE_RIGHT)]);
        world.step(&actions, 1.0 / 60.0);
        let moved = world.avatar(1).unwrap().position;

        world.reconcile([1, 2]);
        assert_eq!(world.avatar(1).unwrap().position, moved);
    }

    #[test]
    fn step_only_moves_actioned_avatars_horizontally() {
        let mut world = World::new();
        world.reconcile([1, 2]);

        let spawn_x = world.avatar(1).unwrap().position.x;
        let actions = HashMap::from([(1, Actions::MOVE_RIGHT)]);
        world.step(&actions, 1.0 / 60.0);

        assert!(world.avatar(1).unwrap().position.x > spawn_x);
        assert_eq!(world.avatar(2).unwrap().position.x, spawn_x);
    }

    #[test]
    fn snapshot_records_are_ordered_by_id() {
        let mut world = World::new();
        world.reconcile([9, 2, 5]);

        let record_ids: Vec<PlayerId> =
            world.snapshot_records().iter().map(|r| r.id).collect();
        assert_eq!(record_ids, vec![2, 5, 9]);
    }

    #[test]
    fn apply_snapshot_adds_removes_and_overwrites() {
        let mut world = World::new();
        world.reconcile([1, 2]);

        let records = vec![
            AvatarRecord {
                id: 2,
                position: Vec2::new(50.0, 60.0),
                color: [0.0, 0.0, 0.0, 1.0],
            },
            AvatarRecord {
                id: 7,
                position: Vec2::new(70.0, 80.0),
                color: [1.0, 1.0, 1.0, 1.0],
            },
        ];
        world.apply_snapshot(&records);

        assert_eq!(ids(&world), vec![2, 7]);
        assert_eq!(world.avatar(2).unwrap().position, Vec2::new(50.0, 60.0));
        assert_eq!(world.avatar(2).unwrap().color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(world.avatar(7).unwrap().position, Vec2::new(70.0, 80.0));
    }

    #[test]
    fn spawn_color_is_deterministic_per_id() {
        assert_eq!(Avatar::spawn(3).color, Avatar::spawn(3).color);
        assert_ne!(Avatar::spawn(3).color, Avatar::spawn(4).color);
    }
}
