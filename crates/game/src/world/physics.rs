//! Default avatar stepper: a single platformer body against a flat floor
//! and the world edges. Sits behind `step_avatar` so the replication core
//! never reaches into the integration details.

use crate::input::Actions;

use super::Avatar;

// Y grows downward; the floor is at the bottom of the playfield.
pub const WORLD_WIDTH: f32 = 800.0;
pub const FLOOR_Y: f32 = 550.0;
pub const AVATAR_SIZE: f32 = 32.0;

pub const MOVE_SPEED: f32 = 300.0;
pub const JUMP_VELOCITY: f32 = -400.0;
pub const GRAVITY: f32 = 980.0;

pub fn step_avatar(avatar: &mut Avatar, actions: Actions, dt: f32) {
    let mut direction = 0.0;
    if actions.contains(Actions::MOVE_RIGHT) {
        direction += 1.0;
    }
    if actions.contains(Actions::MOVE_LEFT) {
        direction -= 1.0;
    }
    avatar.velocity.x = direction * MOVE_SPEED;

    if actions.contains(Actions::JUMP) && avatar.grounded {
        avatar.velocity.y = JUMP_VELOCITY;
        avatar.grounded = false;
    }

    avatar.velocity.y += GRAVITY * dt;
    avatar.position += avatar.velocity * dt;

    avatar.position.x = avatar.position.x.clamp(0.0, WORLD_WIDTH - AVATAR_SIZE);

    let floor = FLOOR_Y - AVATAR_SIZE;
    if avatar.position.y >= floor {
        avatar.position.y = floor;
        avatar.velocity.y = 0.0;
        avatar.grounded = true;
    }
}
