use std::cmp::Ordering;

use glam::Vec2;

use crate::input::Actions;
use crate::player::PlayerId;

use super::stream::ByteStream;

pub const DEFAULT_PORT: u16 = 4242;
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Upper bound on simulation steps run to catch up after a long real frame.
pub const MAX_STEPS_PER_FRAME: u32 = 10;

/// Wire frame header: 4-byte little-endian i32 content length.
pub const FRAME_HEADER_LEN: usize = 4;

/// Sanity bound on a frame's declared content length. Anything larger is
/// protocol desync and kills the connection.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Fixed small pool of remote players a server will accept.
pub const MAX_REMOTE_PLAYERS: usize = 8;

/// Sanity bound on the avatar count declared by a snapshot.
pub const MAX_SNAPSHOT_AVATARS: usize = 32;

/// Bytes per avatar record: u32 id + 2xf32 position + 4xf32 color.
pub const AVATAR_RECORD_LEN: usize = 4 + 8 + 16;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("truncated message: needed {needed} byte(s), had {available}")]
    Truncated { needed: usize, available: usize },
    #[error("avatar count {count} outside 0..={max}")]
    BadAvatarCount { count: i32, max: usize },
    #[error("{0} trailing byte(s) after message body")]
    TrailingBytes(usize),
}

/// One avatar as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvatarRecord {
    pub id: PlayerId,
    pub position: Vec2,
    pub color: [f32; 4],
}

/// Encodes the per-tick action vector: one 4-byte integer (0 or 1) per
/// action, in `Actions::WIRE_ORDER`.
pub fn encode_input(actions: Actions, out: &mut ByteStream) {
    for action in Actions::WIRE_ORDER {
        out.write_i32(actions.contains(action) as i32);
    }
}

pub fn decode_input(input: &mut ByteStream) -> Result<Actions, ProtocolError> {
    let body = Actions::WIRE_ORDER.len() * 4;
    ensure_exact(input, body)?;

    let mut actions = Actions::empty();
    for action in Actions::WIRE_ORDER {
        if input.read_i32() != 0 {
            actions |= action;
        }
    }
    Ok(actions)
}

/// Encodes a world snapshot: avatar count, then one record per avatar.
pub fn encode_snapshot(records: &[AvatarRecord], out: &mut ByteStream) {
    out.write_i32(records.len() as i32);
    for record in records {
        out.write_u32(record.id);
        out.write_f32(record.position.x);
        out.write_f32(record.position.y);
        for channel in record.color {
            out.write_f32(channel);
        }
    }
}

pub fn decode_snapshot(input: &mut ByteStream) -> Result<Vec<AvatarRecord>, ProtocolError> {
    if input.remaining() < 4 {
        return Err(ProtocolError::Truncated {
            needed: 4,
            available: input.remaining(),
        });
    }
    let count = input.read_i32();
    if count < 0 || count as usize > MAX_SNAPSHOT_AVATARS {
        return Err(ProtocolError::BadAvatarCount {
            count,
            max: MAX_SNAPSHOT_AVATARS,
        });
    }

    ensure_exact(input, count as usize * AVATAR_RECORD_LEN)?;

    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let id = input.read_u32();
        let position = Vec2::new(input.read_f32(), input.read_f32());
        let color = [
            input.read_f32(),
            input.read_f32(),
            input.read_f32(),
            input.read_f32(),
        ];
        records.push(AvatarRecord {
            id,
            position,
            color,
        });
    }
    Ok(records)
}

// Remote bytes are validated here, before any `ByteStream` read, so a bad
// peer surfaces as an error instead of tripping the stream's precondition.
fn ensure_exact(input: &ByteStream, body: usize) -> Result<(), ProtocolError> {
    match input.remaining().cmp(&body) {
        Ordering::Less => Err(ProtocolError::Truncated {
            needed: body,
            available: input.remaining(),
        }),
        Ordering::Greater => Err(ProtocolError::TrailingBytes(input.remaining() - body)),
        Ordering::Equal => Ok(()),
    }
}
