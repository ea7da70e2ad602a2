pub mod framing;
pub mod protocol;
pub mod stream;

pub use framing::{FrameRead, FramedConnection, Listener};
pub use protocol::{
    AvatarRecord, ProtocolError, DEFAULT_PORT, DEFAULT_TICK_RATE, MAX_FRAME_LEN,
    MAX_REMOTE_PLAYERS, MAX_STEPS_PER_FRAME,
};
pub use stream::ByteStream;
