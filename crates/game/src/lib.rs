pub mod input;
pub mod net;
pub mod player;
pub mod session;
pub mod simulation;
pub mod world;

pub use input::{Actions, FixedDevice, InputDevice, NullDevice};
pub use net::{
    AvatarRecord, ByteStream, FrameRead, FramedConnection, Listener, ProtocolError,
    DEFAULT_PORT, DEFAULT_TICK_RATE, MAX_FRAME_LEN, MAX_REMOTE_PLAYERS, MAX_STEPS_PER_FRAME,
};
pub use player::{Player, PlayerId, PlayerSource, PlayerTable};
pub use session::{NetworkMode, Session};
pub use simulation::FixedTimestep;
pub use world::{Avatar, World};
