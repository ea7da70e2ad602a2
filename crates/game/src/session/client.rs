//! Client-mode tick: sample local input, push it to the server, pull the
//! newest authoritative snapshot. With no server connection the client runs
//! its own local step, so the client code path works without a network.

use crate::net::framing::FrameRead;
use crate::net::protocol;
use crate::net::stream::ByteStream;

use super::{sample_local_actions, ModeState, Session};

impl Session {
    pub(super) fn step_client(&mut self, dt: f32) {
        let actions = sample_local_actions(&mut self.players);

        let ModeState::Client { server } = &mut self.mode else {
            return;
        };

        let Some(mut conn) = server.take() else {
            // No server: local simulation fallback.
            self.world.reconcile(actions.keys().copied());
            self.world.step(&actions, dt);
            return;
        };

        // The wire carries exactly one local player's action vector; with
        // several local players the lowest ID is the one that plays online.
        let primary = actions
            .iter()
            .min_by_key(|(id, _)| **id)
            .map(|(_, act)| *act);
        if let Some(act) = primary {
            let mut out = ByteStream::new();
            protocol::encode_input(act, &mut out);
            if let Err(err) = conn.send(&out) {
                log::warn!("failed to send input to server: {err}");
                conn.disconnect();
                return; // handle stays None; next tick falls back to local sim
            }
        }

        let mut frame = ByteStream::new();
        match conn.read_into_stream(&mut frame) {
            FrameRead::Ready => {
                frame.rewind();
                match protocol::decode_snapshot(&mut frame) {
                    Ok(records) => {
                        self.world.apply_snapshot(&records);
                        *server = Some(conn);
                    }
                    Err(err) => {
                        log::warn!("malformed snapshot from server: {err}");
                        conn.disconnect();
                    }
                }
            }
            FrameRead::NotReady => {
                *server = Some(conn);
            }
            FrameRead::Closed => {
                log::info!("server closed the connection");
                conn.disconnect();
            }
        }
    }
}
