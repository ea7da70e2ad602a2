//! Length-prefixed framing over one non-blocking TCP socket.
//!
//! Every wire message is `[4-byte LE i32 content length][content]`. Receiving
//! is a non-blocking poll: bytes accumulate across reads until a frame
//! completes, at which point its payload is queued and the cursor resets so
//! any immediately-following bytes are drained in the same poll. Only the
//! newest queued frame is ever delivered; both message kinds carried by this
//! protocol are absolute state, so older frames are superseded, not lost.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use super::protocol::{FRAME_HEADER_LEN, MAX_FRAME_LEN};
use super::stream::ByteStream;

/// Wall-clock bound on the graceful-disconnect drain. A frozen peer costs
/// at most this much teardown time.
const DRAIN_DEADLINE: Duration = Duration::from_secs(2);
const DRAIN_READ_TIMEOUT: Duration = Duration::from_millis(250);

/// Bound on how long a send may spin waiting for socket buffer space.
const SEND_DEADLINE: Duration = Duration::from_secs(1);

/// Result of polling a connection for a complete frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRead {
    /// Peer closed or connection already dead; the caller must disconnect.
    Closed,
    /// The newest complete frame's payload was copied into the caller's
    /// stream. Older buffered frames were discarded.
    Ready,
    /// No complete frame yet; the stream is untouched.
    NotReady,
}

/// One live TCP peer with frame reassembly state.
///
/// Ownership is exclusive: a client session holds its single server
/// connection, a server holds one connection inside each remote player.
/// Once disconnected, owners drop their handle; a dead connection is never
/// polled back to life.
#[derive(Debug)]
pub struct FramedConnection {
    socket: TcpStream,
    peer: SocketAddr,
    recv_buf: Vec<u8>,
    received: usize,
    frames: VecDeque<Vec<u8>>,
    connected: bool,
}

impl FramedConnection {
    /// Connects to a listening peer. The connect handshake itself blocks;
    /// everything after runs non-blocking.
    pub fn connect(addr: SocketAddr) -> io::Result<Self> {
        let socket = TcpStream::connect(addr)?;
        let conn = Self::wrap(socket, addr)?;
        log::info!("connected to {addr}");
        Ok(conn)
    }

    fn wrap(socket: TcpStream, peer: SocketAddr) -> io::Result<Self> {
        socket.set_nodelay(true)?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            peer,
            recv_buf: Vec::new(),
            received: 0,
            frames: VecDeque::new(),
            connected: true,
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Sends the stream's contents as one frame, looping until every byte
    /// is queued with the OS or an unrecoverable error occurs.
    pub fn send(&mut self, payload: &ByteStream) -> io::Result<()> {
        if !self.connected {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection is closed",
            ));
        }
        let content = payload.as_slice();
        if content.len() > MAX_FRAME_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "frame exceeds MAX_FRAME_LEN",
            ));
        }

        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + content.len());
        frame.extend_from_slice(&(content.len() as i32).to_le_bytes());
        frame.extend_from_slice(content);

        let deadline = Instant::now() + SEND_DEADLINE;
        let mut sent = 0;
        while sent < frame.len() {
            match self.socket.write(&frame[sent..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "socket refused bytes",
                    ));
                }
                Ok(n) => sent += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "send buffer full",
                        ));
                    }
                    std::thread::yield_now();
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Polls for a complete frame. On `Ready` the newest frame's payload is
    /// appended to `out`; the caller rewinds `out` to decode it.
    pub fn read_into_stream(&mut self, out: &mut ByteStream) -> FrameRead {
        self.poll_socket();

        if !self.connected {
            return FrameRead::Closed;
        }
        let Some(newest) = self.frames.pop_back() else {
            return FrameRead::NotReady;
        };
        if !self.frames.is_empty() {
            log::debug!(
                "discarding {} stale frame(s) from {}",
                self.frames.len(),
                self.peer
            );
            self.frames.clear();
        }
        out.write_bytes(&newest);
        FrameRead::Ready
    }

    // Drains the socket: reads header then body, queueing each completed
    // frame, until the read would block, errors, or the peer closes.
    fn poll_socket(&mut self) {
        if !self.connected {
            return;
        }
        loop {
            let want = if self.received < FRAME_HEADER_LEN {
                FRAME_HEADER_LEN
            } else {
                let mut header = [0u8; FRAME_HEADER_LEN];
                header.copy_from_slice(&self.recv_buf[..FRAME_HEADER_LEN]);
                let declared = i32::from_le_bytes(header);
                if declared < 0 || declared as usize > MAX_FRAME_LEN {
                    log::warn!(
                        "peer {} declared frame length {declared}, closing",
                        self.peer
                    );
                    self.mark_closed();
                    return;
                }
                FRAME_HEADER_LEN + declared as usize
            };

            if self.recv_buf.len() < want {
                self.recv_buf.resize(want, 0);
            }

            if self.received == want {
                // Frame complete: queue the payload and reset, so bytes of a
                // following frame are picked up in this same poll.
                self.frames
                    .push_back(self.recv_buf[FRAME_HEADER_LEN..want].to_vec());
                self.received = 0;
                continue;
            }

            match self.socket.read(&mut self.recv_buf[self.received..want]) {
                // On a non-blocking socket "no data" is WouldBlock below;
                // a zero-length read means the peer performed an orderly
                // shutdown.
                Ok(0) => {
                    log::info!("peer {} closed the connection", self.peer);
                    self.mark_closed();
                    return;
                }
                Ok(n) => self.received += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    log::warn!("read error from {}: {e}", self.peer);
                    self.mark_closed();
                    return;
                }
            }
        }
    }

    // Immediate teardown for peer closure and read errors. Once this runs,
    // `read_into_stream` reports `Closed` forever.
    fn mark_closed(&mut self) {
        self.connected = false;
        let _ = self.socket.shutdown(Shutdown::Both);
        self.recv_buf = Vec::new();
        self.received = 0;
        self.frames.clear();
    }

    /// Graceful teardown: half-close, then drain whatever the peer still has
    /// in flight so the socket closes cleanly. Bounded by `DRAIN_DEADLINE`.
    /// Idempotent.
    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        log::info!("disconnecting from {}", self.peer);

        let _ = self.socket.set_nonblocking(false);
        let _ = self.socket.set_read_timeout(Some(DRAIN_READ_TIMEOUT));
        let _ = self.socket.shutdown(Shutdown::Write);

        let deadline = Instant::now() + DRAIN_DEADLINE;
        let mut scratch = [0u8; 1024];
        while Instant::now() < deadline {
            match self.socket.read(&mut scratch) {
                Ok(0) => break,
                Ok(_) => {}
                Err(_) => break,
            }
        }

        let _ = self.socket.shutdown(Shutdown::Both);
        self.recv_buf = Vec::new();
        self.received = 0;
        self.frames.clear();
    }
}

/// Non-blocking accept wrapper around a `TcpListener`.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local: SocketAddr,
}

impl Listener {
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let inner = TcpListener::bind(addr)?;
        inner.set_nonblocking(true)?;
        let local = inner.local_addr()?;
        Ok(Self { inner, local })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// Accepts one pending connection if there is one.
    pub fn poll_accept(&self) -> io::Result<Option<FramedConnection>> {
        match self.inner.accept() {
            Ok((socket, peer)) => FramedConnection::wrap(socket, peer).map(Some),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}
