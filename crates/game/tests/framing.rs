//! Framed-connection behavior over real localhost TCP sockets.

use std::io::Write;
use std::net::TcpStream;
use std::thread;
use std::time::{Duration, Instant};

use hopper::{ByteStream, FrameRead, FramedConnection, Listener, MAX_FRAME_LEN};

fn listener() -> Listener {
    Listener::bind("127.0.0.1:0".parse().unwrap()).unwrap()
}

fn accept(listener: &Listener, timeout_ms: u64) -> FramedConnection {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        if let Some(conn) = listener.poll_accept().unwrap() {
            return conn;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("no inbound connection within {timeout_ms} ms");
}

/// Connected pair: (outbound side, accepted side).
fn framed_pair() -> (FramedConnection, FramedConnection) {
    let listener = listener();
    let outbound = FramedConnection::connect(listener.local_addr()).unwrap();
    let accepted = accept(&listener, 1000);
    (outbound, accepted)
}

fn recv_ready(conn: &mut FramedConnection, timeout_ms: u64) -> Vec<u8> {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        let mut stream = ByteStream::new();
        match conn.read_into_stream(&mut stream) {
            FrameRead::Ready => return stream.as_slice().to_vec(),
            FrameRead::NotReady => thread::sleep(Duration::from_millis(1)),
            FrameRead::Closed => panic!("connection closed while waiting for a frame"),
        }
    }
    panic!("no frame within {timeout_ms} ms");
}

fn wait_closed(conn: &mut FramedConnection, timeout_ms: u64) {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        let mut stream = ByteStream::new();
        if conn.read_into_stream(&mut stream) == FrameRead::Closed {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("connection not closed within {timeout_ms} ms");
}

#[test]
fn frame_round_trips_byte_equal() {
    let (mut sender, mut receiver) = framed_pair();

    let mut payload = ByteStream::new();
    payload.write_u32(0xDEAD_BEEF);
    payload.write_bytes(b"hello frames");
    sender.send(&payload).unwrap();

    let received = recv_ready(&mut receiver, 1000);
    assert_eq!(received, payload.as_slice());
}

#[test]
fn empty_frame_is_delivered() {
    let (mut sender, mut receiver) = framed_pair();

    sender.send(&ByteStream::new()).unwrap();
    let received = recv_ready(&mut receiver, 1000);
    assert!(received.is_empty());
}

#[test]
fn split_body_completes_only_when_all_bytes_arrive() {
    let listener = listener();
    let mut raw = TcpStream::connect(listener.local_addr()).unwrap();
    raw.set_nodelay(true).unwrap();
    let mut receiver = accept(&listener, 1000);

    let body = *b"deadbeef";
    raw.write_all(&(body.len() as i32).to_le_bytes()).unwrap();
    raw.flush().unwrap();

    // Header alone: not a frame.
    thread::sleep(Duration::from_millis(50));
    let mut stream = ByteStream::new();
    assert_eq!(receiver.read_into_stream(&mut stream), FrameRead::NotReady);

    // Half the body: still not a frame.
    raw.write_all(&body[..4]).unwrap();
    raw.flush().unwrap();
    thread::sleep(Duration::from_millis(50));
    let mut stream = ByteStream::new();
    assert_eq!(receiver.read_into_stream(&mut stream), FrameRead::NotReady);

    // Remainder: exactly one complete frame.
    raw.write_all(&body[4..]).unwrap();
    raw.flush().unwrap();
    assert_eq!(recv_ready(&mut receiver, 1000), body);

    let mut stream = ByteStream::new();
    assert_eq!(receiver.read_into_stream(&mut stream), FrameRead::NotReady);
}

#[test]
fn newest_of_several_buffered_frames_wins() {
    let (mut sender, mut receiver) = framed_pair();

    for tag in 1..=3u32 {
        let mut payload = ByteStream::new();
        payload.write_u32(tag);
        sender.send(&payload).unwrap();
    }

    // Let all three land in the receiver's OS buffer before the first poll.
    thread::sleep(Duration::from_millis(100));

    let mut stream = ByteStream::new();
    assert_eq!(receiver.read_into_stream(&mut stream), FrameRead::Ready);
    stream.rewind();
    assert_eq!(stream.read_u32(), 3);

    let mut stream = ByteStream::new();
    assert_eq!(receiver.read_into_stream(&mut stream), FrameRead::NotReady);
}

#[test]
fn orderly_shutdown_reports_closed_forever() {
    let (sender, mut receiver) = framed_pair();

    drop(sender);
    wait_closed(&mut receiver, 1000);

    // Once closed, a connection never reports anything else.
    for _ in 0..5 {
        let mut stream = ByteStream::new();
        assert_eq!(receiver.read_into_stream(&mut stream), FrameRead::Closed);
    }
    assert!(!receiver.is_connected());
}

#[test]
fn absurd_declared_length_kills_the_connection() {
    let listener = listener();
    let mut raw = TcpStream::connect(listener.local_addr()).unwrap();
    let mut receiver = accept(&listener, 1000);

    raw.write_all(&((MAX_FRAME_LEN as i32) + 1).to_le_bytes())
        .unwrap();
    raw.flush().unwrap();

    wait_closed(&mut receiver, 1000);
}

#[test]
fn negative_declared_length_kills_the_connection() {
    let listener = listener();
    let mut raw = TcpStream::connect(listener.local_addr()).unwrap();
    let mut receiver = accept(&listener, 1000);

    raw.write_all(&(-1i32).to_le_bytes()).unwrap();
    raw.flush().unwrap();

    wait_closed(&mut receiver, 1000);
}

#[test]
fn disconnect_is_idempotent_and_bounded() {
    let (sender, mut receiver) = framed_pair();

    // Peer goes away; our disconnect drains, observes the close and returns
    // promptly. Calling it again is a no-op.
    drop(sender);
    let start = Instant::now();
    receiver.disconnect();
    receiver.disconnect();
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(!receiver.is_connected());

    let mut stream = ByteStream::new();
    assert_eq!(receiver.read_into_stream(&mut stream), FrameRead::Closed);
}
