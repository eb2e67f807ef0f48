//! Drives `ChannelHandler` end to end over real loopback sockets: a
//! listening handler accepting a peer-initiated connection, and a
//! `connect`-built handler dialing out to a peer, both resolving through
//! the reactor's `tick()` rather than poking internal state directly.

use std::io::{Read, Write};
use std::net::TcpStream as StdStream;
use std::time::Duration;

use mdp_transport::{ChannelHandler, ChannelState};

fn framed(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

#[test]
fn accept_and_read_round_trips_a_framed_message() {
    let mut handler = ChannelHandler::bind("127.0.0.1:0".parse().unwrap(), 8, Duration::from_secs(6)).expect("bind loopback handler");
    let addr = handler.local_addr().expect("local addr");

    let mut client = StdStream::connect(addr).expect("connect loopback client");
    client.set_nonblocking(true).expect("set nonblocking");

    let tick = handler.tick(Duration::from_millis(200)).expect("tick accepts connection");
    assert_eq!(tick.accepted.len(), 1);
    let channel_id = tick.accepted[0];
    assert!(matches!(handler.channel(channel_id).unwrap().state, ChannelState::Initializing));

    client.write_all(&framed(b"hello")).expect("client write");

    let tick = handler.tick(Duration::from_millis(200)).expect("tick reads frame");
    assert!(tick.readable.contains(&channel_id));

    let messages = handler.channel_mut(channel_id).unwrap().read_all().expect("read_all");
    assert_eq!(messages, vec![b"hello".to_vec()]);
    assert_eq!(handler.channel(channel_id).unwrap().state, ChannelState::Active);
}

#[test]
fn connect_dials_out_to_a_waiting_listener() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind std listener");
    let addr = listener.local_addr().expect("local addr");

    let (mut handler, channel_id) = ChannelHandler::connect(addr, 8, Duration::from_secs(6)).expect("connect outbound");
    let (mut peer, _) = listener.accept().expect("accept outbound connection");
    peer.set_nonblocking(true).expect("set nonblocking");

    peer.write_all(&framed(b"world")).expect("peer write");

    let tick = handler.tick(Duration::from_millis(200)).expect("tick reads frame");
    assert!(tick.accepted.is_empty(), "a connect-built handler never reports accepts");
    assert!(tick.readable.contains(&channel_id));

    let messages = handler.channel_mut(channel_id).unwrap().read_all().expect("read_all");
    assert_eq!(messages, vec![b"world".to_vec()]);

    let mut echo = [0u8; 4];
    let _ = peer.read(&mut echo);
}
