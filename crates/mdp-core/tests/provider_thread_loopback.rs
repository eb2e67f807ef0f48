//! Drives a real `ProviderThread` over a loopback socket: a peer connects,
//! logs in, opens a streaming item, and the thread's own tick loop is
//! expected to move the channel from bare accept through to a published
//! refresh, exactly the path the worker thread runs in production.

use std::io::{Read, Write};
use std::net::TcpStream as StdStream;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mdp_core::thread::SessionInbox;
use mdp_core::{ProviderThread, ThreadConfig};
use mdp_stats::ProviderKind;
use mdp_wire::{BincodeCodec, Codec, DomainType, ItemAttributes, MsgClass, MsgKey, WireMessage};

fn thread_config() -> ThreadConfig {
    ThreadConfig {
        ticks_per_sec: 1000,
        updates_per_sec: 0,
        latency_updates_per_sec: 0,
        gen_msgs_per_sec: 0,
        latency_gen_msgs_per_sec: 0,
        refresh_burst_size: 10,
        open_limit: 10,
        service_id: 1,
        max_output_buffers: 16,
        ping_timeout: Duration::from_secs(6),
        packing_buffer_length: 0,
        max_per_pack: 1,
        pre_encode: false,
        measure_encode: false,
        nano_time: false,
        download_dictionaries: true,
        kind: ProviderKind::Interactive,
        ni_item_count: 0,
        ni_common_item_count: 0,
        ni_thread_count: 1,
    }
}

fn send_framed(stream: &mut StdStream, msg: &WireMessage) {
    let mut bytes = Vec::new();
    BincodeCodec.encode_into(msg, &mut bytes).expect("encode");
    let mut framed = Vec::with_capacity(4 + bytes.len());
    framed.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    framed.extend_from_slice(&bytes);
    stream.write_all(&framed).expect("write frame");
}

fn read_one_framed(stream: &mut StdStream) -> Vec<u8> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).expect("read length prefix");
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).expect("read payload");
    payload
}

#[test]
fn accepted_channel_reaches_ready_and_publishes_a_refresh() {
    let bind_addr: std::net::SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut thread = ProviderThread::new(0, bind_addr, thread_config(), Arc::new(SessionInbox::default()), Arc::new(Mutex::new(0))).expect("bind ephemeral port");
    let addr = thread.channels.local_addr().expect("local addr");

    let mut client = StdStream::connect(addr).expect("connect to provider thread");
    client.set_nonblocking(false).expect("blocking client");
    client.set_read_timeout(Some(Duration::from_secs(2))).expect("read timeout");

    // Accept happens on the thread's own tick; no session exists yet.
    thread.tick_once().expect("tick accepts connection");
    assert_eq!(thread.sessions.len(), 1);
    let channel_id = *thread.sessions.keys().next().unwrap();
    assert!(!thread.sessions[&channel_id].readiness.is_ready());

    send_framed(&mut client, &WireMessage::new(1, DomainType::Login, MsgClass::Request));
    send_framed(&mut client, &WireMessage::new(1, DomainType::Source, MsgClass::Request));
    send_framed(
        &mut client,
        &WireMessage::new(1, DomainType::Dictionary, MsgClass::Request).with_dictionary_kind(mdp_wire::DictionaryKind::Field),
    );
    send_framed(
        &mut client,
        &WireMessage::new(1, DomainType::Dictionary, MsgClass::Request).with_dictionary_kind(mdp_wire::DictionaryKind::Enum),
    );

    let attributes = ItemAttributes::new(DomainType::MarketPrice, MsgKey::new("TRI.N".as_bytes(), 1));
    let request = WireMessage::new(5, DomainType::MarketPrice, MsgClass::Request).with_item_attributes(attributes);
    send_framed(&mut client, &request);

    // Give the handshake and item request a few ticks to land; each tick
    // both reads whatever arrived and sends that tick's refresh burst.
    for _ in 0..20 {
        thread.tick_once().expect("tick");
        if thread.sessions[&channel_id].readiness.is_ready() && thread.sessions[&channel_id].items.open_items_count() == 1 {
            break;
        }
    }
    assert!(thread.sessions[&channel_id].readiness.is_ready());
    assert_eq!(thread.sessions[&channel_id].items.open_items_count(), 1);

    let payload = read_one_framed(&mut client);
    let decoded = BincodeCodec.decode(&payload).expect("decode refresh");
    assert_eq!(decoded.stream_id, 5);
    assert_eq!(decoded.domain_type, DomainType::MarketPrice);
}
