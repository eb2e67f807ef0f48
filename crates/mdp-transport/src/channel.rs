use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use mio::net::TcpStream;
use tracing::warn;

use crate::buffer::Buffer;
use crate::error::{TransportError, WriteOutcome};

/// Channel lifecycle states (spec.md §4.D). `Initializing` covers both the
/// TCP connect and any handshake bytes; once the first application
/// message has been read or written the channel is `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Initializing,
    Active,
    Inactive,
}

/// Ping/pong supervision intervals (spec.md §4.D: `sendInterval =
/// pingTimeout / 3`, `recvInterval = pingTimeout`).
#[derive(Debug, Clone, Copy)]
pub struct PingSchedule {
    pub send_interval: Duration,
    pub recv_interval: Duration,
}

impl PingSchedule {
    pub fn from_timeout(ping_timeout: Duration) -> Self {
        PingSchedule {
            send_interval: ping_timeout / 3,
            recv_interval: ping_timeout,
        }
    }
}

/// One connected peer's raw transport plumbing: the socket, its output
/// buffer pool ceiling, and ping bookkeeping. Framing is a 4-byte
/// big-endian length prefix followed by the `mdp-wire` codec payload.
pub struct ChannelInfo {
    stream: TcpStream,
    pub state: ChannelState,
    max_output_buffers: usize,
    buffers_in_flight: usize,
    pending_writes: VecDeque<Vec<u8>>,
    pub need_flush: bool,
    read_buf: Vec<u8>,
    ping_schedule: PingSchedule,
    last_ping_sent: Instant,
    last_msg_received: Instant,
    pub pings_sent: u64,
    pub pings_received: u64,
}

impl ChannelInfo {
    pub fn new(stream: TcpStream, max_output_buffers: usize, ping_timeout: Duration) -> Self {
        let now = Instant::now();
        ChannelInfo {
            stream,
            state: ChannelState::Initializing,
            max_output_buffers,
            buffers_in_flight: 0,
            pending_writes: VecDeque::new(),
            need_flush: false,
            read_buf: Vec::with_capacity(8192),
            ping_schedule: PingSchedule::from_timeout(ping_timeout),
            last_ping_sent: now,
            last_msg_received: now,
            pings_sent: 0,
            pings_received: 0,
        }
    }

    pub fn mio_stream(&self) -> &TcpStream {
        &self.stream
    }

    pub fn mio_stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Promotes `Initializing` to `Active` on the first application
    /// message read or written (spec.md §4.D). A no-op once the channel
    /// is already `Active` or has gone `Inactive`.
    fn mark_active(&mut self) {
        if self.state == ChannelState::Initializing {
            self.state = ChannelState::Active;
        }
    }

    pub fn initialize(&mut self) -> Result<bool, TransportError> {
        match self.stream.peer_addr() {
            Ok(_) => {
                self.state = ChannelState::Active;
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(false),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    /// Acquires a fresh output buffer, enforcing `maxOutputBuffers`
    /// (spec.md §4.G "BUFFER_NO_BUFFERS" contract).
    pub fn get_buffer(&mut self, length: usize, packable: bool) -> Result<Buffer, WriteOutcome> {
        if self.buffers_in_flight >= self.max_output_buffers {
            return Err(WriteOutcome::NoBuffers);
        }
        self.buffers_in_flight += 1;
        Ok(Buffer::new(length, packable))
    }

    /// Attempts to write a finalized buffer's bytes with a big-endian
    /// length-prefix frame, queuing any unwritten remainder.
    pub fn write_buffer(&mut self, buf: &Buffer) -> WriteOutcome {
        self.buffers_in_flight = self.buffers_in_flight.saturating_sub(1);
        if buf.is_empty() {
            return WriteOutcome::Success;
        }

        let mut framed = Vec::with_capacity(4 + buf.as_bytes().len());
        framed.extend_from_slice(&(buf.as_bytes().len() as u32).to_be_bytes());
        framed.extend_from_slice(buf.as_bytes());

        if !self.pending_writes.is_empty() {
            self.pending_writes.push_back(framed);
            return WriteOutcome::FlushPending;
        }

        match self.try_write(&framed) {
            Ok(0) => WriteOutcome::Success,
            Ok(n) if n == framed.len() => {
                self.mark_active();
                WriteOutcome::Success
            }
            Ok(n) => {
                self.mark_active();
                self.pending_writes.push_back(framed[n..].to_vec());
                WriteOutcome::FlushPending
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.pending_writes.push_back(framed);
                WriteOutcome::FlushPending
            }
            Err(e) => {
                warn!(error = %e, "channel write failed");
                WriteOutcome::Fatal
            }
        }
    }

    fn try_write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.stream.write(data)
    }

    /// Drains queued bytes (spec.md §4.G "flush()"). Called after
    /// `FlushPending` is returned, typically from the per-tick ping/flush
    /// pass rather than inline with the write that produced it.
    pub fn flush_now(&mut self) -> WriteOutcome {
        while let Some(front) = self.pending_writes.pop_front() {
            match self.try_write(&front) {
                Ok(n) if n == front.len() => continue,
                Ok(n) => {
                    self.pending_writes.push_front(front[n..].to_vec());
                    return WriteOutcome::CallAgain;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.pending_writes.push_front(front);
                    return WriteOutcome::CallAgain;
                }
                Err(e) => {
                    warn!(error = %e, "channel flush failed");
                    return WriteOutcome::Fatal;
                }
            }
        }
        self.need_flush = false;
        WriteOutcome::Success
    }

    /// Reads all fully-framed messages currently available without
    /// blocking (spec.md §4.D "readAll"). Returns raw payload bytes per
    /// message; the caller decodes with the wire codec.
    pub fn read_all(&mut self) -> Result<Vec<Vec<u8>>, TransportError> {
        let mut chunk = [0u8; 8192];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    self.state = ChannelState::Inactive;
                    break;
                }
                Ok(n) => {
                    self.mark_active();
                    self.read_buf.extend_from_slice(&chunk[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(TransportError::Io(e)),
            }
        }

        let mut messages = Vec::new();
        loop {
            if self.read_buf.len() < 4 {
                break;
            }
            let len = u32::from_be_bytes(self.read_buf[0..4].try_into().unwrap()) as usize;
            if self.read_buf.len() < 4 + len {
                break;
            }
            let payload = self.read_buf[4..4 + len].to_vec();
            self.read_buf.drain(0..4 + len);
            messages.push(payload);
        }

        if !messages.is_empty() {
            self.last_msg_received = Instant::now();
        }
        Ok(messages)
    }

    /// Ping-timeout supervision (spec.md §4.D "checkPings"): sends a
    /// zero-length ping frame on `sendInterval`, and reports whether the
    /// peer has gone silent past `recvInterval`. Disabled for channels not
    /// yet `Active` (spec.md §3 "checkPings — disabled for channels not
    /// yet active"): a channel still mid-handshake hasn't started its
    /// liveness clock.
    pub fn check_pings(&mut self, now: Instant) -> Result<bool, TransportError> {
        if self.state != ChannelState::Active {
            return Ok(true);
        }
        if now.duration_since(self.last_msg_received) > self.ping_schedule.recv_interval {
            return Ok(false);
        }
        if now.duration_since(self.last_ping_sent) >= self.ping_schedule.send_interval {
            let frame = 0u32.to_be_bytes();
            match self.try_write(&frame) {
                Ok(_) => {
                    self.pings_sent += 1;
                    self.last_ping_sent = now;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.pending_writes.push_back(frame.to_vec());
                    self.last_ping_sent = now;
                }
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        Ok(true)
    }

    pub fn note_ping_received(&mut self) {
        self.pings_received += 1;
        self.last_msg_received = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{TcpListener as StdListener, TcpStream as StdStream};

    fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = StdListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = StdStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        client.set_nonblocking(true).unwrap();
        server.set_nonblocking(true).unwrap();
        (TcpStream::from_std(server), TcpStream::from_std(client))
    }

    #[test]
    fn out_of_buffers_once_in_flight_cap_is_reached() {
        let (server, _client) = connected_pair();
        let mut chan = ChannelInfo::new(server, 1, Duration::from_secs(30));
        assert!(chan.get_buffer(16, false).is_ok());
        assert_eq!(chan.get_buffer(16, false).unwrap_err(), WriteOutcome::NoBuffers);
    }

    #[test]
    fn write_then_read_round_trips_a_framed_message() {
        let (server, client) = connected_pair();
        let mut buf = Buffer::new(16, false);
        {
            let slot = buf.write_slot(5).unwrap();
            slot.copy_from_slice(b"hello");
        }
        buf.commit(5);

        let mut chan = ChannelInfo::new(server, 10, Duration::from_secs(30));
        let outcome = chan.write_buffer(&buf);
        assert!(matches!(outcome, WriteOutcome::Success | WriteOutcome::FlushPending));
        chan.flush_now();

        std::thread::sleep(Duration::from_millis(50));
        let mut peer = ChannelInfo::new(client, 10, Duration::from_secs(30));
        let msgs = peer.read_all().unwrap();
        assert_eq!(msgs, vec![b"hello".to_vec()]);
    }
}
