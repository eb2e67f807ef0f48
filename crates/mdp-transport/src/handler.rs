use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use slab::Slab;
use tracing::{info, warn};

use crate::channel::ChannelInfo;
use crate::error::TransportError;

const LISTENER_TOKEN: Token = Token(usize::MAX);

/// One `tick()`'s worth of socket activity: channels that just finished
/// their TCP accept/connect this call, and channels with existing
/// sessions that have bytes to read (spec.md §4.D "add"/"initialize"
/// folded into the accept loop).
#[derive(Debug, Default)]
pub struct TickResult {
    pub accepted: Vec<usize>,
    pub readable: Vec<usize>,
}

/// Owns the `mio` reactor and the arena of connected channels (spec.md
/// §4.D "ChannelHandler"). Index-based arena rather than raw pointers,
/// per spec.md §9's arena guidance. `listener` is `None` for a handler
/// built with `connect` (spec.md §2 non-interactive providers dial out
/// instead of accepting).
pub struct ChannelHandler {
    poll: Poll,
    listener: Option<TcpListener>,
    channels: Slab<ChannelInfo>,
    max_output_buffers: usize,
    ping_timeout: Duration,
}

impl ChannelHandler {
    pub fn bind(addr: SocketAddr, max_output_buffers: usize, ping_timeout: Duration) -> io::Result<Self> {
        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(addr)?;
        poll.registry()
            .register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;
        Ok(ChannelHandler {
            poll,
            listener: Some(listener),
            channels: Slab::new(),
            max_output_buffers,
            ping_timeout,
        })
    }

    /// Opens a single outbound connection rather than listening (spec.md
    /// §2): a non-interactive provider dials the consumer itself. Returns
    /// the handler along with the id of the one channel it owns.
    pub fn connect(addr: SocketAddr, max_output_buffers: usize, ping_timeout: Duration) -> Result<(Self, usize), TransportError> {
        let poll = Poll::new().map_err(TransportError::Io)?;
        let mut stream = TcpStream::connect(addr).map_err(TransportError::Io)?;
        let mut channels: Slab<ChannelInfo> = Slab::new();
        let entry = channels.vacant_entry();
        let id = entry.key();
        poll.registry()
            .register(&mut stream, Token(id), Interest::READABLE | Interest::WRITABLE)
            .map_err(TransportError::Io)?;
        entry.insert(ChannelInfo::new(stream, max_output_buffers, ping_timeout));
        info!(%addr, channel_id = id, "connected outbound channel");
        Ok((
            ChannelHandler {
                poll,
                listener: None,
                channels,
                max_output_buffers,
                ping_timeout,
            },
            id,
        ))
    }

    /// Local address of the listening socket. Only meaningful for a
    /// `bind`-built handler; used to discover the ephemeral port when
    /// `addr`'s port is `0`.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener
            .as_ref()
            .expect("local_addr is only valid on a listening handler")
            .local_addr()
    }

    pub fn channel(&self, id: usize) -> Option<&ChannelInfo> {
        self.channels.get(id)
    }

    pub fn channel_mut(&mut self, id: usize) -> Option<&mut ChannelInfo> {
        self.channels.get_mut(id)
    }

    pub fn remove_channel(&mut self, id: usize) {
        self.channels.remove(id);
    }

    pub fn channel_ids(&self) -> Vec<usize> {
        self.channels.iter().map(|(id, _)| id).collect()
    }

    /// Accepts every pending connection and polls for readiness
    /// (spec.md §4.D "add"/"initialize" folded into the accept loop). A
    /// handler with no listener (`connect`-built) only ever reports
    /// readable ids.
    pub fn tick(&mut self, timeout: Duration) -> Result<TickResult, TransportError> {
        let mut events = Events::with_capacity(128);
        self.poll.poll(&mut events, Some(timeout))?;

        let mut result = TickResult::default();
        for event in events.iter() {
            if self.listener.is_some() && event.token() == LISTENER_TOKEN {
                result.accepted.extend(self.accept_all()?);
                continue;
            }
            result.readable.push(event.token().0);
        }
        if self.listener.is_some() {
            result.accepted.extend(self.accept_all()?);
        }
        Ok(result)
    }

    fn accept_all(&mut self) -> Result<Vec<usize>, TransportError> {
        let mut accepted = Vec::new();
        loop {
            let outcome = match &self.listener {
                Some(listener) => listener.accept(),
                None => return Ok(accepted),
            };
            match outcome {
                Ok((stream, peer)) => accepted.push(self.register_channel(stream, peer)?),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        Ok(accepted)
    }

    fn register_channel(&mut self, mut stream: TcpStream, peer: SocketAddr) -> Result<usize, TransportError> {
        let entry = self.channels.vacant_entry();
        let id = entry.key();
        self.poll
            .registry()
            .register(&mut stream, Token(id), Interest::READABLE | Interest::WRITABLE)?;
        info!(%peer, channel_id = id, "accepted connection");
        entry.insert(ChannelInfo::new(stream, self.max_output_buffers, self.ping_timeout));
        Ok(id)
    }

    pub fn check_all_pings(&mut self, now: std::time::Instant) -> Vec<usize> {
        let mut timed_out = Vec::new();
        for (id, chan) in self.channels.iter_mut() {
            match chan.check_pings(now) {
                Ok(true) => {}
                Ok(false) => timed_out.push(id),
                Err(e) => {
                    warn!(channel_id = id, error = %e, "ping check failed");
                    timed_out.push(id);
                }
            }
        }
        timed_out
    }
}
