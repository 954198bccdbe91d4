//! Readiness polling
//!
//! A thin wrapper over mio's `Poll`/`Events` that hands the caller a plain
//! list of ready tokens. Dispatching on a token may destroy the very
//! source it belongs to, so the wait copies tokens out instead of lending
//! an iterator over live event state.

use mio::net::UdpSocket;
use mio::{Events, Interest, Poll, Token};
use std::io;
use std::time::Duration;

pub struct Poller {
    poll: Poll,
    events: Events,
}

impl Poller {
    pub fn with_capacity(capacity: usize) -> io::Result<Self> {
        Ok(Poller {
            poll: Poll::new()?,
            events: Events::with_capacity(capacity),
        })
    }

    /// Register a socket for read readiness under `token`.
    pub fn register(&self, socket: &mut UdpSocket, token: Token) -> io::Result<()> {
        self.poll.registry().register(socket, token, Interest::READABLE)
    }

    /// Remove a socket from the poll set. Must happen before the socket is
    /// dropped when its owner is destroyed mid-batch.
    pub fn deregister(&self, socket: &mut UdpSocket) -> io::Result<()> {
        self.poll.registry().deregister(socket)
    }

    /// Wait up to `timeout` for readiness, replacing the contents of
    /// `ready` with the tokens that fired.
    pub fn wait(&mut self, timeout: Duration, ready: &mut Vec<Token>) -> io::Result<()> {
        ready.clear();
        self.poll.poll(&mut self.events, Some(timeout))?;
        ready.extend(self.events.iter().map(|event| event.token()));
        Ok(())
    }
}
