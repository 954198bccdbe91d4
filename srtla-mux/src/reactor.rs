//! The reactor
//!
//! A single-threaded readiness loop over the listening socket and every
//! group's upstream socket. One iteration is a `turn`: wait for events,
//! read the clock once, dispatch each event by token, then run the
//! eviction sweep. Tests drive `turn` directly with short timeouts.

use crate::engine::{MuxEngine, MuxError};
use crate::group::GroupHandle;
use mio::Token;
use srtla_io::unix_secs;
use std::time::Duration;

/// Token of the SRTLA listening socket; group tokens are their handles,
/// which start above zero.
pub const LISTENER_TOKEN: Token = Token(0);

/// Most events dispatched per turn.
pub const MAX_EVENTS: usize = 10;

/// How long one turn blocks waiting for readiness.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(1);

impl MuxEngine {
    /// Run the reactor until a poll failure.
    pub fn run(&mut self) -> Result<(), MuxError> {
        loop {
            self.turn(POLL_TIMEOUT)?;
        }
    }

    /// One reactor iteration.
    ///
    /// Dispatching an event can destroy groups, and a destroyed group's
    /// socket may still be represented later in this very batch. Tokens
    /// re-resolve through the registry, so a stale one is skipped; on top
    /// of that, if the group count shrank the rest of the batch is
    /// abandoned and the next wait fetches a fresh one.
    pub fn turn(&mut self, timeout: Duration) -> Result<(), MuxError> {
        self.poll_ready(timeout)?;
        let now = unix_secs();

        for i in 0..self.ready.len() {
            let token = self.ready[i];
            let groups_before = self.registry().len();

            if token == LISTENER_TOKEN {
                self.drain_listener(now);
            } else {
                self.handle_upstream_ready(GroupHandle(token.0));
            }

            if self.registry().len() < groups_before {
                break;
            }
        }

        self.cleanup(now);
        Ok(())
    }
}
