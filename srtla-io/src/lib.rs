//! I/O and Platform Abstraction
//!
//! UDP socket construction with the options the receiver needs (large
//! receive buffers, non-blocking mode), a thin readiness-polling wrapper,
//! and wall-clock helpers.

pub mod poll;
pub mod socket;
pub mod time;

pub use poll::Poller;
pub use socket::{bind_listener, connect_upstream, SocketError};
pub use time::unix_secs;
