//! SRTLA Receiver Multiplexing Engine
//!
//! A sender stripes one SRT flow across several network paths; each path
//! registers with this engine and forwards SRT datagrams to it. The engine
//! reassembles the paths of a group into a single egress flow toward the
//! SRT server and fans return traffic back across the paths, batching
//! link-layer ACKs so the sender can drive per-path congestion control.
//!
//! Everything is owned by one reactor thread: the group registry, each
//! group's connections and upstream socket, and the ACK buffers. There is
//! no locking; mutation happens only between readiness waits.

pub mod config;
pub mod engine;
pub mod group;
pub mod reactor;

pub use config::MuxConfig;
pub use engine::{CleanupStats, MuxEngine, MuxError};
pub use group::{ConnGroup, GroupHandle, GroupRegistry, SrtlaConn};
pub use reactor::{LISTENER_TOKEN, MAX_EVENTS, POLL_TIMEOUT};
