//! SRTLA - SRT link aggregation, receiver side.
//!
//! High-level re-exports over the protocol, I/O, and multiplexing crates.

pub use srtla_io as io;
pub use srtla_mux as mux;
pub use srtla_protocol as protocol;

// Re-export commonly used types
pub use mux::{MuxConfig, MuxEngine};
pub use protocol::{GroupId, SrtlaPacket};
