//! Shared functionality for the srtla-rec binary.

pub mod resolve;

pub use resolve::{probe_srt_server, Reachability, ResolveError};
