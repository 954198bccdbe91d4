//! Engine configuration
//!
//! Resource caps and timers. The defaults are the service's production
//! values; tests shrink them to drive eviction without waiting out real
//! timeouts. Wire-format constants are not configurable and live in
//! `srtla-protocol`.

use std::net::SocketAddr;

/// Most groups a single process will carry.
pub const MAX_GROUPS: usize = 200;

/// Most paths a single group will carry.
pub const MAX_CONNS_PER_GROUP: usize = 16;

/// Seconds of silence after which a connection is garbage-collected.
pub const CONN_TIMEOUT: u64 = 10;

/// Minimum age in seconds before an empty group is garbage-collected.
pub const GROUP_TIMEOUT: u64 = 10;

/// Minimum seconds between eviction sweeps.
pub const CLEANUP_PERIOD: u64 = 3;

/// Listener receive buffer, sized to absorb multi-path bursts.
pub const RECV_BUF_SIZE: usize = 32 * 1024 * 1024;

/// Engine limits and the resolved upstream address.
#[derive(Debug, Clone, Copy)]
pub struct MuxConfig {
    /// The SRT server every group's upstream socket connects to.
    pub srt_addr: SocketAddr,
    pub max_groups: usize,
    pub max_conns_per_group: usize,
    pub conn_timeout: u64,
    pub group_timeout: u64,
    pub cleanup_period: u64,
}

impl MuxConfig {
    pub fn new(srt_addr: SocketAddr) -> Self {
        MuxConfig {
            srt_addr,
            max_groups: MAX_GROUPS,
            max_conns_per_group: MAX_CONNS_PER_GROUP,
            conn_timeout: CONN_TIMEOUT,
            group_timeout: GROUP_TIMEOUT,
            cleanup_period: CLEANUP_PERIOD,
        }
    }
}
