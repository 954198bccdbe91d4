//! The multiplexing engine
//!
//! Owns the listening socket, the poll set, and the group registry, and
//! implements the three things that happen to an inbound datagram: the
//! registration state machine (REG1 group creation, REG2 connection
//! attach), the bidirectional forwarding paths, and the periodic eviction
//! sweep.
//!
//! Failure policy: a refused registration or a failed send to a peer is
//! logged and life goes on; any failure on a group's upstream socket
//! destroys that group and nothing else.

use crate::config::{MuxConfig, RECV_BUF_SIZE};
use crate::group::{ConnGroup, GroupHandle, GroupRegistry, SrtlaConn};
use crate::reactor::{LISTENER_TOKEN, MAX_EVENTS};
use mio::net::UdpSocket;
use mio::Token;
use rand::rngs::OsRng;
use rand::RngCore;
use srtla_io::socket::{bind_listener, connect_upstream, SocketError};
use srtla_io::Poller;
use srtla_protocol::{
    data_seq_number, encode_ack, encode_reg2, encode_reg3, encode_reg_err, encode_reg_ngp,
    is_srt_ack, GroupId, SrtlaPacket, MTU, SRT_MIN_LEN,
};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MuxError {
    #[error("socket setup failed: {0}")]
    Socket(#[from] SocketError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Accounting for one eviction sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub groups: usize,
    pub conns: usize,
    pub removed_groups: usize,
    pub removed_conns: usize,
}

pub struct MuxEngine {
    listener: UdpSocket,
    poller: Poller,
    registry: GroupRegistry,
    config: MuxConfig,
    last_cleanup: u64,
    /// Scratch buffer of ready tokens, reused across reactor turns.
    pub(crate) ready: Vec<Token>,
}

impl MuxEngine {
    /// Bind the SRTLA listener and set up the poll set.
    pub fn bind(listen_port: u16, config: MuxConfig) -> Result<Self, MuxError> {
        let mut listener = bind_listener(listen_port, RECV_BUF_SIZE)?;
        let poller = Poller::with_capacity(MAX_EVENTS)?;
        poller.register(&mut listener, LISTENER_TOKEN)?;
        Ok(MuxEngine {
            listener,
            poller,
            registry: GroupRegistry::new(),
            config,
            last_cleanup: 0,
            ready: Vec::with_capacity(MAX_EVENTS),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    pub fn config(&self) -> &MuxConfig {
        &self.config
    }

    /// Read listener datagrams until the socket runs dry.
    pub(crate) fn drain_listener(&mut self, now: u64) {
        let mut buf = [0u8; MTU];
        loop {
            match self.listener.recv_from(&mut buf) {
                Ok((n, src)) => self.handle_srtla_packet(&buf[..n], src, now),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) => {
                    tracing::error!("failed to read a srtla packet: {e}");
                    return;
                }
            }
        }
    }

    /// Process one datagram that arrived on the listening socket.
    pub fn handle_srtla_packet(&mut self, buf: &[u8], src: SocketAddr, now: u64) {
        let classified = SrtlaPacket::classify(buf);
        match classified {
            Some(SrtlaPacket::Reg1 { client_id }) => return self.register_group(client_id, src, now),
            Some(SrtlaPacket::Reg2 { id }) => return self.register_conn(id, src, now),
            Some(SrtlaPacket::Keepalive) | None => {}
        }

        // Everything else requires an attached connection; unknown sources
        // get no reply at all.
        let Some((handle, Some(conn_idx))) = self.registry.find_by_addr(src) else {
            return;
        };
        let Some(group) = self.registry.get_mut(handle) else {
            return;
        };
        group.conns[conn_idx].touch(now);

        if matches!(classified, Some(SrtlaPacket::Keepalive)) {
            if let Err(e) = self.listener.send_to(buf, src) {
                tracing::error!("{src} (group {}): failed to echo the keepalive: {e}", handle.0);
            }
            return;
        }

        if buf.len() < SRT_MIN_LEN {
            return;
        }

        // This path just proved itself; non-ACK return traffic follows it.
        group.last_addr = src;

        if let Some(sn) = data_seq_number(buf) {
            if let Some(batch) = group.conns[conn_idx].record_srt_seq(sn) {
                let ack = encode_ack(&batch);
                if let Err(e) = self.listener.send_to(&ack, src) {
                    tracing::error!("{src} (group {}): failed to send the srtla ack: {e}", handle.0);
                }
            }
        }

        if !self.ensure_upstream(handle) {
            return;
        }

        let Some(group) = self.registry.get(handle) else {
            return;
        };
        let Some(sock) = &group.srt_sock else {
            return;
        };
        match sock.send(buf) {
            Ok(n) if n == buf.len() => {}
            Ok(_) | Err(_) => {
                tracing::error!(
                    "group {}: failed to forward the srtla packet, terminating the group",
                    handle.0
                );
                self.remove_group(handle);
            }
        }
    }

    /// REG1: create a group, answer REG2.
    fn register_group(&mut self, client_id: [u8; GroupId::HALF_LEN], src: SocketAddr, now: u64) {
        if self.registry.len() >= self.config.max_groups {
            self.send_reg_err(src);
            tracing::error!("{src}: group registration failed: max groups reached");
            return;
        }

        // One address, one group: a peer already known as a connection or
        // as a group's registration address may not open another group.
        if self.registry.find_by_addr(src).is_some() {
            self.send_reg_err(src);
            tracing::error!("{src}: group registration failed: address already registered");
            return;
        }

        let mut server_half = [0u8; GroupId::HALF_LEN];
        OsRng.fill_bytes(&mut server_half);
        let id = GroupId::from_halves(&client_id, &server_half);

        let group = self.registry.new_group(id, src, now);
        let handle = group.handle();

        let reg2 = encode_reg2(&id);
        match self.listener.send_to(&reg2, src) {
            Ok(n) if n == reg2.len() => {}
            _ => {
                // The group was never inserted; it dies here.
                tracing::error!("{src}: group registration failed: send error");
                return;
            }
        }

        self.registry.insert(group);
        tracing::info!("{src}: group {} registered", handle.0);
    }

    /// REG2 from a client: attach a connection, answer REG3.
    fn register_conn(&mut self, id: GroupId, src: SocketAddr, now: u64) {
        let Some(handle) = self.registry.find_by_id(&id) else {
            if let Err(e) = self.listener.send_to(&encode_reg_ngp(), src) {
                tracing::error!("{src}: failed to send REG_NGP: {e}");
            }
            tracing::error!("{src}: connection registration failed: no group found");
            return;
        };

        // Re-attaching to the same group is allowed; claiming a second
        // group from a bound address is not.
        let mut attached = false;
        if let Some((owner, conn)) = self.registry.find_by_addr(src) {
            if owner != handle {
                self.send_reg_err(src);
                tracing::error!(
                    "{src}: connection registration for group {} failed: group id mismatch",
                    handle.0
                );
                return;
            }
            attached = conn.is_some();
        }

        if !attached {
            let Some(group) = self.registry.get(handle) else {
                return;
            };
            if group.conns.len() >= self.config.max_conns_per_group {
                self.send_reg_err(src);
                tracing::error!(
                    "{src}: connection registration for group {} failed: max group conns reached",
                    handle.0
                );
                return;
            }
        }

        let reg3 = encode_reg3();
        match self.listener.send_to(&reg3, src) {
            Ok(n) if n == reg3.len() => {}
            _ => {
                tracing::error!(
                    "{src}: connection registration for group {} failed: send error",
                    handle.0
                );
                return;
            }
        }

        let Some(group) = self.registry.get_mut(handle) else {
            return;
        };
        if !attached {
            group.conns.push(SrtlaConn::new(src, now));
        }
        group.last_addr = src;
        tracing::info!("{src} (group {}): connection registered", handle.0);
    }

    /// Open and register the group's upstream socket if it does not exist
    /// yet. On any failure the group is destroyed and `false` returned.
    fn ensure_upstream(&mut self, handle: GroupHandle) -> bool {
        let Some(group) = self.registry.get(handle) else {
            return false;
        };
        if group.srt_sock.is_some() {
            return true;
        }

        let mut sock = match connect_upstream(self.config.srt_addr) {
            Ok(sock) => sock,
            Err(e) => {
                tracing::error!("group {}: failed to open an SRT socket: {e}", handle.0);
                self.remove_group(handle);
                return false;
            }
        };
        if let Err(e) = self.poller.register(&mut sock, Token(handle.0)) {
            tracing::error!("group {}: failed to poll the SRT socket: {e}", handle.0);
            self.remove_group(handle);
            return false;
        }

        if let Some(group) = self.registry.get_mut(handle) {
            group.srt_sock = Some(sock);
        }
        true
    }

    /// Drain one group's upstream socket: SRT ACKs fan out to every path,
    /// anything else follows the most recently active one.
    pub fn handle_upstream_ready(&mut self, handle: GroupHandle) {
        let mut buf = [0u8; MTU];
        loop {
            let Some(group) = self.registry.get(handle) else {
                return;
            };
            let Some(sock) = &group.srt_sock else {
                return;
            };

            let n = match sock.recv(&mut buf) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) => {
                    tracing::error!(
                        "group {}: failed to read the SRT sock, terminating the group: {e}",
                        handle.0
                    );
                    self.remove_group(handle);
                    return;
                }
            };
            if n < SRT_MIN_LEN {
                tracing::error!(
                    "group {}: short read from the SRT sock, terminating the group",
                    handle.0
                );
                self.remove_group(handle);
                return;
            }

            if is_srt_ack(&buf[..n]) {
                for conn in &group.conns {
                    match self.listener.send_to(&buf[..n], conn.addr()) {
                        Ok(sent) if sent == n => {}
                        _ => tracing::error!(
                            "{} (group {}): failed to send the SRT ack",
                            conn.addr(),
                            handle.0
                        ),
                    }
                }
            } else {
                match self.listener.send_to(&buf[..n], group.last_addr) {
                    Ok(sent) if sent == n => {}
                    _ => tracing::error!(
                        "{} (group {}): failed to send the SRT packet",
                        group.last_addr,
                        handle.0
                    ),
                }
            }
        }
    }

    /// Destroy a group: detach it from the registry, then pull its
    /// upstream socket out of the poll set.
    pub fn remove_group(&mut self, handle: GroupHandle) {
        let Some(group) = self.registry.remove(handle) else {
            return;
        };
        self.release_upstream(group);
        tracing::info!("group {} removed", handle.0);
    }

    fn release_upstream(&mut self, mut group: ConnGroup) {
        if let Some(mut sock) = group.srt_sock.take() {
            if let Err(e) = self.poller.deregister(&mut sock) {
                tracing::error!(
                    "group {}: failed to deregister the SRT socket: {e}",
                    group.handle().0
                );
            }
        }
    }

    /// Eviction sweep: drop connections idle past `conn_timeout`, then
    /// drop groups that are both empty and older than `group_timeout`.
    /// Rate-limited to once per `cleanup_period`; returns what it did.
    pub fn cleanup(&mut self, now: u64) -> Option<CleanupStats> {
        if self.last_cleanup + self.config.cleanup_period > now {
            return None;
        }
        self.last_cleanup = now;

        if self.registry.is_empty() {
            return None;
        }

        tracing::debug!("starting a cleanup run");
        let conn_timeout = self.config.conn_timeout;
        let group_timeout = self.config.group_timeout;

        let mut stats = CleanupStats {
            groups: self.registry.len(),
            ..CleanupStats::default()
        };
        let mut dead = Vec::new();

        for group in self.registry.iter_mut() {
            let handle = group.handle();
            stats.conns += group.conns.len();

            let before = group.conns.len();
            group.conns.retain(|conn| {
                if conn.last_rcvd() + conn_timeout < now {
                    tracing::info!(
                        "{} (group {}): connection removed (timed out)",
                        conn.addr(),
                        handle.0
                    );
                    false
                } else {
                    true
                }
            });
            stats.removed_conns += before - group.conns.len();

            // An empty group younger than the timeout stays alive so a
            // slow client can still attach.
            if group.conns.is_empty() && group.created_at() + group_timeout < now {
                dead.push(handle);
            }
        }

        for handle in dead {
            self.remove_group(handle);
            tracing::info!("group {} removed (no connections)", handle.0);
            stats.removed_groups += 1;
        }

        tracing::debug!(
            "cleanup run ended: {} groups and {} conns examined, {} groups and {} conns removed",
            stats.groups,
            stats.conns,
            stats.removed_groups,
            stats.removed_conns
        );
        Some(stats)
    }

    fn send_reg_err(&self, addr: SocketAddr) {
        if let Err(e) = self.listener.send_to(&encode_reg_err(), addr) {
            tracing::error!("{addr}: failed to send REG_ERR: {e}");
        }
    }

    pub(crate) fn poll_ready(&mut self, timeout: std::time::Duration) -> io::Result<()> {
        self.poller.wait(timeout, &mut self.ready)
    }
}
