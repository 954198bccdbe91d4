//! Groups, connections, and the registry
//!
//! A group is one logical client session: up to [`MAX_CONNS_PER_GROUP`]
//! connections sharing a 256-bit id and one upstream SRT socket. A
//! connection is one network path, identified by its peer address; an
//! address belongs to at most one connection across the whole process.
//!
//! The registry is the sole owner of groups. Reactor event tags carry a
//! [`GroupHandle`] and re-resolve it right before dispatch, so a token
//! left over from a destroyed group simply fails the lookup.
//!
//! [`MAX_CONNS_PER_GROUP`]: crate::config::MAX_CONNS_PER_GROUP

use mio::net::UdpSocket;
use srtla_protocol::{GroupId, RECV_ACK_INT};
use std::net::SocketAddr;

/// Stable integer identity of a group, used as its poll token.
///
/// Handles are never reused within a process, so an event keyed by a
/// retired handle cannot alias a newer group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupHandle(pub usize);

/// One network path within a group.
pub struct SrtlaConn {
    addr: SocketAddr,
    /// SRT sequence numbers received since the last link ACK, in arrival
    /// order.
    recv_log: [u32; RECV_ACK_INT],
    recv_idx: usize,
    last_rcvd: u64,
}

impl SrtlaConn {
    pub fn new(addr: SocketAddr, now: u64) -> Self {
        SrtlaConn {
            addr,
            recv_log: [0; RECV_ACK_INT],
            recv_idx: 0,
            last_rcvd: now,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn last_rcvd(&self) -> u64 {
        self.last_rcvd
    }

    /// Note inbound traffic on this path.
    pub fn touch(&mut self, now: u64) {
        self.last_rcvd = now;
    }

    /// Number of sequence numbers waiting for the next link ACK.
    pub fn pending_acks(&self) -> usize {
        self.recv_idx
    }

    /// Record a received SRT data sequence number.
    ///
    /// On the [`RECV_ACK_INT`]th insertion the full batch is returned for
    /// transmission and the log resets; whether the ACK is then sent
    /// successfully or not, the numbers are gone from the log.
    pub fn record_srt_seq(&mut self, sn: u32) -> Option<[u32; RECV_ACK_INT]> {
        self.recv_log[self.recv_idx] = sn;
        self.recv_idx += 1;
        if self.recv_idx == RECV_ACK_INT {
            self.recv_idx = 0;
            return Some(self.recv_log);
        }
        None
    }
}

/// One logical client session.
pub struct ConnGroup {
    handle: GroupHandle,
    id: GroupId,
    pub(crate) conns: Vec<SrtlaConn>,
    /// Lazily opened on the first forwardable datagram; its presence is
    /// what ties the group into the poll set.
    pub(crate) srt_sock: Option<UdpSocket>,
    /// Peer address of the most recent valid packet; return traffic that
    /// is not an ACK follows this path.
    pub(crate) last_addr: SocketAddr,
    created_at: u64,
}

impl ConnGroup {
    pub fn handle(&self) -> GroupHandle {
        self.handle
    }

    pub fn id(&self) -> &GroupId {
        &self.id
    }

    pub fn conns(&self) -> &[SrtlaConn] {
        &self.conns
    }

    pub fn last_addr(&self) -> SocketAddr {
        self.last_addr
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn has_upstream(&self) -> bool {
        self.srt_sock.is_some()
    }

    fn conn_index(&self, addr: SocketAddr) -> Option<usize> {
        self.conns.iter().position(|conn| conn.addr == addr)
    }
}

/// Index over the live groups.
///
/// Lookups are linear scans; the caps are small enough that an index
/// keyed by address or id would buy nothing. Id comparison goes through
/// [`GroupId`]'s constant-time equality so a peer cannot probe the id
/// space via timing.
pub struct GroupRegistry {
    groups: Vec<ConnGroup>,
    next_handle: usize,
}

impl GroupRegistry {
    pub fn new() -> Self {
        GroupRegistry {
            groups: Vec::new(),
            next_handle: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Build a group with a fresh handle, NOT yet inserted. Registration
    /// only inserts it once the REG2 reply has actually been sent.
    pub fn new_group(&mut self, id: GroupId, last_addr: SocketAddr, now: u64) -> ConnGroup {
        let handle = GroupHandle(self.next_handle);
        self.next_handle += 1;
        ConnGroup {
            handle,
            id,
            conns: Vec::new(),
            srt_sock: None,
            last_addr,
            created_at: now,
        }
    }

    pub fn insert(&mut self, group: ConnGroup) {
        self.groups.push(group);
    }

    /// Detach a group from the registry. The caller still has to
    /// deregister and drop its upstream socket.
    pub fn remove(&mut self, handle: GroupHandle) -> Option<ConnGroup> {
        let idx = self.groups.iter().position(|g| g.handle == handle)?;
        Some(self.groups.swap_remove(idx))
    }

    pub fn get(&self, handle: GroupHandle) -> Option<&ConnGroup> {
        self.groups.iter().find(|g| g.handle == handle)
    }

    pub fn get_mut(&mut self, handle: GroupHandle) -> Option<&mut ConnGroup> {
        self.groups.iter_mut().find(|g| g.handle == handle)
    }

    /// Find the group claiming `id`. Constant-time comparison per group.
    pub fn find_by_id(&self, id: &GroupId) -> Option<GroupHandle> {
        self.groups
            .iter()
            .find(|g| g.id == *id)
            .map(|g| g.handle)
    }

    /// Resolve a peer address to its group, and to its connection if the
    /// address is attached as one. A group whose `last_addr` matches but
    /// that has no such connection is returned with `None` in the second
    /// slot; this is what blocks a registered address from opening a
    /// second group.
    pub fn find_by_addr(&self, addr: SocketAddr) -> Option<(GroupHandle, Option<usize>)> {
        for group in &self.groups {
            if let Some(idx) = group.conn_index(addr) {
                return Some((group.handle, Some(idx)));
            }
            if group.last_addr == addr {
                return Some((group.handle, None));
            }
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnGroup> {
        self.groups.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ConnGroup> {
        self.groups.iter_mut()
    }
}
