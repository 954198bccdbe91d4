//! UDP socket construction
//!
//! Sockets are built with socket2 so buffer sizes and blocking mode can be
//! set before binding, then handed to mio for readiness polling.

use mio::net::UdpSocket;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use thiserror::Error;

/// Socket construction errors
#[derive(Error, Debug)]
pub enum SocketError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("only IPv4 peers are supported, got {0}")]
    NotIpv4(SocketAddr),
}

fn new_udp_v4() -> Result<Socket, SocketError> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

/// Bind the SRTLA listening socket on all interfaces.
///
/// The receive buffer is raised to `recv_buf` bytes before binding so the
/// kernel can absorb bursts arriving over many paths at once; failure to
/// set it is an error, not a degraded success.
pub fn bind_listener(port: u16, recv_buf: usize) -> Result<UdpSocket, SocketError> {
    let socket = new_udp_v4()?;
    socket.set_reuse_address(true)?;
    socket.set_recv_buffer_size(recv_buf)?;

    let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    socket.bind(&SocketAddr::V4(addr).into())?;

    Ok(UdpSocket::from_std(socket.into()))
}

/// Open a fresh socket `connect`ed to the upstream SRT server.
///
/// One of these exists per live group; the kernel picks the local port.
pub fn connect_upstream(addr: SocketAddr) -> Result<UdpSocket, SocketError> {
    if !addr.is_ipv4() {
        return Err(SocketError::NotIpv4(addr));
    }
    let socket = new_udp_v4()?;
    socket.connect(&addr.into())?;

    Ok(UdpSocket::from_std(socket.into()))
}
