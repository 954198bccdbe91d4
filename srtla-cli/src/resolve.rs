//! SRT server reachability probe
//!
//! SRT is connection-oriented and ignores unsolicited packets, so the only
//! way to learn whether a server is listening is to open a handshake. At
//! startup we send one induction packet to each resolved address with a
//! short receive timeout and pick the first address that answers. A server
//! that answers nothing still gets traffic; we just cannot promise it is
//! there.

use srtla_protocol::{encode_induction, INDUCTION_LEN, MTU};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("failed to resolve {host}:{port}: {source}")]
    Lookup {
        host: String,
        port: u16,
        source: io::Error,
    },

    #[error("no IPv4 address found for {host}:{port}")]
    NoAddress { host: String, port: u16 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Whether the probe saw the server answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    /// An induction reply came back from the selected address.
    Confirmed,
    /// No address answered; the first resolved one is used regardless.
    Unconfirmed,
}

/// Resolve `host:port` and probe each IPv4 candidate with an SRT
/// induction handshake, 1 second each.
pub fn probe_srt_server(host: &str, port: u16) -> Result<(SocketAddr, Reachability), ResolveError> {
    let candidates: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| ResolveError::Lookup {
            host: host.to_string(),
            port,
            source,
        })?
        .filter(|addr| addr.is_ipv4())
        .collect();

    let first = *candidates.first().ok_or_else(|| ResolveError::NoAddress {
        host: host.to_string(),
        port,
    })?;

    let induction = encode_induction();
    let sock = UdpSocket::bind("0.0.0.0:0")?;
    sock.set_read_timeout(Some(Duration::from_secs(1)))?;

    for &addr in &candidates {
        tracing::info!("trying to connect to SRT at {addr}...");
        if probe_one(&sock, addr, &induction) {
            tracing::info!("success");
            return Ok((addr, Reachability::Confirmed));
        }
        tracing::info!("error");
    }

    tracing::warn!(
        "failed to confirm that an SRT server is reachable at any address, \
         proceeding with the first one: {first}"
    );
    Ok((first, Reachability::Unconfirmed))
}

fn probe_one(sock: &UdpSocket, addr: SocketAddr, induction: &[u8]) -> bool {
    if sock.connect(addr).is_err() {
        return false;
    }
    match sock.send(induction) {
        Ok(n) if n == induction.len() => {}
        _ => return false,
    }
    let mut buf = [0u8; MTU];
    // Any same-sized reply counts as an induction response.
    matches!(sock.recv(&mut buf), Ok(n) if n == INDUCTION_LEN)
}
