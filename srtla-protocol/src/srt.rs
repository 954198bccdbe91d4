//! SRT Packet Recognition
//!
//! The receiver treats SRT as opaque except for three shapes: ACK control
//! packets (fanned out to every path), data packets (their sequence numbers
//! feed the link ACKs), and the induction handshake (sent once at startup
//! to probe server reachability). Control packets carry a big-endian u16
//! type with the high bit set; data packets carry a 31-bit sequence number
//! in their first word.

use bytes::{BufMut, Bytes, BytesMut};

pub const SRT_TYPE_HANDSHAKE: u16 = 0x8000;
pub const SRT_TYPE_ACK: u16 = 0x8002;

/// The fixed SRT header size; anything shorter is not an SRT packet.
pub const SRT_MIN_LEN: usize = 16;

/// Size of an induction handshake: the 16-byte header plus the 48-byte
/// UDT handshake body.
pub const INDUCTION_LEN: usize = 64;

fn srt_type(buf: &[u8]) -> Option<u16> {
    if buf.len() < 2 {
        return None;
    }
    Some(u16::from_be_bytes([buf[0], buf[1]]))
}

/// Is this an SRT ACK control packet?
pub fn is_srt_ack(buf: &[u8]) -> bool {
    srt_type(buf) == Some(SRT_TYPE_ACK)
}

/// Extract the 31-bit sequence number of an SRT data packet.
///
/// Returns `None` for control packets (bit 31 set) and for datagrams too
/// short to carry the field.
pub fn data_seq_number(buf: &[u8]) -> Option<u32> {
    if buf.len() < 4 {
        return None;
    }
    let word = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if word & (1 << 31) != 0 {
        return None;
    }
    Some(word)
}

/// Build an SRT induction handshake (version 4, ext_field 2,
/// handshake_type 1), the first message of SRT's handshake. A server that
/// answers with a same-sized datagram is considered reachable.
pub fn encode_induction() -> Bytes {
    let mut buf = BytesMut::with_capacity(INDUCTION_LEN);
    // Header: type, subtype, additional info, timestamp, destination id.
    buf.put_u16(SRT_TYPE_HANDSHAKE);
    buf.put_u16(0);
    buf.put_u32(0);
    buf.put_u32(0);
    buf.put_u32(0);
    // UDT handshake body.
    buf.put_u32(4); // version
    buf.put_u16(0); // encryption
    buf.put_u16(2); // ext_field
    buf.put_u32(0); // initial sequence number
    buf.put_u32(0); // mtu
    buf.put_u32(0); // max flow window
    buf.put_u32(1); // handshake type: induction
    buf.put_u32(0); // socket id
    buf.put_u32(0); // syn cookie
    buf.put_slice(&[0u8; 16]); // peer address
    buf.freeze()
}
