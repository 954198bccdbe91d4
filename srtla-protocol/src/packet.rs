//! SRTLA Overlay Framing
//!
//! SRTLA messages are UDP datagrams starting with a big-endian u16 type.
//! The registration messages are fixed-length; the batched ACK carries its
//! type in the high half of a 32-bit header followed by [`RECV_ACK_INT`]
//! sequence numbers. Layouts are a compatibility surface with the sender
//! and must stay byte-exact.

use crate::ident::{GroupId, SRTLA_ID_LEN};
use crate::RECV_ACK_INT;
use bytes::{BufMut, Bytes, BytesMut};

pub const SRTLA_TYPE_KEEPALIVE: u16 = 0x9000;
pub const SRTLA_TYPE_ACK: u16 = 0x9100;
pub const SRTLA_TYPE_REG1: u16 = 0x9200;
pub const SRTLA_TYPE_REG2: u16 = 0x9201;
pub const SRTLA_TYPE_REG3: u16 = 0x9202;
pub const SRTLA_TYPE_REG_ERR: u16 = 0x9210;
pub const SRTLA_TYPE_REG_NGP: u16 = 0x9211;

/// REG1 carries a full-width id field of which only the client half is
/// meaningful to the receiver.
pub const REG1_LEN: usize = 2 + SRTLA_ID_LEN;
pub const REG2_LEN: usize = 2 + SRTLA_ID_LEN;
pub const REG3_LEN: usize = 2;
pub const ACK_LEN: usize = 4 + 4 * RECV_ACK_INT;

/// Inbound SRTLA datagrams the receiver reacts to.
///
/// Anything else on the listening socket is either SRT payload to forward
/// or noise to discard; the engine decides by source address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrtlaPacket {
    /// First leg of group registration, carrying the client id half.
    Reg1 { client_id: [u8; GroupId::HALF_LEN] },
    /// Connection attach, echoing a full group id from our REG2.
    Reg2 { id: GroupId },
    /// Link keepalive, echoed back verbatim.
    Keepalive,
}

fn packet_type(buf: &[u8]) -> Option<u16> {
    if buf.len() < 2 {
        return None;
    }
    Some(u16::from_be_bytes([buf[0], buf[1]]))
}

impl SrtlaPacket {
    /// Classify an inbound datagram. The registration messages are
    /// length-exact: a REG1 or REG2 of any other size is not a
    /// registration message at all.
    pub fn classify(buf: &[u8]) -> Option<SrtlaPacket> {
        match packet_type(buf)? {
            SRTLA_TYPE_REG1 if buf.len() == REG1_LEN => {
                let mut client_id = [0u8; GroupId::HALF_LEN];
                client_id.copy_from_slice(&buf[2..2 + GroupId::HALF_LEN]);
                Some(SrtlaPacket::Reg1 { client_id })
            }
            SRTLA_TYPE_REG2 if buf.len() == REG2_LEN => {
                let id = GroupId::from_bytes(&buf[2..])?;
                Some(SrtlaPacket::Reg2 { id })
            }
            SRTLA_TYPE_KEEPALIVE => Some(SrtlaPacket::Keepalive),
            _ => None,
        }
    }
}

/// Build a REG2 reply carrying the full group id.
pub fn encode_reg2(id: &GroupId) -> Bytes {
    let mut buf = BytesMut::with_capacity(REG2_LEN);
    buf.put_u16(SRTLA_TYPE_REG2);
    buf.put_slice(id.as_bytes());
    buf.freeze()
}

/// Build a REG3 attach acknowledgement.
pub fn encode_reg3() -> Bytes {
    let mut buf = BytesMut::with_capacity(REG3_LEN);
    buf.put_u16(SRTLA_TYPE_REG3);
    buf.freeze()
}

/// Build the generic negative registration reply.
pub fn encode_reg_err() -> Bytes {
    let mut buf = BytesMut::with_capacity(2);
    buf.put_u16(SRTLA_TYPE_REG_ERR);
    buf.freeze()
}

/// Build the "no such group" negative reply.
pub fn encode_reg_ngp() -> Bytes {
    let mut buf = BytesMut::with_capacity(2);
    buf.put_u16(SRTLA_TYPE_REG_NGP);
    buf.freeze()
}

/// Build a batched link ACK: a 32-bit header with the type in its high
/// half, then the sequence numbers in arrival order.
pub fn encode_ack(seqs: &[u32; RECV_ACK_INT]) -> Bytes {
    let mut buf = BytesMut::with_capacity(ACK_LEN);
    buf.put_u32((SRTLA_TYPE_ACK as u32) << 16);
    for &sn in seqs {
        buf.put_u32(sn);
    }
    buf.freeze()
}
