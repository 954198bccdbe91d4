//! SRTLA Wire Protocol
//!
//! This crate implements the SRTLA overlay framing (registration handshake,
//! link-layer ACKs, keepalives) and the minimal SRT packet recognition the
//! receiver needs: ACK classification, data sequence number extraction, and
//! the induction handshake used to probe server reachability. SRT payloads
//! are otherwise opaque.

pub mod ident;
pub mod packet;
pub mod srt;

pub use ident::{const_time_eq, GroupId, SRTLA_ID_LEN};
pub use packet::{
    encode_ack, encode_reg2, encode_reg3, encode_reg_err, encode_reg_ngp, SrtlaPacket, ACK_LEN,
    REG1_LEN, REG2_LEN, REG3_LEN,
};
pub use srt::{data_seq_number, encode_induction, is_srt_ack, INDUCTION_LEN, SRT_MIN_LEN};

/// Number of SRT data packets acknowledged by one SRTLA ACK.
pub const RECV_ACK_INT: usize = 10;

/// Largest datagram the receiver will read or forward.
pub const MTU: usize = 1500;
