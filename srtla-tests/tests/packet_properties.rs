//! Property-based tests for the SRTLA codec
//!
//! The listening socket accepts datagrams from anyone, so classification
//! must hold up under arbitrary byte strings: no panics, no fixed-length
//! message recognized at the wrong length, and id equality independent of
//! where a mismatch sits.

use proptest::prelude::*;
use srtla_protocol::{
    const_time_eq, data_seq_number, encode_ack, encode_reg2, is_srt_ack, GroupId, SrtlaPacket,
    ACK_LEN, RECV_ACK_INT, REG1_LEN, REG2_LEN, SRTLA_ID_LEN,
};

fn id_strategy() -> impl Strategy<Value = GroupId> {
    (any::<[u8; 16]>(), any::<[u8; 16]>())
        .prop_map(|(client, server)| GroupId::from_halves(&client, &server))
}

proptest! {
    #[test]
    fn prop_classify_never_panics(buf in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let _ = SrtlaPacket::classify(&buf);
        let _ = data_seq_number(&buf);
        let _ = is_srt_ack(&buf);
    }

    #[test]
    fn prop_registration_messages_are_length_exact(
        body in proptest::collection::vec(any::<u8>(), 0..128),
        reg2 in any::<bool>(),
    ) {
        let mut buf = if reg2 { vec![0x92, 0x01] } else { vec![0x92, 0x00] };
        buf.extend_from_slice(&body);
        let classified = SrtlaPacket::classify(&buf);
        if buf.len() == REG1_LEN {
            let is_registration = matches!(
                classified,
                Some(SrtlaPacket::Reg1 { .. }) | Some(SrtlaPacket::Reg2 { .. })
            );
            prop_assert!(is_registration);
        } else {
            prop_assert_eq!(classified, None);
        }
    }

    #[test]
    fn prop_reg2_round_trips_id(id in id_strategy()) {
        let encoded = encode_reg2(&id);
        prop_assert_eq!(encoded.len(), REG2_LEN);
        match SrtlaPacket::classify(&encoded) {
            Some(SrtlaPacket::Reg2 { id: parsed }) => prop_assert_eq!(parsed, id),
            other => prop_assert!(false, "expected Reg2, got {:?}", other),
        }
    }

    #[test]
    fn prop_data_seq_number_matches_control_bit(buf in proptest::collection::vec(any::<u8>(), 4..64)) {
        let word = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        match data_seq_number(&buf) {
            Some(sn) => {
                prop_assert_eq!(word & (1 << 31), 0);
                prop_assert_eq!(sn, word);
            }
            None => prop_assert_ne!(word & (1 << 31), 0),
        }
    }

    #[test]
    fn prop_ack_layout(seqs in any::<[u32; RECV_ACK_INT]>()) {
        let ack = encode_ack(&seqs);
        prop_assert_eq!(ack.len(), ACK_LEN);
        prop_assert_eq!(&ack[..4], &[0x91, 0x00, 0x00, 0x00][..]);
        for (i, &sn) in seqs.iter().enumerate() {
            let off = 4 + i * 4;
            let got = u32::from_be_bytes(ack[off..off + 4].try_into().unwrap());
            prop_assert_eq!(got, sn);
        }
    }

    #[test]
    fn prop_const_time_eq_agrees_with_equality(
        a in any::<[u8; SRTLA_ID_LEN]>(),
        b in any::<[u8; SRTLA_ID_LEN]>(),
    ) {
        prop_assert_eq!(const_time_eq(&a, &b), a == b);
        prop_assert!(const_time_eq(&a, &a));
    }

    #[test]
    fn prop_id_inequality_position_independent(
        id in id_strategy(),
        pos in 0..SRTLA_ID_LEN,
        flip in 1u8..,
    ) {
        let mut other = *id.as_bytes();
        other[pos] ^= flip;
        let other = GroupId::from_bytes(&other).unwrap();
        prop_assert_ne!(other, id);
    }
}
