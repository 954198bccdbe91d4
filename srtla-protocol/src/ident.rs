//! Group Identifiers
//!
//! A group id is a 256-bit opaque value: the first half is chosen by the
//! client in REG1, the second half is generated by the receiver. Peers prove
//! membership by echoing the full id in REG2, so id comparison must not leak
//! how many leading bytes matched.

use std::fmt;
use std::hint::black_box;

/// Full group id length in bytes.
pub const SRTLA_ID_LEN: usize = 32;

/// Compare two byte slices without an early exit on the first mismatch.
///
/// Unequal lengths compare unequal immediately; the length of an id is not
/// a secret, its contents are.
pub fn const_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    black_box(diff) == 0
}

/// 256-bit group identifier.
///
/// Equality is constant-time; see [`const_time_eq`].
#[derive(Clone, Copy)]
pub struct GroupId([u8; SRTLA_ID_LEN]);

impl GroupId {
    /// Length of each id half.
    pub const HALF_LEN: usize = SRTLA_ID_LEN / 2;

    /// Build an id from the client-supplied half and a locally generated one.
    pub fn from_halves(client: &[u8; Self::HALF_LEN], server: &[u8; Self::HALF_LEN]) -> Self {
        let mut id = [0u8; SRTLA_ID_LEN];
        id[..Self::HALF_LEN].copy_from_slice(client);
        id[Self::HALF_LEN..].copy_from_slice(server);
        GroupId(id)
    }

    /// Parse an id from a wire payload. Returns `None` unless `bytes` is
    /// exactly [`SRTLA_ID_LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let id: [u8; SRTLA_ID_LEN] = bytes.try_into().ok()?;
        Some(GroupId(id))
    }

    pub fn as_bytes(&self) -> &[u8; SRTLA_ID_LEN] {
        &self.0
    }

    /// The client-chosen first half, as carried in REG1.
    pub fn client_half(&self) -> &[u8] {
        &self.0[..Self::HALF_LEN]
    }

    /// The locally generated second half.
    pub fn server_half(&self) -> &[u8] {
        &self.0[Self::HALF_LEN..]
    }
}

impl PartialEq for GroupId {
    fn eq(&self, other: &Self) -> bool {
        const_time_eq(&self.0, &other.0)
    }
}

impl Eq for GroupId {}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only a prefix; the full id is a bearer token for the group.
        write!(
            f,
            "GroupId({:02x}{:02x}{:02x}{:02x}..)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_time_eq_basic() {
        assert!(const_time_eq(b"", b""));
        assert!(const_time_eq(b"abc", b"abc"));
        assert!(!const_time_eq(b"abc", b"abd"));
        assert!(!const_time_eq(b"abc", b"ab"));
    }

    #[test]
    fn test_group_id_halves() {
        let id = GroupId::from_halves(&[0x01; 16], &[0xfe; 16]);
        assert_eq!(id.client_half(), &[0x01; 16]);
        assert_eq!(id.server_half(), &[0xfe; 16]);
        assert_eq!(id.as_bytes().len(), SRTLA_ID_LEN);
    }

    #[test]
    fn test_group_id_round_trip() {
        let id = GroupId::from_halves(&[0xaa; 16], &[0x55; 16]);
        let parsed = GroupId::from_bytes(id.as_bytes()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_group_id_rejects_wrong_length() {
        assert!(GroupId::from_bytes(&[0u8; 31]).is_none());
        assert!(GroupId::from_bytes(&[0u8; 33]).is_none());
    }

    #[test]
    fn test_group_id_inequality_any_byte() {
        let id = GroupId::from_halves(&[7; 16], &[9; 16]);
        for i in 0..SRTLA_ID_LEN {
            let mut other = *id.as_bytes();
            other[i] ^= 0x80;
            assert_ne!(GroupId::from_bytes(&other).unwrap(), id);
        }
    }
}
