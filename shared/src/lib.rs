//! Wire protocol shared between the aggregator and the proxy side.
//!
//! The proxy speaks a tagged byte-buffer format on a named plugin-message
//! channel: every message starts with a length-prefixed UTF-8 tag string,
//! and `PlayerCount` messages carry a target string plus (in responses) a
//! 4-byte big-endian signed count. Strings use an unsigned 16-bit big-endian
//! byte length followed by the UTF-8 bytes.
//!
//! Payloads are decoded once into a typed [`Packet`] at the transport
//! boundary so aggregation logic never touches raw bytes. Unknown tags
//! decode successfully into [`Packet::Unknown`], which keeps this decoder
//! forward compatible with message types the proxy may add later.

use thiserror::Error;

/// Name of the plugin-message channel the proxy listens on.
pub const CONTROL_CHANNEL: &str = "BungeeCord";

/// Tag identifying player-count request and response messages.
pub const PLAYER_COUNT_TAG: &str = "PlayerCount";

/// Target identifier requesting the network-wide total instead of a node.
pub const ALL_TARGET: &str = "ALL";

/// Typed view of a plugin message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Ask the proxy for the player count of one node, or of the whole
    /// network when the target is [`ALL_TARGET`].
    PlayerCountRequest { target: String },
    /// Proxy answer carrying the current count for the requested target.
    PlayerCountResponse { target: String, count: i32 },
    /// A well-formed message with a tag this protocol does not handle.
    Unknown { tag: String },
}

/// Reasons a payload failed to decode into a [`Packet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload truncated: needed {needed} more bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },
    #[error("length-prefixed string is not valid UTF-8")]
    InvalidUtf8,
}

impl Packet {
    /// Serializes the packet into the proxy's byte format.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(32);
        match self {
            Packet::PlayerCountRequest { target } => {
                put_utf(&mut buf, PLAYER_COUNT_TAG);
                put_utf(&mut buf, target);
            }
            Packet::PlayerCountResponse { target, count } => {
                put_utf(&mut buf, PLAYER_COUNT_TAG);
                put_utf(&mut buf, target);
                buf.extend_from_slice(&count.to_be_bytes());
            }
            Packet::Unknown { tag } => {
                put_utf(&mut buf, tag);
            }
        }
        buf
    }

    /// Parses a raw payload into a typed packet.
    ///
    /// A `PlayerCount` message with no bytes after the target is a request;
    /// with a full 4-byte count it is a response. Anything in between is
    /// truncated. Tags other than `PlayerCount` parse into
    /// [`Packet::Unknown`] rather than an error.
    pub fn decode(payload: &[u8]) -> Result<Packet, DecodeError> {
        let mut reader = Reader::new(payload);
        let tag = reader.read_utf()?;
        if tag != PLAYER_COUNT_TAG {
            return Ok(Packet::Unknown {
                tag: tag.to_string(),
            });
        }

        let target = reader.read_utf()?.to_string();
        if reader.remaining() == 0 {
            return Ok(Packet::PlayerCountRequest { target });
        }

        let count = reader.read_i32()?;
        Ok(Packet::PlayerCountResponse { target, count })
    }
}

fn put_utf(buf: &mut Vec<u8>, s: &str) {
    // Tags and node identifiers are short; the u16 length prefix is part of
    // the wire contract.
    assert!(
        s.len() <= u16::MAX as usize,
        "string too long for a u16 length prefix"
    );
    buf.extend_from_slice(&(s.len() as u16).to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// Bounds-checked cursor over a payload slice.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.buf.len() < n {
            return Err(DecodeError::Truncated {
                needed: n,
                remaining: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_utf(&mut self) -> Result<&'a str, DecodeError> {
        let len_bytes = self.take(2)?;
        let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        let raw = self.take(len)?;
        std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_roundtrip() {
        let packet = Packet::PlayerCountRequest {
            target: "lobby-1".to_string(),
        };
        let decoded = Packet::decode(&packet.encode()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_response_roundtrip() {
        let packet = Packet::PlayerCountResponse {
            target: "survival".to_string(),
            count: 42,
        };
        let decoded = Packet::decode(&packet.encode()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_all_target_response() {
        let packet = Packet::PlayerCountResponse {
            target: ALL_TARGET.to_string(),
            count: 137,
        };
        match Packet::decode(&packet.encode()).unwrap() {
            Packet::PlayerCountResponse { target, count } => {
                assert_eq!(target, "ALL");
                assert_eq!(count, 137);
            }
            other => panic!("unexpected packet: {:?}", other),
        }
    }

    #[test]
    fn test_request_byte_layout() {
        let packet = Packet::PlayerCountRequest {
            target: "ALL".to_string(),
        };
        let bytes = packet.encode();
        // u16 length + "PlayerCount", then u16 length + "ALL"
        assert_eq!(&bytes[0..2], &[0, 11]);
        assert_eq!(&bytes[2..13], b"PlayerCount");
        assert_eq!(&bytes[13..15], &[0, 3]);
        assert_eq!(&bytes[15..18], b"ALL");
        assert_eq!(bytes.len(), 18);
    }

    #[test]
    fn test_response_count_is_big_endian() {
        let packet = Packet::PlayerCountResponse {
            target: "a".to_string(),
            count: 258,
        };
        let bytes = packet.encode();
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 1, 2]);
    }

    #[test]
    fn test_negative_count_roundtrip() {
        let packet = Packet::PlayerCountResponse {
            target: "a".to_string(),
            count: -1,
        };
        let decoded = Packet::decode(&packet.encode()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_unknown_tag_is_not_an_error() {
        let packet = Packet::Unknown {
            tag: "IP".to_string(),
        };
        let decoded = Packet::decode(&packet.encode()).unwrap();
        assert_eq!(
            decoded,
            Packet::Unknown {
                tag: "IP".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_tag_with_trailing_bytes() {
        let mut bytes = Packet::Unknown {
            tag: "Forward".to_string(),
        }
        .encode();
        bytes.extend_from_slice(&[1, 2, 3, 4, 5]);
        match Packet::decode(&bytes).unwrap() {
            Packet::Unknown { tag } => assert_eq!(tag, "Forward"),
            other => panic!("unexpected packet: {:?}", other),
        }
    }

    #[test]
    fn test_empty_payload_is_truncated() {
        assert_eq!(
            Packet::decode(&[]),
            Err(DecodeError::Truncated {
                needed: 2,
                remaining: 0
            })
        );
    }

    #[test]
    fn test_truncated_mid_string() {
        let full = Packet::PlayerCountRequest {
            target: "lobby-1".to_string(),
        }
        .encode();
        // Cut inside the target string bytes.
        let cut = &full[..full.len() - 3];
        assert!(matches!(
            Packet::decode(cut),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_truncated_count_field() {
        let full = Packet::PlayerCountResponse {
            target: "hub".to_string(),
            count: 9,
        }
        .encode();
        // Only 2 of the 4 count bytes present.
        let cut = &full[..full.len() - 2];
        assert_eq!(
            Packet::decode(cut),
            Err(DecodeError::Truncated {
                needed: 4,
                remaining: 2
            })
        );
    }

    #[test]
    fn test_length_overrun() {
        // Tag claims 200 bytes but only 3 follow.
        let mut bytes = vec![0u8, 200];
        bytes.extend_from_slice(b"abc");
        assert_eq!(
            Packet::decode(&bytes),
            Err(DecodeError::Truncated {
                needed: 200,
                remaining: 3
            })
        );
    }

    #[test]
    fn test_invalid_utf8_string() {
        let bytes = vec![0u8, 2, 0xff, 0xfe];
        assert_eq!(Packet::decode(&bytes), Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn test_response_missing_count_decodes_as_request() {
        // Same bytes as a request; the absence of a count disambiguates.
        let bytes = Packet::PlayerCountRequest {
            target: "survival".to_string(),
        }
        .encode();
        assert!(matches!(
            Packet::decode(&bytes).unwrap(),
            Packet::PlayerCountRequest { .. }
        ));
    }
}
