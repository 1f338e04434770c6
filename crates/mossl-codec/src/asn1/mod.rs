//! ASN.1 DER/BER grammar: tag constants, header encoding, and the
//! stateless decoders in [`decode`].

mod decode;

pub use decode::{
    decode_algorithm_identifier, decode_enumerated, decode_integer, decode_length, decode_oid,
    decode_sequence, decode_set, AlgorithmIdentifier, Availability, DecodedLength, EnvelopeCheck,
    LengthMode, MAX_OID_OCTETS,
};

/// ASN.1 tag constants.
pub mod tags {
    pub const BOOLEAN: u8 = 0x01;
    pub const INTEGER: u8 = 0x02;
    pub const BIT_STRING: u8 = 0x03;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OID: u8 = 0x06;
    pub const ENUMERATED: u8 = 0x0A;
    pub const UTF8_STRING: u8 = 0x0C;
    pub const PRINTABLE_STRING: u8 = 0x13;
    pub const IA5_STRING: u8 = 0x16;
    pub const UTC_TIME: u8 = 0x17;
    pub const GENERALIZED_TIME: u8 = 0x18;
    pub const SEQUENCE: u8 = 0x30;
    pub const SET: u8 = 0x31;
    pub const CONTEXT_SPECIFIC: u8 = 0x80;
    pub const CONSTRUCTED: u8 = 0x20;
}

/// Largest tag content length accepted on decode (1 GiB). Keeps all length
/// arithmetic comfortably within 32-bit bounds on constrained targets.
pub const MAX_TAG_CONTENT: usize = 0x4000_0000;

/// Flag set on an [`OidId`] when the identifier's byte sum resolved to no
/// entry in the compiled OID table.
pub const OID_NOT_FOUND: i32 = 0x8000;

/// A decoded OBJECT IDENTIFIER, reduced to a small integer.
///
/// The base value is the sum of the identifier's raw arc bytes; when the
/// `oid-db` table is compiled in, colliding sums are disambiguated by exact
/// byte comparison (see [`crate::oid`]). Identifiers absent from the table
/// carry the [`OID_NOT_FOUND`] flag instead of failing the decode; callers
/// decide whether an unrecognized OID is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OidId(pub i32);

impl OidId {
    pub fn is_known(self) -> bool {
        self.0 & OID_NOT_FOUND == 0
    }
}

/// Size of the tag+length header for a given content length: 2 bytes for
/// short-form lengths, 3 to 6 for long form (up to 32-bit lengths).
pub fn header_len(content_len: usize) -> usize {
    if content_len < 128 {
        2
    } else if content_len < 256 {
        3
    } else if content_len < 65536 {
        4
    } else if content_len < 16777216 {
        5
    } else {
        6
    }
}

/// Write a tag+length header into `out`, which must hold at least
/// `header_len(content_len)` bytes.
///
/// Lengths under 128 use the single-byte short form; larger lengths use
/// `0x81..0x84` followed by that many big-endian length bytes, mirroring the
/// decode side exactly.
pub fn encode_header(tag: u8, content_len: usize, out: &mut [u8]) {
    debug_assert!(content_len <= u32::MAX as usize);
    out[0] = tag;
    if content_len < 128 {
        out[1] = content_len as u8;
    } else if content_len < 256 {
        out[1] = 0x81;
        out[2] = content_len as u8;
    } else if content_len < 65536 {
        out[1] = 0x82;
        out[2] = (content_len >> 8) as u8;
        out[3] = content_len as u8;
    } else if content_len < 16777216 {
        out[1] = 0x83;
        out[2] = (content_len >> 16) as u8;
        out[3] = (content_len >> 8) as u8;
        out[4] = content_len as u8;
    } else {
        out[1] = 0x84;
        out[2] = (content_len >> 24) as u8;
        out[3] = (content_len >> 16) as u8;
        out[4] = (content_len >> 8) as u8;
        out[5] = content_len as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_len_boundaries() {
        assert_eq!(header_len(0), 2);
        assert_eq!(header_len(127), 2);
        assert_eq!(header_len(128), 3);
        assert_eq!(header_len(255), 3);
        assert_eq!(header_len(256), 4);
        assert_eq!(header_len(65535), 4);
        assert_eq!(header_len(65536), 5);
        assert_eq!(header_len(16777215), 5);
        assert_eq!(header_len(16777216), 6);
    }

    #[test]
    fn test_encode_header_forms() {
        let mut out = [0u8; 6];
        encode_header(0x04, 5, &mut out);
        assert_eq!(&out[..2], &[0x04, 0x05]);
        encode_header(0x04, 200, &mut out);
        assert_eq!(&out[..3], &[0x04, 0x81, 200]);
        encode_header(0x30, 0x1234, &mut out);
        assert_eq!(&out[..4], &[0x30, 0x82, 0x12, 0x34]);
        encode_header(0x30, 0x123456, &mut out);
        assert_eq!(&out[..5], &[0x30, 0x83, 0x12, 0x34, 0x56]);
        encode_header(0x30, 0x12345678, &mut out);
        assert_eq!(&out[..6], &[0x30, 0x84, 0x12, 0x34, 0x56, 0x78]);
    }
}
