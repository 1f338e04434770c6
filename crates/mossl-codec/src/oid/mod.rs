//! Compiled table of well-known OBJECT IDENTIFIERs.
//!
//! Identifiers are keyed by the sum of their raw arc bytes — fast but
//! collision-prone, so the table resolves each sum by exact byte comparison
//! and assigns colliding identifiers the next multiple of [`OID_COLLISION`]
//! above the shared sum. The table holds three such natural collisions
//! (md5/sha1WithRSAEncryption, sha256/aes128-CBC,
//! ecdsa-with-SHA512/prime256v1).

use crate::asn1::{OidId, OID_NOT_FOUND};

/// Offset added to a colliding byte sum to disambiguate it.
pub const OID_COLLISION: i32 = 512;

// Digest algorithms.
pub const SHA1_ALG: OidId = OidId(88);
pub const SHA256_ALG: OidId = OidId(414);
pub const SHA384_ALG: OidId = OidId(415);
pub const SHA512_ALG: OidId = OidId(416);
pub const MD5_ALG: OidId = OidId(649);

// RSA signatures and keys.
pub const RSA_KEY_ALG: OidId = OidId(645);
pub const RSASSA_PSS: OidId = OidId(654);
pub const SHA1_RSA_SIG: OidId = OidId(1161); // collides with MD5_ALG
pub const SHA256_RSA_SIG: OidId = OidId(655);
pub const SHA384_RSA_SIG: OidId = OidId(656);
pub const SHA512_RSA_SIG: OidId = OidId(657);

// ECDSA signatures, keys and curves.
pub const ECDSA_KEY_ALG: OidId = OidId(518);
pub const SHA256_ECDSA_SIG: OidId = OidId(524);
pub const SHA384_ECDSA_SIG: OidId = OidId(525);
pub const SHA512_ECDSA_SIG: OidId = OidId(526);
pub const PRIME256V1: OidId = OidId(1038); // collides with SHA512_ECDSA_SIG
pub const SECP384R1: OidId = OidId(210);
pub const SECP521R1: OidId = OidId(211);

// Edwards/Montgomery keys.
pub const X25519_KEY_ALG: OidId = OidId(254);
pub const ED25519_KEY_ALG: OidId = OidId(256);

// AES modes.
pub const AES128_CBC: OidId = OidId(926); // collides with SHA256_ALG
pub const AES128_GCM: OidId = OidId(418);
pub const AES192_CBC: OidId = OidId(434);
pub const AES256_CBC: OidId = OidId(454);
pub const AES256_GCM: OidId = OidId(458);

// PKCS#5 and PKCS#7.
pub const PKCS_PBKDF2: OidId = OidId(660);
pub const PKCS_PBES2: OidId = OidId(661);
pub const PKCS7_DATA: OidId = OidId(651);
pub const PKCS7_SIGNED_DATA: OidId = OidId(652);
pub const PKCS7_ENVELOPED_DATA: OidId = OidId(653);

/// Known OIDs, sorted by resolved id. Each entry pairs the id with the raw
/// DER content bytes of the identifier.
static KNOWN_OIDS: &[(i32, &[u8])] = &[
    (88, &[0x2B, 0x0E, 0x03, 0x02, 0x1A]),  // sha1
    (210, &[0x2B, 0x81, 0x04, 0x00, 0x22]), // secp384r1
    (211, &[0x2B, 0x81, 0x04, 0x00, 0x23]), // secp521r1
    (254, &[0x2B, 0x65, 0x6E]),             // x25519
    (256, &[0x2B, 0x65, 0x70]),             // ed25519
    (414, &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01]), // sha256
    (415, &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02]), // sha384
    (416, &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03]), // sha512
    (418, &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x06]), // aes128-GCM
    (434, &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x16]), // aes192-CBC
    (454, &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x2A]), // aes256-CBC
    (458, &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x2E]), // aes256-GCM
    (518, &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01]), // ecPublicKey
    (524, &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x02]), // ecdsa-with-SHA256
    (525, &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x03]), // ecdsa-with-SHA384
    (526, &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x04]), // ecdsa-with-SHA512
    (645, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01]), // rsaEncryption
    (649, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x02, 0x05]), // md5
    (651, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x01]), // pkcs7-data
    (652, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x02]), // pkcs7-signedData
    (653, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x03]), // pkcs7-envelopedData
    (654, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0A]), // rsassa-pss
    (655, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0B]), // sha256WithRSA
    (656, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0C]), // sha384WithRSA
    (657, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0D]), // sha512WithRSA
    (660, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x05, 0x0C]), // pbkdf2
    (661, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x05, 0x0D]), // pbes2
    (926, &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x02]), // aes128-CBC
    (1038, &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07]), // prime256v1
    (1161, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x05]), // sha1WithRSA
];

/// Resolve a byte sum against the table.
///
/// Probes the sum, then successive multiples of [`OID_COLLISION`] above it,
/// comparing the raw arc bytes at each step; an exhausted probe chain marks
/// the id [`OID_NOT_FOUND`] rather than failing.
pub fn resolve(sum: i32, arcs: &[u8]) -> OidId {
    let mut id = sum;
    loop {
        match KNOWN_OIDS.binary_search_by_key(&id, |&(k, _)| k) {
            Err(_) => return OidId(id | OID_NOT_FOUND),
            Ok(i) => {
                if KNOWN_OIDS[i].1 == arcs {
                    return OidId(id);
                }
                id += OID_COLLISION;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sorted_and_sums_consistent() {
        let mut prev = i32::MIN;
        for &(id, bytes) in KNOWN_OIDS {
            assert!(id > prev, "table must stay sorted ({id})");
            prev = id;
            let sum: i32 = bytes.iter().map(|&b| i32::from(b)).sum();
            assert_eq!(
                (id - sum) % OID_COLLISION,
                0,
                "id {id} is not sum {sum} plus collision offsets"
            );
        }
    }

    #[test]
    fn test_resolve_direct_hit() {
        let rsa = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01];
        assert_eq!(resolve(645, rsa), RSA_KEY_ALG);
    }

    #[test]
    fn test_resolve_collisions_disambiguate() {
        let sha256 = &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01];
        let aes128 = &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x02];
        // Same byte sum, different identifiers.
        let sum: i32 = sha256.iter().map(|&b| i32::from(b)).sum();
        let sum2: i32 = aes128.iter().map(|&b| i32::from(b)).sum();
        assert_eq!(sum, sum2);
        assert_eq!(resolve(sum, sha256), SHA256_ALG);
        assert_eq!(resolve(sum, aes128), AES128_CBC);
        assert_ne!(resolve(sum, sha256), resolve(sum, aes128));
    }

    #[test]
    fn test_resolve_unknown_with_colliding_sum() {
        // Matches sha256's sum but with different bytes; the probe chain
        // walks past both known entries and flags the id.
        let fake = &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x00, 0x03];
        let sum: i32 = fake.iter().map(|&b| i32::from(b)).sum();
        let id = resolve(sum, fake);
        assert!(!id.is_known());
    }
}
