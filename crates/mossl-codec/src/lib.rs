#![forbid(unsafe_code)]
#![doc = "DER/BER encoding core: fixed and growable buffers, parse cursors, ASN.1 grammar."]

pub mod asn1;
pub mod buf;
pub mod dynbuf;
pub mod parse;

#[cfg(feature = "oid-db")]
pub mod oid;
