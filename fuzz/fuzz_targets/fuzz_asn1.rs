#![no_main]
use libfuzzer_sys::fuzz_target;
use mossl_codec::asn1::{
    decode_algorithm_identifier, decode_integer, decode_oid, decode_sequence, tags,
    EnvelopeCheck, LengthMode,
};
use mossl_codec::parse::ParseBuf;

fuzz_target!(|data: &[u8]| {
    // Walk the input as a flat TLV stream; every well-formed value must be
    // consumed without panicking, every malformed one must stop the walk.
    let mut pb = ParseBuf::new(data);
    while let Some(tl) = pb.peek_tag_len() {
        let tag = pb.remaining()[0];
        if tag == tags::SEQUENCE {
            let sub = pb.read_sub(tags::SEQUENCE);
            let _ = sub.finish();
        } else if pb.skip_tag(tag) != tl.total {
            break;
        }
    }

    // The typed decoders must reject anything malformed without panicking.
    let _ = decode_integer(data);
    let _ = decode_oid(data);
    let _ = decode_sequence(data, LengthMode::AllowIndefinite, EnvelopeCheck::Relaxed);
    let _ = decode_algorithm_identifier(data, EnvelopeCheck::Relaxed);
});
