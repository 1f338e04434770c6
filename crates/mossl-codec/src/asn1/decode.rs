//! Stateless DER/BER grammar decoders.
//!
//! Every function takes the undecoded input slice and returns the decoded
//! value together with the rest of the input, failing fast on the first
//! error. These are the primitives the certificate and key-format layers
//! build on, either directly or through a `ParseBuf`.

use mossl_types::CodecError;

use super::{tags, OidId};

/// Whether an indefinite-length marker (`0x80`) is accepted.
///
/// Indefinite lengths are BER-only; DER forbids them. The allow mode exists
/// as a pass-through for specific legacy structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMode {
    DefiniteOnly,
    AllowIndefinite,
}

/// Whether a decoded length must fit the bytes actually present.
///
/// Stream parsers that deliberately buffer less than a full value use
/// `Streaming` to skip the availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Strict,
    Streaming,
}

/// Strictness of the outer/inner envelope length consistency check.
///
/// Some real-world encoders emit an outer length smaller than the inner
/// one; `Relaxed` tolerates the mismatch for interoperability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeCheck {
    Strict,
    Relaxed,
}

/// A decoded length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedLength {
    Definite(usize),
    /// Indefinite-length marker; carries the number of bytes remaining in
    /// the enclosing buffer ("consume to end").
    Indefinite(usize),
}

/// Decode a length field (the input starts at the first length byte).
///
/// Short form encodes the length directly; long form uses a count byte
/// `0x81..0x84` followed by that many big-endian bytes. More than four
/// length bytes, a truncated length field, or a disallowed indefinite
/// marker yield `MalformedLength`; a definite length exceeding the
/// remaining input yields `TruncatedInput` under `Availability::Strict`.
pub fn decode_length(
    input: &[u8],
    mode: LengthMode,
    avail: Availability,
) -> Result<(DecodedLength, &[u8]), CodecError> {
    let Some((&first, rest)) = input.split_first() else {
        return Err(CodecError::MalformedLength);
    };
    let low = (first & 0x7F) as usize;
    if first & 0x80 == 0 {
        if avail == Availability::Strict && rest.len() < low {
            return Err(CodecError::TruncatedInput);
        }
        return Ok((DecodedLength::Definite(low), rest));
    }
    match low {
        0 => match mode {
            LengthMode::AllowIndefinite => Ok((DecodedLength::Indefinite(rest.len()), rest)),
            LengthMode::DefiniteOnly => Err(CodecError::MalformedLength),
        },
        1..=4 => {
            if rest.len() < low {
                return Err(CodecError::MalformedLength);
            }
            let mut len = 0usize;
            for &b in &rest[..low] {
                len = (len << 8) | b as usize;
            }
            let rest = &rest[low..];
            if avail == Availability::Strict && rest.len() < len {
                return Err(CodecError::TruncatedInput);
            }
            Ok((DecodedLength::Definite(len), rest))
        }
        _ => Err(CodecError::MalformedLength),
    }
}

fn decode_envelope(
    input: &[u8],
    tag: u8,
    mode: LengthMode,
    check: EnvelopeCheck,
) -> Result<(DecodedLength, &[u8]), CodecError> {
    let Some((&t, rest)) = input.split_first() else {
        return Err(CodecError::TruncatedInput);
    };
    if t != tag {
        return Err(CodecError::UnexpectedTag);
    }
    let avail = match check {
        EnvelopeCheck::Strict => Availability::Strict,
        EnvelopeCheck::Relaxed => Availability::Streaming,
    };
    decode_length(rest, mode, avail)
}

/// Decode a SEQUENCE envelope, returning the content length and the input
/// positioned at the first content byte.
pub fn decode_sequence(
    input: &[u8],
    mode: LengthMode,
    check: EnvelopeCheck,
) -> Result<(DecodedLength, &[u8]), CodecError> {
    decode_envelope(input, tags::SEQUENCE, mode, check)
}

/// Decode a SET envelope, returning the content length and the input
/// positioned at the first content byte.
pub fn decode_set(
    input: &[u8],
    mode: LengthMode,
    check: EnvelopeCheck,
) -> Result<(DecodedLength, &[u8]), CodecError> {
    decode_envelope(input, tags::SET, mode, check)
}

fn decode_definite(input: &[u8]) -> Result<(usize, &[u8]), CodecError> {
    match decode_length(input, LengthMode::DefiniteOnly, Availability::Strict)? {
        (DecodedLength::Definite(n), rest) => Ok((n, rest)),
        (DecodedLength::Indefinite(_), _) => Err(CodecError::MalformedLength),
    }
}

fn decode_small_int(input: &[u8], tag: u8) -> Result<(i32, &[u8]), CodecError> {
    let Some((&t, rest)) = input.split_first() else {
        return Err(CodecError::TruncatedInput);
    };
    if t != tag {
        return Err(CodecError::UnexpectedTag);
    }
    let (vlen, rest) = decode_definite(rest)?;
    if vlen == 0 {
        return Err(CodecError::MalformedLength);
    }
    // Content wider than i32 means a big positive integer with a leading
    // blank byte; that belongs to a big-number path, not here.
    if vlen > 4 {
        return Err(CodecError::ValueTooLarge);
    }
    let (content, rest) = rest.split_at(vlen);
    let mut acc: u32 = 0;
    let val = if content[0] & 0x80 != 0 {
        // Negative: accumulate the complement, then negate (acc + 1).
        for &b in content {
            acc = (acc << 8) | u32::from(b ^ 0xFF);
        }
        acc.wrapping_add(1).wrapping_neg() as i32
    } else {
        for &b in content {
            acc = (acc << 8) | u32::from(b);
        }
        acc as i32
    };
    Ok((val, rest))
}

/// Decode an INTEGER that fits in 32 bits, two's-complement.
pub fn decode_integer(input: &[u8]) -> Result<(i32, &[u8]), CodecError> {
    decode_small_int(input, tags::INTEGER)
}

/// Decode an ENUMERATED value that fits in 32 bits.
pub fn decode_enumerated(input: &[u8]) -> Result<(i32, &[u8]), CodecError> {
    decode_small_int(input, tags::ENUMERATED)
}

/// Structural bound on OBJECT IDENTIFIER content; real-world identifiers
/// stay well below this.
pub const MAX_OID_OCTETS: usize = 64;

/// Decode an OBJECT IDENTIFIER to its [`OidId`].
///
/// The identifier is reduced to the sum of its raw arc bytes and, with the
/// `oid-db` feature, resolved against the compiled table (unknown
/// identifiers come back flagged, not as errors).
pub fn decode_oid(input: &[u8]) -> Result<(OidId, &[u8]), CodecError> {
    let Some((&t, rest)) = input.split_first() else {
        return Err(CodecError::TruncatedInput);
    };
    if t != tags::OID {
        return Err(CodecError::UnexpectedTag);
    }
    let (arc_len, rest) = decode_definite(rest)?;
    if arc_len > MAX_OID_OCTETS {
        return Err(CodecError::ValueTooLarge);
    }
    if rest.len() < 2 {
        return Err(CodecError::TruncatedInput);
    }
    let (arcs, rest) = rest.split_at(arc_len);
    let mut sum: i32 = 0;
    for &b in arcs {
        sum += i32::from(b);
    }
    #[cfg(feature = "oid-db")]
    let id = crate::oid::resolve(sum, arcs);
    #[cfg(not(feature = "oid-db"))]
    let id = OidId(sum);
    Ok((id, rest))
}

/// A decoded AlgorithmIdentifier: the algorithm OID plus the raw parameter
/// span (empty when parameters were omitted or an explicit NULL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmIdentifier<'a> {
    pub oid: OidId,
    pub params: &'a [u8],
}

/// Decode an AlgorithmIdentifier SEQUENCE.
///
/// Both common spellings of "no parameters" are handled: an omitted field
/// reports an empty span, and an explicit NULL is consumed transparently.
/// Anything else following the OID is handed back verbatim for the caller
/// to decode.
pub fn decode_algorithm_identifier(
    input: &[u8],
    check: EnvelopeCheck,
) -> Result<(AlgorithmIdentifier<'_>, &[u8]), CodecError> {
    let (len, rest) = decode_sequence(input, LengthMode::DefiniteOnly, check)?;
    let DecodedLength::Definite(content_len) = len else {
        return Err(CodecError::MalformedLength);
    };
    if rest.is_empty() {
        return Err(CodecError::TruncatedInput);
    }
    // Under Relaxed the declared content length may exceed what is present.
    let avail = content_len.min(rest.len());
    let (content, after) = rest.split_at(avail);
    let (oid, tail) = decode_oid(content)?;
    let params = if !tail.is_empty() && tail[0] == tags::NULL {
        // Explicit NULL parameters; skip the 2-byte encoding.
        if tail.len() < 2 {
            return Err(CodecError::TruncatedInput);
        }
        &tail[2..]
    } else {
        tail
    };
    Ok((AlgorithmIdentifier { oid, params }, after))
}
