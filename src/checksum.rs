//! Checksum validation for text header lines and binary byte ranges.

use crate::error::DecodeError;

/// XOR checksum over a header line payload (the bytes between `$` and `*`).
pub fn line_checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |acc, b| acc ^ b)
}

/// Build a checksummed header line from a payload, e.g. `P,2` into
/// `$P,2*4E`. Test fixture helper; the decoder has no write path.
#[cfg(test)]
pub fn make_line(payload: &str) -> String {
    format!("${payload}*{:02X}", line_checksum(payload.as_bytes()))
}

/// Validate a `$<payload>*<HH>` header line against its stated checksum.
pub fn validate_line(lineno: usize, line: &str) -> Result<(), DecodeError> {
    let rest = line
        .strip_prefix('$')
        .ok_or_else(|| DecodeError::MalformedHeader {
            line: lineno,
            reason: "missing '$' prefix".into(),
        })?;

    let (payload, trailer) =
        rest.rsplit_once('*')
            .ok_or_else(|| DecodeError::MalformedHeader {
                line: lineno,
                reason: "missing '*' checksum separator".into(),
            })?;

    let stated =
        u8::from_str_radix(trailer.trim(), 16).map_err(|_| DecodeError::MalformedHeader {
            line: lineno,
            reason: format!("unparseable checksum {trailer:?}"),
        })?;

    if line_checksum(payload.as_bytes()) != stated {
        return Err(DecodeError::HeaderChecksum { line: lineno });
    }
    Ok(())
}

/// Validate a binary byte range against its trailing checksum byte.
///
/// Device firmware disagrees on the scheme: some write the two's-complement
/// negated sum of the range, some the XOR. A range is accepted when the
/// trailer matches either. Do not tighten this to a single scheme.
pub fn accepts_binary(bytes: &[u8], trailer: u8) -> bool {
    let mut sum = 0u8;
    let mut xor = 0u8;
    for &b in bytes {
        sum = sum.wrapping_add(b);
        xor ^= b;
    }
    let negated_sum = sum.wrapping_neg();
    trailer == negated_sum || trailer == xor
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_debug_snapshot;

    #[test]
    fn line_checksum_matches_known_header() {
        // Captured from a real 930 download.
        assert_eq!(line_checksum(b"A, 305,230,500,415,60,1650,230,90"), 0x5F);
        assert_eq!(line_checksum(b"F,0,999,  0,2950,2950"), 0x53);
    }

    #[test]
    fn generated_lines_validate() {
        for payload in ["A,305,230,500,415,60,1650,230,90", "P,2", "U,N12345"] {
            let line = make_line(payload);
            validate_line(1, &line).unwrap();
        }
    }

    #[test]
    fn validation_fails_for_wrong_checksum() {
        assert_debug_snapshot!(
            validate_line(3, "$P,2*00").unwrap_err(),
            @r###"
        HeaderChecksum {
            line: 3,
        }
        "###
        );
    }

    #[test]
    fn validation_fails_without_dollar() {
        assert!(matches!(
            validate_line(1, "P,2*6E").unwrap_err(),
            DecodeError::MalformedHeader { line: 1, .. }
        ));
    }

    #[test]
    fn validation_fails_without_asterisk() {
        assert!(matches!(
            validate_line(2, "$P,2").unwrap_err(),
            DecodeError::MalformedHeader { line: 2, .. }
        ));
    }

    #[test]
    fn validation_fails_for_unparseable_trailer() {
        assert!(matches!(
            validate_line(4, "$P,2*ZZ").unwrap_err(),
            DecodeError::MalformedHeader { line: 4, .. }
        ));
    }

    #[test]
    fn binary_accepts_negated_sum() {
        let bytes = [0x10u8, 0x20, 0x30];
        let sum_trailer = 0x60u8.wrapping_neg();
        let xor_trailer = 0x10 ^ 0x20 ^ 0x30;
        assert_ne!(sum_trailer, xor_trailer);
        assert!(accepts_binary(&bytes, sum_trailer));
    }

    #[test]
    fn binary_accepts_xor() {
        let bytes = [0x10u8, 0x20, 0x30];
        assert!(accepts_binary(&bytes, 0x10 ^ 0x20 ^ 0x30));
    }

    #[test]
    fn binary_rejects_neither_scheme() {
        let bytes = [0x10u8, 0x20, 0x30];
        assert!(!accepts_binary(&bytes, 0x42));
    }

    #[test]
    fn binary_empty_range_checksums_to_zero() {
        assert!(accepts_binary(&[], 0));
        assert!(!accepts_binary(&[], 1));
    }
}
