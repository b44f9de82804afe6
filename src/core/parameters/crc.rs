//! CRC32 calculation for parameter block validation

use crc::{Crc, Digest, CRC_32_ISO_HDLC};

/// CRC32 algorithm (ISO HDLC / Ethernet / ZIP)
static CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Calculate CRC32 checksum of data
///
/// # Example
///
/// ```
/// use gantry::core::parameters::crc::calculate_crc32;
///
/// assert_eq!(calculate_crc32(b"123456789"), 0xCBF43926);
/// ```
pub fn calculate_crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

/// Validate data against CRC32 checksum
pub fn validate_crc32(data: &[u8], expected_crc: u32) -> bool {
    calculate_crc32(data) == expected_crc
}

/// Incremental CRC32 over data read in pieces
pub fn crc32_digest() -> Digest<'static, u32> {
    CRC32.digest()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_values() {
        let test_cases = [
            (b"" as &[u8], 0x00000000u32),
            (b"a", 0xE8B7BE43),
            (b"abc", 0x352441C2),
            (b"123456789", 0xCBF43926),
        ];

        for (data, expected) in test_cases {
            assert_eq!(calculate_crc32(data), expected);
        }
    }

    #[test]
    fn test_validate_crc32() {
        let data = b"GNTR block";
        let crc = calculate_crc32(data);

        assert!(validate_crc32(data, crc));
        assert!(!validate_crc32(data, crc + 1));
    }

    #[test]
    fn test_digest_matches_checksum() {
        let mut digest = crc32_digest();
        digest.update(b"1234");
        digest.update(b"56789");
        assert_eq!(digest.finalize(), calculate_crc32(b"123456789"));
    }
}
