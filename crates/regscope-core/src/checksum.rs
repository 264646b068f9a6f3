use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
pub const CHECKSUM_LEN: usize = 8;

/// Short change-detection fingerprint of `input`.
///
/// Not meant for integrity checks: only the first [`CHECKSUM_LEN`] hex characters of a
/// SHA-256 digest are kept.
pub fn content_checksum(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(CHECKSUM_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_short_lowercase_hex() {
        let sum = content_checksum("alphabetagamma");
        assert_eq!(sum.len(), CHECKSUM_LEN);
        assert!(sum.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn checksum_depends_only_on_content() {
        assert_eq!(content_checksum("abc"), content_checksum("abc"));
        assert_ne!(content_checksum("abc"), content_checksum("acb"));
        // Known SHA-256 prefix of the empty string
        assert_eq!(content_checksum(""), "e3b0c442");
    }
}
