use spm_types::checksum::sha256_hex;

/// SHA-256 of the UTF-8 bytes of `content`, lowercase hex.
pub fn calculate_checksum(content: &str) -> String {
    sha256_hex(content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn matches_known_digest() {
        assert_eq!(
            calculate_checksum("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    proptest! {
        #[test]
        fn deterministic_and_distinguishing(a in ".*", b in ".*") {
            prop_assert_eq!(calculate_checksum(&a), calculate_checksum(&a));
            if a != b {
                prop_assert_ne!(calculate_checksum(&a), calculate_checksum(&b));
            }
        }
    }
}
