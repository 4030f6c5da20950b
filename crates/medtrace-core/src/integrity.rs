// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input fingerprinting: SHA-256 of the inspected photograph so a report can be
// tied back to the exact bytes it was computed from.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_lowercase_hex_sha256() {
        // FIPS 180-2 test vector for "abc".
        assert_eq!(
            hash_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn one_changed_byte_changes_the_fingerprint() {
        let photo = vec![0x89u8, b'P', b'N', b'G', 0, 1, 2, 3];
        let mut edited = photo.clone();
        edited[7] = 4;
        assert_ne!(hash_bytes(&photo), hash_bytes(&edited));
        assert_eq!(hash_bytes(&photo), hash_bytes(&photo.clone()));
        assert_eq!(hash_bytes(&photo).len(), 64);
    }
}
