//! RC4 stream cipher.
//!
//! Used by the AB-signature protocol to obfuscate the user agent (key
//! `[0x00, 0x01, 0x0E]`) and the assembled payload (key `"y"`). Encryption
//! and decryption are the same XOR, but only from the same keystream
//! position: decrypting requires a freshly keyed instance, not the post-use
//! state of the encrypting one.

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("RC4 key must not be empty")]
    EmptyKey,
}

#[derive(Debug)]
pub struct Rc4 {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// Runs the key schedule. Any non-empty key is valid; the schedule
    /// indexes the key modulo its length.
    pub fn new(key: &[u8]) -> Result<Self, KeyError> {
        let mut rc4 = Rc4 {
            s: [0u8; 256],
            i: 0,
            j: 0,
        };
        rc4.reset(key)?;
        Ok(rc4)
    }

    /// Re-runs the key schedule, restoring the post-KSA starting point.
    pub fn reset(&mut self, key: &[u8]) -> Result<(), KeyError> {
        if key.is_empty() {
            return Err(KeyError::EmptyKey);
        }

        for (i, slot) in self.s.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(self.s[i]).wrapping_add(key[i % key.len()]);
            self.s.swap(i, j as usize);
        }

        self.i = 0;
        self.j = 0;
        Ok(())
    }

    /// XORs `data` against the keystream. Cursor state persists across
    /// calls, so a long stream may be fed in arbitrary chunks.
    pub fn transform(&mut self, data: &[u8]) -> Vec<u8> {
        data.iter().map(|&byte| self.next_byte() ^ byte).collect()
    }

    fn next_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.s[self.i as usize]);
        self.s.swap(self.i as usize, self.j as usize);
        let t = self.s[self.i as usize].wrapping_add(self.s[self.j as usize]);
        self.s[t as usize]
    }
}

impl Drop for Rc4 {
    fn drop(&mut self) {
        // Scrub the permutation so key-derived state does not linger
        self.s = [0u8; 256];
        self.i = 0;
        self.j = 0;
    }
}

/// One-shot transform of `data` under a fresh instance keyed with `key`.
pub fn encrypt(data: &[u8], key: &[u8]) -> Result<Vec<u8>, KeyError> {
    let mut rc4 = Rc4::new(key)?;
    Ok(rc4.transform(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_key_round_trip() {
        let plaintext = b"Hello World!";
        let ciphertext = encrypt(plaintext, b"secretkey").unwrap();
        assert_ne!(&ciphertext, plaintext);
        assert_eq!(encrypt(&ciphertext, b"secretkey").unwrap(), plaintext);
    }

    #[test]
    fn empty_key_is_rejected() {
        assert_eq!(Rc4::new(b"").unwrap_err(), KeyError::EmptyKey);
        assert!(encrypt(b"data", b"").is_err());
    }

    #[test]
    fn single_byte_key_is_valid() {
        let ciphertext = encrypt(b"payload", b"y").unwrap();
        assert_eq!(encrypt(&ciphertext, b"y").unwrap(), b"payload");
    }

    #[test]
    fn different_keys_differ() {
        let a = encrypt(b"test data", b"key1").unwrap();
        let b = encrypt(b"test data", b"key2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn keystream_continues_across_calls() {
        let mut streaming = Rc4::new(b"testkey").unwrap();
        let mut chunked = streaming.transform(b"First message");
        chunked.extend(streaming.transform(b"Second message"));

        let mut whole = Rc4::new(b"testkey").unwrap();
        assert_eq!(chunked, whole.transform(b"First messageSecond message"));
    }

    #[test]
    fn reset_restores_keystream_position() {
        let mut rc4 = Rc4::new(b"testkey").unwrap();
        let first = rc4.transform(b"some plaintext");
        rc4.reset(b"testkey").unwrap();
        let second = rc4.transform(b"some plaintext");
        assert_eq!(first, second);
    }

    #[test]
    fn reset_with_empty_key_fails_and_keeps_no_promise() {
        let mut rc4 = Rc4::new(b"k").unwrap();
        assert!(rc4.reset(b"").is_err());
    }

    #[test]
    fn large_input() {
        let plaintext = vec![b'A'; 1000];
        let ciphertext = encrypt(&plaintext, b"largekey").unwrap();
        assert_eq!(ciphertext.len(), plaintext.len());
        assert_eq!(encrypt(&ciphertext, b"largekey").unwrap(), plaintext);
    }
}
