//! SM3 hash engine (GB/T 32905-2016).
//!
//! Merkle-Damgard over 64-byte blocks. The signature assemblers feed this
//! with query strings, user agents and their own intermediate digests; the
//! remote endpoint validates against the same algorithm, so the output has
//! to match the published standard bit for bit.

const IV: [u32; 8] = [
    0x7380166F, 0x4914B2B9, 0x172442D7, 0xDA8A0600, 0xA96F30BC, 0x163138AA, 0xE38DEE4D, 0xB0FB0E4E,
];

fn t(j: usize) -> u32 {
    if j < 16 {
        0x79CC4519
    } else {
        0x7A879D8A
    }
}

fn ff(j: usize, x: u32, y: u32, z: u32) -> u32 {
    if j < 16 {
        x ^ y ^ z
    } else {
        (x & y) | (x & z) | (y & z)
    }
}

fn gg(j: usize, x: u32, y: u32, z: u32) -> u32 {
    if j < 16 {
        x ^ y ^ z
    } else {
        (x & y) | (!x & z)
    }
}

/// Incremental SM3 state. One instance per logical message; `finalize`
/// clears the state back to a fresh message, `reset` does the same at any
/// point.
pub struct Sm3 {
    state: [u32; 8],
    buffer: [u8; 64],
    buffer_len: usize,
    total_len: u64,
}

impl Sm3 {
    pub fn new() -> Self {
        Self {
            state: IV,
            buffer: [0u8; 64],
            buffer_len: 0,
            total_len: 0,
        }
    }

    pub fn reset(&mut self) {
        self.state = IV;
        self.buffer = [0u8; 64];
        self.buffer_len = 0;
        self.total_len = 0;
    }

    /// Absorbs a chunk. Calling this repeatedly is equivalent to a single
    /// call with the concatenation of all chunks.
    pub fn update(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        self.total_len += data.len() as u64;
        let mut rest = data;

        // Top up a partially filled block first
        if self.buffer_len > 0 {
            let take = (64 - self.buffer_len).min(rest.len());
            self.buffer[self.buffer_len..self.buffer_len + take].copy_from_slice(&rest[..take]);
            self.buffer_len += take;
            rest = &rest[take..];

            if self.buffer_len == 64 {
                let block = self.buffer;
                self.compress(&block);
                self.buffer_len = 0;
            }
        }

        while rest.len() >= 64 {
            let block: [u8; 64] = rest[..64].try_into().expect("slice is 64 bytes");
            self.compress(&block);
            rest = &rest[64..];
        }

        if !rest.is_empty() {
            self.buffer[..rest.len()].copy_from_slice(rest);
            self.buffer_len = rest.len();
        }
    }

    /// Pads, compresses the tail and returns the 32-byte digest. The state
    /// is cleared afterwards, so the instance starts a fresh message.
    pub fn finalize(&mut self) -> [u8; 32] {
        let bit_len = self.total_len * 8;

        let mut tail = Vec::with_capacity(128);
        tail.push(0x80u8);
        while (self.buffer_len + tail.len()) % 64 != 56 {
            tail.push(0);
        }
        tail.extend_from_slice(&bit_len.to_be_bytes());

        // Bypass update() so the padding does not count towards the length
        let mut rest: &[u8] = &tail;
        if self.buffer_len > 0 {
            let take = 64 - self.buffer_len;
            let mut block = self.buffer;
            block[self.buffer_len..].copy_from_slice(&rest[..take]);
            self.compress(&block);
            rest = &rest[take..];
        }
        while rest.len() >= 64 {
            let block: [u8; 64] = rest[..64].try_into().expect("slice is 64 bytes");
            self.compress(&block);
            rest = &rest[64..];
        }

        let mut digest = [0u8; 32];
        for (i, word) in self.state.iter().enumerate() {
            digest[i * 4..i * 4 + 4].copy_from_slice(&word.to_be_bytes());
        }

        self.reset();
        digest
    }

    fn compress(&mut self, block: &[u8; 64]) {
        let mut w = [0u32; 68];
        for (i, chunk) in block.chunks_exact(4).enumerate() {
            w[i] = u32::from_be_bytes(chunk.try_into().expect("chunk is 4 bytes"));
        }
        for j in 16..68 {
            let x = w[j - 16] ^ w[j - 9] ^ w[j - 3].rotate_left(15);
            let p1 = x ^ x.rotate_left(15) ^ x.rotate_left(23);
            w[j] = p1 ^ w[j - 13].rotate_left(7) ^ w[j - 6];
        }
        let mut wp = [0u32; 64];
        for j in 0..64 {
            wp[j] = w[j] ^ w[j + 4];
        }

        let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = self.state;
        for j in 0..64 {
            let ss1 = a
                .rotate_left(12)
                .wrapping_add(e)
                .wrapping_add(t(j).rotate_left(j as u32 % 32))
                .rotate_left(7);
            let ss2 = ss1 ^ a.rotate_left(12);
            let tt1 = ff(j, a, b, c)
                .wrapping_add(d)
                .wrapping_add(ss2)
                .wrapping_add(wp[j]);
            let tt2 = gg(j, e, f, g)
                .wrapping_add(h)
                .wrapping_add(ss1)
                .wrapping_add(w[j]);

            d = c;
            c = b.rotate_left(9);
            b = a;
            a = tt1;
            h = g;
            g = f.rotate_left(19);
            f = e;
            e = tt2 ^ tt2.rotate_left(9) ^ tt2.rotate_left(17);
        }

        for (v, x) in self.state.iter_mut().zip([a, b, c, d, e, f, g, h]) {
            *v ^= x;
        }
    }
}

impl Default for Sm3 {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot digest of `data`.
pub fn hash(data: &[u8]) -> [u8; 32] {
    let mut sm3 = Sm3::new();
    sm3.update(data);
    sm3.finalize()
}

/// One-shot digest of `data` as 64 lowercase hex characters.
pub fn hash_hex(data: &[u8]) -> String {
    hash(data).iter().map(|b| format!("{:02x}", b)).collect()
}
