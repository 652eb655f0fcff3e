//! Multi-table Base64 variant.
//!
//! The platform serves different request types with different substitution
//! alphabets. These are alternate public encodings, not secrets; what
//! matters is picking the exact table the endpoint expects (`s3` for the
//! obfuscated user agent, `s4` for the final token).

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TableError {
    #[error("unknown encoding table: {0}")]
    UnknownTable(String),
}

/// 64 data symbols; the pad symbol `=` is shared by every table.
pub struct Alphabet {
    pub key: &'static str,
    symbols: &'static [u8; 64],
}

impl Alphabet {
    /// The 64 data symbols in index order.
    pub fn symbols(&self) -> &'static [u8; 64] {
        self.symbols
    }

    fn symbol(&self, index: u32) -> char {
        self.symbols[(index & 0x3F) as usize] as char
    }
}

pub const PAD: char = '=';

/// Table used when the protocol does not name one.
pub const DEFAULT_TABLE: &str = "s4";

static TABLES: [Alphabet; 5] = [
    Alphabet {
        key: "s0",
        symbols: b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/",
    },
    Alphabet {
        key: "s1",
        symbols: b"Dkdpgh4ZKsQB80/Mfvw36XI1R25+WUAlEi7NLboqYTOPuzmFjJnryx9HVGcaStCe",
    },
    Alphabet {
        key: "s2",
        symbols: b"Dkdpgh4ZKsQB80/Mfvw36XI1R25-WUAlEi7NLboqYTOPuzmFjJnryx9HVGcaStCe",
    },
    Alphabet {
        key: "s3",
        symbols: b"ckdp1h4ZKsUB80/Mfvw36XIgR25+WQAlEi7NLboqYTOPuzmFjJnryx9HVGDaStCe",
    },
    Alphabet {
        key: "s4",
        symbols: b"Dkdpgh2ZmsQB80/MfvV36XI1R45-WUAlEixNLwoqYTOPuzKFjJnry79HbGcaStCe",
    },
];

/// Looks up a table by key. Unknown keys are a hard error so a typo can
/// never silently degrade to the wrong alphabet.
pub fn alphabet(key: &str) -> Result<&'static Alphabet, TableError> {
    TABLES
        .iter()
        .find(|t| t.key == key)
        .ok_or_else(|| TableError::UnknownTable(key.to_string()))
}

pub fn table_keys() -> impl Iterator<Item = &'static str> {
    TABLES.iter().map(|t| t.key)
}

/// Classic block encoding: 3 input bytes become a 24-bit big-endian value,
/// emitted as four 6-bit symbols; 1- and 2-byte remainders pad with `==`
/// and `=`.
pub fn encode(input: &[u8], table_key: &str) -> Result<String, TableError> {
    let table = alphabet(table_key)?;
    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);

    let mut chunks = input.chunks_exact(3);
    for chunk in &mut chunks {
        let block = ((chunk[0] as u32) << 16) | ((chunk[1] as u32) << 8) | chunk[2] as u32;
        out.push(table.symbol(block >> 18));
        out.push(table.symbol(block >> 12));
        out.push(table.symbol(block >> 6));
        out.push(table.symbol(block));
    }

    match chunks.remainder() {
        [] => {}
        [b0] => {
            let block = (*b0 as u32) << 16;
            out.push(table.symbol(block >> 18));
            out.push(table.symbol(block >> 12));
            out.push(PAD);
            out.push(PAD);
        }
        [b0, b1] => {
            let block = ((*b0 as u32) << 16) | ((*b1 as u32) << 8);
            out.push(table.symbol(block >> 18));
            out.push(table.symbol(block >> 12));
            out.push(table.symbol(block >> 6));
            out.push(PAD);
        }
        _ => unreachable!("chunks_exact(3) remainder is at most 2 bytes"),
    }

    Ok(out)
}

/// Encodes the UTF-8 bytes of `input`.
pub fn encode_str(input: &str, table_key: &str) -> Result<String, TableError> {
    encode(input.as_bytes(), table_key)
}

/// The signature assembler's variant. Instead of byte triples it groups the
/// string's UTF-16 code units truncated to their low byte, emits exactly
/// `ceil(len * 4 / 3)` symbols (so short remainders produce 2 or 3 symbols
/// with no pad), and treats units past the end of the input as zero. This
/// mirrors the obfuscated client's behavior on non-ASCII input and must not
/// be "corrected" to operate on UTF-8 bytes.
pub fn result_encrypt(input: &str, table_key: &str) -> Result<String, TableError> {
    let table = alphabet(table_key)?;
    let units: Vec<u8> = input.encode_utf16().map(|u| (u & 0xFF) as u8).collect();

    let total = (units.len() * 4).div_ceil(3);
    let mut out = String::with_capacity(total);

    for i in 0..total {
        let base = i / 4 * 3;
        let unit = |idx: usize| units.get(idx).copied().unwrap_or(0) as u32;
        let block = (unit(base) << 16) | (unit(base + 1) << 8) | unit(base + 2);
        let shift = 18 - 6 * (i % 4) as u32;
        out.push(table.symbol(block >> shift));
    }

    Ok(out)
}
