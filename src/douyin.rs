//! Douyin "AB-signature" assembler.
//!
//! Reproduces the obfuscated client-side signing algorithm the web API uses
//! to gate its endpoints. The caller hands over the outgoing query string
//! and the user agent; the result is appended as `&a_bogus=<token>`. Every
//! byte offset and ordering below is part of the wire protocol, a single
//! mismatch gets the request rejected.
//!
//! Two quirks are deliberate and must not be "fixed": raw cipher output is
//! round-tripped through a lossy UTF-8 decode (invalid sequences become
//! U+FFFD) before the code-unit codec sees it, and the 12-byte "random"
//! prefix is derived from fixed constants so the token is fully
//! reproducible for a fixed timestamp.

use chrono::Utc;

use crate::{base64, rc4, sm3};

#[derive(thiserror::Error, Debug)]
pub enum SignatureError {
    #[error("query string must not be empty")]
    EmptyQuery,
    #[error("user agent must not be empty")]
    EmptyUserAgent,
    #[error("cipher error: {0}")]
    Cipher(#[from] rc4::KeyError),
    #[error("codec error: {0}")]
    Codec(#[from] base64::TableError),
}

/// Screen/viewport geometry the real browser client reports.
const WINDOW_ENV: &str = "1920|1080|1920|1040|0|30|0|0|1872|92|1920|1040|1857|92|1|24|Win32";

/// RC4 key for the user-agent obfuscation chain.
const UA_KEY: [u8; 3] = [0x00, 0x01, 0x0E];

/// RC4 key sealing the assembled payload.
const PAYLOAD_KEY: &[u8] = b"y";

const MARKER: u8 = 3;
const PAGE_ID: u32 = 110_624;
const AID: u32 = 6383;

/// Milliseconds added to the start timestamp to fake an encryption window.
const END_TIME_OFFSET_MS: u64 = 100;

/// Fixed literal suffix double-hashed into the buffer next to the query
/// hash.
const BODY_SUFFIX: &[u8] = b"cus";

/// The six argument pairs written at offsets 26-37, exactly as the original
/// client lays them out: `(0,0)` twice, `(0,1)` twice, `(0,14)`, `(0,0)`.
const OPTION_PAIRS: [[u8; 2]; 6] = [[0, 0], [0, 0], [0, 1], [0, 1], [0, 14], [0, 0]];

/// Order in which the 44 config bytes enter the payload.
const PAYLOAD_ORDER: [usize; 44] = [
    18, 20, 52, 26, 30, 34, 58, 38, 40, 53, 42, 21, 27, 54, 55, 31, 35, 57, 39, 41, 43, 22, 28,
    32, 60, 36, 23, 29, 33, 37, 44, 45, 59, 46, 47, 48, 49, 50, 24, 25, 65, 66, 70, 71,
];

/// Offsets folded into the checksum byte. Same set as [`PAYLOAD_ORDER`]
/// except offset 34, which the layout fixes at zero.
const CHECKSUM_ORDER: [usize; 43] = [
    18, 20, 26, 30, 38, 40, 42, 21, 27, 31, 35, 39, 41, 43, 22, 28, 32, 36, 23, 29, 33, 37, 44,
    45, 46, 47, 48, 49, 50, 24, 25, 52, 53, 54, 55, 57, 58, 59, 60, 65, 66, 70, 71,
];

/// Seeds for the 12-byte prefix: a scaled fraction and a 2-byte option per
/// 4-byte group. Fixed values keep the token reproducible; see the module
/// doc.
const PREFIX_SEEDS: [(f64, [u8; 2]); 3] = [
    (0.123456789, [3, 45]),
    (0.987654321, [1, 0]),
    (0.555555555, [1, 5]),
];

/// The fixed-layout buffer checksummed and serialized into the payload.
/// Fields are named here; [`ConfigBuffer::to_bytes`] is the single place
/// that knows the 73-byte wire layout.
struct ConfigBuffer {
    marker: u8,
    start_time: u64,
    end_time: u64,
    /// `h1[21..23]` of the double-hashed query string.
    query_hash: [u8; 2],
    /// `h2[21..23]` of the double-hashed body suffix.
    body_hash: [u8; 2],
    /// `h3[23..25]` of the hashed obfuscated user agent.
    ua_hash: [u8; 2],
    page_id: u32,
    aid: u32,
    env_len: u16,
}

impl ConfigBuffer {
    /// Serializes the documented 73-byte layout and stamps the checksum
    /// into byte 72. Unlisted offsets stay zero.
    fn to_bytes(&self) -> [u8; 73] {
        let mut data = [0u8; 73];

        data[8] = self.marker;
        data[10..14].copy_from_slice(&(self.end_time as u32).to_le_bytes());
        // Byte 15 is the page-id low half, constant zero, mirrored below

        data[16..20].copy_from_slice(&(self.start_time as u32).to_le_bytes());
        data[24] = (self.start_time >> 32) as u8;
        data[25] = (self.start_time >> 40) as u8;

        for (i, pair) in OPTION_PAIRS.iter().enumerate() {
            data[26 + 2 * i] = pair[0];
            data[27 + 2 * i] = pair[1];
        }

        data[38] = self.query_hash[0];
        data[39] = self.query_hash[1];
        data[40] = self.body_hash[0];
        data[41] = self.body_hash[1];
        data[42] = self.ua_hash[0];
        data[43] = self.ua_hash[1];

        // Mirrored time fields
        data[44] = data[10];
        data[45] = data[11];
        data[46] = data[12];
        data[47] = data[13];
        data[48] = data[8];
        data[49] = (self.end_time >> 32) as u8;
        data[50] = (self.end_time >> 40) as u8;

        data[51] = data[15];
        data[52] = data[15];
        data[53] = (self.page_id >> 8) as u8;
        data[54] = (self.page_id >> 16) as u8;
        data[55] = (self.page_id >> 24) as u8;

        data[56] = self.aid as u8;
        data[57] = (self.aid >> 8) as u8;
        data[58] = (self.aid >> 16) as u8;
        data[59] = (self.aid >> 24) as u8;

        data[64] = self.env_len as u8;
        data[65] = (self.env_len >> 8) as u8;
        data[66] = data[65];

        data[72] = checksum(&data);
        data
    }

    /// The plaintext sealed under [`PAYLOAD_KEY`]: the 44 selected config
    /// bytes, the window-environment string, the checksum byte.
    fn payload(&self) -> Vec<u8> {
        let data = self.to_bytes();
        let mut out: Vec<u8> = PAYLOAD_ORDER.iter().map(|&i| data[i]).collect();
        out.extend_from_slice(WINDOW_ENV.as_bytes());
        out.push(data[72]);
        out
    }
}

fn checksum(data: &[u8; 73]) -> u8 {
    CHECKSUM_ORDER.iter().fold(0, |acc, &i| acc ^ data[i])
}

/// Merges the even bits of one byte with the odd bits of another, per the
/// original's prefix scrambler.
fn interleave(seed: u16, option: [u8; 2]) -> [u8; 4] {
    let lo = seed as u8;
    let hi = (seed >> 8) as u8;
    [
        (lo & 0xAA) | (option[0] & 0x55),
        (lo & 0x55) | (option[0] & 0xAA),
        (hi & 0xAA) | (option[1] & 0x55),
        (hi & 0x55) | (option[1] & 0xAA),
    ]
}

fn prefix_bytes() -> [u8; 12] {
    let mut out = [0u8; 12];
    for (i, (fraction, option)) in PREFIX_SEEDS.iter().enumerate() {
        let seed = (fraction * 10000.0) as u16;
        out[i * 4..i * 4 + 4].copy_from_slice(&interleave(seed, *option));
    }
    out
}

/// Signs `query` and `user_agent` with the current clock.
pub fn generate_signature(query: &str, user_agent: &str) -> Result<String, SignatureError> {
    generate_signature_at(query, user_agent, Utc::now().timestamp_millis() as u64)
}

/// Signs with an explicit start timestamp (Unix milliseconds). The output
/// is fully deterministic for fixed inputs, which is what makes the
/// protocol testable; [`generate_signature`] is this plus the clock.
pub fn generate_signature_at(
    query: &str,
    user_agent: &str,
    start_time: u64,
) -> Result<String, SignatureError> {
    let payload = assemble_payload(query, user_agent, start_time)?;
    let sealed = rc4::encrypt(&payload, PAYLOAD_KEY)?;

    let plain = format!(
        "{}{}",
        String::from_utf8_lossy(&prefix_bytes()),
        String::from_utf8_lossy(&sealed)
    );
    let mut token = base64::result_encrypt(&plain, "s4")?;
    token.push(base64::PAD);

    debug!("generated a_bogus {} for query {}", token, query);
    Ok(token)
}

/// Hash chain plus config serialization; everything up to the payload seal.
fn assemble_payload(
    query: &str,
    user_agent: &str,
    start_time: u64,
) -> Result<Vec<u8>, SignatureError> {
    if query.is_empty() {
        return Err(SignatureError::EmptyQuery);
    }
    if user_agent.is_empty() {
        return Err(SignatureError::EmptyUserAgent);
    }

    let end_time = start_time + END_TIME_OFFSET_MS;

    let query_hash = sm3::hash(&sm3::hash(query.as_bytes()));
    let body_hash = sm3::hash(&sm3::hash(BODY_SUFFIX));

    // RC4 -> s3 codec -> hash, the client's user-agent obfuscation chain.
    // The cipher bytes pass through a lossy UTF-8 decode before the codec;
    // the replacement characters it introduces are part of the protocol.
    let ua_cipher = rc4::encrypt(user_agent.as_bytes(), &UA_KEY)?;
    let ua_encoded = base64::result_encrypt(&String::from_utf8_lossy(&ua_cipher), "s3")?;
    let ua_hash = sm3::hash(ua_encoded.as_bytes());

    let config = ConfigBuffer {
        marker: MARKER,
        start_time,
        end_time,
        query_hash: [query_hash[21], query_hash[22]],
        body_hash: [body_hash[21], body_hash[22]],
        ua_hash: [ua_hash[23], ua_hash[24]],
        page_id: PAGE_ID,
        aid: AID,
        env_len: WINDOW_ENV.len() as u16,
    };

    Ok(config.payload())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
    const QUERY: &str = "aid=6383&live_id=1&device_platform=web&web_rid=123456";

    fn test_config() -> ConfigBuffer {
        ConfigBuffer {
            marker: MARKER,
            start_time: 1_700_000_000_123,
            end_time: 1_700_000_000_223,
            query_hash: [0x11, 0x22],
            body_hash: [0x33, 0x44],
            ua_hash: [0x55, 0x66],
            page_id: PAGE_ID,
            aid: AID,
            env_len: WINDOW_ENV.len() as u16,
        }
    }

    #[test]
    fn config_layout_matches_documented_offsets() {
        let data = test_config().to_bytes();

        assert_eq!(data[8], 3);
        // end_time low 32 bits, little-endian
        assert_eq!(
            u32::from_le_bytes(data[10..14].try_into().unwrap()) as u64,
            1_700_000_000_223u64 & 0xFFFF_FFFF
        );
        // start_time split across 16-19 and 24-25
        assert_eq!(
            u32::from_le_bytes(data[16..20].try_into().unwrap()) as u64,
            1_700_000_000_123u64 & 0xFFFF_FFFF
        );
        assert_eq!(data[24], (1_700_000_000_123u64 >> 32) as u8);
        assert_eq!(data[25], (1_700_000_000_123u64 >> 40) as u8);
        // argument pairs
        assert_eq!(&data[26..38], &[0, 0, 0, 0, 0, 1, 0, 1, 0, 14, 0, 0]);
        // hash selections
        assert_eq!(&data[38..44], &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        // mirrored time fields
        assert_eq!(&data[44..48], &data[10..14]);
        assert_eq!(data[48], data[8]);
        // page id 110624 = 0x0001B020, bytes 8/16/24 after the zero mirrors
        assert_eq!(&data[51..56], &[0, 0, 0xB0, 0x01, 0x00]);
        // aid 6383 = 0x18EF
        assert_eq!(&data[56..60], &[0xEF, 0x18, 0x00, 0x00]);
        // window env length, low/high/duplicate
        assert_eq!(data[64], WINDOW_ENV.len() as u8);
        assert_eq!(data[65], 0);
        assert_eq!(data[66], data[65]);
    }

    #[test]
    fn checksum_invariant_holds_on_a_built_buffer() {
        let data = test_config().to_bytes();
        assert_eq!(checksum(&data), data[72]);

        // The payload selection order folds to the same value because the
        // only offset it adds, 34, is fixed at zero
        let payload_fold = PAYLOAD_ORDER.iter().fold(0u8, |acc, &i| acc ^ data[i]);
        assert_eq!(payload_fold, data[72]);
        assert_eq!(data[34], 0);
    }

    #[test]
    fn payload_is_selection_then_env_then_checksum() {
        let config = test_config();
        let data = config.to_bytes();
        let payload = config.payload();

        assert_eq!(payload.len(), 44 + WINDOW_ENV.len() + 1);
        assert_eq!(payload[0], data[18]);
        assert_eq!(payload[43], data[71]);
        assert_eq!(&payload[44..44 + WINDOW_ENV.len()], WINDOW_ENV.as_bytes());
        assert_eq!(payload[payload.len() - 1], data[72]);
    }

    #[test]
    fn prefix_is_the_fixed_constant() {
        assert_eq!(
            prefix_bytes(),
            [131, 82, 5, 44, 129, 20, 34, 4, 163, 17, 5, 21]
        );
    }

    #[test]
    fn signature_is_deterministic_at_a_fixed_timestamp() {
        let a = generate_signature_at(QUERY, UA, 1_700_000_000_000).unwrap();
        let b = generate_signature_at(QUERY, UA, 1_700_000_000_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn payload_tracks_its_inputs() {
        let base = assemble_payload(QUERY, UA, 1_700_000_000_000).unwrap();
        let other_query = assemble_payload("web_rid=7", UA, 1_700_000_000_000).unwrap();
        let other_ua = assemble_payload(QUERY, "curl/8.0", 1_700_000_000_000).unwrap();
        let other_time = assemble_payload(QUERY, UA, 1_700_000_000_001).unwrap();

        assert_ne!(base, other_query);
        assert_ne!(base, other_ua);
        assert_ne!(base, other_time);
    }

    #[test]
    fn signature_is_printable_and_pad_terminated() {
        let token = generate_signature_at(QUERY, UA, 1_700_000_000_000).unwrap();
        assert!(token.ends_with('='));
        assert!(token.len() > 50);

        let alphabet = crate::base64::alphabet("s4").unwrap();
        assert!(token
            .chars()
            .all(|c| c == '=' || alphabet.symbols().contains(&(c as u8))));
    }

    #[test]
    fn empty_arguments_are_rejected() {
        assert!(matches!(
            generate_signature("", UA),
            Err(SignatureError::EmptyQuery)
        ));
        assert!(matches!(
            generate_signature(QUERY, ""),
            Err(SignatureError::EmptyUserAgent)
        ));
    }

    #[test]
    fn clock_variant_produces_a_token() {
        let token = generate_signature(QUERY, UA).unwrap();
        assert!(token.ends_with('='));
    }
}
