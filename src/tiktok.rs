//! TikTok X-Bogus token assembler.
//!
//! Unlike the Douyin protocol this is not the reverse-engineered client
//! algorithm: it derives a plausibly shaped token from general-purpose
//! hashes of the request parts. It sits behind
//! [`crate::signer::RequestSigner`] precisely so the real algorithm can
//! replace it without touching call sites.

use chrono::Utc;
use md5::Md5;
use rand::{rngs::StdRng, Rng, SeedableRng};
use sha1::Sha1;
use sha2::{Digest, Sha256};

#[derive(thiserror::Error, Debug)]
pub enum XBogusError {
    #[error("url must not be empty")]
    EmptyUrl,
    #[error("user agent must not be empty")]
    EmptyUserAgent,
    #[error("signing task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

const TOKEN_PREFIX: &str = "DFSz";
const TOKEN_SUFFIX: &str = "000800fDRvXm00000";
const TOKEN_CHARS: &[u8] = b"Dkdpgh4ZKsQB80/Mfvw36XI1R25+WUAlEi7NLboqYTOPuzmFjJnryx9HVGcaStCe=";

/// First four digest bytes as a little-endian word, sign bit cleared.
fn fold_digest(digest: &[u8]) -> u32 {
    u32::from_le_bytes(digest[..4].try_into().expect("digest is at least 4 bytes"))
        & 0x7FFF_FFFF
}

/// Derives the token for an explicit timestamp (Unix milliseconds).
/// Deterministic for fixed inputs; [`generate_x_bogus`] adds the clock and
/// the worker-thread dispatch.
pub fn x_bogus_at(
    url: &str,
    user_agent: &str,
    cookie: Option<&str>,
    timestamp: i64,
) -> Result<String, XBogusError> {
    if url.is_empty() {
        return Err(XBogusError::EmptyUrl);
    }
    if user_agent.is_empty() {
        return Err(XBogusError::EmptyUserAgent);
    }

    let url_hash = fold_digest(Md5::digest(url.as_bytes()).as_slice());
    let ua_hash = fold_digest(Sha1::digest(user_agent.as_bytes()).as_slice());
    let cookie_hash = cookie
        .filter(|c| !c.is_empty())
        .map(|c| fold_digest(Md5::digest(c.as_bytes()).as_slice()))
        .unwrap_or(0);

    let base = format!("{}{}{}{}", url_hash, ua_hash, cookie_hash, timestamp);
    let signature = fold_digest(Sha256::digest(base.as_bytes()).as_slice());

    let mut token = String::from(TOKEN_PREFIX);

    let mut rng = StdRng::seed_from_u64((signature as i64).wrapping_add(timestamp) as u64);
    for _ in 0..4 {
        token.push(TOKEN_CHARS[rng.gen_range(0..TOKEN_CHARS.len())] as char);
    }

    let digits = signature.to_string();
    token.push_str(&digits[..digits.len().min(4)]);
    token.push_str(TOKEN_SUFFIX);

    Ok(token)
}

/// Generates an X-Bogus token for the request. CPU-only work, but it is
/// dispatched onto a blocking worker thread so an I/O-bound caller's task
/// never stalls on it.
pub async fn generate_x_bogus(
    url: &str,
    user_agent: &str,
    cookie: Option<&str>,
) -> Result<String, XBogusError> {
    if url.is_empty() {
        return Err(XBogusError::EmptyUrl);
    }
    if user_agent.is_empty() {
        return Err(XBogusError::EmptyUserAgent);
    }

    let url = url.to_owned();
    let user_agent = user_agent.to_owned();
    let cookie = cookie.map(str::to_owned);

    let token = tokio::task::spawn_blocking(move || {
        x_bogus_at(
            &url,
            &user_agent,
            cookie.as_deref(),
            Utc::now().timestamp_millis(),
        )
    })
    .await??;

    debug!("generated x_bogus {}", token);
    Ok(token)
}
