//! Strategy interface over the per-platform signature assemblers.
//!
//! Platform adapters depend on [`RequestSigner`], not on a concrete
//! algorithm, so swapping an assembler (say, replacing the placeholder
//! TikTok scheme with the real one) never touches call sites.

use async_trait::async_trait;

use crate::{douyin, tiktok};

#[derive(thiserror::Error, Debug)]
pub enum SignError {
    #[error("Douyin signature failed: {0}")]
    Douyin(#[from] douyin::SignatureError),
    #[error("TikTok signature failed: {0}")]
    Tiktok(#[from] tiktok::XBogusError),
}

/// What a platform adapter hands to a signer: strings in, opaque token
/// out. `query` is the URL query string for Douyin and the full request
/// URL for TikTok; only TikTok reads the cookie.
#[derive(Debug, Clone)]
pub struct SignRequest {
    pub query: String,
    pub user_agent: String,
    pub cookie: Option<String>,
}

#[async_trait]
pub trait RequestSigner: Send + Sync {
    /// Returns the token the caller appends to its outgoing request. An
    /// error means the request must not be sent at all, never sent
    /// unsigned.
    async fn sign(&self, request: &SignRequest) -> Result<String, SignError>;
}

/// Signs with the Douyin AB-signature protocol (`&a_bogus=`).
pub struct DouyinSigner;

/// Signs with the TikTok X-Bogus token scheme.
pub struct TiktokSigner;

#[async_trait]
impl RequestSigner for DouyinSigner {
    async fn sign(&self, request: &SignRequest) -> Result<String, SignError> {
        Ok(douyin::generate_signature(
            &request.query,
            &request.user_agent,
        )?)
    }
}

#[async_trait]
impl RequestSigner for TiktokSigner {
    async fn sign(&self, request: &SignRequest) -> Result<String, SignError> {
        Ok(tiktok::generate_x_bogus(
            &request.query,
            &request.user_agent,
            request.cookie.as_deref(),
        )
        .await?)
    }
}
