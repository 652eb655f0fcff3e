//! # dysig-rs
//!
//! This crate reproduces the anti-bot request signatures used by the Douyin
//! and TikTok live-stream web APIs. It is geared towards being a library:
//! the platform adapters that own HTTP, room parsing and recording hand a
//! query string and a user agent to a signer and get back an opaque token
//! to append to the outgoing request. No I/O happens here.
//!
//! ## Usage
//!
//! ```rust
//! use dysig_rs::signer::{DouyinSigner, RequestSigner, SignRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     // What the platform adapter would sign
//!     let request = SignRequest {
//!         query: "aid=6383&device_platform=web&web_rid=123456".into(),
//!         user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".into(),
//!         cookie: None,
//!     };
//!
//!     // Sign through the strategy interface
//!     let token = DouyinSigner.sign(&request).await.unwrap();
//!
//!     // The caller appends the token to its request URL
//!     let url = format!(
//!         "https://live.douyin.com/webcast/room/web/enter/?{}&a_bogus={}",
//!         request.query, token
//!     );
//!     assert!(url.ends_with(&token));
//! }
//! ```
//!
//! The `douyin` module is a bit-exact rendition of the reverse-engineered
//! AB-signature protocol built on the `sm3`, `rc4` and `base64` primitives;
//! `tiktok` is a simpler stand-in token scheme behind the same `signer`
//! interface.

#[forbid(unsafe_code)]
#[macro_use]
extern crate log;

pub mod base64;
pub mod douyin;
pub mod rc4;
pub mod signer;
pub mod sm3;
pub mod tiktok;
