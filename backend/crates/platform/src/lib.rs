//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, Base64)
//! - Derived credentials (keyed per-phone secret, Argon2id at rest)
//! - Cookie management
//! - Rate limiting policy and storage trait

pub mod cookie;
pub mod credential;
pub mod crypto;
pub mod rate_limit;
