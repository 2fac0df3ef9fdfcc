//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Keyed signing and random tokens (HMAC-SHA256, hex / URL-safe base64)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Cookie management
//! - Rate limiting policy and store trait
//! - Client identification

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
pub mod rate_limit;
