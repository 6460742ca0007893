//! Distribution archive handling: fetch, verify, unpack, and locate.
//!
//! # Sub-modules
//!
//! - [`download`] - Archive download trait and HTTP implementation.
//! - [`sha256_digest`] - SHA-256 digest newtype (`Sha256Digest`).
//! - [`checksum`] - Best-effort checksum verification of a downloaded file.
//! - [`extraction`] - Archive extraction with path traversal protection.
//! - [`payload`] - Ordered search for the payload root in an extracted tree.

pub mod checksum;
pub mod download;
pub mod extraction;
pub mod payload;
pub mod sha256_digest;
