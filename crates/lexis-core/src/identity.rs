//! Term identity generation and validation.
//!
//! Three URI flavors, one per term kind: external URIs are caller-supplied
//! and validated against a strict http(s) grammar; local URIs append a random
//! UUID to the configured base; temporary URIs are a pure function of
//! (vocabulary, value), which is what makes temporary-term creation
//! idempotent.

use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Hex-encoded SHA-256 digest of the input.
///
/// Shared by URI derivation and by the relational layer's fixed-width
/// `uri_hash`/`value_hash` integrity columns.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validate an absolute http(s) URI against the strict grammar.
///
/// Rejects non-http(s) schemes, host-less URIs, and anything containing
/// whitespace (the parser would silently percent-encode it, which is not the
/// identity the caller supplied).
pub fn validate_uri(uri: &str) -> Result<()> {
    if uri.chars().any(char::is_whitespace) {
        return Err(Error::InvalidUri(uri.to_string()));
    }

    let parsed = Url::parse(uri).map_err(|_| Error::InvalidUri(uri.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err(Error::InvalidUri(uri.to_string())),
    }
    if parsed.host_str().is_none() {
        return Err(Error::InvalidUri(uri.to_string()));
    }

    Ok(())
}

/// Mint a local-term URI: `base` + random UUIDv4.
///
/// Collisions are astronomically unlikely but not impossible; the term
/// repository retries generation on a uniqueness conflict.
pub fn local_uri(base: &str) -> String {
    format!("{}{}", base, Uuid::new_v4())
}

/// Derive the temporary-term URI: `base` + hex(SHA-256(vocabulary + value)).
///
/// Pure and deterministic — recomputing for the same inputs always yields the
/// same URI. The term repository re-derives this during creation and rejects
/// any caller-supplied URI that does not match.
pub fn temporary_uri(base: &str, vocabulary_string_key: &str, value: &str) -> String {
    format!(
        "{}{}",
        base,
        sha256_hex(&format!("{}{}", vocabulary_string_key, value))
    )
}
