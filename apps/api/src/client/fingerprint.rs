//! Session cache key for generation calls that carry no server cache key.

use sha2::{Digest, Sha256};

use crate::models::generation::GenerationRequest;

/// Prefix shared by every client cache entry. Eviction only touches keys under it.
pub const CACHE_PREFIX: &str = "tms_gc_";

/// Characters of each prompt part that feed the fingerprint.
const PREFIX_CHARS: usize = 300;

/// Hex digits kept from the digest (64 bits).
const FINGERPRINT_HEX_LEN: usize = 16;

fn prefix(text: &str) -> &str {
    match text.char_indices().nth(PREFIX_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Hash of the first 300 characters of the system instruction and of the
/// first user turn. Requests that only differ past those prefixes share a key.
pub fn fingerprint(request: &GenerationRequest) -> String {
    let system = request.system_text();
    let user = request.first_user_text();

    let mut hasher = Sha256::new();
    hasher.update(prefix(&system));
    hasher.update("|");
    hasher.update(prefix(&user));
    let digest = format!("{:x}", hasher.finalize());
    digest[..FINGERPRINT_HEX_LEN].to_string()
}

pub fn cache_key(request: &GenerationRequest) -> String {
    format!("{CACHE_PREFIX}{}", fingerprint(request))
}
