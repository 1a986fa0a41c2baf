//! Stable cache fingerprints for market snapshots
//!
//! The fingerprint identifies "the same market" across repeated page loads.
//! Prices, probabilities and volumes fluctuate constantly, so they must never
//! feed the digest; only the market's identity does (title, outcome-name set,
//! source URL).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::market::MarketSnapshot;

/// Length of the hex digest kept as the fingerprint
const FINGERPRINT_LEN: usize = 16;

/// Stable cache key derived from a market's identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a raw fingerprint string (e.g. from a URL path segment)
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The fingerprint as a hex string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of a snapshot
///
/// Pure, total and deterministic. Two snapshots differing only in volatile
/// numeric fields produce the same fingerprint; a different title or a
/// different outcome-name set produces a different one. Outcome ordering is
/// irrelevant: names are trimmed, lowercased and sorted before hashing.
pub fn fingerprint(snapshot: &MarketSnapshot) -> Fingerprint {
    let mut names: Vec<String> = snapshot
        .outcomes
        .iter()
        .map(|o| o.name.trim().to_lowercase())
        .collect();
    names.sort();

    let mut hasher = Sha256::new();
    hasher.update(snapshot.title.trim().to_lowercase().as_bytes());
    hasher.update([0u8]);
    for name in &names {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    if let Some(url) = &snapshot.source_url {
        hasher.update(normalize_url(url).as_bytes());
    }

    let digest = hasher.finalize();
    Fingerprint(hex::encode(digest)[..FINGERPRINT_LEN].to_string())
}

/// Normalize a source URL for hashing
///
/// Query strings and fragments carry tracking noise, so they are dropped.
/// Unparseable URLs fall back to the trimmed lowercased raw string; the
/// fingerprint must stay total.
fn normalize_url(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.as_str().trim_end_matches('/').to_lowercase()
        }
        Err(_) => raw.trim().to_lowercase(),
    }
}
