//! Cache keys for rewrite results.

use std::fmt;

use xxhash_rust::xxh3::Xxh3;

/// 128-bit content hash of a normalized (draft, nature) pair.
///
/// Stable across processes and platforms (unseeded xxh3). Not a
/// cryptographic digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u128);

impl Fingerprint {
    /// Raw hash value.
    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Compute the cache key for a draft and its nature label.
///
/// Leading and trailing whitespace of each field is ignored. The draft is
/// length-prefixed so that moving text across the field boundary always
/// changes the key.
pub fn fingerprint(draft: &str, nature: &str) -> Fingerprint {
    let draft = draft.trim();
    let nature = nature.trim();

    let mut hasher = Xxh3::new();
    hasher.update(&(draft.len() as u64).to_le_bytes());
    hasher.update(draft.as_bytes());
    hasher.update(nature.as_bytes());
    Fingerprint(hasher.digest128())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(fingerprint("a", "b"), fingerprint("a", "b"));
    }

    #[test]
    fn trim_insensitive() {
        assert_eq!(fingerprint(" a ", "b"), fingerprint("a", "b"));
        assert_eq!(fingerprint("a", "\tb\n"), fingerprint("a", "b"));
    }

    #[test]
    fn differs_on_nature() {
        assert_ne!(fingerprint("a", "b"), fingerprint("a", "c"));
    }

    #[test]
    fn differs_on_draft() {
        assert_ne!(fingerprint("a", "b"), fingerprint("x", "b"));
    }

    #[test]
    fn field_boundary_matters() {
        assert_ne!(fingerprint("ab", "c"), fingerprint("a", "bc"));
    }

    #[test]
    fn inner_whitespace_is_significant() {
        assert_ne!(fingerprint("a  b", "n"), fingerprint("a b", "n"));
    }

    #[test]
    fn display_is_fixed_width_hex() {
        let s = fingerprint("draft", "nature").to_string();
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
