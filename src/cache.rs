use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::Analysis;

/// Content address of an analysis: SHA-256 over the analyzer settings and
/// the raw source bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(settings: &[u8], raw: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((settings.len() as u64).to_le_bytes());
        hasher.update(settings);
        hasher.update(raw);
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage for finished analyses, owned by the caller.
pub trait AnalysisCache: Send + Sync {
    fn get(&self, key: &Fingerprint) -> Option<Arc<Analysis>>;
    fn insert(&self, key: Fingerprint, analysis: Arc<Analysis>);
}

/// In-process cache with no eviction.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<Fingerprint, Arc<Analysis>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl AnalysisCache for MemoryCache {
    fn get(&self, key: &Fingerprint) -> Option<Arc<Analysis>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    fn insert(&self, key: Fingerprint, analysis: Arc<Analysis>) {
        self.entries.insert(key, analysis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_depends_on_settings_and_content() {
        let a = Fingerprint::of(b"cap=50", b"{}");
        assert_eq!(a, Fingerprint::of(b"cap=50", b"{}"));
        assert_ne!(a, Fingerprint::of(b"cap=10", b"{}"));
        assert_ne!(a, Fingerprint::of(b"cap=50", b"{ }"));
        assert_ne!(Fingerprint::of(b"ab", b"c"), Fingerprint::of(b"a", b"bc"));
        assert_eq!(a.as_str().len(), 64);
    }
}
