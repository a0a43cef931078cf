use std::num::NonZeroUsize;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("Asset {0} not found")]
    NotFound(u64),
    #[error("Asset {0} has no playable source")]
    Unplayable(u64),
    #[error("Asset lookup failed: {0}")]
    Lookup(String),
}

/// A selectable asset offered by the picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCandidate {
    pub id: u64,
    pub name: String,
    pub duration_seconds: Option<f64>,
}

/// Display name and real length of an asset, from a batch metadata lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    pub id: u64,
    pub name: String,
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAsset {
    pub source_url: String,
    pub poster_url: String,
}

/// Turns an upload id into URLs the playback element can use.
pub trait AssetResolver {
    fn resolve(&mut self, upload_id: u64) -> Result<ResolvedAsset, AssetError>;
}

/// Resolves to the server's edit-proxy and thumbnail endpoints.
#[derive(Debug, Clone)]
pub struct ProxyUrlResolver {
    pub base_url: String,
}

impl ProxyUrlResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl AssetResolver for ProxyUrlResolver {
    fn resolve(&mut self, upload_id: u64) -> Result<ResolvedAsset, AssetError> {
        if upload_id == 0 {
            return Err(AssetError::NotFound(upload_id));
        }
        let base = self.base_url.trim_end_matches('/');
        Ok(ResolvedAsset {
            // The fragment nudges browsers into decoding a first frame.
            source_url: format!("{base}/{upload_id}/edit-proxy#t=0.1"),
            poster_url: format!("{base}/{upload_id}/thumb"),
        })
    }
}

/// Memoizes another resolver so each id is resolved at most once while it
/// stays in the cache. Failures are not cached.
pub struct CachedResolver {
    inner: Box<dyn AssetResolver>,
    cache: LruCache<u64, ResolvedAsset>,
}

impl CachedResolver {
    pub fn new(inner: Box<dyn AssetResolver>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: LruCache::new(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl AssetResolver for CachedResolver {
    fn resolve(&mut self, upload_id: u64) -> Result<ResolvedAsset, AssetError> {
        if let Some(hit) = self.cache.get(&upload_id) {
            return Ok(hit.clone());
        }
        let resolved = self.inner.resolve(upload_id)?;
        self.cache.put(upload_id, resolved.clone());
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingResolver {
        calls: Rc<Cell<usize>>,
    }

    impl AssetResolver for CountingResolver {
        fn resolve(&mut self, upload_id: u64) -> Result<ResolvedAsset, AssetError> {
            self.calls.set(self.calls.get() + 1);
            if upload_id == 13 {
                return Err(AssetError::Unplayable(upload_id));
            }
            Ok(ResolvedAsset {
                source_url: format!("src/{upload_id}"),
                poster_url: format!("poster/{upload_id}"),
            })
        }
    }

    #[test]
    fn test_proxy_urls() {
        let mut resolver = ProxyUrlResolver::new("/api/uploads/");
        let resolved = resolver.resolve(42).unwrap();
        assert_eq!(resolved.source_url, "/api/uploads/42/edit-proxy#t=0.1");
        assert_eq!(resolved.poster_url, "/api/uploads/42/thumb");
        assert_eq!(resolver.resolve(0), Err(AssetError::NotFound(0)));
    }

    #[test]
    fn test_cached_resolver_resolves_each_id_once() {
        let calls = Rc::new(Cell::new(0));
        let mut cached = CachedResolver::new(Box::new(CountingResolver { calls: calls.clone() }), 2);
        cached.resolve(1).unwrap();
        cached.resolve(1).unwrap();
        assert_eq!(calls.get(), 1);
        cached.resolve(2).unwrap();
        cached.resolve(3).unwrap();
        // 1 was evicted by capacity 2.
        cached.resolve(1).unwrap();
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_cached_resolver_does_not_cache_failures() {
        let calls = Rc::new(Cell::new(0));
        let mut cached = CachedResolver::new(Box::new(CountingResolver { calls: calls.clone() }), 8);
        assert!(cached.resolve(13).is_err());
        assert!(cached.resolve(13).is_err());
        assert_eq!(calls.get(), 2);
        assert!(cached.is_empty());
    }
}
