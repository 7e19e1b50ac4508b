use std::collections::HashMap;
use std::future::Future;

use tracing::debug;

use crate::error::UpstreamError;
use crate::preferences::{CacheKey, DesignResult, DesignSource};

/// Session-lifetime memo of generated design text, keyed by the composite
/// cache key. Unbounded, no eviction; dropped with the session.
#[derive(Debug, Default)]
pub struct DesignCache {
    entries: HashMap<CacheKey, String>,
}

impl DesignCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &CacheKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Cached text for `key`, or run `generate` and store its output. A hit
    /// never invokes the generator, so no upstream request happens. A
    /// generation failure is handed back and nothing is stored; the next
    /// identical submission retries the upstream.
    pub async fn get_or_generate<F, Fut>(
        &mut self,
        key: &CacheKey,
        generate: F,
    ) -> Result<DesignResult, UpstreamError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, UpstreamError>>,
    {
        if let Some(text) = self.entries.get(key) {
            debug!(key = %key, "design cache hit");
            return Ok(DesignResult {
                markdown: text.clone(),
                source: DesignSource::Cache,
            });
        }

        debug!(key = %key, "design cache miss");
        let text = generate().await?;
        self.entries.insert(key.clone(), text.clone());
        Ok(DesignResult {
            markdown: text,
            source: DesignSource::Upstream,
        })
    }
}
