use std::{
    num::NonZeroUsize,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use tracing::info;

use super::{SpeechSynthesizer, Voice};
use crate::errors::{constants::DEFAULT_CACHE_SIZE, Result};

#[derive(Hash, PartialEq, Eq)]
struct CacheKey {
    text: String,
    voice: Voice,
}

/// Caches synthesized previews so re-rendering the same utterance is free.
pub struct PreviewCache<S> {
    inner: S,
    cache: Arc<RwLock<LruCache<CacheKey, Bytes>>>,
}

impl<S> PreviewCache<S> {
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_SIZE)
    }

    pub fn with_capacity(inner: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<S> SpeechSynthesizer for PreviewCache<S>
where
    S: SpeechSynthesizer + Send + Sync,
{
    async fn synthesize(&self, text: &str, voice: &Voice) -> Result<Bytes> {
        let cache_key = CacheKey {
            text: text.to_string(),
            voice: voice.clone(),
        };

        let cached_audio = self
            .cache
            .write()
            .ok()
            .and_then(|mut cache_guard| cache_guard.get(&cache_key).cloned());

        if let Some(audio) = cached_audio {
            info!("Cache hit for TTS preview");
            return Ok(audio);
        }

        info!("Cache miss for TTS preview");

        let audio = self.inner.synthesize(text, voice).await?;

        if let Ok(mut cache_guard) = self.cache.write() {
            cache_guard.put(cache_key, audio.clone());
        }

        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSynthesizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeechSynthesizer for CountingSynthesizer {
        async fn synthesize(&self, text: &str, voice: &Voice) -> Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from(format!("{}:{}", voice.name, text)))
        }
    }

    #[tokio::test]
    async fn test_preview_cache_hits() {
        let cache = PreviewCache::new(CountingSynthesizer::default());
        let voice = Voice::new("pt-BR", "pt-BR-Wavenet-A");

        let first = cache.synthesize("Olá", &voice).await.unwrap();
        let second = cache.synthesize("Olá", &voice).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_preview_cache_keys_on_voice() {
        let cache = PreviewCache::new(CountingSynthesizer::default());

        cache
            .synthesize("Olá", &Voice::new("pt-BR", "pt-BR-Wavenet-A"))
            .await
            .unwrap();
        cache
            .synthesize("Olá", &Voice::new("pt-BR", "pt-BR-Wavenet-B"))
            .await
            .unwrap();

        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_preview_cache_evicts() {
        let cache = PreviewCache::with_capacity(CountingSynthesizer::default(), 1);
        let voice = Voice::new("pt-BR", "pt-BR-Wavenet-A");

        cache.synthesize("one", &voice).await.unwrap();
        cache.synthesize("two", &voice).await.unwrap();
        cache.synthesize("one", &voice).await.unwrap();

        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.len(), 1);
    }
}
