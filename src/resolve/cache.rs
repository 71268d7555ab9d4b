//! Layered in-memory caches for resolved translations.
//!
//! `ResolutionCache` keeps one table per language. Bulk data (a whole-language
//! fetch from the durable store or the serving application) is replaced
//! atomically and is valid only while its fetch timestamp is fresh; ad-hoc
//! entries written by successful live translations persist until the language
//! table is cleared. Stale bulk data is ignored, not purged.
//!
//! `ResponseCache` is the bounded provider-side cache: LRU over a blake3 key
//! of (text, language, context), with a long TTL to deduplicate repeat
//! provider calls.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

/// Default validity of a whole-language bulk fetch.
pub const DEFAULT_BULK_TTL: Duration = Duration::from_secs(5 * 60);

/// Default validity of a cached provider response.
pub const DEFAULT_RESPONSE_TTL: Duration = Duration::from_secs(24 * 3600);

#[derive(Default)]
struct LanguageTable {
    bulk: HashMap<String, String>,
    bulk_fetched_at: Option<Instant>,
    adhoc: HashMap<String, String>,
}

/// Per-language resolution cache.
pub struct ResolutionCache {
    tables: Mutex<HashMap<String, LanguageTable>>,
    bulk_ttl: Duration,
}

/// Entry counts and age for one language table.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub bulk_entries: usize,
    pub adhoc_entries: usize,
    pub bulk_age_secs: Option<u64>,
}

impl ResolutionCache {
    pub fn new(bulk_ttl: Duration) -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            bulk_ttl,
        }
    }

    /// Look up a phrase. Ad-hoc entries win over bulk data; bulk data counts
    /// only while its fetch is fresh.
    pub fn get(&self, language: &str, text: &str) -> Option<String> {
        let tables = self.tables.lock();
        let table = tables.get(language)?;
        if let Some(hit) = table.adhoc.get(text) {
            return Some(hit.clone());
        }
        match table.bulk_fetched_at {
            Some(at) if at.elapsed() < self.bulk_ttl => table.bulk.get(text).cloned(),
            _ => None,
        }
    }

    /// Whether the language has a fresh bulk table.
    pub fn is_bulk_valid(&self, language: &str) -> bool {
        let tables = self.tables.lock();
        tables
            .get(language)
            .and_then(|t| t.bulk_fetched_at)
            .map(|at| at.elapsed() < self.bulk_ttl)
            .unwrap_or(false)
    }

    /// Record a single live translation. Persists until `clear(language)`.
    pub fn put_adhoc(&self, language: &str, text: &str, translation: String) {
        let mut tables = self.tables.lock();
        tables
            .entry(language.to_string())
            .or_default()
            .adhoc
            .insert(text.to_string(), translation);
    }

    /// Replace the whole bulk table for a language and stamp it fresh.
    /// Ad-hoc entries are untouched.
    pub fn refresh_bulk(&self, language: &str, translations: HashMap<String, String>) {
        let mut tables = self.tables.lock();
        let table = tables.entry(language.to_string()).or_default();
        table.bulk = translations;
        table.bulk_fetched_at = Some(Instant::now());
    }

    /// Drop one language table, bulk and ad-hoc both.
    pub fn clear(&self, language: &str) {
        self.tables.lock().remove(language);
    }

    pub fn clear_all(&self) {
        self.tables.lock().clear();
    }

    pub fn stats(&self) -> HashMap<String, CacheStats> {
        let tables = self.tables.lock();
        tables
            .iter()
            .map(|(lang, table)| {
                (
                    lang.clone(),
                    CacheStats {
                        bulk_entries: table.bulk.len(),
                        adhoc_entries: table.adhoc.len(),
                        bulk_age_secs: table.bulk_fetched_at.map(|at| at.elapsed().as_secs()),
                    },
                )
            })
            .collect()
    }
}

struct ResponseEntry {
    translation: String,
    inserted_at: Instant,
}

/// Bounded cache of raw provider responses.
pub struct ResponseCache {
    inner: Mutex<LruCache<[u8; 32], ResponseEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).expect("cache capacity must be > 0"),
            )),
            ttl,
        }
    }

    /// Compute the cache key from the request parameters.
    pub fn compute_key(text: &str, language: &str, context: &str) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(text.as_bytes());
        hasher.update(b"|");
        hasher.update(language.as_bytes());
        hasher.update(b"|");
        hasher.update(context.as_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Look up a cached response. Returns None if absent or expired.
    pub fn get(&self, key: &[u8; 32]) -> Option<String> {
        let mut cache = self.inner.lock();
        if let Some(entry) = cache.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.translation.clone());
            }
            cache.pop(key);
        }
        None
    }

    pub fn insert(&self, key: [u8; 32], translation: String) {
        let mut cache = self.inner.lock();
        cache.put(
            key,
            ResponseEntry {
                translation,
                inserted_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn adhoc_entry_hits_without_bulk() {
        let cache = ResolutionCache::new(DEFAULT_BULK_TTL);
        cache.put_adhoc("et", "good opening", "Hea avamine".into());
        assert_eq!(cache.get("et", "good opening").as_deref(), Some("Hea avamine"));
        assert_eq!(cache.get("et", "other"), None);
        assert_eq!(cache.get("es", "good opening"), None);
    }

    #[test]
    fn bulk_refresh_replaces_whole_table() {
        let cache = ResolutionCache::new(DEFAULT_BULK_TTL);
        cache.refresh_bulk(
            "es",
            HashMap::from([("closing".to_string(), "Cierre".to_string())]),
        );
        assert_eq!(cache.get("es", "closing").as_deref(), Some("Cierre"));

        cache.refresh_bulk(
            "es",
            HashMap::from([("opening".to_string(), "Apertura".to_string())]),
        );
        assert_eq!(cache.get("es", "closing"), None);
        assert_eq!(cache.get("es", "opening").as_deref(), Some("Apertura"));
    }

    #[test]
    fn bulk_expires_together_adhoc_persists() {
        let cache = ResolutionCache::new(Duration::from_millis(30));
        cache.refresh_bulk(
            "ru",
            HashMap::from([("closing".to_string(), "Закрытие".to_string())]),
        );
        cache.put_adhoc("ru", "dynamic", "динамический".into());
        assert!(cache.is_bulk_valid("ru"));

        thread::sleep(Duration::from_millis(50));

        assert!(!cache.is_bulk_valid("ru"));
        assert_eq!(cache.get("ru", "closing"), None);
        // Ad-hoc entries have no TTL of their own.
        assert_eq!(cache.get("ru", "dynamic").as_deref(), Some("динамический"));
    }

    #[test]
    fn adhoc_wins_over_bulk() {
        let cache = ResolutionCache::new(DEFAULT_BULK_TTL);
        cache.refresh_bulk(
            "et",
            HashMap::from([("closing".to_string(), "vana".to_string())]),
        );
        cache.put_adhoc("et", "closing", "Sulgemine".into());
        assert_eq!(cache.get("et", "closing").as_deref(), Some("Sulgemine"));
    }

    #[test]
    fn clear_drops_language_only() {
        let cache = ResolutionCache::new(DEFAULT_BULK_TTL);
        cache.put_adhoc("et", "a", "1".into());
        cache.put_adhoc("es", "b", "2".into());
        cache.clear("et");
        assert_eq!(cache.get("et", "a"), None);
        assert_eq!(cache.get("es", "b").as_deref(), Some("2"));
    }

    #[test]
    fn stats_report_counts_and_age() {
        let cache = ResolutionCache::new(DEFAULT_BULK_TTL);
        cache.refresh_bulk(
            "et",
            HashMap::from([("a".to_string(), "1".to_string())]),
        );
        cache.put_adhoc("et", "b", "2".into());
        let stats = cache.stats();
        let et = stats.get("et").unwrap();
        assert_eq!(et.bulk_entries, 1);
        assert_eq!(et.adhoc_entries, 1);
        assert!(et.bulk_age_secs.is_some());
    }

    #[test]
    fn response_cache_expires() {
        let cache = ResponseCache::new(16, Duration::from_millis(30));
        let key = ResponseCache::compute_key("hello", "et", "general");
        cache.insert(key, "tere".into());
        assert_eq!(cache.get(&key).as_deref(), Some("tere"));

        thread::sleep(Duration::from_millis(50));
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn response_cache_key_varies_by_context() {
        let a = ResponseCache::compute_key("hello", "et", "general");
        let b = ResponseCache::compute_key("hello", "et", "sales_feedback");
        let c = ResponseCache::compute_key("hello", "es", "general");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
