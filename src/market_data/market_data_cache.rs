use dashmap::DashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Symbol-to-asset-id cache for oracle implementations.
///
/// Replaces the ambient concurrent map the resolver would otherwise share:
/// the cache is an owned object with an explicit refresh policy. Lookups are
/// case-insensitive; a miss falls back to the normalized lower-case input so
/// resolution never fails.
pub struct SymbolCache {
    entries: DashMap<String, String>,
    last_refreshed: RwLock<Option<Instant>>,
    refresh_interval: Duration,
}

impl SymbolCache {
    pub fn new(refresh_interval: Duration) -> Self {
        SymbolCache {
            entries: DashMap::new(),
            last_refreshed: RwLock::new(None),
            refresh_interval,
        }
    }

    /// Replaces the full mapping set and stamps the refresh time.
    pub fn refresh_with<I>(&self, mappings: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.entries.clear();
        for (symbol, asset_id) in mappings {
            self.entries.insert(symbol.trim().to_uppercase(), asset_id);
        }
        if let Ok(mut stamp) = self.last_refreshed.write() {
            *stamp = Some(Instant::now());
        }
    }

    /// Case-insensitive lookup with the lower-case fallback.
    pub fn resolve(&self, input: &str) -> String {
        let normalized = input.trim().to_uppercase();
        match self.entries.get(&normalized) {
            Some(asset_id) => asset_id.clone(),
            None => input.trim().to_lowercase(),
        }
    }

    /// True when the cache has never been refreshed or the refresh interval
    /// has elapsed; callers decide when to re-pull the mapping set.
    pub fn is_stale(&self) -> bool {
        match self.last_refreshed.read() {
            Ok(stamp) => match *stamp {
                Some(at) => at.elapsed() >= self.refresh_interval,
                None => true,
            },
            Err(_) => true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_symbols_case_insensitively() {
        let cache = SymbolCache::new(Duration::from_secs(60));
        cache.refresh_with(vec![("BTC".to_string(), "bitcoin".to_string())]);

        assert_eq!(cache.resolve("btc"), "bitcoin");
        assert_eq!(cache.resolve(" BTC "), "bitcoin");
    }

    #[test]
    fn falls_back_to_normalized_input() {
        let cache = SymbolCache::new(Duration::from_secs(60));
        assert_eq!(cache.resolve(" DogeCoin "), "dogecoin");
    }

    #[test]
    fn stale_until_first_refresh() {
        let cache = SymbolCache::new(Duration::from_secs(60));
        assert!(cache.is_stale());
        cache.refresh_with(vec![("ETH".to_string(), "ethereum".to_string())]);
        assert!(!cache.is_stale());
    }
}
