//! In-memory tool result cache
//!
//! One slot table per tool, keyed by [`CacheKey`]. Entries expire after
//! their TTL and are evicted lazily on lookup; [`ToolCache::purge_expired`]
//! sweeps everything at once for callers that want periodic cleanup.
//!
//! Hit/miss counters live alongside the entries and are reset together
//! with them by [`ToolCache::clear`].

use deepseek_domain::{CacheEntry, CacheKey, CacheStats, Clock, SystemClock, ToolResult};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

#[derive(Default)]
struct ToolSlots {
    entries: HashMap<CacheKey, CacheEntry>,
    stats: CacheStats,
}

/// Per-tool TTL cache shared by every tool call of the process.
///
/// Concurrent `put`s for the same key are last-writer-wins.
pub struct ToolCache {
    tools: Mutex<HashMap<String, ToolSlots>>,
    clock: Arc<dyn Clock>,
}

impl ToolCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tools: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Look up a cached result. Counts a hit or a miss; expired entries are
    /// removed and count as a miss.
    pub fn get(&self, tool_name: &str, arguments: &HashMap<String, Value>) -> Option<ToolResult> {
        let key = CacheKey::derive(tool_name, arguments);
        let now = self.clock.now();
        let mut tools = self.tools.lock();
        let slots = tools.entry(tool_name.to_string()).or_default();

        match slots.entries.get(&key) {
            Some(entry) if !entry.is_expired(now) => {
                slots.stats.hits += 1;
                trace!(tool = tool_name, key = %key, "Cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                slots.entries.remove(&key);
                slots.stats.misses += 1;
                debug!(tool = tool_name, key = %key, "Cache entry expired");
                None
            }
            None => {
                slots.stats.misses += 1;
                None
            }
        }
    }

    /// Store `result` for `ttl`.
    pub fn put(
        &self,
        tool_name: &str,
        arguments: &HashMap<String, Value>,
        result: ToolResult,
        ttl: Duration,
    ) {
        let key = CacheKey::derive(tool_name, arguments);
        let entry = CacheEntry::new(key.clone(), result, self.clock.now(), ttl);
        self.tools
            .lock()
            .entry(tool_name.to_string())
            .or_default()
            .entries
            .insert(key, entry);
    }

    /// Drop entries and counters for one tool, or for every tool at once.
    ///
    /// Returns the names of the tools that had any state, sorted.
    pub fn clear(&self, tool_name: Option<&str>) -> Vec<String> {
        let mut tools = self.tools.lock();
        let mut cleared: Vec<String> = match tool_name {
            Some(name) => tools.remove(name).map(|_| name.to_string()).into_iter().collect(),
            None => tools.drain().map(|(name, _)| name).collect(),
        };
        cleared.sort();
        debug!(tools = ?cleared, "Cache cleared");
        cleared
    }

    pub fn stats(&self, tool_name: &str) -> CacheStats {
        self.tools
            .lock()
            .get(tool_name)
            .map(|slots| slots.stats)
            .unwrap_or_default()
    }

    /// Number of stored entries for `tool_name`, expired ones included.
    pub fn len(&self, tool_name: &str) -> usize {
        self.tools
            .lock()
            .get(tool_name)
            .map_or(0, |slots| slots.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.lock().values().all(|slots| slots.entries.is_empty())
    }

    /// Remove every expired entry. Counters are untouched.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        for slots in self.tools.lock().values_mut() {
            let before = slots.entries.len();
            slots.entries.retain(|_, entry| !entry.is_expired(now));
            removed += before - slots.entries.len();
        }
        if removed > 0 {
            debug!(removed, "Purged expired cache entries");
        }
        removed
    }
}

impl Default for ToolCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use deepseek_domain::ManualClock;
    use serde_json::json;

    fn args(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn cache_with_clock() -> (ToolCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        ));
        (ToolCache::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let cache = ToolCache::new();
        let a = args(&[("expression", json!("12*7"))]);

        assert!(cache.get("calculator", &a).is_none());
        cache.put(
            "calculator",
            &a,
            ToolResult::success("calculator", json!(84)),
            Duration::from_secs(60),
        );
        let hit = cache.get("calculator", &a).unwrap();
        assert_eq!(hit.content(), Some(&json!(84)));

        assert_eq!(cache.stats("calculator"), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_argument_order_does_not_matter() {
        let cache = ToolCache::new();
        let first = args(&[("location", json!("Paris")), ("units", json!("metric"))]);
        let mut second = HashMap::new();
        second.insert("units".to_string(), json!("metric"));
        second.insert("location".to_string(), json!("Paris"));

        cache.put(
            "weather",
            &first,
            ToolResult::success("weather", json!({"temperature": 18})),
            Duration::from_secs(60),
        );
        assert!(cache.get("weather", &second).is_some());
    }

    #[test]
    fn test_expired_entry_is_evicted_and_missed() {
        let (cache, clock) = cache_with_clock();
        let a = args(&[("q", json!("rust"))]);
        cache.put(
            "web_search",
            &a,
            ToolResult::success("web_search", json!([])),
            Duration::from_secs(30),
        );

        clock.advance(ChronoDuration::seconds(30));
        assert!(cache.get("web_search", &a).is_some());

        clock.advance(ChronoDuration::milliseconds(1));
        assert!(cache.get("web_search", &a).is_none());
        assert_eq!(cache.len("web_search"), 0);
        assert_eq!(cache.stats("web_search"), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_clear_one_tool() {
        let cache = ToolCache::new();
        let a = args(&[("x", json!(1))]);
        for tool in ["calculator", "weather"] {
            cache.put(tool, &a, ToolResult::success(tool, json!(1)), Duration::from_secs(60));
            cache.get(tool, &a);
        }

        assert_eq!(cache.clear(Some("calculator")), vec!["calculator"]);
        assert_eq!(cache.stats("calculator"), CacheStats::default());
        assert_eq!(cache.len("calculator"), 0);
        assert_eq!(cache.len("weather"), 1);
        assert!(cache.clear(Some("unknown")).is_empty());
    }

    #[test]
    fn test_clear_all() {
        let cache = ToolCache::new();
        let a = args(&[("x", json!(1))]);
        for tool in ["weather", "calculator"] {
            cache.put(tool, &a, ToolResult::success(tool, json!(1)), Duration::from_secs(60));
        }

        assert_eq!(cache.clear(None), vec!["calculator", "weather"]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let (cache, clock) = cache_with_clock();
        cache.put(
            "date_time",
            &args(&[("format", json!("iso"))]),
            ToolResult::success("date_time", json!("now")),
            Duration::from_secs(60),
        );
        cache.put(
            "calculator",
            &args(&[("expression", json!("1+1"))]),
            ToolResult::success("calculator", json!(2)),
            Duration::from_secs(3600),
        );

        clock.advance(ChronoDuration::seconds(120));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len("date_time"), 0);
        assert_eq!(cache.len("calculator"), 1);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(ToolCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let a = args(&[("n", json!(i % 2))]);
                    for _ in 0..100 {
                        cache.put(
                            "calculator",
                            &a,
                            ToolResult::success("calculator", json!(i)),
                            Duration::from_secs(60),
                        );
                        cache.get("calculator", &a);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len("calculator"), 2);
        assert_eq!(cache.stats("calculator").hits, 800);
    }
}
