//! Tool result caching primitives
//!
//! Pure value types used by the infrastructure cache: the per-tool
//! [`CachePolicy`], the deterministic [`CacheKey`], [`CacheEntry`] expiry and
//! [`CacheStats`] counters. The concurrent store itself lives in the
//! infrastructure layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;

use super::value_objects::ToolResult;

/// Whether and for how long a tool's successful results may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    pub enabled: bool,
    #[serde(with = "duration_secs")]
    pub ttl: Duration,
}

impl CachePolicy {
    pub fn enabled(ttl: Duration) -> Self {
        Self { enabled: true, ttl }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ttl: Duration::ZERO,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs()
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

/// Deterministic cache slot identifier.
///
/// A SHA-256 digest over the tool name and the canonical JSON form of the
/// arguments. Argument order and `2` vs `2.0` do not affect the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive(tool_name: &str, arguments: &HashMap<String, Value>) -> Self {
        let mut canonical = String::new();
        write_canonical_map(arguments.iter(), &mut canonical);

        let mut hasher = Sha256::new();
        hasher.update(tool_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(canonical.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical JSON text for `value`: object keys sorted at every depth,
/// integral floats written as integers.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_canonical_map(map.iter(), out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
                out.push_str(&(f as i64).to_string());
            }
            _ => out.push_str(&n.to_string()),
        },
        other => out.push_str(&other.to_string()),
    }
}

fn write_canonical_map<'a>(entries: impl Iterator<Item = (&'a String, &'a Value)>, out: &mut String) {
    let mut entries: Vec<_> = entries.collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(value, out);
    }
    out.push('}');
}

/// A cached tool result.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub value: ToolResult,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(key: CacheKey, value: ToolResult, created_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            key,
            value,
            created_at,
            ttl,
        }
    }

    /// Expired once strictly more than `ttl` has elapsed since creation.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.created_at).to_std() {
            Ok(age) => age > self.ttl,
            // now is before created_at
            Err(_) => false,
        }
    }
}

/// Hit/miss counters for one tool's cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}
