//! Bounded two-level memoization of resolution results.
//!
//! The outer level is keyed by preference name, the inner level by the
//! remaining query context (language, scope ceiling, resource). Both
//! levels track recency explicitly: a monotonic stamp per entry plus an
//! ordered stamp → key index, so eviction pops the oldest entry without
//! scanning. Invalidation drops a name's entire inner table; working out
//! which resource/language subsets a change touches is not worth the
//! complexity.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use pref_model::{ResolvedPreference, Scope};

/// Bounded map with least-recently-used eviction.
///
/// When an insert pushes the map past `capacity`, entries are evicted in
/// recency order until only `trim_to` remain, so eviction pressure clears
/// room for a whole working set instead of thrashing one slot at a time.
#[derive(Debug)]
pub(crate) struct LruMap<K, V> {
    entries: HashMap<K, (u64, V)>,
    recency: BTreeMap<u64, K>,
    next_stamp: u64,
    capacity: usize,
    trim_to: usize,
}

impl<K: Eq + Hash + Clone, V> LruMap<K, V> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            next_stamp: 0,
            capacity: capacity.max(1),
            trim_to: (capacity / 2).max(1),
        }
    }

    fn bump(&mut self) -> u64 {
        self.next_stamp += 1;
        self.next_stamp
    }

    /// Look up `key`, refreshing its recency on a hit.
    pub(crate) fn get<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (owned_key, old_stamp) = match self.entries.get_key_value(key) {
            Some((entry_key, (stamp, _))) => (entry_key.clone(), *stamp),
            None => return None,
        };
        self.recency.remove(&old_stamp);
        let stamp = self.bump();
        self.recency.insert(stamp, owned_key);

        let entry = self.entries.get_mut(key)?;
        entry.0 = stamp;
        Some(&mut entry.1)
    }

    pub(crate) fn insert(&mut self, key: K, value: V) {
        if let Some((old_stamp, _)) = self.entries.get(&key) {
            let old_stamp = *old_stamp;
            self.recency.remove(&old_stamp);
        }
        let stamp = self.bump();
        self.recency.insert(stamp, key.clone());
        self.entries.insert(key, (stamp, value));

        if self.entries.len() > self.capacity {
            self.evict();
        }
    }

    fn evict(&mut self) {
        while self.entries.len() > self.trim_to {
            let Some((_, key)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&key);
        }
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (stamp, value) = self.entries.remove(key)?;
        self.recency.remove(&stamp);
        Some(value)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }
}

/// Inner cache key: the query context other than the preference name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    pub language: Option<String>,
    pub ceiling: Option<Scope>,
    pub resource: Option<String>,
}

impl CacheKey {
    pub(crate) fn new(
        language: Option<&str>,
        ceiling: Option<Scope>,
        resource: Option<&str>,
    ) -> Self {
        Self {
            language: language.map(String::from),
            ceiling,
            resource: resource.map(String::from),
        }
    }
}

/// Two-level result cache: name → query context → resolved preference.
///
/// Entries hold the provider-derived result only; caller-supplied
/// defaults are applied at the read boundary and never stored, so one
/// entry serves every caller regardless of the default they pass.
#[derive(Debug)]
pub(crate) struct PreferenceCache {
    names: LruMap<String, LruMap<CacheKey, ResolvedPreference>>,
}

impl PreferenceCache {
    const OUTER_CAPACITY: usize = 1000;
    const INNER_CAPACITY: usize = 500;

    pub(crate) fn new() -> Self {
        Self {
            names: LruMap::new(Self::OUTER_CAPACITY),
        }
    }

    /// Cached result for `(name, key)`, cloned out so callers can never
    /// reach cache-owned state.
    pub(crate) fn get(&mut self, name: &str, key: &CacheKey) -> Option<ResolvedPreference> {
        self.names.get(name)?.get(key).map(|result| result.clone())
    }

    pub(crate) fn insert(&mut self, name: &str, key: CacheKey, result: ResolvedPreference) {
        if let Some(inner) = self.names.get(name) {
            inner.insert(key, result);
            return;
        }
        let mut inner = LruMap::new(Self::INNER_CAPACITY);
        inner.insert(key, result);
        self.names.insert(name.to_string(), inner);
    }

    /// Drop every cached result for `name`. Returns whether anything was
    /// cached.
    pub(crate) fn invalidate(&mut self, name: &str) -> bool {
        self.names.remove(name).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.names.clear();
    }

    #[cfg(test)]
    pub(crate) fn cached_names(&self) -> usize {
        self.names.len()
    }
}
