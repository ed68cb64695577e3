use crate::aggregate::CalendarEvent;
use lru::LruCache;
use std::num::NonZeroUsize;
use time::Date;

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct CacheKey {
    pub(crate) calendar_id: String,
    pub(crate) week_start: Date,
}

impl CacheKey {
    pub(crate) fn new<S: Into<String>>(calendar_id: S, week_start: Date) -> Self {
        CacheKey {
            calendar_id: calendar_id.into(),
            week_start,
        }
    }
}

/// Fetched events for recently viewed weeks, evicting the least recently used
/// week once full
#[derive(Clone, Debug)]
pub(crate) struct WeekCache {
    entries: LruCache<CacheKey, Vec<CalendarEvent>>,
}

impl WeekCache {
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        WeekCache {
            entries: LruCache::new(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&mut self, key: &CacheKey) -> Option<&[CalendarEvent]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub(crate) fn insert(&mut self, key: CacheKey, events: Vec<CalendarEvent>) {
        self.entries.put(key, events);
    }

    /// Returns `true` if an entry was removed
    pub(crate) fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.entries.pop(key).is_some()
    }
}

// Two caches are equal when they hold the same entries in the same recency
// order
impl PartialEq for WeekCache {
    fn eq(&self, other: &WeekCache) -> bool {
        self.entries.cap() == other.entries.cap() && self.entries.iter().eq(other.entries.iter())
    }
}

impl Eq for WeekCache {}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn events(n: usize) -> Vec<CalendarEvent> {
        vec![
            CalendarEvent::bounded(
                datetime!(2026-10-12 09:00 UTC),
                datetime!(2026-10-12 10:00 UTC)
            );
            n
        ]
    }

    fn cache(capacity: usize) -> WeekCache {
        WeekCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_get_missing() {
        let mut cache = cache(2);
        assert_eq!(cache.get(&CacheKey::new("primary", date!(2026 - 10 - 11))), None);
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = cache(2);
        let key = CacheKey::new("primary", date!(2026 - 10 - 11));
        cache.insert(key.clone(), events(3));
        assert_eq!(cache.get(&key).map(<[_]>::len), Some(3));
        assert_eq!(
            cache.get(&CacheKey::new("work", date!(2026 - 10 - 11))),
            None
        );
    }

    #[test]
    fn test_insert_replaces() {
        let mut cache = cache(2);
        let key = CacheKey::new("primary", date!(2026 - 10 - 11));
        cache.insert(key.clone(), events(3));
        cache.insert(key.clone(), events(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key).map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = cache(2);
        let k1 = CacheKey::new("primary", date!(2026 - 10 - 04));
        let k2 = CacheKey::new("primary", date!(2026 - 10 - 11));
        let k3 = CacheKey::new("primary", date!(2026 - 10 - 18));
        cache.insert(k1.clone(), events(1));
        cache.insert(k2.clone(), events(2));
        // Touch k1 so that k2 becomes the oldest
        assert!(cache.get(&k1).is_some());
        cache.insert(k3.clone(), events(3));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&k2).is_none());
        assert!(cache.get(&k1).is_some());
        assert!(cache.get(&k3).is_some());
    }

    #[test]
    fn test_equality_follows_recency() {
        let k1 = CacheKey::new("primary", date!(2026 - 10 - 04));
        let k2 = CacheKey::new("primary", date!(2026 - 10 - 11));
        let mut a = cache(2);
        a.insert(k1.clone(), events(1));
        a.insert(k2.clone(), events(1));
        let mut b = a.clone();
        assert_eq!(a, b);
        assert!(b.get(&k1).is_some());
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalidate() {
        let mut cache = cache(2);
        let key = CacheKey::new("primary", date!(2026 - 10 - 11));
        cache.insert(key.clone(), events(1));
        assert!(cache.invalidate(&key));
        assert!(!cache.invalidate(&key));
        assert_eq!(cache.get(&key), None);
    }
}
