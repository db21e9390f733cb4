use super::StoryCard;
use std::collections::HashMap;

struct CacheEntry {
    card: StoryCard,
    lru_tick: u64,
}

/// Bounded memo cache for rendered cards, keyed by a structural hash of
/// the normalized result. Eviction drops the least-recently-used entry
/// once `capacity` is reached, so repeated link spam cannot grow memory
/// without bound.
pub struct RenderCache {
    entries: HashMap<u64, CacheEntry>,
    capacity: usize,
    next_lru_tick: u64,
}

impl RenderCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            next_lru_tick: 1,
        }
    }

    pub fn get(&mut self, key: u64) -> Option<StoryCard> {
        let tick = self.next_tick();
        let entry = self.entries.get_mut(&key)?;
        entry.lru_tick = tick;
        Some(entry.card.clone())
    }

    pub fn insert(&mut self, key: u64, card: StoryCard) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.lru_tick)
                .map(|(k, _)| *k)
            {
                self.entries.remove(&oldest);
            }
        }
        let lru_tick = self.next_tick();
        self.entries.insert(key, CacheEntry { card, lru_tick });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_tick(&mut self) -> u64 {
        let tick = self.next_lru_tick;
        self.next_lru_tick += 1;
        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(title: &str) -> StoryCard {
        StoryCard {
            title: title.to_string(),
            ..StoryCard::default()
        }
    }

    #[test]
    fn get_returns_inserted_card() {
        let mut cache = RenderCache::new(4);
        cache.insert(1, card("one"));
        assert_eq!(cache.get(1).unwrap().title, "one");
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn evicts_least_recently_used_at_capacity() {
        let mut cache = RenderCache::new(2);
        cache.insert(1, card("one"));
        cache.insert(2, card("two"));
        // Touch 1 so 2 becomes the eviction candidate.
        cache.get(1);
        cache.insert(3, card("three"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(1).is_some());
        assert!(cache.get(2).is_none());
        assert!(cache.get(3).is_some());
    }

    #[test]
    fn reinserting_same_key_does_not_evict() {
        let mut cache = RenderCache::new(2);
        cache.insert(1, card("one"));
        cache.insert(2, card("two"));
        cache.insert(2, card("two again"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(1).is_some());
        assert_eq!(cache.get(2).unwrap().title, "two again");
    }
}
