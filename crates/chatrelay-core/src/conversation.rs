//! Bounded in-memory conversation store.
//!
//! Conversations are a sliding window of at most [`MAX_TURNS`] turns per
//! key, held in a capacity- and TTL-bounded cache:
//! - Appends for one key are serialized through the map's entry lock, so
//!   the window invariant holds under concurrent requests.
//! - An entry idle past the TTL is reset on next access and reclaimed by
//!   capacity sweeps.
//! - Inserting a new key past capacity first drops expired entries, then
//!   the least-recently-active one. Capacity is approximate under
//!   concurrent first-inserts (it may briefly overshoot by one).

use std::time::{Duration, Instant};

use dashmap::DashMap;

use chatrelay_types::chat::{ConversationKey, Turn};

/// Maximum retained turns per conversation (sliding window, oldest out).
pub const MAX_TURNS: usize = 10;

/// Default maximum concurrently retained conversations.
const DEFAULT_MAX_CONVERSATIONS: usize = 1024;

/// Default idle time after which a conversation is dropped.
const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// Capacity- and TTL-bounded store of per-participant conversations.
pub struct ConversationStore {
    max_conversations: usize,
    idle_ttl: Duration,
    conversations: DashMap<ConversationKey, ConversationEntry>,
}

struct ConversationEntry {
    turns: Vec<Turn>,
    last_active: Instant,
}

impl ConversationEntry {
    fn empty() -> Self {
        Self {
            turns: Vec::new(),
            last_active: Instant::now(),
        }
    }
}

impl ConversationStore {
    /// Create a store with custom bounds.
    pub fn new(max_conversations: usize, idle_ttl: Duration) -> Self {
        Self {
            max_conversations: max_conversations.max(1),
            idle_ttl,
            conversations: DashMap::new(),
        }
    }

    /// Append a turn and return a snapshot of the conversation after
    /// truncation.
    ///
    /// The append, the window truncation, and the snapshot all happen
    /// under the entry lock; the snapshot is what callers should hand to
    /// the completion backend rather than re-reading the map.
    pub fn append_turn(&self, key: &ConversationKey, turn: Turn) -> Vec<Turn> {
        if !self.conversations.contains_key(key) {
            self.make_room();
        }

        let mut entry = self
            .conversations
            .entry(key.clone())
            .or_insert_with(ConversationEntry::empty);
        let conversation = entry.value_mut();

        if conversation.last_active.elapsed() >= self.idle_ttl {
            conversation.turns.clear();
        }

        conversation.turns.push(turn);
        if conversation.turns.len() > MAX_TURNS {
            let excess = conversation.turns.len() - MAX_TURNS;
            conversation.turns.drain(..excess);
        }
        conversation.last_active = Instant::now();

        conversation.turns.clone()
    }

    /// Snapshot the conversation for a key. Empty if absent or expired.
    pub fn history(&self, key: &ConversationKey) -> Vec<Turn> {
        match self.conversations.get(key) {
            Some(entry) if entry.last_active.elapsed() < self.idle_ttl => entry.turns.clone(),
            _ => Vec::new(),
        }
    }

    /// Number of retained conversations (including expired entries not
    /// yet swept).
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Drop everything (useful for testing).
    pub fn clear(&self) {
        self.conversations.clear();
    }

    /// Ensure a new key can be inserted: sweep expired entries, then
    /// evict least-recently-active ones until under capacity.
    fn make_room(&self) {
        if self.conversations.len() < self.max_conversations {
            return;
        }

        let idle_ttl = self.idle_ttl;
        self.conversations
            .retain(|_, entry| entry.last_active.elapsed() < idle_ttl);

        while self.conversations.len() >= self.max_conversations {
            let oldest = self
                .conversations
                .iter()
                .min_by_key(|entry| entry.value().last_active)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    self.conversations.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONVERSATIONS, DEFAULT_IDLE_TTL)
    }
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("max_conversations", &self.max_conversations)
            .field("idle_ttl", &self.idle_ttl)
            .field("active", &self.conversations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(pid: &str, bot: &str) -> ConversationKey {
        ConversationKey::new(pid, bot)
    }

    #[test]
    fn test_window_holds_most_recent_ten_in_order() {
        let store = ConversationStore::default();
        let k = key("P1", "LongBot1");

        for i in 0..25 {
            store.append_turn(&k, Turn::user(format!("m{i}")));
        }

        let history = store.history(&k);
        assert_eq!(history.len(), MAX_TURNS);
        let contents: Vec<&str> = history.iter().map(|t| t.content.as_str()).collect();
        let expected: Vec<String> = (15..25).map(|i| format!("m{i}")).collect();
        assert_eq!(contents, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_length_is_min_of_appends_and_window() {
        let store = ConversationStore::default();
        let k = key("P1", "LongBot1");

        for n in 1..=15 {
            store.append_turn(&k, Turn::user(format!("m{n}")));
            assert_eq!(store.history(&k).len(), n.min(MAX_TURNS));
        }
    }

    #[test]
    fn test_append_returns_post_truncation_snapshot() {
        let store = ConversationStore::default();
        let k = key("P1", "LongBot1");

        let mut last = Vec::new();
        for i in 0..12 {
            last = store.append_turn(&k, Turn::user(format!("m{i}")));
        }
        assert_eq!(last.len(), MAX_TURNS);
        assert_eq!(last.first().unwrap().content, "m2");
        assert_eq!(last.last().unwrap().content, "m11");
    }

    #[test]
    fn test_keys_are_independent() {
        let store = ConversationStore::default();
        let a = key("P1", "LongBot1");
        let b = key("P1", "LongBot2");

        store.append_turn(&a, Turn::user("for a"));
        store.append_turn(&b, Turn::user("for b"));

        assert_eq!(store.history(&a).len(), 1);
        assert_eq!(store.history(&b).len(), 1);
        assert_eq!(store.history(&a)[0].content, "for a");
    }

    #[test]
    fn test_missing_key_yields_empty_history() {
        let store = ConversationStore::default();
        assert!(store.history(&key("nobody", "LongBot1")).is_empty());
    }

    #[test]
    fn test_idle_entry_resets_on_next_append() {
        let store = ConversationStore::new(16, Duration::from_millis(20));
        let k = key("P1", "LongBot1");

        store.append_turn(&k, Turn::user("old"));
        std::thread::sleep(Duration::from_millis(40));

        assert!(store.history(&k).is_empty());
        let history = store.append_turn(&k, Turn::user("fresh"));
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "fresh");
    }

    #[test]
    fn test_capacity_evicts_least_recently_active() {
        let store = ConversationStore::new(2, Duration::from_secs(3600));
        let a = key("P1", "LongBot1");
        let b = key("P2", "LongBot1");
        let c = key("P3", "LongBot1");

        store.append_turn(&a, Turn::user("a"));
        std::thread::sleep(Duration::from_millis(5));
        store.append_turn(&b, Turn::user("b"));
        std::thread::sleep(Duration::from_millis(5));
        store.append_turn(&c, Turn::user("c"));

        assert_eq!(store.len(), 2);
        assert!(store.history(&a).is_empty());
        assert_eq!(store.history(&b).len(), 1);
        assert_eq!(store.history(&c).len(), 1);
    }

    #[test]
    fn test_capacity_sweep_prefers_expired_entries() {
        let store = ConversationStore::new(2, Duration::from_millis(20));
        let a = key("P1", "LongBot1");
        let b = key("P2", "LongBot1");
        let c = key("P3", "LongBot1");

        store.append_turn(&a, Turn::user("a"));
        store.append_turn(&b, Turn::user("b"));
        std::thread::sleep(Duration::from_millis(40));
        store.append_turn(&c, Turn::user("c"));

        assert_eq!(store.history(&c).len(), 1);
        assert!(store.len() <= 2);
    }

    #[test]
    fn test_concurrent_appends_keep_window_invariant() {
        use std::sync::Arc;

        let store = Arc::new(ConversationStore::default());
        let k = key("P1", "LongBot1");

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = Arc::clone(&store);
                let k = k.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let snapshot = store.append_turn(&k, Turn::user(format!("w{worker}m{i}")));
                        assert!(snapshot.len() <= MAX_TURNS);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.history(&k).len(), MAX_TURNS);
    }
}
