use std::{
    collections::{hash_map::Entry, HashMap},
    hash::Hash,
};

/// State that can be rolled back to the last checkpoint.
pub trait Checkpoint {
    fn checkpoint(&mut self);
    fn commit(&mut self);
    fn revert(&mut self);
}

/// A `HashMap` that remembers the value each key held at the last checkpoint.
///
/// Only the first write to a key after a checkpoint is recorded, so reverting costs
/// one restore per touched key regardless of how often it was written.
#[derive(Debug)]
pub struct JournaledMap<K, V> {
    entries: HashMap<K, V>,
    undo: Option<HashMap<K, Option<V>>>,
}

impl<K, V> Default for JournaledMap<K, V> {
    fn default() -> Self {
        Self { entries: HashMap::new(), undo: None }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> JournaledMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.record(&key);
        self.entries.insert(key, value);
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.record(key);
        self.entries.remove(key)
    }

    pub fn get_mut_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.record(&key);
        self.entries.entry(key).or_default()
    }

    fn record(&mut self, key: &K) {
        if let Some(undo) = self.undo.as_mut() {
            if let Entry::Vacant(e) = undo.entry(key.clone()) {
                e.insert(self.entries.get(key).cloned());
            }
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Checkpoint for JournaledMap<K, V> {
    fn checkpoint(&mut self) {
        self.undo = Some(HashMap::new());
    }

    fn commit(&mut self) {
        self.undo = None;
    }

    fn revert(&mut self) {
        let Some(undo) = self.undo.take() else {
            return;
        };
        for (key, previous) in undo {
            match previous {
                Some(value) => {
                    self.entries.insert(key, value);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_restores_values_at_checkpoint() {
        let mut map = JournaledMap::new();
        map.insert("a", 1u64);
        map.insert("b", 2);

        map.checkpoint();
        map.insert("a", 10);
        map.insert("a", 11);
        map.remove(&"b");
        *map.get_mut_or_default("c") += 5;
        map.revert();

        assert_eq!(map.get(&"a"), Some(&1));
        assert_eq!(map.get(&"b"), Some(&2));
        assert!(!map.contains_key(&"c"));
    }

    #[test]
    fn commit_keeps_writes() {
        let mut map = JournaledMap::new();
        map.checkpoint();
        map.insert(1u32, "one");
        map.commit();
        map.revert();
        assert_eq!(map.get(&1), Some(&"one"));
    }

    #[test]
    fn writes_outside_checkpoint_are_not_journaled() {
        let mut map = JournaledMap::new();
        map.insert(1u32, 1u32);
        map.revert();
        assert_eq!(map.get(&1), Some(&1));
    }
}
