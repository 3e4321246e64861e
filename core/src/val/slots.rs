use crate::util::ordered_map::OrderedMap;

use super::{Obj, Object, string_key};

/// Ordered mapping from an object's hash key to its (key, value) pair.
///
/// Serves as every object's own slot table and as the entry storage of dicts.
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    entries: OrderedMap<(Obj, Obj)>,
}

impl SlotTable {
    pub fn new() -> Self {
        Self {
            entries: OrderedMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Object) -> Option<Obj> {
        self.entries.get(&key.hash_key()).map(|(_, v)| v.clone())
    }

    /// Lookup under the string key `name`.
    pub fn get_by_name(&self, name: &str) -> Option<Obj> {
        self.entries.get(&string_key(name)).map(|(_, v)| v.clone())
    }

    pub fn contains(&self, key: &Object) -> bool {
        self.entries.contains_key(&key.hash_key())
    }

    pub fn insert(&mut self, key: Obj, value: Obj) -> Option<Obj> {
        let hash = key.hash_key();
        self.entries.insert(hash, (key, value)).map(|(_, old)| old)
    }

    /// Insert under a string key.
    pub fn insert_named(&mut self, name: &str, value: Obj) -> Option<Obj> {
        self.insert(Object::string(name), value)
    }

    pub fn remove(&mut self, key: &Object) -> Option<Obj> {
        self.entries.shift_remove(&key.hash_key()).map(|(_, v)| v)
    }

    pub fn entry_at(&self, idx: usize) -> Option<(Obj, Obj)> {
        self.entries.get_index(idx).map(|(_, (k, v))| (k.clone(), v.clone()))
    }

    /// Snapshot of every (key, value) pair in insertion order.
    pub fn entries(&self) -> Vec<(Obj, Obj)> {
        self.entries.values().cloned().collect()
    }

    pub fn keys(&self) -> Vec<Obj> {
        self.entries.values().map(|(k, _)| k.clone()).collect()
    }
}

impl FromIterator<(Obj, Obj)> for SlotTable {
    fn from_iter<I: IntoIterator<Item = (Obj, Obj)>>(iter: I) -> Self {
        let mut table = SlotTable::new();
        for (key, value) in iter {
            table.insert(key, value);
        }
        table
    }
}
