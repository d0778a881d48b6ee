// THEORY:
// The `ImageIndex` is a flat mapping from an opaque image identifier to the
// descriptor computed for that image. It is assembled once, in a batch, by whatever
// owns the image collection, and then only read. It makes no promise about
// iteration order; anything that needs an order (the searcher) imposes its own.
//
// The index deliberately does not police descriptor lengths on insert. A length
// disagreement is a configuration problem across the whole collection, and the
// searcher reports it against the query, naming the entry it tripped over.

use crate::core_modules::descriptor::Descriptor;
use std::collections::HashMap;
use std::hash::Hash;

/// A flat identifier → descriptor map.
#[derive(Debug, Clone)]
pub struct ImageIndex<K> {
    entries: HashMap<K, Descriptor>,
}

impl<K> Default for ImageIndex<K> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<K: Eq + Hash> ImageIndex<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: HashMap::with_capacity(capacity) }
    }

    /// Adds or replaces the descriptor for `id`, returning the previous one.
    pub fn insert(&mut self, id: K, descriptor: Descriptor) -> Option<Descriptor> {
        self.entries.insert(id, descriptor)
    }

    pub fn get(&self, id: &K) -> Option<&Descriptor> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    pub fn remove(&mut self, id: &K) -> Option<Descriptor> {
        self.entries.remove(id)
    }
}

impl<K> ImageIndex<K> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Descriptor)> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }
}

impl<K: Eq + Hash> FromIterator<(K, Descriptor)> for ImageIndex<K> {
    fn from_iter<I: IntoIterator<Item = (K, Descriptor)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

impl<K: Eq + Hash> Extend<(K, Descriptor)> for ImageIndex<K> {
    fn extend<I: IntoIterator<Item = (K, Descriptor)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl<K> From<HashMap<K, Descriptor>> for ImageIndex<K> {
    fn from(entries: HashMap<K, Descriptor>) -> Self {
        Self { entries }
    }
}

impl<'a, K> IntoIterator for &'a ImageIndex<K> {
    type Item = (&'a K, &'a Descriptor);
    type IntoIter = std::collections::hash_map::Iter<'a, K, Descriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
