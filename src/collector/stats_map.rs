/*
 * Copyright (c) 2024 Yunshan Networks
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use ahash::AHashMap;

use crate::common::{AggregationKey, ConnectionKey, FlowStats};

/// Connection key to flow counters, identity decided by `K`.
///
/// Not synchronized: one table per capture path, or external locking.
/// The key stored for an entry is the first one observed for it.
#[derive(Debug)]
pub struct StatsTable<K: AggregationKey> {
    map: AHashMap<K, FlowStats>,
}

impl<K: AggregationKey> StatsTable<K> {
    pub fn new() -> Self {
        Self {
            map: AHashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: AHashMap::with_capacity(capacity),
        }
    }

    /// Returns the entry for `key`, inserting zeroed counters if absent.
    pub fn get_or_create(&mut self, key: &ConnectionKey) -> &mut FlowStats {
        self.map.entry(K::new(*key)).or_default()
    }

    pub fn get(&self, key: &ConnectionKey) -> Option<&FlowStats> {
        self.map.get(&K::new(*key))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConnectionKey, &FlowStats)> {
        self.map.iter().map(|(k, v)| (k.key(), v))
    }

    /// Empties the table, yielding every entry. Entries not consumed are
    /// dropped when the iterator is.
    pub fn drain(&mut self) -> impl Iterator<Item = (ConnectionKey, FlowStats)> + '_ {
        self.map.drain().map(|(k, v)| (*k.key(), v))
    }

    /// Moves every entry of `other` into this table, summing counters of
    /// entries that exist in both.
    pub fn merge_from(&mut self, other: &mut StatsTable<K>) {
        for (key, stats) in other.map.drain() {
            self.map.entry(key).or_default().merge(&stats);
        }
    }
}

impl<K: AggregationKey> Default for StatsTable<K> {
    fn default() -> Self {
        Self::new()
    }
}
