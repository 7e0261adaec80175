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

use std::fmt;

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    #[default]
    Unknown,
    Server,
    Database,
    #[serde(rename = "mq")]
    MessageQueue,
    Cache,
    Dns,
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Server => write!(f, "server"),
            Self::Database => write!(f, "database"),
            Self::MessageQueue => write!(f, "mq"),
            Self::Cache => write!(f, "cache"),
            Self::Dns => write!(f, "dns"),
        }
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceMeta {
    pub category: ServiceCategory,
    // empty when the host name is not known
    pub host: String,
}

impl ServiceMeta {
    pub fn new(category: ServiceCategory, host: impl Into<String>) -> Self {
        Self {
            category,
            host: host.into(),
        }
    }
}

/// Maps (process, remote ip) to the logical service behind it.
///
/// Lookups are best effort and must not block, `None` is a miss.
pub trait ServiceResolver {
    fn resolve(&self, pid: u32, remote_ip: &str) -> Option<ServiceMeta>;
}

/// Resolver that never knows anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

impl ServiceResolver for NoopResolver {
    fn resolve(&self, _: u32, _: &str) -> Option<ServiceMeta> {
        None
    }
}

/// In memory resolver fed by whoever observes name resolution (e.g. DNS
/// responses of a process). Safe to share between threads.
#[derive(Debug, Default)]
pub struct ServiceMetaCache {
    metas: RwLock<AHashMap<u32, AHashMap<String, ServiceMeta>>>,
}

impl ServiceMetaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, pid: u32, remote_ip: impl Into<String>, meta: ServiceMeta) {
        self.metas
            .write()
            .entry(pid)
            .or_default()
            .insert(remote_ip.into(), meta);
    }

    // called when a process exits
    pub fn remove_pid(&self, pid: u32) {
        self.metas.write().remove(&pid);
    }

    pub fn clear(&self) {
        self.metas.write().clear();
    }

    pub fn len(&self) -> usize {
        self.metas.read().values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ServiceResolver for ServiceMetaCache {
    fn resolve(&self, pid: u32, remote_ip: &str) -> Option<ServiceMeta> {
        self.metas
            .read()
            .get(&pid)
            .and_then(|m| m.get(remote_ip))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn cache_lookup() {
        let cache = ServiceMetaCache::new();
        assert!(cache.is_empty());
        cache.insert(
            10,
            "10.1.1.1",
            ServiceMeta::new(ServiceCategory::Database, "mysql.local"),
        );
        cache.insert(11, "10.1.1.1", ServiceMeta::new(ServiceCategory::Cache, ""));
        assert_eq!(cache.len(), 2);

        let meta = cache.resolve(10, "10.1.1.1").unwrap();
        assert_eq!(meta.category, ServiceCategory::Database);
        assert_eq!(meta.host, "mysql.local");
        assert!(cache.resolve(10, "10.1.1.2").is_none());
        assert!(cache.resolve(12, "10.1.1.1").is_none());

        cache.remove_pid(10);
        assert!(cache.resolve(10, "10.1.1.1").is_none());
        assert!(cache.resolve(11, "10.1.1.1").is_some());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn shared_between_threads() {
        let cache = Arc::new(ServiceMetaCache::new());
        let handles: Vec<_> = (0..4)
            .map(|pid| {
                let cache = cache.clone();
                thread::spawn(move || {
                    cache.insert(pid, "1.1.1.1", ServiceMeta::new(ServiceCategory::Dns, "dns"));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 4);
        assert!(NoopResolver.resolve(0, "1.1.1.1").is_none());
    }

    #[test]
    fn category_names() {
        assert_eq!(ServiceCategory::MessageQueue.to_string(), "mq");
        assert_eq!(ServiceCategory::default().to_string(), "unknown");
        assert_eq!(
            serde_json::to_string(&ServiceCategory::MessageQueue).unwrap(),
            "\"mq\""
        );
    }
}
